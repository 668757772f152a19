use std::io::Write;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use mirror_core::{update, AppState, Effect, Msg, RunResultKind, RunState, RunViewModel};
use mirror_engine::{EngineEvent, EngineHandle, MirrorConfig};
use mirror_logging::{mirror_info, mirror_warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub struct RunOutcome {
    pub result: RunResultKind,
    pub output_dir: Option<PathBuf>,
}

/// Drives one engine run through the core state machine and prints a status
/// line to `out` whenever the view changes.
pub struct Runner<W: Write> {
    config: MirrorConfig,
    state: AppState,
    engine: Option<EngineHandle>,
    out: W,
    last_line: String,
}

impl<W: Write> Runner<W> {
    pub fn new(config: MirrorConfig, out: W) -> Self {
        Self {
            config,
            state: AppState::new(),
            engine: None,
            out,
            last_line: String::new(),
        }
    }

    /// Runs to completion. `controls` delivers user requests from other
    /// threads (console, Ctrl-C).
    pub fn run(mut self, controls: &mpsc::Receiver<Msg>) -> RunOutcome {
        self.dispatch(Msg::StartClicked);

        let outcome = loop {
            while let Ok(msg) = controls.try_recv() {
                self.dispatch(msg);
            }
            let event = match &self.engine {
                Some(engine) => next_event(engine),
                None => Some(lost_worker()),
            };
            match event {
                Some(EngineEvent::PhaseChanged(phase)) => self.dispatch(Msg::PhaseChanged(phase)),
                Some(EngineEvent::Progress(progress)) => self.dispatch(Msg::Progress(progress)),
                Some(EngineEvent::Finished { result, output_dir }) => {
                    self.dispatch(Msg::Finished(result.clone()));
                    break RunOutcome { result, output_dir };
                }
                None => {}
            }
        };

        if let Some(engine) = self.engine.take() {
            engine.join();
        }
        outcome
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let view = state.view();
        let was_dirty = state.consume_dirty();
        self.state = state;

        for effect in effects {
            self.apply(effect);
        }
        if was_dirty {
            self.render(&view);
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::StartRun => {
                mirror_info!("Starting mirror of {}", self.config.url);
                self.engine = Some(EngineHandle::start(self.config.clone()));
            }
            Effect::PauseRun => {
                if let Some(engine) = &self.engine {
                    engine.pause();
                }
            }
            Effect::ResumeRun => {
                if let Some(engine) = &self.engine {
                    engine.resume();
                }
            }
            Effect::CancelRun => {
                if let Some(engine) = &self.engine {
                    engine.cancel();
                }
            }
        }
    }

    fn render(&mut self, view: &RunViewModel) {
        let mut line = view.status_line();
        match view.run {
            RunState::Paused => line.push_str(" [paused]"),
            RunState::Cancelling => line.push_str(" [cancelling]"),
            _ => {}
        }
        if line == self.last_line {
            return;
        }
        if let Err(err) = writeln!(self.out, "{line}") {
            mirror_warn!("Failed to print status: {}", err);
        }
        self.last_line = line;
    }
}

fn next_event(engine: &EngineHandle) -> Option<EngineEvent> {
    if let Some(event) = engine.recv_timeout(POLL_INTERVAL) {
        return Some(event);
    }
    if engine.is_finished() {
        return Some(engine.try_recv().unwrap_or_else(lost_worker));
    }
    None
}

fn lost_worker() -> EngineEvent {
    EngineEvent::Finished {
        result: RunResultKind::Failed("engine stopped without reporting a result".into()),
        output_dir: None,
    }
}
