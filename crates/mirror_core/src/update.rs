use crate::progress::ProgressUpdate;
use crate::{AppState, Effect, Msg, RunState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::StartClicked => {
            if state.run().is_active() {
                Vec::new()
            } else {
                state.start_run();
                vec![Effect::StartRun]
            }
        }
        Msg::PauseClicked => {
            if state.run() == RunState::Running {
                state.set_run(RunState::Paused);
                vec![Effect::PauseRun]
            } else {
                Vec::new()
            }
        }
        Msg::ResumeClicked => {
            if state.run() == RunState::Paused {
                state.set_run(RunState::Running);
                vec![Effect::ResumeRun]
            } else {
                Vec::new()
            }
        }
        Msg::CancelClicked => {
            if matches!(state.run(), RunState::Running | RunState::Paused) {
                state.set_run(RunState::Cancelling);
                vec![Effect::CancelRun]
            } else {
                Vec::new()
            }
        }
        Msg::PhaseChanged(phase) => {
            if state.run().is_active() {
                state.enter_phase(phase);
            }
            Vec::new()
        }
        Msg::Progress(progress) => {
            if state.run().is_active() {
                match progress {
                    ProgressUpdate::Status {
                        message,
                        current_url,
                    } => state.apply_status(message, current_url),
                    ProgressUpdate::Percent { percent, message } => {
                        state.apply_percent(percent, message)
                    }
                }
            }
            Vec::new()
        }
        Msg::Finished(result) => {
            if state.run().is_active() {
                state.finish(result);
            }
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
