use crate::progress::Phase;
use crate::view_model::RunViewModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Paused,
    Cancelling,
    Completed,
    Cancelled,
    Failed,
}

impl RunState {
    /// A run is in flight (possibly held or winding down).
    pub fn is_active(self) -> bool {
        matches!(self, RunState::Running | RunState::Paused | RunState::Cancelling)
    }
}

/// Aggregate counters reported when a run completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub pages_written: usize,
    pub resources_downloaded: usize,
    pub resources_failed: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunResultKind {
    Completed(RunSummary),
    Cancelled,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    run: RunState,
    phase: Phase,
    percent: u8,
    message: String,
    current_url: Option<String>,
    summary: Option<RunSummary>,
    failure: Option<String>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run(&self) -> RunState {
        self.run
    }

    pub fn view(&self) -> RunViewModel {
        RunViewModel {
            run: self.run,
            phase: self.phase,
            percent: self.percent,
            message: self.message.clone(),
            current_url: self.current_url.clone(),
            summary: self.summary,
            failure: self.failure.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn start_run(&mut self) {
        *self = AppState {
            run: RunState::Running,
            message: Phase::Preparing.label().to_string(),
            ..AppState::default()
        };
        self.mark_dirty();
    }

    pub(crate) fn set_run(&mut self, run: RunState) {
        if self.run != run {
            self.run = run;
            self.mark_dirty();
        }
    }

    pub(crate) fn enter_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.percent = phase.band().0;
        self.message = phase.label().to_string();
        self.mark_dirty();
    }

    pub(crate) fn apply_status(&mut self, message: String, current_url: Option<String>) {
        self.message = message;
        if current_url.is_some() {
            self.current_url = current_url;
        }
        self.mark_dirty();
    }

    /// Percent may move backwards between phases; the latest value wins.
    pub(crate) fn apply_percent(&mut self, percent: u8, message: String) {
        self.percent = percent.min(100);
        self.message = message;
        self.mark_dirty();
    }

    pub(crate) fn finish(&mut self, result: RunResultKind) {
        match result {
            RunResultKind::Completed(summary) => {
                self.run = RunState::Completed;
                self.percent = 100;
                self.summary = Some(summary);
            }
            RunResultKind::Cancelled => {
                self.run = RunState::Cancelled;
            }
            RunResultKind::Failed(message) => {
                self.run = RunState::Failed;
                self.failure = Some(message);
            }
        }
        self.current_url = None;
        self.mark_dirty();
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
