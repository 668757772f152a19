use crate::progress::{Phase, ProgressUpdate};
use crate::state::RunResultKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User asked to start a mirror run.
    StartClicked,
    /// User asked to hold the run at the next checkpoint.
    PauseClicked,
    /// User released a paused run.
    ResumeClicked,
    /// User asked to abandon the run and discard its output.
    CancelClicked,
    /// Pipeline entered a new phase.
    PhaseChanged(Phase),
    /// Pipeline progress notification.
    Progress(ProgressUpdate),
    /// Pipeline finished, one way or another.
    Finished(RunResultKind),
    /// Render tick to coalesce output.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
