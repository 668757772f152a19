/// Requests the pure core hands back to whoever drives the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    StartRun,
    PauseRun,
    ResumeRun,
    CancelRun,
}
