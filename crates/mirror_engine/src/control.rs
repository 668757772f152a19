use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// The run was cancelled while waiting at a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("run cancelled")]
pub struct Cancelled;

/// Cooperative pause/cancel shared between a running pipeline and its driver.
///
/// Clones share state. Work only stops at [`RunControl::checkpoint`]; an
/// in-flight request finishes and its result is discarded.
#[derive(Debug, Clone)]
pub struct RunControl {
    cancel: CancellationToken,
    paused: watch::Sender<bool>,
}

impl RunControl {
    pub fn new() -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            cancel: CancellationToken::new(),
            paused,
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn pause(&self) {
        self.paused.send_replace(true);
    }

    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    /// Blocks while paused; errors once cancellation is requested.
    pub async fn checkpoint(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            return Err(Cancelled);
        }
        let mut paused = self.paused.subscribe();
        tokio::select! {
            _ = self.cancel.cancelled() => Err(Cancelled),
            result = paused.wait_for(|paused| !*paused) => match result {
                Ok(_) if !self.is_cancelled() => Ok(()),
                _ => Err(Cancelled),
            },
        }
    }
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}
