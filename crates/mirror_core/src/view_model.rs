use crate::progress::Phase;
use crate::state::{RunState, RunSummary};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunViewModel {
    pub run: RunState,
    pub phase: Phase,
    pub percent: u8,
    pub message: String,
    pub current_url: Option<String>,
    pub summary: Option<RunSummary>,
    pub failure: Option<String>,
    pub dirty: bool,
}

impl RunViewModel {
    /// Single status line, e.g. `[ 42%] crawling pages (https://a/b)`.
    pub fn status_line(&self) -> String {
        let mut line = format!("[{:>3}%] {}", self.percent, self.message);
        if let Some(url) = &self.current_url {
            line.push_str(" (");
            line.push_str(url);
            line.push(')');
        }
        line
    }
}
