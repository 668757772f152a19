/// Pipeline phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Preparing,
    Crawling,
    Processing,
    Downloading,
    Finishing,
}

impl Phase {
    /// Slice of the overall 0–100 progress bar owned by this phase.
    pub fn band(self) -> (u8, u8) {
        match self {
            Phase::Preparing => (0, 10),
            Phase::Crawling => (10, 30),
            Phase::Processing => (30, 60),
            Phase::Downloading => (60, 95),
            Phase::Finishing => (95, 100),
        }
    }

    /// Maps `done / total` of this phase into its band.
    pub fn scale(self, done: usize, total: usize) -> u8 {
        let (start, end) = self.band();
        if total == 0 {
            return end;
        }
        let fraction = done.min(total) as f64 / total as f64;
        let span = f64::from(end - start);
        start + (fraction * span).round() as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Preparing => "preparing",
            Phase::Crawling => "crawling pages",
            Phase::Processing => "processing pages",
            Phase::Downloading => "downloading resources",
            Phase::Finishing => "finishing",
        }
    }
}

/// One progress notification: either status-only (the `-1` form) or a
/// quantified percentage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressUpdate {
    Status {
        message: String,
        current_url: Option<String>,
    },
    Percent {
        percent: u8,
        message: String,
    },
}

impl ProgressUpdate {
    pub fn status(message: impl Into<String>, current_url: Option<String>) -> Self {
        ProgressUpdate::Status {
            message: message.into(),
            current_url,
        }
    }

    pub fn percent(percent: u8, message: impl Into<String>) -> Self {
        ProgressUpdate::Percent {
            percent: percent.min(100),
            message: message.into(),
        }
    }

    /// `-1` for status-only updates, like the callback contract.
    pub fn percent_value(&self) -> i16 {
        match self {
            ProgressUpdate::Status { .. } => -1,
            ProgressUpdate::Percent { percent, .. } => i16::from(*percent),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ProgressUpdate::Status { message, .. } | ProgressUpdate::Percent { message, .. } => {
                message
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Phase;

    #[test]
    fn scale_stays_inside_band() {
        assert_eq!(Phase::Downloading.scale(0, 10), 60);
        assert_eq!(Phase::Downloading.scale(10, 10), 95);
        assert_eq!(Phase::Downloading.scale(20, 10), 95);
        assert_eq!(Phase::Crawling.scale(0, 0), 30);
    }
}
