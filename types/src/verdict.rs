use std::fmt;

/// Reported when the check timer fires before the probe finishes.
pub const TIMEOUT_MESSAGE: &str =
    "Failed to complete network connection check in time! Timeout was reached.";

/// Reported when the run is cancelled from outside.
pub const INTERRUPT_MESSAGE: &str = "Cancelling check and shutting down due to interrupt.";

/// Final outcome of one check run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Success,
    /// The probe failed and failure was not the expected outcome.
    Failure(String),
    TimedOut,
    Cancelled,
}

impl Verdict {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Success)
    }

    /// Message handed to the reporter, `None` on success.
    #[must_use]
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            Verdict::Success => None,
            Verdict::Failure(reason) => Some(reason),
            Verdict::TimedOut => Some(TIMEOUT_MESSAGE),
            Verdict::Cancelled => Some(INTERRUPT_MESSAGE),
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Success => "succeeded",
            Verdict::Failure(_) => "failed",
            Verdict::TimedOut => "timed_out",
            Verdict::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.failure_message() {
            Some(message) => write!(f, "{}: {message}", self.label()),
            None => f.write_str(self.label()),
        }
    }
}
