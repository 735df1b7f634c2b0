//! URL status definitions for tracking a record through the frontier
use std::fmt;

/// Lifecycle of one URL record
///
/// ```text
/// Pending -> InFlight -> Done
///               |    \-> Failed
///               \-> Pending (retry)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlStatus {
    /// Waiting in the frontier (initially or after a retryable failure)
    Pending,

    /// Claimed by a worker for one fetch attempt
    InFlight,

    /// Fetched and committed
    Done,

    /// Permanently failed or skipped; excluded from output
    Failed,
}

impl UrlStatus {
    /// Returns true once the record can no longer change
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn can_transition_to(&self, next: UrlStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InFlight)
                | (Self::InFlight, Self::Pending)
                | (Self::InFlight, Self::Done)
                | (Self::InFlight, Self::Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InFlight => "in_flight",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for UrlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
