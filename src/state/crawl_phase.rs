//! Crawl lifecycle phases
use std::fmt;

/// Phase of the crawl coordinator
///
/// `Idle -> Running -> Draining -> Completed`, with `Failed` reachable from
/// `Running` when nothing could be fetched at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Created, not yet started
    Idle,

    /// Dispatching workers and committing results
    Running,

    /// No new work is accepted; waiting for in-flight fetches to settle
    Draining,

    /// Finished; the assembled document is available
    Completed,

    /// Unrecoverable failure; no output is produced
    Failed,
}

impl CrawlPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true while workers may still be dispatched
    pub fn accepts_work(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Draining)
                | (Self::Running, Self::Failed)
                | (Self::Draining, Self::Completed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
