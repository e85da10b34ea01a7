/// Crawl lifecycle definitions
///
/// A crawl moves `Idle -> Running -> Finished(outcome)` exactly once.
use crate::CrawlError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal outcome of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlOutcome {
    /// The frontier was exhausted naturally
    Completed,

    /// A page/product cap, a deadline or a cancellation stopped the crawl
    CompletedPartial,

    /// The seed URL was invalid or the root page could not be fetched
    Failed,
}

impl CrawlOutcome {
    /// Returns true for both complete and partial success
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::CompletedPartial => "completed_partial",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(Self::Completed),
            "completed_partial" => Some(Self::CompletedPartial),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for CrawlOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current phase of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    Idle,
    Running,
    Finished(CrawlOutcome),
}

impl CrawlPhase {
    /// Returns true once an outcome has been reached
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished(_))
    }

    /// Checks whether moving to `next` is a legal transition
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Idle, Self::Finished(CrawlOutcome::Failed))
                | (Self::Running, Self::Finished(_))
        )
    }

    /// Moves to `next`, rejecting illegal transitions
    pub fn transition(&mut self, next: CrawlPhase) -> Result<(), CrawlError> {
        if !self.can_transition_to(next) {
            return Err(CrawlError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Running => f.write_str("running"),
            Self::Finished(outcome) => write!(f, "{}", outcome),
        }
    }
}
