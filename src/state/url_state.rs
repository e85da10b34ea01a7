/// Frontier state of a single URL
use std::fmt;

/// Where a URL sits in the frontier
///
/// The three states are disjoint; a URL only moves forward
/// (`Pending -> InFlight -> Visited`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlState {
    /// Discovered and waiting for a worker
    Pending,

    /// Handed to a worker, fetch not yet reported
    InFlight,

    /// Fetch reported (successfully or not)
    Visited,
}

impl UrlState {
    /// Returns true if the URL will not be handed out again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Visited)
    }

    /// Checks whether moving to `next` is a legal transition
    pub fn can_transition_to(&self, next: UrlState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InFlight) | (Self::InFlight, Self::Visited)
        )
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::InFlight => "in_flight",
            Self::Visited => "visited",
        };
        f.write_str(s)
    }
}
