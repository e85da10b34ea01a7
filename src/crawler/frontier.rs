//! Crawl frontier: discovered, in-flight and visited URLs
//!
//! The frontier is owned by the coordinator and never shared with workers.
//! URLs are handed out breadth-first by depth and in insertion order within
//! a depth. The page cap counts every URL the frontier has accepted, so the
//! number of fetches can never exceed it.

use crate::state::UrlState;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;
use url::Url;

/// A URL handed to a worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedUrl {
    pub url: Url,
    /// Link-follow distance from the seed (seed is 0)
    pub depth: u32,
}

/// Why an enqueue was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Already pending, in flight or visited
    Duplicate,
    /// Deeper than `max_depth`
    DepthExceeded,
    /// The page cap is reached
    LimitReached,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Duplicate => "duplicate",
            Self::DepthExceeded => "depth exceeded",
            Self::LimitReached => "page limit reached",
        };
        f.write_str(s)
    }
}

/// The set of URLs a crawl knows about
#[derive(Debug)]
pub struct Frontier {
    max_depth: u32,
    max_pages: usize,
    states: HashMap<Url, UrlState>,
    queues: BTreeMap<u32, VecDeque<Url>>,
    pending: usize,
    in_flight: usize,
    visited: usize,
    dropped: HashSet<Url>,
    limit_reached: bool,
}

impl Frontier {
    pub fn new(max_depth: u32, max_pages: usize) -> Self {
        Self {
            max_depth,
            max_pages,
            states: HashMap::new(),
            queues: BTreeMap::new(),
            pending: 0,
            in_flight: 0,
            visited: 0,
            dropped: HashSet::new(),
            limit_reached: false,
        }
    }

    /// Adds `url` at `depth` unless it is known, too deep, or the cap is hit
    ///
    /// A rejection for the page cap latches [`Frontier::limit_reached`];
    /// no later enqueue succeeds.
    pub fn enqueue(&mut self, url: Url, depth: u32) -> Result<(), Rejection> {
        if self.states.contains_key(&url) {
            return Err(Rejection::Duplicate);
        }

        if depth > self.max_depth {
            return Err(Rejection::DepthExceeded);
        }

        if self.limit_reached || self.accepted() >= self.max_pages {
            self.limit_reached = true;
            self.dropped.insert(url);
            return Err(Rejection::LimitReached);
        }

        self.states.insert(url.clone(), UrlState::Pending);
        self.queues.entry(depth).or_default().push_back(url);
        self.pending += 1;
        Ok(())
    }

    /// Returns the shallowest pending URL and marks it in flight
    pub fn next(&mut self) -> Option<QueuedUrl> {
        let (&depth, queue) = self.queues.iter_mut().find(|(_, q)| !q.is_empty())?;
        let url = queue.pop_front()?;
        if queue.is_empty() {
            self.queues.remove(&depth);
        }

        self.set_state(&url, UrlState::InFlight);
        self.pending -= 1;
        self.in_flight += 1;
        Some(QueuedUrl { url, depth })
    }

    /// Moves an in-flight URL to visited
    ///
    /// Returns false if `url` was not in flight.
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        if !self.set_state(url, UrlState::Visited) {
            return false;
        }
        self.in_flight -= 1;
        self.visited += 1;
        true
    }

    fn set_state(&mut self, url: &Url, next: UrlState) -> bool {
        match self.states.get_mut(url) {
            Some(state) if state.can_transition_to(next) => {
                *state = next;
                true
            }
            _ => false,
        }
    }

    /// Returns the state of a known URL
    pub fn state_of(&self, url: &Url) -> Option<UrlState> {
        self.states.get(url).copied()
    }

    /// Returns true when nothing is waiting to be handed out
    pub fn is_exhausted(&self) -> bool {
        self.pending == 0
    }

    /// Returns true once the page cap refused a URL
    pub fn limit_reached(&self) -> bool {
        self.limit_reached
    }

    pub fn pending_count(&self) -> usize {
        self.pending
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight
    }

    pub fn visited_count(&self) -> usize {
        self.visited
    }

    /// Number of distinct URLs refused because of the page cap
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }

    fn accepted(&self) -> usize {
        self.visited + self.in_flight + self.pending
    }
}
