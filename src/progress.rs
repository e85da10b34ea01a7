//! Crawl progress events
//!
//! A crawl reports its progress over a `tokio::sync::broadcast` channel so
//! any number of listeners can subscribe. Sending never blocks; when no
//! subscriber exists the event is dropped.

use crate::state::CrawlOutcome;
use serde::Serialize;
use tokio::sync::broadcast;

/// Buffered events per subscriber before the slowest one starts lagging
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CrawlEvent {
    Started {
        seed_url: String,
    },
    Progress {
        pages_visited: usize,
        products_found: usize,
        pending: usize,
    },
    PageFailed {
        url: String,
        reason: String,
    },
    Finished {
        outcome: CrawlOutcome,
        products: usize,
    },
    Failed {
        message: String,
    },
}

/// Sending half of the progress channel
#[derive(Debug, Clone)]
pub struct ProgressSender {
    inner: broadcast::Sender<CrawlEvent>,
}

impl ProgressSender {
    /// Emits an event, ignoring the error raised when nobody listens
    pub fn emit(&self, event: CrawlEvent) {
        let _ = self.inner.send(event);
    }

    /// Subscribes a new listener that sees events from now on
    pub fn subscribe(&self) -> broadcast::Receiver<CrawlEvent> {
        self.inner.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.inner.receiver_count()
    }
}

impl Default for ProgressSender {
    fn default() -> Self {
        channel().0
    }
}

/// Creates a progress channel and its first receiver
pub fn channel() -> (ProgressSender, broadcast::Receiver<CrawlEvent>) {
    let (inner, rx) = broadcast::channel(CHANNEL_CAPACITY);
    (ProgressSender { inner }, rx)
}
