//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase` / `CrawlOutcome`: lifecycle of a single crawl invocation
//! - `UrlState`: where a URL sits in the frontier (pending, in flight, visited)
//! - `HostTable`: per-host politeness gaps shared by workers

mod crawl_state;
mod host_state;
mod url_state;

pub use crawl_state::{CrawlOutcome, CrawlPhase};
pub use host_state::{HostState, HostTable};
pub use url_state::UrlState;
