//! Periodic re-crawls
//!
//! [`PeriodicCrawl`] runs a job on a fixed interval until its cancellation
//! token fires. At most one run is in flight at a time: a tick that arrives
//! while the previous run is still going is skipped and counted.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct Counters {
    started: AtomicU64,
    skipped: AtomicU64,
}

/// Handle to a running periodic schedule
#[derive(Debug)]
pub struct PeriodicCrawl {
    handle: JoinHandle<()>,
    counters: Arc<Counters>,
    token: CancellationToken,
}

impl PeriodicCrawl {
    /// Starts running `job` every `period`, the first run immediately
    ///
    /// When `token` is cancelled no further runs start; a run already in
    /// progress is awaited before the schedule finishes.
    pub fn spawn<F, Fut>(period: Duration, token: CancellationToken, mut job: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let counters = Arc::new(Counters::default());
        let task_counters = Arc::clone(&counters);
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut current: Option<JoinHandle<()>> = None;

            loop {
                tokio::select! {
                    biased;

                    _ = task_token.cancelled() => break,

                    _ = interval.tick() => {
                        if current.as_ref().is_some_and(|run| !run.is_finished()) {
                            let skipped = task_counters.skipped.fetch_add(1, Ordering::SeqCst) + 1;
                            tracing::info!("Previous crawl still running, skipping tick ({} skipped)", skipped);
                            continue;
                        }

                        let run = task_counters.started.fetch_add(1, Ordering::SeqCst) + 1;
                        tracing::info!("Starting scheduled crawl #{}", run);
                        current = Some(tokio::spawn(job()));
                    }
                }
            }

            if let Some(run) = current {
                if let Err(e) = run.await {
                    tracing::error!("Scheduled crawl failed: {}", e);
                }
            }
            tracing::info!("Periodic crawl stopped");
        });

        Self {
            handle,
            counters,
            token,
        }
    }

    /// Number of runs started so far
    pub fn runs_started(&self) -> u64 {
        self.counters.started.load(Ordering::SeqCst)
    }

    /// Number of ticks skipped because a run was still in progress
    pub fn ticks_skipped(&self) -> u64 {
        self.counters.skipped.load(Ordering::SeqCst)
    }

    /// Stops scheduling new runs
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Waits for the schedule to stop after cancellation
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            tracing::error!("Periodic crawl task failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn test_runs_until_cancelled() {
        let token = CancellationToken::new();
        let count = Arc::new(AtomicUsize::new(0));
        let job_count = Arc::clone(&count);

        let schedule = PeriodicCrawl::spawn(Duration::from_millis(20), token.clone(), move || {
            let count = Arc::clone(&job_count);
            async move {
                count.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(110)).await;
        schedule.cancel();
        let started = schedule.runs_started();
        schedule.join().await;

        assert!(started >= 2, "expected several runs, got {}", started);
        assert_eq!(count.load(Ordering::SeqCst) as u64, started);
    }

    #[tokio::test]
    async fn test_overlapping_ticks_are_skipped() {
        let token = CancellationToken::new();
        let running = Arc::new(AtomicUsize::new(0));
        let max_running = Arc::new(AtomicUsize::new(0));
        let (job_running, job_max) = (Arc::clone(&running), Arc::clone(&max_running));

        let schedule = PeriodicCrawl::spawn(Duration::from_millis(10), token.clone(), move || {
            let running = Arc::clone(&job_running);
            let max_running = Arc::clone(&job_max);
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                max_running.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(60)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(150)).await;
        token.cancel();
        let skipped = schedule.ticks_skipped();
        schedule.join().await;

        assert_eq!(max_running.load(Ordering::SeqCst), 1);
        assert!(skipped >= 1, "expected skipped ticks");
        assert_eq!(running.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_before_first_tick_completes_quickly() {
        let token = CancellationToken::new();
        token.cancel();

        let schedule = PeriodicCrawl::spawn(Duration::from_secs(3600), token, || async {});
        tokio::time::timeout(Duration::from_secs(1), schedule.join())
            .await
            .unwrap();
    }
}
