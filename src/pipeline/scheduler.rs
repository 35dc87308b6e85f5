// src/pipeline/scheduler.rs

//! Fixed-interval poll loop.
//!
//! Cycles start `interval` apart, measured start to start. A cycle that
//! overruns the interval is still followed by `min_idle` of rest, so cycles
//! never run back to back. Only one cycle is ever in flight.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::context::AppContext;
use crate::models::PollConfig;
use crate::pipeline::cycle::{log_outcome, run_cycle};

/// Timing rules for the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub interval: Duration,
    pub min_idle: Duration,
}

impl PollSchedule {
    pub fn from_config(config: &PollConfig) -> Self {
        Self {
            interval: config.interval(),
            min_idle: config.min_idle(),
        }
    }

    /// How long to wait after a cycle that took `elapsed`.
    pub fn delay_after(&self, elapsed: Duration) -> Duration {
        self.interval.saturating_sub(elapsed).max(self.min_idle)
    }
}

/// Poll until `shutdown` flips to `true` (or its sender is dropped).
pub async fn run_poll_loop(ctx: Arc<AppContext>, mut shutdown: watch::Receiver<bool>) {
    let schedule = PollSchedule::from_config(&ctx.config.poll);
    log::info!(
        "Poll loop started: every {}s (min idle {}s)",
        schedule.interval.as_secs(),
        schedule.min_idle.as_secs()
    );

    loop {
        if *shutdown.borrow() {
            break;
        }

        let started = Instant::now();
        let result = run_cycle(&ctx).await;
        log_outcome(&result);

        let delay = schedule.delay_after(started.elapsed());
        log::debug!("Next cycle in {}s", delay.as_secs());
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.changed() => break,
        }
    }

    log::info!("Poll loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::bot::Messenger;
    use crate::error::{AppError, Result};
    use crate::models::Config;
    use crate::services::PageSource;
    use crate::storage::MemoryStore;

    /// Counts fetches; the page is always unavailable.
    #[derive(Default)]
    struct CountingSource {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl PageSource for CountingSource {
        async fn fetch(&self) -> Result<String> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Err(AppError::Status {
                url: "counting".into(),
                status: 503,
            })
        }

        fn describe(&self) -> String {
            "counting source".into()
        }
    }

    struct SilentMessenger;

    #[async_trait]
    impl Messenger for SilentMessenger {
        async fn send(&self, _chat_id: &str, _text: &str) -> Result<()> {
            Ok(())
        }
    }

    fn context(source: Arc<CountingSource>) -> Arc<AppContext> {
        let ctx = AppContext::new(
            Config::default(),
            Arc::new(MemoryStore::new()),
            source,
            Arc::new(SilentMessenger),
        )
        .unwrap();
        Arc::new(ctx)
    }

    fn schedule() -> PollSchedule {
        PollSchedule {
            interval: Duration::from_secs(300),
            min_idle: Duration::from_secs(10),
        }
    }

    #[test]
    fn test_delay_measured_from_cycle_start() {
        assert_eq!(
            schedule().delay_after(Duration::from_secs(20)),
            Duration::from_secs(280)
        );
    }

    #[test]
    fn test_overrun_still_idles() {
        assert_eq!(
            schedule().delay_after(Duration::from_secs(400)),
            Duration::from_secs(10)
        );
        assert_eq!(
            schedule().delay_after(Duration::from_secs(295)),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_from_config_defaults() {
        let schedule = PollSchedule::from_config(&PollConfig::default());
        assert_eq!(schedule.interval, Duration::from_secs(300));
        assert_eq!(schedule.min_idle, Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_polls_on_interval_until_shutdown() {
        let source = Arc::new(CountingSource::default());
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(run_poll_loop(context(source.clone()), rx));

        // First cycle runs straight away.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(298)).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);

        tx.send(true).unwrap();
        handle.await.unwrap();
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_exits_without_polling_when_already_stopped() {
        let source = Arc::new(CountingSource::default());
        let (_tx, rx) = watch::channel(true);

        run_poll_loop(context(source.clone()), rx).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }
}
