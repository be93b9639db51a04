use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

/// Background task calling `tick` every `interval`.
///
/// The first tick fires one interval after `start`. A tick that overruns
/// delays the next one instead of bursting. Dropping the scheduler stops it.
#[derive(Debug)]
pub struct PollingScheduler {
    handle: JoinHandle<()>,
    interval: Duration,
}

impl PollingScheduler {
    pub fn start<F, Fut>(interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                debug!("Polling tick");
                tick().await;
            }
        });

        Self { handle, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for PollingScheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
