use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{RwLock, Semaphore};

/// Source for a value that can be fetched again on demand.
pub trait Refresher: Send + Sync + 'static {
    type Value: Send + Sync;
    type Error: Display;

    fn refresh(&self) -> impl Future<Output = Result<Self::Value, Self::Error>> + Send;
}

struct Entry<T> {
    value: Arc<T>,
    refreshed_at: Instant,
}

/// A cached value with rate limited re-fetching.
///
/// Concurrent refresh calls collapse into one, callers losing the race
/// simply keep the value they have.
pub struct RefreshableValue<R: Refresher> {
    entry: RwLock<Entry<R::Value>>,
    refresher: R,
    gate: Semaphore,
    min_interval: Duration,
}

impl<R: Refresher> RefreshableValue<R> {
    /// Fetches the initial value eagerly.
    pub async fn new(refresher: R, min_interval: Duration) -> Result<Self, R::Error> {
        let value = refresher.refresh().await?;
        Ok(Self::seeded(refresher, min_interval, value))
    }

    /// Starts from an already known value, no fetch happens.
    pub fn seeded(refresher: R, min_interval: Duration, value: R::Value) -> Self {
        Self {
            entry: RwLock::new(Entry {
                value: Arc::new(value),
                refreshed_at: Instant::now(),
            }),
            refresher,
            gate: Semaphore::new(1),
            min_interval,
        }
    }

    pub async fn get(&self) -> Arc<R::Value> {
        Arc::clone(&self.entry.read().await.value)
    }

    /// Re-fetches the value unless another refresh is in flight or the
    /// last one happened within the minimum interval.
    ///
    /// Returns whether a new value was swapped in.
    pub async fn refresh(&self) -> Result<bool, R::Error> {
        let Ok(_permit) = self.gate.try_acquire() else {
            return Ok(false);
        };
        if self.entry.read().await.refreshed_at.elapsed() < self.min_interval {
            return Ok(false);
        }

        let value = self.refresher.refresh().await?;
        let mut entry = self.entry.write().await;
        entry.value = Arc::new(value);
        entry.refreshed_at = Instant::now();
        Ok(true)
    }
}
