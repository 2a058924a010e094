//! Worker recycling middleware
//!
//! Counts completed requests and signals a graceful shutdown once the
//! jittered request limit is reached, bounding per-worker memory growth.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tokio::sync::Notify;
use tracing::info;

/// Tracks served requests against a per-launch recycle limit.
///
/// Single consumer: at most one task may wait on [`RequestRecycler::recycled`].
pub struct RequestRecycler {
    limit: u64,
    served: AtomicU64,
    notify: Notify,
}

impl RequestRecycler {
    /// Create a recycler. A limit of 0 is clamped to 1.
    pub fn new(limit: u64) -> Arc<Self> {
        Arc::new(Self {
            limit: limit.max(1),
            served: AtomicU64::new(0),
            notify: Notify::new(),
        })
    }

    /// Record one completed request, signalling recycling at the limit.
    pub fn record(&self) {
        let served = self.served.fetch_add(1, Ordering::Relaxed) + 1;
        if served == self.limit {
            info!("served {} requests, worker recycle scheduled", served);
            self.notify.notify_one();
        }
    }

    /// Requests completed so far.
    pub fn served(&self) -> u64 {
        self.served.load(Ordering::Relaxed)
    }

    /// Recycle threshold for this launch.
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// True once the limit has been reached.
    pub fn limit_reached(&self) -> bool {
        self.served() >= self.limit
    }

    /// Resolves once the limit is reached. `notify_one` stores a permit if
    /// the waiter registers late, so the signal is never missed.
    pub async fn recycled(&self) {
        if self.limit_reached() {
            return;
        }
        self.notify.notified().await;
    }
}

/// Counts each completed request toward the recycle limit.
pub async fn recycle_middleware(
    State(recycler): State<Arc<RequestRecycler>>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    recycler.record();
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_zero_limit_is_clamped() {
        let recycler = RequestRecycler::new(0);
        assert_eq!(recycler.limit(), 1);
    }

    #[tokio::test]
    async fn test_does_not_trigger_below_limit() {
        let recycler = RequestRecycler::new(3);
        recycler.record();
        recycler.record();

        assert!(!recycler.limit_reached());
        let waited = tokio::time::timeout(Duration::from_millis(20), recycler.recycled()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_triggers_at_limit() {
        let recycler = RequestRecycler::new(2);
        recycler.record();
        recycler.record();

        assert!(recycler.limit_reached());
        assert_eq!(recycler.served(), 2);
        tokio::time::timeout(Duration::from_millis(20), recycler.recycled())
            .await
            .expect("recycled() should resolve at the limit");
    }

    #[tokio::test]
    async fn test_waiter_registered_before_limit_is_woken() {
        let recycler = RequestRecycler::new(1);
        let waiter = {
            let recycler = Arc::clone(&recycler);
            tokio::spawn(async move { recycler.recycled().await })
        };
        // give the waiter a chance to register
        tokio::task::yield_now().await;

        recycler.record();
        tokio::time::timeout(Duration::from_millis(100), waiter)
            .await
            .expect("waiter should be woken")
            .unwrap();
    }
}
