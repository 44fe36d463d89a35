//! # gate-limit
//!
//! `gate-limit` defines the contract between an HTTP request gate and the
//! rate limiter that backs it.
//!
//! ## Core Philosophy
//!
//! The gate asks one question per request: may this proceed? How the answer
//! is produced - token buckets, sliding windows, a counter in Redis - is the
//! limiter's business. Keeping the contract this narrow means any counting
//! scheme, local or distributed, plugs into the same middleware unchanged.
//!
//! ## Key Concepts
//!
//! * **[`RateLimiter`]**: a single fallible decision per request.
//! * **[`QuotaRateLimiter`]**: a decision plus a point-in-time [`Quota`]
//!   snapshot, for gates that report usage back to clients.
//! * Implementations must be `Send` and `Sync` to be shared across request
//!   tasks via `Arc`.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::atomic::AtomicUsize;
//! use std::sync::atomic::Ordering;
//!
//! use gate_limit::BoxError;
//! use gate_limit::RateLimiter;
//! use http::Request;
//!
//! struct Budget {
//!     remaining: AtomicUsize,
//! }
//!
//! impl<B> RateLimiter<B> for Budget {
//!     fn is_allowed(&self, _request: &Request<B>) -> Result<bool, BoxError> {
//!         let taken = self
//!             .remaining
//!             .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
//!         Ok(taken.is_ok())
//!     }
//! }
//!
//! let budget = Budget { remaining: AtomicUsize::new(1) };
//! let request = Request::builder().body(()).unwrap();
//! assert!(budget.is_allowed(&request).unwrap());
//! assert!(!budget.is_allowed(&request).unwrap());
//! ```

use std::time::Duration;

use http::Request;

/// Alias for a type-erased error type, matching the `tower` convention.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Decides whether a single request may proceed.
///
/// The trait is generic over the request body type `B` so one limiter
/// serves any HTTP stack; the request is passed by reference and the
/// implementation chooses what it inspects (method, path, headers,
/// extensions). Side effects such as counter increments are the
/// implementation's own affair and are not assumed to be idempotent.
pub trait RateLimiter<B> {
    /// Checks whether a request is permitted to proceed under the current
    /// rate limiting rules.
    ///
    /// Returns `Ok(true)` to let the request through and `Ok(false)` to
    /// deny it.
    ///
    /// # Errors
    ///
    /// Returns an error when the decision itself cannot be made, such as a
    /// lost connection to a backing counter store. A denial is a valid
    /// decision, not an error.
    fn is_allowed(&self, request: &Request<B>) -> Result<bool, BoxError>;
}

/// A [`RateLimiter`] that can also report the quota state for a request.
///
/// Intended for limiters that expose usage back to clients: how much of the
/// budget is left, what the budget is, and how long to back off once it is
/// spent.
///
/// There is no atomicity between [`RateLimiter::is_allowed`] and
/// [`QuotaRateLimiter::quota`]: under concurrent traffic from the same
/// client another request may move the counters between the two calls.
/// Implementations should keep that window small; callers must not assume
/// it is zero.
pub trait QuotaRateLimiter<B>: RateLimiter<B> {
    /// Reports the current quota state for a request.
    ///
    /// This call must not fail. When the backing source is unavailable,
    /// implementations return a best-effort snapshot (for example
    /// `Quota::default()`) rather than guessing at an error channel that
    /// does not exist.
    fn quota(&self, request: &Request<B>) -> Quota;
}

/// Point-in-time quota state for a single request.
///
/// Produced by [`QuotaRateLimiter::quota`] and consumed within the handling
/// of that one request; never cached or shared across requests by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Quota {
    /// Requests the client can still make within the current window.
    ///
    /// Meaningful when the paired decision allowed the request, and should
    /// not exceed `limit`.
    pub remaining: usize,

    /// Total requests allowed within the current window.
    pub limit: usize,

    /// How long the client should wait before retrying.
    ///
    /// Meaningful when the paired decision denied the request; `remaining`
    /// and `limit` may be zero in that case.
    pub retry_after: Duration,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    struct PathPrefixLimiter {
        prefix: &'static str,
    }

    impl<B> RateLimiter<B> for PathPrefixLimiter {
        fn is_allowed(&self, request: &Request<B>) -> Result<bool, BoxError> {
            Ok(request.uri().path().starts_with(self.prefix))
        }
    }

    impl<B> QuotaRateLimiter<B> for PathPrefixLimiter {
        fn quota(&self, _request: &Request<B>) -> Quota {
            Quota {
                remaining: 9,
                limit: 10,
                retry_after: Duration::from_secs(1),
            }
        }
    }

    #[test]
    fn limiter_sees_the_request() {
        let limiter = PathPrefixLimiter { prefix: "/api" };

        let hit = Request::builder().uri("/api/users").body(()).unwrap();
        let miss = Request::builder().uri("/metrics").body(()).unwrap();

        assert!(limiter.is_allowed(&hit).unwrap());
        assert!(!limiter.is_allowed(&miss).unwrap());
    }

    #[test]
    fn usable_as_a_trait_object() {
        let limiter: Arc<dyn QuotaRateLimiter<()> + Send + Sync> =
            Arc::new(PathPrefixLimiter { prefix: "/" });

        let request = Request::builder().uri("/anything").body(()).unwrap();
        assert!(limiter.is_allowed(&request).unwrap());
        assert_eq!(limiter.quota(&request).limit, 10);
    }

    #[test]
    fn default_quota_is_empty() {
        let quota = Quota::default();

        assert_eq!(quota.remaining, 0);
        assert_eq!(quota.limit, 0);
        assert_eq!(quota.retry_after, Duration::ZERO);
    }
}
