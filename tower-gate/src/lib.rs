//! # Tower Gate
//!
//! `tower-gate` gates HTTP requests behind a pluggable rate limiting
//! decision, for the [Tower](https://github.com/tower-rs/tower) ecosystem.
//!
//! ## The Gating Contract
//!
//! A gate composes a [`gate_limit::RateLimiter`] with a downstream service
//! and resolves each request to exactly one of three outcomes:
//!
//! 1. **Allowed**: the request is forwarded downstream and the downstream
//!    response is returned untouched.
//! 2. **Denied**: the gate answers `429 Too Many Requests` with an empty
//!    body; the downstream service never sees the request.
//! 3. **Failed**: the limiter could not reach a decision; the gate answers
//!    an opaque `500 Internal Server Error` with an empty body.
//!
//! [`GateLayer`] provides exactly that. [`QuotaGateLayer`] additionally asks
//! a [`gate_limit::QuotaRateLimiter`] for a quota snapshot and reports it to
//! clients: `X-RateLimit-Limit` and `X-RateLimit-Remaining` on allowed
//! responses, `X-RateLimit-Retry-After` (whole milliseconds) on denials.
//!
//! The gates never queue and never retry. A denial is a finished response
//! rather than backpressure, so a gated stack stays ready even when a
//! client has burned its budget.
//!
//! ## Feature Flags
//!
//! - `axum`: Enables `IntoResponse` for [`GateError`], allowing the
//!   rejection mapping (429/500 plus retry header) to be reused in Axum
//!   handlers.

mod error;
mod layer;
mod quota_layer;
mod quota_service;
mod service;


use http::HeaderName;

pub use error::GateError;
pub use layer::GateLayer;
pub use quota_layer::QuotaGateLayer;
pub use quota_service::QuotaGateService;
pub use service::GateService;

/// Total request budget for the current window, set on allowed responses by
/// [`QuotaGateService`].
pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");

/// Budget left in the current window, set on allowed responses by
/// [`QuotaGateService`].
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Whole milliseconds to wait before retrying, set on denied responses by
/// [`QuotaGateService`].
pub const X_RATELIMIT_RETRY_AFTER: HeaderName = HeaderName::from_static("x-ratelimit-retry-after");
