use std::time::Duration;

use http::Response;
use http::StatusCode;
use http::header::HeaderValue;

use crate::X_RATELIMIT_RETRY_AFTER;

/// Rejections produced by the gating middleware.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GateError {
    /// The request was rejected by the rate limiter.
    ///
    /// `retry_after` carries the wait hint from the limiter's quota
    /// snapshot, when one was taken. Renders as `429 Too Many Requests`,
    /// with an `X-RateLimit-Retry-After` header when the hint is present.
    #[error("rate limit exceeded")]
    RateLimited {
        /// The duration to wait before retrying, when known.
        retry_after: Option<Duration>,
    },

    /// The rate limiter itself failed to reach a decision.
    ///
    /// The string contains the `Display` representation of the limiter's
    /// error. Renders as `500 Internal Server Error`; the detail stays on
    /// the server side.
    #[error("rate limiter failure: {0}")]
    Limiter(String),
}

impl GateError {
    /// Renders the rejection as an empty-bodied HTTP response.
    ///
    /// The status code and headers carry everything a client is told;
    /// neither variant writes rejection detail to the body.
    pub fn into_response<B>(self) -> Response<B>
    where
        B: Default,
    {
        let mut response = Response::new(B::default());
        match self {
            Self::RateLimited { retry_after } => {
                *response.status_mut() = StatusCode::TOO_MANY_REQUESTS;
                if let Some(wait) = retry_after {
                    response
                        .headers_mut()
                        .insert(X_RATELIMIT_RETRY_AFTER, millis_value(wait));
                }
            }
            Self::Limiter(_) => {
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            }
        }
        response
    }
}

/// Whole milliseconds as a decimal header value; fractions truncate.
fn millis_value(wait: Duration) -> HeaderValue {
    HeaderValue::from(u64::try_from(wait.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for GateError {
    fn into_response(self) -> axum::response::Response {
        GateError::into_response::<axum::body::Body>(self)
    }
}
