use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::Context;
use std::task::Poll;
use std::task::ready;

use gate_limit::Quota;
use gate_limit::QuotaRateLimiter;
use http::Request;
use http::Response;
use http::header::HeaderValue;
use pin_project_lite::pin_project;
use tower::Service;

use crate::X_RATELIMIT_LIMIT;
use crate::X_RATELIMIT_REMAINING;
use crate::error::GateError;
use crate::service::GateMetrics;

/// Gates each request behind a [`QuotaRateLimiter`] decision and reports
/// quota state back to the client.
///
/// On top of the [`GateService`](crate::GateService) contract, every gated
/// request costs exactly one quota snapshot: denials carry
/// `X-RateLimit-Retry-After` (whole milliseconds), allowed responses carry
/// `X-RateLimit-Limit` and `X-RateLimit-Remaining`. A limiter failure skips
/// the snapshot entirely and answers a bare 500.
#[derive(Debug)]
pub struct QuotaGateService<L, S>
where
    L: ?Sized,
{
    inner: S,
    limiter: Arc<L>,
    metrics: GateMetrics,
}

impl<L, S> QuotaGateService<L, S>
where
    L: ?Sized,
{
    /// Create a QuotaGateService around an inner service.
    pub fn new(inner: S, limiter: Arc<L>) -> Self {
        Self {
            inner,
            limiter,
            metrics: GateMetrics::new(),
        }
    }
}

impl<L, S> Clone for QuotaGateService<L, S>
where
    L: ?Sized,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            limiter: Arc::clone(&self.limiter),
            metrics: self.metrics.clone(),
        }
    }
}

impl<L, S, ReqB, ResB> Service<Request<ReqB>> for QuotaGateService<L, S>
where
    L: QuotaRateLimiter<ReqB> + ?Sized,
    S: Service<Request<ReqB>, Response = Response<ResB>>,
    ResB: Default,
{
    type Response = Response<ResB>;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future, ResB>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqB>) -> Self::Future {
        let allowed = match self.limiter.is_allowed(&req) {
            Err(err) => {
                tracing::error!(error = %err, "rate limiter failed to reach a decision");
                self.metrics.record("failed");
                // A failed decision never costs a snapshot and never
                // carries quota headers.
                return ResponseFuture::rejected(GateError::Limiter(err.to_string()));
            }
            Ok(allowed) => allowed,
        };

        // One snapshot per gated request, allow or deny.
        let quota = self.limiter.quota(&req);

        if !allowed {
            tracing::debug!(
                retry_after_ms = quota.retry_after.as_millis() as u64,
                "request denied by rate limiter"
            );
            self.metrics.record("denied");
            return ResponseFuture::rejected(GateError::RateLimited {
                retry_after: Some(quota.retry_after),
            });
        }

        self.metrics.record("allowed");
        ResponseFuture::annotated(self.inner.call(req), quota)
    }
}

pin_project! {
    /// Response future for [`QuotaGateService`].
    pub struct ResponseFuture<F, B> {
        #[pin]
        kind: Kind<F, B>,
    }
}

pin_project! {
    #[project = KindProj]
    enum Kind<F, B> {
        Annotated {
            #[pin]
            future: F,
            limit: HeaderValue,
            remaining: HeaderValue,
        },
        Rejected {
            response: Option<Response<B>>,
        },
    }
}

impl<F, B> ResponseFuture<F, B>
where
    B: Default,
{
    fn annotated(future: F, quota: Quota) -> Self {
        Self {
            kind: Kind::Annotated {
                future,
                limit: HeaderValue::from(quota.limit),
                remaining: HeaderValue::from(quota.remaining),
            },
        }
    }

    fn rejected(rejection: GateError) -> Self {
        Self {
            kind: Kind::Rejected {
                response: Some(rejection.into_response()),
            },
        }
    }
}

impl<F, B, E> Future for ResponseFuture<F, B>
where
    F: Future<Output = Result<Response<B>, E>>,
{
    type Output = Result<Response<B>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project().kind.project() {
            KindProj::Annotated {
                future,
                limit,
                remaining,
            } => {
                let mut response = ready!(future.poll(cx))?;
                let headers = response.headers_mut();
                headers.insert(X_RATELIMIT_LIMIT, limit.clone());
                headers.insert(X_RATELIMIT_REMAINING, remaining.clone());
                Poll::Ready(Ok(response))
            }
            KindProj::Rejected { response } => Poll::Ready(Ok(response
                .take()
                .expect("ResponseFuture polled after completion"))),
        }
    }
}
