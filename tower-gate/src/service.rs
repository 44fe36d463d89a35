use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::Context;
use std::task::Poll;

use gate_limit::RateLimiter;
use http::Request;
use http::Response;
use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::metrics::Counter;
use pin_project_lite::pin_project;
use tower::Service;

use crate::error::GateError;

#[derive(Clone, Debug)]
pub(crate) struct GateMetrics {
    decisions: Counter<u64>,
}

impl GateMetrics {
    pub(crate) fn new() -> Self {
        let meter = global::meter("tower_gate");
        Self {
            decisions: meter.u64_counter("gate_decisions").build(),
        }
    }

    pub(crate) fn record(&self, outcome: &'static str) {
        self.decisions.add(1, &[KeyValue::new("outcome", outcome)]);
    }
}

/// Gates each request behind a [`RateLimiter`] decision.
///
/// Allowed requests reach the inner service untouched; denials answer
/// `429 Too Many Requests` and limiter failures answer
/// `500 Internal Server Error`, both with empty bodies and without invoking
/// the inner service.
#[derive(Debug)]
pub struct GateService<L, S>
where
    L: ?Sized,
{
    inner: S,
    limiter: Arc<L>,
    metrics: GateMetrics,
}

impl<L, S> GateService<L, S>
where
    L: ?Sized,
{
    /// Create a GateService around an inner service.
    pub fn new(inner: S, limiter: Arc<L>) -> Self {
        Self {
            inner,
            limiter,
            metrics: GateMetrics::new(),
        }
    }
}

impl<L, S> Clone for GateService<L, S>
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

impl<L, S, ReqB, ResB> Service<Request<ReqB>> for GateService<L, S>
where
    L: RateLimiter<ReqB> + ?Sized,
    S: Service<Request<ReqB>, Response = Response<ResB>>,
    ResB: Default,
{
    type Response = Response<ResB>;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future, ResB>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // The gate adds no readiness of its own; rejections are responses,
        // not backpressure.
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqB>) -> Self::Future {
        match self.limiter.is_allowed(&req) {
            Err(err) => {
                tracing::error!(error = %err, "rate limiter failed to reach a decision");
                self.metrics.record("failed");
                ResponseFuture::rejected(GateError::Limiter(err.to_string()))
            }
            Ok(false) => {
                tracing::debug!("request denied by rate limiter");
                self.metrics.record("denied");
                ResponseFuture::rejected(GateError::RateLimited { retry_after: None })
            }
            Ok(true) => {
                self.metrics.record("allowed");
                ResponseFuture::forwarded(self.inner.call(req))
            }
        }
    }
}

pin_project! {
    /// Response future for [`GateService`].
    pub struct ResponseFuture<F, B> {
        #[pin]
        kind: Kind<F, B>,
    }
}

pin_project! {
    #[project = KindProj]
    enum Kind<F, B> {
        Forwarded {
            #[pin]
            future: F,
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
    fn forwarded(future: F) -> Self {
        Self {
            kind: Kind::Forwarded { future },
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
            KindProj::Forwarded { future } => future.poll(cx),
            KindProj::Rejected { response } => Poll::Ready(Ok(response
                .take()
                .expect("ResponseFuture polled after completion"))),
        }
    }
}
