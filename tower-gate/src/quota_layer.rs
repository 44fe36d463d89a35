use std::sync::Arc;

use tower::Layer;

use crate::quota_service::QuotaGateService;

/// Gates requests behind a rate limiting decision and reports quota state
/// in `X-RateLimit-*` response headers.
#[derive(Debug)]
pub struct QuotaGateLayer<L>
where
    L: ?Sized,
{
    limiter: Arc<L>,
}

impl<L> Clone for QuotaGateLayer<L>
where
    L: ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            limiter: Arc::clone(&self.limiter),
        }
    }
}

impl<L> QuotaGateLayer<L>
where
    L: ?Sized,
{
    /// Create a QuotaGateLayer
    pub fn new(limiter: Arc<L>) -> Self {
        QuotaGateLayer { limiter }
    }
}

impl<L, S> Layer<S> for QuotaGateLayer<L>
where
    L: ?Sized,
{
    type Service = QuotaGateService<L, S>;

    fn layer(&self, service: S) -> Self::Service {
        QuotaGateService::new(service, self.limiter.clone())
    }
}
