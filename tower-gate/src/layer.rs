use std::sync::Arc;

use tower::Layer;

use crate::service::GateService;

/// Gates requests behind a rate limiting decision.
///
/// The limiter is shared by every service the layer produces, so one layer
/// can stamp out gated services for as many connections as the server
/// spawns while they all draw on the same budget.
#[derive(Debug)]
pub struct GateLayer<L>
where
    L: ?Sized,
{
    limiter: Arc<L>,
}

impl<L> Clone for GateLayer<L>
where
    L: ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            limiter: Arc::clone(&self.limiter),
        }
    }
}

impl<L> GateLayer<L>
where
    L: ?Sized,
{
    /// Create a GateLayer
    pub fn new(limiter: Arc<L>) -> Self {
        GateLayer { limiter }
    }
}

impl<L, S> Layer<S> for GateLayer<L>
where
    L: ?Sized,
{
    type Service = GateService<L, S>;

    fn layer(&self, service: S) -> Self::Service {
        GateService::new(service, self.limiter.clone())
    }
}
