use std::sync::Arc;
use std::time::Duration;

use criterion::Criterion;
use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;
use gate_limit::BoxError;
use gate_limit::Quota;
use gate_limit::QuotaRateLimiter;
use gate_limit::RateLimiter;
use http::Request;
use http::Response;
use tower::Layer;
use tower::Service;
use tower::ServiceExt;
use tower::service_fn;
use tower_gate::GateLayer;
use tower_gate::QuotaGateLayer;

/// Always-allow limiter so we measure gate overhead, not limiter math.
#[derive(Debug)]
struct OpenGate;

impl<B> RateLimiter<B> for OpenGate {
    fn is_allowed(&self, _request: &Request<B>) -> Result<bool, BoxError> {
        Ok(true)
    }
}

impl<B> QuotaRateLimiter<B> for OpenGate {
    fn quota(&self, _request: &Request<B>) -> Quota {
        Quota {
            remaining: 99,
            limit: 100,
            retry_after: Duration::ZERO,
        }
    }
}

async fn noop_handler(_req: Request<String>) -> Result<Response<String>, BoxError> {
    Ok(Response::new("ok".to_string()))
}

fn bench_gate_overhead(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(8)
        .enable_all()
        .build()
        .unwrap();
    let _guard = rt.enter();

    let mut group = c.benchmark_group("gate_overhead");

    let gated = GateLayer::new(Arc::new(OpenGate)).layer(service_fn(noop_handler));
    group.bench_function("gate_allow", |b| {
        b.to_async(&rt).iter(|| {
            let mut svc = gated.clone();
            async move {
                let req = Request::builder().body("test".to_string()).unwrap();
                let res = svc.ready().await.unwrap().call(req).await;
                black_box(res)
            }
        });
    });

    let quota_gated = QuotaGateLayer::new(Arc::new(OpenGate)).layer(service_fn(noop_handler));
    group.bench_function("quota_gate_allow", |b| {
        b.to_async(&rt).iter(|| {
            let mut svc = quota_gated.clone();
            async move {
                let req = Request::builder().body("test".to_string()).unwrap();
                let res = svc.ready().await.unwrap().call(req).await;
                black_box(res)
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_gate_overhead);
criterion_main!(benches);
