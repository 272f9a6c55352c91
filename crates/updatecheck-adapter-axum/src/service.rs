use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body as AxumBody;
use axum::http::{Request, Response};
use tokio::{runtime::Handle, task};
use tower::Service;

use updatecheck_core::gateway::Gateway;

use crate::request::into_core_request;
use crate::response::into_axum_response;

/// Tower service that feeds every Axum/Hyper request through the gateway.
///
/// The gateway future is not `Send` (its origin client is built for wasm
/// compatibility), so the service drives it to completion on the current
/// worker via `block_in_place` instead of awaiting it.
#[derive(Clone)]
pub struct GatewayAxumService {
    gateway: Arc<Gateway>,
}

impl GatewayAxumService {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }
}

impl Service<Request<AxumBody>> for GatewayAxumService {
    type Response = Response<AxumBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<AxumBody>) -> Self::Future {
        let gateway = Arc::clone(&self.gateway);
        Box::pin(async move {
            let method = request.method().clone();
            let path = request.uri().path().to_string();
            let start = Instant::now();

            let core_request = into_core_request(request);
            let result = task::block_in_place(move || {
                Handle::current().block_on(gateway.handle(core_request))
            });

            let core_response = match result {
                Ok(response) => {
                    let elapsed = start.elapsed().as_secs_f64() * 1000.0;
                    tracing::info!(
                        "request method={} path={} status={} elapsed_ms={:.2}",
                        method,
                        path,
                        response.status().as_u16(),
                        elapsed
                    );
                    response
                }
                Err(err) => {
                    let elapsed = start.elapsed().as_secs_f64() * 1000.0;
                    tracing::error!(
                        "request method={} path={} status={} error={} elapsed_ms={:.2}",
                        method,
                        path,
                        err.status().as_u16(),
                        err.message(),
                        elapsed
                    );
                    err.to_response()
                }
            };

            Ok(into_axum_response(core_response))
        })
    }
}
