use std::net::{SocketAddr, TcpListener as StdTcpListener};

use anyhow::Context;
use axum::Router;
use tokio::runtime::Builder as RuntimeBuilder;
use tokio::signal;
use tower::{service_fn, Service};

use updatecheck_core::gateway::Gateway;

use crate::service::GatewayAxumService;

/// Configuration for the gateway listener.
#[derive(Clone)]
pub struct GatewayServerConfig {
    pub addr: SocketAddr,
    pub enable_ctrl_c: bool,
}

impl Default for GatewayServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8787)),
            enable_ctrl_c: true,
        }
    }
}

/// Blocking server runner that owns its tokio runtime.
///
/// Every request reaches the gateway through an axum fallback service —
/// there is no route table here. Which hostnames and paths reach this
/// process at all is the deployment's concern, not the gateway's.
pub struct GatewayServer {
    gateway: Gateway,
    config: GatewayServerConfig,
}

impl GatewayServer {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            config: GatewayServerConfig::default(),
        }
    }

    pub fn with_config(gateway: Gateway, config: GatewayServerConfig) -> Self {
        Self { gateway, config }
    }

    pub fn run(self) -> anyhow::Result<()> {
        let runtime = RuntimeBuilder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to build tokio runtime")?;

        runtime.block_on(async move { self.run_async().await })
    }

    async fn run_async(self) -> anyhow::Result<()> {
        // Bind as a std listener first so bind errors surface before the
        // server future starts.
        let listener = StdTcpListener::bind(self.config.addr)
            .with_context(|| format!("failed to bind gateway to {}", self.config.addr))?;
        listener
            .set_nonblocking(true)
            .context("failed to set listener to non-blocking")?;

        let listener = tokio::net::TcpListener::from_std(listener)
            .context("failed to adopt std listener into tokio")?;

        self.serve(listener).await
    }

    /// Serve on an already-bound listener. Exposed so tests and embedders
    /// can run the gateway on an ephemeral port.
    pub async fn serve(self, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
        let GatewayServer { gateway, config } = self;

        let service = GatewayAxumService::new(gateway);
        let router = Router::new().fallback_service(service_fn(move |req| {
            let mut svc = service.clone();
            async move { svc.call(req).await }
        }));
        let make_service = router.into_make_service();

        let server = axum::serve(listener, make_service);
        if config.enable_ctrl_c {
            let shutdown = async {
                let _ = signal::ctrl_c().await;
            };
            server
                .with_graceful_shutdown(shutdown)
                .await
                .context("axum server error")?;
        } else {
            server.await.context("axum server error")?;
        }

        Ok(())
    }
}
