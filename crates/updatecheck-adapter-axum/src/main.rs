use std::net::SocketAddr;
use std::path::Path;

use anyhow::Context;
use log::LevelFilter;

use updatecheck_adapter_axum::{
    GatewayServer, GatewayServerConfig, HttpAnalyticsSink, ReqwestOriginClient,
};
use updatecheck_core::analytics::AnalyticsHandle;
use updatecheck_core::config::GatewayManifest;
use updatecheck_core::gateway::Gateway;
use updatecheck_core::http::Uri;
use updatecheck_core::origin::OriginHandle;

fn main() {
    if let Err(err) = run() {
        eprintln!("updatecheck-adapter-axum failed: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let manifest_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "updatecheck.toml".to_string());
    let manifest = GatewayManifest::from_path(Path::new(&manifest_path))
        .with_context(|| format!("failed to load manifest {manifest_path}"))?;

    simple_logger::SimpleLogger::new()
        .with_level(LevelFilter::from(manifest.logging.level))
        .init()
        .ok();

    let base: Uri = manifest
        .origin
        .url
        .parse()
        .context("origin url is not a valid URI")?;
    let addr: SocketAddr = manifest
        .listen
        .addr
        .parse()
        .context("listen addr is not a valid socket address")?;

    let origin = OriginHandle::with_client(ReqwestOriginClient::default(), base);
    let mut gateway = Gateway::new(origin);

    match &manifest.analytics {
        Some(analytics) => {
            let sink = HttpAnalyticsSink::new(&analytics.endpoint, analytics.dataset.clone())
                .context("failed to build analytics sink")?;
            log::info!("analytics binding enabled dataset={}", sink.dataset());
            gateway = gateway.with_analytics(AnalyticsHandle::with_sink(sink));
        }
        None => {
            log::info!("analytics binding absent; update checks will not be recorded");
        }
    }

    log::info!(
        "starting update-check gateway on {} origin={}",
        addr,
        manifest.origin.url
    );

    let config = GatewayServerConfig {
        addr,
        enable_ctrl_c: true,
    };
    GatewayServer::with_config(gateway, config)
        .run()
        .context("gateway server")
}
