//! Axum adapter for the CodexDNS update-check gateway: the native listener,
//! the reqwest origin client, and the HTTP analytics sink.

mod client;
mod request;
mod response;
mod server;
mod service;
mod sink;

pub use client::ReqwestOriginClient;
pub use request::into_core_request;
pub use response::into_axum_response;
pub use server::{GatewayServer, GatewayServerConfig};
pub use service::GatewayAxumService;
pub use sink::HttpAnalyticsSink;
