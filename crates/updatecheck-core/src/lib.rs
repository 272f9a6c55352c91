//! Platform-neutral core of the CodexDNS update-check telemetry gateway.
//!
//! The gateway fronts a static documentation host: it records an analytics
//! data point for the desktop client's version-check probe and transparently
//! forwards every request to the origin. Platform concerns (listeners, HTTP
//! clients, the analytics ingest transport) live in adapter crates.

pub mod analytics;
pub mod body;
pub mod check;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod origin;
