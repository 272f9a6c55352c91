//! The request interceptor/proxy.

use crate::analytics::AnalyticsHandle;
use crate::check::{is_version_check, UpdateCheck};
use crate::error::GatewayError;
use crate::http::{Request, Response};
use crate::origin::OriginHandle;

/// Intercepts version-check probes and proxies everything to the origin.
///
/// Both collaborators are injected: the origin handle is required, the
/// analytics handle is optional (an unbound sink downgrades instrumentation
/// to a no-op, never to an error). The gateway holds no other state, so
/// concurrent requests share nothing but the two handles.
pub struct Gateway {
    origin: OriginHandle,
    analytics: Option<AnalyticsHandle>,
}

impl Gateway {
    pub fn new(origin: OriginHandle) -> Self {
        Self {
            origin,
            analytics: None,
        }
    }

    /// Attach the analytics binding.
    #[must_use]
    pub fn with_analytics(mut self, analytics: AnalyticsHandle) -> Self {
        self.analytics = Some(analytics);
        self
    }

    pub fn origin(&self) -> &OriginHandle {
        &self.origin
    }

    pub fn analytics(&self) -> Option<&AnalyticsHandle> {
        self.analytics.as_ref()
    }

    /// Handle one inbound request.
    ///
    /// Iff the request is the version-check probe, an update-check event is
    /// submitted to the analytics binding — fire-and-forget, before and
    /// independent of the fetch. The request is then forwarded to the origin
    /// and the origin's response returned verbatim, whether or not it was
    /// instrumented.
    pub async fn handle(&self, request: Request) -> Result<Response, GatewayError> {
        if is_version_check(request.method(), request.uri().path()) {
            let check = UpdateCheck::from_query(request.uri().query().unwrap_or(""));
            tracing::debug!(
                "update check version={} os={} arch={}",
                check.version,
                check.os,
                check.arch
            );
            if let Some(analytics) = &self.analytics {
                analytics.write_data_point(check.data_point());
            }
        }

        self.origin.forward(request).await
    }
}
