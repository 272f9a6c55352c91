use anyhow::Error as AnyError;
use serde_json::json;
use thiserror::Error;

use crate::body::Body;
use crate::http::{header::CONTENT_TYPE, response_builder, HeaderValue, Response, StatusCode};

/// Gateway-level error that carries an HTTP status code.
///
/// The gateway has exactly one failure domain of its own — the pass-through
/// fetch. Analytics failures never become errors (spec: fire-and-forget), and
/// missing query parameters are resolved by default substitution.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("upstream fetch failed: {source}")]
    Upstream { source: AnyError },
    #[error("internal error: {source}")]
    Internal {
        #[from]
        source: AnyError,
    },
}

impl GatewayError {
    pub fn upstream<E>(error: E) -> Self
    where
        E: Into<AnyError>,
    {
        GatewayError::Upstream {
            source: error.into(),
        }
    }

    pub fn internal<E>(error: E) -> Self
    where
        E: Into<AnyError>,
    {
        GatewayError::Internal {
            source: error.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            GatewayError::Upstream { source } => format!("upstream fetch failed: {}", source),
            GatewayError::Internal { source } => format!("internal error: {}", source),
        }
    }

    pub fn source_error(&self) -> &AnyError {
        match self {
            GatewayError::Upstream { source } => source,
            GatewayError::Internal { source } => source,
        }
    }

    /// Render the error as the JSON payload returned to callers when the
    /// origin cannot be reached.
    pub fn to_response(&self) -> Response {
        let payload = json!({
            "error": {
                "status": self.status().as_u16(),
                "message": self.message(),
            }
        });

        let body = Body::json(&payload).unwrap_or_else(|_| Body::text("internal error"));
        response_builder()
            .status(self.status())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body)
            .expect("static response builder should not fail")
    }
}
