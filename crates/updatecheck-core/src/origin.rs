//! Transparent pass-through to the origin server.
//!
//! The gateway never answers from its own content: every inbound request is
//! rebased onto the configured origin and dispatched through an
//! [`OriginClient`], and the origin's response is relayed to the caller
//! verbatim (status, headers, body).

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::body::Body;
use crate::error::GatewayError;
use crate::http::{
    header, response_builder, HeaderMap, HeaderName, Method, Request, Response, StatusCode, Uri,
};

/// Headers that describe the connection rather than the message. They must
/// not be relayed; the HTTP client on each hop re-frames them.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Outbound request description for the pass-through fetch.
pub struct OriginRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
}

impl OriginRequest {
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Body::empty(),
        }
    }

    /// Build the upstream request from an inbound one.
    ///
    /// Method and body carry over unchanged. End-to-end headers pass through
    /// untouched; hop-by-hop headers, `host`, and `content-length` are
    /// dropped because the client re-derives them for the upstream
    /// connection.
    pub fn from_request(request: Request, uri: Uri) -> Self {
        let (parts, body) = request.into_parts();

        let mut headers = HeaderMap::new();
        for (name, value) in parts.headers.iter() {
            if is_hop_by_hop(name) || name == &header::HOST || name == &header::CONTENT_LENGTH {
                continue;
            }
            headers.append(name.clone(), value.clone());
        }

        Self {
            method: parts.method,
            uri,
            headers,
            body,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    pub fn into_parts(self) -> (Method, Uri, HeaderMap, Body) {
        (self.method, self.uri, self.headers, self.body)
    }
}

impl fmt::Debug for OriginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OriginRequest")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("headers", &self.headers)
            .finish()
    }
}

/// Response received from the origin, relayed verbatim to the caller.
pub struct OriginResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Body,
}

impl OriginResponse {
    pub fn new(status: StatusCode, body: Body) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    pub fn into_response(self) -> Response {
        let mut builder = response_builder().status(self.status);
        for (name, value) in self.headers.iter() {
            builder = builder.header(name, value);
        }
        builder
            .body(self.body)
            .expect("origin response builder should not fail")
    }
}

impl fmt::Debug for OriginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OriginResponse")
            .field("status", &self.status)
            .finish()
    }
}

/// Object-safe interface for the upstream HTTP client.
///
/// Implementations exist per adapter; the native one wraps `reqwest`.
#[async_trait(?Send)]
pub trait OriginClient: Send + Sync {
    async fn send(&self, request: OriginRequest) -> Result<OriginResponse, GatewayError>;
}

/// A cloneable handle that rebases inbound requests onto the configured
/// origin and forwards them through the client.
#[derive(Clone)]
pub struct OriginHandle {
    client: Arc<dyn OriginClient>,
    base: Uri,
}

impl OriginHandle {
    pub fn new(client: Arc<dyn OriginClient>, base: Uri) -> Self {
        Self { client, base }
    }

    pub fn with_client<C>(client: C, base: Uri) -> Self
    where
        C: OriginClient + 'static,
    {
        Self {
            client: Arc::new(client),
            base,
        }
    }

    pub fn base(&self) -> &Uri {
        &self.base
    }

    /// Target URI for an inbound request: the origin's scheme and authority
    /// with the inbound path and query preserved.
    pub fn rebase(&self, uri: &Uri) -> Result<Uri, GatewayError> {
        let scheme = self
            .base
            .scheme()
            .ok_or_else(|| GatewayError::internal(anyhow::anyhow!("origin url missing scheme")))?;
        let authority = self.base.authority().ok_or_else(|| {
            GatewayError::internal(anyhow::anyhow!("origin url missing authority"))
        })?;
        let path_and_query = match uri.path_and_query() {
            Some(paq) if !paq.as_str().is_empty() => paq.as_str(),
            _ => "/",
        };

        Uri::builder()
            .scheme(scheme.clone())
            .authority(authority.clone())
            .path_and_query(path_and_query)
            .build()
            .map_err(GatewayError::internal)
    }

    /// Forward an inbound request to the origin and return its response.
    pub async fn forward(&self, request: Request) -> Result<Response, GatewayError> {
        let target = self.rebase(request.uri())?;
        let upstream = OriginRequest::from_request(request, target);
        let response = self.client.send(upstream).await?;
        Ok(response.into_response())
    }
}

impl fmt::Debug for OriginHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OriginHandle")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}
