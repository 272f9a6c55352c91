use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{header, redirect, Client};
use updatecheck_core::body::Body;
use updatecheck_core::error::GatewayError;
use updatecheck_core::http::{HeaderName, HeaderValue, Method, StatusCode};
use updatecheck_core::origin::{is_hop_by_hop, OriginClient, OriginRequest, OriginResponse};

/// Native [`OriginClient`] backed by `reqwest`.
///
/// Redirects are never followed: the gateway is a transparent proxy, so a
/// 3xx from the origin is relayed to the caller like any other response.
pub struct ReqwestOriginClient {
    client: Client,
}

impl Default for ReqwestOriginClient {
    fn default() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .redirect(redirect::Policy::none())
            .build()
            .expect("reqwest client");
        Self { client }
    }
}

#[async_trait(?Send)]
impl OriginClient for ReqwestOriginClient {
    async fn send(&self, request: OriginRequest) -> Result<OriginResponse, GatewayError> {
        let (method, uri, headers, body) = request.into_parts();
        let reqwest_method = reqwest_method(&method)?;
        let mut builder = self.client.request(reqwest_method, uri.to_string());

        for (name, value) in headers.iter() {
            let header_name = header::HeaderName::from_bytes(name.as_str().as_bytes())
                .map_err(GatewayError::internal)?;
            let header_value =
                header::HeaderValue::from_bytes(value.as_bytes()).map_err(GatewayError::internal)?;
            builder = builder.header(header_name, header_value);
        }

        builder = match body {
            Body::Once(bytes) => builder.body(bytes.to_vec()),
            Body::Stream(mut stream) => {
                let mut buf = Vec::new();
                while let Some(chunk) = stream.next().await {
                    let chunk = chunk.map_err(GatewayError::internal)?;
                    buf.extend_from_slice(&chunk);
                }
                builder.body(buf)
            }
        };

        let response = builder.send().await.map_err(GatewayError::upstream)?;
        let status =
            StatusCode::from_u16(response.status().as_u16()).map_err(GatewayError::internal)?;
        let mut origin_response = OriginResponse::new(status, Body::empty());

        for (name, value) in response.headers().iter() {
            let header_name =
                HeaderName::from_bytes(name.as_str().as_bytes()).map_err(GatewayError::internal)?;
            if is_hop_by_hop(&header_name) {
                continue;
            }
            let header_value =
                HeaderValue::from_bytes(value.as_bytes()).map_err(GatewayError::internal)?;
            origin_response
                .headers_mut()
                .append(header_name, header_value);
        }

        let bytes = response.bytes().await.map_err(GatewayError::upstream)?;
        *origin_response.body_mut() = Body::from(bytes.to_vec());

        Ok(origin_response)
    }
}

fn reqwest_method(method: &Method) -> Result<reqwest::Method, GatewayError> {
    reqwest::Method::from_bytes(method.as_str().as_bytes()).map_err(GatewayError::internal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_all_methods_to_reqwest() {
        let cases = [
            (Method::GET, reqwest::Method::GET),
            (Method::POST, reqwest::Method::POST),
            (Method::PUT, reqwest::Method::PUT),
            (Method::DELETE, reqwest::Method::DELETE),
            (Method::PATCH, reqwest::Method::PATCH),
            (Method::HEAD, reqwest::Method::HEAD),
            (Method::OPTIONS, reqwest::Method::OPTIONS),
        ];
        for (input, expected) in cases {
            let result = reqwest_method(&input).expect("method conversion");
            assert_eq!(result, expected);
        }
    }

    #[test]
    fn default_client_creates_successfully() {
        let client = ReqwestOriginClient::default();
        assert!(std::mem::size_of_val(&client) > 0);
    }
}
