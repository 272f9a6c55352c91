use axum::body::Body as AxumBody;
use axum::http::{Response, StatusCode};
use futures::executor::block_on;
use futures_util::{pin_mut, StreamExt};
use tracing::error;

use updatecheck_core::body::Body;
use updatecheck_core::http::Response as CoreResponse;

/// Convert a core response into one consumable by Axum/Hyper.
///
/// Streaming bodies are collected into a buffer: the core streaming type is
/// not `Send`, so it cannot cross into hyper's response body directly.
pub fn into_axum_response(response: CoreResponse) -> Response<AxumBody> {
    let (parts, body) = response.into_parts();
    let body = match body {
        Body::Once(bytes) => AxumBody::from(bytes),
        Body::Stream(stream) => {
            let result = block_on(async {
                let mut buf = Vec::new();
                let stream = stream;
                pin_mut!(stream);
                while let Some(chunk) = stream.next().await {
                    let bytes = chunk?;
                    buf.extend_from_slice(&bytes);
                }
                Ok::<Vec<u8>, anyhow::Error>(buf)
            });
            match result {
                Ok(buf) => AxumBody::from(buf),
                Err(err) => {
                    error!("streaming response error: {err}");
                    let mut response = Response::builder()
                        .status(StatusCode::BAD_GATEWAY)
                        .body(AxumBody::from("streaming response error"))
                        .expect("error response");
                    response.headers_mut().insert(
                        axum::http::header::CONTENT_TYPE,
                        axum::http::HeaderValue::from_static("text/plain; charset=utf-8"),
                    );
                    return response;
                }
            }
        }
    };

    Response::from_parts(parts, body)
}
