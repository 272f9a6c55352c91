use axum::body::Body as AxumBody;
use axum::http::Request;
use updatecheck_core::body::Body;
use updatecheck_core::http::Request as CoreRequest;

/// Convert an Axum/Hyper request into a core request.
///
/// The body always stays streaming: the gateway never interprets request
/// bodies, it only relays them to the origin.
pub fn into_core_request(request: Request<AxumBody>) -> CoreRequest {
    let (parts, body) = request.into_parts();
    let stream = body.into_data_stream();
    CoreRequest::from_parts(parts, Body::from_stream(stream))
}
