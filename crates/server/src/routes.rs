use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::{header::HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::dispatcher::Dispatcher;
use crate::errors::ApiError;
use crate::event::{Envelope, HttpEvent};

/// Raw gateway invocation: the request body is an `HttpEvent`, the response
/// body is the `Envelope` itself.
async fn invoke(
    State(dispatcher): State<Arc<Dispatcher>>,
    body: Bytes,
) -> Result<Json<Envelope>, ApiError> {
    let event: HttpEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("invalid event: {e}")))?;
    Ok(Json(dispatcher.handle(&event).await))
}

/// Any other request is turned into an event and the envelope unwrapped
/// into a plain HTTP response. The body is taken as raw bytes so that
/// undecodable input still reaches the routed operation.
async fn dispatch_http(
    State(dispatcher): State<Arc<Dispatcher>>,
    method: Method,
    uri: Uri,
    query: Option<Query<HashMap<String, String>>>,
    body: Bytes,
) -> Response {
    let event = HttpEvent {
        http_method: method.to_string(),
        path: uri.path().to_string(),
        query_string_parameters: query.map(|Query(q)| q).filter(|q| !q.is_empty()),
        body: (!body.is_empty()).then(|| String::from_utf8_lossy(&body).into_owned()),
    };
    envelope_response(dispatcher.handle(&event).await)
}

fn envelope_response(envelope: Envelope) -> Response {
    let status = StatusCode::from_u16(envelope.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, Body::from(envelope.body)).into_response();
    let headers = response.headers_mut();
    for (name, value) in &envelope.headers {
        if let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            headers.insert(name, value);
        }
    }
    response
}

/// Build the application router: the invocation endpoint plus a fallback that
/// routes everything else through the dispatcher.
pub fn build_router(dispatcher: Arc<Dispatcher>, invoke_path: &str, cors: CorsLayer) -> Router {
    Router::new()
        .route(invoke_path, post(invoke).fallback(dispatch_http))
        .fallback(dispatch_http)
        .with_state(dispatcher)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 5xx
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
