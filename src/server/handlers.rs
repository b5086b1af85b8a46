//! Request handlers
//!
//! Every response body is JSON. Errors use `{"error": "<message>"}`.

use super::form::parse_upload_form;
use super::AppState;
use crate::metrics;
use crate::router::Route;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE, ORIGIN};
use hyper::{Request, Response, StatusCode};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::Instrument;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

#[derive(Serialize)]
struct UploadBody<'a> {
    message: &'a str,
    song_id: &'a str,
}

/// Entry point for every request on every connection
pub(crate) async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!(
        "http.request",
        http.method = %req.method(),
        http.target = %req.uri().path(),
        request.id = %request_id,
        http.status_code = tracing::field::Empty,
    );

    async move {
        let origin = req.headers().get(ORIGIN).cloned();
        let route = Route::resolve(req.method(), req.uri().path());

        let mut response = match route {
            Route::Health => json_response(StatusCode::OK, &HealthBody { status: "healthy" }),
            Route::ListSongs => list_songs(&state).await,
            Route::Upload => upload(req, &state).await,
            Route::Preflight => empty_response(StatusCode::NO_CONTENT),
            Route::MethodNotAllowed { allow } => {
                let mut response =
                    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
                response
                    .headers_mut()
                    .insert(ALLOW, HeaderValue::from_static(allow));
                response
            }
            Route::NotFound => error_response(StatusCode::NOT_FOUND, "Not found"),
        };

        state.cors.apply(
            origin.as_ref(),
            response.headers_mut(),
            route == Route::Preflight,
        );

        let status = response.status().as_u16();
        tracing::Span::current().record("http.status_code", status);
        metrics::record_http_response(route.name(), status);
        tracing::debug!(route = route.name(), status, "Request completed");

        Ok(response)
    }
    .instrument(span)
    .await
}

async fn list_songs(state: &AppState) -> Response<Full<Bytes>> {
    match state.songs.list().await {
        Ok(songs) => {
            metrics::record_listing(true);
            json_response(StatusCode::OK, &songs)
        }
        Err(e) => {
            metrics::record_listing(false);
            metrics::record_error("listing");
            tracing::error!(error = %e, "Failed to list songs");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

async fn upload(req: Request<Incoming>, state: &AppState) -> Response<Full<Bytes>> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = req.into_body().into_data_stream();
    let request = match parse_upload_form(content_type.as_deref(), body, state.limits).await {
        Ok(request) => request,
        Err(e) => {
            metrics::record_upload_rejected();
            tracing::warn!(error = %e, "Upload form rejected");
            return error_response(e.status_code(), &e.to_string());
        }
    };

    match state.uploads.handle(request).await {
        Ok(receipt) => json_response(
            StatusCode::CREATED,
            &UploadBody {
                message: &receipt.message,
                song_id: &receipt.song_id,
            },
        ),
        Err(e) => error_response(e.status_code(), &e.to_string()),
    }
}

fn json_response<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(value) {
        Ok(body) => build_response(status, Some("application/json"), Bytes::from(body)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response body");
            build_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                Some("application/json"),
                Bytes::from_static(br#"{"error":"Internal server error"}"#),
            )
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    json_response(status, &ErrorBody { error: message })
}

fn empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    build_response(status, None, Bytes::new())
}

fn build_response(
    status: StatusCode,
    content_type: Option<&'static str>,
    body: Bytes,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    if let Some(content_type) = content_type {
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    }
    response
}
