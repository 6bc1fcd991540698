//! HTTP request handlers for the download API.

use crate::api::{self, ApiCall, ApiParams, ApiRequest, ApiResponse, CallResponse};
use crate::http::{ENVELOPE_PATH, Endpoint, is_versioned_path, versioned_call};
use crate::server::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use cm_buildlist::BuildListError;
use std::sync::Arc;

/// Handle every request by dispatching through the route table.
///
/// Paths under the versioned prefix are served whatever their depth, and
/// any method other than POST on an API path is answered with 405.
///
/// # Errors
///
/// Returns `AppError` if the build catalog cannot be loaded.
pub async fn handle_request(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let path = uri.path();
    tracing::debug!("Handling {} {}", method, path);

    let routes = state.routes();
    let endpoint = match routes.route(&method, path) {
        Some((endpoint, _)) => *endpoint,
        None if method == Method::POST && is_versioned_path(path) => Endpoint::Versioned,
        None if routes.matches_path(path) || is_versioned_path(path) => {
            return Ok(method_not_allowed(&method));
        }
        None => return Ok(not_found()),
    };

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    let request = match endpoint {
        Endpoint::Envelope if path != ENVELOPE_PATH => None,
        Endpoint::Envelope => ApiRequest::decode(content_type, &body)
            .and_then(|request| request.call().map(|call| (call, request.params))),
        Endpoint::Versioned => versioned_call(path)
            .and_then(ApiCall::from_name)
            .and_then(|call| versioned_params(content_type, &body).map(|params| (call, params))),
    };

    let Some((call, params)) = request else {
        tracing::debug!("Rejecting undecodable request to {}", path);
        return Ok(json_response(
            StatusCode::OK,
            &ApiResponse::error(api::DECODE_ERROR),
        ));
    };

    let body = run_call(state, call, params).await?;
    Ok(json_response(StatusCode::OK, &body))
}

/// Parameters of a versioned call: from a JSON body when one was sent.
fn versioned_params(content_type: Option<&str>, body: &[u8]) -> Option<ApiParams> {
    let sends_json = content_type.is_some_and(api::is_json_media_type);
    if body.is_empty() || !sends_json {
        return Some(ApiParams::default());
    }
    ApiRequest::decode(content_type, body).map(|request| request.params)
}

/// Run a call on the blocking pool; sources read the filesystem.
async fn run_call(
    state: Arc<AppState>,
    call: ApiCall,
    params: ApiParams,
) -> Result<CallResponse, AppError> {
    tracing::debug!("Dispatching {}", call.name());

    tokio::task::spawn_blocking(move || api::execute(call, &params, state.service()))
        .await
        .map_err(|e| AppError::Internal(format!("catalog task failed: {e}")))?
        .map_err(AppError::from)
}

fn json_response<T: serde::Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_string_pretty(body) {
        Ok(json) => (
            status,
            [(header::CONTENT_TYPE, api::JSON_MEDIA_TYPE)],
            json,
        )
            .into_response(),
        Err(e) => AppError::Internal(format!("response encoding failed: {e}")).into_response(),
    }
}

fn method_not_allowed(method: &Method) -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::ALLOW, "POST"),
        ],
        format!(
            "405 Method Not Allowed\n\nThe method {method} is not allowed for this resource."
        ),
    )
        .into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "404 Not Found",
    )
        .into_response()
}

/// Application-level error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Build catalog could not be loaded (500)
    Catalog(BuildListError),
    /// Runtime failure outside the catalog (500)
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            Self::Catalog(err) => tracing::error!("Build catalog error: {err}"),
            Self::Internal(msg) => tracing::error!("Internal error: {msg}"),
        }

        let body = serde_json::to_string_pretty(&ApiResponse::error(api::INTERNAL_ERROR))
            .unwrap_or_default();

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, api::JSON_MEDIA_TYPE)],
            body,
        )
            .into_response()
    }
}

impl From<BuildListError> for AppError {
    fn from(err: BuildListError) -> Self {
        Self::Catalog(err)
    }
}
