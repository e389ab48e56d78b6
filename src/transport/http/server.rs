//! The server half of the reference HTTP peer transport.
//!
//! Grounded on the reference Go source's `HTTPPool.ServeHTTP` (`http.go`):
//! split the request path into a group name and a key, look the group up in
//! the process registry, and serve the group's `Get` result as an
//! `application/octet-stream` body. `axum`'s router performs the
//! prefix/path matching the Go version does by hand with `strings.HasPrefix`
//! and `SplitN`, but a path that doesn't even split into a group and a key
//! segment (`examples/original_source/gocache/http.go:47-51`'s
//! `len(parts) != 2` case) needs its own `400`, via [`router`]'s fallback,
//! rather than falling through to axum's generic unmatched-route response.

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use prost::Message as _;
use tracing::{info, warn};

use crate::error::CacheError;
use crate::group::Group;
use crate::transport::proto;

/// Builds the router answering peer requests for any registered group.
///
/// Mount this under whatever base path the deployment chooses (the demo
/// binary mounts it at [`super::DEFAULT_BASE_PATH`]); the router itself is
/// prefix-agnostic. A request path with no group/key segment at all falls
/// to [`malformed_path`] rather than axum's bare 404, so it stays
/// distinguishable from the "no such group" 404 [`handle_get`] returns.
pub fn router() -> Router {
    Router::new().route("/:group/*key", get(handle_get)).fallback(malformed_path)
}

async fn malformed_path() -> Response {
    (StatusCode::BAD_REQUEST, "malformed request path: expected <group>/<key>").into_response()
}

async fn handle_get(Path((group, key)): Path<(String, String)>) -> Response {
    info!(group, key, "peer request");

    if key.is_empty() {
        return error_response(CacheError::InvalidInput);
    }

    let group = match Group::get_group(&group) {
        Some(group) => group,
        None => return error_response(CacheError::NotFound(group)),
    };

    match group.get(&key).await {
        Ok(view) => {
            let body = proto::Response {
                value: view.as_bytes_handle(),
            }
            .encode_length_delimited_to_vec();
            ([("content-type", "application/octet-stream")], body).into_response()
        }
        Err(err) => error_response(err),
    }
}

fn error_response(err: CacheError) -> Response {
    match err {
        CacheError::InvalidInput => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
        CacheError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()).into_response(),
        CacheError::LoaderError(_) | CacheError::PeerError(_) => {
            warn!(error = %err, "peer request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}
