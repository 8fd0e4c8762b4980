//! Browse API and raw file routes

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use super::error::ApiError;
use super::server::ServerState;
use crate::browse::{
    escape_path, list, pick_random_media, sort_entries, Listing, SortField, SortOrder,
    BROWSE_PREFIX, FILES_PREFIX,
};

/// Query parameters of `/api/files`
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub path: String,
    pub sort: Option<String>,
    pub order: Option<String>,
}

/// Query parameters of `/api/random-media`
#[derive(Debug, Default, Deserialize)]
pub struct MediaQuery {
    #[serde(default)]
    pub path: String,
}

/// List a directory
///
/// Route: GET /api/files?path=&sort=&order=
pub async fn api_files(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Listing>, ApiError> {
    let root = state.root.clone();
    let path = query.path;
    let mut listing = tokio::task::spawn_blocking(move || list(&root, &path))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    let field = query.sort.as_deref().and_then(SortField::parse);
    let order = query
        .order
        .as_deref()
        .map(SortOrder::parse)
        .unwrap_or_default();
    sort_entries(&mut listing.entries, field, order);

    Ok(Json(listing))
}

/// Link of a random media file in a directory
///
/// Route: GET /api/random-media?path=
pub async fn api_random_media(
    State(state): State<ServerState>,
    Query(query): Query<MediaQuery>,
) -> Result<Response, ApiError> {
    let root = state.root.clone();
    let path = query.path;
    let link = tokio::task::spawn_blocking(move || pick_random_media(&root, &path))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        link,
    )
        .into_response())
}

/// Download a file
///
/// Route: GET /files/*path
///
/// The tail is decoded strictly from the raw URI. Directories redirect to
/// their browse page; everything else is handed to `ServeFile` for content
/// type, range and conditional handling.
pub async fn serve_file(
    State(state): State<ServerState>,
    request: Request<Body>,
) -> Result<Response, ApiError> {
    let raw = request
        .uri()
        .path()
        .strip_prefix(FILES_PREFIX)
        .unwrap_or_default();
    let relative = decode_path(raw)?;
    let resolved = state.root.resolve(&relative)?;

    let metadata = match tokio::fs::metadata(&resolved.absolute).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound(format!("file not found: '{}'", resolved.relative)))
        }
        Err(e) => return Err(ApiError::Io(format!("cannot read '{}': {}", resolved.relative, e))),
    };

    if metadata.is_dir() {
        let location = format!("{}{}", BROWSE_PREFIX, escape_path(&resolved.relative));
        return Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response());
    }

    match ServeFile::new(&resolved.absolute).oneshot(request).await {
        Ok(response) => Ok(response.map(Body::new)),
        Err(e) => Err(ApiError::Internal(e.to_string())),
    }
}

/// Percent-decode a URI path tail, rejecting malformed escapes
pub(crate) fn decode_path(raw: &str) -> Result<String, ApiError> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(ApiError::BadRequest(format!("malformed escape in '{}'", raw)));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| ApiError::BadRequest(format!("path is not valid UTF-8: '{}'", raw)))
}
