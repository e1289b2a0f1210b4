use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use csl_ondemand::bundle::{content_type_for, generate_boundary, http_date};
use csl_ondemand::service::RebuildSummary;
use csl_ondemand::CslError;
use serde::Deserialize;
use tracing::{debug, error};

use super::AppState;

// ============================================================
// Error Handling
// ============================================================

/// Map a core error to a response. Lookup failures are not logged as errors.
fn service_error(e: CslError) -> (StatusCode, String) {
    if e.is_not_found() {
        debug!(error = %e, "Not found");
        return (StatusCode::NOT_FOUND, e.to_string());
    }
    if e.is_cancelled() {
        return (StatusCode::SERVICE_UNAVAILABLE, "Service shutting down".to_string());
    }
    error!(error = %e, "Request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn not_found(what: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("not found: {}", what))
}

// ============================================================
// Match
// ============================================================

#[derive(Debug, Default, Deserialize)]
pub struct MatchParams {
    pub icao: Option<String>,
    pub airline: Option<String>,
    pub livery: Option<String>,
}

pub async fn find_match(
    State(state): State<AppState>,
    Query(params): Query<MatchParams>,
) -> Result<Response, (StatusCode, String)> {
    let key = state
        .service
        .find_match(
            params.icao.as_deref(),
            params.airline.as_deref(),
            params.livery.as_deref(),
        )
        .ok_or_else(|| not_found("no matching aircraft"))?;

    let location = format!("{}/pack/{}", state.prefix, encode_path(&key.to_string()));
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

/// Percent-encode each `/`-separated segment of `path`.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

// ============================================================
// Bundles
// ============================================================

/// `key` is `root/id`, where `root` may itself contain slashes.
pub async fn get_bundle(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, (StatusCode, String)> {
    let (root, id) = key
        .trim_matches('/')
        .rsplit_once('/')
        .ok_or_else(|| not_found(&key))?;

    let cancel = state.shutdown.child_token();
    let bundle = state
        .service
        .assemble_bundle(root, id, state.texture_base_url.as_deref(), &cancel)
        .await
        .map_err(service_error)?;

    let boundary = generate_boundary();
    Ok((
        [(header::CONTENT_TYPE, bundle.content_type(&boundary))],
        bundle.to_multipart(&boundary),
    )
        .into_response())
}

// ============================================================
// Individual files
// ============================================================

pub async fn get_resource(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, (StatusCode, String)> {
    let file = state.service.resource_path(&path).map_err(service_error)?;
    let metadata = match tokio::fs::metadata(&file).await {
        Ok(metadata) if metadata.is_file() => metadata,
        Ok(_) => return Err(not_found(&path)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found(&path)),
        Err(e) => return Err(service_error(CslError::io(&file, e))),
    };
    let contents = tokio::fs::read(&file)
        .await
        .map_err(|e| service_error(CslError::io(&file, e)))?;

    let mut response = Response::new(Body::from(contents));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(&path)),
    );
    let modified = metadata.modified().ok();
    if let Some(value) = modified.and_then(|m| HeaderValue::from_str(&http_date(m)).ok()) {
        response.headers_mut().insert(header::LAST_MODIFIED, value);
    }
    Ok(response)
}

// ============================================================
// Admin
// ============================================================

pub async fn rebuild(
    State(state): State<AppState>,
) -> Result<Json<RebuildSummary>, (StatusCode, String)> {
    let cancel = state.shutdown.child_token();
    state
        .service
        .rebuild_cache(&cancel)
        .await
        .map(Json)
        .map_err(service_error)
}
