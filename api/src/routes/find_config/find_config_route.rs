use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{info, instrument};
use tree_config_engine::{Build, Repo, Request, Resolution, find_config};
use uuid::Uuid;

use crate::{
    core::app_state::AppState,
    error_handler::AppResult,
    routes::find_config::{
        find_config_request::FindConfigRequest, find_config_response::FindConfigResponse,
    },
};

/// POST /
///
/// Resolves the pipeline configuration for one build event.
/// * 200 with `{"data": ...}` when a config was found
/// * 204 when the build changed no files
/// * 404 when no candidate config exists
#[instrument(name = "find_config_route", skip_all, fields(request_id))]
pub async fn find_config_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<FindConfigRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(body) = payload?;

    let id = request_id(&headers);
    tracing::Span::current().record("request_id", tracing::field::display(id));

    let repo = Repo::from(body.repo);
    let build = Build::from(body.build);
    info!(
        request_id = %id,
        repo = %repo.slug(),
        trigger = %build.trigger,
        "handling config request"
    );

    let req = Request::bind(id, repo, build, &state.settings.scm)?;

    match find_config(&req, &state.settings.engine).await? {
        Resolution::Config(data) => Ok(Json(FindConfigResponse { data }).into_response()),
        Resolution::NoChanges => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// Reuses an inbound `X-Request-Id` when it is a UUID, otherwise mints one.
fn request_id(headers: &HeaderMap) -> Uuid {
    headers
        .get("X-Request-Id")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .unwrap_or_else(Uuid::new_v4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn request_id_prefers_header() {
        let mut headers = HeaderMap::new();
        let known = Uuid::new_v4();
        headers.insert(
            "X-Request-Id",
            HeaderValue::from_str(&known.to_string()).unwrap(),
        );
        assert_eq!(request_id(&headers), known);

        headers.insert("X-Request-Id", HeaderValue::from_static("req-123"));
        assert_ne!(request_id(&headers), Uuid::nil());
    }
}
