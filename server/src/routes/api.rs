use std::fmt::Write as _;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use regioni_shared::{
    FALLBACK_INFO, GeneralInfo, REQUEST_ID_HEADER, RegionInfoRequest, RegionInfoResponse,
};

use crate::config::MAX_REGION_NAME_LEN;
use crate::services::ollama;
use crate::state::{AppState, ObservabilitySnapshot};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let observability = state.observability.snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "upstream_model": state.upstream.model,
        "observability": {
            "region_info_requests_total": observability.region_info_requests_total,
            "general_info_requests_total": observability.general_info_requests_total,
            "upstream_failures_total": observability.upstream_failures_total,
        }
    }))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = render_prometheus_metrics(state.observability.snapshot());

    (
        [
            (header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
}

fn render_prometheus_metrics(observability: ObservabilitySnapshot) -> String {
    let mut body = String::new();
    let _ = writeln!(
        body,
        "# HELP regioni_region_info_requests_total Total region-info lookups received."
    );
    let _ = writeln!(body, "# TYPE regioni_region_info_requests_total counter");
    let _ = writeln!(
        body,
        "regioni_region_info_requests_total {}",
        observability.region_info_requests_total
    );

    let _ = writeln!(
        body,
        "# HELP regioni_general_info_requests_total Total general-info requests received."
    );
    let _ = writeln!(body, "# TYPE regioni_general_info_requests_total counter");
    let _ = writeln!(
        body,
        "regioni_general_info_requests_total {}",
        observability.general_info_requests_total
    );

    let _ = writeln!(
        body,
        "# HELP regioni_upstream_failures_total Total failed calls to the text generator."
    );
    let _ = writeln!(body, "# TYPE regioni_upstream_failures_total counter");
    let _ = writeln!(
        body,
        "regioni_upstream_failures_total {}",
        observability.upstream_failures_total
    );

    body
}

/// Describe one region. Every outcome, including rejections, answers with the
/// `{ "info" }` / `{ "error" }` body shape.
pub async fn region_info(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RegionInfoRequest>, JsonRejection>,
) -> (StatusCode, Json<RegionInfoResponse>) {
    state.observability.record_region_info_request();
    let request_id = request_id(&headers);

    let Ok(Json(request)) = payload else {
        tracing::debug!(request_id, "rejected region-info body");
        return reject("invalid request body");
    };
    let region = match normalize_region_name(&request.region) {
        Ok(region) => region,
        Err(message) => {
            tracing::debug!(request_id, reason = message, "rejected region name");
            return reject(message);
        }
    };

    match ollama::generate(&state.http_client, &state.upstream, region).await {
        Ok(info) => {
            tracing::info!(request_id, region, "region info generated");
            (StatusCode::OK, Json(RegionInfoResponse::info(info)))
        }
        Err(e) => {
            state.observability.record_upstream_failure();
            tracing::warn!(request_id, region, error = %e, "region info lookup failed");
            (e.status_code(), Json(RegionInfoResponse::error(e.to_string())))
        }
    }
}

/// Introductory text for the panel. Never fails; generator problems yield
/// the fallback text.
pub async fn general_info(State(state): State<AppState>) -> Json<GeneralInfo> {
    state.observability.record_general_info_request();

    let prompt = &state.upstream.general_prompt;
    let info = match ollama::generate(&state.http_client, &state.upstream, prompt).await {
        Ok(info) => info,
        Err(e) => {
            state.observability.record_upstream_failure();
            tracing::warn!(error = %e, "general info unavailable, serving fallback");
            FALLBACK_INFO.to_string()
        }
    };
    Json(GeneralInfo { info })
}

fn reject(message: &str) -> (StatusCode, Json<RegionInfoResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(RegionInfoResponse::error(message)),
    )
}

fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
}

fn normalize_region_name(name: &str) -> Result<&str, &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("region is required");
    }
    if trimmed.chars().count() > MAX_REGION_NAME_LEN {
        return Err("region name too long");
    }
    Ok(trimmed)
}
