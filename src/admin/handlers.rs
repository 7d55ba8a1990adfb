use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::observability::status::StatusReport;

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
    pub groups: usize,
    pub endpoints: usize,
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetQuery {
    pub group: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetSummary {
    pub group: Option<String>,
    pub reset: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EndpointAction {
    pub group: String,
    pub endpoint: String,
    pub action: String,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn not_found(what: String) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": format!("{} not found", what) })),
    )
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let registry = state.engine.registry();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
        groups: registry.groups().count(),
        endpoints: registry.endpoint_count(),
        categories: state.engine.chains().categories().map(String::from).collect(),
    })
}

pub async fn get_snapshot(State(state): State<AdminState>) -> Json<StatusReport> {
    Json(state.engine.snapshot())
}

pub async fn reset_errors(
    State(state): State<AdminState>,
    Query(query): Query<ResetQuery>,
) -> Result<Json<ResetSummary>, ApiError> {
    if let Some(group) = &query.group {
        if state.engine.registry().group(group).is_none() {
            return Err(not_found(format!("service group '{}'", group)));
        }
    }
    let reset = state.engine.reset_errors(query.group.as_deref());
    Ok(Json(ResetSummary {
        group: query.group,
        reset,
    }))
}

pub async fn mark_offline(
    State(state): State<AdminState>,
    Path((group, endpoint)): Path<(String, String)>,
) -> Result<Json<EndpointAction>, ApiError> {
    if !state.engine.mark_offline(&group, &endpoint) {
        return Err(not_found(format!("endpoint '{}/{}'", group, endpoint)));
    }
    Ok(Json(EndpointAction {
        group,
        endpoint,
        action: "offline".to_string(),
    }))
}

pub async fn reactivate(
    State(state): State<AdminState>,
    Path((group, endpoint)): Path<(String, String)>,
) -> Result<Json<EndpointAction>, ApiError> {
    if !state.engine.reactivate(&group, &endpoint) {
        return Err(not_found(format!("endpoint '{}/{}'", group, endpoint)));
    }
    Ok(Json(EndpointAction {
        group,
        endpoint,
        action: "reactivate".to_string(),
    }))
}
