// HTTP request handlers
use crate::application::dashboard_controller::ControllerError;
use crate::application::logstash_node_service::NodeRequest;
use crate::domain::saved_dashboard::{DashboardListing, SavedDashboard};
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use crate::presentation::error::ApiError;
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
}

/// A date given either as RFC 3339 text or epoch milliseconds
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    Millis(i64),
    Text(String),
}

impl DateInput {
    fn to_utc(&self, name: &str) -> Result<DateTime<Utc>, ApiError> {
        let parsed = match self {
            DateInput::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            DateInput::Text(text) => DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|d| d.with_timezone(&Utc)),
        };
        parsed.ok_or_else(|| ApiError::bad_request(format!("\"{}\" must be a valid date", name)))
    }
}

#[derive(Debug, Deserialize)]
pub struct TimeRangePayload {
    pub min: DateInput,
    pub max: DateInput,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodePayload {
    pub ccs: Option<String>,
    #[serde(rename = "timeRange")]
    pub time_range: TimeRangePayload,
    pub is_advanced: bool,
}

async fn reply<T: Serialize>(data: &T, headers: &HeaderMap) -> Response {
    match json_response(StatusCode::OK, data, accepts_brotli(headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List saved dashboards, optionally filtered by title
pub async fn list_dashboards(
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let search = query.search.unwrap_or_default();
    let listing: Vec<DashboardListing> = state
        .dashboard_repository
        .list()
        .await
        .map_err(ControllerError::Persistence)?
        .iter()
        .filter(|d| d.matches_search(&search))
        .map(SavedDashboard::listing)
        .collect();

    Ok(reply(&listing, &headers).await)
}

pub async fn get_dashboard(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let dashboard = state
        .dashboard_repository
        .load(&id)
        .await
        .map_err(ControllerError::Persistence)?
        .ok_or(ControllerError::NotFound(id))?;

    Ok(reply(&dashboard, &headers).await)
}

/// Everything the Logstash node page shows: node summary and metrics
pub async fn logstash_node(
    Path((cluster_uuid, logstash_uuid)): Path<(String, String)>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NodePayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let request = NodeRequest {
        cluster_uuid,
        logstash_uuid,
        ccs: payload.ccs,
        min: payload.time_range.min.to_utc("min")?,
        max: payload.time_range.max.to_utc("max")?,
        is_advanced: payload.is_advanced,
    };

    let response = state.logstash_node_service.get_node(&request).await?;
    Ok(reply(&response, &headers).await)
}
