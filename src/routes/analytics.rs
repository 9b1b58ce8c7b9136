use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    AppState,
    cache::{officers_key, summary_key},
    db::enums::IssueStatus,
    db::models::api::{ApiResponse, ResponseMeta},
    db::repositories::issues::IssueFilters,
    error::AppResult,
    middleware::auth::AuthUserInfo,
    services::AnalyticsService,
    services::analytics_service::{resolve_window, window_start},
    validation::QueryParams,
};

#[derive(Deserialize)]
pub struct SummaryQuery {
    pub days: Option<i64>,
}

#[derive(Deserialize)]
pub struct HeatmapQuery {
    pub status: Option<IssueStatus>,
    pub category_id: Option<Uuid>,
    pub days: Option<i64>,
}

pub async fn summary(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    QueryParams(query): QueryParams<SummaryQuery>,
) -> AppResult<impl IntoResponse> {
    let ctx = auth.context();
    ctx.require_staff()?;
    let days = resolve_window(query.days)?;

    let summary = state
        .cache
        .get_or_compute(&summary_key(days), || {
            let mut conn = state.db.get()?;
            AnalyticsService::summary(&mut conn, &ctx, days, Utc::now())
        })
        .await?;

    let response = ApiResponse::success(summary, "Analytics summary retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn heatmap(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    QueryParams(query): QueryParams<HeatmapQuery>,
) -> AppResult<impl IntoResponse> {
    let ctx = auth.context();
    let created_after = match query.days {
        Some(days) => Some(window_start(Utc::now(), resolve_window(Some(days))?)),
        None => None,
    };
    let filters = IssueFilters {
        status: query.status,
        category_id: query.category_id,
        created_after,
        ..Default::default()
    };

    let mut conn = state.db.get()?;
    let points =
        AnalyticsService::heatmap(&mut conn, &ctx, &filters, state.config.export_max_rows)?;

    let meta = ResponseMeta::with_total(points.len() as i64);
    let response = ApiResponse::success_with_meta(points, "Heatmap retrieved successfully", meta);
    Ok((StatusCode::OK, Json(response)))
}

pub async fn officers(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
) -> AppResult<impl IntoResponse> {
    let ctx = auth.context();
    ctx.require_staff()?;

    let stats = state
        .cache
        .get_or_compute(officers_key(), || {
            let mut conn = state.db.get()?;
            AnalyticsService::officers(&mut conn, &ctx)
        })
        .await?;

    let response = ApiResponse::success(stats, "Officer workload retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}
