use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    AppState,
    db::models::api::{ApiResponse, PageRequest, ResponseMeta},
    db::repositories::audit_logs::AuditLogFilters,
    error::{AppError, AppResult},
    middleware::auth::AuthUserInfo,
    services::{AuditService, IssueWorkflowService},
    validation::QueryParams,
};

#[derive(Deserialize)]
pub struct AuditLogQuery {
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub async fn list_audit_logs(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    QueryParams(query): QueryParams<AuditLogQuery>,
) -> AppResult<impl IntoResponse> {
    let page = PageRequest::from_query(query.page, query.per_page).map_err(AppError::validation)?;
    let filters = AuditLogFilters {
        entity_type: query.entity_type,
        entity_id: query.entity_id,
        actor_id: query.actor_id,
    };

    let mut conn = state.db.get()?;
    let (logs, total) = AuditService::list(&mut conn, &auth.context(), &filters, &page)?;

    let response = ApiResponse::success_with_meta(
        logs,
        "Audit logs retrieved successfully",
        ResponseMeta::paginated(&page, total),
    );
    Ok((StatusCode::OK, Json(response)))
}

pub async fn run_escalations(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
) -> AppResult<impl IntoResponse> {
    auth.context().require_admin()?;

    let report = {
        let mut conn = state.db.get()?;
        IssueWorkflowService::run_escalation_sweep(
            &mut conn,
            Utc::now(),
            state.config.escalation_interval(),
        )?
    };
    if report.escalated > 0 {
        state.cache.invalidate_best_effort().await;
    }

    tracing::info!(admin_id = %auth.user.id, escalated = report.escalated, "Manual escalation sweep");
    let response = ApiResponse::success(report, "Escalation sweep completed");
    Ok((StatusCode::OK, Json(response)))
}
