use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    db::enums::{IssuePriority, IssueStatus},
    db::models::api::{ApiResponse, PageRequest, ResponseMeta},
    db::repositories::issues::{IssueFilters, IssueSort},
    error::{AppError, AppResult},
    middleware::auth::AuthUserInfo,
    services::context::RequestContext,
    services::export_service::{self, ExportFormat, ExportRow},
    services::{IssueWorkflowService, IssuesService, VotesService},
    validation::issue::{validate_bbox, validate_status_note},
    validation::rules,
    validation::{PathParam, QueryParams, ValidatedJson},
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateIssueRequest {
    #[validate(
        length(min = 1, max = 200),
        custom(function = "rules::validate_not_blank")
    )]
    pub title: String,
    #[validate(
        length(min = 1, max = 5000),
        custom(function = "rules::validate_not_blank")
    )]
    pub description: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "rules::validate_photo_urls"))]
    pub photo_urls: Vec<String>,
    pub category_id: Uuid,
}

/// Partial update. An empty `address` clears it.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateIssueRequest {
    #[validate(
        length(min = 1, max = 200),
        custom(function = "rules::validate_not_blank")
    )]
    pub title: Option<String>,
    #[validate(
        length(min = 1, max = 5000),
        custom(function = "rules::validate_not_blank")
    )]
    pub description: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    #[validate(custom(function = "rules::validate_photo_urls"))]
    pub photo_urls: Option<Vec<String>>,
    pub category_id: Option<Uuid>,
    pub priority: Option<IssuePriority>,
}

impl UpdateIssueRequest {
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push("title");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        if self.address.is_some() {
            fields.push("address");
        }
        if self.photo_urls.is_some() {
            fields.push("photo_urls");
        }
        if self.category_id.is_some() {
            fields.push("category_id");
        }
        if self.priority.is_some() {
            fields.push("priority");
        }
        fields
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct StatusChangeRequest {
    pub status: IssueStatus,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssignIssueRequest {
    pub assignee_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct IssueListQuery {
    pub status: Option<IssueStatus>,
    pub category_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub reporter_id: Option<Uuid>,
    pub mine: Option<bool>,
    pub overdue: Option<bool>,
    pub q: Option<String>,
    pub min_lat: Option<f64>,
    pub max_lat: Option<f64>,
    pub min_lng: Option<f64>,
    pub max_lng: Option<f64>,
    pub sort: Option<IssueSort>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl IssueListQuery {
    pub fn to_filters(&self, ctx: &RequestContext) -> AppResult<IssueFilters> {
        let reporter_id = if self.mine.unwrap_or(false) {
            Some(ctx.user_id)
        } else {
            self.reporter_id
        };

        Ok(IssueFilters {
            status: self.status,
            category_id: self.category_id,
            assignee_id: self.assignee_id,
            reporter_id,
            overdue_at: self.overdue.unwrap_or(false).then(Utc::now),
            created_after: None,
            search: self.q.clone(),
            bbox: validate_bbox(self.min_lat, self.max_lat, self.min_lng, self.max_lng)?,
            sort: self.sort.unwrap_or_default(),
        })
    }

    pub fn page(&self) -> AppResult<PageRequest> {
        PageRequest::from_query(self.page, self.per_page).map_err(AppError::validation)
    }
}

#[derive(Debug, Deserialize)]
pub struct BoardQuery {
    pub assignee_id: Option<Uuid>,
    pub mine: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

pub async fn create_issue(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    ValidatedJson(req): ValidatedJson<CreateIssueRequest>,
) -> AppResult<impl IntoResponse> {
    let ctx = auth.context();
    let issue = {
        let mut conn = state.db.get()?;
        IssuesService::create(&mut conn, &ctx, &req)?
    };
    state.cache.invalidate_best_effort().await;

    let response = ApiResponse::created(issue, "Issue created successfully");
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_issues(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    QueryParams(query): QueryParams<IssueListQuery>,
) -> AppResult<impl IntoResponse> {
    let ctx = auth.context();
    let filters = query.to_filters(&ctx)?;
    let page = query.page()?;

    let mut conn = state.db.get()?;
    let (issues, total) = IssuesService::list(&mut conn, &ctx, &filters, &page)?;

    let response = ApiResponse::success_with_meta(
        issues,
        "Issues retrieved successfully",
        ResponseMeta::paginated(&page, total),
    );
    Ok((StatusCode::OK, Json(response)))
}

pub async fn get_issue(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    PathParam(issue_id): PathParam<Uuid>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db.get()?;
    let detail = IssuesService::get_detail(&mut conn, &auth.context(), issue_id)?;

    let response = ApiResponse::success(detail, "Issue retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn update_issue(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    PathParam(issue_id): PathParam<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateIssueRequest>,
) -> AppResult<impl IntoResponse> {
    let issue = {
        let mut conn = state.db.get()?;
        IssuesService::update(&mut conn, &auth.context(), issue_id, &req)?
    };
    state.cache.invalidate_best_effort().await;

    let response = ApiResponse::success(issue, "Issue updated successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn delete_issue(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    PathParam(issue_id): PathParam<Uuid>,
) -> AppResult<impl IntoResponse> {
    {
        let mut conn = state.db.get()?;
        IssuesService::delete(&mut conn, &auth.context(), issue_id)?;
    }
    state.cache.invalidate_best_effort().await;

    let response = ApiResponse::<()>::ok("Issue deleted successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn change_status(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    PathParam(issue_id): PathParam<Uuid>,
    ValidatedJson(req): ValidatedJson<StatusChangeRequest>,
) -> AppResult<impl IntoResponse> {
    let note = validate_status_note(req.note.as_deref())?;
    let issue = {
        let mut conn = state.db.get()?;
        IssueWorkflowService::transition(&mut conn, &auth.context(), issue_id, req.status, note)?
    };
    state.cache.invalidate_best_effort().await;

    let response = ApiResponse::success(issue, "Issue status updated successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn assign_issue(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    PathParam(issue_id): PathParam<Uuid>,
    ValidatedJson(req): ValidatedJson<AssignIssueRequest>,
) -> AppResult<impl IntoResponse> {
    let issue = {
        let mut conn = state.db.get()?;
        IssueWorkflowService::assign(&mut conn, &auth.context(), issue_id, req.assignee_id)?
    };
    state.cache.invalidate_best_effort().await;

    let response = ApiResponse::success(issue, "Issue assigned successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn toggle_vote(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    PathParam(issue_id): PathParam<Uuid>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db.get()?;
    let result = VotesService::toggle(&mut conn, &auth.context(), issue_id)?;

    let message = if result.voted {
        "Vote recorded"
    } else {
        "Vote removed"
    };
    Ok((StatusCode::OK, Json(ApiResponse::success(result, message))))
}

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    PathParam(issue_id): PathParam<Uuid>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db.get()?;
    let history = IssuesService::history(&mut conn, &auth.context(), issue_id)?;

    let meta = ResponseMeta::with_total(history.len() as i64);
    let response =
        ApiResponse::success_with_meta(history, "Status history retrieved successfully", meta);
    Ok((StatusCode::OK, Json(response)))
}

pub async fn get_board(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    QueryParams(query): QueryParams<BoardQuery>,
) -> AppResult<impl IntoResponse> {
    let ctx = auth.context();
    let assignee = if query.mine.unwrap_or(false) {
        Some(ctx.user_id)
    } else {
        query.assignee_id
    };

    let mut conn = state.db.get()?;
    let columns = IssuesService::board(&mut conn, &ctx, assignee)?;

    let response = ApiResponse::success(columns, "Board retrieved successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn export_issues(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    QueryParams(query): QueryParams<IssueListQuery>,
    QueryParams(export): QueryParams<ExportQuery>,
) -> AppResult<Response> {
    let ctx = auth.context();
    let format = match export.format.as_deref() {
        Some(raw) => raw.parse::<ExportFormat>()?,
        None => ExportFormat::default(),
    };
    let filters = query.to_filters(&ctx)?;

    let mut conn = state.db.get()?;
    let rows: Vec<ExportRow> =
        IssuesService::export_rows(&mut conn, &ctx, &filters, state.config.export_max_rows)?
            .into_iter()
            .map(|(issue, category)| ExportRow::new(issue, category))
            .collect();
    drop(conn);

    tracing::info!(user_id = %ctx.user_id, rows = rows.len(), format = ?format, "Issues exported");

    match format {
        ExportFormat::Json => {
            let meta = ResponseMeta::with_total(rows.len() as i64);
            let response = ApiResponse::success_with_meta(rows, "Issues exported", meta);
            Ok((StatusCode::OK, Json(response)).into_response())
        }
        ExportFormat::Csv => {
            let body = export_service::write_csv(&rows)?;
            let disposition = format!(
                "attachment; filename=\"{}\"",
                export_service::export_filename(format, Utc::now())
            );
            Ok((
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                body,
            )
                .into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::enums::UserRole;

    fn ctx() -> RequestContext {
        RequestContext {
            user_id: Uuid::new_v4(),
            role: UserRole::Citizen,
        }
    }

    #[test]
    fn mine_overrides_reporter_filter() {
        let caller = ctx();
        let query = IssueListQuery {
            mine: Some(true),
            reporter_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        let filters = query.to_filters(&caller).unwrap();
        assert_eq!(filters.reporter_id, Some(caller.user_id));
        assert_eq!(filters.sort, IssueSort::Newest);
    }

    #[test]
    fn partial_bbox_is_rejected() {
        let query = IssueListQuery {
            min_lat: Some(1.0),
            ..Default::default()
        };
        assert!(query.to_filters(&ctx()).is_err());
    }

    #[test]
    fn paging_defaults_and_limits() {
        let page = IssueListQuery::default().page().unwrap();
        assert_eq!((page.page, page.per_page), (1, 20));

        let too_big = IssueListQuery {
            per_page: Some(101),
            ..Default::default()
        };
        assert!(too_big.page().is_err());
    }

    #[test]
    fn create_request_rules() {
        let valid = CreateIssueRequest {
            title: "Fallen tree".to_string(),
            description: "Blocking the lane".to_string(),
            latitude: 12.9,
            longitude: 77.6,
            address: None,
            photo_urls: vec![],
            category_id: Uuid::new_v4(),
        };
        assert!(valid.validate().is_ok());

        let blank_title = CreateIssueRequest {
            title: "   ".to_string(),
            ..valid.clone()
        };
        assert!(blank_title.validate().is_err());

        let bad_lng = CreateIssueRequest {
            longitude: 181.0,
            ..valid.clone()
        };
        assert!(bad_lng.validate().is_err());

        let long_title = CreateIssueRequest {
            title: "t".repeat(201),
            ..valid
        };
        assert!(long_title.validate().is_err());
    }

    #[test]
    fn changed_fields_lists_present_keys() {
        let req: UpdateIssueRequest =
            serde_json::from_str(r#"{"title": "New", "priority": "urgent"}"#).unwrap();
        assert_eq!(req.changed_fields(), vec!["title", "priority"]);
    }
}
