use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    AppState,
    db::models::api::{ApiResponse, PageRequest, ResponseMeta},
    error::{AppError, AppResult},
    middleware::auth::AuthUserInfo,
    services::NotificationsService,
    validation::{PathParam, QueryParams},
};

#[derive(Deserialize)]
pub struct NotificationQuery {
    pub unread_only: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    QueryParams(query): QueryParams<NotificationQuery>,
) -> AppResult<impl IntoResponse> {
    let page = PageRequest::from_query(query.page, query.per_page).map_err(AppError::validation)?;

    let mut conn = state.db.get()?;
    let (notifications, total) = NotificationsService::list(
        &mut conn,
        &auth.context(),
        query.unread_only.unwrap_or(false),
        &page,
    )?;

    let response = ApiResponse::success_with_meta(
        notifications,
        "Notifications retrieved successfully",
        ResponseMeta::paginated(&page, total),
    );
    Ok((StatusCode::OK, Json(response)))
}

pub async fn unread_count(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db.get()?;
    let count = NotificationsService::unread_count(&mut conn, &auth.context())?;

    let response = ApiResponse::success(json!({ "unread": count }), "Unread count retrieved");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    PathParam(notification_id): PathParam<Uuid>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db.get()?;
    let notification = NotificationsService::mark_read(&mut conn, &auth.context(), notification_id)?;

    let response = ApiResponse::success(notification, "Notification marked as read");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db.get()?;
    let marked = NotificationsService::mark_all_read(&mut conn, &auth.context())?;

    let response = ApiResponse::success(json!({ "marked": marked }), "Notifications marked as read");
    Ok((StatusCode::OK, Json(response)))
}
