use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    db::models::api::{ApiResponse, ResponseMeta},
    error::AppResult,
    middleware::auth::AuthUserInfo,
    services::CommentsService,
    validation::{PathParam, ValidatedJson},
};

#[derive(Deserialize, Validate)]
pub struct CommentBodyRequest {
    pub body: String,
}

pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    PathParam(issue_id): PathParam<Uuid>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db.get()?;
    let comments = CommentsService::list_by_issue(&mut conn, &auth.context(), issue_id)?;

    let meta = ResponseMeta::with_total(comments.len() as i64);
    let response = ApiResponse::success_with_meta(comments, "Comments retrieved successfully", meta);
    Ok((StatusCode::OK, Json(response)))
}

pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    PathParam(issue_id): PathParam<Uuid>,
    ValidatedJson(req): ValidatedJson<CommentBodyRequest>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db.get()?;
    let comment = CommentsService::create(&mut conn, &auth.context(), issue_id, &req.body)?;

    let response = ApiResponse::created(comment, "Comment created successfully");
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn update_comment(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    PathParam(comment_id): PathParam<Uuid>,
    ValidatedJson(req): ValidatedJson<CommentBodyRequest>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db.get()?;
    let comment = CommentsService::update(&mut conn, &auth.context(), comment_id, &req.body)?;

    let response = ApiResponse::success(comment, "Comment updated successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    PathParam(comment_id): PathParam<Uuid>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db.get()?;
    CommentsService::delete(&mut conn, &auth.context(), comment_id)?;

    let response = ApiResponse::<()>::ok("Comment deleted successfully");
    Ok((StatusCode::OK, Json(response)))
}

pub async fn hide_comment(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    PathParam(comment_id): PathParam<Uuid>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db.get()?;
    let comment = CommentsService::set_hidden(&mut conn, &auth.context(), comment_id, true)?;

    Ok((StatusCode::OK, Json(ApiResponse::success(comment, "Comment hidden"))))
}

pub async fn unhide_comment(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    PathParam(comment_id): PathParam<Uuid>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db.get()?;
    let comment = CommentsService::set_hidden(&mut conn, &auth.context(), comment_id, false)?;

    Ok((StatusCode::OK, Json(ApiResponse::success(comment, "Comment restored"))))
}
