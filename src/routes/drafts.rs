use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use validator::Validate;

use crate::{
    AppState,
    db::models::api::{ApiResponse, ResponseMeta},
    error::AppResult,
    middleware::auth::AuthUserInfo,
    services::DraftsService,
    validation::{PathParam, ValidatedJson},
};

#[derive(Deserialize, Validate)]
pub struct DraftRequest {
    pub payload: JsonValue,
}

pub async fn upsert_draft(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    PathParam(client_draft_id): PathParam<String>,
    ValidatedJson(req): ValidatedJson<DraftRequest>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db.get()?;
    let result = DraftsService::upsert(&mut conn, &auth.context(), &client_draft_id, req.payload)?;

    let message = if result.changed {
        "Draft saved"
    } else {
        "Draft unchanged"
    };
    Ok((StatusCode::OK, Json(ApiResponse::success(result, message))))
}

pub async fn list_drafts(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db.get()?;
    let drafts = DraftsService::list(&mut conn, &auth.context())?;

    let meta = ResponseMeta::with_total(drafts.len() as i64);
    let response = ApiResponse::success_with_meta(drafts, "Drafts retrieved successfully", meta);
    Ok((StatusCode::OK, Json(response)))
}

pub async fn delete_draft(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    PathParam(client_draft_id): PathParam<String>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db.get()?;
    DraftsService::delete(&mut conn, &auth.context(), &client_draft_id)?;

    Ok((StatusCode::OK, Json(ApiResponse::<()>::ok("Draft deleted"))))
}

pub async fn submit_draft(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    PathParam(client_draft_id): PathParam<String>,
) -> AppResult<impl IntoResponse> {
    let submission = {
        let mut conn = state.db.get()?;
        DraftsService::submit(&mut conn, &auth.context(), &client_draft_id)?
    };

    if submission.created {
        state.cache.invalidate_best_effort().await;
        let response = ApiResponse::created(submission.issue, "Draft submitted as a new issue");
        Ok((StatusCode::CREATED, Json(response)))
    } else {
        let response = ApiResponse::success(submission.issue, "Draft was already submitted");
        Ok((StatusCode::OK, Json(response)))
    }
}
