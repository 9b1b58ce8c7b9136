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
    db::enums::UserRole,
    db::models::api::{ApiResponse, ResponseMeta},
    db::models::user::UserSummary,
    error::AppResult,
    middleware::auth::AuthUserInfo,
    services::UsersService,
    validation::{PathParam, ValidatedJson},
};

#[derive(Deserialize, Validate)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

pub async fn get_me(auth: AuthUserInfo) -> impl IntoResponse {
    let response = ApiResponse::success(auth.user, "Profile retrieved successfully");
    (StatusCode::OK, Json(response))
}

pub async fn list_officers(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db.get()?;
    let officers: Vec<UserSummary> = UsersService::list_staff(&mut conn, &auth.context())?
        .into_iter()
        .map(UserSummary::from)
        .collect();

    let meta = ResponseMeta::with_total(officers.len() as i64);
    let response = ApiResponse::success_with_meta(officers, "Officers retrieved successfully", meta);
    Ok((StatusCode::OK, Json(response)))
}

pub async fn update_user_role(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    PathParam(user_id): PathParam<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateRoleRequest>,
) -> AppResult<impl IntoResponse> {
    let user = {
        let mut conn = state.db.get()?;
        UsersService::change_role(&mut conn, &auth.context(), user_id, req.role)?
    };
    state.cache.invalidate_best_effort().await;

    let response = ApiResponse::success(user, "User role updated successfully");
    Ok((StatusCode::OK, Json(response)))
}
