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
    services::CategoriesService,
    validation::category::validate_category_name,
    validation::{PathParam, QueryParams, ValidatedJson},
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(custom(function = "validate_category_name"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 1, max = 8760, message = "sla_hours must be between 1 and 8760"))]
    pub sla_hours: i32,
    pub default_assignee_id: Option<Uuid>,
}

/// Partial update. `clear_default_assignee` removes the default routing.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(custom(function = "validate_category_name"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 1, max = 8760, message = "sla_hours must be between 1 and 8760"))]
    pub sla_hours: Option<i32>,
    pub default_assignee_id: Option<Uuid>,
    #[serde(default)]
    pub clear_default_assignee: bool,
    pub is_active: Option<bool>,
}

#[derive(Deserialize)]
pub struct CategoryQuery {
    pub include_inactive: Option<bool>,
}

pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    QueryParams(query): QueryParams<CategoryQuery>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db.get()?;
    let categories = CategoriesService::list(
        &mut conn,
        &auth.context(),
        query.include_inactive.unwrap_or(false),
    )?;

    let meta = ResponseMeta::with_total(categories.len() as i64);
    let response =
        ApiResponse::success_with_meta(categories, "Categories retrieved successfully", meta);
    Ok((StatusCode::OK, Json(response)))
}

pub async fn create_category(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    ValidatedJson(req): ValidatedJson<CreateCategoryRequest>,
) -> AppResult<impl IntoResponse> {
    let category = {
        let mut conn = state.db.get()?;
        CategoriesService::create(&mut conn, &auth.context(), &req)?
    };
    state.cache.invalidate_best_effort().await;

    let response = ApiResponse::created(category, "Category created successfully");
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn update_category(
    State(state): State<Arc<AppState>>,
    auth: AuthUserInfo,
    PathParam(category_id): PathParam<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateCategoryRequest>,
) -> AppResult<impl IntoResponse> {
    let category = {
        let mut conn = state.db.get()?;
        CategoriesService::update(&mut conn, &auth.context(), category_id, &req)?
    };
    state.cache.invalidate_best_effort().await;

    let response = ApiResponse::success(category, "Category updated successfully");
    Ok((StatusCode::OK, Json(response)))
}
