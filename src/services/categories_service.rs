use chrono::Utc;
use diesel::prelude::*;
use serde_json::json;
use uuid::Uuid;

use crate::{
    db::models::api::error_codes,
    db::models::category::{Category, CategoryChanges, NewCategory},
    db::repositories::CategoryRepo,
    error::AppError,
    routes::categories::{CreateCategoryRequest, UpdateCategoryRequest},
    services::audit_service::AuditService,
    services::context::RequestContext,
    services::issues_service::is_assignable,
    validation::category::{UpdateCategoryChanges, validate_update_category},
};

pub struct CategoriesService;

impl CategoriesService {
    /// Inactive categories are only listed for admins who ask for them.
    pub fn list(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        include_inactive: bool,
    ) -> Result<Vec<Category>, AppError> {
        Ok(CategoryRepo::list(conn, include_inactive && ctx.is_admin())?)
    }

    pub fn create(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        req: &CreateCategoryRequest,
    ) -> Result<Category, AppError> {
        ctx.require_admin()?;

        conn.transaction::<_, AppError, _>(|conn| {
            let name = req.name.trim().to_string();
            ensure_unique_name(conn, &name, None)?;

            if let Some(assignee) = req.default_assignee_id {
                ensure_assignable(conn, assignee)?;
            }

            let category = CategoryRepo::insert(
                conn,
                &NewCategory {
                    name,
                    description: req.description.clone(),
                    sla_hours: req.sla_hours,
                    default_assignee_id: req.default_assignee_id,
                },
            )?;

            AuditService::record(
                conn,
                Some(ctx.user_id),
                "category.created",
                "category",
                category.id,
                json!({ "name": category.name, "sla_hours": category.sla_hours }),
            )?;

            tracing::info!(category_id = %category.id, name = %category.name, "Category created");
            Ok(category)
        })
    }

    pub fn update(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        category_id: Uuid,
        req: &UpdateCategoryRequest,
    ) -> Result<Category, AppError> {
        ctx.require_admin()?;
        validate_update_category(&UpdateCategoryChanges {
            name: req.name.is_some(),
            sla_hours: req.sla_hours.is_some(),
            other_fields_present: req.description.is_some()
                || req.default_assignee_id.is_some()
                || req.clear_default_assignee
                || req.is_active.is_some(),
        })?;

        conn.transaction::<_, AppError, _>(|conn| {
            let existing = CategoryRepo::find_by_id(conn, category_id)?
                .ok_or_else(|| AppError::not_found("category"))?;

            let name = req.name.as_deref().map(|n| n.trim().to_string());
            if let Some(name) = &name {
                ensure_unique_name(conn, name, Some(existing.id))?;
            }

            let default_assignee_id = if req.clear_default_assignee {
                Some(None)
            } else if let Some(assignee) = req.default_assignee_id {
                ensure_assignable(conn, assignee)?;
                Some(Some(assignee))
            } else {
                None
            };

            let changes = CategoryChanges {
                name,
                description: req
                    .description
                    .as_deref()
                    .map(|d| Some(d.trim().to_string()).filter(|d| !d.is_empty())),
                sla_hours: req.sla_hours,
                default_assignee_id,
                is_active: req.is_active,
                updated_at: Some(Utc::now()),
            };

            let updated = CategoryRepo::update(conn, existing.id, &changes)?;

            AuditService::record(
                conn,
                Some(ctx.user_id),
                "category.updated",
                "category",
                updated.id,
                json!({
                    "name": updated.name,
                    "sla_hours": updated.sla_hours,
                    "is_active": updated.is_active,
                    "default_assignee_id": updated.default_assignee_id,
                }),
            )?;
            Ok(updated)
        })
    }
}

fn ensure_unique_name(
    conn: &mut PgConnection,
    name: &str,
    excluding: Option<Uuid>,
) -> Result<(), AppError> {
    if CategoryRepo::exists_by_name(conn, name, excluding)? {
        return Err(AppError::conflict_with_code(
            format!("Category '{}' already exists", name),
            Some("name".to_string()),
            error_codes::CATEGORY_EXISTS,
        ));
    }
    Ok(())
}

fn ensure_assignable(conn: &mut PgConnection, user_id: Uuid) -> Result<(), AppError> {
    if !is_assignable(conn, user_id)? {
        return Err(AppError::validation_with_code(
            "Default assignee must be an active officer or admin",
            error_codes::ISSUE_INVALID_ASSIGNEE,
        ));
    }
    Ok(())
}
