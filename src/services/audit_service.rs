use diesel::prelude::*;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::{
    db::models::api::PageRequest,
    db::models::audit_log::{AuditLog, NewAuditLog},
    db::repositories::AuditLogRepo,
    db::repositories::audit_logs::AuditLogFilters,
    error::AppError,
    services::context::RequestContext,
};

pub struct AuditService;

impl AuditService {
    /// Appends an audit row inside the caller's transaction.
    pub fn record(
        conn: &mut PgConnection,
        actor_id: Option<Uuid>,
        action: &str,
        entity_type: &str,
        entity_id: Uuid,
        details: JsonValue,
    ) -> Result<(), AppError> {
        AuditLogRepo::insert(
            conn,
            &NewAuditLog {
                actor_id,
                action: action.to_string(),
                entity_type: entity_type.to_string(),
                entity_id,
                details,
            },
        )?;
        Ok(())
    }

    pub fn list(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        filters: &AuditLogFilters,
        page: &PageRequest,
    ) -> Result<(Vec<AuditLog>, i64), AppError> {
        ctx.require_admin()?;
        Ok(AuditLogRepo::list(conn, filters, page)?)
    }
}
