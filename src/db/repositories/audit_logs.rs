use diesel::prelude::*;
use uuid::Uuid;

use crate::db::models::api::PageRequest;
use crate::db::models::audit_log::{AuditLog, NewAuditLog};

#[derive(Debug, Clone, Default)]
pub struct AuditLogFilters {
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
}

pub struct AuditLogRepo;

impl AuditLogRepo {
    pub fn insert(conn: &mut PgConnection, entry: &NewAuditLog) -> Result<usize, diesel::result::Error> {
        diesel::insert_into(crate::schema::audit_logs::table)
            .values(entry)
            .execute(conn)
    }

    pub fn list(
        conn: &mut PgConnection,
        filters: &AuditLogFilters,
        page: &PageRequest,
    ) -> Result<(Vec<AuditLog>, i64), diesel::result::Error> {
        use crate::schema::audit_logs::dsl as a;

        let base = || {
            let mut query = a::audit_logs.into_boxed::<diesel::pg::Pg>();
            if let Some(kind) = filters.entity_type.clone() {
                query = query.filter(a::entity_type.eq(kind));
            }
            if let Some(target) = filters.entity_id {
                query = query.filter(a::entity_id.eq(target));
            }
            if let Some(actor) = filters.actor_id {
                query = query.filter(a::actor_id.eq(actor));
            }
            query
        };

        let total: i64 = base().count().get_result(conn)?;
        let rows = base()
            .order((a::created_at.desc(), a::id.asc()))
            .limit(page.per_page)
            .offset(page.offset())
            .select(AuditLog::as_select())
            .load(conn)?;
        Ok((rows, total))
    }
}
