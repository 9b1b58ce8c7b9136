use crate::db::enums::IssueStatus;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

// Append-only log, rows are never updated.
#[derive(Queryable, Selectable, Serialize, Clone, Debug)]
#[diesel(table_name = crate::schema::status_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StatusHistory {
    pub id: Uuid,
    pub issue_id: Uuid,
    pub from_status: Option<IssueStatus>,
    pub to_status: IssueStatus,
    pub changed_by: Uuid,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::status_history)]
pub struct NewStatusHistory {
    pub issue_id: Uuid,
    pub from_status: Option<IssueStatus>,
    pub to_status: IssueStatus,
    pub changed_by: Uuid,
    pub note: Option<String>,
}
