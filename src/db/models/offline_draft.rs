use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

#[derive(Queryable, Selectable, Serialize, Clone, Debug)]
#[diesel(table_name = crate::schema::offline_drafts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OfflineDraft {
    pub id: Uuid,
    pub user_id: Uuid,
    pub client_draft_id: String,
    pub payload: JsonValue,
    pub content_hash: String,
    pub submitted_issue_id: Option<Uuid>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::offline_drafts)]
pub struct NewOfflineDraft {
    pub user_id: Uuid,
    pub client_draft_id: String,
    pub payload: JsonValue,
    pub content_hash: String,
}

/// Where a draft stands relative to issue creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftState {
    Open,
    Submitted(Uuid),
    /// Submitted, but the resulting issue has since been deleted.
    Orphaned,
}

impl OfflineDraft {
    pub fn state(&self) -> DraftState {
        match (self.submitted_at, self.submitted_issue_id) {
            (None, _) => DraftState::Open,
            (Some(_), Some(issue_id)) => DraftState::Submitted(issue_id),
            (Some(_), None) => DraftState::Orphaned,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct DraftSyncResult {
    pub draft: OfflineDraft,
    pub changed: bool,
}
