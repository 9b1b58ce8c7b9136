use crate::db::enums::{IssuePriority, IssueStatus};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name = crate::schema::issues)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Issue {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub category_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub photo_urls: Vec<String>,
    pub status: IssueStatus,
    pub priority: IssuePriority,
    pub vote_count: i32,
    pub sla_due_at: Option<DateTime<Utc>>,
    pub escalation_level: i32,
    pub escalated_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::issues)]
pub struct NewIssue {
    pub reporter_id: Uuid,
    pub category_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub photo_urls: Vec<String>,
    pub status: IssueStatus,
    pub priority: IssuePriority,
    pub sla_due_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = crate::schema::issues)]
pub struct IssueChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub address: Option<Option<String>>,
    pub photo_urls: Option<Vec<String>>,
    pub category_id: Option<Uuid>,
    pub priority: Option<IssuePriority>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl IssueChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.address.is_none()
            && self.photo_urls.is_none()
            && self.category_id.is_none()
            && self.priority.is_none()
    }
}

/// Issue as seen by one particular caller.
#[derive(Serialize, Debug)]
pub struct IssueDetail {
    #[serde(flatten)]
    pub issue: Issue,
    pub category_name: String,
    pub has_voted: bool,
    pub comment_count: i64,
    pub is_overdue: bool,
}

/// One column of the officer board.
#[derive(Serialize, Debug)]
pub struct BoardColumn {
    pub status: IssueStatus,
    pub count: usize,
    pub issues: Vec<Issue>,
}
