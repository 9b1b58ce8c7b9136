use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::enums::{IssuePriority, IssueStatus};
use crate::db::models::api::PageRequest;
use crate::db::models::issue::{Issue, IssueChanges, NewIssue};
use crate::schema::issues;

use super::like_pattern;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSort {
    #[default]
    Newest,
    Oldest,
    MostVoted,
    SlaDue,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

/// Criteria shared by the list, export and heatmap queries.
#[derive(Debug, Clone, Default)]
pub struct IssueFilters {
    pub status: Option<IssueStatus>,
    pub category_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub reporter_id: Option<Uuid>,
    pub overdue_at: Option<DateTime<Utc>>,
    pub created_after: Option<DateTime<Utc>>,
    pub search: Option<String>,
    pub bbox: Option<BoundingBox>,
    pub sort: IssueSort,
}

pub struct IssueRepo;

impl IssueRepo {
    fn filtered(filters: &IssueFilters) -> issues::BoxedQuery<'static, Pg> {
        use crate::schema::issues::dsl as i;

        let mut query = i::issues.into_boxed();

        if let Some(status) = filters.status {
            query = query.filter(i::status.eq(status));
        }
        if let Some(category_id) = filters.category_id {
            query = query.filter(i::category_id.eq(category_id));
        }
        if let Some(assignee_id) = filters.assignee_id {
            query = query.filter(i::assignee_id.eq(assignee_id));
        }
        if let Some(reporter_id) = filters.reporter_id {
            query = query.filter(i::reporter_id.eq(reporter_id));
        }
        if let Some(now) = filters.overdue_at {
            query = query
                .filter(i::status.eq_any(IssueStatus::open_statuses()))
                .filter(i::sla_due_at.lt(now));
        }
        if let Some(since) = filters.created_after {
            query = query.filter(i::created_at.ge(since));
        }
        if let Some(term) = filters.search.as_deref().filter(|t| !t.trim().is_empty()) {
            let pattern = like_pattern(term.trim());
            query = query.filter(
                i::title
                    .ilike(pattern.clone())
                    .or(i::description.ilike(pattern)),
            );
        }
        if let Some(bbox) = filters.bbox {
            query = query
                .filter(i::latitude.between(bbox.min_lat, bbox.max_lat))
                .filter(i::longitude.between(bbox.min_lng, bbox.max_lng));
        }

        query
    }

    fn sorted(
        query: issues::BoxedQuery<'static, Pg>,
        sort: IssueSort,
    ) -> issues::BoxedQuery<'static, Pg> {
        use crate::schema::issues::dsl as i;
        match sort {
            IssueSort::Newest => query.order((i::created_at.desc(), i::id.asc())),
            IssueSort::Oldest => query.order((i::created_at.asc(), i::id.asc())),
            IssueSort::MostVoted => {
                query.order((i::vote_count.desc(), i::created_at.desc(), i::id.asc()))
            }
            IssueSort::SlaDue => query.order((i::sla_due_at.asc().nulls_last(), i::id.asc())),
        }
    }

    pub fn find_by_id(
        conn: &mut PgConnection,
        issue_id: Uuid,
    ) -> Result<Option<Issue>, diesel::result::Error> {
        use crate::schema::issues::dsl as i;
        i::issues
            .filter(i::id.eq(issue_id))
            .select(Issue::as_select())
            .first(conn)
            .optional()
    }

    /// Row-locks the issue for the rest of the transaction.
    pub fn find_for_update(
        conn: &mut PgConnection,
        issue_id: Uuid,
    ) -> Result<Option<Issue>, diesel::result::Error> {
        use crate::schema::issues::dsl as i;
        i::issues
            .filter(i::id.eq(issue_id))
            .select(Issue::as_select())
            .for_update()
            .first(conn)
            .optional()
    }

    pub fn list(
        conn: &mut PgConnection,
        filters: &IssueFilters,
        page: &PageRequest,
    ) -> Result<(Vec<Issue>, i64), diesel::result::Error> {
        let total: i64 = Self::filtered(filters).count().get_result(conn)?;
        let rows = Self::sorted(Self::filtered(filters), filters.sort)
            .limit(page.per_page)
            .offset(page.offset())
            .select(Issue::as_select())
            .load(conn)?;
        Ok((rows, total))
    }

    pub fn list_unpaged(
        conn: &mut PgConnection,
        filters: &IssueFilters,
        limit: i64,
    ) -> Result<Vec<Issue>, diesel::result::Error> {
        Self::sorted(Self::filtered(filters), filters.sort)
            .limit(limit)
            .select(Issue::as_select())
            .load(conn)
    }

    /// Coordinates and vote counts only, for map rendering.
    pub fn list_points(
        conn: &mut PgConnection,
        filters: &IssueFilters,
        limit: i64,
    ) -> Result<Vec<(f64, f64, i32)>, diesel::result::Error> {
        use crate::schema::issues::dsl as i;
        Self::filtered(filters)
            .limit(limit)
            .select((i::latitude, i::longitude, i::vote_count))
            .load(conn)
    }

    pub fn list_board(
        conn: &mut PgConnection,
        assignee: Option<Uuid>,
    ) -> Result<Vec<Issue>, diesel::result::Error> {
        use crate::schema::issues::dsl as i;
        let mut query = i::issues
            .filter(i::status.ne(IssueStatus::Closed))
            .into_boxed();
        if let Some(assignee_id) = assignee {
            query = query.filter(i::assignee_id.eq(assignee_id));
        }
        query.select(Issue::as_select()).load(conn)
    }

    pub fn insert(
        conn: &mut PgConnection,
        new_issue: &NewIssue,
    ) -> Result<Issue, diesel::result::Error> {
        diesel::insert_into(issues::table)
            .values(new_issue)
            .returning(Issue::as_returning())
            .get_result(conn)
    }

    pub fn update_fields(
        conn: &mut PgConnection,
        issue_id: Uuid,
        changes: &IssueChanges,
    ) -> Result<Issue, diesel::result::Error> {
        use crate::schema::issues::dsl as i;
        diesel::update(i::issues.filter(i::id.eq(issue_id)))
            .set(changes)
            .returning(Issue::as_returning())
            .get_result(conn)
    }

    pub fn set_status(
        conn: &mut PgConnection,
        issue_id: Uuid,
        new_status: IssueStatus,
        resolved: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Issue, diesel::result::Error> {
        use crate::schema::issues::dsl as i;
        diesel::update(i::issues.filter(i::id.eq(issue_id)))
            .set((
                i::status.eq(new_status),
                i::resolved_at.eq(resolved),
                i::updated_at.eq(now),
            ))
            .returning(Issue::as_returning())
            .get_result(conn)
    }

    pub fn set_assignee(
        conn: &mut PgConnection,
        issue_id: Uuid,
        new_assignee: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Issue, diesel::result::Error> {
        use crate::schema::issues::dsl as i;
        diesel::update(i::issues.filter(i::id.eq(issue_id)))
            .set((i::assignee_id.eq(Some(new_assignee)), i::updated_at.eq(now)))
            .returning(Issue::as_returning())
            .get_result(conn)
    }

    pub fn increment_votes(
        conn: &mut PgConnection,
        issue_id: Uuid,
    ) -> Result<i32, diesel::result::Error> {
        use crate::schema::issues::dsl as i;
        diesel::update(i::issues.filter(i::id.eq(issue_id)))
            .set(i::vote_count.eq(i::vote_count + 1))
            .returning(i::vote_count)
            .get_result(conn)
    }

    /// Decrements the vote counter, never letting it drop below zero.
    pub fn decrement_votes(
        conn: &mut PgConnection,
        issue_id: Uuid,
    ) -> Result<i32, diesel::result::Error> {
        use crate::schema::issues::dsl as i;
        let updated = diesel::update(
            i::issues
                .filter(i::id.eq(issue_id))
                .filter(i::vote_count.gt(0)),
        )
        .set(i::vote_count.eq(i::vote_count - 1))
        .returning(i::vote_count)
        .get_result::<i32>(conn)
        .optional()?;

        match updated {
            Some(count) => Ok(count),
            None => i::issues
                .filter(i::id.eq(issue_id))
                .select(i::vote_count)
                .first(conn),
        }
    }

    /// Open issues past their SLA whose last escalation is older than `cutoff`.
    pub fn list_escalation_candidates(
        conn: &mut PgConnection,
        now: DateTime<Utc>,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, diesel::result::Error> {
        use crate::schema::issues::dsl as i;
        i::issues
            .filter(i::status.eq_any(IssueStatus::open_statuses()))
            .filter(i::sla_due_at.lt(now))
            .filter(i::escalated_at.is_null().or(i::escalated_at.lt(cutoff)))
            .order(i::sla_due_at.asc())
            .select(i::id)
            .load(conn)
    }

    pub fn mark_escalated(
        conn: &mut PgConnection,
        issue_id: Uuid,
        level: i32,
        new_priority: IssuePriority,
        now: DateTime<Utc>,
    ) -> Result<Issue, diesel::result::Error> {
        use crate::schema::issues::dsl as i;
        diesel::update(i::issues.filter(i::id.eq(issue_id)))
            .set((
                i::escalation_level.eq(level),
                i::escalated_at.eq(Some(now)),
                i::priority.eq(new_priority),
                i::updated_at.eq(now),
            ))
            .returning(Issue::as_returning())
            .get_result(conn)
    }

    pub fn delete_by_id(
        conn: &mut PgConnection,
        issue_id: Uuid,
    ) -> Result<usize, diesel::result::Error> {
        use crate::schema::issues::dsl as i;
        diesel::delete(i::issues.filter(i::id.eq(issue_id))).execute(conn)
    }
}
