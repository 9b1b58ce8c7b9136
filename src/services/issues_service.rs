use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    db::enums::{IssueStatus, NotificationKind, UserRole},
    db::models::api::{PageRequest, error_codes},
    db::models::category::Category,
    db::models::issue::{BoardColumn, Issue, IssueChanges, IssueDetail, NewIssue},
    db::models::status_history::{NewStatusHistory, StatusHistory},
    db::repositories::comments::HiddenVisibility,
    db::repositories::issues::IssueFilters,
    db::repositories::{
        CategoryRepo, CommentRepo, IssueRepo, StatusHistoryRepo, UserRepo, VoteRepo,
    },
    error::AppError,
    routes::issues::{CreateIssueRequest, UpdateIssueRequest},
    services::audit_service::AuditService,
    services::context::RequestContext,
    services::lifecycle,
    services::notifications_service::{self, NotificationsService},
};

pub struct IssuesService;

impl IssuesService {
    pub fn create(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        req: &CreateIssueRequest,
    ) -> Result<Issue, AppError> {
        conn.transaction::<_, AppError, _>(|conn| {
            let category = active_category(conn, req.category_id)?;
            let now = Utc::now();

            let assignee_id = match category.default_assignee_id {
                Some(candidate) if is_assignable(conn, candidate)? => Some(candidate),
                Some(candidate) => {
                    tracing::warn!(
                        category_id = %category.id,
                        assignee_id = %candidate,
                        "Skipping default assignee that is no longer active staff"
                    );
                    None
                }
                None => None,
            };

            let issue = IssueRepo::insert(
                conn,
                &NewIssue {
                    reporter_id: ctx.user_id,
                    category_id: category.id,
                    assignee_id,
                    title: req.title.trim().to_string(),
                    description: req.description.trim().to_string(),
                    latitude: req.latitude,
                    longitude: req.longitude,
                    address: normalize_optional(req.address.as_deref()),
                    photo_urls: req.photo_urls.clone(),
                    status: IssueStatus::Submitted,
                    priority: Default::default(),
                    sla_due_at: Some(lifecycle::sla_due_at(now, category.sla_hours)),
                    created_at: now,
                    updated_at: now,
                },
            )?;

            StatusHistoryRepo::append(
                conn,
                &NewStatusHistory {
                    issue_id: issue.id,
                    from_status: None,
                    to_status: IssueStatus::Submitted,
                    changed_by: ctx.user_id,
                    note: None,
                },
            )?;

            if let Some(assignee) = issue.assignee_id {
                NotificationsService::notify(
                    conn,
                    &[assignee],
                    Some(ctx.user_id),
                    issue.id,
                    NotificationKind::IssueAssigned,
                    notifications_service::assigned_message(&issue),
                )?;
            }

            AuditService::record(
                conn,
                Some(ctx.user_id),
                "issue.created",
                "issue",
                issue.id,
                json!({
                    "category_id": issue.category_id,
                    "assignee_id": issue.assignee_id,
                    "sla_due_at": issue.sla_due_at,
                }),
            )?;

            tracing::info!(
                issue_id = %issue.id,
                reporter_id = %ctx.user_id,
                category_id = %issue.category_id,
                "Issue created"
            );
            Ok(issue)
        })
    }

    pub fn list(
        conn: &mut PgConnection,
        _ctx: &RequestContext,
        filters: &IssueFilters,
        page: &PageRequest,
    ) -> Result<(Vec<Issue>, i64), AppError> {
        Ok(IssueRepo::list(conn, filters, page)?)
    }

    pub fn get_detail(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        issue_id: Uuid,
    ) -> Result<IssueDetail, AppError> {
        let issue = find_issue(conn, issue_id)?;
        let category_name = CategoryRepo::find_by_id(conn, issue.category_id)?
            .map(|c| c.name)
            .unwrap_or_default();
        let has_voted = VoteRepo::exists(conn, issue.id, ctx.user_id)?;
        let comment_count =
            CommentRepo::count_visible(conn, issue.id, comment_visibility(ctx))?;
        let is_overdue = lifecycle::is_overdue(issue.status, issue.sla_due_at, Utc::now());

        Ok(IssueDetail {
            issue,
            category_name,
            has_voted,
            comment_count,
            is_overdue,
        })
    }

    pub fn update(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        issue_id: Uuid,
        req: &UpdateIssueRequest,
    ) -> Result<Issue, AppError> {
        conn.transaction::<_, AppError, _>(|conn| {
            let issue = IssueRepo::find_for_update(conn, issue_id)?
                .ok_or_else(|| AppError::not_found("issue"))?;

            authorize_edit(ctx, &issue)?;

            if req.priority.is_some() && !ctx.is_staff() {
                return Err(AppError::forbidden(
                    "Only officers and admins can set priority",
                ));
            }

            if let Some(category_id) = req.category_id {
                if category_id != issue.category_id {
                    active_category(conn, category_id)?;
                }
            }

            let mut changes = IssueChanges {
                title: req.title.as_deref().map(|t| t.trim().to_string()),
                description: req.description.as_deref().map(|d| d.trim().to_string()),
                address: req
                    .address
                    .as_deref()
                    .map(|address| normalize_optional(Some(address))),
                photo_urls: req.photo_urls.clone(),
                category_id: req.category_id,
                priority: req.priority,
                updated_at: None,
            };

            if changes.is_empty() {
                return Err(AppError::validation("No update data provided"));
            }
            changes.updated_at = Some(Utc::now());

            let updated = IssueRepo::update_fields(conn, issue.id, &changes)?;

            AuditService::record(
                conn,
                Some(ctx.user_id),
                "issue.updated",
                "issue",
                issue.id,
                json!({ "fields": req.changed_fields() }),
            )?;

            tracing::info!(issue_id = %issue.id, actor = %ctx.user_id, "Issue updated");
            Ok(updated)
        })
    }

    pub fn delete(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        issue_id: Uuid,
    ) -> Result<(), AppError> {
        conn.transaction::<_, AppError, _>(|conn| {
            let issue = IssueRepo::find_for_update(conn, issue_id)?
                .ok_or_else(|| AppError::not_found("issue"))?;

            let reporter_may_delete =
                issue.reporter_id == ctx.user_id && issue.status == IssueStatus::Submitted;
            if !ctx.is_admin() && !reporter_may_delete {
                return Err(AppError::forbidden(
                    "Only admins, or the reporter before triage, can delete an issue",
                ));
            }

            IssueRepo::delete_by_id(conn, issue.id)?;

            AuditService::record(
                conn,
                Some(ctx.user_id),
                "issue.deleted",
                "issue",
                issue.id,
                json!({ "title": issue.title, "status": issue.status }),
            )?;

            tracing::info!(issue_id = %issue.id, actor = %ctx.user_id, "Issue deleted");
            Ok(())
        })
    }

    pub fn history(
        conn: &mut PgConnection,
        _ctx: &RequestContext,
        issue_id: Uuid,
    ) -> Result<Vec<StatusHistory>, AppError> {
        find_issue(conn, issue_id)?;
        Ok(StatusHistoryRepo::list_by_issue(conn, issue_id)?)
    }

    pub fn board(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        assignee: Option<Uuid>,
    ) -> Result<Vec<BoardColumn>, AppError> {
        ctx.require_staff()?;
        let issues = IssueRepo::list_board(conn, assignee)?;
        Ok(group_board(issues))
    }

    /// Rows for export, each paired with its category name.
    pub fn export_rows(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        filters: &IssueFilters,
        limit: i64,
    ) -> Result<Vec<(Issue, String)>, AppError> {
        ctx.require_staff()?;

        let names: HashMap<Uuid, String> = CategoryRepo::list(conn, true)?
            .into_iter()
            .map(|c: Category| (c.id, c.name))
            .collect();

        let issues = IssueRepo::list_unpaged(conn, filters, limit)?;
        Ok(issues
            .into_iter()
            .map(|issue| {
                let name = names.get(&issue.category_id).cloned().unwrap_or_default();
                (issue, name)
            })
            .collect())
    }
}

pub(crate) fn find_issue(conn: &mut PgConnection, issue_id: Uuid) -> Result<Issue, AppError> {
    IssueRepo::find_by_id(conn, issue_id)?.ok_or_else(|| AppError::not_found("issue"))
}

pub(crate) fn comment_visibility(ctx: &RequestContext) -> HiddenVisibility {
    if ctx.is_staff() {
        HiddenVisibility::All
    } else {
        HiddenVisibility::OwnOnly(ctx.user_id)
    }
}

/// Active officer or admin.
pub(crate) fn is_assignable(conn: &mut PgConnection, user_id: Uuid) -> Result<bool, AppError> {
    Ok(UserRepo::find_by_id(conn, user_id)?
        .is_some_and(|user| user.is_active && user.role != UserRole::Citizen))
}

fn active_category(conn: &mut PgConnection, category_id: Uuid) -> Result<Category, AppError> {
    match CategoryRepo::find_by_id(conn, category_id)? {
        Some(category) if category.is_active => Ok(category),
        _ => Err(AppError::validation_with_code(
            "Category does not exist or is inactive",
            error_codes::CATEGORY_INACTIVE,
        )),
    }
}

fn authorize_edit(ctx: &RequestContext, issue: &Issue) -> Result<(), AppError> {
    if ctx.is_staff() {
        return Ok(());
    }
    if issue.reporter_id != ctx.user_id {
        return Err(AppError::forbidden("You can only edit your own reports"));
    }
    if issue.status != IssueStatus::Submitted {
        return Err(AppError::validation_with_code(
            "Reports can only be edited before they are triaged",
            error_codes::ISSUE_NOT_EDITABLE,
        ));
    }
    Ok(())
}

fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Groups non-closed issues into one column per status, in declaration order.
/// Within a column: most urgent first, then earliest SLA deadline.
pub fn group_board(issues: Vec<Issue>) -> Vec<BoardColumn> {
    let mut by_status: HashMap<IssueStatus, Vec<Issue>> = HashMap::new();
    for issue in issues {
        by_status.entry(issue.status).or_default().push(issue);
    }

    IssueStatus::ALL
        .iter()
        .filter(|status| **status != IssueStatus::Closed)
        .map(|status| {
            let mut column = by_status.remove(status).unwrap_or_default();
            column.sort_by(|a, b| {
                b.priority
                    .cmp(&a.priority)
                    .then_with(|| due_key(a.sla_due_at).cmp(&due_key(b.sla_due_at)))
                    .then_with(|| a.created_at.cmp(&b.created_at))
            });
            BoardColumn {
                status: *status,
                count: column.len(),
                issues: column,
            }
        })
        .collect()
}

/// Missing deadlines sort last.
fn due_key(due: Option<DateTime<Utc>>) -> (bool, Option<DateTime<Utc>>) {
    (due.is_none(), due)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::enums::IssuePriority;
    use chrono::Duration;

    fn issue(status: IssueStatus, priority: IssuePriority, due_in_hours: Option<i64>) -> Issue {
        let now = Utc::now();
        Issue {
            id: Uuid::new_v4(),
            reporter_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            assignee_id: None,
            title: "Broken streetlight".to_string(),
            description: "Dark corner".to_string(),
            latitude: 12.97,
            longitude: 77.59,
            address: None,
            photo_urls: vec![],
            status,
            priority,
            vote_count: 0,
            sla_due_at: due_in_hours.map(|h| now + Duration::hours(h)),
            escalation_level: 0,
            escalated_at: None,
            resolved_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn board_has_one_column_per_non_closed_status() {
        let columns = group_board(vec![]);
        let statuses: Vec<IssueStatus> = columns.iter().map(|c| c.status).collect();
        assert_eq!(statuses.len(), IssueStatus::ALL.len() - 1);
        assert_eq!(statuses[0], IssueStatus::Submitted);
        assert!(!statuses.contains(&IssueStatus::Closed));
    }

    #[test]
    fn board_orders_by_priority_then_deadline() {
        let low = issue(IssueStatus::InProgress, IssuePriority::Low, Some(1));
        let urgent_late = issue(IssueStatus::InProgress, IssuePriority::Urgent, Some(10));
        let urgent_soon = issue(IssueStatus::InProgress, IssuePriority::Urgent, Some(2));
        let urgent_none = issue(IssueStatus::InProgress, IssuePriority::Urgent, None);
        let expected = vec![urgent_soon.id, urgent_late.id, urgent_none.id, low.id];

        let columns = group_board(vec![low, urgent_none, urgent_late, urgent_soon]);
        let in_progress = columns
            .iter()
            .find(|c| c.status == IssueStatus::InProgress)
            .unwrap();
        assert_eq!(in_progress.count, 4);
        let ids: Vec<Uuid> = in_progress.issues.iter().map(|i| i.id).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn normalize_optional_drops_blank() {
        assert_eq!(normalize_optional(Some("  ")), None);
        assert_eq!(normalize_optional(Some(" MG Road ")), Some("MG Road".to_string()));
        assert_eq!(normalize_optional(None), None);
    }
}
