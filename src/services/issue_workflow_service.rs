use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use serde_json::json;
use uuid::Uuid;

use crate::{
    db::enums::{IssueStatus, NotificationKind, UserRole},
    db::models::api::error_codes,
    db::models::issue::Issue,
    db::models::status_history::NewStatusHistory,
    db::repositories::{IssueRepo, StatusHistoryRepo, UserRepo},
    error::AppError,
    services::audit_service::AuditService,
    services::context::RequestContext,
    services::issues_service::is_assignable,
    services::lifecycle,
    services::notifications_service::{self, NotificationsService},
};

/// Outcome of one escalation pass.
#[derive(Debug, Default, Clone, Copy, serde::Serialize)]
pub struct SweepReport {
    pub candidates: usize,
    pub escalated: usize,
    pub failed: usize,
}

pub struct IssueWorkflowService;

impl IssueWorkflowService {
    pub fn transition(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        issue_id: Uuid,
        to: IssueStatus,
        note: Option<String>,
    ) -> Result<Issue, AppError> {
        conn.transaction::<_, AppError, _>(|conn| {
            let issue = IssueRepo::find_for_update(conn, issue_id)?
                .ok_or_else(|| AppError::not_found("issue"))?;
            let from = issue.status;

            lifecycle::authorize_transition(ctx, issue.reporter_id, from, to)?;

            let now = Utc::now();
            let resolved_at = lifecycle::resolved_at_after(issue.resolved_at, to, now);
            let updated = IssueRepo::set_status(conn, issue.id, to, resolved_at, now)?;

            StatusHistoryRepo::append(
                conn,
                &NewStatusHistory {
                    issue_id: issue.id,
                    from_status: Some(from),
                    to_status: to,
                    changed_by: ctx.user_id,
                    note: note.clone(),
                },
            )?;

            NotificationsService::notify(
                conn,
                &[updated.reporter_id],
                Some(ctx.user_id),
                updated.id,
                NotificationKind::StatusChanged,
                notifications_service::status_changed_message(&updated, to),
            )?;

            AuditService::record(
                conn,
                Some(ctx.user_id),
                "issue.status_changed",
                "issue",
                updated.id,
                json!({ "from": from, "to": to, "note": note }),
            )?;

            tracing::info!(
                issue_id = %updated.id,
                actor = %ctx.user_id,
                from = %from,
                to = %to,
                "Issue status changed"
            );
            Ok(updated)
        })
    }

    pub fn assign(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        issue_id: Uuid,
        assignee_id: Uuid,
    ) -> Result<Issue, AppError> {
        ctx.require_staff()?;

        conn.transaction::<_, AppError, _>(|conn| {
            let issue = IssueRepo::find_for_update(conn, issue_id)?
                .ok_or_else(|| AppError::not_found("issue"))?;

            if !is_assignable(conn, assignee_id)? {
                return Err(AppError::validation_with_code(
                    "Assignee must be an active officer or admin",
                    error_codes::ISSUE_INVALID_ASSIGNEE,
                ));
            }

            let now = Utc::now();
            let mut updated = IssueRepo::set_assignee(conn, issue.id, assignee_id, now)?;

            if updated.status == IssueStatus::Submitted {
                let to = IssueStatus::Acknowledged;
                updated = IssueRepo::set_status(conn, updated.id, to, updated.resolved_at, now)?;
                StatusHistoryRepo::append(
                    conn,
                    &NewStatusHistory {
                        issue_id: updated.id,
                        from_status: Some(IssueStatus::Submitted),
                        to_status: to,
                        changed_by: ctx.user_id,
                        note: Some("Acknowledged on assignment".to_string()),
                    },
                )?;
                NotificationsService::notify(
                    conn,
                    &[updated.reporter_id],
                    Some(ctx.user_id),
                    updated.id,
                    NotificationKind::StatusChanged,
                    notifications_service::status_changed_message(&updated, to),
                )?;
            }

            NotificationsService::notify(
                conn,
                &[assignee_id],
                Some(ctx.user_id),
                updated.id,
                NotificationKind::IssueAssigned,
                notifications_service::assigned_message(&updated),
            )?;

            AuditService::record(
                conn,
                Some(ctx.user_id),
                "issue.assigned",
                "issue",
                updated.id,
                json!({ "from": issue.assignee_id, "to": assignee_id }),
            )?;

            tracing::info!(
                issue_id = %updated.id,
                actor = %ctx.user_id,
                assignee_id = %assignee_id,
                "Issue assigned"
            );
            Ok(updated)
        })
    }

    /// Escalates every overdue issue not escalated within `interval`.
    /// Each issue commits on its own so one failure does not stop the pass.
    pub fn run_escalation_sweep(
        conn: &mut PgConnection,
        now: DateTime<Utc>,
        interval: Duration,
    ) -> Result<SweepReport, AppError> {
        let candidates = IssueRepo::list_escalation_candidates(conn, now, now - interval)?;
        let admins: Vec<Uuid> = UserRepo::list_active_by_roles(conn, &[UserRole::Admin])?
            .into_iter()
            .map(|user| user.id)
            .collect();

        let mut report = SweepReport {
            candidates: candidates.len(),
            ..SweepReport::default()
        };

        for issue_id in candidates {
            match escalate_one(conn, issue_id, &admins, now, interval) {
                Ok(true) => report.escalated += 1,
                Ok(false) => {}
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(issue_id = %issue_id, error = %e, "Failed to escalate issue");
                }
            }
        }

        tracing::info!(
            candidates = report.candidates,
            escalated = report.escalated,
            failed = report.failed,
            "Escalation sweep finished"
        );
        Ok(report)
    }
}

fn escalate_one(
    conn: &mut PgConnection,
    issue_id: Uuid,
    admins: &[Uuid],
    now: DateTime<Utc>,
    interval: Duration,
) -> Result<bool, AppError> {
    conn.transaction::<_, AppError, _>(|conn| {
        let Some(issue) = IssueRepo::find_for_update(conn, issue_id)? else {
            return Ok(false);
        };

        // Re-check under the row lock; a transition may have landed meanwhile.
        if !lifecycle::needs_escalation(
            issue.status,
            issue.sla_due_at,
            issue.escalated_at,
            now,
            interval,
        ) {
            return Ok(false);
        }

        let level = issue.escalation_level + 1;
        let priority = issue.priority.escalated();
        let updated = IssueRepo::mark_escalated(conn, issue.id, level, priority, now)?;

        let mut recipients: Vec<Uuid> = updated.assignee_id.into_iter().collect();
        recipients.extend_from_slice(admins);
        NotificationsService::notify(
            conn,
            &recipients,
            None,
            updated.id,
            NotificationKind::SlaEscalated,
            notifications_service::escalated_message(&updated, level),
        )?;

        AuditService::record(
            conn,
            None,
            "issue.escalated",
            "issue",
            updated.id,
            json!({
                "level": level,
                "priority_from": issue.priority,
                "priority_to": priority,
                "sla_due_at": issue.sla_due_at,
            }),
        )?;

        tracing::info!(issue_id = %updated.id, level, priority = %priority, "Issue escalated");
        Ok(true)
    })
}
