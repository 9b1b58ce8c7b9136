//! Issue lifecycle rules: the legal status graph, who may walk it, and the
//! SLA arithmetic. Everything here is pure so the services stay thin.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::db::enums::IssueStatus;
use crate::db::models::api::error_codes;
use crate::error::{AppError, AppResult};
use crate::services::context::RequestContext;

pub fn allowed_transitions(from: IssueStatus) -> &'static [IssueStatus] {
    use IssueStatus::*;
    match from {
        Submitted => &[Acknowledged, InProgress, Rejected],
        Acknowledged => &[InProgress, Rejected],
        InProgress => &[Resolved, Rejected],
        Resolved => &[Closed, Reopened],
        Rejected => &[Reopened],
        Reopened => &[Acknowledged, InProgress, Rejected],
        Closed => &[],
    }
}

pub fn can_transition(from: IssueStatus, to: IssueStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

/// Reporters may only confirm or dispute a resolution.
fn reporter_may_transition(from: IssueStatus, to: IssueStatus) -> bool {
    from == IssueStatus::Resolved && matches!(to, IssueStatus::Closed | IssueStatus::Reopened)
}

pub fn authorize_transition(
    ctx: &RequestContext,
    reporter_id: Uuid,
    from: IssueStatus,
    to: IssueStatus,
) -> AppResult<()> {
    let is_reporter = ctx.user_id == reporter_id;
    if !ctx.is_staff() && !is_reporter {
        return Err(AppError::forbidden(
            "Only officers, admins or the reporter can change an issue's status",
        ));
    }

    if from == to {
        return Err(AppError::validation_with_code(
            format!("Issue is already {}", to),
            error_codes::ISSUE_INVALID_TRANSITION,
        ));
    }

    if !can_transition(from, to) {
        return Err(AppError::validation_with_code(
            format!("Cannot move issue from {} to {}", from, to),
            error_codes::ISSUE_INVALID_TRANSITION,
        ));
    }

    if !ctx.is_staff() && !reporter_may_transition(from, to) {
        return Err(AppError::forbidden(
            "Reporters can only close or reopen a resolved issue",
        ));
    }

    Ok(())
}

/// Value `resolved_at` should hold after moving to `to`.
pub fn resolved_at_after(
    current: Option<DateTime<Utc>>,
    to: IssueStatus,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match to {
        IssueStatus::Resolved => Some(now),
        IssueStatus::Reopened => None,
        _ => current,
    }
}

pub fn sla_due_at(created_at: DateTime<Utc>, sla_hours: i32) -> DateTime<Utc> {
    created_at + Duration::hours(i64::from(sla_hours))
}

pub fn is_overdue(status: IssueStatus, due: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    status.is_open() && due.is_some_and(|due| due < now)
}

/// Overdue and not escalated within the last `interval`.
pub fn needs_escalation(
    status: IssueStatus,
    due: Option<DateTime<Utc>>,
    escalated_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    interval: Duration,
) -> bool {
    is_overdue(status, due, now) && escalated_at.is_none_or(|last| last < now - interval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::enums::UserRole;
    use IssueStatus::*;

    fn ctx(role: UserRole) -> RequestContext {
        RequestContext {
            user_id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn closed_is_terminal() {
        for to in IssueStatus::ALL {
            assert!(!can_transition(Closed, *to));
        }
    }

    #[test]
    fn every_open_status_can_be_rejected() {
        for from in IssueStatus::ALL.iter().filter(|s| s.is_open()) {
            assert!(can_transition(*from, Rejected), "{} -> rejected", from);
        }
    }

    #[test]
    fn no_self_loops_in_graph() {
        for from in IssueStatus::ALL {
            assert!(!allowed_transitions(*from).contains(from));
        }
    }

    #[test]
    fn officer_walks_happy_path() {
        let officer = ctx(UserRole::Officer);
        let reporter = Uuid::new_v4();
        let path = [Submitted, Acknowledged, InProgress, Resolved, Closed];
        for pair in path.windows(2) {
            assert!(authorize_transition(&officer, reporter, pair[0], pair[1]).is_ok());
        }
    }

    #[test]
    fn illegal_and_same_status_are_unprocessable() {
        let officer = ctx(UserRole::Officer);
        let err = authorize_transition(&officer, Uuid::new_v4(), Submitted, Closed).unwrap_err();
        assert_eq!(err.code(), Some(error_codes::ISSUE_INVALID_TRANSITION));

        let err = authorize_transition(&officer, Uuid::new_v4(), InProgress, InProgress).unwrap_err();
        assert_eq!(err.code(), Some(error_codes::ISSUE_INVALID_TRANSITION));
    }

    #[test]
    fn reporter_can_only_confirm_or_dispute() {
        let citizen = ctx(UserRole::Citizen);
        let own = citizen.user_id;
        assert!(authorize_transition(&citizen, own, Resolved, Reopened).is_ok());
        assert!(authorize_transition(&citizen, own, Resolved, Closed).is_ok());
        assert!(matches!(
            authorize_transition(&citizen, own, Submitted, Acknowledged),
            Err(AppError::Forbidden { .. })
        ));
    }

    #[test]
    fn strangers_are_forbidden() {
        let citizen = ctx(UserRole::Citizen);
        assert!(matches!(
            authorize_transition(&citizen, Uuid::new_v4(), Resolved, Reopened),
            Err(AppError::Forbidden { .. })
        ));
    }

    #[test]
    fn resolved_at_tracking() {
        let now = Utc::now();
        let earlier = now - Duration::hours(3);
        assert_eq!(resolved_at_after(None, Resolved, now), Some(now));
        assert_eq!(resolved_at_after(Some(earlier), Reopened, now), None);
        assert_eq!(resolved_at_after(Some(earlier), Closed, now), Some(earlier));
    }

    #[test]
    fn sla_and_overdue() {
        let created = Utc::now() - Duration::hours(50);
        let due = sla_due_at(created, 48);
        let now = Utc::now();
        assert!(is_overdue(InProgress, Some(due), now));
        assert!(!is_overdue(Resolved, Some(due), now));
        assert!(!is_overdue(InProgress, None, now));
        assert!(!is_overdue(InProgress, Some(now + Duration::hours(1)), now));
    }

    #[test]
    fn escalation_respects_interval() {
        let now = Utc::now();
        let due = Some(now - Duration::hours(5));
        let interval = Duration::hours(24);
        assert!(needs_escalation(Submitted, due, None, now, interval));
        assert!(!needs_escalation(Submitted, due, Some(now - Duration::hours(2)), now, interval));
        assert!(needs_escalation(Submitted, due, Some(now - Duration::hours(25)), now, interval));
        assert!(!needs_escalation(Closed, due, None, now, interval));
    }
}
