// Status graph and SLA arithmetic

use chrono::{Duration, Utc};
use grievance_backend::db::enums::{IssuePriority, IssueStatus, UserRole};
use grievance_backend::db::models::api::error_codes;
use grievance_backend::services::context::RequestContext;
use grievance_backend::services::lifecycle::{
    allowed_transitions, authorize_transition, can_transition, is_overdue, needs_escalation,
    sla_due_at,
};
use uuid::Uuid;

fn ctx(role: UserRole) -> RequestContext {
    RequestContext {
        user_id: Uuid::new_v4(),
        role,
    }
}

#[test]
fn transition_table_matches_workflow() {
    use IssueStatus::*;
    assert_eq!(allowed_transitions(Submitted), &[Acknowledged, InProgress, Rejected]);
    assert_eq!(allowed_transitions(Resolved), &[Closed, Reopened]);
    assert_eq!(allowed_transitions(Rejected), &[Reopened]);
    assert!(allowed_transitions(Closed).is_empty());

    assert!(can_transition(Reopened, InProgress));
    assert!(!can_transition(Acknowledged, Resolved));
    assert!(!can_transition(Submitted, Closed));
}

#[test]
fn reopen_cycle_is_walkable_by_staff() {
    use IssueStatus::*;
    let admin = ctx(UserRole::Admin);
    let reporter = Uuid::new_v4();
    let path = [InProgress, Resolved, Reopened, InProgress, Resolved, Closed];
    for pair in path.windows(2) {
        authorize_transition(&admin, reporter, pair[0], pair[1]).unwrap();
    }
}

#[test]
fn citizen_cannot_triage_own_report() {
    let citizen = ctx(UserRole::Citizen);
    let err = authorize_transition(
        &citizen,
        citizen.user_id,
        IssueStatus::Submitted,
        IssueStatus::InProgress,
    )
    .unwrap_err();
    assert!(err.code().is_none());
}

#[test]
fn illegal_move_reports_transition_code() {
    let officer = ctx(UserRole::Officer);
    let err = authorize_transition(
        &officer,
        Uuid::new_v4(),
        IssueStatus::Closed,
        IssueStatus::Reopened,
    )
    .unwrap_err();
    assert_eq!(err.code(), Some(error_codes::ISSUE_INVALID_TRANSITION));
}

#[test]
fn sla_deadline_and_escalation() {
    let created = Utc::now() - Duration::hours(30);
    let due = sla_due_at(created, 24);
    assert_eq!(due - created, Duration::hours(24));

    let now = Utc::now();
    assert!(is_overdue(IssueStatus::Reopened, Some(due), now));
    assert!(!is_overdue(IssueStatus::Closed, Some(due), now));

    let interval = Duration::hours(24);
    assert!(needs_escalation(IssueStatus::Acknowledged, Some(due), None, now, interval));
    assert!(!needs_escalation(
        IssueStatus::Acknowledged,
        Some(due),
        Some(now - Duration::hours(1)),
        now,
        interval
    ));
}

#[test]
fn priority_climbs_to_urgent() {
    let mut priority = IssuePriority::Low;
    for _ in 0..5 {
        priority = priority.escalated();
    }
    assert_eq!(priority, IssuePriority::Urgent);
}
