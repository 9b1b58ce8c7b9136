// Service-level tests against a migrated Postgres (DATABASE_URL).

use chrono::{Duration, Utc};
use diesel::{Connection, PgConnection};
use grievance_backend::db::enums::{IssueStatus, UserRole};
use grievance_backend::db::models::api::error_codes;
use grievance_backend::db::models::category::{Category, NewCategory};
use grievance_backend::db::models::issue::Issue;
use grievance_backend::db::models::user::NewUser;
use grievance_backend::db::repositories::{CategoryRepo, IssueRepo, UserRepo};
use grievance_backend::error::AppError;
use grievance_backend::routes::issues::CreateIssueRequest;
use grievance_backend::services::context::RequestContext;
use grievance_backend::services::{
    AnalyticsService, CommentsService, DraftsService, IssueWorkflowService, IssuesService, NotificationsService,
    VotesService,
};
use serde_json::json;
use uuid::Uuid;

fn connect() -> PgConnection {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    PgConnection::establish(&url).expect("database must be reachable")
}

fn seed_user(conn: &mut PgConnection, role: UserRole) -> RequestContext {
    let id = Uuid::new_v4();
    let user = UserRepo::insert_if_absent(
        conn,
        &NewUser {
            id,
            email: format!("{}-{}@example.com", role, id),
            name: format!("Test {}", role),
            role,
        },
    )
    .unwrap();
    RequestContext {
        user_id: user.id,
        role: user.role,
    }
}

fn seed_category(conn: &mut PgConnection, sla_hours: i32) -> Category {
    CategoryRepo::insert(
        conn,
        &NewCategory {
            name: format!("Roads {}", Uuid::new_v4().simple()),
            description: None,
            sla_hours,
            default_assignee_id: None,
        },
    )
    .unwrap()
}

fn issue_request(category_id: Uuid) -> CreateIssueRequest {
    CreateIssueRequest {
        title: "Pothole near bus stop".to_string(),
        description: "Two wheelers swerving into traffic".to_string(),
        latitude: 12.97,
        longitude: 77.59,
        address: None,
        photo_urls: vec![],
        category_id,
    }
}

fn seed_issue(conn: &mut PgConnection, reporter: &RequestContext, sla_hours: i32) -> Issue {
    let category = seed_category(conn, sla_hours);
    IssuesService::create(conn, reporter, &issue_request(category.id)).unwrap()
}

#[test]
#[ignore = "requires database"]
fn test_assign_transition_and_history() {
    let mut conn = connect();
    let reporter = seed_user(&mut conn, UserRole::Citizen);
    let officer = seed_user(&mut conn, UserRole::Officer);
    let issue = seed_issue(&mut conn, &reporter, 48);
    assert_eq!(issue.status, IssueStatus::Submitted);

    let assigned = IssueWorkflowService::assign(&mut conn, &officer, issue.id, officer.user_id).unwrap();
    assert_eq!(assigned.assignee_id, Some(officer.user_id));
    assert_eq!(assigned.status, IssueStatus::Acknowledged);

    let unread_before = NotificationsService::unread_count(&mut conn, &reporter).unwrap();
    let moved = IssueWorkflowService::transition(
        &mut conn,
        &officer,
        issue.id,
        IssueStatus::InProgress,
        Some("Crew dispatched".to_string()),
    )
    .unwrap();
    assert_eq!(moved.status, IssueStatus::InProgress);
    assert_eq!(
        NotificationsService::unread_count(&mut conn, &reporter).unwrap(),
        unread_before + 1
    );

    let history = IssuesService::history(&mut conn, &reporter, issue.id).unwrap();
    let steps: Vec<_> = history.iter().map(|h| (h.from_status, h.to_status)).collect();
    assert_eq!(
        steps,
        vec![
            (None, IssueStatus::Submitted),
            (Some(IssueStatus::Submitted), IssueStatus::Acknowledged),
            (Some(IssueStatus::Acknowledged), IssueStatus::InProgress),
        ]
    );
    assert_eq!(history[2].note.as_deref(), Some("Crew dispatched"));

    let skip = IssueWorkflowService::transition(&mut conn, &officer, issue.id, IssueStatus::Closed, None)
        .unwrap_err();
    assert_eq!(skip.code(), Some(error_codes::ISSUE_INVALID_TRANSITION));
}

#[test]
#[ignore = "requires database"]
fn test_vote_toggles_once_per_user() {
    let mut conn = connect();
    let reporter = seed_user(&mut conn, UserRole::Citizen);
    let neighbour = seed_user(&mut conn, UserRole::Citizen);
    let issue = seed_issue(&mut conn, &reporter, 48);

    let first = VotesService::toggle(&mut conn, &neighbour, issue.id).unwrap();
    assert!(first.voted);
    assert_eq!(first.vote_count, 1);

    let detail = IssuesService::get_detail(&mut conn, &neighbour, issue.id).unwrap();
    assert!(detail.has_voted);

    let second = VotesService::toggle(&mut conn, &neighbour, issue.id).unwrap();
    assert!(!second.voted);
    assert_eq!(second.vote_count, 0);

    VotesService::toggle(&mut conn, &reporter, issue.id).unwrap();
    VotesService::toggle(&mut conn, &neighbour, issue.id).unwrap();
    let stored = IssueRepo::find_by_id(&mut conn, issue.id).unwrap().unwrap();
    assert_eq!(stored.vote_count, 2);
}

#[test]
#[ignore = "requires database"]
fn test_escalation_runs_once_per_interval() {
    let mut conn = connect();
    let reporter = seed_user(&mut conn, UserRole::Citizen);
    let issue = seed_issue(&mut conn, &reporter, 1);
    let interval = Duration::hours(24);
    let overdue_at = Utc::now() + Duration::hours(2);

    IssueWorkflowService::run_escalation_sweep(&mut conn, overdue_at, interval).unwrap();
    let escalated = IssueRepo::find_by_id(&mut conn, issue.id).unwrap().unwrap();
    assert_eq!(escalated.escalation_level, 1);
    assert_eq!(escalated.priority, issue.priority.escalated());

    IssueWorkflowService::run_escalation_sweep(&mut conn, overdue_at + Duration::hours(1), interval)
        .unwrap();
    let unchanged = IssueRepo::find_by_id(&mut conn, issue.id).unwrap().unwrap();
    assert_eq!(unchanged.escalation_level, 1);

    IssueWorkflowService::run_escalation_sweep(&mut conn, overdue_at + Duration::hours(25), interval)
        .unwrap();
    let again = IssueRepo::find_by_id(&mut conn, issue.id).unwrap().unwrap();
    assert_eq!(again.escalation_level, 2);
    assert_eq!(again.priority, issue.priority.escalated().escalated());
}

#[test]
#[ignore = "requires database"]
fn test_draft_submit_is_idempotent_and_survives_issue_deletion() {
    let mut conn = connect();
    let citizen = seed_user(&mut conn, UserRole::Citizen);
    let category = seed_category(&mut conn, 48);
    let draft_id = format!("offline-{}", Uuid::new_v4().simple());
    let payload = json!({
        "title": "Streetlight flickering",
        "description": "Pole 14 on the market road",
        "latitude": 12.95,
        "longitude": 77.61,
        "category_id": category.id,
    });

    DraftsService::upsert(&mut conn, &citizen, &draft_id, payload).unwrap();

    let first = DraftsService::submit(&mut conn, &citizen, &draft_id).unwrap();
    assert!(first.created);
    let second = DraftsService::submit(&mut conn, &citizen, &draft_id).unwrap();
    assert!(!second.created);
    assert_eq!(second.issue.id, first.issue.id);

    IssuesService::delete(&mut conn, &citizen, first.issue.id).unwrap();

    let resubmit = DraftsService::submit(&mut conn, &citizen, &draft_id).unwrap_err();
    assert_eq!(resubmit.code(), Some(error_codes::DRAFT_SUBMITTED));

    let edit = DraftsService::upsert(&mut conn, &citizen, &draft_id, json!({ "title": "edited" }))
        .unwrap_err();
    assert_eq!(edit.code(), Some(error_codes::DRAFT_SUBMITTED));
}

#[test]
#[ignore = "requires database"]
fn test_hidden_comments_visible_to_author_and_staff_only() {
    let mut conn = connect();
    let reporter = seed_user(&mut conn, UserRole::Citizen);
    let author = seed_user(&mut conn, UserRole::Citizen);
    let stranger = seed_user(&mut conn, UserRole::Citizen);
    let officer = seed_user(&mut conn, UserRole::Officer);
    let issue = seed_issue(&mut conn, &reporter, 48);

    let comment = CommentsService::create(&mut conn, &author, issue.id, "Still not fixed").unwrap();
    assert!(matches!(
        CommentsService::set_hidden(&mut conn, &stranger, comment.id, true),
        Err(AppError::Forbidden { .. })
    ));
    CommentsService::set_hidden(&mut conn, &officer, comment.id, true).unwrap();

    let visible_ids = |conn: &mut PgConnection, ctx: &RequestContext| -> Vec<Uuid> {
        CommentsService::list_by_issue(conn, ctx, issue.id)
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect()
    };
    assert!(visible_ids(&mut conn, &stranger).is_empty());
    assert_eq!(visible_ids(&mut conn, &author), vec![comment.id]);
    assert_eq!(visible_ids(&mut conn, &officer), vec![comment.id]);
}

#[test]
#[ignore = "requires database"]
fn test_summary_daily_series_covers_whole_window() {
    let mut conn = connect();
    let reporter = seed_user(&mut conn, UserRole::Citizen);
    let admin = seed_user(&mut conn, UserRole::Admin);
    seed_issue(&mut conn, &reporter, 48);

    let now = Utc::now();
    let summary = AnalyticsService::summary(&mut conn, &admin, 365, now).unwrap();
    assert_eq!(summary.daily.len(), 365);
    assert_eq!(summary.daily.last().unwrap().day, now.date_naive());
    assert!(summary.daily.last().unwrap().created >= 1);
    assert!(summary.daily.windows(2).all(|w| w[0].day < w[1].day));
}
