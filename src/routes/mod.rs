pub mod admin;
pub mod analytics;
pub mod categories;
pub mod comments;
pub mod drafts;
pub mod health;
pub mod issues;
pub mod notifications;
pub mod users;

use crate::AppState;
use crate::middleware::auth::auth_middleware;
use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use std::sync::Arc;

pub fn create_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/me", get(users::get_me))
        .route("/officers", get(users::list_officers))
        .route("/admin/users/:user_id/role", put(users::update_user_role))
        .route("/admin/audit-logs", get(admin::list_audit_logs))
        .route("/admin/escalations/run", post(admin::run_escalations))
        .route(
            "/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route("/categories/:category_id", put(categories::update_category))
        .route(
            "/issues",
            get(issues::list_issues).post(issues::create_issue),
        )
        .route("/issues/board", get(issues::get_board))
        .route("/issues/export", get(issues::export_issues))
        .route(
            "/issues/:issue_id",
            get(issues::get_issue)
                .put(issues::update_issue)
                .delete(issues::delete_issue),
        )
        .route("/issues/:issue_id/status", post(issues::change_status))
        .route("/issues/:issue_id/assign", post(issues::assign_issue))
        .route("/issues/:issue_id/vote", post(issues::toggle_vote))
        .route("/issues/:issue_id/history", get(issues::get_history))
        .route(
            "/issues/:issue_id/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/comments/:comment_id",
            put(comments::update_comment).delete(comments::delete_comment),
        )
        .route("/comments/:comment_id/hide", post(comments::hide_comment))
        .route("/comments/:comment_id/unhide", post(comments::unhide_comment))
        .route("/notifications", get(notifications::list_notifications))
        .route(
            "/notifications/unread-count",
            get(notifications::unread_count),
        )
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route(
            "/notifications/:notification_id/read",
            post(notifications::mark_read),
        )
        .route("/analytics/summary", get(analytics::summary))
        .route("/analytics/heatmap", get(analytics::heatmap))
        .route("/analytics/officers", get(analytics::officers))
        .route("/drafts", get(drafts::list_drafts))
        .route(
            "/drafts/:client_draft_id",
            put(drafts::upsert_draft).delete(drafts::delete_draft),
        )
        .route("/drafts/:client_draft_id/submit", post(drafts::submit_draft))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health::health))
        .merge(protected)
        .with_state(state)
}
