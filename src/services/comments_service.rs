use diesel::prelude::*;
use serde_json::json;
use uuid::Uuid;

use crate::{
    db::enums::NotificationKind,
    db::models::comment::{Comment, NewComment},
    db::repositories::CommentRepo,
    error::AppError,
    services::audit_service::AuditService,
    services::context::RequestContext,
    services::issues_service::{comment_visibility, find_issue},
    services::notifications_service::{self, NotificationsService},
    validation::comment::validate_comment_body,
};

pub struct CommentsService;

impl CommentsService {
    pub fn list_by_issue(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        issue_id: Uuid,
    ) -> Result<Vec<Comment>, AppError> {
        find_issue(conn, issue_id)?;
        Ok(CommentRepo::list_by_issue(conn, issue_id, comment_visibility(ctx))?)
    }

    pub fn create(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        issue_id: Uuid,
        body: &str,
    ) -> Result<Comment, AppError> {
        let body = validate_comment_body(body)?;

        conn.transaction::<_, AppError, _>(|conn| {
            let issue = find_issue(conn, issue_id)?;

            let comment = CommentRepo::insert(
                conn,
                &NewComment {
                    issue_id: issue.id,
                    author_id: ctx.user_id,
                    body,
                },
            )?;

            NotificationsService::notify(
                conn,
                &[issue.reporter_id],
                Some(ctx.user_id),
                issue.id,
                NotificationKind::CommentAdded,
                notifications_service::comment_added_message(&issue),
            )?;

            tracing::info!(comment_id = %comment.id, issue_id = %issue.id, author = %ctx.user_id, "Comment added");
            Ok(comment)
        })
    }

    pub fn update(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        comment_id: Uuid,
        body: &str,
    ) -> Result<Comment, AppError> {
        let body = validate_comment_body(body)?;

        let comment = find_comment(conn, comment_id)?;
        if comment.author_id != ctx.user_id {
            return Err(AppError::forbidden("You can only edit your own comments"));
        }

        Ok(CommentRepo::update_body(conn, comment_id, body)?)
    }

    pub fn delete(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        comment_id: Uuid,
    ) -> Result<(), AppError> {
        conn.transaction::<_, AppError, _>(|conn| {
            let comment = find_comment(conn, comment_id)?;
            if comment.author_id != ctx.user_id && !ctx.is_admin() {
                return Err(AppError::forbidden("You can only delete your own comments"));
            }

            CommentRepo::delete_by_id(conn, comment_id)?;
            AuditService::record(
                conn,
                Some(ctx.user_id),
                "comment.deleted",
                "comment",
                comment.id,
                json!({ "issue_id": comment.issue_id, "author_id": comment.author_id }),
            )?;
            Ok(())
        })
    }

    /// Moderation toggle for officers and admins.
    pub fn set_hidden(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        comment_id: Uuid,
        hidden: bool,
    ) -> Result<Comment, AppError> {
        ctx.require_staff()?;

        conn.transaction::<_, AppError, _>(|conn| {
            let comment = find_comment(conn, comment_id)?;
            if comment.is_hidden == hidden {
                return Ok(comment);
            }

            let updated = CommentRepo::set_hidden(conn, comment_id, hidden, ctx.user_id)?;
            let action = if hidden { "comment.hidden" } else { "comment.unhidden" };
            AuditService::record(
                conn,
                Some(ctx.user_id),
                action,
                "comment",
                updated.id,
                json!({ "issue_id": updated.issue_id }),
            )?;

            tracing::info!(comment_id = %updated.id, moderator = %ctx.user_id, hidden, "Comment visibility changed");
            Ok(updated)
        })
    }
}

fn find_comment(conn: &mut PgConnection, comment_id: Uuid) -> Result<Comment, AppError> {
    CommentRepo::find_by_id(conn, comment_id)?.ok_or_else(|| AppError::not_found("comment"))
}
