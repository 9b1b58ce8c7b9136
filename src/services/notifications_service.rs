use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    db::enums::{IssueStatus, NotificationKind},
    db::models::api::PageRequest,
    db::models::issue::Issue,
    db::models::notification::{NewNotification, Notification},
    db::repositories::NotificationRepo,
    error::AppError,
    services::context::RequestContext,
};

pub struct NotificationsService;

impl NotificationsService {
    /// Queues one notification per recipient, skipping the actor and duplicates.
    pub fn notify(
        conn: &mut PgConnection,
        recipients: &[Uuid],
        actor_id: Option<Uuid>,
        issue_id: Uuid,
        kind: NotificationKind,
        message: String,
    ) -> Result<usize, AppError> {
        let batch = build_batch(recipients, actor_id, issue_id, kind, &message);
        Ok(NotificationRepo::insert_many(conn, &batch)?)
    }

    pub fn list(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        unread_only: bool,
        page: &PageRequest,
    ) -> Result<(Vec<Notification>, i64), AppError> {
        Ok(NotificationRepo::list_for_user(conn, ctx.user_id, unread_only, page)?)
    }

    pub fn unread_count(conn: &mut PgConnection, ctx: &RequestContext) -> Result<i64, AppError> {
        Ok(NotificationRepo::unread_count(conn, ctx.user_id)?)
    }

    pub fn mark_read(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        notification_id: Uuid,
    ) -> Result<Notification, AppError> {
        NotificationRepo::mark_read(conn, notification_id, ctx.user_id)?
            .ok_or_else(|| AppError::not_found("notification"))
    }

    pub fn mark_all_read(conn: &mut PgConnection, ctx: &RequestContext) -> Result<usize, AppError> {
        Ok(NotificationRepo::mark_all_read(conn, ctx.user_id)?)
    }
}

pub fn build_batch(
    recipients: &[Uuid],
    actor_id: Option<Uuid>,
    issue_id: Uuid,
    kind: NotificationKind,
    message: &str,
) -> Vec<NewNotification> {
    let mut seen = Vec::with_capacity(recipients.len());
    for recipient in recipients {
        if Some(*recipient) == actor_id || seen.contains(recipient) {
            continue;
        }
        seen.push(*recipient);
    }

    seen.into_iter()
        .map(|user_id| NewNotification {
            user_id,
            issue_id: Some(issue_id),
            kind,
            message: message.to_string(),
        })
        .collect()
}

pub fn status_changed_message(issue: &Issue, to: IssueStatus) -> String {
    format!("Your report \"{}\" is now {}", issue.title, to.as_str().replace('_', " "))
}

pub fn comment_added_message(issue: &Issue) -> String {
    format!("New comment on your report \"{}\"", issue.title)
}

pub fn assigned_message(issue: &Issue) -> String {
    format!("You have been assigned \"{}\"", issue.title)
}

pub fn escalated_message(issue: &Issue, level: i32) -> String {
    format!(
        "\"{}\" is past its SLA and has been escalated to level {}",
        issue.title, level
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_skips_actor_and_duplicates() {
        let actor = Uuid::new_v4();
        let other = Uuid::new_v4();
        let issue = Uuid::new_v4();
        let batch = build_batch(
            &[actor, other, other],
            Some(actor),
            issue,
            NotificationKind::SlaEscalated,
            "late",
        );
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].user_id, other);
        assert_eq!(batch[0].issue_id, Some(issue));
    }

    #[test]
    fn batch_without_actor_keeps_everyone() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let batch = build_batch(&[a, b], None, Uuid::new_v4(), NotificationKind::SlaEscalated, "x");
        assert_eq!(batch.len(), 2);
    }
}
