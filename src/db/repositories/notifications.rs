use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::models::api::PageRequest;
use crate::db::models::notification::{NewNotification, Notification};

pub struct NotificationRepo;

impl NotificationRepo {
    pub fn insert_many(
        conn: &mut PgConnection,
        batch: &[NewNotification],
    ) -> Result<usize, diesel::result::Error> {
        if batch.is_empty() {
            return Ok(0);
        }
        diesel::insert_into(crate::schema::notifications::table)
            .values(batch)
            .execute(conn)
    }

    pub fn list_for_user(
        conn: &mut PgConnection,
        target_user_id: Uuid,
        unread_only: bool,
        page: &PageRequest,
    ) -> Result<(Vec<Notification>, i64), diesel::result::Error> {
        use crate::schema::notifications::dsl as n;

        let base = || {
            let mut query = n::notifications
                .filter(n::user_id.eq(target_user_id))
                .into_boxed::<diesel::pg::Pg>();
            if unread_only {
                query = query.filter(n::is_read.eq(false));
            }
            query
        };

        let total: i64 = base().count().get_result(conn)?;
        let rows = base()
            .order((n::created_at.desc(), n::id.asc()))
            .limit(page.per_page)
            .offset(page.offset())
            .select(Notification::as_select())
            .load(conn)?;
        Ok((rows, total))
    }

    pub fn unread_count(
        conn: &mut PgConnection,
        target_user_id: Uuid,
    ) -> Result<i64, diesel::result::Error> {
        use crate::schema::notifications::dsl as n;
        n::notifications
            .filter(n::user_id.eq(target_user_id))
            .filter(n::is_read.eq(false))
            .count()
            .get_result(conn)
    }

    /// Marks one notification read; `None` if it does not belong to the user.
    pub fn mark_read(
        conn: &mut PgConnection,
        notification_id: Uuid,
        target_user_id: Uuid,
    ) -> Result<Option<Notification>, diesel::result::Error> {
        use crate::schema::notifications::dsl as n;
        let existing = n::notifications
            .filter(n::id.eq(notification_id))
            .filter(n::user_id.eq(target_user_id))
            .select(Notification::as_select())
            .first(conn)
            .optional()?;

        match existing {
            Some(notification) if notification.is_read => Ok(Some(notification)),
            Some(_) => diesel::update(n::notifications.filter(n::id.eq(notification_id)))
                .set((n::is_read.eq(true), n::read_at.eq(Some(Utc::now()))))
                .returning(Notification::as_returning())
                .get_result(conn)
                .map(Some),
            None => Ok(None),
        }
    }

    pub fn mark_all_read(
        conn: &mut PgConnection,
        target_user_id: Uuid,
    ) -> Result<usize, diesel::result::Error> {
        use crate::schema::notifications::dsl as n;
        diesel::update(
            n::notifications
                .filter(n::user_id.eq(target_user_id))
                .filter(n::is_read.eq(false)),
        )
        .set((n::is_read.eq(true), n::read_at.eq(Some(Utc::now()))))
        .execute(conn)
    }
}
