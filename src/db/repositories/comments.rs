use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::models::comment::{Comment, NewComment};

/// Which hidden comments a reader may see.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HiddenVisibility {
    All,
    OwnOnly(Uuid),
}

pub struct CommentRepo;

impl CommentRepo {
    pub fn find_by_id(
        conn: &mut PgConnection,
        comment_id: Uuid,
    ) -> Result<Option<Comment>, diesel::result::Error> {
        use crate::schema::comments::dsl as c;
        c::comments
            .filter(c::id.eq(comment_id))
            .select(Comment::as_select())
            .first(conn)
            .optional()
    }

    pub fn list_by_issue(
        conn: &mut PgConnection,
        target_issue_id: Uuid,
        visibility: HiddenVisibility,
    ) -> Result<Vec<Comment>, diesel::result::Error> {
        use crate::schema::comments::dsl as c;
        let mut query = c::comments
            .filter(c::issue_id.eq(target_issue_id))
            .into_boxed();

        if let HiddenVisibility::OwnOnly(viewer) = visibility {
            query = query.filter(c::is_hidden.eq(false).or(c::author_id.eq(viewer)));
        }

        query
            .order((c::created_at.asc(), c::id.asc()))
            .select(Comment::as_select())
            .load(conn)
    }

    pub fn count_visible(
        conn: &mut PgConnection,
        target_issue_id: Uuid,
        visibility: HiddenVisibility,
    ) -> Result<i64, diesel::result::Error> {
        use crate::schema::comments::dsl as c;
        let mut query = c::comments
            .filter(c::issue_id.eq(target_issue_id))
            .into_boxed();

        if let HiddenVisibility::OwnOnly(viewer) = visibility {
            query = query.filter(c::is_hidden.eq(false).or(c::author_id.eq(viewer)));
        }

        query.count().get_result(conn)
    }

    pub fn insert(
        conn: &mut PgConnection,
        new_comment: &NewComment,
    ) -> Result<Comment, diesel::result::Error> {
        diesel::insert_into(crate::schema::comments::table)
            .values(new_comment)
            .returning(Comment::as_returning())
            .get_result(conn)
    }

    pub fn update_body(
        conn: &mut PgConnection,
        comment_id: Uuid,
        new_body: String,
    ) -> Result<Comment, diesel::result::Error> {
        use crate::schema::comments::dsl as c;
        diesel::update(c::comments.filter(c::id.eq(comment_id)))
            .set((c::body.eq(new_body), c::updated_at.eq(Utc::now())))
            .returning(Comment::as_returning())
            .get_result(conn)
    }

    pub fn set_hidden(
        conn: &mut PgConnection,
        comment_id: Uuid,
        hidden: bool,
        moderator: Uuid,
    ) -> Result<Comment, diesel::result::Error> {
        use crate::schema::comments::dsl as c;
        let hidden_by_value = if hidden { Some(moderator) } else { None };
        diesel::update(c::comments.filter(c::id.eq(comment_id)))
            .set((
                c::is_hidden.eq(hidden),
                c::hidden_by.eq(hidden_by_value),
                c::updated_at.eq(Utc::now()),
            ))
            .returning(Comment::as_returning())
            .get_result(conn)
    }

    pub fn delete_by_id(
        conn: &mut PgConnection,
        comment_id: Uuid,
    ) -> Result<usize, diesel::result::Error> {
        use crate::schema::comments::dsl as c;
        diesel::delete(c::comments.filter(c::id.eq(comment_id))).execute(conn)
    }
}
