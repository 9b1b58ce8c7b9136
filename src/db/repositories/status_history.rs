use diesel::prelude::*;
use uuid::Uuid;

use crate::db::models::status_history::{NewStatusHistory, StatusHistory};

pub struct StatusHistoryRepo;

impl StatusHistoryRepo {
    pub fn append(
        conn: &mut PgConnection,
        entry: &NewStatusHistory,
    ) -> Result<StatusHistory, diesel::result::Error> {
        diesel::insert_into(crate::schema::status_history::table)
            .values(entry)
            .returning(StatusHistory::as_returning())
            .get_result(conn)
    }

    pub fn list_by_issue(
        conn: &mut PgConnection,
        target_issue_id: Uuid,
    ) -> Result<Vec<StatusHistory>, diesel::result::Error> {
        use crate::schema::status_history::dsl as h;
        h::status_history
            .filter(h::issue_id.eq(target_issue_id))
            .order((h::created_at.asc(), h::id.asc()))
            .select(StatusHistory::as_select())
            .load(conn)
    }
}
