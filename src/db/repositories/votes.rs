use diesel::prelude::*;
use uuid::Uuid;

use crate::db::models::vote::NewVote;

pub struct VoteRepo;

impl VoteRepo {
    pub fn exists(
        conn: &mut PgConnection,
        target_issue_id: Uuid,
        target_user_id: Uuid,
    ) -> Result<bool, diesel::result::Error> {
        use crate::schema::votes::dsl as v;
        diesel::select(diesel::dsl::exists(
            v::votes
                .filter(v::issue_id.eq(target_issue_id))
                .filter(v::user_id.eq(target_user_id)),
        ))
        .get_result(conn)
    }

    pub fn insert(conn: &mut PgConnection, new_vote: &NewVote) -> Result<usize, diesel::result::Error> {
        diesel::insert_into(crate::schema::votes::table)
            .values(new_vote)
            .execute(conn)
    }

    pub fn delete(
        conn: &mut PgConnection,
        target_issue_id: Uuid,
        target_user_id: Uuid,
    ) -> Result<usize, diesel::result::Error> {
        use crate::schema::votes::dsl as v;
        diesel::delete(
            v::votes
                .filter(v::issue_id.eq(target_issue_id))
                .filter(v::user_id.eq(target_user_id)),
        )
        .execute(conn)
    }
}
