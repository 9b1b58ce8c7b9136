use chrono::Utc;
use diesel::prelude::*;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::db::models::offline_draft::{NewOfflineDraft, OfflineDraft};

pub struct DraftRepo;

impl DraftRepo {
    pub fn find_for_update(
        conn: &mut PgConnection,
        owner_id: Uuid,
        client_id: &str,
    ) -> Result<Option<OfflineDraft>, diesel::result::Error> {
        use crate::schema::offline_drafts::dsl as d;
        d::offline_drafts
            .filter(d::user_id.eq(owner_id))
            .filter(d::client_draft_id.eq(client_id))
            .select(OfflineDraft::as_select())
            .for_update()
            .first(conn)
            .optional()
    }

    pub fn list_by_user(
        conn: &mut PgConnection,
        owner_id: Uuid,
    ) -> Result<Vec<OfflineDraft>, diesel::result::Error> {
        use crate::schema::offline_drafts::dsl as d;
        d::offline_drafts
            .filter(d::user_id.eq(owner_id))
            .order(d::updated_at.desc())
            .select(OfflineDraft::as_select())
            .load(conn)
    }

    pub fn insert(
        conn: &mut PgConnection,
        new_draft: &NewOfflineDraft,
    ) -> Result<OfflineDraft, diesel::result::Error> {
        diesel::insert_into(crate::schema::offline_drafts::table)
            .values(new_draft)
            .returning(OfflineDraft::as_returning())
            .get_result(conn)
    }

    pub fn update_payload(
        conn: &mut PgConnection,
        draft_id: Uuid,
        new_payload: JsonValue,
        new_hash: String,
    ) -> Result<OfflineDraft, diesel::result::Error> {
        use crate::schema::offline_drafts::dsl as d;
        diesel::update(d::offline_drafts.filter(d::id.eq(draft_id)))
            .set((
                d::payload.eq(new_payload),
                d::content_hash.eq(new_hash),
                d::updated_at.eq(Utc::now()),
            ))
            .returning(OfflineDraft::as_returning())
            .get_result(conn)
    }

    pub fn mark_submitted(
        conn: &mut PgConnection,
        draft_id: Uuid,
        issue_id: Uuid,
    ) -> Result<OfflineDraft, diesel::result::Error> {
        use crate::schema::offline_drafts::dsl as d;
        let now = Utc::now();
        diesel::update(d::offline_drafts.filter(d::id.eq(draft_id)))
            .set((
                d::submitted_issue_id.eq(Some(issue_id)),
                d::submitted_at.eq(Some(now)),
                d::updated_at.eq(now),
            ))
            .returning(OfflineDraft::as_returning())
            .get_result(conn)
    }

    pub fn delete(
        conn: &mut PgConnection,
        owner_id: Uuid,
        client_id: &str,
    ) -> Result<usize, diesel::result::Error> {
        use crate::schema::offline_drafts::dsl as d;
        diesel::delete(
            d::offline_drafts
                .filter(d::user_id.eq(owner_id))
                .filter(d::client_draft_id.eq(client_id)),
        )
        .execute(conn)
    }
}
