use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use crate::{
    db::models::api::error_codes,
    db::models::vote::{NewVote, VoteResult},
    db::repositories::{IssueRepo, VoteRepo},
    error::AppError,
    services::context::RequestContext,
};

pub struct VotesService;

impl VotesService {
    /// Adds the caller's vote, or removes it when one already exists.
    pub fn toggle(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        issue_id: Uuid,
    ) -> Result<VoteResult, AppError> {
        let result = conn.transaction::<_, AppError, _>(|conn| {
            let issue = IssueRepo::find_for_update(conn, issue_id)?
                .ok_or_else(|| AppError::not_found("issue"))?;

            if VoteRepo::exists(conn, issue.id, ctx.user_id)? {
                VoteRepo::delete(conn, issue.id, ctx.user_id)?;
                let vote_count = IssueRepo::decrement_votes(conn, issue.id)?;
                return Ok(VoteResult {
                    voted: false,
                    vote_count,
                });
            }

            if !issue.status.accepts_votes() {
                return Err(AppError::validation_with_code(
                    format!("Voting is closed for {} issues", issue.status),
                    error_codes::ISSUE_VOTING_CLOSED,
                ));
            }

            VoteRepo::insert(
                conn,
                &NewVote {
                    issue_id: issue.id,
                    user_id: ctx.user_id,
                },
            )?;
            let vote_count = IssueRepo::increment_votes(conn, issue.id)?;
            Ok(VoteResult {
                voted: true,
                vote_count,
            })
        });

        match result {
            Err(AppError::Database(DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                _,
            ))) => Err(AppError::conflict_with_code(
                "Vote was recorded by a concurrent request",
                None,
                error_codes::VOTE_CONFLICT,
            )),
            other => {
                if let Ok(vote) = &other {
                    tracing::debug!(
                        issue_id = %issue_id,
                        user_id = %ctx.user_id,
                        voted = vote.voted,
                        vote_count = vote.vote_count,
                        "Vote toggled"
                    );
                }
                other
            }
        }
    }
}
