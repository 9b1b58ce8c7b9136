use diesel::prelude::*;
use serde_json::Value as JsonValue;

use crate::{
    db::models::api::error_codes,
    db::models::issue::Issue,
    db::models::offline_draft::{DraftState, DraftSyncResult, NewOfflineDraft, OfflineDraft},
    db::repositories::{DraftRepo, IssueRepo},
    error::AppError,
    routes::issues::CreateIssueRequest,
    services::context::RequestContext,
    services::issues_service::IssuesService,
    validation::draft::{content_hash, validate_client_draft_id},
    validation::validate_dto,
};

/// Result of submitting a draft. `created` is false on a repeated submit.
#[derive(Debug)]
pub struct DraftSubmission {
    pub issue: Issue,
    pub created: bool,
}

pub struct DraftsService;

impl DraftsService {
    pub fn upsert(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        client_draft_id: &str,
        payload: JsonValue,
    ) -> Result<DraftSyncResult, AppError> {
        validate_client_draft_id(client_draft_id)?;
        let hash = content_hash(&payload)?;

        conn.transaction::<_, AppError, _>(|conn| {
            let Some(existing) = DraftRepo::find_for_update(conn, ctx.user_id, client_draft_id)?
            else {
                let draft = DraftRepo::insert(
                    conn,
                    &NewOfflineDraft {
                        user_id: ctx.user_id,
                        client_draft_id: client_draft_id.to_string(),
                        payload,
                        content_hash: hash,
                    },
                )?;
                return Ok(DraftSyncResult {
                    draft,
                    changed: true,
                });
            };

            ensure_not_submitted(&existing)?;

            if existing.content_hash == hash {
                return Ok(DraftSyncResult {
                    draft: existing,
                    changed: false,
                });
            }

            let draft = DraftRepo::update_payload(conn, existing.id, payload, hash)?;
            Ok(DraftSyncResult {
                draft,
                changed: true,
            })
        })
    }

    pub fn list(
        conn: &mut PgConnection,
        ctx: &RequestContext,
    ) -> Result<Vec<OfflineDraft>, AppError> {
        Ok(DraftRepo::list_by_user(conn, ctx.user_id)?)
    }

    pub fn delete(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        client_draft_id: &str,
    ) -> Result<(), AppError> {
        if DraftRepo::delete(conn, ctx.user_id, client_draft_id)? == 0 {
            return Err(AppError::not_found("draft"));
        }
        Ok(())
    }

    /// Turns the draft into an issue once; later calls return the same issue.
    pub fn submit(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        client_draft_id: &str,
    ) -> Result<DraftSubmission, AppError> {
        conn.transaction::<_, AppError, _>(|conn| {
            let draft = DraftRepo::find_for_update(conn, ctx.user_id, client_draft_id)?
                .ok_or_else(|| AppError::not_found("draft"))?;

            match draft.state() {
                DraftState::Open => {}
                DraftState::Submitted(issue_id) => {
                    let issue = IssueRepo::find_by_id(conn, issue_id)?
                        .ok_or_else(orphaned_draft)?;
                    return Ok(DraftSubmission {
                        issue,
                        created: false,
                    });
                }
                DraftState::Orphaned => return Err(orphaned_draft()),
            }

            let request = parse_payload(&draft.payload)?;
            let issue = IssuesService::create(conn, ctx, &request)?;
            DraftRepo::mark_submitted(conn, draft.id, issue.id)?;

            tracing::info!(
                draft_id = %draft.id,
                issue_id = %issue.id,
                user_id = %ctx.user_id,
                "Offline draft submitted"
            );
            Ok(DraftSubmission {
                issue,
                created: true,
            })
        })
    }
}

fn ensure_not_submitted(draft: &OfflineDraft) -> Result<(), AppError> {
    if draft.state() != DraftState::Open {
        return Err(AppError::conflict_with_code(
            "Draft has already been submitted",
            None,
            error_codes::DRAFT_SUBMITTED,
        ));
    }
    Ok(())
}

fn orphaned_draft() -> AppError {
    AppError::conflict_with_code(
        "Draft was already submitted and its issue has been removed",
        None,
        error_codes::DRAFT_SUBMITTED,
    )
}

/// Reads a stored payload as an issue submission, applying the same rules as `POST /issues`.
pub fn parse_payload(payload: &JsonValue) -> Result<CreateIssueRequest, AppError> {
    let request: CreateIssueRequest =
        serde_json::from_value(payload.clone()).map_err(|e| {
            AppError::validation_with_code(
                format!("Draft payload is not a valid issue: {}", e),
                error_codes::DRAFT_INVALID_PAYLOAD,
            )
        })?;
    validate_dto(&request)?;
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn draft(submitted_issue_id: Option<Uuid>, submitted: bool) -> OfflineDraft {
        let now = Utc::now();
        OfflineDraft {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            client_draft_id: "d1".to_string(),
            payload: json!({}),
            content_hash: String::new(),
            submitted_issue_id,
            submitted_at: submitted.then_some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn deleted_issue_keeps_draft_submitted() {
        // ON DELETE SET NULL clears the issue id but not the submission time.
        let orphan = draft(None, true);
        assert_eq!(orphan.state(), DraftState::Orphaned);
        let err = ensure_not_submitted(&orphan).unwrap_err();
        assert_eq!(err.code(), Some(error_codes::DRAFT_SUBMITTED));
    }

    #[test]
    fn draft_states() {
        let issue_id = Uuid::new_v4();
        assert_eq!(draft(None, false).state(), DraftState::Open);
        assert_eq!(draft(Some(issue_id), true).state(), DraftState::Submitted(issue_id));
        assert!(ensure_not_submitted(&draft(None, false)).is_ok());
        assert!(ensure_not_submitted(&draft(Some(issue_id), true)).is_err());
    }

    #[test]
    fn payload_must_describe_an_issue() {
        let err = parse_payload(&json!({ "title": "only a title" })).unwrap_err();
        assert_eq!(err.code(), Some(error_codes::DRAFT_INVALID_PAYLOAD));
    }

    #[test]
    fn payload_is_validated_like_a_request() {
        let payload = json!({
            "title": "Overflowing drain",
            "description": "Water on the road",
            "latitude": 123.0,
            "longitude": 77.6,
            "category_id": uuid::Uuid::new_v4(),
        });
        assert!(matches!(
            parse_payload(&payload),
            Err(AppError::InvalidFields(_))
        ));
    }

    #[test]
    fn valid_payload_parses() {
        let payload = json!({
            "title": "Overflowing drain",
            "description": "Water on the road",
            "latitude": 12.9,
            "longitude": 77.6,
            "photo_urls": ["https://cdn.example.com/drain.jpg"],
            "category_id": uuid::Uuid::new_v4(),
        });
        let request = parse_payload(&payload).unwrap();
        assert_eq!(request.photo_urls.len(), 1);
        assert!(request.address.is_none());
    }
}
