// Offline draft hashing and payload parsing

use grievance_backend::services::drafts_service::parse_payload;
use grievance_backend::validation::draft::{content_hash, validate_client_draft_id};
use serde_json::json;

#[test]
fn identical_payloads_hash_identically() {
    let a = json!({"title": "Stray dogs", "photo_urls": [], "nested": {"b": 1, "a": 2}});
    let b = json!({"nested": {"a": 2, "b": 1}, "photo_urls": [], "title": "Stray dogs"});
    assert_eq!(content_hash(&a).unwrap(), content_hash(&b).unwrap());
}

#[test]
fn draft_ids_are_restricted() {
    assert!(validate_client_draft_id("3f2a-offline_1").is_ok());
    assert!(validate_client_draft_id("../etc").is_err());
}

#[test]
fn submitted_payload_must_be_a_valid_issue() {
    assert!(parse_payload(&json!({"title": "x"})).is_err());

    let ok = json!({
        "title": "Broken bench",
        "description": "Park bench split in half",
        "latitude": 13.0,
        "longitude": 80.2,
        "category_id": uuid::Uuid::new_v4(),
    });
    assert_eq!(parse_payload(&ok).unwrap().title, "Broken bench");
}
