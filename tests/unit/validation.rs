// Input validation for issues, comments and categories

use grievance_backend::error::AppError;
use grievance_backend::routes::issues::CreateIssueRequest;
use grievance_backend::routes::categories::{CreateCategoryRequest, UpdateCategoryRequest};
use grievance_backend::validation::category::validate_category_name;
use grievance_backend::validation::comment::validate_comment_body;
use grievance_backend::validation::issue::validate_bbox;
use grievance_backend::validation::validate_dto;
use uuid::Uuid;

fn request() -> CreateIssueRequest {
    CreateIssueRequest {
        title: "Garbage not collected".to_string(),
        description: "Bins overflowing for three days".to_string(),
        latitude: 28.61,
        longitude: 77.21,
        address: Some("Connaught Place".to_string()),
        photo_urls: vec!["https://img.example.org/bins.jpg".to_string()],
        category_id: Uuid::new_v4(),
    }
}

#[test]
fn create_issue_request_validation() {
    assert!(validate_dto(&request()).is_ok());

    let mut too_many = request();
    too_many.photo_urls = (0..6)
        .map(|i| format!("https://img.example.org/{}.jpg", i))
        .collect();
    match validate_dto(&too_many) {
        Err(AppError::InvalidFields(details)) => {
            assert_eq!(details.len(), 1);
            assert_eq!(details[0].field.as_deref(), Some("photo_urls"));
        }
        other => panic!("expected field errors, got {:?}", other.map(|_| ())),
    }

    let mut bad = request();
    bad.latitude = 91.0;
    bad.description = String::new();
    match validate_dto(&bad) {
        Err(AppError::InvalidFields(details)) => {
            let fields: Vec<_> = details.iter().filter_map(|d| d.field.as_deref()).collect();
            assert!(fields.contains(&"latitude"));
            assert!(fields.contains(&"description"));
        }
        other => panic!("expected field errors, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn comment_and_category_rules() {
    assert!(validate_comment_body("Thanks for the quick fix").is_ok());
    assert!(validate_comment_body("\n\t").is_err());

    assert!(validate_category_name("Water supply").is_ok());
    assert!(validate_category_name("").is_err());
}

#[test]
fn category_requests_validate_name_and_sla() {
    let create = CreateCategoryRequest {
        name: "Water supply".to_string(),
        description: None,
        sla_hours: 72,
        default_assignee_id: None,
    };
    assert!(validate_dto(&create).is_ok());

    let bad = CreateCategoryRequest {
        name: "   ".to_string(),
        sla_hours: 0,
        ..create
    };
    match validate_dto(&bad) {
        Err(AppError::InvalidFields(details)) => {
            let fields: Vec<_> = details.iter().filter_map(|d| d.field.as_deref()).collect();
            assert_eq!(fields, vec!["name", "sla_hours"]);
        }
        other => panic!("expected field errors, got {:?}", other.map(|_| ())),
    }

    let update = UpdateCategoryRequest {
        name: None,
        description: None,
        sla_hours: Some(9000),
        default_assignee_id: None,
        clear_default_assignee: false,
        is_active: None,
    };
    assert!(matches!(validate_dto(&update), Err(AppError::InvalidFields(_))));
}

#[test]
fn bbox_requires_all_bounds() {
    assert!(validate_bbox(None, None, None, None).unwrap().is_none());
    assert!(validate_bbox(Some(10.0), Some(20.0), Some(70.0), None).is_err());
    let bbox = validate_bbox(Some(10.0), Some(20.0), Some(70.0), Some(80.0))
        .unwrap()
        .unwrap();
    assert_eq!(bbox.max_lng, 80.0);
}
