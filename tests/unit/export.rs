// CSV export shaping

use chrono::Utc;
use grievance_backend::db::enums::{IssuePriority, IssueStatus};
use grievance_backend::db::models::issue::Issue;
use grievance_backend::services::export_service::{CSV_HEADER, ExportRow, write_csv};
use uuid::Uuid;

fn issue(title: &str) -> Issue {
    let now = Utc::now();
    Issue {
        id: Uuid::new_v4(),
        reporter_id: Uuid::new_v4(),
        category_id: Uuid::new_v4(),
        assignee_id: Some(Uuid::new_v4()),
        title: title.to_string(),
        description: "desc".to_string(),
        latitude: 19.07,
        longitude: 72.87,
        address: Some("Line \"A\"".to_string()),
        photo_urls: vec![],
        status: IssueStatus::Resolved,
        priority: IssuePriority::Urgent,
        vote_count: 12,
        sla_due_at: Some(now),
        escalation_level: 2,
        escalated_at: None,
        resolved_at: Some(now),
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn csv_has_header_and_one_line_per_issue() {
    let rows = vec![
        ExportRow::new(issue("Leaking pipe"), "Water".to_string()),
        ExportRow::new(issue("Open manhole"), "Roads".to_string()),
    ];
    let text = String::from_utf8(write_csv(&rows).unwrap()).unwrap();

    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .unwrap()
        .iter()
        .map(str::to_string)
        .collect();
    assert_eq!(headers, CSV_HEADER.to_vec());

    let records: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(records.len(), 2);
    assert_eq!(&records[0][1], "Leaking pipe");
    assert_eq!(&records[0][2], "Water");
    assert_eq!(&records[0][3], "resolved");
    assert_eq!(&records[0][4], "urgent");
    assert_eq!(&records[0][7], "Line \"A\"");
    assert_eq!(&records[1][8], "12");
    assert_eq!(&records[1][14], "2");
}
