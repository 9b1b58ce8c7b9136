use chrono::{DateTime, Utc};
use serde::Serialize;
use std::str::FromStr;
use uuid::Uuid;

use crate::{
    db::enums::{IssuePriority, IssueStatus},
    db::models::api::error_codes,
    db::models::issue::Issue,
    error::AppError,
};

pub const CSV_HEADER: [&str; 15] = [
    "id",
    "title",
    "category",
    "status",
    "priority",
    "latitude",
    "longitude",
    "address",
    "vote_count",
    "reporter_id",
    "assignee_id",
    "created_at",
    "resolved_at",
    "sla_due_at",
    "escalation_level",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(AppError::validation_with_code(
                format!("Unsupported export format '{}', use csv or json", other),
                error_codes::EXPORT_UNSUPPORTED_FORMAT,
            )),
        }
    }
}

/// Flat issue record shared by the CSV and JSON exports. Field order matches `CSV_HEADER`.
#[derive(Serialize, Debug, Clone)]
pub struct ExportRow {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub status: IssueStatus,
    pub priority: IssuePriority,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub vote_count: i32,
    pub reporter_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub sla_due_at: Option<DateTime<Utc>>,
    pub escalation_level: i32,
}

impl ExportRow {
    pub fn new(issue: Issue, category: String) -> Self {
        Self {
            id: issue.id,
            title: issue.title,
            category,
            status: issue.status,
            priority: issue.priority,
            latitude: issue.latitude,
            longitude: issue.longitude,
            address: issue.address,
            vote_count: issue.vote_count,
            reporter_id: issue.reporter_id,
            assignee_id: issue.assignee_id,
            created_at: issue.created_at,
            resolved_at: issue.resolved_at,
            sla_due_at: issue.sla_due_at,
            escalation_level: issue.escalation_level,
        }
    }
}

/// Header line is always written, even with no rows.
pub fn write_csv(rows: &[ExportRow]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER).map_err(csv_error)?;
    for row in rows {
        writer.serialize(row).map_err(csv_error)?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::internal(format!("Failed to flush CSV export: {}", e)))
}

fn csv_error(e: csv::Error) -> AppError {
    AppError::internal(format!("Failed to write CSV export: {}", e))
}

pub fn export_filename(format: ExportFormat, now: DateTime<Utc>) -> String {
    let ext = match format {
        ExportFormat::Csv => "csv",
        ExportFormat::Json => "json",
    };
    format!("issues-{}.{}", now.format("%Y%m%d-%H%M%S"), ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> ExportRow {
        let created = DateTime::parse_from_rfc3339("2025-02-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        ExportRow {
            id: Uuid::nil(),
            title: "Pothole, deep".to_string(),
            category: "Roads".to_string(),
            status: IssueStatus::InProgress,
            priority: IssuePriority::High,
            latitude: 12.5,
            longitude: 77.25,
            address: None,
            vote_count: 3,
            reporter_id: Uuid::nil(),
            assignee_id: None,
            created_at: created,
            resolved_at: None,
            sla_due_at: None,
            escalation_level: 1,
        }
    }

    #[test]
    fn empty_export_still_has_header() {
        let bytes = write_csv(&[]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.trim_end(), CSV_HEADER.join(","));
    }

    #[test]
    fn rows_are_quoted_and_enums_lowercase() {
        let text = String::from_utf8(write_csv(&[row()]).unwrap()).unwrap();
        let line = text.lines().nth(1).unwrap();
        assert!(line.contains("\"Pothole, deep\""));
        assert!(line.contains(",in_progress,high,"));
        assert!(line.ends_with(",1"));
    }

    #[test]
    fn format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        let err = "xlsx".parse::<ExportFormat>().unwrap_err();
        assert_eq!(err.code(), Some(error_codes::EXPORT_UNSUPPORTED_FORMAT));
    }
}
