use chrono::{DateTime, Duration, NaiveDate, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::sql_types::{Array, BigInt, Date, Double, Nullable, Text, Timestamptz, Uuid as SqlUuid};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    db::enums::{IssuePriority, IssueStatus},
    db::repositories::IssueRepo,
    db::repositories::issues::IssueFilters,
    error::AppError,
    services::context::RequestContext,
};

pub const DEFAULT_WINDOW_DAYS: i64 = 30;
pub const MAX_WINDOW_DAYS: i64 = 365;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StatusCount {
    pub status: IssueStatus,
    pub count: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PriorityCount {
    pub priority: IssuePriority,
    pub count: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CategoryCount {
    pub category_id: Uuid,
    pub name: String,
    pub count: i64,
}

#[derive(QueryableByName, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DailyCount {
    #[diesel(sql_type = Date)]
    pub day: NaiveDate,
    #[diesel(sql_type = BigInt)]
    pub created: i64,
    #[diesel(sql_type = BigInt)]
    pub resolved: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AnalyticsSummary {
    pub days: i64,
    pub total: i64,
    pub open: i64,
    pub overdue: i64,
    pub by_status: Vec<StatusCount>,
    pub by_priority: Vec<PriorityCount>,
    pub by_category: Vec<CategoryCount>,
    pub avg_resolution_hours: Option<f64>,
    pub daily: Vec<DailyCount>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct HeatmapPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub weight: i64,
}

#[derive(QueryableByName, Serialize, Deserialize, Debug, Clone)]
pub struct OfficerStats {
    #[diesel(sql_type = SqlUuid)]
    pub officer_id: Uuid,
    #[diesel(sql_type = Text)]
    pub name: String,
    #[diesel(sql_type = BigInt)]
    pub open_count: i64,
    #[diesel(sql_type = BigInt)]
    pub resolved_count: i64,
    #[diesel(sql_type = Nullable<Double>)]
    pub avg_resolution_hours: Option<f64>,
}

#[derive(QueryableByName)]
struct AverageHours {
    #[diesel(sql_type = Nullable<Double>)]
    hours: Option<f64>,
}

/// Per-day created/resolved counts, each aggregated once and joined onto the calendar.
const DAILY_SERIES_SQL: &str = "\
    WITH days AS ( \
        SELECT generate_series($1::date, $2::date, interval '1 day')::date AS day \
    ), created AS ( \
        SELECT (created_at AT TIME ZONE 'UTC')::date AS day, COUNT(*) AS n \
        FROM issues WHERE created_at >= $3 GROUP BY 1 \
    ), resolved AS ( \
        SELECT (resolved_at AT TIME ZONE 'UTC')::date AS day, COUNT(*) AS n \
        FROM issues WHERE resolved_at >= $3 GROUP BY 1 \
    ) \
    SELECT days.day AS day, COALESCE(created.n, 0) AS created, COALESCE(resolved.n, 0) AS resolved \
    FROM days \
    LEFT JOIN created ON created.day = days.day \
    LEFT JOIN resolved ON resolved.day = days.day \
    ORDER BY days.day";

pub struct AnalyticsService;

impl AnalyticsService {
    pub fn summary(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        days: i64,
        now: DateTime<Utc>,
    ) -> Result<AnalyticsSummary, AppError> {
        ctx.require_staff()?;
        let since = window_start(now, days);

        use crate::schema::{categories, issues};

        let status_rows: Vec<(IssueStatus, i64)> = issues::table
            .group_by(issues::status)
            .select((issues::status, count_star()))
            .load(conn)?;

        let priority_rows: Vec<(IssuePriority, i64)> = issues::table
            .group_by(issues::priority)
            .select((issues::priority, count_star()))
            .load(conn)?;

        let category_rows: Vec<(Uuid, String, i64)> = issues::table
            .inner_join(categories::table)
            .group_by((categories::id, categories::name))
            .select((categories::id, categories::name, count_star()))
            .order(categories::name.asc())
            .load(conn)?;

        let overdue: i64 = issues::table
            .filter(issues::status.eq_any(IssueStatus::open_statuses()))
            .filter(issues::sla_due_at.lt(now))
            .count()
            .get_result(conn)?;

        let avg_resolution_hours = diesel::sql_query(
            "SELECT CAST(AVG(EXTRACT(EPOCH FROM (resolved_at - created_at)) / 3600.0) AS float8) AS hours \
             FROM issues WHERE resolved_at IS NOT NULL AND resolved_at >= $1",
        )
        .bind::<Timestamptz, _>(since)
        .get_result::<AverageHours>(conn)?
        .hours;

        let daily = diesel::sql_query(DAILY_SERIES_SQL)
            .bind::<Date, _>(since.date_naive())
            .bind::<Date, _>(now.date_naive())
            .bind::<Timestamptz, _>(since)
            .load::<DailyCount>(conn)?;

        let by_status = fill_status_counts(&status_rows);
        let total = by_status.iter().map(|s| s.count).sum();
        let open = by_status
            .iter()
            .filter(|s| s.status.is_open())
            .map(|s| s.count)
            .sum();

        Ok(AnalyticsSummary {
            days,
            total,
            open,
            overdue,
            by_status,
            by_priority: fill_priority_counts(&priority_rows),
            by_category: category_rows
                .into_iter()
                .map(|(category_id, name, count)| CategoryCount {
                    category_id,
                    name,
                    count,
                })
                .collect(),
            avg_resolution_hours,
            daily,
            generated_at: now,
        })
    }

    pub fn heatmap(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        filters: &IssueFilters,
        limit: i64,
    ) -> Result<Vec<HeatmapPoint>, AppError> {
        ctx.require_staff()?;
        let points = IssueRepo::list_points(conn, filters, limit)?;
        Ok(points
            .into_iter()
            .map(|(latitude, longitude, votes)| HeatmapPoint {
                latitude,
                longitude,
                weight: heatmap_weight(votes),
            })
            .collect())
    }

    pub fn officers(
        conn: &mut PgConnection,
        ctx: &RequestContext,
    ) -> Result<Vec<OfficerStats>, AppError> {
        ctx.require_staff()?;
        let open: Vec<String> = IssueStatus::open_statuses()
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        Ok(diesel::sql_query(
            "SELECT u.id AS officer_id, u.name AS name, \
                COUNT(i.id) FILTER (WHERE i.status = ANY($1)) AS open_count, \
                COUNT(i.id) FILTER (WHERE i.resolved_at IS NOT NULL) AS resolved_count, \
                CAST(AVG(EXTRACT(EPOCH FROM (i.resolved_at - i.created_at)) / 3600.0) \
                    FILTER (WHERE i.resolved_at IS NOT NULL) AS float8) AS avg_resolution_hours \
             FROM users u \
             LEFT JOIN issues i ON i.assignee_id = u.id \
             WHERE u.role IN ('officer', 'admin') AND u.is_active \
             GROUP BY u.id, u.name \
             ORDER BY open_count DESC, u.name ASC",
        )
        .bind::<Array<Text>, _>(open)
        .load::<OfficerStats>(conn)?)
    }
}

/// Clamps the requested window into `1..=365`, defaulting to 30 days.
pub fn resolve_window(days: Option<i64>) -> Result<i64, AppError> {
    match days {
        None => Ok(DEFAULT_WINDOW_DAYS),
        Some(d) if (1..=MAX_WINDOW_DAYS).contains(&d) => Ok(d),
        Some(_) => Err(AppError::validation(format!(
            "days must be between 1 and {}",
            MAX_WINDOW_DAYS
        ))),
    }
}

/// First instant counted by a window of `days` ending at `now`, today included.
pub fn window_start(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    let first_day = now.date_naive() - Duration::days(days - 1);
    first_day.and_time(chrono::NaiveTime::MIN).and_utc()
}

pub fn heatmap_weight(vote_count: i32) -> i64 {
    1 + i64::from(vote_count.max(0))
}

/// One entry per status in declaration order, zero-filled.
pub fn fill_status_counts(rows: &[(IssueStatus, i64)]) -> Vec<StatusCount> {
    let counts: HashMap<IssueStatus, i64> = rows.iter().copied().collect();
    IssueStatus::ALL
        .iter()
        .map(|status| StatusCount {
            status: *status,
            count: counts.get(status).copied().unwrap_or(0),
        })
        .collect()
}

pub fn fill_priority_counts(rows: &[(IssuePriority, i64)]) -> Vec<PriorityCount> {
    let counts: HashMap<IssuePriority, i64> = rows.iter().copied().collect();
    IssuePriority::ALL
        .iter()
        .map(|priority| PriorityCount {
            priority: *priority,
            count: counts.get(priority).copied().unwrap_or(0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn daily_series_scans_issues_once_per_measure() {
        assert_eq!(DAILY_SERIES_SQL.matches("FROM issues").count(), 2);
        assert_eq!(DAILY_SERIES_SQL.matches("GROUP BY").count(), 2);
        assert!(!DAILY_SERIES_SQL.contains("(SELECT COUNT"));
    }

    #[test]
    fn window_defaults_and_bounds() {
        assert_eq!(resolve_window(None).unwrap(), 30);
        assert_eq!(resolve_window(Some(1)).unwrap(), 1);
        assert_eq!(resolve_window(Some(365)).unwrap(), 365);
        assert!(resolve_window(Some(0)).is_err());
        assert!(resolve_window(Some(366)).is_err());
    }

    #[test]
    fn window_start_includes_today() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 15, 30, 0).unwrap();
        assert_eq!(
            window_start(now, 1),
            Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap()
        );
        assert_eq!(
            window_start(now, 7),
            Utc.with_ymd_and_hms(2025, 3, 4, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn heatmap_weight_counts_votes() {
        assert_eq!(heatmap_weight(0), 1);
        assert_eq!(heatmap_weight(9), 10);
        assert_eq!(heatmap_weight(-3), 1);
    }

    #[test]
    fn status_counts_are_zero_filled() {
        let counts = fill_status_counts(&[(IssueStatus::Resolved, 4), (IssueStatus::Submitted, 2)]);
        assert_eq!(counts.len(), IssueStatus::ALL.len());
        assert_eq!(counts[0].status, IssueStatus::Submitted);
        assert_eq!(counts[0].count, 2);
        let closed = counts.iter().find(|c| c.status == IssueStatus::Closed).unwrap();
        assert_eq!(closed.count, 0);
    }
}
