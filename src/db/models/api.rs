use serde::{Deserialize, Serialize};

// Uniform response envelope
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorDetail>>,
    pub timestamp: String,
}

#[derive(Serialize, Default)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
}

impl ResponseMeta {
    pub fn with_total(total_count: i64) -> Self {
        Self {
            total_count: Some(total_count),
            ..Default::default()
        }
    }

    pub fn paginated(page: &PageRequest, total_count: i64) -> Self {
        Self {
            pagination: Some(Pagination::new(page.page, page.per_page, total_count)),
            total_count: Some(total_count),
            ..Default::default()
        }
    }
}

#[derive(Serialize, Debug, PartialEq)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: i64, per_page: i64, total_count: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total_count + per_page - 1) / per_page
        } else {
            0
        };
        Self {
            page,
            per_page,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

/// Validated page window for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    pub const DEFAULT_PER_PAGE: i64 = 20;
    pub const MAX_PER_PAGE: i64 = 100;

    pub fn from_query(page: Option<i64>, per_page: Option<i64>) -> Result<Self, String> {
        let page = page.unwrap_or(1);
        let per_page = per_page.unwrap_or(Self::DEFAULT_PER_PAGE);

        if page < 1 {
            return Err("page must be >= 1".to_string());
        }
        if !(1..=Self::MAX_PER_PAGE).contains(&per_page) {
            return Err(format!("per_page must be between 1 and {}", Self::MAX_PER_PAGE));
        }

        Ok(Self { page, per_page })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: Self::DEFAULT_PER_PAGE,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    fn build(success: bool, code: u16, message: &str, data: Option<T>) -> Self {
        Self {
            success,
            code,
            message: message.to_string(),
            data,
            meta: None,
            errors: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn failure(code: u16, message: &str, error_code: &str, field: Option<String>) -> Self {
        let mut response = Self::build(false, code, message, None);
        response.errors = Some(vec![ErrorDetail {
            field,
            code: error_code.to_string(),
            message: message.to_string(),
        }]);
        response
    }

    pub fn success(data: T, message: &str) -> Self {
        Self::build(true, 200, message, Some(data))
    }

    pub fn success_with_meta(data: T, message: &str, meta: ResponseMeta) -> Self {
        let mut response = Self::build(true, 200, message, Some(data));
        response.meta = Some(meta);
        response
    }

    pub fn created(data: T, message: &str) -> Self {
        Self::build(true, 201, message, Some(data))
    }

    pub fn ok(message: &str) -> Self {
        Self::build(true, 200, message, None)
    }

    pub fn validation_error(errors: Vec<ErrorDetail>) -> Self {
        let mut response = Self::build(false, 422, "Validation failed", None);
        response.errors = Some(errors);
        response
    }

    pub fn unprocessable(message: &str, error_code: &str) -> Self {
        Self::failure(422, message, error_code, None)
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::failure(401, message, "UNAUTHORIZED", None)
    }

    pub fn forbidden(message: &str) -> Self {
        Self::failure(403, message, "FORBIDDEN", None)
    }

    pub fn not_found(message: &str) -> Self {
        Self::failure(404, message, "NOT_FOUND", None)
    }

    pub fn conflict(message: &str, field: Option<String>, error_code: &str) -> Self {
        Self::failure(409, message, error_code, field)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::failure(400, message, "BAD_REQUEST", None)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::failure(500, message, "INTERNAL_ERROR", None)
    }
}

// Business error codes
pub mod error_codes {
    pub const ISSUE_INVALID_TRANSITION: &str = "ISSUE_001";
    pub const ISSUE_NOT_EDITABLE: &str = "ISSUE_002";
    pub const ISSUE_VOTING_CLOSED: &str = "ISSUE_003";
    pub const ISSUE_INVALID_ASSIGNEE: &str = "ISSUE_004";

    pub const CATEGORY_EXISTS: &str = "CATEGORY_001";
    pub const CATEGORY_INACTIVE: &str = "CATEGORY_002";

    pub const VOTE_CONFLICT: &str = "VOTE_001";

    pub const DRAFT_SUBMITTED: &str = "DRAFT_001";
    pub const DRAFT_INVALID_PAYLOAD: &str = "DRAFT_002";

    pub const USER_SELF_DEMOTION: &str = "USER_001";

    pub const EXPORT_UNSUPPORTED_FORMAT: &str = "EXPORT_001";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_math() {
        let p = Pagination::new(1, 20, 45);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_next);
        assert!(!p.has_prev);

        let p = Pagination::new(3, 20, 45);
        assert!(!p.has_next);
        assert!(p.has_prev);

        let p = Pagination::new(1, 20, 0);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_next);
    }

    #[test]
    fn page_request_bounds() {
        assert_eq!(PageRequest::from_query(None, None).unwrap(), PageRequest::default());
        assert_eq!(PageRequest::from_query(Some(3), Some(10)).unwrap().offset(), 20);
        assert!(PageRequest::from_query(Some(0), None).is_err());
        assert!(PageRequest::from_query(None, Some(0)).is_err());
        assert!(PageRequest::from_query(None, Some(101)).is_err());
    }
}
