use crate::error::AppError;

pub const MAX_COMMENT_LEN: usize = 2000;

/// Returns the trimmed body when it is acceptable.
pub fn validate_comment_body(body: &str) -> Result<String, AppError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("Comment body is required"));
    }

    if trimmed.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::validation(
            "Comment body is too long (max 2000 characters)",
        ));
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_body_validation() {
        assert_eq!(validate_comment_body("  fixed yet?  ").unwrap(), "fixed yet?");
        assert!(validate_comment_body("").is_err());
        assert!(validate_comment_body("   ").is_err());
        assert!(validate_comment_body(&"a".repeat(2001)).is_err());
        assert!(validate_comment_body(&"a".repeat(2000)).is_ok());
    }
}
