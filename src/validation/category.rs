use validator::ValidationError;

use crate::error::AppError;

pub const MAX_NAME_CHARS: usize = 100;

/// Field rule for `#[validate(custom(...))]` on category names.
pub fn validate_category_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("Category name is required".into());
        return Err(error);
    }

    if trimmed.chars().count() > MAX_NAME_CHARS {
        let mut error = ValidationError::new("too_long");
        error.message = Some("Category name is too long (max 100 characters)".into());
        return Err(error);
    }

    Ok(())
}

pub struct UpdateCategoryChanges {
    pub name: bool,
    pub sla_hours: bool,
    pub other_fields_present: bool,
}

pub fn validate_update_category(changes: &UpdateCategoryChanges) -> Result<(), AppError> {
    if !changes.name && !changes.sla_hours && !changes.other_fields_present {
        return Err(AppError::validation("No update data provided"));
    }
    Ok(())
}
