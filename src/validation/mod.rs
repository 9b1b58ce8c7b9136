pub mod category;
pub mod comment;
pub mod draft;
pub mod issue;

use axum::{
    Json, async_trait,
    extract::{
        FromRequest, FromRequestParts, Path, Query,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{Request, request::Parts},
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::{db::models::api::ErrorDetail, error::AppError};

/// JSON extractor that runs `validator` rules before the handler sees the body.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S, B> FromRequest<S, B> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    B: Send + 'static,
    Json<T>: FromRequest<S, B, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

        validate_dto(&value)?;
        Ok(ValidatedJson(value))
    }
}

/// Query-string extractor whose rejection uses the standard error envelope.
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: QueryRejection| AppError::bad_request(rejection.body_text()))?;
        Ok(QueryParams(value))
    }
}

/// Path extractor; a malformed id becomes a 400 in the standard envelope.
pub struct PathParam<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for PathParam<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: PathRejection| AppError::bad_request(rejection.body_text()))?;
        Ok(PathParam(value))
    }
}

/// Runs derive-based validation and flattens failures into field errors.
pub fn validate_dto<T: Validate>(value: &T) -> Result<(), AppError> {
    value
        .validate()
        .map_err(|errors| AppError::InvalidFields(error_details(&errors)))
}

pub fn error_details(errors: &ValidationErrors) -> Vec<ErrorDetail> {
    let mut details: Vec<ErrorDetail> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |error| ErrorDetail {
                field: Some(field.to_string()),
                code: error.code.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Validation failed for field: {}", field)),
            })
        })
        .collect();
    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}

/// Reusable field rules for `#[validate(custom(...))]`.
pub mod rules {
    use validator::ValidationError;

    pub const MAX_PHOTOS: usize = 5;
    pub const MAX_URL_LEN: usize = 2048;

    fn with_message(code: &'static str, message: &'static str) -> ValidationError {
        let mut error = ValidationError::new(code);
        error.message = Some(message.into());
        error
    }

    pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(with_message("blank", "Must not be blank"));
        }
        Ok(())
    }

    pub fn validate_photo_urls(urls: &[String]) -> Result<(), ValidationError> {
        if urls.len() > MAX_PHOTOS {
            return Err(with_message("too_many_photos", "At most 5 photos can be attached"));
        }

        for url in urls {
            let is_web = url.starts_with("https://") || url.starts_with("http://");
            if !is_web || url.len() > MAX_URL_LEN || url.chars().any(char::is_whitespace) {
                return Err(with_message(
                    "invalid_photo_url",
                    "Photo URLs must be absolute http(s) URLs",
                ));
            }
        }

        Ok(())
    }
}
