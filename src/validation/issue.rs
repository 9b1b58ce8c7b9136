use crate::db::repositories::issues::BoundingBox;
use crate::error::AppError;

pub const MAX_NOTE_LEN: usize = 1000;

/// The four bounding-box parameters must be given together.
pub fn validate_bbox(
    min_lat: Option<f64>,
    max_lat: Option<f64>,
    min_lng: Option<f64>,
    max_lng: Option<f64>,
) -> Result<Option<BoundingBox>, AppError> {
    match (min_lat, max_lat, min_lng, max_lng) {
        (None, None, None, None) => Ok(None),
        (Some(min_lat), Some(max_lat), Some(min_lng), Some(max_lng)) => {
            if !(-90.0..=90.0).contains(&min_lat) || !(-90.0..=90.0).contains(&max_lat) {
                return Err(AppError::validation("Latitude bounds must be within [-90, 90]"));
            }
            if !(-180.0..=180.0).contains(&min_lng) || !(-180.0..=180.0).contains(&max_lng) {
                return Err(AppError::validation(
                    "Longitude bounds must be within [-180, 180]",
                ));
            }
            if min_lat > max_lat || min_lng > max_lng {
                return Err(AppError::validation(
                    "Bounding box minimums must not exceed maximums",
                ));
            }
            Ok(Some(BoundingBox {
                min_lat,
                max_lat,
                min_lng,
                max_lng,
            }))
        }
        _ => Err(AppError::validation(
            "min_lat, max_lat, min_lng and max_lng must be provided together",
        )),
    }
}

pub fn validate_status_note(note: Option<&str>) -> Result<Option<String>, AppError> {
    match note.map(str::trim).filter(|n| !n.is_empty()) {
        None => Ok(None),
        Some(n) if n.chars().count() > MAX_NOTE_LEN => Err(AppError::validation(
            "Status note is too long (max 1000 characters)",
        )),
        Some(n) => Ok(Some(n.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_all_or_nothing() {
        assert!(validate_bbox(None, None, None, None).unwrap().is_none());
        assert!(
            validate_bbox(Some(1.0), Some(2.0), Some(3.0), Some(4.0))
                .unwrap()
                .is_some()
        );
        assert!(validate_bbox(Some(1.0), None, None, None).is_err());
        assert!(validate_bbox(Some(2.0), Some(1.0), Some(3.0), Some(4.0)).is_err());
        assert!(validate_bbox(Some(-91.0), Some(1.0), Some(3.0), Some(4.0)).is_err());
    }

    #[test]
    fn test_status_note() {
        assert_eq!(validate_status_note(None).unwrap(), None);
        assert_eq!(validate_status_note(Some("  ")).unwrap(), None);
        assert_eq!(
            validate_status_note(Some(" crew dispatched ")).unwrap(),
            Some("crew dispatched".to_string())
        );
        assert!(validate_status_note(Some(&"n".repeat(1001))).is_err());
    }
}
