// Page parameters and envelope metadata

use grievance_backend::db::models::api::{PageRequest, Pagination, ResponseMeta};

#[test]
fn page_request_bounds() {
    let default = PageRequest::from_query(None, None).unwrap();
    assert_eq!(default.page, 1);
    assert_eq!(default.per_page, PageRequest::DEFAULT_PER_PAGE);
    assert_eq!(default.offset(), 0);

    let third = PageRequest::from_query(Some(3), Some(25)).unwrap();
    assert_eq!(third.offset(), 50);

    assert!(PageRequest::from_query(Some(0), None).is_err());
    assert!(PageRequest::from_query(None, Some(0)).is_err());
    assert!(PageRequest::from_query(None, Some(PageRequest::MAX_PER_PAGE + 1)).is_err());
}

#[test]
fn pagination_meta() {
    let page = PageRequest::from_query(Some(2), Some(10)).unwrap();
    let meta = ResponseMeta::paginated(&page, 35);
    assert_eq!(meta.total_count, Some(35));
    let pagination = meta.pagination.unwrap();
    assert_eq!(pagination, Pagination::new(2, 10, 35));
    assert_eq!(pagination.total_pages, 4);
    assert!(pagination.has_next);
}
