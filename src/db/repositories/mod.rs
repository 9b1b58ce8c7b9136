pub mod audit_logs;
pub mod categories;
pub mod comments;
pub mod drafts;
pub mod issues;
pub mod notifications;
pub mod status_history;
pub mod users;
pub mod votes;

pub use audit_logs::AuditLogRepo;
pub use categories::CategoryRepo;
pub use comments::CommentRepo;
pub use drafts::DraftRepo;
pub use issues::IssueRepo;
pub use notifications::NotificationRepo;
pub use status_history::StatusHistoryRepo;
pub use users::UserRepo;
pub use votes::VoteRepo;

/// Escapes LIKE metacharacters and wraps the term for a substring match.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("pothole"), "%pothole%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
