// Sub-modules organized by functional domain
pub mod api;
pub mod audit_log;
pub mod category;
pub mod comment;
pub mod issue;
pub mod notification;
pub mod offline_draft;
pub mod status_history;
pub mod user;
pub mod vote;

// API response structures
pub use api::*;

pub use audit_log::*;
pub use category::*;
pub use comment::*;
pub use issue::*;
pub use notification::*;
pub use offline_draft::*;
pub use status_history::*;
pub use user::*;
pub use vote::*;
