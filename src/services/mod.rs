pub mod analytics_service;
pub mod audit_service;
pub mod categories_service;
pub mod comments_service;
pub mod context;
pub mod drafts_service;
pub mod export_service;
pub mod issue_workflow_service;
pub mod issues_service;
pub mod lifecycle;
pub mod notifications_service;
pub mod users_service;
pub mod votes_service;

pub use analytics_service::AnalyticsService;
pub use audit_service::AuditService;
pub use categories_service::CategoriesService;
pub use comments_service::CommentsService;
pub use drafts_service::DraftsService;
pub use issue_workflow_service::IssueWorkflowService;
pub use issues_service::IssuesService;
pub use notifications_service::NotificationsService;
pub use users_service::UsersService;
pub use votes_service::VotesService;
