use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql};
use diesel::pg::Pg;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::{AsExpression, FromSqlRow};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Declares an enum persisted as a lowercase `TEXT` column.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            Serialize, Deserialize, AsExpression, FromSqlRow,
        )]
        #[diesel(sql_type = Text)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("Unrecognized {} value: {}", stringify!($name), other)),
                }
            }
        }

        impl FromSql<Text, Pg> for $name {
            fn from_sql(bytes: <Pg as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
                let s = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
                s.parse::<$name>().map_err(Into::into)
            }
        }

        impl ToSql<Text, Pg> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
                out.write_all(self.as_str().as_bytes())?;
                Ok(IsNull::No)
            }
        }
    };
}

text_enum! {
    UserRole {
        Citizen => "citizen",
        Officer => "officer",
        Admin => "admin",
    }
}

impl UserRole {
    /// Officers and admins triage issues.
    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Officer | UserRole::Admin)
    }
}

text_enum! {
    /// Declaration order is the board column order.
    IssueStatus {
        Submitted => "submitted",
        Acknowledged => "acknowledged",
        InProgress => "in_progress",
        Resolved => "resolved",
        Rejected => "rejected",
        Closed => "closed",
        Reopened => "reopened",
    }
}

impl IssueStatus {
    /// Statuses that still count against the SLA.
    pub fn is_open(&self) -> bool {
        !matches!(
            self,
            IssueStatus::Resolved | IssueStatus::Rejected | IssueStatus::Closed
        )
    }

    pub fn accepts_votes(&self) -> bool {
        !matches!(self, IssueStatus::Rejected | IssueStatus::Closed)
    }

    pub fn open_statuses() -> Vec<IssueStatus> {
        Self::ALL.iter().copied().filter(|s| s.is_open()).collect()
    }
}

text_enum! {
    IssuePriority {
        Low => "low",
        Medium => "medium",
        High => "high",
        Urgent => "urgent",
    }
}

impl IssuePriority {
    /// One step up, saturating at `Urgent`.
    pub fn escalated(&self) -> Self {
        match self {
            IssuePriority::Low => IssuePriority::Medium,
            IssuePriority::Medium => IssuePriority::High,
            IssuePriority::High | IssuePriority::Urgent => IssuePriority::Urgent,
        }
    }
}

impl Default for IssuePriority {
    fn default() -> Self {
        IssuePriority::Medium
    }
}

text_enum! {
    NotificationKind {
        StatusChanged => "status_changed",
        CommentAdded => "comment_added",
        IssueAssigned => "issue_assigned",
        SlaEscalated => "sla_escalated",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_round_trip_matches_serde() {
        for status in IssueStatus::ALL {
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<IssueStatus>().unwrap(), *status);
        }
        assert!("pending".parse::<IssueStatus>().is_err());
    }

    #[test]
    fn priority_escalation_saturates() {
        assert_eq!(IssuePriority::Low.escalated(), IssuePriority::Medium);
        assert_eq!(IssuePriority::High.escalated(), IssuePriority::Urgent);
        assert_eq!(IssuePriority::Urgent.escalated(), IssuePriority::Urgent);
        assert!(IssuePriority::Urgent > IssuePriority::Low);
    }

    #[test]
    fn open_statuses_exclude_terminal_ones() {
        let open = IssueStatus::open_statuses();
        assert!(open.contains(&IssueStatus::Submitted));
        assert!(open.contains(&IssueStatus::Reopened));
        assert!(!open.contains(&IssueStatus::Resolved));
        assert!(!open.contains(&IssueStatus::Closed));
        assert!(!IssueStatus::Closed.accepts_votes());
        assert!(IssueStatus::Resolved.accepts_votes());
    }

    #[test]
    fn staff_roles() {
        assert!(UserRole::Officer.is_staff());
        assert!(UserRole::Admin.is_staff());
        assert!(!UserRole::Citizen.is_staff());
    }
}
