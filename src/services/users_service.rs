use diesel::prelude::*;
use serde_json::json;
use uuid::Uuid;

use crate::{
    db::enums::UserRole,
    db::models::api::error_codes,
    db::models::user::{NewUser, User},
    db::repositories::UserRepo,
    error::AppError,
    middleware::auth::Claims,
    services::audit_service::AuditService,
    services::context::RequestContext,
};

pub struct UsersService;

impl UsersService {
    /// Loads the caller, creating a citizen row the first time a token is seen.
    pub fn provision(conn: &mut PgConnection, claims: &Claims) -> Result<User, AppError> {
        if let Some(user) = UserRepo::find_by_id(conn, claims.sub)? {
            return Ok(user);
        }

        let name = claims
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| display_name_from_email(&claims.email));

        let user = UserRepo::insert_if_absent(
            conn,
            &NewUser {
                id: claims.sub,
                email: claims.email.clone(),
                name,
                role: UserRole::Citizen,
            },
        )?;

        tracing::info!(user_id = %user.id, "Provisioned user from token claims");
        Ok(user)
    }

    pub fn list_staff(conn: &mut PgConnection, ctx: &RequestContext) -> Result<Vec<User>, AppError> {
        ctx.require_staff()?;
        Ok(UserRepo::list_active_by_roles(
            conn,
            &[UserRole::Officer, UserRole::Admin],
        )?)
    }

    pub fn change_role(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        user_id: Uuid,
        new_role: UserRole,
    ) -> Result<User, AppError> {
        ctx.require_admin()?;

        if user_id == ctx.user_id && new_role != UserRole::Admin {
            return Err(AppError::validation_with_code(
                "Admins cannot demote themselves",
                error_codes::USER_SELF_DEMOTION,
            ));
        }

        conn.transaction::<_, AppError, _>(|conn| {
            let existing =
                UserRepo::find_by_id(conn, user_id)?.ok_or_else(|| AppError::not_found("user"))?;
            if existing.role == new_role {
                return Ok(existing);
            }

            let updated = UserRepo::update_role(conn, user_id, new_role)?;
            AuditService::record(
                conn,
                Some(ctx.user_id),
                "user.role_changed",
                "user",
                user_id,
                json!({ "from": existing.role, "to": new_role }),
            )?;
            tracing::info!(user_id = %user_id, from = %existing.role, to = %new_role, "User role changed");
            Ok(updated)
        })
    }
}

/// `jane.doe@city.gov` becomes `jane.doe`.
pub fn display_name_from_email(email: &str) -> String {
    email
        .split('@')
        .next()
        .filter(|local| !local.is_empty())
        .unwrap_or("resident")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_local_part() {
        assert_eq!(display_name_from_email("jane.doe@city.gov"), "jane.doe");
        assert_eq!(display_name_from_email("@city.gov"), "resident");
        assert_eq!(display_name_from_email("plain"), "plain");
    }
}
