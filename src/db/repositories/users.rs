use diesel::prelude::*;
use uuid::Uuid;

use crate::db::enums::UserRole;
use crate::db::models::user::{NewUser, User};

pub struct UserRepo;

impl UserRepo {
    pub fn find_by_id(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Option<User>, diesel::result::Error> {
        use crate::schema::users::dsl as u;
        u::users
            .filter(u::id.eq(user_id))
            .select(User::as_select())
            .first(conn)
            .optional()
    }

    /// Inserts the user unless a row with the same id already exists.
    pub fn insert_if_absent(
        conn: &mut PgConnection,
        new_user: &NewUser,
    ) -> Result<User, diesel::result::Error> {
        use crate::schema::users::dsl as u;
        diesel::insert_into(u::users)
            .values(new_user)
            .on_conflict(u::id)
            .do_nothing()
            .execute(conn)?;

        u::users
            .filter(u::id.eq(new_user.id))
            .select(User::as_select())
            .first(conn)
    }

    pub fn list_active_by_roles(
        conn: &mut PgConnection,
        roles: &[UserRole],
    ) -> Result<Vec<User>, diesel::result::Error> {
        use crate::schema::users::dsl as u;
        u::users
            .filter(u::is_active.eq(true))
            .filter(u::role.eq_any(roles.to_vec()))
            .order(u::name.asc())
            .select(User::as_select())
            .load(conn)
    }

    pub fn update_role(
        conn: &mut PgConnection,
        user_id: Uuid,
        new_role: UserRole,
    ) -> Result<User, diesel::result::Error> {
        use crate::schema::users::dsl as u;
        diesel::update(u::users.filter(u::id.eq(user_id)))
            .set((u::role.eq(new_role), u::updated_at.eq(chrono::Utc::now())))
            .returning(User::as_returning())
            .get_result(conn)
    }
}
