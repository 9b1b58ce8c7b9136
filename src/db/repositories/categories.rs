use diesel::prelude::*;
use uuid::Uuid;

use crate::db::models::category::{Category, CategoryChanges, NewCategory};

pub struct CategoryRepo;

impl CategoryRepo {
    pub fn find_by_id(
        conn: &mut PgConnection,
        category_id: Uuid,
    ) -> Result<Option<Category>, diesel::result::Error> {
        use crate::schema::categories::dsl as c;
        c::categories
            .filter(c::id.eq(category_id))
            .select(Category::as_select())
            .first(conn)
            .optional()
    }

    pub fn exists_by_name(
        conn: &mut PgConnection,
        category_name: &str,
        excluding: Option<Uuid>,
    ) -> Result<bool, diesel::result::Error> {
        use crate::schema::categories::dsl as c;
        let mut query = c::categories
            .filter(c::name.eq(category_name))
            .into_boxed::<diesel::pg::Pg>();
        if let Some(skip_id) = excluding {
            query = query.filter(c::id.ne(skip_id));
        }
        diesel::select(diesel::dsl::exists(query)).get_result(conn)
    }

    pub fn list(
        conn: &mut PgConnection,
        include_inactive: bool,
    ) -> Result<Vec<Category>, diesel::result::Error> {
        use crate::schema::categories::dsl as c;
        let mut query = c::categories.into_boxed();
        if !include_inactive {
            query = query.filter(c::is_active.eq(true));
        }
        query
            .order(c::name.asc())
            .select(Category::as_select())
            .load(conn)
    }

    pub fn insert(
        conn: &mut PgConnection,
        new_category: &NewCategory,
    ) -> Result<Category, diesel::result::Error> {
        diesel::insert_into(crate::schema::categories::table)
            .values(new_category)
            .returning(Category::as_returning())
            .get_result(conn)
    }

    pub fn update(
        conn: &mut PgConnection,
        category_id: Uuid,
        changes: &CategoryChanges,
    ) -> Result<Category, diesel::result::Error> {
        use crate::schema::categories::dsl as c;
        diesel::update(c::categories.filter(c::id.eq(category_id)))
            .set(changes)
            .returning(Category::as_returning())
            .get_result(conn)
    }
}
