// Database models for Diesel
use diesel::prelude::*;

/// Insertable struct for new users; timestamps and id come from column defaults
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub google_id: String,
}
