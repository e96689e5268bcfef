//! Diesel models for the images and ownerships tables.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use vitrine_core::{Image, Ownership};

/// Database row for images table.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = crate::schema::images)]
#[diesel(primary_key(image_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ImageRow {
    pub image_id: i64,
    pub content_hash: String,
    pub extension: String,
    pub created_time: NaiveDateTime,
}

/// Insertable struct for images table.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::images)]
pub struct NewImageRow<'a> {
    pub content_hash: &'a str,
    pub extension: &'a str,
    pub created_time: NaiveDateTime,
}

/// Database row for ownerships table.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = crate::schema::ownerships)]
#[diesel(primary_key(ownership_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OwnershipRow {
    pub ownership_id: i64,
    pub user_id: i64,
    pub image_id: i64,
    pub is_private: bool,
    pub created_time: NaiveDateTime,
    pub updated_time: NaiveDateTime,
}

/// Insertable struct for ownerships table.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::ownerships)]
pub struct NewOwnershipRow {
    pub user_id: i64,
    pub image_id: i64,
    pub is_private: bool,
    pub created_time: NaiveDateTime,
    pub updated_time: NaiveDateTime,
}

impl From<ImageRow> for Image {
    fn from(row: ImageRow) -> Self {
        Image {
            image_id: row.image_id,
            content_hash: row.content_hash,
            extension: row.extension,
            created_time: row.created_time.and_utc(),
        }
    }
}

impl From<OwnershipRow> for Ownership {
    fn from(row: OwnershipRow) -> Self {
        Ownership {
            ownership_id: row.ownership_id,
            user_id: row.user_id,
            image_id: row.image_id,
            is_private: row.is_private,
            created_time: row.created_time.and_utc(),
            updated_time: row.updated_time.and_utc(),
        }
    }
}
