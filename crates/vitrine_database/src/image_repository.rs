//! Canonical image rows.
//!
//! `content_hash` is UNIQUE, so concurrent inserts of the same bytes
//! converge on a single row: the losing insert sees a unique violation and
//! reads the winner's row back.

use crate::models::{ImageRow, NewImageRow};
use crate::schema::images;
use crate::DatabaseResult;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use vitrine_core::Image;
use vitrine_error::{DatabaseError, DatabaseErrorKind};

/// Whether [`insert_or_get`] created the row or found an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inserted {
    /// This call created the row
    New,
    /// Another writer created it first
    Existing,
}

/// Fetch an image by id.
///
/// # Errors
///
/// Returns `NotFound` if no such image exists.
pub fn get_image(conn: &mut SqliteConnection, image_id: i64) -> DatabaseResult<Image> {
    let row = images::table
        .find(image_id)
        .select(ImageRow::as_select())
        .first(conn)?;
    Ok(row.into())
}

/// Look up an image by content hash. Hashes are compared in lower case.
pub fn find_by_hash(conn: &mut SqliteConnection, content_hash: &str) -> DatabaseResult<Option<Image>> {
    let hash = content_hash.to_ascii_lowercase();
    let row = images::table
        .filter(images::content_hash.eq(&hash))
        .select(ImageRow::as_select())
        .first(conn)
        .optional()?;
    Ok(row.map(Image::from))
}

/// Insert an image row, or return the existing row for the same hash.
///
/// # Errors
///
/// Returns an error if the insert fails for any reason other than a
/// duplicate hash.
pub fn insert_or_get(
    conn: &mut SqliteConnection,
    content_hash: &str,
    extension: &str,
    created_time: DateTime<Utc>,
) -> DatabaseResult<(Image, Inserted)> {
    let hash = content_hash.to_ascii_lowercase();
    let new_row = NewImageRow {
        content_hash: &hash,
        extension,
        created_time: created_time.naive_utc(),
    };

    let inserted = match diesel::insert_into(images::table)
        .values(&new_row)
        .execute(conn)
    {
        Ok(_) => Inserted::New,
        Err(e) => {
            let err = DatabaseError::from(e);
            if !err.is_unique_violation() {
                return Err(err);
            }
            tracing::debug!(hash = %hash, "Image row already present");
            Inserted::Existing
        }
    };

    let image = find_by_hash(conn, &hash)?
        .ok_or_else(|| DatabaseError::new(DatabaseErrorKind::NotFound))?;

    if inserted == Inserted::New {
        tracing::info!(image_id = image.image_id, hash = %hash, "Inserted image row");
    }
    Ok((image, inserted))
}

/// Delete an image row. Returns whether a row was removed.
pub fn delete_image(conn: &mut SqliteConnection, image_id: i64) -> DatabaseResult<bool> {
    let removed = diesel::delete(images::table.find(image_id)).execute(conn)?;
    Ok(removed > 0)
}
