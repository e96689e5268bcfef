//! Per-user ownership edges.

use crate::models::{ImageRow, NewOwnershipRow, OwnershipRow};
use crate::schema::{images, ownerships};
use crate::DatabaseResult;
use chrono::{DateTime, TimeDelta, Utc};
use diesel::prelude::*;
use diesel::sqlite::{Sqlite, SqliteConnection};
use vitrine_core::{Image, ImageFilter, ListQuery, OrderBy, Ownership};
use vitrine_error::{DatabaseError, DatabaseErrorKind};

/// Associate `user_id` with `image_id`.
///
/// # Errors
///
/// Returns `AlreadyOwned` if the pair already exists, whether detected up
/// front or raised by the UNIQUE constraint, and `NotFound` if `image_id`
/// has no image row.
#[tracing::instrument(skip(conn))]
pub fn create(
    conn: &mut SqliteConnection,
    user_id: i64,
    image_id: i64,
    is_private: bool,
    now: DateTime<Utc>,
) -> DatabaseResult<Ownership> {
    let already_owned = || DatabaseError::new(DatabaseErrorKind::AlreadyOwned { user_id, image_id });

    if find(conn, user_id, image_id)?.is_some() {
        return Err(already_owned());
    }

    let stamp = now.naive_utc();
    let new_row = NewOwnershipRow {
        user_id,
        image_id,
        is_private,
        created_time: stamp,
        updated_time: stamp,
    };

    diesel::insert_into(ownerships::table)
        .values(&new_row)
        .execute(conn)
        .map_err(|e| {
            let err = DatabaseError::from(e);
            if err.is_unique_violation() {
                already_owned()
            } else if err.is_foreign_key_violation() {
                DatabaseError::new(DatabaseErrorKind::NotFound)
            } else {
                err
            }
        })?;

    let ownership = find(conn, user_id, image_id)?
        .ok_or_else(|| DatabaseError::new(DatabaseErrorKind::NotFound))?;
    tracing::info!(ownership_id = ownership.ownership_id, "Created ownership");
    Ok(ownership)
}

/// The ownership row for `(user_id, image_id)`, if any.
pub fn find(
    conn: &mut SqliteConnection,
    user_id: i64,
    image_id: i64,
) -> DatabaseResult<Option<Ownership>> {
    let row = ownerships::table
        .filter(ownerships::user_id.eq(user_id))
        .filter(ownerships::image_id.eq(image_id))
        .select(OwnershipRow::as_select())
        .first(conn)
        .optional()?;
    Ok(row.map(Ownership::from))
}

/// Fetch an ownership row by id.
///
/// # Errors
///
/// Returns `NotFound` if the row does not exist.
pub fn get(conn: &mut SqliteConnection, ownership_id: i64) -> DatabaseResult<Ownership> {
    let row = ownerships::table
        .find(ownership_id)
        .select(OwnershipRow::as_select())
        .first(conn)?;
    Ok(row.into())
}

/// One page of a user's images, joined with their canonical rows.
///
/// Rows with equal sort keys are ordered by `ownership_id` in the same
/// direction, so pages never overlap.
///
/// # Errors
///
/// Returns a validation error for an out-of-range page or limit before any
/// query runs.
pub fn list(
    conn: &mut SqliteConnection,
    user_id: i64,
    query: &ListQuery,
) -> vitrine_error::VitrineResult<Vec<(Ownership, Image)>> {
    query.validate()?;

    let mut statement = ownerships::table
        .inner_join(images::table)
        .filter(ownerships::user_id.eq(user_id))
        .select((OwnershipRow::as_select(), ImageRow::as_select()))
        .into_boxed::<Sqlite>();

    statement = match query.filter() {
        ImageFilter::All => statement,
        ImageFilter::Private => statement.filter(ownerships::is_private.eq(true)),
        ImageFilter::Public => statement.filter(ownerships::is_private.eq(false)),
    };

    statement = match (query.order_by(), query.ascending()) {
        (OrderBy::CreatedTime, true) => statement
            .order_by(ownerships::created_time.asc())
            .then_order_by(ownerships::ownership_id.asc()),
        (OrderBy::CreatedTime, false) => statement
            .order_by(ownerships::created_time.desc())
            .then_order_by(ownerships::ownership_id.desc()),
        (OrderBy::UpdatedTime, true) => statement
            .order_by(ownerships::updated_time.asc())
            .then_order_by(ownerships::ownership_id.asc()),
        (OrderBy::UpdatedTime, false) => statement
            .order_by(ownerships::updated_time.desc())
            .then_order_by(ownerships::ownership_id.desc()),
    };

    let rows: Vec<(OwnershipRow, ImageRow)> = statement
        .limit(*query.limit())
        .offset(query.offset())
        .load(conn)
        .map_err(DatabaseError::from)?;

    Ok(rows
        .into_iter()
        .map(|(ownership, image)| (ownership.into(), image.into()))
        .collect())
}

/// Change visibility and refresh `updated_time`.
///
/// The new stamp is strictly later than the previous one: when `now` does
/// not advance past it, the old stamp plus one millisecond is used instead.
///
/// # Errors
///
/// Returns `NotFound` if the row does not exist.
#[tracing::instrument(skip(conn))]
pub fn set_visibility(
    conn: &mut SqliteConnection,
    ownership_id: i64,
    is_private: bool,
    now: DateTime<Utc>,
) -> DatabaseResult<Ownership> {
    conn.immediate_transaction::<_, DatabaseError, _>(|conn| {
        let current = get(conn, ownership_id)?;
        let stamp = if now > current.updated_time {
            now
        } else {
            current.updated_time + TimeDelta::milliseconds(1)
        };

        diesel::update(ownerships::table.find(ownership_id))
            .set((
                ownerships::is_private.eq(is_private),
                ownerships::updated_time.eq(stamp.naive_utc()),
            ))
            .execute(conn)?;

        let updated = get(conn, ownership_id)?;
        tracing::info!(is_private, updated_time = %updated.updated_time, "Changed visibility");
        Ok(updated)
    })
}

/// Number of ownership rows referencing `image_id`.
pub fn count_for_image(conn: &mut SqliteConnection, image_id: i64) -> DatabaseResult<i64> {
    let count = ownerships::table
        .filter(ownerships::image_id.eq(image_id))
        .count()
        .get_result(conn)?;
    Ok(count)
}

/// Delete an ownership row.
///
/// Returns whether a row was removed and how many owners the image still
/// has afterwards.
///
/// # Errors
///
/// Returns `NotFound` if the row does not exist.
pub fn delete(conn: &mut SqliteConnection, ownership_id: i64) -> DatabaseResult<(bool, i64)> {
    let ownership = get(conn, ownership_id)?;
    let removed = diesel::delete(ownerships::table.find(ownership_id)).execute(conn)? > 0;
    let remaining = count_for_image(conn, ownership.image_id)?;
    Ok((removed, remaining))
}
