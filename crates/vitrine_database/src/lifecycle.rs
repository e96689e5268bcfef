//! Atomic removal of ownership rows and orphaned images.

use crate::{image_repository, ownership_repository, DatabaseResult};
use diesel::sqlite::SqliteConnection;
use vitrine_core::{Image, Ownership};
use vitrine_error::{DatabaseError, DatabaseErrorKind};

/// What a committed delete removed.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct DeleteOutcome {
    /// The ownership row that was removed
    ownership: Ownership,
    /// Owners the image still has
    remaining_owners: i64,
    /// The image row, when it lost its last owner and was removed too
    removed_image: Option<Image>,
}

/// Remove `user_id`'s ownership of `image_id`, and the image itself when no
/// owners remain, in a single immediate transaction.
///
/// Blob files are not touched; the caller removes them after commit.
///
/// # Errors
///
/// Returns `NotFound` if the user owns no such image. Any other failure
/// rolls back and is reported as `TransactionFailure`.
#[tracing::instrument(skip(conn))]
pub fn delete_ownership(
    conn: &mut SqliteConnection,
    user_id: i64,
    image_id: i64,
) -> DatabaseResult<DeleteOutcome> {
    let outcome = conn.immediate_transaction::<_, DatabaseError, _>(|conn| {
        let ownership = ownership_repository::find(conn, user_id, image_id)?
            .ok_or_else(|| DatabaseError::new(DatabaseErrorKind::NotFound))?;

        let (_, remaining_owners) = ownership_repository::delete(conn, ownership.ownership_id)?;

        let removed_image = if remaining_owners == 0 {
            let image = image_repository::get_image(conn, image_id)?;
            image_repository::delete_image(conn, image_id)?;
            Some(image)
        } else {
            None
        };

        Ok(DeleteOutcome {
            ownership,
            remaining_owners,
            removed_image,
        })
    });

    match outcome {
        Ok(outcome) => {
            tracing::info!(
                remaining_owners = outcome.remaining_owners,
                image_removed = outcome.removed_image.is_some(),
                "Deleted ownership"
            );
            Ok(outcome)
        }
        Err(e) if matches!(e.kind, DatabaseErrorKind::NotFound) => Err(e),
        Err(e) => {
            tracing::error!(error = %e, "Delete rolled back");
            Err(DatabaseError::new(DatabaseErrorKind::TransactionFailure(
                e.kind.to_string(),
            )))
        }
    }
}

/// Remove `image_id` if no ownership rows reference it, in a single
/// immediate transaction. Returns the removed image.
///
/// Used to drop a freshly inserted image whose first ownership could not be
/// created. An image that is already gone or has gained an owner is left
/// alone and yields `None`.
///
/// # Errors
///
/// Returns `TransactionFailure` if the transaction rolls back.
#[tracing::instrument(skip(conn))]
pub fn remove_unowned_image(
    conn: &mut SqliteConnection,
    image_id: i64,
) -> DatabaseResult<Option<Image>> {
    let outcome = conn.immediate_transaction::<_, DatabaseError, _>(|conn| {
        let image = match image_repository::get_image(conn, image_id) {
            Ok(image) => image,
            Err(e) if matches!(e.kind, DatabaseErrorKind::NotFound) => return Ok(None),
            Err(e) => return Err(e),
        };
        if ownership_repository::count_for_image(conn, image_id)? > 0 {
            return Ok(None);
        }
        image_repository::delete_image(conn, image_id)?;
        Ok(Some(image))
    });

    match outcome {
        Ok(removed) => {
            if removed.is_some() {
                tracing::info!("Removed unowned image");
            }
            Ok(removed)
        }
        Err(e) => {
            tracing::error!(error = %e, "Unowned image removal rolled back");
            Err(DatabaseError::new(DatabaseErrorKind::TransactionFailure(
                e.kind.to_string(),
            )))
        }
    }
}
