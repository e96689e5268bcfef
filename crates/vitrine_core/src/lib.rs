//! Core record types for the Vitrine image store.
//!
//! This crate provides the typed records shared by the storage, database and
//! service layers: canonical [`Image`] blobs, per-user [`Ownership`] edges,
//! listing queries and the views handed to a transport.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod image;
mod ownership;
mod query;
mod time;
mod view;

pub use image::Image;
pub use ownership::Ownership;
pub use query::{ImageFilter, ListQuery, ListQueryBuilder, OrderBy, MAX_PAGE_LIMIT};
pub use time::{from_millis, now_millis, to_millis};
pub use view::{ImageFile, ImageView, Variant};
