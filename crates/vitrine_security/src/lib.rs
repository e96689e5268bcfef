//! Capability tokens for public image URLs.
//!
//! A token binds one ownership row's `(updated_time, image_id, user_id)`
//! under a process-wide key. Nothing is stored: a token stays valid exactly
//! as long as the row it was issued from is unchanged, so flipping an
//! image's visibility revokes every outstanding link.
//!
//! # Examples
//!
//! ```
//! use vitrine_core::now_millis;
//! use vitrine_security::{SecretKey, TokenCodec};
//!
//! let codec = TokenCodec::new(&SecretKey::generate());
//! let updated = now_millis();
//! let token = codec.issue(&updated, 7, 42).unwrap();
//!
//! let claims = codec.verify(&token).unwrap();
//! assert_eq!(*claims.image_id(), 7);
//! assert_eq!(*claims.user_id(), 42);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod key;
mod token;

pub use key::{SecretKey, KEY_LEN};
pub use token::{TokenClaims, TokenCodec, TOKEN_VERSION};
