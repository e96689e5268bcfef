//! Issue and verify capability tokens.
//!
//! Wire format: URL-safe base64 (no padding) of
//! `version ‖ nonce(12) ‖ AES-256-GCM(ciphertext ‖ tag)`, where the
//! plaintext is `{updated_ms}.{image_id}.{user_id}`.

use crate::SecretKey;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::RngCore;
use vitrine_core::{to_millis, Ownership};
use vitrine_error::TokenError;

/// Envelope version byte.
pub const TOKEN_VERSION: u8 = 1;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Fields recovered from a valid token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_getters::Getters)]
pub struct TokenClaims {
    /// `updated_time` of the ownership row, in epoch milliseconds
    updated_ms: i64,
    /// Image the token grants access to
    image_id: i64,
    /// Owner who published it
    user_id: i64,
}

impl TokenClaims {
    /// Whether `ownership` is the public row this token was issued from,
    /// unchanged since issue.
    pub fn matches(&self, ownership: &Ownership) -> bool {
        ownership.user_id == self.user_id
            && ownership.image_id == self.image_id
            && ownership.is_public()
            && to_millis(&ownership.updated_time) == self.updated_ms
    }

    fn parse(plaintext: &str) -> Option<Self> {
        let mut fields = plaintext.split('.');
        let updated_ms = fields.next()?.parse().ok()?;
        let image_id = fields.next()?.parse().ok()?;
        let user_id = fields.next()?.parse().ok()?;
        if fields.next().is_some() {
            return None;
        }
        Some(Self {
            updated_ms,
            image_id,
            user_id,
        })
    }
}

/// Stateless token issuer and verifier.
#[derive(Clone)]
pub struct TokenCodec {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Create a codec keyed with `key`.
    pub fn new(key: &SecretKey) -> Self {
        Self {
            cipher: Aes256Gcm::new(key.as_bytes().into()),
        }
    }

    /// Issue a token for one ownership row's current state.
    ///
    /// # Errors
    ///
    /// Returns an error only if the cipher rejects the input.
    pub fn issue(
        &self,
        updated_time: &DateTime<Utc>,
        image_id: i64,
        user_id: i64,
    ) -> Result<String, TokenError> {
        let plaintext = format!("{}.{}.{}", to_millis(updated_time), image_id, user_id);

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|_| TokenError::new())?;

        let mut envelope = Vec::with_capacity(1 + NONCE_LEN + ciphertext.len());
        envelope.push(TOKEN_VERSION);
        envelope.extend_from_slice(&nonce_bytes);
        envelope.extend_from_slice(&ciphertext);

        Ok(URL_SAFE_NO_PAD.encode(envelope))
    }

    /// Recover the claims from a token.
    ///
    /// Does not consult any ownership row; callers compare the claims with
    /// current state using [`TokenClaims::matches`].
    ///
    /// # Errors
    ///
    /// Returns [`TokenError`] for every kind of malformed, forged or
    /// corrupted token. The reason is only logged.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.open(token).map_err(|reason| {
            tracing::debug!(reason, "Rejected token");
            TokenError::new()
        })
    }

    fn open(&self, token: &str) -> Result<TokenClaims, &'static str> {
        let envelope = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| "not url-safe base64")?;

        if envelope.len() < 1 + NONCE_LEN + TAG_LEN {
            return Err("envelope too short");
        }
        let (version, rest) = envelope.split_at(1);
        if version[0] != TOKEN_VERSION {
            return Err("unsupported version");
        }
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| "authentication failed")?;
        let plaintext = String::from_utf8(plaintext).map_err(|_| "plaintext is not utf-8")?;

        TokenClaims::parse(&plaintext).ok_or("malformed claims")
    }
}
