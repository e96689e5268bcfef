//! Token key material.

use rand::RngCore;
use vitrine_error::ConfigError;
use zeroize::ZeroizeOnDrop;

/// Key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// 256-bit key that zeroizes on drop.
#[derive(Clone, ZeroizeOnDrop)]
pub struct SecretKey {
    bytes: [u8; KEY_LEN],
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

impl SecretKey {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// A fresh random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Parse a key from 64 hex characters.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not valid hex or not exactly 32 bytes.
    pub fn from_hex(encoded: &str) -> Result<Self, ConfigError> {
        let decoded = zeroize::Zeroizing::new(
            hex::decode(encoded.trim())
                .map_err(|e| ConfigError::new(format!("token_key is not valid hex: {}", e)))?,
        );

        let bytes: [u8; KEY_LEN] = decoded.as_slice().try_into().map_err(|_| {
            ConfigError::new(format!(
                "token_key must be {} hex characters, got {}",
                KEY_LEN * 2,
                encoded.trim().len()
            ))
        })?;
        Ok(Self { bytes })
    }

    /// Hex encoding, for printing a generated key.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}
