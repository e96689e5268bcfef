//! Content hashing.

use sha2::{Digest, Sha256};

/// Compute the lower-case hex SHA-256 of `data`.
pub fn compute_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_lowercase_hex() {
        let hash = compute_hash(b"vitrine");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash.to_lowercase());
        assert_eq!(hash, compute_hash(b"vitrine"));
        assert_ne!(hash, compute_hash(b"vitrine!"));
    }
}
