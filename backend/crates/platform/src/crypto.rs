//! Cryptographic Utilities

use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// The OS random source refused to produce bytes.
#[derive(Debug, Error)]
#[error("secure random source unavailable: {0}")]
pub struct EntropyError(#[from] rand::Error);

/// Fill `len` bytes from the OS CSPRNG.
pub fn try_random_bytes(len: usize) -> Result<Vec<u8>, EntropyError> {
    let mut bytes = vec![0u8; len];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(bytes)
}

/// `len` random bytes, lowercase hex encoded (`2 * len` chars).
pub fn random_hex(len: usize) -> Result<String, EntropyError> {
    try_random_bytes(len).map(hex::encode)
}

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_values() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            sha256_hex(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_random_hex_shape() {
        let token = random_hex(32).unwrap();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(token, random_hex(32).unwrap());
    }
}
