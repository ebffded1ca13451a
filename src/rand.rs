//! Cryptographic nonce and salt generation.

use rand::{rngs::OsRng, RngCore};

use crate::error::Error;

/// Default length of the client's initial nonce (printable ASCII code points).
pub const DEFAULT_CLIENT_NONCE_LEN: usize = 24;

/// Default length of the server's additional nonce contribution, so that a
/// combined `r` (client nonce + server nonce) is 40 characters.
pub const DEFAULT_SERVER_NONCE_LEN: usize = 16;

/// Default salt length in raw bytes.
pub const DEFAULT_SALT_LEN: usize = 16;

const NONCE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Draws a printable-ASCII nonce of exactly `len` characters from `[A-Za-z0-9]`.
pub fn new_nonce(len: usize) -> Result<String, Error> {
    let mut raw = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut raw)
        .map_err(|e| Error::Rng(e.to_string()))?;
    Ok(raw
        .into_iter()
        .map(|b| NONCE_ALPHABET[b as usize % NONCE_ALPHABET.len()] as char)
        .collect())
}

/// Draws `len` raw random bytes, suitable for use as a SCRAM salt.
pub fn new_salt(len: usize) -> Result<Vec<u8>, Error> {
    let mut buf = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| Error::Rng(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonce_has_requested_length_and_alphabet() {
        let nonce = new_nonce(DEFAULT_CLIENT_NONCE_LEN).unwrap();
        assert_eq!(nonce.len(), DEFAULT_CLIENT_NONCE_LEN);
        assert!(nonce
            .bytes()
            .all(|b| b.is_ascii_alphanumeric()));
    }

    #[test]
    fn salt_has_requested_length() {
        let salt = new_salt(DEFAULT_SALT_LEN).unwrap();
        assert_eq!(salt.len(), DEFAULT_SALT_LEN);
    }

    #[test]
    fn draws_are_not_constant() {
        let a = new_nonce(DEFAULT_CLIENT_NONCE_LEN).unwrap();
        let b = new_nonce(DEFAULT_CLIENT_NONCE_LEN).unwrap();
        assert_ne!(a, b);
    }
}
