//! Base64 (standard alphabet, padded) helpers, as used for SCRAM's nonces,
//! salts, proofs, and channel-binding data.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::Error;

/// Encodes `data` as standard padded base64.
pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes standard padded base64 back to raw bytes.
pub fn decode(s: &str) -> Result<Vec<u8>, Error> {
    Ok(STANDARD.decode(s)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let data = b"hello, scram";
        assert_eq!(decode(&encode(data)).unwrap(), data);
    }

    #[test]
    fn rejects_invalid_input() {
        assert!(decode("not valid base64!!").is_err());
    }
}
