//! The SCRAM cryptographic derivation chain (RFC 5802 §3).
//!
//! `SaltedPassword := Hi(Normalize(password), salt, i)`
//! `ClientKey := HMAC(SaltedPassword, "Client Key")`
//! `StoredKey := H(ClientKey)`
//! `ClientSignature := HMAC(StoredKey, AuthMessage)`
//! `ClientProof := ClientKey XOR ClientSignature`
//! `ServerKey := HMAC(SaltedPassword, "Server Key")`
//! `ServerSignature := HMAC(ServerKey, AuthMessage)`

use std::ops::BitXor;

use hmac::{
    digest::{Digest, FixedOutput, KeyInit},
    Hmac, Mac,
};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::error::Error;

/// The hash function a SCRAM mechanism instance is bound to.
///
/// `SCRAM-SHA-1` is retained for interoperability with legacy peers; new
/// deployments should prefer `SCRAM-SHA-256` or `SCRAM-SHA-512`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// SCRAM-SHA-1 (160-bit digest).
    Sha1,
    /// SCRAM-SHA-256 (256-bit digest).
    Sha256,
    /// SCRAM-SHA-512 (512-bit digest).
    Sha512,
}

impl HashAlgorithm {
    /// The mechanism name suffix used after `SCRAM-`, e.g. `"SHA-256"`.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Sha1 => "SHA-1",
            Self::Sha256 => "SHA-256",
            Self::Sha512 => "SHA-512",
        }
    }

    /// The digest output length in bytes.
    pub fn output_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha512 => 64,
        }
    }

    /// `Hi(password, salt, iterations)`: PBKDF2 with this algorithm's HMAC as
    /// the pseudorandom function, `dkLen` equal to the digest's own length.
    pub fn hi(self, password: &[u8], salt: &[u8], iterations: u32) -> Vec<u8> {
        let mut out = vec![0u8; self.output_len()];
        match self {
            Self::Sha1 => pbkdf2::pbkdf2::<Hmac<Sha1>>(password, salt, iterations, &mut out),
            Self::Sha256 => pbkdf2::pbkdf2::<Hmac<Sha256>>(password, salt, iterations, &mut out),
            Self::Sha512 => pbkdf2::pbkdf2::<Hmac<Sha512>>(password, salt, iterations, &mut out),
        }
        out
    }

    /// `HMAC(key, input)`.
    pub fn hmac(self, key: &[u8], input: &[u8]) -> Result<Vec<u8>, Error> {
        Ok(match self {
            Self::Sha1 => mac::<Hmac<Sha1>>(key, input)?,
            Self::Sha256 => mac::<Hmac<Sha256>>(key, input)?,
            Self::Sha512 => mac::<Hmac<Sha512>>(key, input)?,
        })
    }

    /// `H(input)`.
    pub fn h(self, input: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => hash::<Sha1>(input),
            Self::Sha256 => hash::<Sha256>(input),
            Self::Sha512 => hash::<Sha512>(input),
        }
    }

    /// Derives `SaltedPassword` from a SASLprep-normalized password.
    pub fn salted_password(self, normalized_password: &[u8], salt: &[u8], iterations: u32) -> Vec<u8> {
        self.hi(normalized_password, salt, iterations)
    }

    /// Derives `ClientKey` from `SaltedPassword`.
    pub fn client_key(self, salted_password: &[u8]) -> Result<Vec<u8>, Error> {
        self.hmac(salted_password, b"Client Key")
    }

    /// Derives `StoredKey` from `ClientKey`.
    pub fn stored_key(self, client_key: &[u8]) -> Vec<u8> {
        self.h(client_key)
    }

    /// Derives `ServerKey` from `SaltedPassword`.
    pub fn server_key(self, salted_password: &[u8]) -> Result<Vec<u8>, Error> {
        self.hmac(salted_password, b"Server Key")
    }

    /// Derives `ClientSignature := HMAC(StoredKey, AuthMessage)`.
    pub fn client_signature(self, stored_key: &[u8], auth_message: &[u8]) -> Result<Vec<u8>, Error> {
        self.hmac(stored_key, auth_message)
    }

    /// Derives `ServerSignature := HMAC(ServerKey, AuthMessage)`.
    pub fn server_signature(self, server_key: &[u8], auth_message: &[u8]) -> Result<Vec<u8>, Error> {
        self.hmac(server_key, auth_message)
    }

    /// `ClientProof := ClientKey XOR ClientSignature`.
    pub fn client_proof(self, client_key: &[u8], client_signature: &[u8]) -> Result<Vec<u8>, Error> {
        xor(client_key, client_signature)
    }
}

fn mac<M: Mac + KeyInit>(key: &[u8], input: &[u8]) -> Result<Vec<u8>, Error> {
    let mut m = <M as Mac>::new_from_slice(key)?;
    m.update(input);
    Ok(m.finalize().into_bytes().to_vec())
}

fn hash<D: Digest + FixedOutput>(input: &[u8]) -> Vec<u8> {
    let mut d = D::new();
    d.update(input);
    d.finalize().to_vec()
}

/// Byte-wise XOR of two equal-length buffers.
pub fn xor(lhs: &[u8], rhs: &[u8]) -> Result<Vec<u8>, Error> {
    if lhs.len() != rhs.len() {
        return Err(Error::XorLengthMismatch);
    }
    Ok(lhs.iter().zip(rhs.iter()).map(|(l, r)| l.bitxor(r)).collect())
}

/// Concatenates the three AuthMessage components with the RFC's separating commas.
pub fn auth_message(client_first_bare: &[u8], server_first: &[u8], client_final_without_proof: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(
        client_first_bare.len() + server_first.len() + client_final_without_proof.len() + 2,
    );
    buf.extend_from_slice(client_first_bare);
    buf.push(b',');
    buf.extend_from_slice(server_first);
    buf.push(b',');
    buf.extend_from_slice(client_final_without_proof);
    buf
}

/// Constant-time byte-slice comparison, used for every security-sensitive
/// comparison in the SCRAM state machines (StoredKey derivation checks,
/// ClientProof verification, ServerSignature verification). Short-circuiting
/// `==` on secret-derived material would leak timing information about where
/// the mismatch occurs.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 5802 §5 worked example, SCRAM-SHA-1, user "user" / password "pencil".
    const ITERATIONS: u32 = 4096;
    const PASSWORD: &[u8] = b"pencil";
    const SALT_B64: &str = "QSXCR+Q6sek8bf92";

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn sha1_derivation_chain_is_internally_consistent() {
        let salt = crate::b64::decode(SALT_B64).unwrap();
        let salted = HashAlgorithm::Sha1.salted_password(PASSWORD, &salt, ITERATIONS);
        let client_key = HashAlgorithm::Sha1.client_key(&salted).unwrap();
        let stored_key = HashAlgorithm::Sha1.stored_key(&client_key);
        assert_eq!(stored_key.len(), HashAlgorithm::Sha1.output_len());

        let auth_msg = b"client-first-bare,server-first,client-final-without-proof";
        let client_signature = HashAlgorithm::Sha1.client_signature(&stored_key, auth_msg).unwrap();
        let client_proof = HashAlgorithm::Sha1.client_proof(&client_key, &client_signature).unwrap();

        // A verifier recomputes ClientSignature from StoredKey and recovers
        // ClientKey by XOR-ing the proof back, then checks it hashes to the
        // same StoredKey it started from.
        let recovered_client_key = xor(&client_proof, &client_signature).unwrap();
        assert_eq!(recovered_client_key, client_key);
        assert!(constant_time_eq(&HashAlgorithm::Sha1.stored_key(&recovered_client_key), &stored_key));

        let server_key = HashAlgorithm::Sha1.server_key(&salted).unwrap();
        let server_signature = HashAlgorithm::Sha1.server_signature(&server_key, auth_msg).unwrap();
        assert_eq!(server_signature.len(), HashAlgorithm::Sha1.output_len());
        assert_ne!(server_key, client_key);
    }

    #[test]
    fn client_proof_round_trips_through_xor() {
        let key = vec![1u8, 2, 3, 4];
        let sig = vec![4u8, 3, 2, 1];
        let proof = HashAlgorithm::Sha256.client_proof(&key, &sig).unwrap();
        let recovered = xor(&proof, &sig).unwrap();
        assert_eq!(recovered, key);
    }

    #[test]
    fn xor_rejects_length_mismatch() {
        assert!(xor(&[1, 2, 3], &[1, 2]).is_err());
    }

    #[test]
    fn constant_time_eq_matches_equality() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }

    #[test]
    fn sha256_salted_password_matches_reference() {
        // PBKDF2-HMAC-SHA256, password "pencil", salt "ATHENA.MIT.EDUraeburn", i=4096.
        let salt = b"ATHENA.MIT.EDUraeburn";
        let salted = HashAlgorithm::Sha256.salted_password(PASSWORD, salt, ITERATIONS);
        assert_eq!(
            hex(&salted),
            "93ce7dfda354911328861af885b907feb5aece70953c43cbe697ed2b1e368f95"
        );
    }
}
