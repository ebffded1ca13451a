//! The credential-lookup boundary the responder (server) role consumes.
//!
//! This crate never persists credentials itself. A [`CredentialStore`] is
//! the caller's adapter onto whatever actually holds them — a database, a
//! config file, an in-memory map for tests.

use zeroize::Zeroizing;

use crate::crypto::HashAlgorithm;
use crate::error::Error;

/// What a mechanism asks a [`CredentialStore`] to look up.
#[derive(Debug, Clone)]
pub struct CredentialQuery {
    /// The SASLprep-normalized, name-decoded username from the wire.
    pub username: String,
    /// The authorization identity (`a=` in the GS2 header), if the client
    /// sent one. `None` means "authenticate as and act as `username`".
    pub authzid: Option<String>,
}

/// Pre-derived SCRAM material for one hash algorithm, as produced once at
/// registration time instead of re-running PBKDF2 on every authentication.
#[derive(Debug, Clone)]
pub struct ScramSecret {
    pub algo: HashAlgorithm,
    pub salt: Vec<u8>,
    pub iterations: u32,
    pub stored_key: Vec<u8>,
    pub server_key: Vec<u8>,
}

/// The secret material backing a credential, in whichever form the store
/// happens to hold it.
#[derive(Debug, Clone)]
pub enum CredentialSecret {
    /// A cleartext password. PLAIN compares it directly; SCRAM derives
    /// `SaltedPassword`/`StoredKey`/`ServerKey` from it on the fly using a
    /// freshly generated salt, bearing the PBKDF2 cost on every exchange.
    Cleartext(Zeroizing<String>),
    /// Material already derived for one specific hash algorithm. Used when
    /// the store can hold pre-computed SCRAM secrets (the common case for a
    /// real deployment, since it lets the plaintext password be discarded
    /// after registration).
    Scram(ScramSecret),
}

/// A resolved credential, as returned by [`CredentialStore::lookup`].
#[derive(Debug, Clone)]
pub struct Credential {
    pub username: String,
    pub secret: CredentialSecret,
    /// Iteration count to use when this credential's secret is
    /// [`CredentialSecret::Cleartext`] and must be salted on demand. Ignored
    /// when the secret is already [`CredentialSecret::Scram`].
    pub iterations: Option<u32>,
}

/// The seam between this crate's mechanisms and wherever credentials
/// actually live.
///
/// `lookup` is tri-state by design: `Ok(None)` (no such user) and `Err(_)`
/// (store unavailable) both collapse to the same `unknown-user` wire error
/// at the call site, so a peer cannot distinguish "no such account" from "the
/// backing store is down" by timing or response shape.
pub trait CredentialStore: Send + Sync {
    fn lookup(&self, query: &CredentialQuery) -> Result<Option<Credential>, Error>;
}

impl<T: CredentialStore + ?Sized> CredentialStore for std::sync::Arc<T> {
    fn lookup(&self, query: &CredentialQuery) -> Result<Option<Credential>, Error> {
        (**self).lookup(query)
    }
}

/// Resolves a [`Credential`] down to the `(salt, iterations, stored_key,
/// server_key)` tuple a SCRAM server engine needs for one specific hash
/// algorithm, deriving on the fly from a cleartext secret if necessary.
pub fn resolve_scram_material(
    credential: &Credential,
    algo: HashAlgorithm,
) -> Result<(Vec<u8>, u32, Vec<u8>, Vec<u8>), Error> {
    resolve_scram_material_with_salt(credential, algo, None)
}

/// As [`resolve_scram_material`], but when deriving on the fly from a
/// cleartext secret, `fixed_salt` (when given) is used in place of a freshly
/// drawn one. Ignored when the credential already carries pre-derived
/// material, since that material's salt was already fixed at registration
/// time. Exists so a test-only `Salt` start option can reproduce a known
/// derivation end to end instead of only ever exercising a random one.
pub fn resolve_scram_material_with_salt(
    credential: &Credential,
    algo: HashAlgorithm,
    fixed_salt: Option<&[u8]>,
) -> Result<(Vec<u8>, u32, Vec<u8>, Vec<u8>), Error> {
    match &credential.secret {
        CredentialSecret::Scram(secret) if secret.algo == algo => Ok((
            secret.salt.clone(),
            secret.iterations,
            secret.stored_key.clone(),
            secret.server_key.clone(),
        )),
        CredentialSecret::Scram(_) | CredentialSecret::Cleartext(_) => {
            let password = match &credential.secret {
                CredentialSecret::Cleartext(p) => p.clone(),
                // A pre-derived secret for a *different* algorithm carries no
                // recoverable password; a store that mixes algorithms must
                // supply one `CredentialSecret::Scram` per algorithm it wants
                // to support.
                CredentialSecret::Scram(_) => {
                    return Err(Error::InvalidConfiguration(
                        "credential has no material for the requested hash algorithm",
                    ))
                }
            };
            let normalized = crate::saslprep::normalize(&password)?;
            let salt = match fixed_salt {
                Some(s) => s.to_vec(),
                None => crate::rand::new_salt(crate::rand::DEFAULT_SALT_LEN)?,
            };
            let iterations = credential.iterations.unwrap_or(crate::scram::DEFAULT_ITERATIONS);
            let salted = algo.salted_password(normalized.as_bytes(), &salt, iterations);
            let client_key = algo.client_key(&salted)?;
            let stored_key = algo.stored_key(&client_key);
            let server_key = algo.server_key(&salted)?;
            Ok((salt, iterations, stored_key, server_key))
        }
    }
}

/// Verifies a presented cleartext password against a credential's secret,
/// for mechanisms (PLAIN, ANONYMOUS-adjacent custom mechanisms) that present
/// the password directly rather than proving knowledge of it.
///
/// When the secret is already a derived [`CredentialSecret::Scram`], the
/// presented password is salted with that secret's own salt/iterations and
/// the resulting `StoredKey` is compared, so stores that only ever keep
/// derived material never need to retain a comparable cleartext copy.
pub fn verify_password(credential: &Credential, presented: &str) -> Result<bool, Error> {
    let normalized = crate::saslprep::normalize(presented)?;
    match &credential.secret {
        CredentialSecret::Cleartext(expected) => {
            let normalized_expected = crate::saslprep::normalize(expected)?;
            Ok(crate::crypto::constant_time_eq(
                normalized.as_bytes(),
                normalized_expected.as_bytes(),
            ))
        }
        CredentialSecret::Scram(secret) => {
            let salted = secret.algo.salted_password(normalized.as_bytes(), &secret.salt, secret.iterations);
            let client_key = secret.algo.client_key(&salted)?;
            let stored_key = secret.algo.stored_key(&client_key);
            Ok(crate::crypto::constant_time_eq(&stored_key, &secret.stored_key))
        }
    }
}
