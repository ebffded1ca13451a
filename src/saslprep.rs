//! SASLprep (RFC 4013) normalization of usernames and passwords.

use crate::error::Error;

/// Applies SASLprep to a stored-form string (`stringprep::saslprep` profile).
///
/// Per RFC 5802 §5.1, the username sent on the wire is normalized before
/// comparison but is not required to match what was SASLprep'd at
/// registration time; callers that need byte-exact storage keys should
/// normalize both sides consistently. Passwords are always normalized before
/// they enter the derivation chain.
pub fn normalize(s: &str) -> Result<String, Error> {
    Ok(stringprep::saslprep(s)?.into_owned())
}
