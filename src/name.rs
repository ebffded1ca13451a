//! SCRAM/GS2 `saslname` escaping (RFC 5802 §5.1).
//!
//! `=` and `,` cannot appear literally in a SASL name because `,` is the
//! attribute separator and `=` the key/value separator. Both are escaped to
//! a `=XX` form that can't collide with real data.

/// Encodes a username for use as a SCRAM `saslname`.
///
/// `=` is replaced first so the `=3D` it produces is never itself re-escaped.
pub fn encode_name(name: &str) -> String {
    name.replace('=', "=3D").replace(',', "=2C")
}

/// Decodes a `saslname` produced by [`encode_name`] back to its original form.
pub fn decode_name(name: &str) -> String {
    name.replace("=2C", ",").replace("=3D", "=")
}
