//! Error taxonomy.
//!
//! Two layers, matching the teacher's `ScramErrorKind` / `ServerScramErrorKind`
//! split: [`ProtocolError`] is the closed RFC 5802 §9 `e=` set that is
//! actually carried on the wire, and [`Error`] is everything else — decoding
//! failures, out-of-sequence calls, and credential-store wiring problems that
//! never leave the process as an `e=` value.

use std::str::Utf8Error;

use base64::DecodeError;
use hmac::digest::InvalidLength;

/// The closed set of `e=` error names defined by RFC 5802 §9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The message did not parse per the SCRAM/GS2 grammar.
    #[error("invalid-encoding")]
    InvalidEncoding,

    /// An `m=` extension attribute was present.
    #[error("extensions-not-supported")]
    ExtensionsNotSupported,

    /// The client proof did not verify.
    #[error("invalid-proof")]
    InvalidProof,

    /// The channel-binding data did not match what the server computed.
    #[error("channel-bindings-dont-match")]
    ChannelBindingsDontMatch,

    /// The server does not support channel binding but the client demanded it.
    #[error("server-does-not-support-channel-binding")]
    ServerDoesNotSupportChannelBinding,

    /// Channel binding is not supported at all.
    #[error("channel-binding-not-supported")]
    ChannelBindingNotSupported,

    /// The requested channel-binding type is not supported.
    #[error("unsupported-channel-binding-type")]
    UnsupportedChannelBindingType,

    /// No credential could be resolved for the claimed identity. Also used
    /// to mask transient credential-store failures, to avoid letting a peer
    /// distinguish "no such user" from "lookup failed" by username enumeration.
    #[error("unknown-user")]
    UnknownUser,

    /// The username could not be decoded per the name codec.
    #[error("invalid-username-encoding")]
    InvalidUsernameEncoding,

    /// The server is out of resources to continue the exchange.
    #[error("no-resources")]
    NoResources,

    /// Catch-all for authentication failure and nonce/prefix mismatches.
    #[error("other-error")]
    OtherError,
}

impl ProtocolError {
    /// The wire representation, as it appears after `e=`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidEncoding => "invalid-encoding",
            Self::ExtensionsNotSupported => "extensions-not-supported",
            Self::InvalidProof => "invalid-proof",
            Self::ChannelBindingsDontMatch => "channel-bindings-dont-match",
            Self::ServerDoesNotSupportChannelBinding => "server-does-not-support-channel-binding",
            Self::ChannelBindingNotSupported => "channel-binding-not-supported",
            Self::UnsupportedChannelBindingType => "unsupported-channel-binding-type",
            Self::UnknownUser => "unknown-user",
            Self::InvalidUsernameEncoding => "invalid-username-encoding",
            Self::NoResources => "no-resources",
            Self::OtherError => "other-error",
        }
    }

    /// Parses an `e=` value back into its typed form. Unknown names are not
    /// rejected by the RFC; they still surface as [`ProtocolError::OtherError`]
    /// so a peer that doesn't recognize a vendor extension error still fails
    /// the exchange.
    pub fn parse(s: &str) -> Self {
        match s {
            "invalid-encoding" => Self::InvalidEncoding,
            "extensions-not-supported" => Self::ExtensionsNotSupported,
            "invalid-proof" => Self::InvalidProof,
            "channel-bindings-dont-match" => Self::ChannelBindingsDontMatch,
            "server-does-not-support-channel-binding" => Self::ServerDoesNotSupportChannelBinding,
            "channel-binding-not-supported" => Self::ChannelBindingNotSupported,
            "unsupported-channel-binding-type" => Self::UnsupportedChannelBindingType,
            "unknown-user" => Self::UnknownUser,
            "invalid-username-encoding" => Self::InvalidUsernameEncoding,
            "no-resources" => Self::NoResources,
            _ => Self::OtherError,
        }
    }
}

/// Interface-level errors. These never cross the wire as `e=`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No [`CredentialStore`](crate::credential::CredentialStore) was
    /// configured for a responder mechanism that needs one.
    #[error("no credential store configured")]
    NoCredentialStore,

    /// `AuthManager`/`MechanismRegistry` was asked to start a mechanism it
    /// doesn't know about.
    #[error("unsupported mechanism: {0}")]
    UnsupportedMechanism(String),

    /// `Context::next` was called out of sequence.
    #[error("invalid step: expected {expected}, got {got}")]
    InvalidStep {
        /// The step the context was actually at.
        expected: u32,
        /// The step implied by the call (always equal to `expected` in
        /// today's single-path contexts; kept distinct for forwards
        /// compatibility with mechanisms that might accept more than one
        /// valid next step).
        got: u32,
    },

    /// A payload was missing where one was required, or present where none
    /// was expected.
    #[error("invalid message")]
    InvalidMessage,

    /// An attribute token used a key outside the accepted set.
    #[error("invalid attribute: {0:?}")]
    InvalidAttribute(char),

    /// A server-side configuration was invalid, e.g. an iteration-count
    /// default below the RFC floor.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),

    /// A protocol-fatal condition. Carries the `e=` value it should be
    /// rendered as, for mechanisms/roles that put it on the wire.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A wire field failed UTF-8 decoding.
    #[error(transparent)]
    Utf8(#[from] Utf8Error),

    /// A base64 field failed to decode.
    #[error(transparent)]
    Base64(#[from] DecodeError),

    /// `Mac::new_from_slice` rejected a key length.
    #[error(transparent)]
    Hmac(#[from] InvalidLength),

    /// SASLprep normalization failed.
    #[error(transparent)]
    Normalize(#[from] stringprep::Error),

    /// `XOR` was asked to combine operands of different lengths.
    #[error("mismatched XOR operand lengths")]
    XorLengthMismatch,

    /// The cryptographic random source failed to produce output.
    #[error("random source failure: {0}")]
    Rng(String),
}
