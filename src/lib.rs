//! Pluggable SASL authentication: ANONYMOUS (RFC 4505), PLAIN (RFC 4616), and
//! SCRAM-SHA-1 / SCRAM-SHA-256 / SCRAM-SHA-512 (RFC 5802) with GS2 framing
//! (RFC 5801).
//!
//! This crate implements the mechanism-agnostic core: message parsing and
//! serialization, the cryptographic derivation chain, the two-round-trip
//! state machines for both the initiator (client) and responder (server)
//! role, and the credential-lookup boundary the responder side consumes.
//! Transport, framing below SASL, and persistent credential storage are the
//! caller's responsibility; this crate only turns bytes into bytes.
#![deny(missing_debug_implementations)]

pub mod attr;
pub mod b64;
pub mod credential;
pub mod crypto;
pub mod error;
pub mod gs2;
pub mod manager;
pub mod mechanism;
pub mod mechanisms;
pub mod message;
pub mod name;
pub mod registry;
pub mod rand;
pub mod saslprep;
pub mod scram;

pub use crate::credential::{Credential, CredentialQuery, CredentialSecret, CredentialStore};
pub use crate::error::{Error, ProtocolError};
pub use crate::manager::AuthManager;
pub use crate::mechanism::{MechanismContext, Role};
pub use crate::registry::{MechanismRegistry, StartOptions};
pub use crate::scram::HashAlgorithm;
