//! The SCRAM client and server state machines (RFC 5802).

pub mod client;
pub mod server;

pub use crate::crypto::HashAlgorithm;
pub use client::{ClientState, ScramClientEngine};
pub use server::{ScramServerEngine, ServerState};

/// Iteration count used when deriving fresh SCRAM credentials and no
/// explicit count was configured. RFC 5802 doesn't set a floor; this
/// matches current interop guidance (RFC 7677 §3 recommends at least 4096
/// for SCRAM-SHA-256, and offers no weaker guidance for SHA-1).
pub const DEFAULT_ITERATIONS: u32 = 4096;

/// The floor RFC 7677 §3 recommends for SCRAM-SHA-256; applied uniformly to
/// every hash algorithm this crate supports. A client MUST reject any
/// server-advertised iteration count below this.
pub const MIN_ITERATIONS: u32 = 4096;

/// The mechanism name for a given hash algorithm, e.g. `"SCRAM-SHA-256"`.
pub fn mechanism_name(algo: HashAlgorithm) -> String {
    format!("SCRAM-{}", algo.suffix())
}
