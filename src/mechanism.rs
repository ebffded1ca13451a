//! The mechanism-agnostic context every SASL mechanism adapter implements.

use crate::error::Error;

/// Which side of the exchange a [`MechanismContext`] is playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The party presenting credentials.
    Client,
    /// The party verifying them.
    Server,
}

/// A single mechanism instance driving one authentication exchange.
///
/// Every mechanism, regardless of how many round trips it actually needs,
/// exposes the same step-driven shape: feed it the peer's last message (or
/// nothing, for the very first client step), get back the next message to
/// send, and ask whether the exchange has concluded.
pub trait MechanismContext: std::fmt::Debug + Send {
    /// Which role this instance is playing.
    fn role(&self) -> Role;

    /// Computes the next message to send, given the peer's last message
    /// (`None` only for a client's very first step). Returns `Ok(None)` when
    /// this mechanism has nothing further to send but isn't finished (e.g. a
    /// server that accepted silently). Returns `Err` for both protocol
    /// failures (wrapping a [`crate::error::ProtocolError`]) and interface
    /// failures.
    fn next(&mut self, input: Option<&[u8]>) -> Result<Option<Vec<u8>>, Error>;

    /// True once the exchange has reached a terminal state, successfully or
    /// not. Once `done()` returns true, `next` must not be called again.
    fn done(&self) -> bool;

    /// How many messages this context has produced/consumed so far, starting
    /// at 0 before the first call to `next`.
    fn step(&self) -> u32;

    /// Releases any sensitive material this context still holds (password
    /// copies, derived keys) ahead of the context being dropped. Mechanisms
    /// that don't hold long-lived secrets may leave this a no-op.
    fn dispose(&mut self) {}
}
