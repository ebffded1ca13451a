//! Mechanism adapters wiring each concrete mechanism to [`crate::mechanism::MechanismContext`].

pub mod anonymous;
pub mod plain;
pub mod scram;

pub use anonymous::AnonymousContext;
pub use plain::{PlainClientContext, PlainServerContext};
pub use scram::{ScramClientContext, ScramServerContext};
