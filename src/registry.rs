//! Mechanism name resolution: turns a mechanism name and a role into a
//! ready-to-drive [`MechanismContext`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::credential::CredentialStore;
use crate::crypto::HashAlgorithm;
use crate::error::Error;
use crate::mechanism::{MechanismContext, Role};
use crate::mechanisms::{AnonymousContext, PlainClientContext, PlainServerContext, ScramClientContext, ScramServerContext};

/// A single named option passed to [`MechanismRegistry::start`].
#[derive(Debug, Clone)]
pub enum OptionValue {
    Text(String),
    Bytes(Vec<u8>),
}

/// The bag of mechanism-specific parameters a caller supplies at start time
/// (usernames, passwords, authzids, trace info — whatever the chosen
/// mechanism and role need). Unknown keys are ignored; missing required keys
/// fail with [`Error::InvalidConfiguration`].
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    values: HashMap<String, OptionValue>,
}

impl StartOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), OptionValue::Text(value.into()));
        self
    }

    pub fn with_bytes(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.values.insert(key.into(), OptionValue::Bytes(value.into()));
        self
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(OptionValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn bytes(&self, key: &str) -> Option<&[u8]> {
        match self.values.get(key) {
            Some(OptionValue::Bytes(b)) => Some(b.as_slice()),
            _ => None,
        }
    }

    fn require_text(&self, key: &'static str) -> Result<&str, Error> {
        self.text(key)
            .ok_or(Error::InvalidConfiguration(key))
    }
}

/// Resolves mechanism names to mechanism-context factories.
///
/// Built with the default set this crate implements; callers don't extend it
/// with custom mechanisms today, but the `supports`/`names` surface is kept
/// separate from `start` so that could change without breaking callers.
#[derive(Debug, Clone)]
pub struct MechanismRegistry {
    names: Vec<&'static str>,
}

impl Default for MechanismRegistry {
    fn default() -> Self {
        Self {
            names: vec![
                "ANONYMOUS",
                "PLAIN",
                "SCRAM-SHA-1",
                "SCRAM-SHA-256",
                "SCRAM-SHA-512",
            ],
        }
    }
}

impl MechanismRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mechanism names this registry knows, in advertisement order.
    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    pub fn supports(&self, name: &str) -> bool {
        self.names.iter().any(|n| *n == name)
    }

    /// Builds a fresh [`MechanismContext`] for `name` in the given `role`.
    ///
    /// `store` is required for any server-role mechanism other than
    /// ANONYMOUS, which performs no credential lookup at all.
    pub fn start(
        &self,
        name: &str,
        role: Role,
        store: Option<Arc<dyn CredentialStore>>,
        options: &StartOptions,
    ) -> Result<Box<dyn MechanismContext>, Error> {
        let algo = match name {
            "SCRAM-SHA-1" => Some(HashAlgorithm::Sha1),
            "SCRAM-SHA-256" => Some(HashAlgorithm::Sha256),
            "SCRAM-SHA-512" => Some(HashAlgorithm::Sha512),
            _ => None,
        };

        match (name, role) {
            ("ANONYMOUS", Role::Client) => {
                let trace = options.text("trace_info").map(str::to_string);
                Ok(Box::new(AnonymousContext::client(trace)))
            }
            ("ANONYMOUS", Role::Server) => Ok(Box::new(AnonymousContext::server())),

            ("PLAIN", Role::Client) => {
                let authzid = options.text("authzid").unwrap_or("").to_string();
                let authcid = options.require_text("authcid")?.to_string();
                let password = options.require_text("password")?.to_string();
                Ok(Box::new(PlainClientContext::new(authzid, authcid, password)))
            }
            ("PLAIN", Role::Server) => {
                let store = store.ok_or(Error::NoCredentialStore)?;
                Ok(Box::new(PlainServerContext::new(store)))
            }

            (_, Role::Client) if algo.is_some() => {
                let username = options.require_text("username")?.to_string();
                let password = options.require_text("password")?.to_string();
                let mut ctx = ScramClientContext::new(username, password, algo.unwrap());
                if let Some(nonce) = options.text("random_sequence") {
                    ctx = ctx.with_fixed_nonce(nonce);
                }
                Ok(Box::new(ctx))
            }
            (_, Role::Server) if algo.is_some() => {
                let store = store.ok_or(Error::NoCredentialStore)?;
                let mut ctx = ScramServerContext::new(store, algo.unwrap());
                if let Some(nonce) = options.text("random_sequence") {
                    ctx = ctx.with_fixed_nonce(nonce);
                }
                if let Some(salt_b64) = options.text("salt") {
                    let salt = crate::b64::decode(salt_b64).map_err(|_| Error::InvalidConfiguration("salt"))?;
                    ctx = ctx.with_fixed_salt(salt);
                }
                Ok(Box::new(ctx))
            }

            _ => Err(Error::UnsupportedMechanism(name.to_string())),
        }
    }
}
