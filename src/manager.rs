//! [`AuthManager`]: the top-level seam an application embeds, pairing a
//! [`MechanismRegistry`] with the [`CredentialStore`] that backs server-role
//! mechanisms.

use std::sync::Arc;

use crate::credential::CredentialStore;
use crate::error::Error;
use crate::mechanism::{MechanismContext, Role};
use crate::registry::{MechanismRegistry, StartOptions};

/// Owns the default mechanism registry plus an optional credential store,
/// and is the one object most embedders need to hold onto.
///
/// A manager with no store can still drive client-role mechanisms, or
/// ANONYMOUS on the server side; any other server-role `start` fails with
/// [`Error::NoCredentialStore`].
#[derive(Clone)]
pub struct AuthManager {
    registry: MechanismRegistry,
    store: Option<Arc<dyn CredentialStore>>,
}

impl std::fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthManager")
            .field("registry", &self.registry)
            .field("store", &self.store.is_some())
            .finish()
    }
}

impl AuthManager {
    /// Builds a manager backed by `store`, with the default mechanism set
    /// (ANONYMOUS, PLAIN, SCRAM-SHA-1/256/512) registered.
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { registry: MechanismRegistry::new(), store: Some(store) }
    }

    /// Builds a manager with no credential store, suitable for a
    /// client-only embedder.
    pub fn without_store() -> Self {
        Self { registry: MechanismRegistry::new(), store: None }
    }

    /// The mechanism names this manager can start, in advertisement order.
    pub fn mechanisms(&self) -> &[&'static str] {
        self.registry.names()
    }

    /// Starts a fresh exchange for the named mechanism in the given role.
    pub fn start(&self, mechanism: &str, role: Role, options: &StartOptions) -> Result<Box<dyn MechanismContext>, Error> {
        self.registry.start(mechanism, role, self.store.clone(), options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::{Credential, CredentialQuery, CredentialSecret};

    struct OneUser;
    impl CredentialStore for OneUser {
        fn lookup(&self, query: &CredentialQuery) -> Result<Option<Credential>, Error> {
            if query.username == "user" {
                Ok(Some(Credential {
                    username: "user".to_string(),
                    secret: CredentialSecret::Cleartext("pencil".to_string().into()),
                    iterations: Some(4096),
                }))
            } else {
                Ok(None)
            }
        }
    }

    #[test]
    fn advertises_default_mechanisms() {
        let manager = AuthManager::new(Arc::new(OneUser));
        assert_eq!(
            manager.mechanisms(),
            &["ANONYMOUS", "PLAIN", "SCRAM-SHA-1", "SCRAM-SHA-256", "SCRAM-SHA-512"]
        );
    }

    #[test]
    fn without_store_still_allows_anonymous_server() {
        let manager = AuthManager::without_store();
        assert!(manager.start("ANONYMOUS", Role::Server, &StartOptions::new()).is_ok());
    }

    #[test]
    fn without_store_rejects_scram_server() {
        let manager = AuthManager::without_store();
        let err = manager
            .start("SCRAM-SHA-256", Role::Server, &StartOptions::new())
            .unwrap_err();
        assert!(matches!(err, Error::NoCredentialStore));
    }

    #[test]
    fn full_plain_exchange_through_the_manager() {
        let manager = AuthManager::new(Arc::new(OneUser));
        let options = StartOptions::new().with_text("authcid", "user").with_text("password", "pencil");
        let mut client = manager.start("PLAIN", Role::Client, &options).unwrap();
        let mut server = manager.start("PLAIN", Role::Server, &StartOptions::new()).unwrap();

        let msg = client.next(None).unwrap().unwrap();
        assert!(server.next(Some(&msg)).unwrap().is_none());
        assert!(server.done());
    }
}
