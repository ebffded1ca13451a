//! Adapts [`ScramClientEngine`]/[`ScramServerEngine`] to [`MechanismContext`].

use std::sync::Arc;

use crate::credential::CredentialStore;
use crate::crypto::HashAlgorithm;
use crate::error::{Error, ProtocolError};
use crate::mechanism::{MechanismContext, Role};
use crate::message::ServerFinal;
use crate::scram::{ScramClientEngine, ScramServerEngine};

/// SCRAM client: two round trips driven through [`ScramClientEngine`].
#[derive(Debug)]
pub struct ScramClientContext {
    engine: ScramClientEngine,
    step: u32,
}

impl ScramClientContext {
    pub fn new(username: impl Into<String>, password: impl Into<String>, algo: HashAlgorithm) -> Self {
        Self { engine: ScramClientEngine::new(username, password, algo), step: 0 }
    }

    /// Test-only: fixes the client nonce instead of drawing a random one.
    pub fn with_fixed_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.engine = self.engine.with_fixed_nonce(nonce);
        self
    }
}

impl MechanismContext for ScramClientContext {
    fn role(&self) -> Role {
        Role::Client
    }

    fn next(&mut self, input: Option<&[u8]>) -> Result<Option<Vec<u8>>, Error> {
        match self.step {
            0 => {
                let msg = self.engine.client_first()?;
                self.step = 1;
                Ok(Some(msg.into_bytes()))
            }
            1 => {
                let server_first = input.ok_or(Error::InvalidMessage)?;
                let server_first = std::str::from_utf8(server_first)?;
                let msg = self.engine.client_final(server_first)?;
                self.step = 2;
                Ok(Some(msg.into_bytes()))
            }
            2 => {
                let server_final = input.ok_or(Error::InvalidMessage)?;
                let server_final = std::str::from_utf8(server_final)?;
                self.engine.handle_server_final(server_final)?;
                self.step = 3;
                Ok(None)
            }
            _ => Err(Error::InvalidStep { expected: self.step, got: self.step + 1 }),
        }
    }

    fn done(&self) -> bool {
        self.engine.is_done()
    }

    fn step(&self) -> u32 {
        self.step
    }
}

/// SCRAM server: two round trips driven through [`ScramServerEngine`].
#[derive(Debug)]
pub struct ScramServerContext {
    engine: ScramServerEngine,
    step: u32,
}

impl ScramServerContext {
    pub fn new(store: Arc<dyn CredentialStore>, algo: HashAlgorithm) -> Self {
        Self { engine: ScramServerEngine::new(store, algo), step: 0 }
    }

    /// Test-only: fixes the server's nonce contribution instead of drawing a
    /// random one.
    pub fn with_fixed_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.engine = self.engine.with_fixed_nonce(nonce);
        self
    }

    /// Test-only: fixes the salt used when deriving SCRAM material on the
    /// fly from a cleartext credential.
    pub fn with_fixed_salt(mut self, salt: Vec<u8>) -> Self {
        self.engine = self.engine.with_fixed_salt(salt);
        self
    }
}

impl MechanismContext for ScramServerContext {
    fn role(&self) -> Role {
        Role::Server
    }

    fn next(&mut self, input: Option<&[u8]>) -> Result<Option<Vec<u8>>, Error> {
        match self.step {
            0 => {
                let client_first = input.ok_or(Error::InvalidMessage)?;
                let client_first = std::str::from_utf8(client_first)?;
                let result = self.engine.server_first(client_first);
                self.step = 1;
                match result {
                    Ok(msg) => Ok(Some(msg.into_bytes())),
                    Err(Error::Protocol(p)) => {
                        self.step = 2;
                        Ok(Some(render_error(p)))
                    }
                    Err(e) => Err(e),
                }
            }
            1 => {
                let client_final = input.ok_or(Error::InvalidMessage)?;
                let client_final = std::str::from_utf8(client_final)?;
                let result = self.engine.server_final(client_final);
                self.step = 2;
                match result {
                    Ok(msg) => Ok(Some(msg.into_bytes())),
                    Err(Error::Protocol(p)) => Ok(Some(render_error(p))),
                    Err(e) => Err(e),
                }
            }
            _ => Err(Error::InvalidStep { expected: self.step, got: self.step + 1 }),
        }
    }

    fn done(&self) -> bool {
        self.engine.is_done() || self.step >= 2
    }

    fn step(&self) -> u32 {
        self.step
    }
}

fn render_error(error: ProtocolError) -> Vec<u8> {
    ServerFinal::Error { error }.to_string().into_bytes()
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
    fn full_exchange_via_mechanism_context() {
        let mut client = ScramClientContext::new("user", "pencil", HashAlgorithm::Sha256);
        let mut server = ScramServerContext::new(Arc::new(OneUser), HashAlgorithm::Sha256);

        let first = client.next(None).unwrap().unwrap();
        let server_first = server.next(Some(&first)).unwrap().unwrap();
        let client_final = client.next(Some(&server_first)).unwrap().unwrap();
        let server_final = server.next(Some(&client_final)).unwrap().unwrap();
        client.next(Some(&server_final)).unwrap();

        assert!(client.done());
        assert!(server.done());
    }

    #[test]
    fn unknown_user_yields_wire_error_instead_of_hard_failure() {
        let mut server = ScramServerContext::new(Arc::new(OneUser), HashAlgorithm::Sha256);
        let response = server
            .next(Some(b"n,,n=nobody,r=abcdefghijklmnopqrstuvwx"))
            .unwrap()
            .unwrap();
        assert_eq!(
            ServerFinal::parse(std::str::from_utf8(&response).unwrap()).unwrap(),
            ServerFinal::Error { error: ProtocolError::UnknownUser }
        );
        assert!(server.done());
    }
}
