//! The responder (server) role of the SCRAM state machine.

use std::sync::Arc;

use crate::credential::{resolve_scram_material_with_salt, CredentialQuery, CredentialStore};
use crate::crypto::{auth_message, constant_time_eq, xor, HashAlgorithm};
use crate::error::{Error, ProtocolError};
use crate::message::{ClientFinal, ClientFirst, ServerFinal, ServerFirst};
use crate::rand::{new_nonce, DEFAULT_SERVER_NONCE_LEN};

#[derive(Debug)]
pub enum ServerState {
    Initial,
    FirstSent {
        client_first_bare: String,
        server_first: String,
        combined_nonce: String,
        expected_gs2_header: Vec<u8>,
        stored_key: Vec<u8>,
        server_key: Vec<u8>,
    },
    Done,
}

/// Drives a single SCRAM exchange from the server side.
///
/// [`server_first`](Self::server_first) consumes `client-first-message` and
/// resolves the claimed identity against a [`CredentialStore`];
/// [`server_final`](Self::server_final) consumes `client-final-message`,
/// verifies the client's proof, and produces `server-final-message` (either
/// the server's own proof of knowledge, or an `e=` failure).
#[derive(Debug)]
pub struct ScramServerEngine {
    store: Arc<dyn CredentialStore>,
    algo: HashAlgorithm,
    state: ServerState,
    fixed_nonce: Option<String>,
    fixed_salt: Option<Vec<u8>>,
}

impl ScramServerEngine {
    pub fn new(store: Arc<dyn CredentialStore>, algo: HashAlgorithm) -> Self {
        Self {
            store,
            algo,
            state: ServerState::Initial,
            fixed_nonce: None,
            fixed_salt: None,
        }
    }

    /// Overrides the server's nonce contribution (the suffix appended to the
    /// client's nonce to form the combined nonce) with a caller-supplied one.
    /// Test-only, mirroring [`crate::scram::client::ScramClientEngine::with_fixed_nonce`].
    pub fn with_fixed_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.fixed_nonce = Some(nonce.into());
        self
    }

    /// Overrides the salt drawn when deriving SCRAM material on the fly from
    /// a cleartext credential. Has no effect when the resolved credential
    /// already carries pre-derived material. Test-only.
    pub fn with_fixed_salt(mut self, salt: Vec<u8>) -> Self {
        self.fixed_salt = Some(salt);
        self
    }

    pub fn state(&self) -> &ServerState {
        &self.state
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, ServerState::Done)
    }

    /// Consumes `client-first-message`, returning `server-first-message`.
    ///
    /// On failure this always returns [`Error::Protocol`] with a value
    /// suitable for rendering as `e=` on the wire, except for store-level
    /// wiring problems which surface as other [`Error`] variants and have no
    /// wire representation at all.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(algo = ?self.algo)))]
    pub fn server_first(&mut self, client_first: &str) -> Result<String, Error> {
        if !matches!(self.state, ServerState::Initial) {
            return Err(Error::InvalidStep { expected: 0, got: 1 });
        }

        let (parsed, client_first_bare) = match ClientFirst::parse(client_first) {
            Ok(v) => v,
            Err(e) => {
                self.state = ServerState::Done;
                return Err(e);
            }
        };

        let username = crate::name::decode_name(&parsed.username);
        let normalized_username = match crate::saslprep::normalize(&username) {
            Ok(u) => u,
            Err(_) => {
                self.state = ServerState::Done;
                return Err(ProtocolError::InvalidUsernameEncoding.into());
            }
        };

        let query = CredentialQuery {
            username: normalized_username.clone(),
            authzid: parsed.header.authzid.clone(),
        };
        let credential = match self.store.lookup(&query) {
            Ok(Some(c)) => c,
            Ok(None) | Err(_) => {
                #[cfg(feature = "log")]
                log::debug!("credential lookup failed or absent, masking as unknown-user");
                self.state = ServerState::Done;
                return Err(ProtocolError::UnknownUser.into());
            }
        };

        let (salt, iterations, stored_key, server_key) =
            resolve_scram_material_with_salt(&credential, self.algo, self.fixed_salt.as_deref())?;

        let server_nonce = match &self.fixed_nonce {
            Some(n) => n.clone(),
            None => new_nonce(DEFAULT_SERVER_NONCE_LEN)?,
        };
        let combined_nonce = format!("{}{}", parsed.nonce, server_nonce);

        let server_first_msg = ServerFirst { combined_nonce: combined_nonce.clone(), salt, iterations };
        let server_first = server_first_msg.to_string();

        let expected_gs2_header = parsed.header.to_wire_bytes();

        self.state = ServerState::FirstSent {
            client_first_bare,
            server_first: server_first.clone(),
            combined_nonce,
            expected_gs2_header,
            stored_key,
            server_key,
        };
        Ok(server_first)
    }

    /// Consumes `client-final-message`, returning `server-final-message`.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub fn server_final(&mut self, client_final: &str) -> Result<String, Error> {
        let (client_first_bare, server_first, combined_nonce, expected_gs2_header, stored_key, server_key) =
            match &self.state {
                ServerState::FirstSent {
                    client_first_bare,
                    server_first,
                    combined_nonce,
                    expected_gs2_header,
                    stored_key,
                    server_key,
                } => (
                    client_first_bare.clone(),
                    server_first.clone(),
                    combined_nonce.clone(),
                    expected_gs2_header.clone(),
                    stored_key.clone(),
                    server_key.clone(),
                ),
                _ => return Err(Error::InvalidStep { expected: 1, got: 2 }),
            };

        let (parsed, without_proof) = ClientFinal::parse(client_final)?;

        let fail = |this: &mut Self, err: ProtocolError| -> Result<String, Error> {
            this.state = ServerState::Done;
            Ok(ServerFinal::Error { error: err }.to_string())
        };

        let channel_binding = match crate::b64::decode(&parsed.channel_binding_b64) {
            Ok(v) => v,
            Err(_) => return fail(self, ProtocolError::InvalidEncoding),
        };
        if channel_binding != expected_gs2_header {
            return fail(self, ProtocolError::ChannelBindingsDontMatch);
        }

        if parsed.combined_nonce != combined_nonce {
            return fail(self, ProtocolError::OtherError);
        }

        let proof_b64 = match &parsed.proof_b64 {
            Some(p) => p,
            None => return fail(self, ProtocolError::InvalidEncoding),
        };
        let client_proof = match crate::b64::decode(proof_b64) {
            Ok(v) => v,
            Err(_) => return fail(self, ProtocolError::InvalidEncoding),
        };

        let auth_msg = auth_message(client_first_bare.as_bytes(), server_first.as_bytes(), without_proof.as_bytes());

        let client_signature = self.algo.client_signature(&stored_key, &auth_msg)?;
        let recovered_client_key = match xor(&client_proof, &client_signature) {
            Ok(v) => v,
            Err(_) => return fail(self, ProtocolError::InvalidProof),
        };
        let recomputed_stored_key = self.algo.stored_key(&recovered_client_key);

        if !constant_time_eq(&recomputed_stored_key, &stored_key) {
            return fail(self, ProtocolError::InvalidProof);
        }

        let server_signature = self.algo.server_signature(&server_key, &auth_msg)?;
        self.state = ServerState::Done;
        Ok(ServerFinal::Verified { signature_b64: crate::b64::encode(&server_signature) }.to_string())
    }
}
