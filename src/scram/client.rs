//! The initiator (client) role of the SCRAM state machine.

use crate::crypto::{auth_message, constant_time_eq, HashAlgorithm};
use crate::error::{Error, ProtocolError};
use crate::gs2::{ChannelBinding, Gs2Header};
use crate::message::{ClientFinal, ClientFirst, ServerFinal, ServerFirst};
use crate::rand::{new_nonce, DEFAULT_CLIENT_NONCE_LEN};

#[derive(Debug, Clone)]
pub enum ClientState {
    Initial,
    FirstSent {
        client_nonce: String,
        client_first_bare: String,
        header: Gs2Header,
    },
    FinalSent {
        server_signature: Vec<u8>,
    },
    Done,
}

/// Drives a single SCRAM exchange from the client side.
///
/// Two round trips: [`client_first`](Self::client_first) produces the
/// initial response, [`client_final`](Self::client_final) consumes the
/// server's first message and produces the client's final message, and
/// [`handle_server_final`](Self::handle_server_final) verifies the server's
/// proof of knowledge of the shared secret.
#[derive(Debug, Clone)]
pub struct ScramClientEngine {
    username: String,
    password: String,
    algo: HashAlgorithm,
    state: ClientState,
    fixed_nonce: Option<String>,
}

impl ScramClientEngine {
    /// Builds a new client engine for the given SASLprep'd username and
    /// password. Channel binding is not attempted; this crate's channel
    /// binding support is limited to the responder side validating a `p=`
    /// value a caller supplies out of band.
    pub fn new(username: impl Into<String>, password: impl Into<String>, algo: HashAlgorithm) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            algo,
            state: ClientState::Initial,
            fixed_nonce: None,
        }
    }

    /// Overrides the client nonce drawn in [`Self::client_first`] with a
    /// caller-supplied one instead of a fresh random draw. Test-only: it
    /// exists so a known exchange (e.g. a published worked example) can be
    /// reproduced byte-for-byte instead of only ever exercising a random
    /// nonce.
    pub fn with_fixed_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.fixed_nonce = Some(nonce.into());
        self
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, ClientState::Done)
    }

    /// Produces `client-first-message`.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub fn client_first(&mut self) -> Result<String, Error> {
        if !matches!(self.state, ClientState::Initial) {
            return Err(Error::InvalidStep { expected: 0, got: 1 });
        }
        let client_nonce = match &self.fixed_nonce {
            Some(n) => n.clone(),
            None => new_nonce(DEFAULT_CLIENT_NONCE_LEN)?,
        };
        let header = Gs2Header::plain();
        let msg = ClientFirst {
            header: header.clone(),
            username: self.username.clone(),
            nonce: client_nonce.clone(),
        };
        let client_first_bare = msg.bare();
        let wire = msg.to_string();
        self.state = ClientState::FirstSent { client_nonce, client_first_bare, header };
        Ok(wire)
    }

    /// Consumes `server-first-message`, returning `client-final-message`.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub fn client_final(&mut self, server_first: &str) -> Result<String, Error> {
        let (client_nonce, client_first_bare, header) = match &self.state {
            ClientState::FirstSent { client_nonce, client_first_bare, header } => {
                (client_nonce.clone(), client_first_bare.clone(), header.clone())
            }
            _ => return Err(Error::InvalidStep { expected: 1, got: 2 }),
        };

        let parsed = ServerFirst::parse(server_first)?;
        if !parsed.combined_nonce.starts_with(&client_nonce) {
            self.state = ClientState::Done;
            return Err(ProtocolError::OtherError.into());
        }
        if parsed.iterations < crate::scram::MIN_ITERATIONS {
            self.state = ClientState::Done;
            return Err(ProtocolError::OtherError.into());
        }

        let normalized_password = crate::saslprep::normalize(&self.password)?;
        let salted_password =
            self.algo.salted_password(normalized_password.as_bytes(), &parsed.salt, parsed.iterations);
        let client_key = self.algo.client_key(&salted_password)?;
        let stored_key = self.algo.stored_key(&client_key);

        let channel_binding_b64 = crate::b64::encode(&header.to_wire_bytes());
        let client_final_without_proof = ClientFinal {
            channel_binding_b64,
            combined_nonce: parsed.combined_nonce.clone(),
            proof_b64: None,
        }
        .without_proof();

        let auth_msg = auth_message(
            client_first_bare.as_bytes(),
            server_first.as_bytes(),
            client_final_without_proof.as_bytes(),
        );

        let client_signature = self.algo.client_signature(&stored_key, &auth_msg)?;
        let client_proof = self.algo.client_proof(&client_key, &client_signature)?;

        let server_key = self.algo.server_key(&salted_password)?;
        let server_signature = self.algo.server_signature(&server_key, &auth_msg)?;

        let final_msg = ClientFinal {
            channel_binding_b64: crate::b64::encode(&header.to_wire_bytes()),
            combined_nonce: parsed.combined_nonce,
            proof_b64: Some(crate::b64::encode(&client_proof)),
        };

        self.state = ClientState::FinalSent { server_signature };
        Ok(final_msg.to_string())
    }

    /// Consumes `server-final-message`, verifying the server's signature.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub fn handle_server_final(&mut self, server_final: &str) -> Result<(), Error> {
        let expected_signature = match &self.state {
            ClientState::FinalSent { server_signature } => server_signature.clone(),
            _ => return Err(Error::InvalidStep { expected: 2, got: 3 }),
        };

        let parsed = ServerFinal::parse(server_final)?;
        match parsed {
            ServerFinal::Verified { signature_b64 } => {
                let got = crate::b64::decode(&signature_b64)?;
                if !constant_time_eq(&got, &expected_signature) {
                    self.state = ClientState::Done;
                    return Err(ProtocolError::OtherError.into());
                }
                self.state = ClientState::Done;
                Ok(())
            }
            ServerFinal::Error { error } => {
                self.state = ClientState::Done;
                Err(error.into())
            }
        }
    }

    pub fn channel_binding(&self) -> ChannelBinding {
        ChannelBinding::NotSupported
    }
}
