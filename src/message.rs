//! The four SCRAM message shapes (RFC 5802 §7), built on [`crate::attr::AttributeMap`].

use crate::attr::{self, AttributeMap};
use crate::error::Error;
use crate::gs2::Gs2Header;

/// `client-first-message`: a GS2 header followed by the bare attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFirst {
    pub header: Gs2Header,
    pub username: String,
    pub nonce: String,
}

impl ClientFirst {
    /// Parses a full `client-first-message`, returning the message and the
    /// exact bytes of its bare part (`client-first-message-bare`), which the
    /// caller must retain verbatim for the `AuthMessage` computation.
    pub fn parse(s: &str) -> Result<(Self, String), Error> {
        let (header, bare) = Gs2Header::parse(s)?;
        let attrs = AttributeMap::parse(bare)?;
        if !attrs.is_missing(attr::RESERVED_MEXT) {
            return Err(crate::error::ProtocolError::ExtensionsNotSupported.into());
        }
        let username = attrs
            .get(attr::USERNAME)
            .ok_or(crate::error::ProtocolError::InvalidEncoding)?
            .to_string();
        let nonce = attrs
            .get(attr::NONCE)
            .ok_or(crate::error::ProtocolError::InvalidEncoding)?
            .to_string();
        Ok((Self { header, username, nonce }, bare.to_string()))
    }

    /// Renders `client-first-message-bare` (no GS2 header).
    pub fn bare(&self) -> String {
        let mut attrs = AttributeMap::new();
        attrs.push(attr::USERNAME, crate::name::encode_name(&self.username));
        attrs.push(attr::NONCE, self.nonce.clone());
        attrs.to_string()
    }

    /// Renders the full message, GS2 header included.
    pub fn to_string(&self) -> String {
        format!("{}{}", self.header, self.bare())
    }
}

/// `server-first-message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerFirst {
    pub combined_nonce: String,
    pub salt: Vec<u8>,
    pub iterations: u32,
}

impl ServerFirst {
    pub fn parse(s: &str) -> Result<Self, Error> {
        let attrs = AttributeMap::parse(s)?;
        if !attrs.is_missing(attr::RESERVED_MEXT) {
            return Err(crate::error::ProtocolError::ExtensionsNotSupported.into());
        }
        let combined_nonce = attrs
            .get(attr::NONCE)
            .ok_or(crate::error::ProtocolError::InvalidEncoding)?
            .to_string();
        let salt_b64 = attrs
            .get(attr::SALT)
            .ok_or(crate::error::ProtocolError::InvalidEncoding)?;
        let salt = crate::b64::decode(salt_b64)?;
        let iterations: u32 = attrs
            .get(attr::ITERATION_COUNT)
            .ok_or(crate::error::ProtocolError::InvalidEncoding)?
            .parse()
            .map_err(|_| crate::error::ProtocolError::InvalidEncoding)?;
        Ok(Self { combined_nonce, salt, iterations })
    }

    pub fn to_string(&self) -> String {
        let mut attrs = AttributeMap::new();
        attrs
            .push(attr::NONCE, self.combined_nonce.clone())
            .push(attr::SALT, crate::b64::encode(&self.salt))
            .push(attr::ITERATION_COUNT, self.iterations.to_string());
        attrs.to_string()
    }
}

/// `client-final-message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFinal {
    /// Base64 of the GS2 header (and, when channel binding is in use, the
    /// channel-binding data appended to it).
    pub channel_binding_b64: String,
    pub combined_nonce: String,
    pub proof_b64: Option<String>,
}

impl ClientFinal {
    pub fn parse(s: &str) -> Result<(Self, String), Error> {
        let attrs = AttributeMap::parse(s)?;
        let channel_binding_b64 = attrs
            .get(attr::CHANNEL_BINDING)
            .ok_or(crate::error::ProtocolError::InvalidEncoding)?
            .to_string();
        let combined_nonce = attrs
            .get(attr::NONCE)
            .ok_or(crate::error::ProtocolError::InvalidEncoding)?
            .to_string();
        let proof_b64 = attrs.get(attr::PROOF).map(|s| s.to_string());

        let mut without_proof = AttributeMap::new();
        without_proof
            .push(attr::CHANNEL_BINDING, channel_binding_b64.clone())
            .push(attr::NONCE, combined_nonce.clone());
        let without_proof = without_proof.to_string();

        Ok((
            Self { channel_binding_b64, combined_nonce, proof_b64 },
            without_proof,
        ))
    }

    /// Renders `client-final-message-without-proof`.
    pub fn without_proof(&self) -> String {
        let mut attrs = AttributeMap::new();
        attrs
            .push(attr::CHANNEL_BINDING, self.channel_binding_b64.clone())
            .push(attr::NONCE, self.combined_nonce.clone());
        attrs.to_string()
    }

    /// Renders the full `client-final-message`, proof included.
    pub fn to_string(&self) -> String {
        let without_proof = self.without_proof();
        match &self.proof_b64 {
            Some(proof) => format!("{without_proof},p={proof}"),
            None => without_proof,
        }
    }
}

/// `server-final-message`: either `v=<signature>` on success, or `e=<error>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFinal {
    Verified { signature_b64: String },
    Error { error: crate::error::ProtocolError },
}

impl ServerFinal {
    pub fn parse(s: &str) -> Result<Self, Error> {
        let attrs = AttributeMap::parse(s)?;
        if let Some(err) = attrs.get(attr::SERVER_ERROR) {
            return Ok(Self::Error { error: crate::error::ProtocolError::parse(err) });
        }
        let signature_b64 = attrs
            .get(attr::VERIFIER)
            .ok_or(crate::error::ProtocolError::InvalidEncoding)?
            .to_string();
        Ok(Self::Verified { signature_b64 })
    }

    pub fn to_string(&self) -> String {
        let mut attrs = AttributeMap::new();
        match self {
            Self::Verified { signature_b64 } => {
                attrs.push(attr::VERIFIER, signature_b64.clone());
            }
            Self::Error { error } => {
                attrs.push(attr::SERVER_ERROR, error.as_str());
            }
        }
        attrs.to_string()
    }
}
