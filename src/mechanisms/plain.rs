//! SASL PLAIN (RFC 4616): one message, `authzid NUL authcid NUL passwd`.

use std::sync::Arc;

use zeroize::Zeroizing;

use crate::credential::{verify_password, CredentialQuery, CredentialStore};
use crate::error::{Error, ProtocolError};
use crate::mechanism::{MechanismContext, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    NotStarted,
    Done,
}

/// PLAIN client: wraps the three fields and emits them NUL-joined.
#[derive(Debug)]
pub struct PlainClientContext {
    authzid: String,
    authcid: String,
    password: Zeroizing<String>,
    step: Step,
}

impl PlainClientContext {
    pub fn new(authzid: impl Into<String>, authcid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            authzid: authzid.into(),
            authcid: authcid.into(),
            password: Zeroizing::new(password.into()),
            step: Step::NotStarted,
        }
    }
}

impl MechanismContext for PlainClientContext {
    fn role(&self) -> Role {
        Role::Client
    }

    fn next(&mut self, _input: Option<&[u8]>) -> Result<Option<Vec<u8>>, Error> {
        if self.step == Step::Done {
            return Err(Error::InvalidStep { expected: 0, got: 1 });
        }
        let mut msg = Vec::with_capacity(self.authzid.len() + self.authcid.len() + self.password.len() + 2);
        msg.extend_from_slice(self.authzid.as_bytes());
        msg.push(0);
        msg.extend_from_slice(self.authcid.as_bytes());
        msg.push(0);
        msg.extend_from_slice(self.password.as_bytes());
        self.step = Step::Done;
        Ok(Some(msg))
    }

    fn done(&self) -> bool {
        self.step == Step::Done
    }

    fn step(&self) -> u32 {
        match self.step {
            Step::NotStarted => 0,
            Step::Done => 1,
        }
    }
}

/// PLAIN server: parses the single message and checks it against a
/// [`CredentialStore`].
#[derive(Debug)]
pub struct PlainServerContext {
    store: Arc<dyn CredentialStore>,
    step: Step,
}

impl PlainServerContext {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store, step: Step::NotStarted }
    }
}

impl MechanismContext for PlainServerContext {
    fn role(&self) -> Role {
        Role::Server
    }

    fn next(&mut self, input: Option<&[u8]>) -> Result<Option<Vec<u8>>, Error> {
        if self.step == Step::Done {
            return Err(Error::InvalidStep { expected: 0, got: 1 });
        }
        self.step = Step::Done;

        let msg = input.ok_or(Error::InvalidMessage)?;
        let mut fields = msg.splitn(3, |b| *b == 0);
        let authzid = fields.next().ok_or(ProtocolError::InvalidEncoding)?;
        let authcid = fields.next().ok_or(ProtocolError::InvalidEncoding)?;
        let password = fields.next().ok_or(ProtocolError::InvalidEncoding)?;

        let authcid = std::str::from_utf8(authcid).map_err(|_| ProtocolError::InvalidEncoding)?;
        let password = std::str::from_utf8(password).map_err(|_| ProtocolError::InvalidEncoding)?;
        let authzid = if authzid.is_empty() {
            None
        } else {
            Some(
                std::str::from_utf8(authzid)
                    .map_err(|_| ProtocolError::InvalidEncoding)?
                    .to_string(),
            )
        };

        let normalized_username = crate::saslprep::normalize(authcid)
            .map_err(|_| Error::Protocol(ProtocolError::InvalidUsernameEncoding))?;

        let query = CredentialQuery { username: normalized_username, authzid };
        let credential = match self.store.lookup(&query) {
            Ok(Some(c)) => c,
            Ok(None) | Err(_) => return Err(ProtocolError::UnknownUser.into()),
        };

        if verify_password(&credential, password)? {
            Ok(None)
        } else {
            Err(ProtocolError::OtherError.into())
        }
    }

    fn done(&self) -> bool {
        self.step == Step::Done
    }

    fn step(&self) -> u32 {
        match self.step {
            Step::NotStarted => 0,
            Step::Done => 1,
        }
    }
}
