//! SASL ANONYMOUS (RFC 4505): one message, no credential check at all.

use crate::error::{Error, ProtocolError};
use crate::mechanism::{MechanismContext, Role};

/// RFC 4505 §3 bounds the trace information at 255 UTF-8 octets.
const MAX_TRACE_LEN: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    NotStarted,
    Done,
}

/// ANONYMOUS client and server, both sides of one round trip.
#[derive(Debug)]
pub struct AnonymousContext {
    role: Role,
    /// Optional trace information (an email address or opaque token), sent
    /// by the client and otherwise ignored by the server.
    trace_info: Option<String>,
    step: Step,
}

impl AnonymousContext {
    pub fn client(trace_info: Option<String>) -> Self {
        Self { role: Role::Client, trace_info, step: Step::NotStarted }
    }

    pub fn server() -> Self {
        Self { role: Role::Server, trace_info: None, step: Step::NotStarted }
    }
}

impl MechanismContext for AnonymousContext {
    fn role(&self) -> Role {
        self.role
    }

    fn next(&mut self, input: Option<&[u8]>) -> Result<Option<Vec<u8>>, Error> {
        if self.step == Step::Done {
            return Err(Error::InvalidStep { expected: 0, got: 1 });
        }
        match self.role {
            Role::Client => {
                let trace = self.trace_info.clone().unwrap_or_default();
                if trace.len() > MAX_TRACE_LEN {
                    return Err(Error::InvalidMessage);
                }
                self.step = Step::Done;
                Ok(Some(trace.into_bytes()))
            }
            Role::Server => {
                let msg = input.ok_or(Error::InvalidMessage)?;
                let trace = std::str::from_utf8(msg)?;
                if trace.is_empty() {
                    self.step = Step::Done;
                    return Err(ProtocolError::InvalidEncoding.into());
                }
                if trace.len() > MAX_TRACE_LEN {
                    self.step = Step::Done;
                    return Err(ProtocolError::InvalidEncoding.into());
                }
                self.trace_info = Some(trace.to_string());
                self.step = Step::Done;
                Ok(None)
            }
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
