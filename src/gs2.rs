//! GS2 header framing (RFC 5801 §5).
//!
//! `gs2-header = [ "F," ] cb-flag "," [ authzid ] ","`. Note the trailing
//! comma belongs to the header itself — concatenating a [`Gs2Header`]'s
//! `Display` output directly in front of the bare SCRAM attributes (no
//! connecting comma of your own) reproduces the wire form exactly, e.g.
//! `"n,,"` + `"n=user,r=abc"`.

use crate::error::Error;
use crate::name::encode_name;

/// The client's channel-binding posture, RFC 5802 §6.1 / RFC 5801 §5.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelBinding {
    /// `n`: the client does not support channel binding.
    NotSupported,
    /// `y`: the client supports channel binding but believes the server does
    /// not, so it isn't used this time. A server that does support channel
    /// binding MUST treat this as a downgrade attempt and fail the exchange.
    Advertised,
    /// `p=<name>`: channel binding is in use with the named binding type.
    Required(String),
}

impl ChannelBinding {
    /// The `cb-flag` wire token, without any following comma.
    pub fn flag(&self) -> String {
        match self {
            Self::NotSupported => "n".to_string(),
            Self::Advertised => "y".to_string(),
            Self::Required(name) => format!("p={name}"),
        }
    }

    fn parse_flag(s: &str) -> Result<Self, Error> {
        if s == "n" {
            Ok(Self::NotSupported)
        } else if s == "y" {
            Ok(Self::Advertised)
        } else if let Some(name) = s.strip_prefix("p=") {
            Ok(Self::Required(name.to_string()))
        } else {
            Err(crate::error::ProtocolError::InvalidEncoding.into())
        }
    }
}

/// The non-standard-flag wire token, RFC 5801 §5.
const NONSTD_FLAG: &str = "F";

/// The parsed `gs2-header`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gs2Header {
    /// The leading `[ "F," ]` slot: true if the peer advertised its own
    /// non-standard extension to GS2. This crate implements no such
    /// extension; the flag is carried through for equality and wire
    /// round-tripping only.
    pub nonstd_flag: bool,
    /// The channel-binding posture.
    pub cb: ChannelBinding,
    /// The optional authorization identity (`a=` slot), already name-decoded.
    pub authzid: Option<String>,
}

impl Gs2Header {
    /// A header with no non-standard flag, no channel binding, and no
    /// authzid: `"n,,"`.
    pub fn plain() -> Self {
        Self {
            nonstd_flag: false,
            cb: ChannelBinding::NotSupported,
            authzid: None,
        }
    }

    /// Parses a `gs2-header` off the front of `s`, returning the header and
    /// the remainder of the string (the GS2/SCRAM bare message).
    pub fn parse(s: &str) -> Result<(Self, &str), Error> {
        let (nonstd_flag, rest) = match s.strip_prefix(NONSTD_FLAG) {
            Some(after) => {
                let after = after.strip_prefix(',').ok_or(crate::error::ProtocolError::InvalidEncoding)?;
                (true, after)
            }
            None => (false, s),
        };

        let mut parts = rest.splitn(3, ',');
        let cb_flag = parts.next().ok_or(crate::error::ProtocolError::InvalidEncoding)?;
        let authzid_part = parts.next().ok_or(crate::error::ProtocolError::InvalidEncoding)?;
        let rest = parts.next().unwrap_or("");

        let cb = ChannelBinding::parse_flag(cb_flag)?;
        let authzid = if authzid_part.is_empty() {
            None
        } else {
            let raw = authzid_part
                .strip_prefix("a=")
                .ok_or(crate::error::ProtocolError::InvalidEncoding)?;
            Some(crate::name::decode_name(raw))
        };

        Ok((Self { nonstd_flag, cb, authzid }, rest))
    }

    /// The raw bytes of this header as sent on the wire, used as the
    /// `cbind-data` prefix for the `c=` channel-binding attribute.
    pub fn to_wire_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    /// Compares the non-standard flag, channel-binding flag/name, and
    /// decoded authzid. Equivalent to the derived [`PartialEq`] — provided
    /// as an explicit, named entry point mirroring how callers elsewhere
    /// compare the wire-sent GS2 header against the one a client bound
    /// itself to.
    pub fn equals(&self, other: &Self) -> bool {
        self == other
    }
}

impl std::fmt::Display for Gs2Header {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let authzid = match &self.authzid {
            Some(a) => format!("a={}", encode_name(a)),
            None => String::new(),
        };
        if self.nonstd_flag {
            write!(f, "{NONSTD_FLAG},{},{},", self.cb.flag(), authzid)
        } else {
            write!(f, "{},{},", self.cb.flag(), authzid)
        }
    }
}
