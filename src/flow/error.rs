use std::fmt;

#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    Truncated(&'static str),
    Version(u32),
    AddressType(u32),
    HeaderProtocol(u32),
    Envelope(String),
    Timestamp(i64),
}

impl From<prost::DecodeError> for Error {
    fn from(err: prost::DecodeError) -> Self {
        Error::Envelope(err.to_string())
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            Error::Truncated(what)   => write!(f, "truncated {}", what),
            Error::Version(v)        => write!(f, "unsupported sflow version {}", v),
            Error::AddressType(t)    => write!(f, "unknown agent address type {}", t),
            Error::HeaderProtocol(p) => write!(f, "unsupported header protocol {}", p),
            Error::Envelope(e)       => write!(f, "invalid envelope: {}", e),
            Error::Timestamp(secs)   => write!(f, "invalid receive timestamp {}", secs),
        }
    }
}
