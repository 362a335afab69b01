use std::fmt::{self, Display};

/// The kind of error that occurred while talking to a backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The backend answered with a non-success status.
    Status,
    /// The request could not be sent or the connection broke mid-stream.
    Network,
    /// The response body could not be decoded.
    Decode,
    /// Any other errors.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Status => write!(f, "unexpected status"),
            ErrorKind::Network => write!(f, "network failure"),
            ErrorKind::Decode => write!(f, "decode failure"),
            ErrorKind::Other => write!(f, "backend error"),
        }
    }
}
