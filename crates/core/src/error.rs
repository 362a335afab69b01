use std::error::Error;
use std::fmt::{self, Display};

use concierge_backend::{BackendError, ErrorKind};

use crate::stream::DecodeError;

/// A failed exchange with the backend.
///
/// Every variant is reported to the user the same way, the distinction is
/// kept for logging.
#[derive(Debug)]
pub enum ExchangeError {
    /// The backend failed to send or stream the reply.
    Backend(Box<dyn BackendError>),
    /// The reply body was not valid text.
    Decode(DecodeError),
    /// The exchange ended without reporting an outcome.
    Aborted,
}

impl ExchangeError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExchangeError::Backend(err) => err.kind(),
            ExchangeError::Decode(_) => ErrorKind::Decode,
            ExchangeError::Aborted => ErrorKind::Other,
        }
    }
}

impl Display for ExchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeError::Backend(err) => {
                write!(f, "{}: {err}", err.kind())
            }
            ExchangeError::Decode(err) => write!(f, "decode failure: {err}"),
            ExchangeError::Aborted => write!(f, "exchange aborted"),
        }
    }
}

impl Error for ExchangeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ExchangeError::Backend(err) => Some(err.as_ref()),
            ExchangeError::Decode(err) => Some(err),
            ExchangeError::Aborted => None,
        }
    }
}

impl From<DecodeError> for ExchangeError {
    #[inline]
    fn from(err: DecodeError) -> Self {
        ExchangeError::Decode(err)
    }
}

/// Why a submit was not accepted.
///
/// None of these are shown to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubmitError {
    /// The input was empty after trimming.
    EmptyInput,
    /// Another exchange is in flight.
    Busy,
    /// The controller has stopped.
    Closed,
}

impl Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::EmptyInput => write!(f, "input is empty"),
            SubmitError::Busy => write!(f, "an exchange is in flight"),
            SubmitError::Closed => write!(f, "controller has stopped"),
        }
    }
}

impl Error for SubmitError {}

/// Why a session reset did not happen.
#[derive(Debug)]
pub enum ResetError {
    /// An exchange was in flight.
    Busy,
    /// The backend did not acknowledge the reset.
    Rejected(ExchangeError),
    /// The controller has stopped.
    Closed,
}

impl Display for ResetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResetError::Busy => write!(f, "an exchange is in flight"),
            ResetError::Rejected(err) => write!(f, "reset rejected: {err}"),
            ResetError::Closed => write!(f, "controller has stopped"),
        }
    }
}

impl Error for ResetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ResetError::Rejected(err) => Some(err),
            _ => None,
        }
    }
}
