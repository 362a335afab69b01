use std::error::Error;

use crate::error::ErrorKind;
use crate::message::{HealthStatus, OutboundMessage};
use crate::response::ChatResponse;

/// The error type for a chat backend.
pub trait BackendError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that represents a conversational backend.
///
/// Once the backend is created, it should behave like a stateless object.
/// Session state lives on the server and is keyed by the user id carried
/// in each request.
pub trait ChatBackend: Send + Sync {
    /// The error type that may be returned by the backend.
    type Error: BackendError;

    /// The streamed reply type for this backend.
    type Response: ChatResponse<Error = Self::Error>;

    /// Sends a message and resolves once the reply has started streaming.
    ///
    /// A non-success status must be reported as an error here, before any
    /// chunk is handed out.
    fn send_message(
        &self,
        msg: &OutboundMessage,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static;

    /// Asks the backend to drop the conversation of `user_id`.
    fn reset_session(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'static;

    /// Checks whether the backend is reachable.
    fn check_health(
        &self,
    ) -> impl Future<Output = Result<HealthStatus, Self::Error>> + Send + 'static;
}
