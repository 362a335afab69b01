use std::pin::Pin;
use std::task::{self, Poll};

use bytes::Bytes;

use crate::backend::BackendError;

/// A streamed reply from the backend.
pub trait ChatResponse: Sized + Send + 'static {
    /// The error type that may be returned by the backend.
    type Error: BackendError;

    /// Attempts to pull out the next chunk of the reply body.
    ///
    /// # Return value
    ///
    /// There are several possible return values, each indicating a
    /// distinct response state:
    ///
    /// - `Poll::Pending` means that this response is still waiting for
    ///   the next chunk. Implementations will ensure that the current
    ///   task will be notified when the next chunk may be ready.
    /// - `Poll::Ready(Ok(Some(chunk)))` means the response has a chunk
    ///   to deliver, and may produce further chunks on subsequent
    ///   `poll_next_chunk` calls.
    /// - `Poll::Ready(Ok(None))` means the body has ended.
    /// - `Poll::Ready(Err(error))` means an error occurred while reading
    ///   the body.
    ///
    /// Chunk boundaries are arbitrary: a chunk may end in the middle of
    /// a multi-byte character. Calling this method after completion
    /// should always return `None`.
    fn poll_next_chunk(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<Bytes>, Self::Error>>;
}
