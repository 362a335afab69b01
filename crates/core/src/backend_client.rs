use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;

use concierge_backend::{
    ChatBackend, ChatResponse, HealthStatus, OutboundMessage,
};
use tracing::Instrument;

use crate::error::ExchangeError;
use crate::stream::StreamBuffer;

type BoxedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

trait BackendObject: Send + Sync + 'static {
    fn send_message(
        &self,
        msg: OutboundMessage,
    ) -> BoxedFuture<Result<String, ExchangeError>>;

    fn reset_session(
        &self,
        user_id: &str,
    ) -> BoxedFuture<Result<(), ExchangeError>>;

    fn check_health(&self) -> BoxedFuture<Result<HealthStatus, ExchangeError>>;
}

struct AnyBackend<B>(B);

impl<B: ChatBackend + 'static> BackendObject for AnyBackend<B> {
    fn send_message(
        &self,
        msg: OutboundMessage,
    ) -> BoxedFuture<Result<String, ExchangeError>> {
        let fut = self.0.send_message(&msg);
        Box::pin(
            async move {
                trace!("sending: {msg:?}");
                read_reply::<B>(fut.await).await
            }
            .instrument(trace_span!("exchange")),
        )
    }

    fn reset_session(
        &self,
        user_id: &str,
    ) -> BoxedFuture<Result<(), ExchangeError>> {
        let fut = self.0.reset_session(user_id);
        Box::pin(
            async move { fut.await.map_err(backend_error) }
                .instrument(trace_span!("reset")),
        )
    }

    fn check_health(&self) -> BoxedFuture<Result<HealthStatus, ExchangeError>> {
        let fut = self.0.check_health();
        Box::pin(async move { fut.await.map_err(backend_error) })
    }
}

/// A wrapper around a chat backend that drives the streamed reply and
/// provides a type-erased interface for the controller.
#[derive(Clone)]
pub struct BackendClient {
    backend: Arc<dyn BackendObject>,
}

impl BackendClient {
    #[inline]
    pub fn new<B: ChatBackend + 'static>(backend: B) -> Self {
        Self {
            backend: Arc::new(AnyBackend(backend)),
        }
    }

    /// Sends a message and reads the whole reply.
    ///
    /// The returned text is exactly what the backend streamed, neither
    /// trimmed nor formatted.
    #[inline]
    pub async fn send_message(
        &self,
        msg: OutboundMessage,
    ) -> Result<String, ExchangeError> {
        self.backend.send_message(msg).await
    }

    #[inline]
    pub async fn reset_session(&self, user_id: &str) -> Result<(), ExchangeError> {
        self.backend.reset_session(user_id).await
    }

    #[inline]
    pub async fn check_health(&self) -> Result<HealthStatus, ExchangeError> {
        self.backend.check_health().await
    }
}

#[inline]
fn backend_error<E: concierge_backend::BackendError>(err: E) -> ExchangeError {
    ExchangeError::Backend(Box::new(err))
}

async fn read_reply<B: ChatBackend + 'static>(
    resp_or_err: Result<B::Response, B::Error>,
) -> Result<String, ExchangeError> {
    let resp = match resp_or_err {
        Ok(resp) => resp,
        Err(err) => {
            error!("request failed: {err}");
            return Err(backend_error(err));
        }
    };

    trace!("start receiving chunks");

    let mut buffer = StreamBuffer::default();
    let mut pinned_resp = pin!(resp);
    loop {
        let chunk_or_err =
            poll_fn(|cx| pinned_resp.as_mut().poll_next_chunk(cx)).await;
        let chunk = match chunk_or_err {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(err) => {
                error!("reply interrupted: {err}");
                return Err(backend_error(err));
            }
        };
        trace!("got a chunk: {} bytes", chunk.len());

        if let Err(err) = buffer.push(&chunk) {
            error!("undecodable reply: {err}");
            return Err(err.into());
        }
    }

    let text = buffer.finish().inspect_err(|err| {
        error!("undecodable reply: {err}");
    })?;
    trace!("finished a reply: {} bytes", text.len());
    Ok(text)
}

#[cfg(test)]
mod tests {
    use concierge_backend::ErrorKind;
    use concierge_test_backend::{
        PresetEvent, PresetFailure, PresetReply, TestBackend,
    };

    use super::*;

    fn message(text: &str) -> OutboundMessage {
        OutboundMessage::new(text, "web-user").unwrap()
    }

    #[tokio::test]
    async fn test_send_message() {
        let backend = TestBackend::default();
        backend.add_reply(PresetReply::with_chunks(["Hel", "lo, ", "world"]));
        let client = BackendClient::new(backend.clone());

        let text = client.send_message(message("Hi")).await.unwrap();
        assert_eq!(text, "Hello, world");
        assert_eq!(backend.requests(), [message("Hi")]);
    }

    #[tokio::test]
    async fn test_split_character() {
        let backend = TestBackend::default();
        backend.add_reply(PresetReply::with_events([
            PresetEvent::text("Spent 12"),
            PresetEvent::Chunk(vec![0xe2]),
            PresetEvent::Chunk(vec![0x82, 0xac]),
        ]));
        let client = BackendClient::new(backend);

        let text = client.send_message(message("Hi")).await.unwrap();
        assert_eq!(text, "Spent 12€");
    }

    #[tokio::test]
    async fn test_error_handling() {
        let backend = TestBackend::default();
        backend.add_reply(PresetReply::rejected(PresetFailure::Status));
        backend.add_reply(PresetReply::with_events([
            PresetEvent::text("partial"),
            PresetEvent::Failure(PresetFailure::Network),
        ]));
        backend.add_reply(PresetReply::with_events([PresetEvent::Chunk(
            vec![b'o', b'k', 0xff],
        )]));
        backend.add_reply(PresetReply::with_events([PresetEvent::Chunk(
            vec![0xf0, 0x9f],
        )]));
        let client = BackendClient::new(backend);

        let err = client.send_message(message("Hi")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Status);
        let err = client.send_message(message("Hi")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        let err = client.send_message(message("Hi")).await.unwrap_err();
        assert!(matches!(err, ExchangeError::Decode(_)));
        let err = client.send_message(message("Hi")).await.unwrap_err();
        assert!(matches!(err, ExchangeError::Decode(_)));
    }

    #[tokio::test]
    async fn test_reset_and_health() {
        let backend = TestBackend::default();
        backend.add_reset_result(Some(PresetFailure::Network));
        let client = BackendClient::new(backend.clone());

        assert!(client.reset_session("web-user").await.is_err());
        assert!(client.reset_session("web-user").await.is_ok());
        assert_eq!(backend.resets(), ["web-user", "web-user"]);
        assert!(client.check_health().await.is_err());
    }
}
