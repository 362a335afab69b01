//! A local scripted backend for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use bytes::Bytes;
use concierge_backend::{
    BackendError, ChatBackend, ChatResponse, ErrorKind, HealthStatus,
    OutboundMessage,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl BackendError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<PresetFailure> for Error {
    fn from(failure: PresetFailure) -> Self {
        Self {
            message: "injected failure",
            kind: failure.into(),
        }
    }
}

pub struct TestResponse {
    events: VecDeque<PresetEvent>,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ChatResponse for TestResponse {
    type Error = crate::Error;

    fn poll_next_chunk(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<Bytes>, Self::Error>> {
        let this = self.get_mut();

        if let Some(sleep) = &mut this.sleep {
            ready!(sleep.as_mut().poll(cx));
            this.sleep = None;

            return match this.events.pop_front() {
                Some(PresetEvent::Chunk(bytes)) => {
                    Poll::Ready(Ok(Some(Bytes::from(bytes))))
                }
                Some(PresetEvent::Failure(failure)) => {
                    // Nothing is delivered after a failure.
                    this.events.clear();
                    Poll::Ready(Err(failure.into()))
                }
                None => Poll::Ready(Ok(None)),
            };
        }
        this.sleep = Some(Box::pin(sleep(this.delay)));
        Pin::new(this).poll_next_chunk(cx)
    }
}

#[derive(Default)]
struct Script {
    replies: VecDeque<PresetReply>,
    reset_results: VecDeque<Option<PresetFailure>>,
    health: Option<HealthStatus>,
    requests: Vec<OutboundMessage>,
    resets: Vec<String>,
}

/// A local scripted backend for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how the
/// backend should reply to each message, in order. If there are no enough
/// replies in the script, an error will be returned. Resets succeed unless
/// a failure has been queued, and the health check fails unless a status
/// has been set.
///
/// Clones share the same script and request log, so a test can keep one
/// clone for inspection after handing another to the code under test.
#[derive(Clone, Default)]
pub struct TestBackend {
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl TestBackend {
    #[inline]
    pub fn add_reply(&self, preset: PresetReply) {
        self.script().replies.push_back(preset);
    }

    #[inline]
    pub fn add_reset_result(&self, failure: Option<PresetFailure>) {
        self.script().reset_results.push_back(failure);
    }

    #[inline]
    pub fn set_health(&self, health: HealthStatus) {
        self.script().health = Some(health);
    }

    /// Sets the delay before the reply starts and between body events.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns every message received so far.
    pub fn requests(&self) -> Vec<OutboundMessage> {
        self.script().requests.clone()
    }

    /// Returns the user ids of every reset received so far.
    pub fn resets(&self) -> Vec<String> {
        self.script().resets.clone()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        // A panicking test must not hide the script from the others.
        self.script.lock().unwrap_or_else(|err| err.into_inner())
    }

    #[inline]
    fn delay(&self) -> Duration {
        self.delay.unwrap_or(Duration::from_millis(1))
    }
}

impl ChatBackend for TestBackend {
    type Error = crate::Error;
    type Response = TestResponse;

    fn send_message(
        &self,
        msg: &OutboundMessage,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let reply = {
            let mut script = self.script();
            script.requests.push(msg.clone());
            script.replies.pop_front()
        };
        let delay = self.delay();

        async move {
            sleep(delay).await;
            let Some(reply) = reply else {
                return Err(Error {
                    message: "no enough replies",
                    kind: ErrorKind::Other,
                });
            };
            if let Some(failure) = reply.rejection {
                return Err(failure.into());
            }
            Ok(TestResponse {
                events: reply.events.into(),
                delay,
                sleep: None,
            })
        }
    }

    fn reset_session(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'static {
        let failure = {
            let mut script = self.script();
            script.resets.push(user_id.to_owned());
            script.reset_results.pop_front().flatten()
        };
        let delay = self.delay();

        async move {
            sleep(delay).await;
            match failure {
                Some(failure) => Err(failure.into()),
                None => Ok(()),
            }
        }
    }

    fn check_health(
        &self,
    ) -> impl Future<Output = Result<HealthStatus, Self::Error>> + Send + 'static
    {
        let health = self.script().health.clone();
        let delay = self.delay();

        async move {
            sleep(delay).await;
            health.ok_or(Error {
                message: "backend is down",
                kind: ErrorKind::Network,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use tokio::time::Instant;

    use super::*;

    async fn collect_body(resp: TestResponse) -> Result<Vec<u8>, Error> {
        let mut resp = pin!(resp);
        let mut body = Vec::new();
        while let Some(chunk) =
            poll_fn(|cx| resp.as_mut().poll_next_chunk(cx)).await?
        {
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    #[tokio::test]
    async fn test_send_message() {
        let backend = TestBackend::default();
        backend.add_reply(PresetReply::with_chunks(["Hello, ", "world!"]));
        backend.add_reply(PresetReply::with_events([
            PresetEvent::text("Sure, "),
            PresetEvent::Failure(PresetFailure::Network),
            PresetEvent::text("never sent"),
        ]));
        backend.add_reply(PresetReply::rejected(PresetFailure::Status));

        let msg = OutboundMessage::new("Hi", "web-user").unwrap();
        let resp = backend.send_message(&msg).await.unwrap();
        assert_eq!(collect_body(resp).await.unwrap(), b"Hello, world!");

        let resp = backend.send_message(&msg).await.unwrap();
        let err = collect_body(resp).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);

        let err = backend.send_message(&msg).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Status);

        let err = backend.send_message(&msg).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Other);

        assert_eq!(backend.requests().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_applies_to_every_event() {
        let mut backend = TestBackend::default();
        backend.set_delay(Duration::from_millis(100));
        backend.add_reply(PresetReply::with_chunks(["Hello"]));

        let start = Instant::now();
        let msg = OutboundMessage::new("Hi", "web-user").unwrap();
        let resp = backend.send_message(&msg).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(100));

        // One chunk and the end of the body.
        assert_eq!(collect_body(resp).await.unwrap(), b"Hello");
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_reset_and_health() {
        let backend = TestBackend::default();
        backend.add_reset_result(Some(PresetFailure::Status));

        assert!(backend.reset_session("web-user").await.is_err());
        assert!(backend.reset_session("web-user").await.is_ok());
        assert_eq!(backend.resets(), ["web-user", "web-user"]);

        assert!(backend.check_health().await.is_err());
        backend.set_health(HealthStatus {
            status: "ok".to_owned(),
            agent: None,
        });
        assert_eq!(backend.check_health().await.unwrap().status, "ok");
    }
}
