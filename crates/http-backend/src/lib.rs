//! A chat backend speaking the concierge HTTP API.
//!
//! Three endpoints below a common base URL are used:
//!
//! - `POST /message` with `{"message", "userId"}`, replying a streamed body.
//!   Plain text bodies are handed out chunk by chunk, while
//!   `text/event-stream` bodies are unwrapped into their `data` payloads.
//! - `POST /reset` with `{"userId"}`, where only the status matters.
//! - `GET /health`, replying `{"status", "agent"}`.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use concierge_backend::{
    BackendError, ChatBackend, ErrorKind, HealthStatus, OutboundMessage,
};
use mime::Mime;
use reqwest::{Client, Response, header};

pub use config::{HttpBackendConfig, HttpBackendConfigBuilder};
use io::{Chunks, Sse};
pub use response::HttpResponse;

/// Error type for [`HttpBackend`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    pub(crate) fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        let kind = if err.is_status() {
            ErrorKind::Status
        } else if err.is_decode() {
            ErrorKind::Decode
        } else {
            ErrorKind::Network
        };
        Self::new(format!("{err}"), kind)
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl BackendError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// HTTP chat backend.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    config: Arc<HttpBackendConfig>,
}

impl HttpBackend {
    /// Creates a new `HttpBackend` with the given configuration.
    pub fn new(config: HttpBackendConfig) -> Self {
        let mut builder = Client::builder();
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder.build().unwrap_or_else(|err| {
            warn!("failed to build the http client, using defaults: {err}");
            Client::new()
        });
        Self {
            client,
            config: Arc::new(config),
        }
    }

    /// Returns the configuration of this backend.
    #[inline]
    pub fn config(&self) -> &HttpBackendConfig {
        &self.config
    }
}

impl ChatBackend for HttpBackend {
    type Error = Error;
    type Response = HttpResponse;

    fn send_message(
        &self,
        msg: &OutboundMessage,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let resp_fut = self
            .client
            .post(self.config.endpoint("/message"))
            .header(header::ACCEPT, "text/event-stream, text/plain")
            .json(msg)
            .send();

        async move {
            let resp = resp_fut
                .await
                .and_then(Response::error_for_status)
                .map_err(Error::from_reqwest)?;

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<Mime>().ok());
            let is_event_stream = content_type.as_ref().is_some_and(|m| {
                m.type_() == mime::TEXT && m.subtype() == mime::EVENT_STREAM
            });
            if !is_event_stream
                && content_type.as_ref().is_some_and(|m| m.type_() != mime::TEXT)
            {
                warn!("unexpected content type: {content_type:?}");
            }
            debug!("reply started, event stream: {is_event_stream}");

            // Here we got a successful response.
            let chunks = Chunks::from_response(resp);
            if is_event_stream {
                Ok(HttpResponse::from_sse(Sse::new(chunks)))
            } else {
                Ok(HttpResponse::from_chunks(chunks))
            }
        }
    }

    fn reset_session(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'static {
        let resp_fut = self
            .client
            .post(self.config.endpoint("/reset"))
            .json(&proto::ResetRequest { user_id })
            .send();

        async move {
            resp_fut
                .await
                .and_then(Response::error_for_status)
                .map_err(Error::from_reqwest)?;
            Ok(())
        }
    }

    fn check_health(
        &self,
    ) -> impl Future<Output = Result<HealthStatus, Self::Error>> + Send + 'static
    {
        let resp_fut = self.client.get(self.config.endpoint("/health")).send();

        async move {
            let resp = resp_fut
                .await
                .and_then(Response::error_for_status)
                .map_err(Error::from_reqwest)?;
            resp.json::<HealthStatus>()
                .await
                .map_err(|err| Error::new(format!("{err}"), ErrorKind::Decode))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use concierge_backend::ChatResponse;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn backend_for(server: &MockServer) -> HttpBackend {
        let config = HttpBackendConfigBuilder::new()
            .with_base_url(format!("{}/api/chat", server.uri()))
            .build();
        HttpBackend::new(config)
    }

    async fn read_body(resp: HttpResponse) -> Result<String, Error> {
        let mut resp = pin!(resp);
        let mut body = Vec::new();
        while let Some(chunk) =
            poll_fn(|cx| resp.as_mut().poll_next_chunk(cx)).await?
        {
            body.extend_from_slice(&chunk);
        }
        Ok(String::from_utf8(body).unwrap())
    }

    #[tokio::test]
    async fn test_send_message_plain_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/message"))
            .and(body_json(json!({
                "message": "What's my balance?",
                "userId": "web-user"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("Your balance is $12.34", "text/plain"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let msg = OutboundMessage::new("What's my balance?", "web-user").unwrap();
        let resp = backend.send_message(&msg).await.unwrap();
        assert_eq!(read_body(resp).await.unwrap(), "Your balance is $12.34");
    }

    #[tokio::test]
    async fn test_send_message_event_stream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/message"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "data:You spent **$40** on food.\n\n",
                "text/event-stream",
            ))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let msg = OutboundMessage::new("Spending?", "web-user").unwrap();
        let resp = backend.send_message(&msg).await.unwrap();
        assert_eq!(
            read_body(resp).await.unwrap(),
            "You spent **$40** on food."
        );
    }

    #[tokio::test]
    async fn test_send_message_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/message"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let msg = OutboundMessage::new("Hi", "web-user").unwrap();
        let err = backend.send_message(&msg).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Status);
    }

    #[tokio::test]
    async fn test_send_message_unreachable() {
        // Nothing listens on the port of a dropped server.
        let backend = {
            let server = MockServer::start().await;
            backend_for(&server)
        };
        let msg = OutboundMessage::new("Hi", "web-user").unwrap();
        let err = backend.send_message(&msg).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_reset_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/reset"))
            .and(body_json(json!({ "userId": "web-user" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "message": "Session reset successfully"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        backend.reset_session("web-user").await.unwrap();
    }

    #[tokio::test]
    async fn test_reset_session_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/reset"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let err = backend.reset_session("web-user").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Status);
    }

    #[tokio::test]
    async fn test_check_health() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/chat/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "agent": "finance-concierge"
            })))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let health = backend.check_health().await.unwrap();
        assert_eq!(health.status, "ok");
        assert_eq!(health.agent.as_deref(), Some("finance-concierge"));
    }

    #[tokio::test]
    async fn test_check_health_bad_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/chat/health"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("oops", "text/plain"),
            )
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let err = backend.check_health().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
