use concierge_backend::ChatBackend;

use super::Controller;
use crate::backend_client::BackendClient;
use crate::surface::{NotificationSurface, PresentationSurface, TranscriptSink};

const DEFAULT_USER_ID: &str = "web-user";

/// [`Controller`] builder.
pub struct ControllerBuilder {
    pub(crate) backend: BackendClient,
    pub(crate) user_id: String,
    pub(crate) transcript: Option<Box<dyn TranscriptSink>>,
    pub(crate) presentation: Option<Box<dyn PresentationSurface>>,
    pub(crate) notifier: Option<Box<dyn NotificationSurface>>,
    pub(crate) health_check: bool,
}

impl ControllerBuilder {
    /// Creates a new builder with the specified backend.
    #[inline]
    pub fn with_backend<B: ChatBackend + 'static>(backend: B) -> Self {
        Self {
            backend: BackendClient::new(backend),
            user_id: DEFAULT_USER_ID.to_owned(),
            transcript: None,
            presentation: None,
            notifier: None,
            health_check: false,
        }
    }

    /// Sets the user id sent with every request. Defaults to `web-user`.
    #[inline]
    pub fn with_user_id<S: Into<String>>(mut self, user_id: S) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Sets where the conversation messages go.
    #[inline]
    pub fn with_transcript_sink(mut self, sink: impl TranscriptSink) -> Self {
        self.transcript = Some(Box::new(sink));
        self
    }

    /// Sets the surface that reflects whether input is accepted.
    #[inline]
    pub fn with_presentation(
        mut self,
        presentation: impl PresentationSurface,
    ) -> Self {
        self.presentation = Some(Box::new(presentation));
        self
    }

    /// Sets where transient notifications go.
    #[inline]
    pub fn with_notifier(mut self, notifier: impl NotificationSurface) -> Self {
        self.notifier = Some(Box::new(notifier));
        self
    }

    /// Checks the backend health once the controller starts, warning
    /// through the notifier if it cannot be reached.
    #[inline]
    pub fn with_health_check(mut self) -> Self {
        self.health_check = true;
        self
    }

    /// Builds the controller and starts it.
    ///
    /// Must be called within a Tokio runtime.
    #[inline]
    pub fn build(self) -> Controller {
        Controller::spawn_from_builder(self)
    }
}
