//! Collaborators the controller reports to.
//!
//! The controller task owns its collaborators and calls them one at a
//! time, so implementations only need to be [`Send`]. Closures can be used
//! directly: `FnMut(TranscriptEvent)` is a transcript sink, `FnMut(bool)`
//! a presentation surface and `FnMut(Notification)` a notification
//! surface.

use std::time::Duration;

use crate::transcript::{DisplayMessage, TranscriptEvent};

/// How long a notification stays fully visible.
pub const NOTIFICATION_VISIBLE: Duration = Duration::from_secs(3);

/// How long a notification takes to leave after being visible.
pub const NOTIFICATION_EXIT: Duration = Duration::from_millis(300);

/// Receives the messages of the conversation and owns their rendering.
pub trait TranscriptSink: Send + 'static {
    /// Appends a message to the end of the transcript.
    fn append(&mut self, msg: DisplayMessage);

    /// Drops every message but the initial greeting.
    fn clear_to_initial(&mut self);

    /// Shows a transient "waiting for reply" indicator.
    fn show_transient_indicator(&mut self) {}

    /// Removes the indicator shown by
    /// [`show_transient_indicator`](Self::show_transient_indicator).
    fn remove_transient_indicator(&mut self) {}
}

impl<F> TranscriptSink for F
where
    F: FnMut(TranscriptEvent) + Send + 'static,
{
    #[inline]
    fn append(&mut self, msg: DisplayMessage) {
        self(TranscriptEvent::Append(msg))
    }

    #[inline]
    fn clear_to_initial(&mut self) {
        self(TranscriptEvent::ClearToInitial)
    }

    #[inline]
    fn show_transient_indicator(&mut self) {
        self(TranscriptEvent::ShowIndicator)
    }

    #[inline]
    fn remove_transient_indicator(&mut self) {
        self(TranscriptEvent::RemoveIndicator)
    }
}

/// Reflects whether input is currently accepted.
pub trait PresentationSurface: Send + 'static {
    /// Called with `true` when an operation starts and `false` when the
    /// controller is idle again.
    fn set_busy(&mut self, busy: bool);
}

impl<F> PresentationSurface for F
where
    F: FnMut(bool) + Send + 'static,
{
    #[inline]
    fn set_busy(&mut self, busy: bool) {
        self(busy)
    }
}

/// The flavor of a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// Something finished as requested.
    Success,
    /// Something went wrong.
    Error,
    /// Neutral information.
    Info,
}

/// A transient message, dismissed after [`Notification::lifetime`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Notification {
    /// Text to show.
    pub message: String,
    /// Flavor of the notification.
    pub kind: NotificationKind,
}

impl Notification {
    /// Creates a notification.
    #[inline]
    pub fn new<S: Into<String>>(message: S, kind: NotificationKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns how long the notification exists, exit transition included.
    #[inline]
    pub fn lifetime(&self) -> Duration {
        NOTIFICATION_VISIBLE + NOTIFICATION_EXIT
    }
}

/// Shows transient notifications.
pub trait NotificationSurface: Send + 'static {
    /// Shows a notification. Dismissing it is up to the implementation.
    fn notify(&mut self, notification: Notification);
}

impl<F> NotificationSurface for F
where
    F: FnMut(Notification) + Send + 'static,
{
    #[inline]
    fn notify(&mut self, notification: Notification) {
        self(notification)
    }
}
