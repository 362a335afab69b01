//! Messages shown to the user and the transcript that holds them.

use crate::formatter;

/// The greeting a fresh transcript starts with.
pub const DEFAULT_GREETING: &str = "Hello! I'm your Finance Concierge. \
Ask me about your expenses, budgets or balance.";

/// Who a message comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sender {
    /// The person typing.
    User,
    /// The backend agent.
    Bot,
}

/// A formatted message, ready to be rendered.
///
/// The body is markup produced by [`formatter::format`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DisplayMessage {
    sender: Sender,
    body: String,
    is_error: bool,
}

impl DisplayMessage {
    /// Creates a message for the user's own input.
    #[inline]
    pub fn user(text: &str) -> Self {
        Self::new(Sender::User, text, false)
    }

    /// Creates a bot message from reply text.
    #[inline]
    pub fn bot(text: &str) -> Self {
        Self::new(Sender::Bot, text, false)
    }

    /// Creates a bot message that reports a failure.
    #[inline]
    pub fn error(text: &str) -> Self {
        Self::new(Sender::Bot, text, true)
    }

    fn new(sender: Sender, text: &str, is_error: bool) -> Self {
        Self {
            sender,
            body: formatter::format(text),
            is_error,
        }
    }

    /// Returns who sent this message.
    #[inline]
    pub fn sender(&self) -> Sender {
        self.sender
    }

    /// Returns the formatted markup.
    #[inline]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns `true` if this message reports a failure.
    #[inline]
    pub fn is_error(&self) -> bool {
        self.is_error
    }
}

/// A change the controller asks the transcript to make.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TranscriptEvent {
    /// Append a message at the end.
    Append(DisplayMessage),
    /// Drop everything but the greeting.
    ClearToInitial,
    /// Show the "waiting for reply" indicator.
    ShowIndicator,
    /// Remove the "waiting for reply" indicator.
    RemoveIndicator,
}

/// An ordered list of messages that starts with a greeting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<DisplayMessage>,
    indicator_shown: bool,
}

impl Transcript {
    /// Creates a transcript holding only `greeting`.
    #[inline]
    pub fn new(greeting: DisplayMessage) -> Self {
        Self {
            messages: vec![greeting],
            indicator_shown: false,
        }
    }

    /// Appends a message.
    #[inline]
    pub fn push(&mut self, msg: DisplayMessage) {
        self.messages.push(msg);
    }

    /// Drops every message after the greeting.
    #[inline]
    pub fn clear_to_initial(&mut self) {
        self.messages.truncate(1);
    }

    /// Applies an event from the controller.
    pub fn apply(&mut self, event: TranscriptEvent) {
        match event {
            TranscriptEvent::Append(msg) => self.push(msg),
            TranscriptEvent::ClearToInitial => self.clear_to_initial(),
            TranscriptEvent::ShowIndicator => self.indicator_shown = true,
            TranscriptEvent::RemoveIndicator => self.indicator_shown = false,
        }
    }

    /// Returns all messages, greeting first.
    #[inline]
    pub fn messages(&self) -> &[DisplayMessage] {
        &self.messages
    }

    /// Returns the greeting.
    #[inline]
    pub fn greeting(&self) -> &DisplayMessage {
        &self.messages[0]
    }

    /// Returns `true` while the indicator is shown.
    #[inline]
    pub fn is_indicator_shown(&self) -> bool {
        self.indicator_shown
    }
}

impl Default for Transcript {
    #[inline]
    fn default() -> Self {
        Self::new(DisplayMessage::bot(DEFAULT_GREETING))
    }
}
