use serde::{Deserialize, Serialize};

/// A single user message to be sent to the backend.
///
/// The text is always trimmed and non-empty, which is enforced by
/// [`OutboundMessage::new`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    #[serde(rename = "message")]
    text: String,
    user_id: String,
}

impl OutboundMessage {
    /// Creates a message from raw user input.
    ///
    /// Returns `None` if the input is empty after trimming.
    pub fn new<S: Into<String>>(raw: &str, user_id: S) -> Option<Self> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            text: text.to_owned(),
            user_id: user_id.into(),
        })
    }

    /// Returns the message text.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the user id that identifies the server-side session.
    #[inline]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

/// The health report of a backend.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Status string reported by the backend, `"ok"` when healthy.
    pub status: String,
    /// Name of the agent behind the backend, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
}
