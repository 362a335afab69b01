use concierge_backend::ErrorKind;
use serde::{Deserialize, Serialize};

/// A failure that a preset can inject.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetFailure {
    /// Behaves like a non-success status.
    Status,
    /// Behaves like a broken connection.
    Network,
    /// Behaves like an undecodable body.
    Decode,
}

impl From<PresetFailure> for ErrorKind {
    #[inline]
    fn from(failure: PresetFailure) -> Self {
        match failure {
            PresetFailure::Status => ErrorKind::Status,
            PresetFailure::Network => ErrorKind::Network,
            PresetFailure::Decode => ErrorKind::Decode,
        }
    }
}

/// The events in a preset reply body.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    /// Raw bytes, which may end in the middle of a character.
    #[serde(rename = "chunk")]
    Chunk(Vec<u8>),
    /// Fails the body at this point.
    #[serde(rename = "failure")]
    Failure(PresetFailure),
}

impl PresetEvent {
    /// Creates a chunk event from text.
    #[inline]
    pub fn text<S: AsRef<str>>(text: S) -> Self {
        PresetEvent::Chunk(text.as_ref().as_bytes().to_vec())
    }
}

/// The preset reply for one message.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetReply {
    /// Events in the reply body.
    pub events: Vec<PresetEvent>,
    /// If set, the request fails before any body is streamed.
    pub rejection: Option<PresetFailure>,
}

impl PresetReply {
    /// Creates a `PresetReply` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            rejection: None,
        }
    }

    /// Creates a `PresetReply` whose body is the given text chunks.
    #[inline]
    pub fn with_chunks<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_events(
            chunks.into_iter().map(PresetEvent::text).collect::<Vec<_>>(),
        )
    }

    /// Creates a `PresetReply` that is rejected before streaming.
    #[inline]
    pub fn rejected(failure: PresetFailure) -> Self {
        Self {
            events: vec![],
            rejection: Some(failure),
        }
    }
}
