use std::fmt::{self, Display};
use std::mem;

/// The text shown when a reply finishes without any content.
pub const NO_RESPONSE: &str = "No response from agent.";

/// Error produced when a reply body is not valid UTF-8.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DecodeError {
    /// An invalid byte sequence starts at `offset` within the body.
    Invalid {
        /// Byte offset from the start of the body.
        offset: usize,
    },
    /// The body ended in the middle of a character.
    Truncated {
        /// Byte offset where the incomplete character starts.
        offset: usize,
    },
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Invalid { offset } => {
                write!(f, "invalid utf-8 sequence at byte {offset}")
            }
            DecodeError::Truncated { offset } => {
                write!(f, "body ends with an incomplete character at byte {offset}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// A UTF-8 decoder that keeps state between chunks.
///
/// Bytes of a character split across two chunks are held back until the
/// rest of the character arrives.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
    consumed: usize,
}

impl Utf8Decoder {
    /// Decodes the next chunk, returning all complete characters so far.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<String, DecodeError> {
        self.pending.extend_from_slice(chunk);

        let valid_len = match str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            Err(err) => match err.error_len() {
                Some(_) => {
                    return Err(DecodeError::Invalid {
                        offset: self.consumed + err.valid_up_to(),
                    });
                }
                // The tail is the start of a character, wait for the rest.
                None => err.valid_up_to(),
            },
        };

        let tail = self.pending.split_off(valid_len);
        let decoded = mem::replace(&mut self.pending, tail);
        self.consumed += decoded.len();
        String::from_utf8(decoded).map_err(|err| DecodeError::Invalid {
            offset: self.consumed + err.utf8_error().valid_up_to(),
        })
    }

    /// Checks that no incomplete character is left over.
    pub fn finish(self) -> Result<(), DecodeError> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(DecodeError::Truncated {
                offset: self.consumed,
            })
        }
    }
}

/// Collects the decoded text of one streamed reply, in arrival order.
#[derive(Debug, Default)]
pub struct StreamBuffer {
    decoder: Utf8Decoder,
    chunks: Vec<String>,
}

impl StreamBuffer {
    /// Decodes and appends a chunk of the body.
    pub fn push(&mut self, chunk: &[u8]) -> Result<(), DecodeError> {
        let text = self.decoder.decode(chunk)?;
        if !text.is_empty() {
            self.chunks.push(text);
        }
        Ok(())
    }

    /// Returns how many text pieces have been collected.
    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns `true` if nothing has been decoded yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Ends the stream and joins the collected text.
    pub fn finish(self) -> Result<String, DecodeError> {
        self.decoder.finish()?;
        Ok(self.chunks.concat())
    }
}

/// Trims a finished reply, falling back to [`NO_RESPONSE`] when nothing is
/// left.
pub fn finalize_reply(text: &str) -> &str {
    let text = text.trim();
    if text.is_empty() { NO_RESPONSE } else { text }
}
