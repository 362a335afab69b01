//! Core logic of the chat client: the exchange controller, streamed reply
//! assembly, and the display formatter.
//!
//! The core never renders anything. It produces immutable
//! [`DisplayMessage`](transcript::DisplayMessage) values and hands them to
//! the collaborators defined in [`surface`], which own all presentation.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod backend_client;
mod controller;
mod error;
pub mod formatter;
mod stream;
pub mod surface;
pub mod transcript;

pub use controller::{Controller, ControllerBuilder, ConversationState};
pub use error::{ExchangeError, ResetError, SubmitError};
pub use stream::{
    DecodeError, NO_RESPONSE, StreamBuffer, Utf8Decoder, finalize_reply,
};
