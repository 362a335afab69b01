//! An abstraction layer for chat backends.
//!
//! This crate establishes the protocol the exchange controller uses to talk
//! to a conversational backend: send one message and read the reply as a
//! stream of byte chunks, clear the server-side session, and check the
//! backend's health.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to. Decoding the chunks
//! into text is left to the consumer.

#![deny(missing_docs)]

mod backend;
mod error;
mod message;
mod response;

pub use backend::*;
pub use error::*;
pub use message::*;
pub use response::*;
