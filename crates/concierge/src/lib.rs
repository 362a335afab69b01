//! A terminal client for the finance concierge agent.
//!
//! The crate includes a CLI tool for chatting in the terminal. The renderer
//! in [`terminal`] can also be used on its own to print the markup produced
//! by the core crate.

#![deny(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate tracing;

pub mod terminal;

/// Re-exports of [`concierge_core`] crate.
pub mod core {
    pub use concierge_core::*;
}

/// Re-exports of [`concierge_backend`] crate.
pub mod backend {
    pub use concierge_backend::*;
}

/// Re-exports of [`concierge_http_backend`] crate.
pub mod http {
    pub use concierge_http_backend::*;
}
