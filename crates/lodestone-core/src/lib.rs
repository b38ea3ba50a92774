//! Session and request orchestration for the Lodestone client.
//!
//! The crate holds the state machines and flows; the network, the credential
//! file and the download destination are reached only through the
//! [`ApiTransport`](api::ApiTransport), [`CredentialStore`](session::CredentialStore)
//! and [`BlobSink`](files::BlobSink) traits.

pub mod api;
pub mod config;
pub mod error;
pub mod error_state;
pub mod files;
pub mod search;
pub mod session;
pub mod view;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export common types
pub use error::{LodestoneError, Result};
pub use error_state::ErrorState;
pub use view::{ViewController, ViewEffect, ViewState};
