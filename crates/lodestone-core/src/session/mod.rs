//! Session domain module.
//!
//! This module contains the authenticated-session model, the credential
//! persistence interface and the lifecycle management logic.
//!
//! # Module Structure
//!
//! - `model`: Session state and request types (`Session`, `User`, `Credential`, `AuthFlow`)
//! - `store`: Credential persistence trait (`CredentialStore`)
//! - `manager`: Session lifecycle management (`SessionManager`)
//!
//! # Usage
//!
//! ```ignore
//! use lodestone_core::session::{SessionManager, LoginRequest, AuthFlow};
//! ```

mod manager;
mod model;
mod store;

// Re-export public API
pub use manager::{ALREADY_SIGNED_IN, LOGIN_FAILED, SessionManager};
pub use model::{AuthFlow, AuthFlowKind, Credential, LoginRequest, RegisterRequest, Session, User};
pub use store::{CREDENTIAL_KEY, CredentialStore, MemoryCredentialStore};
