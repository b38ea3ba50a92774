//! Application layer for Lodestone.
//!
//! This crate wires the core flows to their adapters and exposes them
//! through a single facade, [`LodestoneApp`], that presentation layers drive.

pub mod app;
pub mod snapshot;

pub use app::{LodestoneApp, SIGN_IN_REQUIRED};
pub use snapshot::AppSnapshot;
