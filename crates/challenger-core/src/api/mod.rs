//! REST client module for the challenges server.
//!
//! This module provides:
//! - `ApiClient`: reqwest client that fetches live session state and
//!   performs full-replace overwrites
//! - `RestoreClient`: pushes a cached snapshot back to the server verbatim
//! - `OverwriteTransport`: the seam between the two, faked in tests
//!
//! Sessions are addressed by id in the path; no authentication is needed.

pub mod client;
pub mod error;
pub mod restore;

pub use client::{ApiClient, LiveState};
pub use error::ApiError;
pub use restore::{OverwriteTransport, RestoreClient, RestoreOutcome};
