//! Session bookkeeping.
//!
//! This module provides:
//! - `SessionId`: validated opaque session token (normally a GUID)
//! - `SessionMarker`: the single "current session" slot with an expiry
//! - `SessionRegistry`: every session the client has touched, as an ordered set
//!
//! The registry and the marker share the injected key-value store.

pub mod id;
pub mod marker;
pub mod registry;

pub use id::{InvalidSessionId, SessionId};
pub use marker::SessionMarker;
pub use registry::SessionRegistry;
