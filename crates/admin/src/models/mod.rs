//! Session-scoped models for the admin portal.

pub mod session;

pub use session::{CurrentAdmin, Flash, FlashKind, keys as session_keys};
