//! Core types for Appy Link.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod slug;
pub mod status;
pub mod web_url;

pub use email::{Email, EmailError};
pub use id::*;
pub use slug::{CategorySlug, SlugError};
pub use status::*;
pub use web_url::{WebUrl, WebUrlError, is_web_url};
