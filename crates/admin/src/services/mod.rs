//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Magic link, password, confirmed sign-up and reset flows; role resolution
//! - `email` - Email delivery via SMTP
//! - `moderation` - Transactional submission review and category integrity

pub mod auth;
pub mod email;
pub mod moderation;

pub use auth::{AuthError, AuthService};
pub use email::{EmailError, EmailService};
pub use moderation::{ModerationError, ModerationService};
