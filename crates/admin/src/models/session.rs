//! Types stored in the admin session.

use serde::{Deserialize, Serialize};

use appy_link_core::access::Authorization;
use appy_link_core::{AccountId, AdminRole, Email};

/// Session-stored identity of the signed-in account.
///
/// The authorization is resolved once at sign-in. A role granted or revoked
/// later takes effect at the next sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub id: AccountId,
    pub email: Email,
    pub authorization: Authorization,
}

impl CurrentAdmin {
    #[must_use]
    pub fn role_label(&self) -> String {
        self.authorization
            .role()
            .map_or_else(|| "no role".to_string(), |role: AdminRole| role.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    Success,
    Error,
}

/// One-shot notice shown on the page a handler redirects to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub text: String,
}

impl Flash {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            text: text.into(),
        }
    }

    /// CSS modifier used by the notice partial.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.kind {
            FlashKind::Success => "success",
            FlashKind::Error => "error",
        }
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current signed-in account.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for the pending flash notice.
    pub const FLASH: &str = "flash";
}
