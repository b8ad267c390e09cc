//! Admin portal authorization.
//!
//! Sign-in only proves who someone is. What they may do comes from their
//! role, looked up once at sign-in and frozen into an [`Authorization`] that
//! travels with the session. Handlers ask it yes/no questions instead of
//! re-reading the role.
//!
//! | Role   | view | moderate | edit/hide/show providers | create/delete providers, categories |
//! |--------|------|----------|--------------------------|-------------------------------------|
//! | admin  | yes  | yes      | yes                      | yes                                 |
//! | editor | yes  | yes      | yes                      | no                                  |
//! | viewer | yes  | no       | no                       | no                                  |
//! | none   | no   | no       | no                       | no                                  |

use serde::{Deserialize, Serialize};

use crate::types::{AdminRole, Email};

/// A single permission checked by a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Open the portal and read submissions, providers, categories and messages.
    View,
    /// Approve or reject submissions.
    ModerateSubmissions,
    /// Edit, hide or show existing providers.
    EditProviders,
    /// Create or delete providers; create, rename or delete categories.
    ManageCatalog,
}

impl Capability {
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::View => "view the admin portal",
            Self::ModerateSubmissions => "moderate submissions",
            Self::EditProviders => "edit providers",
            Self::ManageCatalog => "manage the catalog",
        }
    }
}

/// Resolved permissions for one signed-in account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    role: Option<AdminRole>,
}

impl Authorization {
    /// Resolve permissions for `email`.
    ///
    /// The configured bootstrap address is treated as an admin without
    /// consulting the stored role, so a fresh deployment always has one way in.
    #[must_use]
    pub fn resolve(
        email: &Email,
        stored_role: Option<AdminRole>,
        bootstrap_admin: Option<&Email>,
    ) -> Self {
        if bootstrap_admin.is_some_and(|b| b == email) {
            return Self::for_role(Some(AdminRole::Admin));
        }
        Self::for_role(stored_role)
    }

    #[must_use]
    pub const fn for_role(role: Option<AdminRole>) -> Self {
        Self { role }
    }

    #[must_use]
    pub const fn role(&self) -> Option<AdminRole> {
        self.role
    }

    #[must_use]
    pub const fn can(&self, capability: Capability) -> bool {
        use AdminRole::{Admin, Editor, Viewer};

        match (self.role, capability) {
            (None, _) => false,
            (Some(_), Capability::View) => true,
            (Some(Admin | Editor), Capability::ModerateSubmissions | Capability::EditProviders) => {
                true
            }
            (Some(Admin), Capability::ManageCatalog) => true,
            (Some(Viewer), _) | (Some(Editor), Capability::ManageCatalog) => false,
        }
    }

    #[must_use]
    pub const fn can_moderate(&self) -> bool {
        self.can(Capability::ModerateSubmissions)
    }

    #[must_use]
    pub const fn can_edit_providers(&self) -> bool {
        self.can(Capability::EditProviders)
    }

    #[must_use]
    pub const fn can_manage_catalog(&self) -> bool {
        self.can(Capability::ManageCatalog)
    }
}

/// Where a request stands at the admin gate.
///
/// Signed-out visitors are sent to sign in. Signed-in accounts without a role
/// get a restricted notice but stay signed in, so an admin can grant a role
/// without the person having to authenticate again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    SignedOut,
    Restricted,
    Granted(Authorization),
}

impl Gate {
    #[must_use]
    pub const fn evaluate(session: Option<Authorization>) -> Self {
        match session {
            None => Self::SignedOut,
            Some(auth) if auth.can(Capability::View) => Self::Granted(auth),
            Some(_) => Self::Restricted,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ALL: [Capability; 4] = [
        Capability::View,
        Capability::ModerateSubmissions,
        Capability::EditProviders,
        Capability::ManageCatalog,
    ];

    fn grants(role: Option<AdminRole>) -> Vec<bool> {
        let auth = Authorization::for_role(role);
        ALL.iter().map(|&c| auth.can(c)).collect()
    }

    #[test]
    fn test_capability_table() {
        assert_eq!(grants(Some(AdminRole::Admin)), [true, true, true, true]);
        assert_eq!(grants(Some(AdminRole::Editor)), [true, true, true, false]);
        assert_eq!(grants(Some(AdminRole::Viewer)), [true, false, false, false]);
        assert_eq!(grants(None), [false, false, false, false]);
    }

    #[test]
    fn test_bootstrap_email_short_circuits_role() {
        let email = Email::parse("founder@appylink.co.uk").unwrap();
        let bootstrap = Email::parse("Founder@AppyLink.co.uk").unwrap();

        let auth = Authorization::resolve(&email, None, Some(&bootstrap));
        assert_eq!(auth.role(), Some(AdminRole::Admin));

        let auth = Authorization::resolve(&email, Some(AdminRole::Viewer), Some(&bootstrap));
        assert!(auth.can_manage_catalog());
    }

    #[test]
    fn test_stored_role_used_for_others() {
        let email = Email::parse("editor@appylink.co.uk").unwrap();
        let bootstrap = Email::parse("founder@appylink.co.uk").unwrap();
        let auth = Authorization::resolve(&email, Some(AdminRole::Editor), Some(&bootstrap));
        assert_eq!(auth.role(), Some(AdminRole::Editor));
        assert!(Authorization::resolve(&email, None, None).role().is_none());
    }

    #[test]
    fn test_gate() {
        assert_eq!(Gate::evaluate(None), Gate::SignedOut);
        assert_eq!(
            Gate::evaluate(Some(Authorization::for_role(None))),
            Gate::Restricted
        );
        let viewer = Authorization::for_role(Some(AdminRole::Viewer));
        assert_eq!(Gate::evaluate(Some(viewer)), Gate::Granted(viewer));
    }
}
