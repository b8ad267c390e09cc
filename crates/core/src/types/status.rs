//! Status enums for various entities.

use serde::{Deserialize, Serialize};

/// Review state of a public listing submission.
///
/// Transitions are one-way: `New` moves to `Approved` or `Rejected`, and a
/// reviewed submission never changes state again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "directory.submission_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    New,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    /// Whether moving from `self` to `next` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::New, Self::Approved | Self::Rejected)
        )
    }

    #[must_use]
    pub const fn is_reviewed(self) -> bool {
        !matches!(self, Self::New)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("invalid submission status: {s}")),
        }
    }
}

/// Admin role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "admin.admin_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Full access, including creating/deleting providers and category management.
    Admin,
    /// Can moderate submissions and edit, hide or show existing providers.
    Editor,
    /// Read-only access to the portal.
    Viewer,
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Editor => write!(f, "editor"),
            Self::Viewer => write!(f, "viewer"),
        }
    }
}

impl std::str::FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "editor" => Ok(Self::Editor),
            "viewer" => Ok(Self::Viewer),
            _ => Err(format!("invalid admin role: {s}")),
        }
    }
}

/// Commercial tier of a provider listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "directory.provider_tier", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ProviderTier {
    #[default]
    Free,
    Featured,
    Sponsor,
}

impl ProviderTier {
    pub const ALL: [Self; 3] = [Self::Free, Self::Featured, Self::Sponsor];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Featured => "featured",
            Self::Sponsor => "sponsor",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::Featured => "Featured",
            Self::Sponsor => "Sponsor",
        }
    }
}

impl std::fmt::Display for ProviderTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "featured" => Ok(Self::Featured),
            "sponsor" => Ok(Self::Sponsor),
            _ => Err(format!("invalid provider tier: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_status_is_monotonic() {
        use SubmissionStatus::{Approved, New, Rejected};

        assert!(New.can_transition_to(Approved));
        assert!(New.can_transition_to(Rejected));
        for reviewed in [Approved, Rejected] {
            for next in [New, Approved, Rejected] {
                assert!(!reviewed.can_transition_to(next), "{reviewed} -> {next}");
            }
        }
        assert!(!New.can_transition_to(New));
    }

    #[test]
    fn test_role_roundtrip_via_str() {
        for role in [AdminRole::Admin, AdminRole::Editor, AdminRole::Viewer] {
            assert_eq!(role.to_string().parse::<AdminRole>(), Ok(role));
        }
        assert!("owner".parse::<AdminRole>().is_err());
    }

    #[test]
    fn test_tier_parse() {
        assert_eq!("sponsor".parse::<ProviderTier>(), Ok(ProviderTier::Sponsor));
        assert!("gold".parse::<ProviderTier>().is_err());
    }
}
