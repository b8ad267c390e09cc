//! Integer primary keys, one type per table.
//!
//! Every id is a `SERIAL` column in Postgres, so each wrapper is
//! transparent over `i32` in JSON and in sqlx.

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        #[cfg_attr(feature = "postgres", derive(sqlx::Type), sqlx(transparent))]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn as_i32(self) -> i32 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

entity_id!(
    /// A listing in `directory.providers`.
    ProviderId
);
entity_id!(
    /// A public "suggest a supplier" submission.
    SubmissionId
);
entity_id!(
    /// A message sent through the public contact form.
    ContactMessageId
);
entity_id!(
    /// An admin portal account.
    AccountId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_transparent_in_json() {
        let id = ProviderId::new(42);
        assert_eq!(serde_json::to_string(&id).ok().as_deref(), Some("42"));
        let back: SubmissionId = serde_json::from_str("7").unwrap_or(SubmissionId::new(0));
        assert_eq!(back, SubmissionId::new(7));
    }

    #[test]
    fn test_display_and_conversion() {
        let id = SubmissionId::from(7);
        assert_eq!(id.to_string(), "7");
        assert_eq!(i32::from(id), 7);
        assert!(ProviderId::new(1) < ProviderId::new(2));
    }
}
