//! Newtype IDs for type-safe entity references.
//!
//! The backend issues opaque string identifiers (`_id` on the wire). Use the
//! `define_id!` macro to create wrappers that keep admin IDs and resource IDs
//! from being mixed up.

/// Prefix shared by every locally generated placeholder identifier.
pub const TEMP_ID_PREFIX: &str = "temp_";

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use hr_feedback_core::define_id;
/// define_id!(ReviewerId);
/// define_id!(CycleId);
///
/// let reviewer = ReviewerId::new("r1");
/// let cycle = CycleId::new("r1");
///
/// // These are different types, so this won't compile:
/// // let _: ReviewerId = cycle;
/// assert_eq!(reviewer.as_str(), cycle.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(AdminId);
define_id!(ResourceId);

impl ResourceId {
    /// Build a placeholder identifier for a record the backend has not confirmed.
    ///
    /// `prefix` must itself start with [`TEMP_ID_PREFIX`] (e.g. `temp_team_`).
    #[must_use]
    pub fn temporary(prefix: &str, millis: i64) -> Self {
        debug_assert!(prefix.starts_with(TEMP_ID_PREFIX));
        Self(format!("{prefix}{millis}"))
    }

    /// Returns `true` if this is a locally generated placeholder.
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMP_ID_PREFIX)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary_ids() {
        let id = ResourceId::temporary("temp_team_", 1_700_000_000_000);
        assert_eq!(id.as_str(), "temp_team_1700000000000");
        assert!(id.is_temporary());
        assert!(!ResourceId::new("65f0c1").is_temporary());
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = AdminId::new("a1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"a1\"");
        let parsed: AdminId = serde_json::from_str("\"a1\"").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_display() {
        assert_eq!(ResourceId::from("t1").to_string(), "t1");
    }
}
