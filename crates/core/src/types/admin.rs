//! Authenticated HR admin identity.

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::AdminId;

/// The identity of a logged-in HR admin.
///
/// Matches the backend's `hrAdminData` shape (`{"_id": ..., "email": ...}`),
/// which is also the shape persisted in session storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminIdentity {
    /// Backend-issued admin ID.
    #[serde(rename = "_id")]
    pub id: AdminId,
    /// Login email.
    pub email: Email,
}

impl AdminIdentity {
    /// Create a new identity.
    #[must_use]
    pub const fn new(id: AdminId, email: Email) -> Self {
        Self { id, email }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let admin = AdminIdentity::new(AdminId::new("u1"), Email::parse("hr@x.com").unwrap());
        let json = serde_json::to_value(&admin).unwrap();
        assert_eq!(json, serde_json::json!({"_id": "u1", "email": "hr@x.com"}));
    }

    #[test]
    fn test_missing_email_is_rejected() {
        assert!(serde_json::from_str::<AdminIdentity>(r#"{"_id":"u1"}"#).is_err());
    }
}
