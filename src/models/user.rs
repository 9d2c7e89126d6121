use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::services::auth_service::AuthError;

/// Permission tier attached to every user record.
///
/// Stored as its snake_case string; the `users.role` column carries a CHECK
/// constraint over the same three values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    DataScientist,
    User,
}

impl Role {
    pub const ALL: [Self; 3] = [Self::Admin, Self::DataScientist, Self::User];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::DataScientist => "data_scientist",
            Self::User => "user",
        }
    }

    /// Parse a role read back from the store. A bad value there is an
    /// integrity fault rather than caller error.
    pub fn from_stored(value: &str, username: &str) -> Result<Self, AuthError> {
        value.parse().map_err(|_| {
            AuthError::Internal(format!("Stored role for {username} is not a valid role"))
        })
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "data_scientist" => Ok(Self::DataScientist),
            "user" => Ok(Self::User),
            other => Err(AuthError::InvalidRole(other.to_string())),
        }
    }
}

/// The single gate every role string passes through before reaching the store.
pub fn validate_role(role: &str) -> Result<Role, AuthError> {
    role.parse()
}

/// A user as exposed to callers. Never carries the credential hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub username: String,
    pub role: Role,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<crate::entities::users::Model> for UserSummary {
    type Error = AuthError;

    fn try_from(model: crate::entities::users::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            role: Role::from_stored(&model.role, &model.username)?,
            username: model.username,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// Username and secret for the bootstrap administrator.
#[derive(Clone)]
pub struct AdminCredentials {
    pub username: String,
    secret: String,
}

impl AdminCredentials {
    #[must_use]
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_every_known_role() {
        for role in Role::ALL {
            assert_eq!(validate_role(role.as_str()).unwrap(), role);
        }
    }

    #[test]
    fn rejects_anything_else() {
        for candidate in ["", "Admin", "ADMIN", " admin", "admin ", "superuser", "data-scientist"] {
            let err = validate_role(candidate).unwrap_err();
            assert!(matches!(err, AuthError::InvalidRole(ref r) if r == candidate));
        }
    }

    #[test]
    fn role_serializes_as_snake_case() {
        let json = serde_json::to_string(&Role::DataScientist).unwrap();
        assert_eq!(json, "\"data_scientist\"");
        assert_eq!(Role::DataScientist.to_string(), "data_scientist");
    }

    #[test]
    fn corrupt_stored_role_is_internal() {
        assert!(matches!(
            Role::from_stored("root", "alice"),
            Err(AuthError::Internal(_))
        ));
        assert_eq!(Role::from_stored("user", "alice").unwrap(), Role::User);
    }

    #[test]
    fn admin_credentials_debug_hides_secret() {
        let creds = AdminCredentials::new("root", "s3cret");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("root"));
        assert!(!rendered.contains("s3cret"));
    }
}
