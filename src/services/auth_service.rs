//! Domain service for user identities and API-key credentials.
//!
//! Handles bootstrap, credential verification, and user administration.

use thiserror::Error;

use crate::models::user::{Role, UserSummary};

/// Errors specific to authentication and user administration.
///
/// No variant ever carries a plaintext key or a stored hash.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not a valid role: {0}")]
    InvalidRole(String),

    #[error("Username already exists: {0}")]
    DuplicateUser(String),

    #[error("User does not exist: {0}")]
    UserNotFound(String),

    #[error("Multiple user records exist for: {0}")]
    AmbiguousUser(String),

    #[error("Incorrect key provided")]
    BadCredential,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AuthError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("Hashing task failed: {err}"))
    }
}

/// How a calling service should surface an [`AuthError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Unauthorized,
    Conflict,
    BadRequest,
    Internal,
}

impl AuthError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::BadCredential | Self::UserNotFound(_) => ErrorClass::Unauthorized,
            Self::DuplicateUser(_) => ErrorClass::Conflict,
            Self::InvalidRole(_) | Self::Validation(_) => ErrorClass::BadRequest,
            // Unreachable while the unique index holds; an integrity fault, not user error.
            Self::AmbiguousUser(_) | Self::Persistence(_) | Self::Internal(_) => {
                ErrorClass::Internal
            }
        }
    }
}

/// Domain service trait for authentication and user administration.
///
/// `authenticate`, `create_user`, `issue_new_key` and `setup` hash or verify
/// with Argon2 and are deliberately slow; do not hold unrelated locks across them.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Ensures the schema exists and seeds the bootstrap administrator if absent.
    ///
    /// Safe to call on every start; an existing administrator is left untouched.
    async fn setup(&self) -> Result<(), AuthError>;

    /// Verifies a username/key pair and returns the user's role.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UserNotFound`], [`AuthError::AmbiguousUser`] or
    /// [`AuthError::BadCredential`].
    async fn authenticate(&self, username: &str, secret: &str) -> Result<Role, AuthError>;

    /// Creates a user and returns its plaintext API key. This is the only time
    /// the key is visible; only its hash is stored.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::DuplicateUser`] if the username is taken and
    /// [`AuthError::InvalidRole`] if the role is unknown.
    async fn create_user(
        &self,
        username: &str,
        role: &str,
        key: Option<&str>,
    ) -> Result<String, AuthError>;

    /// Removes every record for `username`. Deleting an unknown user is not an error.
    async fn delete_user(&self, username: &str) -> Result<(), AuthError>;

    /// Replaces a user's key and returns the new plaintext key.
    async fn issue_new_key(&self, username: &str, key: Option<&str>) -> Result<String, AuthError>;

    /// Changes a user's role and returns the new role.
    async fn update_role(&self, username: &str, role: &str) -> Result<Role, AuthError>;

    /// Lists every user with its role.
    async fn list_users(&self) -> Result<Vec<UserSummary>, AuthError>;
}
