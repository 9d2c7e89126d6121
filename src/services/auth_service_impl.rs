//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::credentials::{CredentialHasher, generate_api_key};
use crate::db::Store;
use crate::models::user::{AdminCredentials, Role, UserSummary, validate_role};
use crate::services::auth_service::{AuthError, AuthService};

pub struct SeaOrmAuthService {
    store: Store,
    hasher: CredentialHasher,
    admin: AdminCredentials,
    auto_migrate_hashes: bool,
}

impl SeaOrmAuthService {
    pub fn new(
        store: Store,
        security: &SecurityConfig,
        admin: AdminCredentials,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            store,
            hasher: CredentialHasher::from_config(security)?,
            admin,
            auto_migrate_hashes: security.auto_migrate_hashes,
        })
    }

    /// Rehash with the current params. Best effort: the caller already authenticated.
    async fn migrate_hash(&self, username: &str, old_digest: &str, secret: &str) {
        let new_digest = match self.hasher.hash_blocking(secret).await {
            Ok(digest) => digest,
            Err(e) => {
                warn!(username = %username, error = %e, "Credential rehash failed");
                return;
            }
        };

        match self
            .store
            .replace_user_credential_hash(username, old_digest, new_digest)
            .await
        {
            Ok(true) => info!(username = %username, "Credential hash migrated to current params"),
            Ok(false) => {}
            Err(e) => warn!(username = %username, error = %e, "Failed to store migrated credential"),
        }
    }
}

fn require_username(username: &str) -> Result<(), AuthError> {
    if username.is_empty() {
        return Err(AuthError::Validation("Username cannot be empty".to_string()));
    }
    Ok(())
}

/// Use the caller's key if given, otherwise generate one.
fn key_or_generate(key: Option<&str>) -> Result<String, AuthError> {
    match key {
        Some("") => Err(AuthError::Validation("API key cannot be empty".to_string())),
        Some(key) => Ok(key.to_string()),
        None => Ok(generate_api_key()),
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn setup(&self) -> Result<(), AuthError> {
        self.store.migrate().await?;

        let username = self.admin.username.as_str();
        require_username(username)?;

        if self.store.user_exists(username).await? {
            return Ok(());
        }

        let digest = self.hasher.hash_blocking(self.admin.secret()).await?;

        if self
            .store
            .insert_user_if_absent(username, Role::Admin, digest)
            .await?
        {
            info!(username = %username, "Seeded bootstrap administrator");
        }

        Ok(())
    }

    async fn authenticate(&self, username: &str, secret: &str) -> Result<Role, AuthError> {
        let user = self.store.find_unique_user(username).await?;
        let role = Role::from_stored(&user.role, username)?;

        if !self
            .hasher
            .verify_blocking(&user.credential_hash, secret)
            .await?
        {
            warn!(username = %username, "Rejected credential");
            return Err(AuthError::BadCredential);
        }

        if self.auto_migrate_hashes && self.hasher.needs_rehash(&user.credential_hash) {
            self.migrate_hash(username, &user.credential_hash, secret)
                .await;
        }

        Ok(role)
    }

    async fn create_user(
        &self,
        username: &str,
        role: &str,
        key: Option<&str>,
    ) -> Result<String, AuthError> {
        require_username(username)?;

        // Cheap pre-check so a taken name doesn't cost a hash; the unique index re-checks.
        if self.store.user_exists(username).await? {
            return Err(AuthError::DuplicateUser(username.to_string()));
        }

        let role = validate_role(role)?;
        let api_key = key_or_generate(key)?;

        let digest = self.hasher.hash_blocking(&api_key).await?;
        self.store.insert_user(username, role, digest).await?;

        info!(username = %username, role = %role, "Created user");
        Ok(api_key)
    }

    async fn delete_user(&self, username: &str) -> Result<(), AuthError> {
        let removed = self.store.delete_user(username).await?;

        if removed > 0 {
            info!(username = %username, "Deleted user");
        }
        Ok(())
    }

    async fn issue_new_key(&self, username: &str, key: Option<&str>) -> Result<String, AuthError> {
        let api_key = key_or_generate(key)?;

        self.store.find_unique_user(username).await?;

        let digest = self.hasher.hash_blocking(&api_key).await?;
        self.store.set_user_credential_hash(username, digest).await?;

        info!(username = %username, "Issued new API key");
        Ok(api_key)
    }

    async fn update_role(&self, username: &str, role: &str) -> Result<Role, AuthError> {
        self.store.find_unique_user(username).await?;
        let role = validate_role(role)?;

        self.store.set_user_role(username, role).await?;

        info!(username = %username, role = %role, "Updated user role");
        Ok(role)
    }

    async fn list_users(&self) -> Result<Vec<UserSummary>, AuthError> {
        self.store.list_users().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::API_KEY_PREFIX;

    #[test]
    fn supplied_key_is_kept() {
        assert_eq!(key_or_generate(Some("my-key")).unwrap(), "my-key");
    }

    #[test]
    fn missing_key_is_generated() {
        assert!(key_or_generate(None).unwrap().starts_with(API_KEY_PREFIX));
    }

    #[test]
    fn empty_key_and_username_rejected() {
        assert!(matches!(key_or_generate(Some("")), Err(AuthError::Validation(_))));
        assert!(matches!(require_username(""), Err(AuthError::Validation(_))));
        assert!(require_username("alice").is_ok());
    }
}
