use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::GeneralConfig;
use crate::entities::users;
use crate::models::user::{Role, UserSummary};
use crate::services::auth_service::AuthError;

pub mod migrator;
pub mod repositories;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1, Duration::from_secs(10)).await
    }

    pub async fn from_config(general: &GeneralConfig) -> Result<Self> {
        Self::with_pool_options(
            &general.database_path,
            general.max_connections,
            general.min_connections,
            Duration::from_secs(general.connect_timeout_secs),
        )
        .await
    }

    /// Connects without touching the schema; call [`Self::migrate`] before use.
    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
        connect_timeout: Duration,
    ) -> Result<Self> {
        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(connect_timeout)
            .acquire_timeout(connect_timeout)
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        info!(
            "Database connected (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    /// Applies pending migrations. Creates missing tables only; never destructive.
    pub async fn migrate(&self) -> Result<(), DbErr> {
        migrator::Migrator::up(&self.conn, None).await?;
        debug!("Migrations applied");
        Ok(())
    }

    // ========== User Repository Methods ==========

    #[must_use]
    pub fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    pub async fn user_exists(&self, username: &str) -> Result<bool, AuthError> {
        self.user_repo().exists(username).await
    }

    pub async fn find_unique_user(&self, username: &str) -> Result<users::Model, AuthError> {
        self.user_repo().find_unique(username).await
    }

    pub async fn insert_user(
        &self,
        username: &str,
        role: Role,
        credential_hash: String,
    ) -> Result<(), AuthError> {
        self.user_repo()
            .insert(username, role, credential_hash)
            .await
    }

    pub async fn insert_user_if_absent(
        &self,
        username: &str,
        role: Role,
        credential_hash: String,
    ) -> Result<bool, AuthError> {
        self.user_repo()
            .insert_if_absent(username, role, credential_hash)
            .await
    }

    pub async fn delete_user(&self, username: &str) -> Result<u64, AuthError> {
        self.user_repo().delete(username).await
    }

    pub async fn set_user_credential_hash(
        &self,
        username: &str,
        credential_hash: String,
    ) -> Result<(), AuthError> {
        self.user_repo()
            .set_credential_hash(username, credential_hash)
            .await
    }

    pub async fn replace_user_credential_hash(
        &self,
        username: &str,
        expected: &str,
        credential_hash: String,
    ) -> Result<bool, AuthError> {
        self.user_repo()
            .replace_credential_hash(username, expected, credential_hash)
            .await
    }

    pub async fn set_user_role(&self, username: &str, role: Role) -> Result<(), AuthError> {
        self.user_repo().set_role(username, role).await
    }

    pub async fn list_users(&self) -> Result<Vec<UserSummary>, AuthError> {
        self.user_repo().list().await
    }
}
