use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::user::AdminCredentials;

pub const ADMIN_USERNAME_ENV: &str = "ADMIN_USERNAME";
pub const ADMIN_KEY_ENV: &str = "ADMIN_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub security: SecurityConfig,

    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// "pretty" or "json"
    pub log_format: String,

    /// 0 keeps the tokio default.
    pub worker_threads: usize,

    pub max_connections: u32,

    pub min_connections: u32,

    pub connect_timeout_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:./database/permissions.db".to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            worker_threads: 0,
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// Rehash stored credentials with the current params after a successful authentication
    pub auto_migrate_hashes: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            auto_migrate_hashes: true,
        }
    }
}

/// Seed administrator. `ADMIN_USERNAME` / `ADMIN_KEY` take precedence over the file.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub admin_username: Option<String>,

    #[serde(skip_serializing)]
    pub admin_key: Option<String>,
}

impl std::fmt::Debug for BootstrapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapConfig")
            .field("admin_username", &self.admin_username)
            .field("admin_key", &self.admin_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Config {
    /// Loads the first config file found on the search paths, or defaults.
    pub fn load() -> Result<Self> {
        match Self::locate() {
            Some(path) => Self::load_from_path(&path),
            None => {
                let mut config = Self::default();
                config.apply_env();
                Ok(config)
            }
        }
    }

    /// First existing file among the standard search paths.
    #[must_use]
    pub fn locate() -> Option<PathBuf> {
        Self::config_paths().into_iter().find(|path| path.exists())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.apply_env();
        Ok(config)
    }

    /// Overlays the bootstrap secrets from the process environment (and `.env`).
    pub fn apply_env(&mut self) {
        let _ = dotenvy::dotenv();
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(username) = lookup(ADMIN_USERNAME_ENV) {
            self.bootstrap.admin_username = Some(username);
        }
        if let Some(key) = lookup(ADMIN_KEY_ENV) {
            self.bootstrap.admin_key = Some(key);
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("odsp-auth").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".odsp-auth").join("config.toml"));
        }

        paths
    }

    #[must_use]
    pub fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    /// Writes a default config to `path` unless a file is already there.
    pub fn create_default_if_missing(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }

        Self::default().save_to_path(path)?;
        Ok(true)
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.database_path.trim().is_empty() {
            anyhow::bail!("general.database_path cannot be empty");
        }

        if self.general.min_connections > self.general.max_connections {
            anyhow::bail!("general.min_connections cannot exceed general.max_connections");
        }

        argon2::Params::new(
            self.security.argon2_memory_cost_kib,
            self.security.argon2_time_cost,
            self.security.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params in [security]: {e}"))?;

        Ok(())
    }

    /// Bootstrap administrator credentials; both values must be present and non-empty.
    pub fn admin_credentials(&self) -> Result<AdminCredentials> {
        let username = self
            .bootstrap
            .admin_username
            .as_deref()
            .filter(|u| !u.is_empty())
            .with_context(|| {
                format!("Admin username missing: set {ADMIN_USERNAME_ENV} or bootstrap.admin_username")
            })?;

        let key = self
            .bootstrap
            .admin_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .with_context(|| {
                format!("Admin key missing: set {ADMIN_KEY_ENV} or bootstrap.admin_key")
            })?;

        Ok(AdminCredentials::new(username, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.database_path, "sqlite:./database/permissions.db");
        assert_eq!(config.security.argon2_memory_cost_kib, 8192);
        assert_eq!(config.security.argon2_time_cost, 3);
        assert!(config.security.auto_migrate_hashes);
        assert!(config.bootstrap.admin_username.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [security]
            argon2_time_cost = 4

            [bootstrap]
            admin_username = "root"
            admin_key = "s3cret"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.security.argon2_time_cost, 4);
        assert_eq!(config.security.argon2_parallelism, 1);

        let creds = config.admin_credentials().unwrap();
        assert_eq!(creds.username, "root");
        assert_eq!(creds.secret(), "s3cret");
    }

    #[test]
    fn test_admin_key_not_serialized() {
        let mut config = Config::default();
        config.bootstrap.admin_username = Some("root".to_string());
        config.bootstrap.admin_key = Some("s3cret".to_string());

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[bootstrap]"));
        assert!(toml_str.contains("root"));
        assert!(!toml_str.contains("s3cret"));
        assert!(!format!("{config:?}").contains("s3cret"));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::default();
        config.bootstrap.admin_username = Some("from-file".to_string());

        config.apply_env_from(|key| match key {
            ADMIN_USERNAME_ENV => Some("from-env".to_string()),
            ADMIN_KEY_ENV => Some("env-key".to_string()),
            _ => None,
        });

        let creds = config.admin_credentials().unwrap();
        assert_eq!(creds.username, "from-env");
        assert_eq!(creds.secret(), "env-key");
    }

    #[test]
    fn test_missing_admin_credentials() {
        let mut config = Config::default();
        assert!(config.admin_credentials().is_err());

        config.bootstrap.admin_username = Some("root".to_string());
        config.bootstrap.admin_key = Some(String::new());
        assert!(config.admin_credentials().is_err());
    }

    #[test]
    fn test_create_default_at_custom_path() {
        let dir = std::env::temp_dir().join(format!("odsp-auth-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("custom.toml");

        assert!(Config::create_default_if_missing(&path).unwrap());
        assert!(!Config::create_default_if_missing(&path).unwrap());

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.general.database_path, "sqlite:./database/permissions.db");
        loaded.validate().unwrap();

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_validate_rejects_bad_argon2_params() {
        let mut config = Config::default();
        config.security.argon2_time_cost = 0;
        assert!(config.validate().is_err());
    }
}
