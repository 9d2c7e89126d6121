pub mod cli;
pub mod config;
pub mod credentials;
pub mod db;
pub mod entities;
pub mod models;
pub mod services;

use anyhow::Context;
use cli::{Cli, Commands};
pub use config::Config;
pub use models::user::{AdminCredentials, Role, UserSummary};
pub use services::{AuthError, AuthService, ErrorClass, SeaOrmAuthService};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Loads config from `--config` or the standard search paths.
pub fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    config.validate()?;
    Ok(config)
}

/// The file `load_config` reads from, if any.
#[must_use]
pub fn config_source(cli: &Cli) -> Option<PathBuf> {
    cli.config.clone().or_else(Config::locate)
}

/// Writes a default config to `--config`, or `./config.toml` when none is given.
pub fn init_config(path: Option<&Path>) -> anyhow::Result<()> {
    let path = path.map_or_else(Config::default_config_path, Path::to_path_buf);

    if Config::create_default_if_missing(&path)? {
        println!("✓ Config file created at {}. Edit it and run again.", path.display());
    } else {
        println!("{} already exists; leaving it untouched.", path.display());
    }
    Ok(())
}

pub fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.general.log_format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .context("Failed to install tracing subscriber")?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .context("Failed to install tracing subscriber")?;
    }

    Ok(())
}

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    match cli.command {
        Commands::Init => init_config(cli.config.as_deref()),

        Commands::Setup => cli::cmd_setup(&config).await,

        Commands::Verify { username, key } => cli::cmd_verify(&config, &username, &key).await,

        Commands::CreateUser {
            username,
            role,
            key,
        } => cli::cmd_create_user(&config, &username, &role, key.as_deref()).await,

        Commands::DeleteUser { username } => cli::cmd_delete_user(&config, &username).await,

        Commands::IssueKey { username, key } => {
            cli::cmd_issue_key(&config, &username, key.as_deref()).await
        }

        Commands::UpdateRole { username, role } => {
            cli::cmd_update_role(&config, &username, &role).await
        }

        Commands::ListUsers { json } => cli::cmd_list_users(&config, json).await,
    }
}
