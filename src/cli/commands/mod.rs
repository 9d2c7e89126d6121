mod setup;
mod users;
mod verify;

pub use setup::cmd_setup;
pub use users::{cmd_create_user, cmd_delete_user, cmd_issue_key, cmd_list_users, cmd_update_role};
pub use verify::cmd_verify;

use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthService, SeaOrmAuthService};

/// Connects, migrates and seeds the administrator so every command sees a ready store.
async fn ready_service(config: &Config) -> anyhow::Result<SeaOrmAuthService> {
    let store = Store::from_config(&config.general).await?;
    let service = SeaOrmAuthService::new(store, &config.security, config.admin_credentials()?)?;
    service.setup().await?;
    Ok(service)
}
