//! Verify command handler

use crate::config::Config;
use crate::services::AuthService;

pub async fn cmd_verify(config: &Config, username: &str, key: &str) -> anyhow::Result<()> {
    let service = super::ready_service(config).await?;
    let role = service.authenticate(username, key).await?;

    println!("✓ {username} authenticated as {role}");
    Ok(())
}
