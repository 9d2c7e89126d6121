//! User administration command handlers

use crate::config::Config;
use crate::services::AuthService;

pub async fn cmd_create_user(
    config: &Config,
    username: &str,
    role: &str,
    key: Option<&str>,
) -> anyhow::Result<()> {
    let service = super::ready_service(config).await?;
    let api_key = service.create_user(username, role, key).await?;

    println!("✓ Created {username} ({role})");
    println!("  API key: {api_key}");
    println!();
    println!("Store this key now; it cannot be shown again.");
    Ok(())
}

pub async fn cmd_delete_user(config: &Config, username: &str) -> anyhow::Result<()> {
    let service = super::ready_service(config).await?;
    service.delete_user(username).await?;

    println!("✓ Removed {username}");
    Ok(())
}

pub async fn cmd_issue_key(config: &Config, username: &str, key: Option<&str>) -> anyhow::Result<()> {
    let service = super::ready_service(config).await?;
    let api_key = service.issue_new_key(username, key).await?;

    println!("✓ Issued new key for {username}");
    println!("  API key: {api_key}");
    println!();
    println!("The previous key no longer works.");
    Ok(())
}

pub async fn cmd_update_role(config: &Config, username: &str, role: &str) -> anyhow::Result<()> {
    let service = super::ready_service(config).await?;
    let role = service.update_role(username, role).await?;

    println!("✓ {username} is now {role}");
    Ok(())
}

pub async fn cmd_list_users(config: &Config, json: bool) -> anyhow::Result<()> {
    let service = super::ready_service(config).await?;
    let users = service.list_users().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    println!("Users ({} total)", users.len());
    println!("{:-<70}", "");

    for user in users {
        println!("{:<32} {:<16} {}", user.username, user.role.as_str(), user.created_at);
    }

    Ok(())
}
