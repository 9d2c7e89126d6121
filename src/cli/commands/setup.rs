//! Setup command handler

use crate::config::Config;

pub async fn cmd_setup(config: &Config) -> anyhow::Result<()> {
    super::ready_service(config).await?;

    println!("✓ Database ready at {}", config.general.database_path);
    Ok(())
}
