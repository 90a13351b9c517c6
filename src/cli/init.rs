use super::config::{default_config_path, SafeClubConfig};
use super::state::{ledger_path, save_engine};
use super::Context;
use safeclub::governance::{GovernanceEngine, SystemClock};
use safeclub::identity::MemberId;
use safeclub::transfer::LedgerTransferClient;
use std::fs;
use std::io;
use std::sync::Arc;
use tracing::info;

/// Create a new club whose only member is `founder`.
///
/// Refuses to overwrite an existing state file unless `force` is set; a
/// forced init also starts a fresh ledger journal. Writes a commented
/// default config file when none exists yet.
pub async fn execute(
    ctx: &Context,
    founder: MemberId,
    deposit: Option<u64>,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = ctx.lock_state().await?;
    if ctx.state_path.exists() && !force {
        return Err(format!(
            "State file '{}' already exists. Use --force to start over.",
            ctx.state_path.display()
        )
        .into());
    }

    let engine = GovernanceEngine::new(
        founder,
        ctx.config.governance.clone(),
        Arc::new(LedgerTransferClient::default()),
        Arc::new(SystemClock),
    );
    if let Some(amount) = deposit {
        engine.deposit(amount).await?;
    }
    let journal = ledger_path(&ctx.state_path);
    match fs::remove_file(&journal) {
        Ok(()) => info!(path = %journal.display(), "previous ledger journal removed"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(format!(
                "Failed to remove ledger journal '{}': {}",
                journal.display(),
                e
            )
            .into())
        }
    }
    save_engine(&engine, &ctx.state_path).await?;

    let config_path = ctx
        .config_path
        .clone()
        .unwrap_or_else(default_config_path);
    if !config_path.exists() {
        SafeClubConfig::create_default(&config_path, &ctx.state_path)?;
        info!(path = %config_path.display(), "default config written");
    }

    println!("Initialized club at {}", ctx.state_path.display());
    println!("Founder: {}", founder);
    println!("Balance: {}", engine.get_balance().await?);
    Ok(())
}
