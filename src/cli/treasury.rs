use super::state::{load_engine, save_engine};
use super::Context;

pub async fn deposit(ctx: &Context, amount: u64) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = ctx.lock_state().await?;
    let engine = load_engine(&ctx.state_path, &ctx.config.governance)?;
    let balance = engine.deposit(amount).await?;
    save_engine(&engine, &ctx.state_path).await?;

    println!("Deposited {}. Balance: {}", amount, balance);
    Ok(())
}

pub async fn balance(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let engine = load_engine(&ctx.state_path, &ctx.config.governance)?;
    println!("{}", engine.get_balance().await?);
    Ok(())
}
