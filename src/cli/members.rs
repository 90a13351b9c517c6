use super::state::{load_engine, save_engine};
use super::Context;
use safeclub::identity::MemberId;

/// Admit `member` on behalf of `caller`.
pub async fn add(
    ctx: &Context,
    caller: MemberId,
    member: MemberId,
) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = ctx.lock_state().await?;
    let engine = load_engine(&ctx.state_path, &ctx.config.governance)?;
    engine.add_member(&caller, member).await?;
    save_engine(&engine, &ctx.state_path).await?;

    println!("Added member {}", member);
    println!("Members: {}", engine.member_count().await?);
    Ok(())
}

/// List members, one hex identity per line.
pub async fn list(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let engine = load_engine(&ctx.state_path, &ctx.config.governance)?;
    for member in engine.members().await? {
        println!("{}", member);
    }
    Ok(())
}
