//! Proposal commands: propose, vote, finalize, execute, show, list.

use super::state::{load_engine, save_engine};
use super::Context;
use clap::ValueEnum;
use safeclub::governance::{ProposalId, ProposalView};
use safeclub::identity::MemberId;
use std::time::{Duration, UNIX_EPOCH};

/// How a member votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Ballot {
    Yes,
    No,
}

impl Ballot {
    fn support(self) -> bool {
        self == Ballot::Yes
    }
}

/// Terms for a new proposal as given on the command line.
pub struct ProposeArgs {
    pub caller: MemberId,
    pub recipient: MemberId,
    pub amount: u64,
    pub description: String,
    pub window_secs: Option<u32>,
}

pub async fn propose(ctx: &Context, args: ProposeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = ctx.lock_state().await?;
    let engine = load_engine(&ctx.state_path, &ctx.config.governance)?;
    let window = args
        .window_secs
        .unwrap_or(ctx.config.governance.default_voting_window_secs);

    let id = engine
        .create_proposal(
            &args.caller,
            args.recipient,
            args.amount,
            args.description,
            window,
        )
        .await?;
    save_engine(&engine, &ctx.state_path).await?;

    let view = engine.get_proposal(id).await?;
    println!("Proposal {} created", id);
    println!("Voting closes {}", format_time(view.voting_deadline));
    Ok(())
}

pub async fn vote(
    ctx: &Context,
    caller: MemberId,
    id: ProposalId,
    ballot: Ballot,
) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = ctx.lock_state().await?;
    let engine = load_engine(&ctx.state_path, &ctx.config.governance)?;
    engine.cast_vote(&caller, id, ballot.support()).await?;
    save_engine(&engine, &ctx.state_path).await?;

    let view = engine.get_proposal(id).await?;
    println!(
        "Vote recorded on proposal {}: yes {} / no {}",
        id, view.yes_votes, view.no_votes
    );
    Ok(())
}

pub async fn finalize(ctx: &Context, id: ProposalId) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = ctx.lock_state().await?;
    let engine = load_engine(&ctx.state_path, &ctx.config.governance)?;
    let state = engine.finalize_proposal(id).await?;
    save_engine(&engine, &ctx.state_path).await?;

    println!("Proposal {} is {}", id, state);
    Ok(())
}

pub async fn execute(
    ctx: &Context,
    caller: MemberId,
    id: ProposalId,
) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = ctx.lock_state().await?;
    let engine = load_engine(&ctx.state_path, &ctx.config.governance)?;
    let result = engine.execute_proposal(&caller, id).await;
    // A failed execution changes nothing, but a successful one must be
    // persisted before reporting.
    if result.is_ok() {
        save_engine(&engine, &ctx.state_path).await?;
    }
    result?;

    let view = engine.get_proposal(id).await?;
    println!(
        "Proposal {} executed: paid {} to {}",
        id, view.amount, view.recipient
    );
    println!("Balance: {}", engine.get_balance().await?);
    Ok(())
}

pub async fn show(
    ctx: &Context,
    id: ProposalId,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = load_engine(&ctx.state_path, &ctx.config.governance)?;
    let view = engine.get_proposal(id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_view(&view);
    }
    Ok(())
}

pub async fn list(
    ctx: &Context,
    from: ProposalId,
    to: Option<ProposalId>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = load_engine(&ctx.state_path, &ctx.config.governance)?;
    let views = match to {
        Some(to) => engine.list_proposals(from..to).await?,
        None => engine.list_proposals(from..).await?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }
    if views.is_empty() {
        println!("No proposals");
    }
    for view in &views {
        println!(
            "{:>4}  {:<8}  {:>12}  yes {:>3} / no {:>3}  {}",
            view.id, view.state, view.amount, view.yes_votes, view.no_votes, view.description
        );
    }
    Ok(())
}

fn print_view(view: &ProposalView) {
    println!("Proposal {} [{}]", view.id, view.state);
    println!("  proposer:    {}", view.proposer);
    println!("  recipient:   {}", view.recipient);
    println!("  amount:      {}", view.amount);
    println!("  votes:       yes {} / no {}", view.yes_votes, view.no_votes);
    println!("  created:     {}", format_time(view.created_at));
    println!("  deadline:    {}", format_time(view.voting_deadline));
    if !view.description.is_empty() {
        println!("  description: {}", view.description);
    }
}

fn format_time(unix_secs: u64) -> String {
    humantime::format_rfc3339_seconds(UNIX_EPOCH + Duration::from_secs(unix_secs)).to_string()
}
