use clap::{Parser, Subcommand};
use safeclub::governance::ProposalId;
use safeclub::identity::MemberId;
use std::path::PathBuf;

pub mod config;
pub mod init;
pub mod members;
pub mod proposals;
pub mod state;
pub mod treasury;
pub mod version;
pub mod window;

use config::{default_config_path, SafeClubConfig};
use state::{StateLock, StateLockError};
use proposals::{Ballot, ProposeArgs};

#[derive(Parser)]
#[command(name = "safeclub")]
#[command(author = "SafeClub Project")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator CLI for a membership-gated club treasury", long_about = None)]
pub struct Cli {
    /// Path to config file (default: ~/.local/share/safeclub/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to state file (overrides [ledger] state_path)
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Identities are 64 hex characters, or any other string, which is hashed
/// with SHA-256 into an identity (e.g. `--as alice`).
#[derive(Subcommand)]
pub enum Commands {
    /// Create a new club with a single founding member
    Init {
        /// Founding member identity
        #[arg(long)]
        founder: MemberId,

        /// Initial treasury deposit
        #[arg(long)]
        deposit: Option<u64>,

        /// Overwrite an existing state file
        #[arg(long)]
        force: bool,
    },

    /// Admit a new member (caller must be a member)
    AddMember {
        /// Acting member
        #[arg(long = "as", value_name = "ID")]
        caller: MemberId,

        /// Identity to admit
        member: MemberId,
    },

    /// Add funds to the treasury
    Deposit {
        amount: u64,
    },

    /// Propose a payout from the treasury
    Propose {
        /// Acting member
        #[arg(long = "as", value_name = "ID")]
        caller: MemberId,

        /// Who receives the funds
        #[arg(long)]
        recipient: MemberId,

        /// Amount to pay out
        #[arg(long)]
        amount: u64,

        /// What the money is for
        #[arg(long, default_value = "")]
        description: String,

        /// Voting window, e.g. "300", "5m", "2 days" (default from config)
        #[arg(long, value_parser = window::parse_window_secs)]
        window: Option<u32>,
    },

    /// Vote on an open proposal
    Vote {
        /// Acting member
        #[arg(long = "as", value_name = "ID")]
        caller: MemberId,

        proposal: ProposalId,

        #[arg(value_enum)]
        ballot: Ballot,
    },

    /// Decide a proposal whose voting window has elapsed
    Finalize {
        proposal: ProposalId,
    },

    /// Pay out a passed proposal
    Execute {
        /// Acting member
        #[arg(long = "as", value_name = "ID")]
        caller: MemberId,

        proposal: ProposalId,
    },

    /// Show one proposal
    Show {
        proposal: ProposalId,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List proposals by id range
    List {
        /// First id (inclusive)
        #[arg(long, default_value_t = 0)]
        from: ProposalId,

        /// Last id (exclusive)
        #[arg(long)]
        to: Option<ProposalId>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the treasury balance
    Balance,

    /// List members
    Members,

    /// Display version information
    Version,
}

/// Resolved settings shared by every command.
pub struct Context {
    pub config: SafeClubConfig,
    pub config_path: Option<PathBuf>,
    pub state_path: PathBuf,
}

impl Context {
    /// Load the config file (or defaults) and resolve the state path.
    pub fn resolve(cli: &Cli) -> Result<Self, Box<dyn std::error::Error>> {
        // A config path that does not exist yet is written by `init`
        let config = match &cli.config {
            Some(path) => SafeClubConfig::load_or_default(path)?,
            None => SafeClubConfig::load_or_default(&default_config_path())?,
        };
        let state_path = cli
            .state
            .clone()
            .unwrap_or_else(|| config.ledger.state_path.clone());

        Ok(Self {
            config,
            config_path: cli.config.clone(),
            state_path,
        })
    }

    /// Keep other safeclub processes off the state file until dropped.
    pub async fn lock_state(&self) -> Result<StateLock, StateLockError> {
        StateLock::acquire(&self.state_path, &self.config.ledger).await
    }
}

pub async fn execute(cli: Cli, ctx: Context) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Init {
            founder,
            deposit,
            force,
        } => init::execute(&ctx, founder, deposit, force).await,
        Commands::AddMember { caller, member } => members::add(&ctx, caller, member).await,
        Commands::Deposit { amount } => treasury::deposit(&ctx, amount).await,
        Commands::Propose {
            caller,
            recipient,
            amount,
            description,
            window,
        } => {
            proposals::propose(
                &ctx,
                ProposeArgs {
                    caller,
                    recipient,
                    amount,
                    description,
                    window_secs: window,
                },
            )
            .await
        }
        Commands::Vote {
            caller,
            proposal,
            ballot,
        } => proposals::vote(&ctx, caller, proposal, ballot).await,
        Commands::Finalize { proposal } => proposals::finalize(&ctx, proposal).await,
        Commands::Execute { caller, proposal } => proposals::execute(&ctx, caller, proposal).await,
        Commands::Show { proposal, json } => proposals::show(&ctx, proposal, json).await,
        Commands::List { from, to, json } => proposals::list(&ctx, from, to, json).await,
        Commands::Balance => treasury::balance(&ctx).await,
        Commands::Members => members::list(&ctx).await,
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}
