//! ormkv member directory
//!
//! A small command-line directory stored in an ormkv file backend.
//!
//! # Commands
//!
//! - `add` / `update` / `put` - Insert, update or upsert a member
//! - `remove` - Delete a member by ID
//! - `get` - Look a member up by ID or email
//! - `list` - List members, optionally by team
//! - `inspect` - Show entry counts per table and index

mod commands;
mod directory;

use clap::{Args, Parser, Subcommand};
use commands::members::{self, ListArgs, Lookup};
use directory::Member;
use ormkv_core::SaveMode;
use ormkv_storage::FileBackend;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// ormkv member directory.
#[derive(Parser)]
#[command(name = "ormkv-directory")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the directory log file
    #[arg(global = true, short, long, default_value = "directory.ormkv")]
    path: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Fail when removing a member that does not exist
    #[arg(global = true, long)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct MemberArgs {
    /// Member ID
    #[arg(long)]
    id: u64,

    /// Email address
    #[arg(long)]
    email: String,

    /// Display name
    #[arg(long, default_value = "")]
    name: String,

    /// Team
    #[arg(long, default_value = "")]
    team: String,
}

impl From<MemberArgs> for Member {
    fn from(args: MemberArgs) -> Self {
        Self {
            id: args.id,
            email: args.email,
            name: args.name,
            team: args.team,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new member
    Add(MemberArgs),

    /// Update an existing member
    Update(MemberArgs),

    /// Add or replace a member
    Put(MemberArgs),

    /// Remove a member
    Remove {
        /// Member ID
        #[arg(long)]
        id: u64,
    },

    /// Look up a member
    Get {
        /// Member ID
        #[arg(long, conflicts_with = "email", required_unless_present = "email")]
        id: Option<u64>,

        /// Email address
        #[arg(long)]
        email: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List members
    List {
        /// Only members of this team
        #[arg(short, long)]
        team: Option<String>,

        /// Only members whose name contains this text
        #[arg(long)]
        name: Option<String>,

        /// Maximum number of members
        #[arg(short, long)]
        limit: Option<usize>,

        /// Skip this many members
        #[arg(short, long, default_value = "0")]
        offset: usize,

        /// Newest IDs first
        #[arg(short, long)]
        reverse: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show entry counts per table and index
    Inspect {
        /// Only the table of this record type (e.g. directory.Member)
        #[arg(short, long)]
        table: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let schema = directory::schema(cli.strict)?;
    let mut backend = FileBackend::open_with_create_dirs(&cli.path)?;

    match cli.command {
        Commands::Add(args) => {
            members::write(&schema, &mut backend, &args.into(), SaveMode::Insert)?;
        }
        Commands::Update(args) => {
            members::write(&schema, &mut backend, &args.into(), SaveMode::Update)?;
        }
        Commands::Put(args) => {
            members::write(&schema, &mut backend, &args.into(), SaveMode::Upsert)?;
        }
        Commands::Remove { id } => {
            members::remove(&schema, &mut backend, id)?;
        }
        Commands::Get { id, email, format } => {
            let lookup = match (id, email) {
                (Some(id), _) => Lookup::Id(id),
                (None, Some(email)) => Lookup::Email(email),
                (None, None) => return Err("either --id or --email is required".into()),
            };
            match members::get(&schema, &backend, &lookup)? {
                Some(member) => members::print(&[member], &format)?,
                None => {
                    eprintln!("No member found");
                    std::process::exit(1);
                }
            }
        }
        Commands::List {
            team,
            name,
            limit,
            offset,
            reverse,
            format,
        } => {
            let args = ListArgs {
                team,
                name_contains: name,
                offset,
                limit,
                reverse,
            };
            let found = members::list(&schema, &backend, &args)?;
            members::print(&found, &format)?;
        }
        Commands::Inspect { table, format } => {
            commands::inspect::run(&schema, &backend, table.as_deref(), &format)?;
        }
    }

    Ok(())
}
