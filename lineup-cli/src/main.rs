//! Lineup — explicit ordering for item collections.
//!
//! # Usage
//!
//! ```text
//! lineup scope enable-type <type> [--fallback-sort date_desc|date_asc|title_asc|title_desc]
//! lineup scope disable-type <type>
//! lineup scope enable-taxonomy <taxonomy> | disable-taxonomy <taxonomy>
//! lineup scope enable-term-order <taxonomy> | disable-term-order <taxonomy>
//! lineup scope show
//! lineup item add <type> --title <title> [--status <status>] [--terms 1,2]
//! lineup item set-status <type> <id> --status <status>
//! lineup item trash <type> <id>
//! lineup item delete <type> <id>
//! lineup term add <taxonomy> <name>
//! lineup term list <taxonomy> [--by-name]
//! lineup order set <type> <id>...
//! lineup order set-scoped <term_id> <id>...
//! lineup order set-terms <taxonomy> <term_id>...
//! lineup order reset <type> --sort <sort>
//! lineup order reset-scoped <term_id>
//! lineup order reconcile [<type>]
//! lineup list <type> [--taxonomy <name> --term <id>] [--sort title|date] [--json]
//! lineup status [--json]
//! lineup daemon start|stop|status|reconcile|logs
//! ```

mod commands;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    daemon::DaemonCommand, item::ItemCommand, list::ListArgs, order::OrderCommand,
    scope::ScopeCommand, status::StatusArgs, term::TermCommand,
};
use lineup_core::types::{FallbackSort, ItemStatus};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "lineup",
    version,
    about = "Keep drag-and-drop item orderings dense, merged, and queryable",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Enable or disable ordering for item types and taxonomies.
    Scope {
        #[command(subcommand)]
        command: ScopeCommand,
    },

    /// Add, trash, or delete catalog items.
    Item {
        #[command(subcommand)]
        command: ItemCommand,
    },

    /// Manage taxonomy terms.
    Term {
        #[command(subcommand)]
        command: TermCommand,
    },

    /// Save, reset, or repair orderings.
    Order {
        #[command(subcommand)]
        command: OrderCommand,
    },

    /// List items of a type in resolved order.
    List(ListArgs),

    /// Show ordering state across enabled item types.
    Status(StatusArgs),

    /// Manage the Lineup background daemon.
    Daemon {
        #[command(subcommand)]
        command: DaemonCommand,
    },
}

// ---------------------------------------------------------------------------
// Shared argument wrappers — parsed from CLI strings, convert to core types
// ---------------------------------------------------------------------------

/// Thin wrapper so clap can parse `FallbackSort` from CLI args.
#[derive(Debug, Clone, Default)]
pub struct FallbackSortArg(pub FallbackSort);

impl FromStr for FallbackSortArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "date_desc" => Ok(Self(FallbackSort::DateDesc)),
            "date_asc" => Ok(Self(FallbackSort::DateAsc)),
            "title_asc" => Ok(Self(FallbackSort::TitleAsc)),
            "title_desc" => Ok(Self(FallbackSort::TitleDesc)),
            other => Err(format!(
                "unknown sort '{other}'; expected: date_desc, date_asc, title_asc, title_desc"
            )),
        }
    }
}

impl fmt::Display for FallbackSortArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<FallbackSortArg> for FallbackSort {
    fn from(s: FallbackSortArg) -> Self {
        s.0
    }
}

/// Thin wrapper so clap can parse `ItemStatus` from CLI args.
#[derive(Debug, Clone, Default)]
pub struct ItemStatusArg(pub ItemStatus);

impl FromStr for ItemStatusArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "published" => Ok(Self(ItemStatus::Published)),
            "pending" => Ok(Self(ItemStatus::Pending)),
            "draft" => Ok(Self(ItemStatus::Draft)),
            "private" => Ok(Self(ItemStatus::Private)),
            "scheduled" => Ok(Self(ItemStatus::Scheduled)),
            "trashed" => Ok(Self(ItemStatus::Trashed)),
            other => Err(format!(
                "unknown status '{other}'; expected: published, pending, draft, private, scheduled, trashed"
            )),
        }
    }
}

impl From<ItemStatusArg> for ItemStatus {
    fn from(s: ItemStatusArg) -> Self {
        s.0
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Scope { command } => commands::scope::run(command),
        Commands::Item { command } => commands::item::run(command),
        Commands::Term { command } => commands::term::run(command),
        Commands::Order { command } => commands::order::run(command),
        Commands::List(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Daemon { command } => commands::daemon::run(command),
    }
}
