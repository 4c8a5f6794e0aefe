//! `lineup scope` — which collections participate in ordering.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use lineup_core::config::{load_config_at, save_config_at};
use lineup_core::types::{ItemType, TaxonomyName};
use lineup_engine::reconcile::{initialize_at, InitOutcome};

use crate::FallbackSortArg;

#[derive(Subcommand, Debug)]
pub enum ScopeCommand {
    /// Enable dense primary ordering for an item type.
    EnableType {
        item_type: String,
        /// Tiebreak sort used when deriving a fresh order for this type.
        #[arg(long)]
        fallback_sort: Option<FallbackSortArg>,
    },
    /// Disable primary ordering for an item type.
    DisableType { item_type: String },
    /// Enable per-term permutations for a taxonomy.
    EnableTaxonomy { taxonomy: String },
    /// Disable per-term permutations for a taxonomy.
    DisableTaxonomy { taxonomy: String },
    /// Make a taxonomy's own terms orderable.
    EnableTermOrder { taxonomy: String },
    /// Stop ordering a taxonomy's terms.
    DisableTermOrder { taxonomy: String },
    /// Print the current scope configuration.
    Show,
}

pub fn run(command: ScopeCommand) -> Result<()> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    let mut config = load_config_at(&home).context("failed to load scope config")?;

    match command {
        ScopeCommand::EnableType {
            item_type,
            fallback_sort,
        } => {
            let item_type = ItemType::from(item_type);
            if !config.item_types.contains(&item_type) {
                config.item_types.push(item_type.clone());
            }
            if let Some(sort) = fallback_sort {
                config.fallback_sorts.insert(item_type.clone(), sort.into());
            }
            save_config_at(&home, &config).context("failed to save scope config")?;

            // First enable derives an initial sequence for existing items.
            match initialize_at(&home, &config, &item_type)
                .context("failed to initialize ordering")?
            {
                InitOutcome::Initialized { count } => {
                    println!("enabled ordering for '{item_type}' ({count} items sequenced)");
                }
                InitOutcome::AlreadyOrdered => {
                    println!("enabled ordering for '{item_type}' (existing order kept)");
                }
                InitOutcome::Empty => {
                    println!("enabled ordering for '{item_type}' (no items yet)");
                }
            }
        }
        ScopeCommand::DisableType { item_type } => {
            let item_type = ItemType::from(item_type);
            config.item_types.retain(|t| t != &item_type);
            config.fallback_sorts.remove(&item_type);
            save_config_at(&home, &config).context("failed to save scope config")?;
            println!("disabled ordering for '{item_type}'");
        }
        ScopeCommand::EnableTaxonomy { taxonomy } => {
            let taxonomy = TaxonomyName::from(taxonomy);
            if !config.taxonomies.contains(&taxonomy) {
                config.taxonomies.push(taxonomy.clone());
            }
            save_config_at(&home, &config).context("failed to save scope config")?;
            println!("enabled scoped ordering for taxonomy '{taxonomy}'");
        }
        ScopeCommand::DisableTaxonomy { taxonomy } => {
            let taxonomy = TaxonomyName::from(taxonomy);
            config.taxonomies.retain(|t| t != &taxonomy);
            save_config_at(&home, &config).context("failed to save scope config")?;
            println!("disabled scoped ordering for taxonomy '{taxonomy}'");
        }
        ScopeCommand::EnableTermOrder { taxonomy } => {
            let taxonomy = TaxonomyName::from(taxonomy);
            if !config.term_order.contains(&taxonomy) {
                config.term_order.push(taxonomy.clone());
            }
            save_config_at(&home, &config).context("failed to save scope config")?;
            println!("enabled term ordering for taxonomy '{taxonomy}'");
        }
        ScopeCommand::DisableTermOrder { taxonomy } => {
            let taxonomy = TaxonomyName::from(taxonomy);
            config.term_order.retain(|t| t != &taxonomy);
            save_config_at(&home, &config).context("failed to save scope config")?;
            println!("disabled term ordering for taxonomy '{taxonomy}'");
        }
        ScopeCommand::Show => {
            print_section("item types", config.item_types.iter().map(|t| t.0.as_str()));
            print_section("taxonomies", config.taxonomies.iter().map(|t| t.0.as_str()));
            print_section("term order", config.term_order.iter().map(|t| t.0.as_str()));
            if !config.fallback_sorts.is_empty() {
                println!("{}", "fallback sorts".bold());
                for (item_type, sort) in &config.fallback_sorts {
                    println!("  {item_type}: {sort}");
                }
            }
        }
    }

    Ok(())
}

fn print_section<'a>(title: &str, entries: impl Iterator<Item = &'a str>) {
    println!("{}", title.bold());
    let mut any = false;
    for entry in entries {
        println!("  {entry}");
        any = true;
    }
    if !any {
        println!("  {}", "(none)".bright_black());
    }
}
