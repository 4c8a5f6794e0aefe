//! `lineup term` — taxonomy term management.

use anyhow::{Context, Result};
use clap::Subcommand;
use tabled::{settings::Style, Table, Tabled};

use lineup_core::config::load_config_at;
use lineup_core::taxonomy::add_term_at;
use lineup_core::types::TaxonomyName;
use lineup_engine::resolver::{resolve_terms_at, TermSort};

#[derive(Subcommand, Debug)]
pub enum TermCommand {
    /// Add a term to a taxonomy (created on first use).
    Add { taxonomy: String, name: String },
    /// List a taxonomy's terms in resolved order.
    List {
        taxonomy: String,
        /// Sort alphabetically even when term ordering is enabled.
        #[arg(long)]
        by_name: bool,
    },
}

#[derive(Tabled)]
struct TermRow {
    #[tabled(rename = "id")]
    id: u64,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "order")]
    order: i64,
}

pub fn run(command: TermCommand) -> Result<()> {
    let home = dirs::home_dir().context("could not determine home directory")?;

    match command {
        TermCommand::Add { taxonomy, name } => {
            let taxonomy = TaxonomyName::from(taxonomy);
            let term = add_term_at(&home, &taxonomy, &name)
                .with_context(|| format!("failed to add term to '{taxonomy}'"))?;
            println!("added term {} ('{}') to '{taxonomy}'", term.id, term.name);
        }
        TermCommand::List { taxonomy, by_name } => {
            let taxonomy = TaxonomyName::from(taxonomy);
            let config = load_config_at(&home).context("failed to load scope config")?;
            let sort = by_name.then_some(TermSort::NameAsc);
            let terms = resolve_terms_at(&home, &config, &taxonomy, sort)
                .with_context(|| format!("failed to list terms of '{taxonomy}'"))?;
            if terms.is_empty() {
                println!("no terms in '{taxonomy}'");
                return Ok(());
            }
            let rows: Vec<TermRow> = terms
                .into_iter()
                .map(|t| TermRow {
                    id: t.id.0,
                    name: t.name,
                    order: t.order_value,
                })
                .collect();
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{table}");
        }
    }

    Ok(())
}
