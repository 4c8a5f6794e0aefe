//! `lineup list` — the read path, exactly as an embedding UI would see it.

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use lineup_core::config::load_config_at;
use lineup_core::types::{ItemType, TaxonomyName, TermId};
use lineup_engine::resolver::{resolve_items_at, QueryContext, SortKey};

/// Arguments for `lineup list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Item type to list.
    pub item_type: String,

    /// Restrict to one term of this taxonomy (requires --term).
    #[arg(long, requires = "term")]
    pub taxonomy: Option<String>,

    /// Term id to filter by (requires --taxonomy).
    #[arg(long, requires = "taxonomy")]
    pub term: Option<u64>,

    /// Explicit sort (title or date); disables stored orderings.
    #[arg(long)]
    pub sort: Option<String>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "pos")]
    pos: usize,
    #[tabled(rename = "id")]
    id: u64,
    #[tabled(rename = "title")]
    title: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "created")]
    created: String,
}

#[derive(Serialize)]
struct ItemJson {
    id: u64,
    title: String,
    status: String,
    primary_order: i64,
    created_at: String,
}

impl ListArgs {
    pub fn run(self) -> Result<()> {
        let home = dirs::home_dir().context("could not determine home directory")?;
        let config = load_config_at(&home).context("failed to load scope config")?;

        let mut query = QueryContext::for_type(ItemType::from(self.item_type.as_str()));
        if let (Some(taxonomy), Some(term)) = (self.taxonomy.as_deref(), self.term) {
            query = query.with_term(TaxonomyName::from(taxonomy), TermId(term));
        }
        if let Some(sort) = self.sort.as_deref() {
            query = query.with_sort(match sort {
                "title" => SortKey::TitleAsc,
                "date" => SortKey::DateDesc,
                other => bail!("unknown sort '{other}'; expected: title, date"),
            });
        }

        let items = resolve_items_at(&home, &config, &query, &[])
            .with_context(|| format!("failed to list '{}'", self.item_type))?;

        if self.json {
            let payload: Vec<ItemJson> = items
                .iter()
                .map(|i| ItemJson {
                    id: i.id.0,
                    title: i.title.clone(),
                    status: i.status.to_string(),
                    primary_order: i.primary_order,
                    created_at: i.created_at.to_rfc3339(),
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize items")?
            );
            return Ok(());
        }

        if items.is_empty() {
            println!("no items in '{}'", self.item_type);
            return Ok(());
        }

        let rows: Vec<ItemRow> = items
            .iter()
            .enumerate()
            .map(|(pos, i)| ItemRow {
                pos,
                id: i.id.0,
                title: i.title.clone(),
                status: i.status.to_string(),
                created: i.created_at.format("%Y-%m-%d %H:%M").to_string(),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
