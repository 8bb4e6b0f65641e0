//! Registry Validator CLI
//!
//! Loads the registry and reports data health: summary counts, orphans,
//! broken references, and per-element detail.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use arch_atlas::summary::HealthSummary;
use arch_atlas::{AtlasConfig, RegistryGraph};

#[derive(Parser)]
#[command(name = "atlas-validate")]
#[command(about = "Validate registry documents and report data health")]
struct Cli {
    /// Path to an atlas.toml config file
    #[arg(short, long)]
    config: Option<String>,

    /// Override the mapping document path
    #[arg(short, long)]
    mapping: Option<PathBuf>,

    /// Override the workspace root
    #[arg(short, long)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the registry health summary
    Summary {
        /// Exit non-zero when any element is degraded
        #[arg(long)]
        strict: bool,
    },

    /// List elements with no edges at all
    Orphans,

    /// List every broken reference, grouped by element
    Broken,

    /// Show one element in detail
    Element {
        /// Element id ({type}--{slug})
        id: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AtlasConfig::load_from(cli.config.as_deref())?;
    let mapping_path = cli.mapping.unwrap_or_else(|| config.mapping_path());
    let workspace_root = cli.root.unwrap_or_else(|| config.workspace_root());

    let graph = RegistryGraph::load(&mapping_path, &workspace_root)?;

    match cli.command {
        Commands::Summary { strict } => {
            let summary = HealthSummary::compute(&graph);

            println!("🔍 Registry health");
            println!();
            println!("  elements      {}", summary.total);
            println!("  edges         {}", graph.edge_count());
            println!("  healthy       {}", summary.healthy);
            println!("  connected     {}", summary.connected);
            println!("  orphans       {}", summary.orphans);
            println!("  broken refs   {}", summary.broken_refs);
            println!("  missing type  {}", summary.missing_type);
            println!();

            for (type_key, stats) in &summary.by_type {
                println!(
                    "  {:<28} {:>3} total  {:>3} healthy  {:>3} connected",
                    type_key, stats.total, stats.healthy, stats.connected
                );
            }

            let degraded = summary.orphans + summary.broken_refs + summary.missing_type;
            println!();
            if degraded == 0 {
                println!("✅ All {} elements are healthy", summary.total);
            } else {
                println!("⚠️  {} element(s) are degraded", degraded);
                if strict {
                    std::process::exit(1);
                }
            }
            Ok(())
        }

        Commands::Orphans => {
            let orphans = graph.orphans();
            if orphans.is_empty() {
                println!("✅ No orphan elements");
            } else {
                println!("⚠️  {} orphan element(s):", orphans.len());
                for el in orphans {
                    println!("  {} ({})", el.id, el.type_label);
                }
            }
            Ok(())
        }

        Commands::Broken => {
            let mut any = false;
            for el in graph.all_elements() {
                if !el.health.has_broken_refs {
                    continue;
                }
                any = true;
                println!("❌ {} ({})", el.id, el.source_path);
                for raw in &el.health.broken_refs {
                    println!("   └─ {}", raw);
                }
            }
            if !any {
                println!("✅ No broken references");
            } else {
                std::process::exit(1);
            }
            Ok(())
        }

        Commands::Element { id } => {
            let Some(el) = graph.element(&id) else {
                anyhow::bail!("element not found: {}", id);
            };

            println!("{} — {}", el.id, el.name());
            println!("  type     {} ({})", el.type_key, el.type_label);
            println!("  layer    {}", el.layer);
            println!("  domain   {}", el.domain());
            println!("  source   {}", el.source_path);
            println!();
            println!(
                "  health: required fields {}, connected {}, broken refs {}",
                if el.health.has_required_fields { "✅" } else { "❌" },
                if el.health.is_connected { "✅" } else { "❌" },
                if el.health.has_broken_refs { "❌" } else { "✅" },
            );
            if !el.health.missing_fields.is_empty() {
                println!("  missing: {}", el.health.missing_fields.join(", "));
            }

            if !el.relationships.is_empty() {
                println!();
                println!("  outgoing:");
                for rel in &el.relationships {
                    for r in &rel.refs {
                        match r.target_id() {
                            Some(target) => {
                                println!("    {} → {} ({})", rel.field_key, target, rel.semantic)
                            }
                            None => println!("    {} → {} (unresolved)", rel.field_key, r.raw()),
                        }
                    }
                }
            }
            if !el.inbound.is_empty() {
                println!();
                println!("  incoming:");
                for inbound in &el.inbound {
                    println!(
                        "    {} ← {} ({})",
                        inbound.field_key, inbound.source_id, inbound.semantic
                    );
                }
            }
            Ok(())
        }
    }
}
