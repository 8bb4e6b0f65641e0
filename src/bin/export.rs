//! Registry Export CLI
//!
//! Loads the registry and exports JSON for downstream renderers: the whole
//! graph, a positioned domain view, or the domain summary cards.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use arch_atlas::summary::{domain_summaries, HealthSummary};
use arch_atlas::view::layout::apply_layout;
use arch_atlas::{AtlasConfig, RegistryGraph, ViewBuilder};

#[derive(Parser)]
#[command(name = "atlas-export")]
#[command(about = "Export registry graph and view models as JSON")]
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
    /// Export the full graph: elements, edges, health summary
    Graph {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export one domain's positioned view model
    Domain {
        /// Domain id
        id: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export one element's positioned context view
    Element {
        /// Element id ({type}--{slug})
        id: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export the domain summary cards
    Domains {
        #[arg(short, long)]
        output: Option<PathBuf>,
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
        Commands::Graph { output } => {
            let elements: Vec<_> = graph.all_elements().collect();
            let report = serde_json::json!({
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "bundle_hash": graph.bundle_hash(),
                "site": graph.mapping().site,
                "health": HealthSummary::compute(&graph),
                "elements": elements,
                "edges": graph.edges(),
            });
            write_json(&report, output)
        }

        Commands::Domain { id, output } => {
            let builder = ViewBuilder::new(&graph);
            let mut view = builder.domain_view(&id);
            apply_layout(&mut view, &config.layout_options());

            let report = serde_json::json!({
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "domain": id,
                "view": view,
            });
            write_json(&report, output)
        }

        Commands::Element { id, output } => {
            if graph.element(&id).is_none() {
                anyhow::bail!("element not found: {}", id);
            }
            let builder = ViewBuilder::new(&graph);
            let mut view = builder.element_view(&id);
            apply_layout(&mut view, &config.layout_options());

            let report = serde_json::json!({
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "element": id,
                "view": view,
            });
            write_json(&report, output)
        }

        Commands::Domains { output } => {
            let report = serde_json::json!({
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "domains": domain_summaries(&graph),
            });
            write_json(&report, output)
        }
    }
}

fn write_json(report: &serde_json::Value, output: Option<PathBuf>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    match output {
        Some(path) => {
            std::fs::write(&path, &json)?;
            println!("✅ Written to {:?}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}
