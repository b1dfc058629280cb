//! Routemap CLI - static route and dependency discovery for Python services

use clap::{Parser, Subcommand, ValueEnum};
use routemap::config::{load_config, RoutemapConfig};
use routemap::output::emit_json;
use routemap::server::{start_server, AppState};
use routemap::ui::{self, TableBuilder};
use routemap::Analysis;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "routemap")]
#[command(version)]
#[command(about = "Discover the HTTP routes, schemas and module graph of a Python codebase")]
#[command(long_about = r#"
Routemap reads a source tree without running it and reports:
  • Every route with its fully-prefixed path and handler location
  • Request and response schema fields, inheritance included
  • Services, database calls and external APIs each handler touches
  • A file-level import graph, folded into folders when large

Example usage:
  routemap ./backend
  routemap routes ./backend --format table
  routemap graph ./backend --external
  routemap serve ./backend --port 8080
"#)]
struct Cli {
    /// Project root (prints the route list as JSON)
    root: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to routemap.toml in the project root)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List resolved routes
    Routes {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Print the module dependency graph as JSON
    Graph {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Keep unresolved imports as external nodes
        #[arg(long)]
        external: bool,
    },

    /// Serve routes, graph and stats over HTTP
    Serve {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries JSON only
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        None => {
            let root = cli.root.unwrap_or_else(|| PathBuf::from("."));
            let config = load_config(cli.config.as_deref(), &root)?;
            let analysis = analyze(&root, &config)?;
            emit_json(&analysis.routes)?;
        }

        Some(Commands::Routes { path, format }) => {
            let config = load_config(cli.config.as_deref(), &path)?;
            let analysis = analyze(&path, &config)?;
            match format {
                OutputFormat::Json => emit_json(&analysis.routes)?,
                OutputFormat::Table => print_route_table(&analysis),
            }
        }

        Some(Commands::Graph { path, external }) => {
            let mut config = load_config(cli.config.as_deref(), &path)?;
            config.include_external |= external;
            let analysis = analyze(&path, &config)?;
            emit_json(&analysis.graph)?;
        }

        Some(Commands::Serve { path, port }) => {
            let config = load_config(cli.config.as_deref(), &path)?;
            let analysis = analyze(&path, &config)?;
            ui::header(&format!(
                "Serving {} routes from {}",
                analysis.routes.len(),
                analysis.root.display()
            ));

            let state = AppState::new(analysis.root.clone(), config, analysis);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(start_server(port, state))?;
        }
    }

    Ok(())
}

fn analyze(root: &Path, config: &RoutemapConfig) -> anyhow::Result<Analysis> {
    let analysis = Analysis::run(root, config, true)?;
    for failure in &analysis.stats.failures {
        tracing::debug!("not analyzed: {} ({})", failure.file_key, failure.reason);
    }
    if analysis.stats.resolution.fallback {
        ui::warn("No application object found; showing router-local paths");
    }
    Ok(analysis)
}

fn print_route_table(analysis: &Analysis) {
    if analysis.routes.is_empty() {
        ui::warn("No routes found");
        return;
    }
    println!("{}", ui::route_table(&analysis.routes));

    let stats = &analysis.stats;
    let mut summary = TableBuilder::new();
    summary.add_row("Files", stats.store.files);
    summary.add_row("Routers", stats.store.routers);
    summary.add_row("Routes", analysis.routes.len());
    summary.add_row("Models", stats.store.models);
    summary.add_row("Skipped files", stats.failures.len());
    eprintln!("{}", summary.build());
    ui::timing(&format!("{} ms", stats.elapsed_ms));
}
