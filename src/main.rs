//! devproxy
//!
//! Development server and build helper for the web frontend.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌───────────────────────────────────────────────┐
//!   devproxy serve      │  net::listener → http::server → routing       │
//!   ───────────────────▶│        │                          │           │
//!                       │        │            match ────────┴─ no match │
//!                       │        ▼              │                 │     │
//!                       │   request id +        ▼                 ▼     │
//!                       │   tracing       forward to origin   ServeDir  │───▶ backend :8000
//!                       └───────────────────────────────────────────────┘
//!
//!                       ┌───────────────────────────────────────────────┐
//!   devproxy build      │  bundle::graph → bundle::chunks → manifest    │───▶ dist/chunk-manifest.json
//!   ───────────────────▶│        (manualChunks + default split)         │
//!                       └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use devproxy::bundle;
use devproxy::config::{load_or_default, DevConfig};
use devproxy::lifecycle::start_dev_server;
use devproxy::observability::logging::init_logging;
use devproxy::routing::RouteTable;

#[derive(Parser)]
#[command(name = "devproxy")]
#[command(about = "Dev proxy and chunk planner for the web frontend", long_about = None)]
struct Cli {
    /// TOML configuration file; the built-in table is used when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the development server with the proxy table
    Serve,
    /// Plan production chunks for a module graph
    Build {
        /// Module graph JSON produced by the bundler
        #[arg(short, long)]
        graph: PathBuf,

        /// Override build.outDir
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
    /// Validate the configuration and print the route and chunk tables
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "devproxy failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_logging("info");
            return Err(e.into());
        }
    };
    init_logging(&config.observability.log_level);

    tracing::info!(
        config = ?cli.config,
        port = config.server.port,
        routes = config.server.proxy.len(),
        chunks = config.build.manual_chunks().len(),
        "Configuration loaded"
    );

    match cli.command {
        Commands::Serve => start_dev_server(config).await?,
        Commands::Build { graph, out_dir } => {
            let path = bundle::run_build(&config, &graph, out_dir.as_deref())?;
            println!("{}", path.display());
        }
        Commands::Check => print_tables(&config)?,
    }

    tracing::info!("Done");
    Ok(())
}

fn print_tables(config: &DevConfig) -> Result<(), Box<dyn std::error::Error>> {
    let table = RouteTable::from_config(&config.server)?;
    println!("proxy routes ({}):", table.len());
    for route in table.routes() {
        println!(
            "  {:<20} -> {}{}",
            route.prefix(),
            route.target(),
            if route.rewrite_host() { "  (changeOrigin)" } else { "" }
        );
    }

    println!("manual chunks ({}):", config.build.manual_chunks().len());
    for (name, members) in config.build.manual_chunks() {
        println!("  {:<20} {}", name, members.join(", "));
    }
    Ok(())
}
