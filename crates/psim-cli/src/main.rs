use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "psim")]
#[command(about = "Portfolio return simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a portfolio over a historical period
    Simulate {
        /// Comma-separated symbols, in output order (e.g. PETR4,VALE3)
        #[arg(long)]
        symbols: String,

        /// First day, YYYY-MM-DD
        #[arg(long)]
        start: String,

        /// Last day, YYYY-MM-DD
        #[arg(long)]
        end: String,

        /// Allocation per symbol, SYMBOL=AMOUNT (repeatable)
        #[arg(long = "alloc")]
        allocs: Vec<String>,

        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Symbol catalog JSON (overrides catalog.path)
        #[arg(long)]
        catalog: Option<String>,

        /// Seed for the dividend/fallback draws (overrides engine.seed)
        #[arg(long)]
        seed: Option<u64>,

        /// Print JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Symbol catalog utilities
    Catalog {
        #[command(subcommand)]
        cmd: CatalogCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[derive(Subcommand)]
enum CatalogCmd {
    /// Find symbols by exact ticker or name fragment
    Search {
        query: String,

        /// Symbol catalog JSON (overrides catalog.path)
        #[arg(long)]
        catalog: Option<String>,

        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,

        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

fn init_tracing() {
    // stdout carries results; logs go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Simulate {
            symbols,
            start,
            end,
            allocs,
            config_paths,
            catalog,
            seed,
            json,
        } => {
            commands::simulate::run(commands::simulate::SimulateArgs {
                symbols,
                start,
                end,
                allocs,
                config_paths,
                catalog,
                seed,
                json,
            })
            .await?;
        }

        Commands::Catalog { cmd } => match cmd {
            CatalogCmd::Search {
                query,
                catalog,
                config_paths,
                limit,
            } => commands::catalog::search(&query, catalog.as_deref(), &config_paths, limit)?,
        },

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = psim_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}
