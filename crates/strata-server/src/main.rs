use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use strata::Config;
use strata_server::{app, build, resolver_from_config};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "strata")]
#[command(version, about = "Strata - per-page render strategies over Rust + HTMX", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "strata.toml", env = "STRATA_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the site over HTTP
    Serve {
        /// Port to listen on (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,

        /// Build every build-time page before accepting requests
        #[arg(long)]
        prebuild: bool,
    },

    /// Pre-render build-time pages to static files
    Build {
        /// Output directory (defaults to [build] output_dir)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List registered pages and their strategies
    Routes,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config: {:?}", cli.config))?
        .with_env_overrides();

    match cli.command {
        Commands::Serve { port, prebuild } => serve(config, port, prebuild).await,
        Commands::Build { out } => {
            let out = out.unwrap_or_else(|| PathBuf::from(&config.build.output_dir));
            let resolver = resolver_from_config(&config).await?;
            let report = build::write_site(&resolver, &out).await?;

            println!("Built {} pages into {}", report.pages.len(), out.display());
            for page in &report.pages {
                println!("  {:<24} {:<12} {} bytes", page.route, page.strategy, page.bytes);
            }
            Ok(())
        }
        Commands::Routes => {
            let pages = strata_server::site::pages(&config)?;
            for page in pages.iter() {
                let timings: Vec<&str> = page.strategy().timings().iter().map(|t| t.as_str()).collect();
                println!("  {:<24} {:<12} fetch at {}", page.route(), page.strategy().name(), timings.join(" + "));
            }
            Ok(())
        }
    }
}

async fn serve(config: Config, port: Option<u16>, prebuild: bool) -> Result<()> {
    let resolver = resolver_from_config(&config).await?;

    if prebuild {
        // Pages that fail here are built lazily on first request instead
        if let Err(e) = resolver.build().await {
            warn!(error = %e, "prebuild failed");
        }
    }

    let app = app::router(resolver)?;

    let port = port.unwrap_or(config.server.port);
    let addr = format!("{}:{}", config.server.host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(addr = %addr, "server running");
    println!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
