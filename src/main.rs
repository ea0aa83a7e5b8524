mod api;
mod cli;
mod config;
mod models;
mod services;
mod store;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gridiron")]
#[command(about = "NFL game predictions from team statistical averages")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Print predictions for one week
    Predict {
        #[arg(short, long)]
        year: i32,
        /// 2 = regular season, 3 = postseason
        #[arg(short, long, default_value = "2")]
        seasontype: u8,
        #[arg(short, long)]
        week: u32,
    },
    /// Rebuild the prediction ledger from past seasons
    Backfill {
        #[arg(long)]
        from_year: i32,
        #[arg(long)]
        to_year: i32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gridiron=info,tower_http=info".into()),
        )
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { port }) => {
            tracing::info!("Starting Gridiron API server on port {}", port);
            api::serve(port).await?;
        }
        Some(Commands::Predict {
            year,
            seasontype,
            week,
        }) => {
            cli::predict_week(year, seasontype, week).await?;
        }
        Some(Commands::Backfill { from_year, to_year }) => {
            tracing::info!("Backfilling prediction history {}..={}", from_year, to_year);
            cli::backfill(from_year, to_year).await?;
        }
        None => {
            tracing::info!("Starting Gridiron API server on port 3000");
            api::serve(3000).await?;
        }
    }

    Ok(())
}
