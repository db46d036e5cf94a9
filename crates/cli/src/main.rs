//! Orderline CLI - publishing and diagnostics tools.
//!
//! # Usage
//!
//! ```bash
//! # Publish a generated sample order onto the stream
//! orderline publish --sample
//!
//! # Publish five sample orders
//! orderline publish --sample --count 5
//!
//! # Publish an order payload from a file
//! orderline publish --file order.json
//!
//! # Look an order up directly in storage (bypasses the service cache)
//! orderline order b563feb7b2b84b6test
//! ```
//!
//! # Commands
//!
//! - `publish` - Validate and publish order payloads to the stream broker
//! - `order` - Fetch one order straight from the database

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "orderline")]
#[command(author, version, about = "Orderline CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish order payloads onto the stream broker
    Publish {
        /// Path to a JSON order payload
        #[arg(short, long, conflicts_with = "sample")]
        file: Option<String>,

        /// Generate sample order payloads instead of reading a file
        #[arg(short, long)]
        sample: bool,

        /// How many sample orders to publish
        #[arg(short, long, default_value_t = 1, requires = "sample")]
        count: u32,
    },
    /// Fetch one order directly from the database
    Order {
        /// The order id to look up
        id: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Publish {
            file,
            sample,
            count,
        } => {
            if sample {
                commands::publish::samples(count).await?;
            } else if let Some(path) = file {
                commands::publish::from_file(&path).await?;
            } else {
                return Err("pass either --file <path> or --sample".into());
            }
        }
        Commands::Order { id } => {
            commands::order::show(&id).await?;
        }
    }
    Ok(())
}
