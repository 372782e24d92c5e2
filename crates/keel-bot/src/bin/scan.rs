//! keel-scan: rank order books by spread times volume weight.
//!
//! Operator aid for picking the pair list: wide, busy books are where a
//! passive maker earns its spread.

use anyhow::Result;
use clap::Parser;

use keel_bot::scan::rank_products;
use keel_exchange::{ExchangeClient, RestClient};

/// Rank order books by spread * 24h volume
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Exchange API base URL
    #[arg(long, default_value = "https://api.exchange.example")]
    api_url: String,

    /// Quote currency to scan against
    #[arg(short, long, default_value = "BTC")]
    quote: String,

    /// How many top candidates to highlight
    #[arg(short = 'n', long, default_value_t = 3)]
    top: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    keel_telemetry::init_logging();
    let args = Args::parse();

    let client = RestClient::public(&args.api_url)?;
    let products = client.fetch_products().await?;
    let reports = rank_products(&products, &args.quote);

    for report in &reports {
        println!("{report}");
    }

    println!("TOP {}:", args.top);
    for report in reports.iter().take(args.top) {
        println!("{report}");
    }

    Ok(())
}
