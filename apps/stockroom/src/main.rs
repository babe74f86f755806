//! # Stockroom Server
//!
//! Office supplies requisitions and stock control.
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! stockroom server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! stockroom init
//! stockroom items
//! stockroom submit --email john@company.com -l 1:5 -l 3:1
//! stockroom approve 1 --notes "collect at reception"
//! stockroom history --from 2024-01-01 --department IT
//! ```

use clap::Parser;
use stockroom::cli::{self, Cli};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "stockroom=info,tower_http=debug";

/// `RUST_LOG` picks the filter; `STOCKROOM_LOG_FORMAT=json` emits JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let json = matches!(
        std::env::var("STOCKROOM_LOG_FORMAT").as_deref(),
        Ok("json")
    );

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    // JSON output must stay parseable.
    if !cli.quiet && !cli.json {
        println!("stockroom {}", env!("CARGO_PKG_VERSION"));
        println!();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!(error = %e, "Command failed");
        std::process::exit(1);
    }
}
