//! # Stockroom CLI Module
//!
//! Command-line access to the same database the server uses.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` / `seed` - Create the database, load sample data
//! - `items`, `add-item`, `restock`, `low-stock` - Catalogue and stock
//! - `employees`, `add-employee` - Staff
//! - `submit`, `pending`, `approve`, `reject` - Requisition workflow
//! - `history`, `summary` - Reports
//! - `export`, `import` - CSV files

mod commands;

use crate::config::{Config, DEFAULT_CONFIG_FILE};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use stockroom_core::{LineRequest, StockroomError};

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Stockroom - office supplies requisitions and stock control
#[derive(Parser, Debug)]
#[command(name = "stockroom")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the TOML config file [default: stockroom.toml]
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the database (overrides config and STOCKROOM_DB)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// What `export` writes.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportKind {
    Items,
    History,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Do not load sample data into an empty database
        #[arg(long)]
        no_seed: bool,
    },

    /// Initialize a new database
    Init {
        /// Replace an existing database
        #[arg(short, long)]
        force: bool,

        /// Leave the new database empty
        #[arg(long)]
        no_seed: bool,
    },

    /// Load the sample catalogue and staff into empty tables
    Seed,

    /// List items
    Items,

    /// Add an item to the catalogue
    AddItem {
        #[arg(short, long)]
        name: String,

        /// Opening stock
        #[arg(short = 'Q', long, default_value = "0")]
        quantity: u64,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        unit: Option<String>,

        /// Low-stock threshold
        #[arg(long)]
        min_stock: Option<u64>,

        /// Unit price in cents
        #[arg(long)]
        price_cents: Option<u64>,
    },

    /// Receive stock for an item
    Restock {
        /// Item ID
        item: u64,

        /// Units received
        quantity: u64,

        #[arg(short, long)]
        note: Option<String>,
    },

    /// List employees
    Employees,

    /// Register an employee
    AddEmployee {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        department: String,

        #[arg(short, long)]
        email: String,
    },

    /// Submit a requisition on behalf of an employee
    Submit {
        /// Employee email
        #[arg(short, long)]
        email: String,

        /// Lines as ITEM_ID:QUANTITY (repeatable)
        #[arg(short, long = "line", required = true, value_parser = parse_line)]
        lines: Vec<LineRequest>,
    },

    /// Show the approval queue (oldest first)
    Pending,

    /// Approve a pending requisition
    Approve {
        /// Requisition ID
        id: u64,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Reject a pending requisition
    Reject {
        /// Requisition ID
        id: u64,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Show stock movement history (newest first)
    History {
        /// From date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        from: Option<String>,

        /// To date, inclusive
        #[arg(long)]
        to: Option<String>,

        #[arg(long)]
        department: Option<String>,

        /// Employee name (substring)
        #[arg(long)]
        employee: Option<String>,

        /// approved, rejected, restock or correction
        #[arg(long)]
        kind: Option<String>,

        /// Item ID
        #[arg(long)]
        item: Option<u64>,
    },

    /// List items at or below their minimum stock
    LowStock,

    /// Show dashboard totals
    Summary,

    /// Export items or history as CSV
    Export {
        #[arg(value_enum)]
        what: ExportKind,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Create or update items from a CSV file
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },
}

/// Parse `ITEM_ID:QUANTITY`.
pub fn parse_line(value: &str) -> Result<LineRequest, String> {
    let (item, quantity) = value
        .split_once(':')
        .ok_or_else(|| format!("expected ITEM_ID:QUANTITY, got '{}'", value))?;
    let item_id = item
        .trim()
        .parse()
        .map_err(|_| format!("invalid item id '{}'", item))?;
    let quantity = quantity
        .trim()
        .parse()
        .map_err(|_| format!("invalid quantity '{}'", quantity))?;
    Ok(LineRequest {
        item_id: stockroom_core::ItemId(item_id),
        quantity,
    })
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Resolve configuration: file, then environment, then CLI flags.
pub fn resolve_config(cli: &Cli) -> Result<Config, StockroomError> {
    let (path, explicit) = match &cli.config {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    let mut config = Config::load(&path, explicit)?;
    if let Some(database) = &cli.database {
        config.database = database.clone();
    }
    Ok(config)
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), StockroomError> {
    let mut config = resolve_config(&cli)?;
    if cli.verbose {
        tracing::info!(database = %config.database.display(), "Configuration resolved");
    }
    let out = Output { json: cli.json };

    match cli.command {
        Some(Commands::Server {
            host,
            port,
            no_seed,
        }) => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if no_seed {
                config.seed_sample_data = false;
            }
            cmd_server(&config).await
        }
        Some(Commands::Init { force, no_seed }) => cmd_init(&config, out, force, !no_seed),
        Some(Commands::Seed) => cmd_seed(&config, out),
        Some(Commands::Items) => cmd_items(&config, out),
        Some(Commands::AddItem {
            name,
            quantity,
            category,
            unit,
            min_stock,
            price_cents,
        }) => cmd_add_item(
            &config,
            out,
            &stockroom_core::ItemDraft {
                name,
                category,
                unit,
                quantity,
                min_stock,
                price_cents,
            },
        ),
        Some(Commands::Restock {
            item,
            quantity,
            note,
        }) => cmd_restock(&config, out, item, quantity, note.as_deref()),
        Some(Commands::Employees) => cmd_employees(&config, out),
        Some(Commands::AddEmployee {
            name,
            department,
            email,
        }) => cmd_add_employee(
            &config,
            out,
            &stockroom_core::NewEmployee {
                name,
                department,
                email,
            },
        ),
        Some(Commands::Submit { email, lines }) => cmd_submit(&config, out, &email, &lines),
        Some(Commands::Pending) => cmd_pending(&config, out),
        Some(Commands::Approve { id, notes }) => {
            cmd_decide(&config, out, id, Decide::Approve, notes.as_deref())
        }
        Some(Commands::Reject { id, notes }) => {
            cmd_decide(&config, out, id, Decide::Reject, notes.as_deref())
        }
        Some(Commands::History {
            from,
            to,
            department,
            employee,
            kind,
            item,
        }) => {
            let query = HistoryArgs {
                from,
                to,
                department,
                employee,
                kind,
                item,
            };
            cmd_history(&config, out, &query)
        }
        Some(Commands::LowStock) => cmd_low_stock(&config, out),
        Some(Commands::Export { what, output }) => cmd_export(&config, out, what, &output),
        Some(Commands::Import { input }) => cmd_import(&config, out, &input),
        Some(Commands::Summary) | None => cmd_summary(&config, out),
    }
}

// =============================================================================
// TESTS
// =============================================================================
