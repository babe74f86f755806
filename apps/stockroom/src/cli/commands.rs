//! # CLI Command Implementations
//!
//! Each command opens the configured database, runs one ledger
//! operation and prints the result as text or JSON.

use super::ExportKind;
use crate::api;
use crate::config::Config;
use serde::Serialize;
use std::path::{Path, PathBuf};
use stockroom_core::{
    HistoryFilter, ItemDraft, ItemId, Ledger, LineRequest, NewEmployee, Requisition,
    RequisitionId, RequisitionStatus, StockroomError, TransactionKind, parse_date_bound,
};

// =============================================================================
// FILE LIMITS
// =============================================================================

/// Maximum CSV file size accepted by `import` (10 MB).
const MAX_IMPORT_FILE_SIZE: u64 = 10 * 1024 * 1024;

fn validate_file_size(path: &Path, max_size: u64) -> Result<(), StockroomError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| StockroomError::IoError(format!("Cannot read file metadata: {}", e)))?;
    if metadata.len() > max_size {
        return Err(StockroomError::InvalidInput(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path to a canonical regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, StockroomError> {
    let canonical = path.canonicalize().map_err(|e| {
        StockroomError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;
    if !canonical.is_file() {
        return Err(StockroomError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }
    Ok(canonical)
}

/// Resolve an output path whose parent directory must already exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, StockroomError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let canonical_parent = parent.canonicalize().map_err(|e| {
        StockroomError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;
    if !canonical_parent.is_dir() {
        return Err(StockroomError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }
    let filename = path
        .file_name()
        .ok_or_else(|| StockroomError::IoError("Output path has no filename".to_string()))?;
    Ok(canonical_parent.join(filename))
}

// =============================================================================
// OUTPUT
// =============================================================================

/// Output mode selected by `--json`.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

impl Output {
    fn print_json<T: Serialize>(self, value: &T) -> Result<(), StockroomError> {
        let text = serde_json::to_string_pretty(value)
            .map_err(|e| StockroomError::SerializationError(format!("JSON: {}", e)))?;
        println!("{}", text);
        Ok(())
    }
}

/// Format minor currency units as `units.cents`.
pub fn format_cents(cents: u64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

fn print_requisition(requisition: &Requisition) {
    println!(
        "#{} {} ({}) {} at {}",
        requisition.id,
        requisition.employee_name,
        requisition.department,
        requisition.status,
        requisition.created_at.format("%Y-%m-%d %H:%M")
    );
    for line in &requisition.lines {
        println!("    {:>5} x {} [#{}]", line.quantity, line.item_name, line.item_id);
    }
    if let Some(notes) = &requisition.admin_notes {
        println!("    notes: {}", notes);
    }
}

fn open_ledger(config: &Config) -> Result<Ledger, StockroomError> {
    Ledger::open(&config.database)
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: &Config) -> Result<(), StockroomError> {
    let mut ledger = open_ledger(config)?;
    if config.seed_sample_data {
        let seeded = ledger.seed_if_empty()?;
        if seeded.items > 0 || seeded.employees > 0 {
            tracing::info!(
                items = seeded.items,
                employees = seeded.employees,
                "Loaded sample data into empty database"
            );
        }
    }

    println!("Stockroom Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", config.host);
    println!("  Port:     {}", config.port);
    println!("  Database: {}", config.database.display());
    println!(
        "  Admin:    {}",
        if config.admin_key().is_some() {
            "key required"
        } else {
            "OPEN"
        }
    );
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(config, ledger).await
}

// =============================================================================
// SETUP COMMANDS
// =============================================================================

/// Create a new database, optionally with sample data.
pub fn cmd_init(config: &Config, out: Output, force: bool, seed: bool) -> Result<(), StockroomError> {
    let path = &config.database;
    if path.exists() {
        if !force {
            return Err(StockroomError::InvalidInput(format!(
                "Database '{}' already exists. Use --force to replace it.",
                path.display()
            )));
        }
        std::fs::remove_file(path)
            .map_err(|e| StockroomError::IoError(format!("Cannot remove old database: {}", e)))?;
    }

    let mut ledger = open_ledger(config)?;
    let seeded = if seed {
        ledger.seed_if_empty()?
    } else {
        stockroom_core::SeedReport::default()
    };

    if out.json {
        return out.print_json(&serde_json::json!({
            "database": path.to_string_lossy(),
            "seeded_items": seeded.items,
            "seeded_employees": seeded.employees,
        }));
    }
    println!("Initialized new database at {}", path.display());
    if seed {
        println!(
            "Loaded {} sample items and {} employees",
            seeded.items, seeded.employees
        );
    }
    Ok(())
}

pub fn cmd_seed(config: &Config, out: Output) -> Result<(), StockroomError> {
    let mut ledger = open_ledger(config)?;
    let seeded = ledger.seed_if_empty()?;
    if out.json {
        return out.print_json(&serde_json::json!({
            "seeded_items": seeded.items,
            "seeded_employees": seeded.employees,
        }));
    }
    println!(
        "Loaded {} sample items and {} employees",
        seeded.items, seeded.employees
    );
    Ok(())
}

// =============================================================================
// ITEM COMMANDS
// =============================================================================

pub fn cmd_items(config: &Config, out: Output) -> Result<(), StockroomError> {
    let ledger = open_ledger(config)?;
    let items = ledger.items()?;
    if out.json {
        return out.print_json(&items);
    }

    println!(
        "{:>4}  {:<24} {:<16} {:>8} {:<6} {:>6} {:>10}",
        "ID", "Name", "Category", "Stock", "Unit", "Min", "Price"
    );
    for item in &items {
        println!(
            "{:>4}  {:<24} {:<16} {:>8} {:<6} {:>6} {:>10}{}",
            item.id,
            item.name,
            item.category,
            item.quantity,
            item.unit,
            item.min_stock,
            format_cents(item.price_cents),
            if item.is_low_stock() { "  LOW" } else { "" }
        );
    }
    println!();
    println!("{} items", items.len());
    Ok(())
}

pub fn cmd_add_item(config: &Config, out: Output, draft: &ItemDraft) -> Result<(), StockroomError> {
    let mut ledger = open_ledger(config)?;
    let item = ledger.add_item(draft)?;
    if out.json {
        return out.print_json(&item);
    }
    println!("Added item #{} {} ({} {})", item.id, item.name, item.quantity, item.unit);
    Ok(())
}

pub fn cmd_restock(
    config: &Config,
    out: Output,
    item: u64,
    quantity: u64,
    note: Option<&str>,
) -> Result<(), StockroomError> {
    let mut ledger = open_ledger(config)?;
    let item = ledger.restock(ItemId(item), quantity, note)?;
    if out.json {
        return out.print_json(&item);
    }
    println!(
        "Restocked {}: +{} -> {} {}",
        item.name, quantity, item.quantity, item.unit
    );
    Ok(())
}

pub fn cmd_low_stock(config: &Config, out: Output) -> Result<(), StockroomError> {
    let ledger = open_ledger(config)?;
    let low = ledger.low_stock()?;
    if out.json {
        return out.print_json(&low);
    }
    if low.is_empty() {
        println!("No items at or below minimum stock");
        return Ok(());
    }
    for entry in &low {
        println!(
            "#{} {}: {} {} (min {}, short {})",
            entry.item.id,
            entry.item.name,
            entry.item.quantity,
            entry.item.unit,
            entry.item.min_stock,
            entry.shortfall
        );
    }
    Ok(())
}

// =============================================================================
// EMPLOYEE COMMANDS
// =============================================================================

pub fn cmd_employees(config: &Config, out: Output) -> Result<(), StockroomError> {
    let ledger = open_ledger(config)?;
    let employees = ledger.employees()?;
    if out.json {
        return out.print_json(&employees);
    }
    for employee in &employees {
        println!(
            "{:>4}  {:<24} {:<16} {}",
            employee.id, employee.name, employee.department, employee.email
        );
    }
    Ok(())
}

pub fn cmd_add_employee(
    config: &Config,
    out: Output,
    employee: &NewEmployee,
) -> Result<(), StockroomError> {
    let mut ledger = open_ledger(config)?;
    let employee = ledger.add_employee(employee)?;
    if out.json {
        return out.print_json(&employee);
    }
    println!(
        "Added employee #{} {} ({})",
        employee.id, employee.name, employee.department
    );
    Ok(())
}

// =============================================================================
// REQUISITION COMMANDS
// =============================================================================

pub fn cmd_submit(
    config: &Config,
    out: Output,
    email: &str,
    lines: &[LineRequest],
) -> Result<(), StockroomError> {
    let mut ledger = open_ledger(config)?;
    let employee = ledger.login(email)?;
    let requisition = ledger.submit_requisition(employee.id, lines)?;
    if out.json {
        return out.print_json(&requisition);
    }
    println!("Submitted requisition #{}", requisition.id);
    print_requisition(&requisition);
    Ok(())
}

pub fn cmd_pending(config: &Config, out: Output) -> Result<(), StockroomError> {
    let ledger = open_ledger(config)?;
    let pending = ledger.requisitions(Some(RequisitionStatus::Pending))?;
    if out.json {
        return out.print_json(&pending);
    }
    if pending.is_empty() {
        println!("No pending requisitions");
    }
    for requisition in &pending {
        print_requisition(requisition);
    }
    Ok(())
}

/// Which decision `cmd_decide` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decide {
    Approve,
    Reject,
}

pub fn cmd_decide(
    config: &Config,
    out: Output,
    id: u64,
    decide: Decide,
    notes: Option<&str>,
) -> Result<(), StockroomError> {
    let mut ledger = open_ledger(config)?;
    let id = RequisitionId(id);
    let requisition = match decide {
        Decide::Approve => ledger.approve_requisition(id, notes)?,
        Decide::Reject => ledger.reject_requisition(id, notes)?,
    };
    tracing::debug!(requisition_id = %requisition.id, status = %requisition.status, "Decision recorded");
    if out.json {
        return out.print_json(&requisition);
    }
    print_requisition(&requisition);
    Ok(())
}

// =============================================================================
// REPORT COMMANDS
// =============================================================================

/// History filter arguments as typed on the command line.
#[derive(Debug, Clone, Default)]
pub struct HistoryArgs {
    pub from: Option<String>,
    pub to: Option<String>,
    pub department: Option<String>,
    pub employee: Option<String>,
    pub kind: Option<String>,
    pub item: Option<u64>,
}

impl HistoryArgs {
    pub fn to_filter(&self) -> Result<HistoryFilter, StockroomError> {
        Ok(HistoryFilter {
            from: self
                .from
                .as_deref()
                .map(|v| parse_date_bound(v, false))
                .transpose()?,
            to: self
                .to
                .as_deref()
                .map(|v| parse_date_bound(v, true))
                .transpose()?,
            department: self.department.clone(),
            employee: self.employee.clone(),
            kind: self
                .kind
                .as_deref()
                .map(|k| {
                    TransactionKind::parse(k).ok_or_else(|| {
                        StockroomError::InvalidInput(format!("unknown history kind '{}'", k))
                    })
                })
                .transpose()?,
            item_id: self.item.map(ItemId),
        })
    }
}

pub fn cmd_history(config: &Config, out: Output, args: &HistoryArgs) -> Result<(), StockroomError> {
    let filter = args.to_filter()?;
    let ledger = open_ledger(config)?;
    let records = ledger.history(&filter)?;
    if out.json {
        return out.print_json(&records);
    }
    for record in &records {
        println!(
            "{}  {:<10} {:>5} x {:<20} {} ({}){}",
            record.at.format("%Y-%m-%d %H:%M"),
            record.kind,
            record.quantity,
            record.item_name,
            record.employee_name,
            record.department,
            record
                .note
                .as_deref()
                .map(|n| format!(" - {}", n))
                .unwrap_or_default()
        );
    }
    println!();
    println!("{} records", records.len());
    Ok(())
}

pub fn cmd_summary(config: &Config, out: Output) -> Result<(), StockroomError> {
    let ledger = open_ledger(config)?;
    let summary = ledger.summary()?;
    if out.json {
        return out.print_json(&summary);
    }
    println!("Stockroom Summary");
    println!("=================");
    println!("Database: {}", config.database.display());
    println!();
    println!("Items:          {}", summary.item_count);
    println!("Units in stock: {}", summary.total_units);
    println!("Stock value:    {}", format_cents(summary.inventory_value_cents));
    println!("Low stock:      {}", summary.low_stock_count);
    println!("Employees:      {}", summary.employee_count);
    println!();
    println!("Requisitions:");
    println!("  Pending:  {}", summary.pending_requisitions);
    println!("  Approved: {}", summary.approved_requisitions);
    println!("  Rejected: {}", summary.rejected_requisitions);
    Ok(())
}

// =============================================================================
// CSV COMMANDS
// =============================================================================

/// What `export` wrote, as printed with `--json`.
#[derive(Debug, Serialize)]
pub struct ExportReport {
    pub path: String,
    pub bytes: usize,
}

pub fn cmd_export(
    config: &Config,
    out: Output,
    what: ExportKind,
    output: &Path,
) -> Result<(), StockroomError> {
    let output = validate_output_path(output)?;
    let ledger = open_ledger(config)?;
    let data = match what {
        ExportKind::Items => ledger.export_items_csv()?,
        ExportKind::History => ledger.export_history_csv(&HistoryFilter::default())?,
    };
    std::fs::write(&output, &data)
        .map_err(|e| StockroomError::IoError(format!("Write failed: {}", e)))?;

    let report = ExportReport {
        path: output.display().to_string(),
        bytes: data.len(),
    };
    if out.json {
        return out.print_json(&report);
    }
    println!("Exported {} bytes to {}", report.bytes, report.path);
    Ok(())
}

pub fn cmd_import(config: &Config, out: Output, input: &Path) -> Result<(), StockroomError> {
    let input = validate_file_path(input)?;
    validate_file_size(&input, MAX_IMPORT_FILE_SIZE)?;
    let data = std::fs::read(&input)
        .map_err(|e| StockroomError::IoError(format!("Read failed: {}", e)))?;

    let mut ledger = open_ledger(config)?;
    let summary = ledger.import_items_csv(&data)?;
    if out.json {
        return out.print_json(&summary);
    }
    println!(
        "Imported {}: {} created, {} updated ({} stock corrections)",
        input.display(),
        summary.created,
        summary.updated,
        summary.stock_corrected
    );
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
