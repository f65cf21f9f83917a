// MHR Ownership - Command Line
// Imports legacy ownership records and validates registration requests against them.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::env;
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use mhr_ownership::{
    CurrentState, HistoryProvider, LegacyHistoryProvider, SqliteHistoryProvider, TransferRequest,
    ValidationConfig, ValidationEngine,
};

const USAGE: &str = "Usage:
  mhr-validate import-legacy <legacy.csv> <db>
  mhr-validate validate <db> <MHR> <request.json> [--staff]
  mhr-validate groups <db> <MHR>";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("import-legacy") if args.len() == 4 => run_import(&args[2], &args[3]),
        Some("validate") if args.len() == 5 || args.len() == 6 => {
            let staff = match args.get(5).map(String::as_str) {
                None => false,
                Some("--staff") => true,
                Some(other) => bail!("Unknown option '{}'\n{}", other, USAGE),
            };
            run_validate(&args[2], &args[3], &args[4], staff)
        }
        Some("groups") if args.len() == 4 => run_groups(&args[2], &args[3]),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

fn run_import(csv_path: &str, db_path: &str) -> Result<()> {
    println!("🗄️  Legacy Import - CSV → SQLite + WAL");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Load legacy records
    println!("\n📂 Loading legacy records...");
    let legacy = LegacyHistoryProvider::from_path(csv_path)
        .with_context(|| format!("Failed to load legacy records from {}", csv_path))?;
    println!("✓ Loaded {} homes from CSV", legacy.len());

    // 2. Setup database
    println!("\n🔧 Setting up database...");
    let mut store = SqliteHistoryProvider::open(db_path)
        .with_context(|| format!("Failed to open database {}", db_path))?;
    println!("✓ Database initialized with WAL mode");

    // 3. Store each home
    println!("\n💾 Saving homes...");
    for home in legacy.homes() {
        store
            .save_home(home)
            .with_context(|| format!("Failed to save home {}", home.mhr_number))?;
    }

    // 4. Verify count
    println!("\n🔍 Verifying database...");
    let count = store.home_count()?;
    println!("✓ Database contains {} homes", count);

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if count as usize == legacy.len() {
        println!("✅ Import complete: {} homes", count);
    } else {
        println!("⚠️  Imported {} homes, database now holds {}", legacy.len(), count);
    }

    Ok(())
}

fn run_validate(db_path: &str, mhr_number: &str, request_path: &str, staff: bool) -> Result<()> {
    ensure_database(db_path)?;

    let config = ValidationConfig::from_env()?;
    let engine = ValidationEngine::new(config);
    let store = SqliteHistoryProvider::open(db_path)
        .with_context(|| format!("Failed to open database {}", db_path))?;

    let content = fs::read_to_string(request_path)
        .with_context(|| format!("Failed to read request {}", request_path))?;
    let request: TransferRequest =
        serde_json::from_str(&content).context("Failed to parse registration request JSON")?;

    let report = engine
        .load_and_validate(&store, mhr_number, &request, staff, Utc::now())
        .with_context(|| format!("Failed to load history for {}", mhr_number))?;

    println!("📋 {} {} ({})", mhr_number, request.registration_type.as_str(), if staff { "staff" } else { "client" });
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if report.is_valid() {
        println!("✅ Registration is valid");
        return Ok(());
    }

    for error in &report.errors {
        println!("❌ [{}] {}: {}", error.code.as_str(), error.field, error.message);
    }
    println!("\n{}", serde_json::to_string_pretty(&report)?);

    if report.has_integrity_errors() {
        println!("\n⚠️  Stored history is inconsistent for {}", mhr_number);
    }
    std::process::exit(1);
}

fn run_groups(db_path: &str, mhr_number: &str) -> Result<()> {
    ensure_database(db_path)?;

    let store = SqliteHistoryProvider::open(db_path)
        .with_context(|| format!("Failed to open database {}", db_path))?;
    let home = store
        .load_home(mhr_number)
        .with_context(|| format!("Failed to load history for {}", mhr_number))?;

    let state = CurrentState::project(&home, Utc::now());
    println!("{}", serde_json::to_string_pretty(state.current_groups())?);

    Ok(())
}

fn ensure_database(db_path: &str) -> Result<()> {
    if !Path::new(db_path).exists() {
        bail!("Database not found at {}\n   Run: mhr-validate import-legacy <legacy.csv> {}", db_path, db_path);
    }
    Ok(())
}
