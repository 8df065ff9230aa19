//! nestx demo - runs a person fixture through nested transactions.
//!
//! Reads the database address from `-d` or `NESTX_DSN` (default: in-memory).

use std::process::ExitCode;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use nestx::{params, run_in_transaction, ConnectionConfig, ConnectionHandle, TransactionError};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS person (
    first_name TEXT,
    last_name TEXT,
    email TEXT,
    added_at TEXT
)";

#[derive(Debug, Deserialize)]
struct Person {
    first_name: String,
    last_name: String,
    email: String,
    added_at: DateTime<Utc>,
}

impl std::fmt::Display for Person {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}: ({}) {}",
            self.first_name, self.last_name, self.email, self.added_at
        )
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let mut config = ConnectionConfig::from_env();
    let mut verbose = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-d" | "--database" => {
                i += 1;
                if i < args.len() {
                    config.address = args[i].clone();
                }
            }
            "-v" | "--verbose" => {
                verbose = true;
            }
            "-h" | "--help" => {
                print_help();
                return ExitCode::SUCCESS;
            }
            "--version" => {
                println!("nestx v{}", env!("CARGO_PKG_VERSION"));
                return ExitCode::SUCCESS;
            }
            arg => {
                eprintln!("Unknown option: {}", arg);
                return ExitCode::FAILURE;
            }
        }
        i += 1;
    }

    init_tracing(verbose);

    let db = match ConnectionHandle::open_with_config(config) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Error opening database: {}", e);
            return ExitCode::FAILURE;
        }
    };
    println!("Using: {}", db.driver_name());

    let result = run(&db);
    if let Err(e) = db.close() {
        eprintln!("Error closing database: {}", e);
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "nestx=debug" } else { "nestx=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_help() {
    println!("nestx - nested transaction demo");
    println!();
    println!("Usage: nestx [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -d, --database PATH    SQLite database (default: $NESTX_DSN or :memory:)");
    println!("  -v, --verbose          Log physical transaction activity");
    println!("  -h, --help             Show this help message");
    println!("  --version              Show version");
}

fn run(db: &ConnectionHandle) -> Result<(), TransactionError> {
    db.execute(SCHEMA, params![])?;
    load_fixture(db);

    let person = run_in_transaction(db, |tx| {
        tx.execute(
            "INSERT INTO person (first_name, last_name, email, added_at) VALUES (?, ?, ?, ?)",
            params!["Al", "Paca", "x00.x7f@gmail.com", Utc::now()],
        )?;
        tx.execute(
            "UPDATE person SET email = ? WHERE first_name = ? AND last_name = ?",
            params!["x@h.com", "Al", "Paca"],
        )?;
        tx.get::<Person>("SELECT * FROM person LIMIT 1", params![])
    })?;
    println!("{}", person);

    // The inner unit joins the outer transaction; one physical commit.
    let person = run_in_transaction(db, |tx| {
        tx.execute(
            "INSERT INTO person (first_name, last_name, email, added_at) VALUES (?, ?, ?, ?)",
            params!["Code", "Hex", "x00.x7f@gmail.com", Utc::now()],
        )?;
        run_in_transaction(db, |nested| {
            nested.execute(
                "UPDATE person SET email = ? WHERE first_name = ? AND last_name = ?",
                params!["a@b.com", "Code", "Hex"],
            )
        })?;
        tx.get::<Person>("SELECT * FROM person ORDER BY first_name DESC LIMIT 1", params![])
    })?;
    println!("{}", person);

    let stats = db.stats();
    println!(
        "physical begins: {}, nested begins: {}, physical commits: {}",
        stats.physical_begins, stats.nested_begins, stats.physical_commits
    );
    Ok(())
}

fn load_fixture(db: &ConnectionHandle) {
    let tx = db.begin_or_panic();
    for (first, last, email) in [
        ("Jason", "Moiron", "jmoiron@jmoiron.net"),
        ("John", "Doe", "johndoeDNE@gmail.net"),
    ] {
        tx.execute_or_panic(
            "INSERT INTO person (first_name, last_name, email, added_at) VALUES (?, ?, ?, ?)",
            params![first, last, email, Utc::now()],
        );
    }
    if let Err(e) = tx.commit() {
        panic!("failed to load fixture: {e}");
    }
}
