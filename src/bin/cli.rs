//! FlatDB - CLI Client

use std::env;
use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use flatdb::config::StoreConfig;
use flatdb::executor::ExecutionEngine;
use flatdb::store::Store;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

/// Print welcome banner
fn print_banner() {
    println!(
        r#"
 FlatDB - a flat-file record store
 Type '.help' for help, '.quit' to exit
"#
    );
}

/// Print help message
fn print_help() {
    println!(
        r#"
Commands:
  .help              Show this help message
  .quit, .exit       Exit FlatDB
  .status            Show the selected database and data directory
  .clear             Clear screen

Database commands:
  CREATE DATABASE <name>        Create a database
  USE <name>                    Select a database
  DROP DATABASE <name>          Delete a database and its tables
  SHOW DATABASES                List databases

Table commands:
  CREATE TABLE <name> (c1, c2)  Create a table
  DROP TABLE <name>             Delete a table
  SHOW TABLES                   List tables in the selected database
  INSERT INTO <name> VALUES (v1, 'v,2')
  SELECT * FROM <name> [WHERE c=v]
  UPDATE <name> SET c=v WHERE c2=v2
  DELETE FROM <name>
"#
    );
}

/// Command line options
struct Options {
    config: StoreConfig,
    log_file: Option<String>,
}

fn parse_args() -> Result<Options> {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut config = StoreConfig::new();
    let mut data_dir = None;
    let mut commit_log = None;
    let mut log_file = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = || {
            iter.next()
                .cloned()
                .with_context(|| format!("missing value for {}", arg))
        };
        match arg.as_str() {
            "--config" => {
                let path = value()?;
                config = StoreConfig::from_json_file(&path)
                    .with_context(|| format!("loading config {}", path))?;
            }
            "--data" => data_dir = Some(value()?),
            "--log" => commit_log = Some(value()?),
            "--trace-file" => log_file = Some(value()?),
            other => bail!("unknown argument: {}", other),
        }
    }

    // Explicit flags win over the config file
    if let Some(dir) = data_dir {
        config = config.data_dir(dir);
    }
    if let Some(path) = commit_log {
        config = config.commit_log(path);
    }

    Ok(Options { config, log_file })
}

fn init_logging(log_file: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .init();
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init(),
    }
    Ok(())
}

/// Handle special dot commands. Returns false when the REPL should exit.
fn handle_special_command(cmd: &str, engine: &ExecutionEngine) -> bool {
    match cmd.split_whitespace().next() {
        Some(".help") => print_help(),
        Some(".quit") | Some(".exit") => return false,
        Some(".status") => {
            let config = engine.store().config();
            println!(
                "Database: {}",
                engine.current_database().unwrap_or("(none)")
            );
            println!("Data directory: {}", config.data_dir.display());
            println!("Commit log: {}", config.commit_log.display());
        }
        Some(".clear") => {
            // Clear screen (ANSI escape code)
            print!("\x1B[2J\x1B[1;1H");
            let _ = io::stdout().flush();
        }
        Some(cmd) => {
            eprintln!("Unknown command: {}", cmd);
            eprintln!("Type '.help' for available commands.");
        }
        None => {}
    }
    true
}

fn prompt(engine: &ExecutionEngine) -> String {
    match engine.current_database() {
        Some(db) => format!("flatdb[{}]> ", db),
        None => "flatdb> ".to_string(),
    }
}

/// Main REPL loop
fn run_repl(mut engine: ExecutionEngine) -> Result<()> {
    let mut editor = DefaultEditor::new().context("initializing line editor")?;

    print_banner();

    loop {
        match editor.readline(&prompt(&engine)) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(trimmed);

                if trimmed.starts_with('.') {
                    if !handle_special_command(trimmed, &engine) {
                        break;
                    }
                    continue;
                }

                println!("{}", engine.execute(trimmed));
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("reading input"),
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn main() -> Result<()> {
    let options = parse_args()?;
    init_logging(options.log_file.as_deref())?;

    let store = Store::open(options.config).context("opening store")?;
    run_repl(ExecutionEngine::new(Arc::new(store)))
}
