//! TCP Server for FlatDB
//!
//! This module implements a line-oriented TCP server. Each connection gets
//! its own thread and its own session over the shared store.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::executor::{failure_label, render_error, ExecutionEngine, QueryResult};
use crate::sql::parse;
use crate::store::Store;

/// Default server port
pub const DEFAULT_PORT: u16 = 7171;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Maximum concurrent connections
    pub max_connections: usize,
    /// Store settings
    pub store: StoreConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            max_connections: 100,
            store: StoreConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new server config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the host address
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the store configuration
    pub fn store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Get the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// FlatDB TCP Server
pub struct Server {
    config: ServerConfig,
    store: Arc<Store>,
    active: Arc<AtomicUsize>,
}

impl Server {
    /// Create a new server, opening (and recovering) the store
    pub fn new(config: ServerConfig) -> Result<Self> {
        let store = Arc::new(Store::open(config.store.clone())?);
        Ok(Self {
            config,
            store,
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Start the server and listen for connections
    pub fn start(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_address())?;
        info!(address = %self.config.bind_address(), "server listening");
        self.serve(listener)
    }

    /// Accept connections on an already bound listener
    pub fn serve(&self, listener: TcpListener) -> Result<()> {
        for stream in listener.incoming() {
            match stream {
                Ok(mut stream) => {
                    if self.active.load(Ordering::SeqCst) >= self.config.max_connections {
                        warn!("connection limit reached, refusing client");
                        let _ = send_response(&mut stream, "Too many connections.\n");
                        continue;
                    }

                    let store = self.store.clone();
                    let active = self.active.clone();
                    active.fetch_add(1, Ordering::SeqCst);
                    thread::spawn(move || {
                        if let Err(e) = handle_connection(stream, store) {
                            error!(error = %e, "connection error");
                        }
                        active.fetch_sub(1, Ordering::SeqCst);
                    });
                }
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                }
            }
        }

        Ok(())
    }
}

/// Output format for query results
#[derive(Debug, Clone, Copy, PartialEq)]
enum OutputFormat {
    Table,
    Json,
}

/// Handle a client connection
fn handle_connection(stream: TcpStream, store: Arc<Store>) -> Result<()> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    info!(peer = %peer_addr, "client connected");

    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = stream;

    // One session per connection
    let mut engine = ExecutionEngine::new(store);
    let mut format = OutputFormat::Table;

    send_response(&mut writer, "FlatDB Server v0.1.0\nReady for commands.\n")?;

    let mut line = String::new();
    loop {
        line.clear();

        match reader.read_line(&mut line) {
            Ok(0) => {
                info!(peer = %peer_addr, "client disconnected");
                break;
            }
            Ok(_) => {
                let command = line.trim();

                if command.is_empty() {
                    continue;
                }

                if command.starts_with('.') {
                    match command {
                        ".quit" | ".exit" => {
                            send_response(&mut writer, "Goodbye!\n")?;
                            break;
                        }
                        ".mode json" => {
                            format = OutputFormat::Json;
                            send_response(&mut writer, "Output mode set to JSON\n")?;
                        }
                        ".mode table" => {
                            format = OutputFormat::Table;
                            send_response(&mut writer, "Output mode set to Table\n")?;
                        }
                        _ => {
                            send_response(&mut writer, &format!("Unknown command: {}\n", command))?;
                        }
                    }
                    continue;
                }

                let response = execute_command(&mut engine, command, format);
                send_response(&mut writer, &response)?;
            }
            Err(e) => {
                warn!(peer = %peer_addr, error = %e, "read error");
                break;
            }
        }
    }

    Ok(())
}

/// Execute a command and return the response, newline terminated
fn execute_command(engine: &mut ExecutionEngine, command: &str, format: OutputFormat) -> String {
    if format == OutputFormat::Table {
        return engine.execute(command) + "\n";
    }

    let (e, operation) = match parse(command) {
        Ok(stmt) => {
            let operation = failure_label(&stmt);
            match engine.execute_statement(stmt) {
                Ok(result) => return format_json(&result),
                Err(e) => (e, operation),
            }
        }
        Err(e) => (e, None),
    };
    let message = render_error(&e, operation);

    serde_json::json!({
        "status": "error",
        "kind": format!("{:?}", e.kind()),
        "message": message,
    })
    .to_string()
        + "\n"
}

/// Format a successful result as one JSON line
fn format_json(result: &QueryResult) -> String {
    let mut body = serde_json::json!({
        "status": "success",
        "affected_rows": result.affected_rows,
    });
    if let Some(message) = &result.message {
        body["message"] = serde_json::Value::from(message.clone());
    }
    if result.title.is_some() || result.message.is_none() {
        body["columns"] = serde_json::json!(result.columns);
        body["rows"] = serde_json::json!(result.records());
    }
    body.to_string() + "\n"
}

/// Send a response to the client
fn send_response(writer: &mut TcpStream, message: &str) -> Result<()> {
    writer.write_all(message.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Simple client for testing
pub fn connect(host: &str, port: u16) -> Result<TcpStream> {
    let addr = format!("{}:{}", host, port);
    TcpStream::connect(&addr).map_err(Error::from)
}
