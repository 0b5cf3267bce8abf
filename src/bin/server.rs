use std::env;

use anyhow::{bail, Context, Result};
use flatdb::server::{Server, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn parse_args() -> Result<ServerConfig> {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut config = ServerConfig::new();
    let mut data_dir = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = || {
            iter.next()
                .with_context(|| format!("missing value for {}", arg))
        };
        match arg.as_str() {
            "--config" => {
                let path = value()?;
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path))?;
                config = serde_json::from_str(&text)
                    .with_context(|| format!("parsing config {}", path))?;
            }
            "--host" => config = config.host(value()?.as_str()),
            "--port" | "-p" => {
                let port = value()?;
                let port = port
                    .parse()
                    .with_context(|| format!("invalid port: {}", port))?;
                config = config.port(port);
            }
            "--data" => data_dir = Some(value()?.clone()),
            other => bail!("unknown argument: {}", other),
        }
    }

    if let Some(dir) = data_dir {
        let store = config.store.clone().data_dir(dir);
        config = config.store(store);
    }
    Ok(config)
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = parse_args()?;
    info!(address = %config.bind_address(), "starting FlatDB server");

    let server = Server::new(config).context("opening store")?;
    server.start().context("server error")?;
    Ok(())
}
