use std::time::Duration;

use clap::{Args, Subcommand};
use lookuplink_frame::DEFAULT_MAX_BODY_SIZE;
use lookuplink_peer::PeerConfig;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod announce;
pub mod ping;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one PING and print the response.
    Ping(PingArgs),
    /// Identify this node, register topics, and keep the registration alive.
    Announce(AnnounceArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Ping(args) => ping::run(args, format),
        Command::Announce(args) => announce::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Lookup daemon address (host:port).
    #[arg(env = "LOOKUPLINK_ADDR")]
    pub addr: String,
    /// Largest accepted response body in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_SIZE)]
    pub max_body_size: u64,
    /// Dial and per-read/write timeout (e.g. 3s, 500ms).
    #[arg(long, default_value = "3s")]
    pub timeout: String,
}

impl ConnectionArgs {
    pub fn peer_config(&self) -> CliResult<PeerConfig> {
        Ok(PeerConfig {
            max_body_size: self.max_body_size,
            timeout: parse_duration(&self.timeout)?,
        })
    }
}

#[derive(Args, Debug)]
pub struct PingArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
}

#[derive(Args, Debug)]
pub struct AnnounceArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
    /// TCP port advertised for this node.
    #[arg(long)]
    pub tcp_port: u16,
    /// HTTP port advertised for this node.
    #[arg(long)]
    pub http_port: u16,
    /// Address other nodes should use to reach this one. Default: hostname.
    #[arg(long)]
    pub broadcast_address: Option<String>,
    /// Topics to register on every fresh connection (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub topics: Vec<String>,
    /// Stop after N keepalive pings. Default: run until interrupted.
    #[arg(long)]
    pub count: Option<usize>,
    /// Time between keepalive pings (e.g. 15s, 500ms).
    #[arg(long, default_value = "15s")]
    pub interval: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
