use std::io::{IsTerminal, Write};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One completed round trip against a lookup daemon.
pub struct Exchange<'a> {
    pub addr: &'a str,
    pub command: &'a str,
    pub body: &'a [u8],
    pub elapsed: Duration,
}

#[derive(Serialize)]
struct ExchangeOutput<'a> {
    addr: &'a str,
    command: &'a str,
    body_size: usize,
    body: String,
    latency_ms: f64,
    timestamp: String,
}

pub fn print_exchange(exchange: &Exchange<'_>, format: OutputFormat) {
    let latency_ms = (exchange.elapsed.as_secs_f64() * 1000.0 * 100.0).round() / 100.0;
    match format {
        OutputFormat::Json => {
            let out = ExchangeOutput {
                addr: exchange.addr,
                command: exchange.command,
                body_size: exchange.body.len(),
                body: body_preview(exchange.body),
                latency_ms,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PEER", "COMMAND", "SIZE", "LATENCY", "RESPONSE"])
                .add_row(vec![
                    exchange.addr.to_string(),
                    exchange.command.to_string(),
                    exchange.body.len().to_string(),
                    format!("{latency_ms:.2}ms"),
                    body_preview(exchange.body),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "peer={} command={} size={} latency={latency_ms:.2}ms response={}",
                exchange.addr,
                exchange.command,
                exchange.body.len(),
                body_preview(exchange.body)
            );
        }
        OutputFormat::Raw => {
            print_raw(exchange.body);
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.write_all(b"\n");
    let _ = out.flush();
}

fn body_preview(body: &[u8]) -> String {
    match std::str::from_utf8(body) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", body.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
