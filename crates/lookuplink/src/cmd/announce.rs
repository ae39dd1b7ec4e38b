use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use lookuplink_frame::Command;
use lookuplink_peer::{LookupPeer, PeerError, PeerInfo, ReconnectHandler};
use tracing::{info, warn};

use crate::cmd::{parse_duration, AnnounceArgs};
use crate::exit::{peer_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_exchange, Exchange, OutputFormat};

const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Re-announces this node on every fresh connection.
pub struct Announcer {
    topics: Vec<String>,
}

impl Announcer {
    pub fn new(topics: Vec<String>) -> Self {
        Self { topics }
    }

    fn announce(&self, peer: &mut LookupPeer) -> Result<(), PeerError> {
        let identify = peer.info.identify_command()?;
        let reply = peer.command(Some(&identify))?;
        match serde_json::from_slice::<serde_json::Value>(&reply) {
            Ok(remote) => info!(
                peer = %peer,
                version = %remote["version"],
                "identified to lookup daemon"
            ),
            Err(_) => info!(
                peer = %peer,
                reply = %String::from_utf8_lossy(&reply),
                "identified to lookup daemon"
            ),
        }

        for topic in &self.topics {
            let register = Command::register(topic, None);
            peer.command(Some(&register))?;
            info!(peer = %peer, %topic, "registered topic");
        }
        Ok(())
    }
}

impl ReconnectHandler for Announcer {
    fn on_reconnect(&mut self, peer: &mut LookupPeer) {
        if let Err(err) = self.announce(peer) {
            warn!(peer = %peer, error = %err, "announcement failed");
        }
    }
}

pub fn run(args: AnnounceArgs, format: OutputFormat) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;
    let config = args.connection.peer_config()?;
    let broadcast_address = args
        .broadcast_address
        .clone()
        .unwrap_or_else(default_broadcast_address);

    let mut peer = LookupPeer::with_config(&args.connection.addr, config)
        .with_reconnect_handler(Announcer::new(args.topics.clone()));
    peer.info = PeerInfo::new(
        args.tcp_port,
        args.http_port,
        env!("CARGO_PKG_VERSION"),
        broadcast_address,
    );

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let ping = Command::ping();
    let ping_line = ping.to_string();
    let mut sent = 0usize;
    let mut succeeded = 0usize;
    let mut last_err = None;

    while running.load(Ordering::SeqCst) && args.count.is_none_or(|count| sent < count) {
        let start = Instant::now();
        match peer.command(Some(&ping)) {
            Ok(body) => {
                succeeded += 1;
                print_exchange(
                    &Exchange {
                        addr: peer.addr(),
                        command: &ping_line,
                        body: &body,
                        elapsed: start.elapsed(),
                    },
                    format,
                );
            }
            Err(err) => {
                warn!(peer = %peer, error = %err, "keepalive failed; reconnecting on next tick");
                last_err = Some(err);
            }
        }
        sent += 1;

        if args.count.is_none_or(|count| sent < count) {
            sleep_while_running(interval, &running);
        }
    }

    if let Err(err) = peer.close() {
        tracing::debug!(error = %err, "close after announce failed");
    }

    match last_err {
        Some(err) if succeeded == 0 => Err(peer_error("announce failed", err)),
        _ => Ok(SUCCESS),
    }
}

fn sleep_while_running(total: Duration, running: &AtomicBool) {
    let deadline = Instant::now() + total;
    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        std::thread::sleep(SLEEP_SLICE.min(deadline - now));
    }
}

fn default_broadcast_address() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string())
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
