use std::time::Instant;

use lookuplink_frame::Command;
use lookuplink_peer::LookupPeer;

use crate::cmd::PingArgs;
use crate::exit::{peer_error, CliResult, SUCCESS};
use crate::output::{print_exchange, Exchange, OutputFormat};

pub fn run(args: PingArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.connection.peer_config()?;
    let mut peer = LookupPeer::with_config(&args.connection.addr, config);

    let cmd = Command::ping();
    let start = Instant::now();
    let body = peer
        .command(Some(&cmd))
        .map_err(|err| peer_error("ping failed", err))?;
    let elapsed = start.elapsed();

    print_exchange(
        &Exchange {
            addr: peer.addr(),
            command: &cmd.to_string(),
            body: &body,
            elapsed,
        },
        format,
    );

    if let Err(err) = peer.close() {
        tracing::debug!(error = %err, "close after ping failed");
    }
    Ok(SUCCESS)
}
