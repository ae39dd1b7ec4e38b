use std::fmt;
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use bytes::Bytes;
use lookuplink_frame::{read_response_bounded, WriteTo, DEFAULT_MAX_BODY_SIZE, MAGIC_V1};
use lookuplink_transport::{dial, TimedStream, LOOKUP_TIMEOUT};
use tracing::{debug, info};

use crate::error::{PeerError, Result};
use crate::handler::ReconnectHandler;
use crate::info::PeerInfo;

/// Connection state as recorded by [`LookupPeer::command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    Disconnected,
    Connected,
}

/// Configuration for a lookup peer.
#[derive(Debug, Clone)]
pub struct PeerConfig {
    /// Largest response body accepted, in bytes. Default: 1 MiB.
    pub max_body_size: u64,
    /// Dial timeout, also applied to each individual read and write.
    pub timeout: Duration,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            timeout: LOOKUP_TIMEOUT,
        }
    }
}

/// A low-level client for one lookup daemon.
///
/// The peer connects lazily and reconnects on demand: callers only use
/// [`command`](Self::command) to perform round trips. Any failure during an
/// exchange closes the connection, and the next call performs a fresh
/// connect, preamble and reconnect notification.
///
/// A peer is driven by one caller at a time; share it behind a `Mutex` if
/// several threads need it.
pub struct LookupPeer {
    addr: String,
    conn: Option<TimedStream>,
    state: PeerState,
    config: PeerConfig,
    reconnect_handler: Option<Box<dyn ReconnectHandler>>,
    /// Metadata advertised by the announcement flow. Never read here.
    pub info: PeerInfo,
}

impl LookupPeer {
    /// Create a disconnected peer for `addr` with the given body ceiling.
    pub fn new(addr: impl Into<String>, max_body_size: u64) -> Self {
        Self::with_config(
            addr,
            PeerConfig {
                max_body_size,
                ..PeerConfig::default()
            },
        )
    }

    /// Create a disconnected peer with explicit configuration.
    pub fn with_config(addr: impl Into<String>, config: PeerConfig) -> Self {
        Self {
            addr: addr.into(),
            conn: None,
            state: PeerState::Disconnected,
            config,
            reconnect_handler: None,
            info: PeerInfo::default(),
        }
    }

    /// Install the hook fired on every fresh connection.
    pub fn with_reconnect_handler(mut self, handler: impl ReconnectHandler + 'static) -> Self {
        self.set_reconnect_handler(handler);
        self
    }

    /// Replace the hook fired on every fresh connection.
    pub fn set_reconnect_handler(&mut self, handler: impl ReconnectHandler + 'static) {
        self.reconnect_handler = Some(Box::new(handler));
    }

    /// The remote address.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Current recorded state.
    pub fn state(&self) -> PeerState {
        self.state
    }

    /// Current configuration.
    pub fn config(&self) -> &PeerConfig {
        &self.config
    }

    /// Dial the remote address.
    ///
    /// Does not change the recorded state. Any handle left over from an
    /// earlier `connect` is released first. Refuses while connected, since
    /// the new handle would not have seen the preamble.
    pub fn connect(&mut self) -> Result<()> {
        if self.state == PeerState::Connected {
            return Err(PeerError::AlreadyConnected(self.addr.clone()));
        }

        debug!(addr = %self.addr, "LOOKUP connecting");
        if let Some(stale) = self.conn.take() {
            debug!(addr = %self.addr, "releasing stale lookup connection");
            let _ = stale.shutdown();
        }

        let conn = dial(&self.addr, self.config.timeout)?;
        info!(addr = %self.addr, "LOOKUP connected");
        self.conn = Some(conn);
        Ok(())
    }

    /// Release the connection and record `Disconnected`.
    ///
    /// Safe to call any number of times, connected or not.
    pub fn close(&mut self) -> Result<()> {
        self.state = PeerState::Disconnected;
        if let Some(conn) = self.conn.take() {
            debug!(addr = %self.addr, "LOOKUP closing connection");
            conn.shutdown()?;
        }
        Ok(())
    }

    /// Perform one round trip for `cmd`, connecting first if needed.
    ///
    /// `None` only ensures a connection exists and returns an empty body.
    /// There are no internal retries: every failure after the connection is
    /// up closes it before the error is returned.
    pub fn command(&mut self, cmd: Option<&dyn WriteTo>) -> Result<Bytes> {
        let prior_state = self.state;
        if self.state != PeerState::Connected {
            self.connect()?;
            self.state = PeerState::Connected;
            if let Err(err) = self.write_all(MAGIC_V1) {
                let _ = self.close();
                return Err(PeerError::Write(err));
            }
            if prior_state == PeerState::Disconnected {
                self.notify_reconnect();
            }
        }

        let Some(cmd) = cmd else {
            return Ok(Bytes::new());
        };

        if let Err(err) = cmd.write_to(self) {
            let _ = self.close();
            return Err(PeerError::Write(err));
        }

        let limit = self.config.max_body_size;
        match read_response_bounded(self, limit) {
            Ok(body) => Ok(body),
            Err(err) => {
                let _ = self.close();
                Err(err.into())
            }
        }
    }

    fn notify_reconnect(&mut self) {
        if let Some(mut handler) = self.reconnect_handler.take() {
            handler.on_reconnect(self);
            // A handler installed from inside the hook wins.
            if self.reconnect_handler.is_none() {
                self.reconnect_handler = Some(handler);
            }
        }
    }

    fn stream(&mut self) -> std::io::Result<&mut TimedStream> {
        self.conn.as_mut().ok_or_else(|| {
            std::io::Error::new(ErrorKind::NotConnected, "lookup peer is not connected")
        })
    }
}

impl Read for LookupPeer {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.stream()?.read(buf)
    }
}

impl Write for LookupPeer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.stream()?.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.stream()?.flush()
    }
}

impl fmt::Display for LookupPeer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.addr)
    }
}

impl fmt::Debug for LookupPeer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupPeer")
            .field("addr", &self.addr)
            .field("state", &self.state)
            .field("connected", &self.conn.is_some())
            .field("config", &self.config)
            .field("reconnect_handler", &self.reconnect_handler.is_some())
            .field("info", &self.info)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::net::{TcpListener, TcpStream};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread::{self, JoinHandle};

    use bytes::{BufMut, BytesMut};
    use lookuplink_frame::{encode_response, Command, FrameError};

    use super::*;

    fn spawn_lookupd<F>(connections: usize, serve: F) -> (String, JoinHandle<()>)
    where
        F: Fn(usize, TcpStream) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
        let addr = listener.local_addr().expect("local addr").to_string();
        let handle = thread::spawn(move || {
            for i in 0..connections {
                let (stream, _) = listener.accept().expect("listener should accept");
                serve(i, stream);
            }
        });
        (addr, handle)
    }

    fn expect_bytes(stream: &mut TcpStream, expected: &[u8]) {
        let mut buf = vec![0u8; expected.len()];
        stream.read_exact(&mut buf).expect("server should read");
        assert_eq!(
            buf,
            expected,
            "server received {:?}",
            String::from_utf8_lossy(&buf)
        );
    }

    fn respond(stream: &mut TcpStream, body: &[u8]) {
        let mut wire = BytesMut::new();
        encode_response(body, &mut wire).expect("response should encode");
        stream.write_all(&wire).expect("server should write");
    }

    fn counter() -> (Arc<AtomicUsize>, impl ReconnectHandler + 'static) {
        let calls = Arc::new(AtomicUsize::new(0));
        let hook = {
            let calls = Arc::clone(&calls);
            move |_: &mut LookupPeer| {
                calls.fetch_add(1, Ordering::SeqCst);
            }
        };
        (calls, hook)
    }

    struct RecordingHandler {
        states: Arc<Mutex<Vec<PeerState>>>,
    }

    impl ReconnectHandler for RecordingHandler {
        fn on_reconnect(&mut self, peer: &mut LookupPeer) {
            self.states.lock().unwrap().push(peer.state());
        }
    }

    #[test]
    fn ping_round_trip_returns_body() {
        let (addr, server) = spawn_lookupd(1, |_, mut stream| {
            expect_bytes(&mut stream, MAGIC_V1);
            expect_bytes(&mut stream, b"PING\n");
            respond(&mut stream, b"PONG");
        });

        let states = Arc::new(Mutex::new(Vec::new()));
        let mut peer = LookupPeer::new(&addr, 1024).with_reconnect_handler(RecordingHandler {
            states: Arc::clone(&states),
        });

        let body = peer.command(Some(&Command::ping())).unwrap();

        assert_eq!(body.as_ref(), b"PONG");
        assert_eq!(peer.state(), PeerState::Connected);
        assert_eq!(*states.lock().unwrap(), vec![PeerState::Connected]);
        server.join().unwrap();
    }

    #[test]
    fn reconnect_hook_runs_after_preamble_and_before_command() {
        let (addr, server) = spawn_lookupd(1, |_, mut stream| {
            expect_bytes(&mut stream, MAGIC_V1);
            expect_bytes(&mut stream, b"HOOK");
            expect_bytes(&mut stream, b"PING\n");
            respond(&mut stream, b"OK");
        });

        let mut peer = LookupPeer::new(&addr, 1024).with_reconnect_handler(|peer: &mut LookupPeer| {
            peer.write_all(b"HOOK").unwrap();
        });

        assert_eq!(peer.command(Some(&Command::ping())).unwrap().as_ref(), b"OK");
        server.join().unwrap();
    }

    #[test]
    fn hook_can_issue_its_own_commands() {
        let info = PeerInfo::new(4150, 4151, "1.2.0", "node-a");
        let identify = info.identify_command().unwrap();
        let mut identify_wire = BytesMut::new();
        identify.encode(&mut identify_wire);

        let (addr, server) = spawn_lookupd(1, move |_, mut stream| {
            expect_bytes(&mut stream, MAGIC_V1);
            expect_bytes(&mut stream, &identify_wire);
            respond(&mut stream, b"{\"version\":\"1.0\"}");
            expect_bytes(&mut stream, b"REGISTER orders\n");
            respond(&mut stream, b"OK");
        });

        let replies = Arc::new(Mutex::new(Vec::new()));
        let mut peer = LookupPeer::new(&addr, 1024).with_reconnect_handler({
            let replies = Arc::clone(&replies);
            move |peer: &mut LookupPeer| {
                let cmd = peer.info.identify_command().unwrap();
                let reply = peer.command(Some(&cmd)).unwrap();
                replies.lock().unwrap().push(reply);
            }
        });
        peer.info = info;

        let body = peer
            .command(Some(&Command::register("orders", None)))
            .unwrap();

        assert_eq!(body.as_ref(), b"OK");
        assert_eq!(
            replies.lock().unwrap()[0].as_ref(),
            b"{\"version\":\"1.0\"}"
        );
        server.join().unwrap();
    }

    #[test]
    fn oversized_response_closes_connection() {
        let (addr, server) = spawn_lookupd(1, |_, mut stream| {
            expect_bytes(&mut stream, MAGIC_V1);
            expect_bytes(&mut stream, b"PING\n");
            respond(&mut stream, b"PONG");
        });

        let mut peer = LookupPeer::new(&addr, 2);
        let err = peer.command(Some(&Command::ping())).unwrap_err();

        assert!(matches!(
            err,
            PeerError::Frame(FrameError::BodyTooLarge { size: 4, limit: 2 })
        ));
        assert_eq!(peer.state(), PeerState::Disconnected);
        let mut buf = [0u8; 4];
        let read_err = peer.read(&mut buf).unwrap_err();
        assert_eq!(read_err.kind(), ErrorKind::NotConnected);
        server.join().unwrap();
    }

    #[test]
    fn negative_length_is_a_framing_error() {
        let (addr, server) = spawn_lookupd(1, |_, mut stream| {
            expect_bytes(&mut stream, MAGIC_V1);
            expect_bytes(&mut stream, b"PING\n");
            let mut wire = BytesMut::new();
            wire.put_i32(-5);
            stream.write_all(&wire).unwrap();
        });

        let mut peer = LookupPeer::new(&addr, 1024);
        let err = peer.command(Some(&Command::ping())).unwrap_err();

        assert!(matches!(err, PeerError::Frame(FrameError::NegativeSize(-5))));
        assert_eq!(peer.state(), PeerState::Disconnected);
        server.join().unwrap();
    }

    #[test]
    fn failed_exchange_reconnects_on_next_command() {
        let (addr, server) = spawn_lookupd(2, |i, mut stream| {
            expect_bytes(&mut stream, MAGIC_V1);
            expect_bytes(&mut stream, b"PING\n");
            if i == 1 {
                respond(&mut stream, b"PONG");
            }
            // First connection is dropped without a response.
        });

        let (calls, hook) = counter();
        let mut peer = LookupPeer::new(&addr, 1024).with_reconnect_handler(hook);

        let err = peer.command(Some(&Command::ping())).unwrap_err();
        assert!(matches!(
            err,
            PeerError::Frame(FrameError::ShortRead { .. } | FrameError::Io(_))
        ));
        assert_eq!(peer.state(), PeerState::Disconnected);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let body = peer.command(Some(&Command::ping())).unwrap();
        assert_eq!(body.as_ref(), b"PONG");
        assert_eq!(peer.state(), PeerState::Connected);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        server.join().unwrap();
    }

    #[test]
    fn empty_command_connects_without_exchange() {
        let (addr, server) = spawn_lookupd(1, |_, mut stream| {
            expect_bytes(&mut stream, MAGIC_V1);
            expect_bytes(&mut stream, b"PING\n");
            respond(&mut stream, b"PONG");
        });

        let (calls, hook) = counter();
        let mut peer = LookupPeer::new(&addr, 1024).with_reconnect_handler(hook);

        let body = peer.command(None).unwrap();
        assert!(body.is_empty());
        assert_eq!(peer.state(), PeerState::Connected);

        let body = peer.command(Some(&Command::ping())).unwrap();
        assert_eq!(body.as_ref(), b"PONG");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        server.join().unwrap();
    }

    #[test]
    fn dial_failure_leaves_state_untouched() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().to_string()
        };

        let (calls, hook) = counter();
        let mut peer = LookupPeer::with_config(
            &addr,
            PeerConfig {
                timeout: Duration::from_millis(500),
                ..PeerConfig::default()
            },
        )
        .with_reconnect_handler(hook);

        let err = peer.command(Some(&Command::ping())).unwrap_err();
        assert!(matches!(err, PeerError::Transport(_)));
        assert_eq!(peer.state(), PeerState::Disconnected);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn close_is_idempotent() {
        let mut never_connected = LookupPeer::new("127.0.0.1:1", 1024);
        never_connected.close().unwrap();
        never_connected.close().unwrap();

        let (addr, server) = spawn_lookupd(1, |_, mut stream| {
            expect_bytes(&mut stream, MAGIC_V1);
        });
        let mut peer = LookupPeer::new(&addr, 1024);
        peer.command(None).unwrap();
        server.join().unwrap();

        peer.close().unwrap();
        peer.close().unwrap();
        assert_eq!(peer.state(), PeerState::Disconnected);
        assert_eq!(
            peer.write(b"x").unwrap_err().kind(),
            ErrorKind::NotConnected
        );
    }

    #[test]
    fn connect_while_connected_is_refused() {
        let (addr, server) = spawn_lookupd(1, |_, mut stream| {
            expect_bytes(&mut stream, MAGIC_V1);
        });
        let mut peer = LookupPeer::new(&addr, 1024);
        peer.command(None).unwrap();
        server.join().unwrap();

        let err = peer.connect().unwrap_err();
        assert!(matches!(err, PeerError::AlreadyConnected(a) if a == addr));
        assert_eq!(peer.state(), PeerState::Connected);
    }

    #[test]
    fn repeated_connect_releases_previous_handle() {
        let (addr, server) = spawn_lookupd(2, |i, mut stream| {
            if i == 0 {
                let mut buf = [0u8; 1];
                let n = stream.read(&mut buf).unwrap_or(0);
                assert_eq!(n, 0, "first connection should be closed");
            }
        });

        let mut peer = LookupPeer::new(&addr, 1024);
        peer.connect().unwrap();
        peer.connect().unwrap();
        assert_eq!(peer.state(), PeerState::Disconnected);
        server.join().unwrap();
    }

    #[test]
    fn io_without_connection_fails() {
        let mut peer = LookupPeer::new("127.0.0.1:1", 1024);
        let mut buf = [0u8; 1];
        assert_eq!(peer.read(&mut buf).unwrap_err().kind(), ErrorKind::NotConnected);
        assert_eq!(peer.flush().unwrap_err().kind(), ErrorKind::NotConnected);
    }

    #[test]
    fn display_renders_address() {
        let peer = LookupPeer::new("lookupd-1:4160", 1024);
        assert_eq!(peer.to_string(), "lookupd-1:4160");
        assert_eq!(peer.addr(), "lookupd-1:4160");
        assert_eq!(peer.config().timeout, LOOKUP_TIMEOUT);
        assert!(format!("{peer:?}").contains("Disconnected"));
    }
}
