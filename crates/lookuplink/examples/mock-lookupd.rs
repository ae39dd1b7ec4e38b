//! Minimal lookup daemon that answers keepalive and registration commands over TCP.
//!
//! Run with:
//!   cargo run --example mock-lookupd -- 127.0.0.1:4160
//!
//! In another terminal:
//!   cargo run --features cli -- ping 127.0.0.1:4160

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

use bytes::BytesMut;
use lookuplink::frame::{encode_response, MAGIC_V1};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:4160".to_string());
    let listener = TcpListener::bind(&addr)?;
    eprintln!("Listening on {}", listener.local_addr()?);

    for stream in listener.incoming() {
        let stream = stream?;
        thread::spawn(move || {
            let peer = stream.peer_addr().ok();
            if let Err(e) = serve(stream) {
                eprintln!("Peer {peer:?} disconnected: {e}");
            }
        });
    }
    Ok(())
}

fn serve(stream: TcpStream) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);

    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC_V1 {
        return Err(format!("bad magic {magic:?}").into());
    }

    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(());
        }
        let mut parts = line.trim_end().split(' ');
        let name = parts.next().unwrap_or_default();
        eprintln!("Received {}", line.trim_end());

        let reply: Vec<u8> = match name {
            "PING" | "REGISTER" | "UNREGISTER" => b"OK".to_vec(),
            "IDENTIFY" => {
                let mut len = [0u8; 4];
                reader.read_exact(&mut len)?;
                let mut body = vec![0u8; u32::from_be_bytes(len) as usize];
                reader.read_exact(&mut body)?;
                eprintln!("  identify body {}", String::from_utf8_lossy(&body));
                br#"{"tcp_port":4160,"http_port":4161,"version":"mock"}"#.to_vec()
            }
            _ => b"E_INVALID".to_vec(),
        };

        let mut wire = BytesMut::new();
        encode_response(&reply, &mut wire)?;
        writer.write_all(&wire)?;
    }
}
