use std::fmt;
use std::io::Write;

use bytes::{BufMut, Bytes, BytesMut};

/// A value that can serialize itself onto a byte sink.
///
/// Returns the number of bytes written.
pub trait WriteTo {
    fn write_to(&self, w: &mut dyn Write) -> std::io::Result<u64>;
}

/// A lookup daemon command.
///
/// Wire format:
/// ```text
/// NAME[ PARAM]*\n
/// [4-byte BE body length][body]     (only when a body is present)
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Command {
    pub name: Bytes,
    pub params: Vec<Bytes>,
    pub body: Option<Bytes>,
}

impl Command {
    /// Create a command from its parts.
    pub fn new(name: impl Into<Bytes>, params: Vec<Bytes>, body: Option<Bytes>) -> Self {
        Self {
            name: name.into(),
            params,
            body,
        }
    }

    /// Keepalive probe.
    pub fn ping() -> Self {
        Self::new("PING", Vec::new(), None)
    }

    /// Announce node metadata; `body` is typically JSON.
    pub fn identify(body: impl Into<Bytes>) -> Self {
        Self::new("IDENTIFY", Vec::new(), Some(body.into()))
    }

    /// Register a topic, or a channel of a topic, with the lookup daemon.
    pub fn register(topic: &str, channel: Option<&str>) -> Self {
        Self::new("REGISTER", topic_params(topic, channel), None)
    }

    /// Remove a topic, or a channel of a topic, from the lookup daemon.
    pub fn unregister(topic: &str, channel: Option<&str>) -> Self {
        Self::new("UNREGISTER", topic_params(topic, channel), None)
    }

    /// Encode the command into `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.put_slice(&self.name);
        for param in &self.params {
            dst.put_u8(b' ');
            dst.put_slice(param);
        }
        dst.put_u8(b'\n');
        if let Some(body) = &self.body {
            dst.put_u32(body.len() as u32);
            dst.put_slice(body);
        }
    }

    /// Encoded size in bytes.
    pub fn wire_size(&self) -> usize {
        let params: usize = self.params.iter().map(|p| p.len() + 1).sum();
        let body = self.body.as_ref().map_or(0, |b| 4 + b.len());
        self.name.len() + params + 1 + body
    }
}

fn topic_params(topic: &str, channel: Option<&str>) -> Vec<Bytes> {
    let mut params = vec![Bytes::copy_from_slice(topic.as_bytes())];
    if let Some(channel) = channel {
        params.push(Bytes::copy_from_slice(channel.as_bytes()));
    }
    params
}

impl WriteTo for Command {
    fn write_to(&self, w: &mut dyn Write) -> std::io::Result<u64> {
        let mut buf = BytesMut::with_capacity(self.wire_size());
        self.encode(&mut buf);
        w.write_all(&buf)?;
        w.flush()?;
        Ok(buf.len() as u64)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.name))?;
        for param in &self.params {
            write!(f, " {}", String::from_utf8_lossy(param))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("line", &self.to_string())
            .field("body_len", &self.body.as_ref().map(Bytes::len))
            .finish()
    }
}
