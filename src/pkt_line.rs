use crate::capability::GitCapability;
use crate::error::GitWireError;
use crate::oid::Oid;
use bytes::{Bytes, BytesMut};

/// Frame one payload as a PKT-LINE: 4-char lowercase hex length covering the
/// length prefix, the payload, and a trailing LF.
pub fn write_pkt_line(out: &mut BytesMut, payload: &[u8]) {
    out.extend_from_slice(format!("{:04x}", payload.len() + 5).as_bytes());
    out.extend_from_slice(payload);
    out.extend_from_slice(b"\n");
}

pub fn flush_pkt(out: &mut BytesMut) {
    out.extend_from_slice(b"0000");
}

pub fn write_err_pkt(out: &mut BytesMut, msg: &str) {
    write_pkt_line(out, format!("ERR {}", msg).as_bytes());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckStatus {
    Continue,
    Common,
    Ready,
}

impl AckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AckStatus::Continue => "continue",
            AckStatus::Common => "common",
            AckStatus::Ready => "ready",
        }
    }
}

pub fn write_ack(out: &mut BytesMut, oid: &Oid, status: Option<AckStatus>) {
    let payload = match status {
        Some(status) => format!("ACK {} {}", oid, status.as_str()),
        None => format!("ACK {}", oid),
    };
    write_pkt_line(out, payload.as_bytes());
}

pub fn write_nak(out: &mut BytesMut) {
    write_pkt_line(out, b"NAK");
}

/// A decoded frame, refined by payload prefix. Everything from a `PACK`
/// magic onward is yielded as one opaque token; lines that are none of the
/// negotiation keywords come out as `Line`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PktToken {
    Flush,
    Pack(Bytes),
    Done,
    Want { oid: Oid, caps: Vec<GitCapability> },
    Have(Oid),
    Shallow(Oid),
    Line(Bytes),
}

/// Forward-only decoder over a fully buffered request body.
pub struct PktDecoder {
    buf: Bytes,
}

impl PktDecoder {
    pub fn new(buf: Bytes) -> Self {
        Self { buf }
    }

    /// Next token, or `None` once the input is exhausted.
    pub fn next_token(&mut self) -> Result<Option<PktToken>, GitWireError> {
        if self.buf.is_empty() {
            return Ok(None);
        }
        if self.buf.len() < 4 {
            return Err(GitWireError::UnexpectedEof);
        }
        if &self.buf[..4] == b"0000" {
            let _ = self.buf.split_to(4);
            return Ok(Some(PktToken::Flush));
        }
        if &self.buf[..4] == b"PACK" {
            let pack = self.buf.split_to(self.buf.len());
            return Ok(Some(PktToken::Pack(pack)));
        }
        let len_str =
            std::str::from_utf8(&self.buf[..4]).map_err(|_| GitWireError::MalformedPktLine)?;
        let pkt_len =
            usize::from_str_radix(len_str, 16).map_err(|_| GitWireError::MalformedPktLine)?;
        if pkt_len < 4 {
            return Err(GitWireError::MalformedPktLine);
        }
        if self.buf.len() < pkt_len {
            return Err(GitWireError::MalformedPktLine);
        }
        let frame = self.buf.split_to(pkt_len);
        let mut payload = frame.slice(4..);
        if payload.last() == Some(&b'\n') {
            payload = payload.slice(..payload.len() - 1);
        }
        Ok(Some(refine(payload)?))
    }
}

fn refine(payload: Bytes) -> Result<PktToken, GitWireError> {
    if payload.as_ref() == b"done" {
        return Ok(PktToken::Done);
    }
    if let Some(rest) = payload.strip_prefix(b"want ") {
        let (oid, tail) = split_oid(rest)?;
        let caps = match tail {
            Some(tail) => {
                let tail = std::str::from_utf8(tail).map_err(|_| GitWireError::InvalidUtf8)?;
                GitCapability::parse_list(tail)
            }
            None => vec![],
        };
        return Ok(PktToken::Want { oid, caps });
    }
    if let Some(rest) = payload.strip_prefix(b"have ") {
        let (oid, _) = split_oid(rest)?;
        return Ok(PktToken::Have(oid));
    }
    if let Some(rest) = payload.strip_prefix(b"shallow ") {
        let (oid, _) = split_oid(rest)?;
        return Ok(PktToken::Shallow(oid));
    }
    Ok(PktToken::Line(payload))
}

fn split_oid(rest: &[u8]) -> Result<(Oid, Option<&[u8]>), GitWireError> {
    let (hex, tail) = match rest.iter().position(|b| *b == b' ') {
        Some(idx) => (&rest[..idx], Some(&rest[idx + 1..])),
        None => (rest, None),
    };
    let hex = std::str::from_utf8(hex).map_err(|_| GitWireError::InvalidUtf8)?;
    Ok((Oid::from_hex(hex)?, tail))
}
