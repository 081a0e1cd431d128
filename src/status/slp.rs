// src/status/slp.rs
//! Minecraft Server List Ping over TCP.
//!
//! Sends a handshake with next-state 1 followed by an empty status request,
//! then reads back a single length-prefixed packet carrying the status JSON.

use async_trait::async_trait;
use byteorder::{BigEndian, ByteOrder};
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use crate::error::QueryError;
use crate::models::server::ServerSnapshot;
use super::StatusSource;

const PROTOCOL_VERSION: i32 = 47;
const NEXT_STATE_STATUS: i32 = 1;
const MAX_PACKET_LEN: usize = 1 << 20;

pub struct SlpClient {
    timeout: Duration,
}

impl SlpClient {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn ping(host: &str, port: u16) -> Result<ServerSnapshot, QueryError> {
        let mut stream = TcpStream::connect((host, port)).await?;

        stream.write_all(&handshake_packet(host, port)).await?;
        // Status request: length 1, packet id 0x00.
        stream.write_all(&[0x01, 0x00]).await?;
        stream.flush().await?;

        let json = read_status_response(&mut stream).await?;
        debug!("Status payload from {}:{}: {}", host, port, json);
        parse_status(&json)
    }
}

#[async_trait]
impl StatusSource for SlpClient {
    async fn query_status(&self, host: &str, port: u16) -> Result<ServerSnapshot, QueryError> {
        match tokio::time::timeout(self.timeout, Self::ping(host, port)).await {
            Ok(result) => result,
            Err(_) => Err(QueryError::Timeout(self.timeout)),
        }
    }
}

pub fn write_varint(buf: &mut Vec<u8>, value: i32) {
    let mut v = value as u32;
    loop {
        if v & !0x7F == 0 {
            buf.push(v as u8);
            return;
        }
        buf.push((v & 0x7F) as u8 | 0x80);
        v >>= 7;
    }
}

pub async fn read_varint<R: AsyncRead + Unpin>(reader: &mut R) -> Result<i32, QueryError> {
    let mut result: u32 = 0;
    for i in 0..5 {
        let byte = reader.read_u8().await?;
        result |= u32::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(result as i32);
        }
    }
    Err(QueryError::Protocol("VarInt is longer than 5 bytes".to_string()))
}

fn handshake_packet(host: &str, port: u16) -> Vec<u8> {
    let mut body = Vec::with_capacity(host.len() + 16);
    write_varint(&mut body, 0x00);
    write_varint(&mut body, PROTOCOL_VERSION);
    write_varint(&mut body, host.len() as i32);
    body.extend_from_slice(host.as_bytes());
    let mut port_bytes = [0u8; 2];
    BigEndian::write_u16(&mut port_bytes, port);
    body.extend_from_slice(&port_bytes);
    write_varint(&mut body, NEXT_STATE_STATUS);

    let mut packet = Vec::with_capacity(body.len() + 5);
    write_varint(&mut packet, body.len() as i32);
    packet.extend_from_slice(&body);
    packet
}

async fn read_status_response<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String, QueryError> {
    let packet_len = read_length(reader).await?;
    if packet_len == 0 {
        return Err(QueryError::Protocol("empty response packet".to_string()));
    }

    let packet_id = read_varint(reader).await?;
    if packet_id != 0x00 {
        return Err(QueryError::Protocol(format!("unexpected packet id {:#04x}", packet_id)));
    }

    let json_len = read_length(reader).await?;
    if json_len >= packet_len {
        return Err(QueryError::Protocol(format!(
            "status string of {} bytes does not fit packet of {} bytes",
            json_len, packet_len
        )));
    }

    let mut json = vec![0u8; json_len];
    reader.read_exact(&mut json).await?;
    String::from_utf8(json).map_err(|e| QueryError::Protocol(format!("status is not UTF-8: {}", e)))
}

async fn read_length<R: AsyncRead + Unpin>(reader: &mut R) -> Result<usize, QueryError> {
    let len = read_varint(reader).await?;
    if len < 0 || len as usize > MAX_PACKET_LEN {
        return Err(QueryError::Protocol(format!("invalid length {}", len)));
    }
    Ok(len as usize)
}

#[derive(Deserialize)]
struct StatusPayload {
    version: Option<VersionInfo>,
    players: Option<PlayersInfo>,
    #[serde(default)]
    description: Value,
}

#[derive(Deserialize)]
struct VersionInfo {
    name: String,
}

#[derive(Deserialize)]
struct PlayersInfo {
    online: u32,
    max: u32,
    #[serde(default)]
    sample: Vec<SamplePlayer>,
}

#[derive(Deserialize)]
struct SamplePlayer {
    name: String,
}

pub fn parse_status(json: &str) -> Result<ServerSnapshot, QueryError> {
    let payload: StatusPayload = serde_json::from_str(json)?;
    let (players, online, max) = match payload.players {
        Some(p) => (
            p.sample.into_iter().map(|s| s.name).collect(),
            p.online,
            p.max,
        ),
        None => (Vec::new(), 0, 0),
    };
    let version = payload.version.map(|v| v.name).unwrap_or_default();
    let motd = clean_motd(&flatten_description(&payload.description));
    Ok(ServerSnapshot::new(players, online, max, motd, version))
}

/// Flattens a legacy string or chat component tree into plain text.
fn flatten_description(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts.iter().map(flatten_description).collect(),
        Value::Object(map) => {
            let mut text = map
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if let Some(Value::Array(extra)) = map.get("extra") {
                for part in extra {
                    text.push_str(&flatten_description(part));
                }
            }
            text
        }
        _ => String::new(),
    }
}

/// Drops `§x` formatting codes and surrounding whitespace.
fn clean_motd(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '§' {
            chars.next();
        } else {
            out.push(c);
        }
    }
    out.trim().to_string()
}
