// src/models/server.rs
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_PORT: u16 = 25565;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.name, self.host, self.port)
    }
}

/// Result of one successful status query. Built fresh per poll and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerSnapshot {
    pub reachable: bool,
    /// Sampled player names, deduplicated in the order the server listed them.
    pub players: Vec<String>,
    /// Server-reported count. The sample may be truncated, so this can exceed `players.len()`.
    pub online: u32,
    pub max: u32,
    pub motd: String,
    pub version: String,
}

impl ServerSnapshot {
    pub fn new(players: Vec<String>, online: u32, max: u32, motd: String, version: String) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(players.len());
        for name in players {
            if !unique.contains(&name) {
                unique.push(name);
            }
        }
        Self {
            reachable: true,
            players: unique,
            online,
            max,
            motd,
            version,
        }
    }

    #[cfg(test)]
    pub fn with_players(names: &[&str]) -> Self {
        let players: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        let online = players.len() as u32;
        Self::new(players, online, 20, String::new(), "1.21".to_string())
    }
}

/// Per-server memory kept between polls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerRuntimeState {
    pub last_players: Vec<String>,
    pub unreachable: bool,
    /// Set once any successful poll has been processed for the server.
    pub initialized: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_dedups_players_keeping_first_seen_order() {
        let snapshot = ServerSnapshot::new(
            vec!["Bob".into(), "Ann".into(), "Bob".into(), "Cid".into()],
            4,
            20,
            "hi".into(),
            "1.21".into(),
        );
        assert_eq!(snapshot.players, vec!["Bob", "Ann", "Cid"]);
        assert_eq!(snapshot.online, 4);
        assert!(snapshot.reachable);
    }
}
