// src/query.rs
//! Immediate status reads. Nothing here touches the monitor's stored state.

use log::warn;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;
use crate::error::QueryError;
use crate::models::server::{ServerConfig, ServerSnapshot};
use crate::status::StatusSource;

/// Body of a successful `/status` lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub online: bool,
    pub players_online: u32,
    pub players: Vec<String>,
    pub motd: String,
    pub version: String,
}

impl From<ServerSnapshot> for StatusResponse {
    fn from(snapshot: ServerSnapshot) -> Self {
        Self {
            online: true,
            players_online: snapshot.online,
            players: snapshot.players,
            motd: snapshot.motd,
            version: snapshot.version,
        }
    }
}

pub async fn query_one(
    source: &dyn StatusSource,
    domain: &str,
    port: u16,
) -> Result<StatusResponse, QueryError> {
    source.query_status(domain, port).await.map(StatusResponse::from)
}

/// One line per configured server, in configuration order. Servers are
/// queried concurrently and each failure only affects its own line.
pub async fn now_report(servers: &[ServerConfig], source: Arc<dyn StatusSource>) -> String {
    let mut tasks = JoinSet::new();
    for (index, server) in servers.iter().cloned().enumerate() {
        let source = Arc::clone(&source);
        tasks.spawn(async move {
            let result = source.query_status(&server.host, server.port).await;
            (index, result)
        });
    }

    let mut results: Vec<Option<Result<ServerSnapshot, QueryError>>> =
        (0..servers.len()).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => results[index] = Some(result),
            Err(e) => warn!("Status task failed: {}", e),
        }
    }

    servers
        .iter()
        .zip(results)
        .map(|(server, result)| match result {
            Some(Ok(snapshot)) => format_status_line(&server.name, &snapshot),
            Some(Err(e)) => {
                warn!("[{}] on-demand query failed: {}", server.name, e);
                format_unreachable_line(&server.name)
            }
            None => format_unreachable_line(&server.name),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_status_line(name: &str, snapshot: &ServerSnapshot) -> String {
    if snapshot.players.is_empty() {
        format!("💤 **{}**: No one online", name)
    } else {
        format!(
            "👥 **{}**: {} online\n> {}",
            name,
            snapshot.players.len(),
            snapshot.players.join(", ")
        )
    }
}

fn format_unreachable_line(name: &str) -> String {
    format!("⚠️ **{}**: Unreachable", name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Scripted, ScriptedSource};

    fn servers() -> Vec<ServerConfig> {
        vec![
            ServerConfig::new("Alpha", "h1", 25565),
            ServerConfig::new("Beta", "h2", 25565),
            ServerConfig::new("Gamma", "h3", 25565),
        ]
    }

    #[tokio::test]
    async fn report_has_a_line_per_server_despite_failures() {
        let source = Arc::new(
            ScriptedSource::new()
                .script("h1", vec![Scripted::Up(vec!["Bob", "Ann"])])
                .script("h2", vec![Scripted::Panic])
                .script("h3", vec![Scripted::Up(vec![])]),
        );
        let report = now_report(&servers(), source).await;
        assert_eq!(
            report,
            "👥 **Alpha**: 2 online\n> Bob, Ann\n\n⚠️ **Beta**: Unreachable\n\n💤 **Gamma**: No one online"
        );
    }

    #[tokio::test]
    async fn report_keeps_configuration_order_when_all_down() {
        let report = now_report(&servers(), Arc::new(ScriptedSource::new())).await;
        assert_eq!(
            report,
            "⚠️ **Alpha**: Unreachable\n\n⚠️ **Beta**: Unreachable\n\n⚠️ **Gamma**: Unreachable"
        );
    }

    #[tokio::test]
    async fn query_one_maps_snapshot_to_response() {
        let source = ScriptedSource::new().script("mc.example.org", vec![Scripted::Up(vec!["Ann"])]);
        let response = query_one(&source, "mc.example.org", 25565).await.unwrap();
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({
                "online": true,
                "playersOnline": 1,
                "players": ["Ann"],
                "motd": "",
                "version": "1.21"
            })
        );
    }
}
