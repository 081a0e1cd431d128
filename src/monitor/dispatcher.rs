// src/monitor/dispatcher.rs
use log::{error, info, warn};
use std::sync::Arc;
use crate::enrich::Enricher;
use crate::error::QueryError;
use crate::models::server::{ServerConfig, ServerRuntimeState, ServerSnapshot};
use crate::notify::Notifier;
use super::diff::diff;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Recovered,
    Joined(Vec<String>),
    Left(Vec<String>),
    Unreachable,
}

/// Decides which notices one poll outcome produces, given the state stored
/// before the poll. Rules apply in order: recovery, joined, left, unreachable.
pub fn plan(
    previous: &ServerRuntimeState,
    outcome: &Result<ServerSnapshot, QueryError>,
    notify_on_first_poll: bool,
) -> Vec<Notice> {
    let mut notices = Vec::new();
    match outcome {
        Ok(snapshot) => {
            if previous.unreachable {
                notices.push(Notice::Recovered);
            }
            let changes = diff(&previous.last_players, &snapshot.players);
            let baseline = !previous.initialized && !notify_on_first_poll;
            if !changes.joined.is_empty() && !baseline {
                notices.push(Notice::Joined(changes.joined));
            }
            if !changes.left.is_empty() {
                notices.push(Notice::Left(changes.left));
            }
        }
        Err(_) => {
            if !previous.unreachable {
                notices.push(Notice::Unreachable);
            }
        }
    }
    notices
}

pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    enricher: Option<Arc<dyn Enricher>>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, enricher: Option<Arc<dyn Enricher>>) -> Self {
        Self { notifier, enricher }
    }

    /// Sends every notice in order. Returns how many were delivered; failures
    /// are logged and otherwise ignored.
    pub async fn dispatch(&self, server: &ServerConfig, notices: &[Notice]) -> usize {
        let mut delivered = 0;
        for notice in notices {
            let text = self.render(server, notice).await;
            match self.notifier.send(&text).await {
                Ok(()) => {
                    info!("[{}] sent {:?}", server.name, notice);
                    delivered += 1;
                }
                Err(e) => error!("[{}] failed to send {:?}: {}", server.name, notice, e),
            }
        }
        delivered
    }

    async fn render(&self, server: &ServerConfig, notice: &Notice) -> String {
        match notice {
            Notice::Recovered => format_recovered(&server.name),
            Notice::Joined(names) => match &self.enricher {
                Some(enricher) => match enricher.summarize(names).await {
                    Ok(text) if !text.trim().is_empty() => text,
                    Ok(_) => {
                        warn!("[{}] enrichment returned blank text, using fallback", server.name);
                        format_joined(&server.name, names)
                    }
                    Err(e) => {
                        warn!("[{}] enrichment failed, using fallback: {}", server.name, e);
                        format_joined(&server.name, names)
                    }
                },
                None => format_joined(&server.name, names),
            },
            Notice::Left(names) => format_left(&server.name, names),
            Notice::Unreachable => format_unreachable(server),
        }
    }
}

pub fn format_recovered(name: &str) -> String {
    format!("✅ **{}** is reachable again", name)
}

pub fn format_joined(name: &str, names: &[String]) -> String {
    format!("🟢 **{}** player joined: {}", name, names.join(", "))
}

pub fn format_left(name: &str, names: &[String]) -> String {
    format!("🔴 **{}** player left: {}", name, names.join(", "))
}

pub fn format_unreachable(server: &ServerConfig) -> String {
    format!("⚠️ Cannot reach **{}** ({}:{})", server.name, server.host, server.port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingNotifier, StaticEnricher};
    use std::io;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    fn seen(players: &[&str], unreachable: bool) -> ServerRuntimeState {
        ServerRuntimeState {
            last_players: names(players),
            unreachable,
            initialized: true,
        }
    }

    fn failure() -> Result<ServerSnapshot, QueryError> {
        Err(QueryError::Io(io::Error::new(io::ErrorKind::TimedOut, "down")))
    }

    fn up(players: &[&str]) -> Result<ServerSnapshot, QueryError> {
        Ok(ServerSnapshot::with_players(players))
    }

    #[test]
    fn recovery_comes_before_roster_changes() {
        let notices = plan(&seen(&["Ann"], true), &up(&["Bob"]), true);
        assert_eq!(
            notices,
            vec![
                Notice::Recovered,
                Notice::Joined(names(&["Bob"])),
                Notice::Left(names(&["Ann"])),
            ]
        );
    }

    #[test]
    fn recovery_with_same_roster_is_quiet_apart_from_recovery() {
        let notices = plan(&seen(&["Ann", "Bob"], true), &up(&["Ann", "Bob"]), true);
        assert_eq!(notices, vec![Notice::Recovered]);
    }

    #[test]
    fn unreachable_is_edge_triggered() {
        assert_eq!(plan(&seen(&[], false), &failure(), true), vec![Notice::Unreachable]);
        assert!(plan(&seen(&[], true), &failure(), true).is_empty());
    }

    #[test]
    fn first_poll_policy() {
        let fresh = ServerRuntimeState::default();
        assert_eq!(
            plan(&fresh, &up(&["Bob"]), true),
            vec![Notice::Joined(names(&["Bob"]))]
        );
        assert!(plan(&fresh, &up(&["Bob"]), false).is_empty());

        // A server that was down at startup is still a baseline when it comes up.
        let down_at_start = ServerRuntimeState {
            unreachable: true,
            ..ServerRuntimeState::default()
        };
        assert_eq!(plan(&down_at_start, &up(&["Bob"]), false), vec![Notice::Recovered]);
    }

    #[test]
    fn messages_name_server_and_players() {
        let server = ServerConfig::new("Alpha", "mc.example.org", 25565);
        assert_eq!(format_joined("Alpha", &names(&["Bob", "Ann"])), "🟢 **Alpha** player joined: Bob, Ann");
        assert_eq!(format_left("Alpha", &names(&["Bob"])), "🔴 **Alpha** player left: Bob");
        assert_eq!(format_recovered("Alpha"), "✅ **Alpha** is reachable again");
        assert_eq!(format_unreachable(&server), "⚠️ Cannot reach **Alpha** (mc.example.org:25565)");
    }

    #[tokio::test]
    async fn enrichment_text_replaces_join_message() {
        let notifier = Arc::new(RecordingNotifier::new());
        let dispatcher = NotificationDispatcher::new(
            notifier.clone(),
            Some(Arc::new(StaticEnricher::Reply("Bob just joined the Minecraft server, come play!"))),
        );
        let server = ServerConfig::new("Alpha", "h", 1);

        dispatcher.dispatch(&server, &[Notice::Joined(names(&["Bob"]))]).await;
        assert_eq!(notifier.sent(), vec!["Bob just joined the Minecraft server, come play!"]);
    }

    #[tokio::test]
    async fn enrichment_failure_or_blank_falls_back() {
        let server = ServerConfig::new("Alpha", "h", 1);
        for enricher in [StaticEnricher::Fail, StaticEnricher::Reply("   ")] {
            let notifier = Arc::new(RecordingNotifier::new());
            let dispatcher = NotificationDispatcher::new(notifier.clone(), Some(Arc::new(enricher)));
            dispatcher.dispatch(&server, &[Notice::Joined(names(&["Bob"]))]).await;
            assert_eq!(notifier.sent(), vec!["🟢 **Alpha** player joined: Bob"]);
        }
    }

    #[tokio::test]
    async fn enrichment_is_only_used_for_joins() {
        let notifier = Arc::new(RecordingNotifier::new());
        let dispatcher =
            NotificationDispatcher::new(notifier.clone(), Some(Arc::new(StaticEnricher::Reply("hype"))));
        let server = ServerConfig::new("Alpha", "h", 1);

        dispatcher
            .dispatch(&server, &[Notice::Recovered, Notice::Left(names(&["Ann"]))])
            .await;
        assert_eq!(
            notifier.sent(),
            vec!["✅ **Alpha** is reachable again", "🔴 **Alpha** player left: Ann"]
        );
    }

    #[tokio::test]
    async fn send_failures_do_not_stop_later_notices() {
        let notifier = Arc::new(RecordingNotifier::failing());
        let dispatcher = NotificationDispatcher::new(notifier.clone(), None);
        let server = ServerConfig::new("Alpha", "h", 1);

        let delivered = dispatcher
            .dispatch(&server, &[Notice::Joined(names(&["Bob"])), Notice::Left(names(&["Ann"]))])
            .await;
        assert_eq!(delivered, 0);
        assert_eq!(notifier.sent().len(), 2);
    }
}
