// src/monitor/scheduler.rs
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use crate::models::server::ServerConfig;
use crate::status::StatusSource;
use crate::storage::memory::ServerStateStore;
use super::dispatcher::{plan, NotificationDispatcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Reachable,
    Unreachable,
    /// An earlier poll of the same server was still running.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollReport {
    pub outcome: PollOutcome,
    pub notices_sent: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub reachable: usize,
    pub unreachable: usize,
    pub skipped: usize,
    /// Poll tasks that panicked.
    pub failed: usize,
    pub notices_sent: usize,
}

impl SweepReport {
    fn record(&mut self, poll: PollReport) {
        match poll.outcome {
            PollOutcome::Reachable => self.reachable += 1,
            PollOutcome::Unreachable => self.unreachable += 1,
            PollOutcome::Skipped => self.skipped += 1,
        }
        self.notices_sent += poll.notices_sent;
    }
}

pub struct Scheduler {
    servers: Vec<ServerConfig>,
    source: Arc<dyn StatusSource>,
    store: Arc<ServerStateStore>,
    dispatcher: NotificationDispatcher,
    period: Duration,
    notify_on_first_poll: bool,
}

impl Scheduler {
    pub fn new(
        servers: Vec<ServerConfig>,
        source: Arc<dyn StatusSource>,
        store: Arc<ServerStateStore>,
        dispatcher: NotificationDispatcher,
        period: Duration,
        notify_on_first_poll: bool,
    ) -> Self {
        Self {
            servers,
            source,
            store,
            dispatcher,
            period,
            notify_on_first_poll,
        }
    }

    /// Query, plan, dispatch, then store, strictly in that order for one server.
    pub async fn poll_server(&self, server: &ServerConfig) -> PollReport {
        let Some(_guard) = self.store.try_begin_poll(&server.name) else {
            debug!("[{}] previous poll still running, skipping", server.name);
            return PollReport {
                outcome: PollOutcome::Skipped,
                notices_sent: 0,
            };
        };

        let outcome = self.source.query_status(&server.host, server.port).await;
        match &outcome {
            Ok(snapshot) => debug!(
                "[{}] {} online: {:?}",
                server.name, snapshot.online, snapshot.players
            ),
            Err(e) => warn!("[{}] connection to {}:{} failed: {}", server.name, server.host, server.port, e),
        }

        let previous = self.store.get(&server.name);
        let notices = plan(&previous, &outcome, self.notify_on_first_poll);
        let notices_sent = self.dispatcher.dispatch(server, &notices).await;

        let outcome = match outcome {
            Ok(snapshot) => {
                self.store.update(&server.name, snapshot.players, false);
                PollOutcome::Reachable
            }
            Err(_) => {
                self.store.mark_unreachable(&server.name);
                PollOutcome::Unreachable
            }
        };
        PollReport { outcome, notices_sent }
    }

    /// Polls every configured server concurrently and waits for all of them.
    /// A panicking poll is counted as failed and does not affect the others.
    pub async fn sweep(self: &Arc<Self>) -> SweepReport {
        let mut tasks = JoinSet::new();
        for server in self.servers.iter().cloned() {
            let scheduler = Arc::clone(self);
            tasks.spawn(async move { scheduler.poll_server(&server).await });
        }

        let mut report = SweepReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(poll) => report.record(poll),
                Err(e) => {
                    error!("Poll task failed: {}", e);
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Starts a sweep every period until `shutdown` flips. Sweeps are spawned,
    /// so a slow sweep never delays the next tick.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Monitoring {} server(s) every {:?}",
            self.servers.len(),
            self.period
        );
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let scheduler = Arc::clone(&self);
                    tokio::spawn(async move {
                        let report = scheduler.sweep().await;
                        debug!(
                            "Sweep finished: {} reachable, {} unreachable, {} skipped, {} failed, {} notice(s) sent",
                            report.reachable,
                            report.unreachable,
                            report.skipped,
                            report.failed,
                            report.notices_sent
                        );
                    });
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Scheduler stopping");
                        break;
                    }
                }
            }
        }
    }
}
