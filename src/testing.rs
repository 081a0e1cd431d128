// src/testing.rs
//! In-process fakes for the outbound collaborators.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::time::Duration;
use crate::enrich::Enricher;
use crate::error::{EnrichError, QueryError, SendError};
use crate::models::server::ServerSnapshot;
use crate::notify::Notifier;
use crate::status::StatusSource;

#[derive(Debug, Clone)]
pub enum Scripted {
    Up(Vec<&'static str>),
    Down,
    Slow(Duration, Vec<&'static str>),
    Panic,
}

/// Replays a queue of outcomes per host. An exhausted queue reports the host down.
#[derive(Default)]
pub struct ScriptedSource {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, host: &str, outcomes: Vec<Scripted>) -> Self {
        self.scripts.lock().insert(host.to_string(), outcomes.into());
        self
    }

    pub fn push(&self, host: &str, outcome: Scripted) {
        self.scripts
            .lock()
            .entry(host.to_string())
            .or_default()
            .push_back(outcome);
    }
}

#[async_trait]
impl StatusSource for ScriptedSource {
    async fn query_status(&self, host: &str, _port: u16) -> Result<ServerSnapshot, QueryError> {
        let next = self.scripts.lock().get_mut(host).and_then(VecDeque::pop_front);
        match next {
            Some(Scripted::Up(names)) => Ok(ServerSnapshot::with_players(&names)),
            Some(Scripted::Slow(delay, names)) => {
                tokio::time::sleep(delay).await;
                Ok(ServerSnapshot::with_players(&names))
            }
            Some(Scripted::Panic) => panic!("scripted panic for {}", host),
            Some(Scripted::Down) | None => Err(QueryError::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<String>>,
    failing: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every message but reports each send as failed.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.sent.lock())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> Result<(), SendError> {
        self.sent.lock().push(text.to_string());
        if self.failing {
            return Err(SendError::Status {
                status: 500,
                body: "boom".to_string(),
            });
        }
        Ok(())
    }
}

pub enum StaticEnricher {
    Reply(&'static str),
    Fail,
}

#[async_trait]
impl Enricher for StaticEnricher {
    async fn summarize(&self, _names: &[String]) -> Result<String, EnrichError> {
        match self {
            Self::Reply(text) => Ok(text.to_string()),
            Self::Fail => Err(EnrichError::Timeout(Duration::from_secs(10))),
        }
    }
}
