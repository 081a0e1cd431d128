use std::collections::HashSet;
use std::env;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;
use governor::Quota;
use crate::error::ConfigError;
use crate::models::server::{ServerConfig, DEFAULT_PORT};

const DEFAULT_SERVERS: &str = "My Server=chiwei.aternos.me:25565";
const DEFAULT_DISCORD_API: &str = "https://discord.com/api/v10";

#[derive(Clone, Debug)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub channel_id: String,
    pub discord_api_base: String,
    pub discord_public_key: Option<String>,
    pub discord_application_id: Option<String>,
    pub register_commands: bool,
    pub discord_timeout_secs: u64,

    // Enrichment, disabled without a key
    pub gemini_api_key: Option<String>,
    pub gemini_api_base: String,
    pub gemini_model: String,

    // Monitoring
    pub servers: Vec<ServerConfig>,
    pub check_interval_secs: u64,
    pub query_timeout_secs: u64,
    pub enrich_timeout_secs: u64,
    pub notify_on_first_poll: bool,

    // HTTP front end
    pub bind_address: String,
    pub port: u16,
    pub status_quota: Quota,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let discord_token = get("DISCORD_TOKEN").ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;
        let channel_id = get("CHANNEL_ID").ok_or(ConfigError::Missing("CHANNEL_ID"))?;

        let servers = parse_servers(&get("SERVERS").unwrap_or_else(|| DEFAULT_SERVERS.to_string()))?;

        let check_interval_secs = positive(&get, "CHECK_INTERVAL_SECS", 30)?;
        let query_timeout_secs = positive(&get, "QUERY_TIMEOUT_SECS", 5)?;
        let enrich_timeout_secs = positive(&get, "ENRICH_TIMEOUT_SECS", 10)?;
        let discord_timeout_secs = positive(&get, "DISCORD_TIMEOUT_SECS", 10)?;

        let status_period_secs = positive(&get, "STATUS_PERIOD_SECS", 1)?;
        let status_burst_limit: u32 = parse_or(&get, "STATUS_BURST_LIMIT", 10)?;
        let status_quota = NonZeroU32::new(status_burst_limit)
            .and_then(|burst| {
                Quota::with_period(Duration::from_secs(status_period_secs))
                    .map(|quota| quota.allow_burst(burst))
            })
            .ok_or(ConfigError::Invalid {
                key: "STATUS_BURST_LIMIT",
                value: status_burst_limit.to_string(),
            })?;

        Ok(Self {
            discord_token,
            channel_id,
            discord_api_base: get("DISCORD_API_BASE").unwrap_or_else(|| DEFAULT_DISCORD_API.to_string()),
            discord_public_key: get("DISCORD_PUBLIC_KEY"),
            discord_application_id: get("DISCORD_APPLICATION_ID"),
            register_commands: parse_bool(&get, "REGISTER_COMMANDS", false)?,
            discord_timeout_secs,

            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_api_base: get("GEMINI_API_BASE")
                .unwrap_or_else(|| crate::enrich::gemini::DEFAULT_API_BASE.to_string()),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| "gemini-2.5-flash".to_string()),

            servers,
            check_interval_secs,
            query_timeout_secs,
            enrich_timeout_secs,
            notify_on_first_poll: parse_bool(&get, "NOTIFY_ON_FIRST_POLL", true)?,

            bind_address: get("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&get, "PORT", 3000)?,
            status_quota,
        })
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn enrich_timeout(&self) -> Duration {
        Duration::from_secs(self.enrich_timeout_secs)
    }

    pub fn discord_timeout(&self) -> Duration {
        Duration::from_secs(self.discord_timeout_secs)
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

fn positive<G>(get: &G, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let value: u64 = parse_or(get, key, default)?;
    if value == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        });
    }
    Ok(value)
}

fn parse_bool<G>(get: &G, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { key, value }),
        },
    }
}

/// Parses `name=host[:port]` entries separated by `;`.
pub fn parse_servers(raw: &str) -> Result<Vec<ServerConfig>, ConfigError> {
    let invalid = |entry: &str| ConfigError::Invalid {
        key: "SERVERS",
        value: entry.to_string(),
    };

    let mut servers = Vec::new();
    let mut names = HashSet::new();
    for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let (name, address) = entry.split_once('=').ok_or_else(|| invalid(entry))?;
        let (name, address) = (name.trim(), address.trim());

        let (host, port) = split_host_port(address).ok_or_else(|| invalid(entry))?;
        if name.is_empty() || host.is_empty() {
            return Err(invalid(entry));
        }
        if !names.insert(name.to_string()) {
            return Err(ConfigError::DuplicateServer(name.to_string()));
        }
        servers.push(ServerConfig::new(name, host, port));
    }

    if servers.is_empty() {
        return Err(ConfigError::NoServers);
    }
    Ok(servers)
}

/// Accepts `host`, `host:port`, `[v6]`, `[v6]:port` and a bare IPv6 literal.
/// Brackets are stripped from the returned host.
fn split_host_port(address: &str) -> Option<(&str, u16)> {
    let parse_port = |port: &str| port.parse::<u16>().ok();

    if let Some(rest) = address.strip_prefix('[') {
        let (host, tail) = rest.split_once(']')?;
        let port = match tail {
            "" => DEFAULT_PORT,
            _ => parse_port(tail.strip_prefix(':')?)?,
        };
        return Some((host, port));
    }
    match address.rsplit_once(':') {
        // More than one colon without brackets can only be an IPv6 literal.
        Some((host, _)) if host.contains(':') => Some((address, DEFAULT_PORT)),
        Some((host, port)) => Some((host, parse_port(port)?)),
        None => Some((address, DEFAULT_PORT)),
    }
}
