use std::{fmt, str::FromStr};

use anyhow::{anyhow, Context};
use axum::http::StatusCode;

/// What the gate middleware does before a request reaches the routes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GatePolicy {
    #[default]
    Open,
    /// Every request gets a 403.
    Lockout,
    /// 403 whenever the wall-clock second is a multiple of three.
    Moody,
}

impl FromStr for GatePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use GatePolicy::*;
        match s.trim().to_ascii_lowercase().as_str() {
            "open" | "" => Ok(Open),
            "lockout" => Ok(Lockout),
            "moody" => Ok(Moody),
            other => Err(anyhow!("unknown gate policy {other:?}")),
        }
    }
}

impl fmt::Display for GatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub bind_addr: String,
    pub server_name: String,
    pub gate: GatePolicy,
    /// Answer schema failures with 200 and new messages with 210, for clients
    /// that still expect those codes.
    pub legacy_status_codes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://hubs.db?mode=rwc".to_owned(),
            max_connections: 16,
            bind_addr: "0.0.0.0:8080".to_owned(),
            server_name: "Cassandra".to_owned(),
            gate: GatePolicy::Open,
            legacy_status_codes: false,
        }
    }
}

impl Config {
    /// Reads the process environment, after loading `.env` if there is one.
    pub fn from_env() -> anyhow::Result<Config> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Config> {
        let defaults = Config::default();

        Ok(Config {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            max_connections: parsed(&lookup, "DATABASE_MAX_CONNECTIONS")?
                .unwrap_or(defaults.max_connections),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            server_name: lookup("SERVER_NAME").unwrap_or(defaults.server_name),
            gate: parsed(&lookup, "GATE_POLICY")?.unwrap_or(defaults.gate),
            legacy_status_codes: parsed(&lookup, "LEGACY_STATUS_CODES")?
                .unwrap_or(defaults.legacy_status_codes),
        })
    }

    pub fn schema_failure_status(&self) -> StatusCode {
        if self.legacy_status_codes {
            StatusCode::OK
        } else {
            StatusCode::BAD_REQUEST
        }
    }

    pub fn message_created_status(&self) -> StatusCode {
        if self.legacy_status_codes {
            StatusCode::from_u16(210).unwrap_or(StatusCode::CREATED)
        } else {
            StatusCode::CREATED
        }
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: Into<anyhow::Error>,
{
    lookup(key)
        .map(|raw| raw.parse::<T>().map_err(Into::<anyhow::Error>::into).with_context(|| format!("invalid {key}={raw:?}")))
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.server_name, "Cassandra");
        assert_eq!(config.gate, GatePolicy::Open);
        assert_eq!(config.max_connections, 16);
        assert!(!config.legacy_status_codes);
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("GATE_POLICY", "Moody"),
            ("LEGACY_STATUS_CODES", "true"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("BIND_ADDR", "127.0.0.1:3000"),
        ]).unwrap();

        assert_eq!(config.gate, GatePolicy::Moody);
        assert!(config.legacy_status_codes);
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.bind_addr, "127.0.0.1:3000");
    }

    #[test]
    fn legacy_statuses() {
        let mut config = Config::default();
        assert_eq!(config.schema_failure_status(), StatusCode::BAD_REQUEST);
        assert_eq!(config.message_created_status(), StatusCode::CREATED);

        config.legacy_status_codes = true;
        assert_eq!(config.schema_failure_status(), StatusCode::OK);
        assert_eq!(config.message_created_status().as_u16(), 210);
    }

    #[test]
    fn rejects_garbage() {
        let err = config_from(&[("GATE_POLICY", "sometimes")]).unwrap_err();
        assert!(err.to_string().contains("GATE_POLICY"));

        assert!(config_from(&[("DATABASE_MAX_CONNECTIONS", "lots")]).is_err());
    }
}
