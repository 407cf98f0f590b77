use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use thiserror::Error;

use crate::orders::{AccrualClientConfig, WorkerConfig};
use crate::session::store::DEFAULT_SESSION_TTL_SECS;

pub const DEFAULT_ENV: &str = "dev";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config yaml {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    #[serde(default)]
    pub rotation: LogRotation,
    pub gateway: GatewayConfig,
    /// PostgreSQL connection URL; in-memory storage when absent
    #[serde(default)]
    pub postgres_url: Option<String>,
    #[serde(default)]
    pub accrual: AccrualConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

/// Log file rollover period
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Never,
    Hourly,
    #[default]
    Daily,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl GatewayConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AccrualConfig {
    pub address: String,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub retry_count: u32,
    pub retry_wait_ms: u64,
    pub max_in_flight: usize,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self {
            address: "http://localhost:8081".to_string(),
            poll_interval_ms: 4000,
            request_timeout_ms: 1000,
            retry_count: 3,
            retry_wait_ms: 100,
            max_in_flight: 64,
        }
    }
}

impl AccrualConfig {
    pub fn client_config(&self) -> AccrualClientConfig {
        AccrualClientConfig {
            base_url: self.address.clone(),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            retry_count: self.retry_count,
            retry_wait: Duration::from_millis(self.retry_wait_ms),
        }
    }

    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_in_flight: self.max_in_flight,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    pub ttl_secs: u64,
    pub cookie_secret: String,
    pub cookie_max_age_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_SESSION_TTL_SECS,
            cookie_secret: String::new(),
            cookie_max_age_secs: crate::session::cookie::DEFAULT_COOKIE_MAX_AGE_SECS,
            sweep_interval_secs: 60,
        }
    }
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CredentialsConfig {
    pub password_salt: String,
}

impl AppConfig {
    /// Load `config/{env}.yaml`, then apply environment and command-line
    /// overrides, then validate.
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        let args: Vec<String> = std::env::args().collect();
        let mut config = Self::from_file(&format!("config/{}.yaml", env))?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.apply_cli_overrides(&args);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml(path, &content)
    }

    fn from_yaml(path: &str, content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// `RUN_ADDRESS`, `DATABASE_URI`, `ACCRUAL_SYSTEM_ADDRESS`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(addr) = non_empty("RUN_ADDRESS") {
            self.set_run_address(&addr);
        }
        if let Some(uri) = non_empty("DATABASE_URI") {
            self.postgres_url = Some(uri);
        }
        if let Some(addr) = non_empty("ACCRUAL_SYSTEM_ADDRESS") {
            self.accrual.address = addr;
        }
    }

    /// `-a <host:port>`, `-d <database uri>`, `-r <accrual address>`.
    pub fn apply_cli_overrides(&mut self, args: &[String]) {
        for i in 0..args.len() {
            let Some(value) = args.get(i + 1) else {
                break;
            };
            match args[i].as_str() {
                "-a" => self.set_run_address(value),
                "-d" => self.postgres_url = Some(value.clone()),
                "-r" => self.accrual.address = value.clone(),
                _ => {}
            }
        }
    }

    fn set_run_address(&mut self, addr: &str) {
        match addr.rsplit_once(':') {
            Some((host, port)) => {
                if !host.is_empty() {
                    self.gateway.host = host.to_string();
                }
                match port.parse() {
                    Ok(port) => self.gateway.port = port,
                    Err(_) => tracing::warn!("Ignoring run address with bad port: {}", addr),
                }
            }
            None => self.gateway.host = addr.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.cookie_secret.is_empty() {
            return Err(ConfigError::Invalid("session.cookie_secret is empty".into()));
        }
        if self.credentials.password_salt.is_empty() {
            return Err(ConfigError::Invalid("credentials.password_salt is empty".into()));
        }
        if self.accrual.address.is_empty() {
            return Err(ConfigError::Invalid("accrual.address is empty".into()));
        }
        if self.accrual.max_in_flight == 0 {
            return Err(ConfigError::Invalid("accrual.max_in_flight must be > 0".into()));
        }
        if self.session.ttl_secs == 0 || self.session.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "session.ttl_secs and session.sweep_interval_secs must be > 0".into(),
            ));
        }
        if self.accrual.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("accrual.poll_interval_ms must be > 0".into()));
        }
        Ok(())
    }
}

/// Environment name from `--env <name>` / `-e <name>`.
pub fn env_from_args(args: &[String]) -> String {
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    DEFAULT_ENV.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
log_level: info
log_dir: ./logs
log_file: ledger.log
use_json: false
rotation: daily
gateway:
  host: 0.0.0.0
  port: 8080
accrual:
  address: http://accrual:8081
  retry_count: 5
session:
  cookie_secret: secret
credentials:
  password_salt: salt
"#;

    fn sample() -> AppConfig {
        AppConfig::from_yaml("sample", SAMPLE).unwrap()
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = sample();
        assert_eq!(config.accrual.retry_count, 5);
        assert_eq!(config.accrual.poll_interval_ms, 4000);
        assert_eq!(config.accrual.max_in_flight, 64);
        assert_eq!(config.session.ttl_secs, 120);
        assert_eq!(config.session.sweep_interval_secs, 60);
        assert!(config.postgres_url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("RUN_ADDRESS", "127.0.0.1:9000"),
            ("DATABASE_URI", "postgres://db/ledger"),
            ("ACCRUAL_SYSTEM_ADDRESS", "http://other:1"),
        ]
        .into_iter()
        .collect();

        let mut config = sample();
        config.apply_env_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.gateway.bind_addr(), "127.0.0.1:9000");
        assert_eq!(config.postgres_url.as_deref(), Some("postgres://db/ledger"));
        assert_eq!(config.accrual.address, "http://other:1");
    }

    #[test]
    fn test_cli_overrides_env() {
        let mut config = sample();
        config.apply_env_overrides(|k| (k == "RUN_ADDRESS").then(|| "1.2.3.4:1".to_string()));
        config.apply_cli_overrides(&args(&["ledger", "-a", ":7000", "-d", "postgres://x", "-r", "acc:1"]));
        assert_eq!(config.gateway.host, "1.2.3.4");
        assert_eq!(config.gateway.port, 7000);
        assert_eq!(config.postgres_url.as_deref(), Some("postgres://x"));
        assert_eq!(config.accrual.address, "acc:1");
    }

    #[test]
    fn test_empty_env_values_ignored() {
        let mut config = sample();
        config.apply_env_overrides(|_| Some(String::new()));
        assert_eq!(config.gateway.bind_addr(), "0.0.0.0:8080");
        assert!(config.postgres_url.is_none());
    }

    #[test]
    fn test_missing_secret_is_invalid() {
        let mut config = sample();
        config.session.cookie_secret.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_parse_and_read_errors() {
        assert!(matches!(
            AppConfig::from_yaml("bad", "gateway: ["),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            AppConfig::from_file("config/does-not-exist.yaml"),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_log_rotation_values() {
        assert_eq!(sample().rotation, LogRotation::Daily);

        let hourly = SAMPLE.replace("rotation: daily", "rotation: hourly");
        assert_eq!(
            AppConfig::from_yaml("hourly", &hourly).unwrap().rotation,
            LogRotation::Hourly
        );

        let missing = SAMPLE.replace("rotation: daily\n", "");
        assert_eq!(
            AppConfig::from_yaml("missing", &missing).unwrap().rotation,
            LogRotation::Daily
        );

        let bad = SAMPLE.replace("rotation: daily", "rotation: weekly");
        assert!(matches!(
            AppConfig::from_yaml("bad", &bad),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_env_from_args() {
        assert_eq!(env_from_args(&args(&["ledger"])), "dev");
        assert_eq!(env_from_args(&args(&["ledger", "-e", "prod"])), "prod");
        assert_eq!(env_from_args(&args(&["ledger", "--env", "ci"])), "ci");
    }
}
