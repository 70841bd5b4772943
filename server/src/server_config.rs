use std::time::Duration;

use serde::{Deserialize, Serialize};

use common::config::Validate;

pub const CLEANUP_CHECK_INTERVAL: Duration = Duration::from_secs(300);

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:4000";
const DEFAULT_STATS_FILE: &str = "tictactoe_stats.yaml";
const DEFAULT_BOT_MOVE_DELAY_MS: u64 = 300;
const MAX_BOT_MOVE_DELAY_MS: u64 = 5000;
const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 3600;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub stats_file: String,
    /// Pause before the bot answers, so its move does not land with the human's.
    pub bot_move_delay_ms: u64,
    pub session_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            stats_file: DEFAULT_STATS_FILE.to_string(),
            bot_move_delay_ms: DEFAULT_BOT_MOVE_DELAY_MS,
            session_timeout_secs: DEFAULT_SESSION_TIMEOUT_SECS,
        }
    }
}

impl ServerConfig {
    pub fn bot_move_delay(&self) -> Duration {
        Duration::from_millis(self.bot_move_delay_ms)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(format!("Invalid bind address '{}'", self.bind_address));
        }
        if self.stats_file.trim().is_empty() {
            return Err("Stats file path must not be empty".to_string());
        }
        if self.bot_move_delay_ms > MAX_BOT_MOVE_DELAY_MS {
            return Err(format!(
                "Bot move delay ({} ms) cannot exceed {} ms",
                self.bot_move_delay_ms, MAX_BOT_MOVE_DELAY_MS
            ));
        }
        if self.session_timeout_secs == 0 {
            return Err("Session timeout must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::config::{ConfigSerializer, YamlConfigSerializer};

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(ServerConfig::default().validate(), Ok(()));
        assert_eq!(ServerConfig::default().bot_move_delay(), Duration::from_millis(300));
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: ServerConfig = YamlConfigSerializer
            .deserialize("bot_move_delay_ms: 0\n")
            .unwrap();

        assert_eq!(config.bot_move_delay_ms, 0);
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.session_timeout_secs, DEFAULT_SESSION_TIMEOUT_SECS);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = ServerConfig::default();
        config.bind_address = "not an address".to_string();
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.bot_move_delay_ms = MAX_BOT_MOVE_DELAY_MS + 1;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.session_timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
