//! Poller and idle-adapter configuration structures.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::idle::IdleSettings;

/// Trigger policy selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerConfig {
    /// Fixed-rate schedule measured from the start of each invocation.
    FixedRate {
        /// Period in milliseconds.
        period_ms: u64,
    },
    /// Fixed-delay schedule measured from the completion of each invocation.
    FixedDelay {
        /// Period in milliseconds.
        period_ms: u64,
    },
    /// Re-arm immediately after each completion (blocking-wait loops).
    Immediate,
}

impl TriggerConfig {
    fn validate(&self) -> Result<(), String> {
        match self {
            Self::FixedRate { period_ms } | Self::FixedDelay { period_ms } if *period_ms == 0 => {
                Err("period_ms must be greater than 0".into())
            }
            _ => Ok(()),
        }
    }
}

/// Configuration for one polling endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Trigger policy.
    pub trigger: TriggerConfig,
    /// Downstream dispatch timeout in milliseconds.
    pub send_timeout_ms: u64,
    /// Maximum receive/dispatch cycles per scheduled invocation.
    pub max_messages_per_poll: usize,
    /// Whether cycles run under the synthetic commit/rollback protocol.
    pub transactional: bool,
}

impl PollerConfig {
    /// Validate poller configuration values.
    pub fn validate(&self) -> Result<(), String> {
        self.trigger.validate()?;
        if self.send_timeout_ms == 0 {
            return Err("send_timeout_ms must be greater than 0".into());
        }
        if self.max_messages_per_poll == 0 {
            return Err("max_messages_per_poll must be greater than 0".into());
        }
        Ok(())
    }
}

/// Configuration for an idle (blocking-wait) adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdleConfig {
    /// Backoff before the next wait after a failed cycle, in milliseconds.
    pub reconnect_delay_ms: u64,
    /// Keep-alive probe period in milliseconds.
    pub ping_interval_ms: u64,
    /// Whether failed cycles schedule a delayed retry.
    pub auto_reconnect: bool,
    /// Downstream dispatch timeout in milliseconds.
    pub send_timeout_ms: u64,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: 10_000,
            ping_interval_ms: 10_000,
            auto_reconnect: true,
            send_timeout_ms: 1_000,
        }
    }
}

impl IdleConfig {
    /// Validate idle adapter configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.reconnect_delay_ms == 0 {
            return Err("reconnect_delay_ms must be greater than 0".into());
        }
        if self.ping_interval_ms == 0 {
            return Err("ping_interval_ms must be greater than 0".into());
        }
        if self.send_timeout_ms == 0 {
            return Err("send_timeout_ms must be greater than 0".into());
        }
        Ok(())
    }

    /// Convert into runtime settings.
    pub const fn settings(&self) -> IdleSettings {
        IdleSettings {
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
            ping_interval: Duration::from_millis(self.ping_interval_ms),
            auto_reconnect: self.auto_reconnect,
            send_timeout: Duration::from_millis(self.send_timeout_ms),
        }
    }
}

/// Root polling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Map of poller name to configuration.
    pub pollers: HashMap<String, PollerConfig>,
}

impl PollingConfig {
    /// Validate all pollers and ensure at least one is defined.
    pub fn validate(&self) -> Result<(), String> {
        if self.pollers.is_empty() {
            return Err("at least one poller must be defined".into());
        }
        for (name, poller) in &self.pollers {
            poller
                .validate()
                .map_err(|e| format!("poller `{name}` invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse polling configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_config() {
        let cfg = PollingConfig::from_json_str(
            r#"{
                "pollers": {
                    "orders": {
                        "trigger": { "fixed_delay": { "period_ms": 500 } },
                        "send_timeout_ms": 1000,
                        "max_messages_per_poll": 10,
                        "transactional": true
                    }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.pollers.len(), 1);
        assert!(cfg.pollers["orders"].transactional);
    }

    #[test]
    fn rejects_zero_period() {
        let err = PollingConfig::from_json_str(
            r#"{
                "pollers": {
                    "orders": {
                        "trigger": { "fixed_rate": { "period_ms": 0 } },
                        "send_timeout_ms": 1000,
                        "max_messages_per_poll": 1,
                        "transactional": false
                    }
                }
            }"#,
        )
        .unwrap_err();
        assert!(err.contains("period_ms"));
    }

    #[test]
    fn rejects_empty_config() {
        let err = PollingConfig::from_json_str(r#"{ "pollers": {} }"#).unwrap_err();
        assert!(err.contains("at least one poller"));
    }

    #[test]
    fn idle_config_converts_to_settings() {
        let cfg = IdleConfig {
            reconnect_delay_ms: 250,
            ..IdleConfig::default()
        };
        cfg.validate().unwrap();
        assert_eq!(cfg.settings().reconnect_delay, Duration::from_millis(250));
        assert!(cfg.settings().auto_reconnect);
    }
}
