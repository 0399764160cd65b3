//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `aquagrow.toml` in the working directory. Every field has a
//! default so the file is optional, but a JWT secret must come from
//! somewhere. Environment variables take precedence over file values.

use std::time::Duration;

use aquagrow_adapter_mqtt::MqttConfig;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Broker connection and topics.
    pub mqtt: MqttConfig,
    /// Configuration service client and cache.
    pub thresholds: ThresholdsConfig,
    /// Ingestion and publishing limits.
    pub control: ControlConfig,
    /// Operator authentication.
    pub auth: AuthConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Threshold lookup configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ThresholdsConfig {
    /// Base URL of the farm configuration service.
    pub service_url: String,
    /// Value of the `X-API-KEY` header.
    pub api_key: String,
    /// Upper bound on one lookup, in seconds.
    pub timeout_secs: u64,
    /// Lifetime of a cached entry in seconds; `0` keeps entries until
    /// invalidated.
    pub cache_ttl_secs: u64,
}

/// Ingestion loop configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Capacity of the queue between the MQTT subscriber and the loop.
    pub queue_capacity: usize,
    /// Upper bound on handing one command to the broker client, in ms.
    pub publish_timeout_ms: u64,
    /// How long shutdown waits for in-flight work, in seconds.
    pub shutdown_grace_secs: u64,
}

/// Authentication configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 secret shared with the token issuer.
    pub jwt_secret: String,
}

impl Config {
    /// Load configuration from `aquagrow.toml` (if present), apply
    /// environment-variable overrides, then validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("aquagrow.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    /// Apply overrides from `lookup` (the process environment in production).
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("AQUAGROW_HOST") {
            self.server.host = val;
        }
        if let Some(port) = lookup("AQUAGROW_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = lookup("AQUAGROW_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Some(val) = lookup("AQUAGROW_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("AQUAGROW_MQTT_BROKER") {
            self.mqtt.broker_host = val;
        }
        if let Some(port) = lookup("AQUAGROW_MQTT_PORT").and_then(|val| val.parse().ok()) {
            self.mqtt.broker_port = port;
        }
        if let Some(val) = lookup("AQUAGROW_MQTT_USERNAME") {
            self.mqtt.username = Some(val);
        }
        if let Some(val) = lookup("AQUAGROW_MQTT_PASSWORD") {
            self.mqtt.password = Some(val);
        }
        if let Some(val) = lookup("AQUAGROW_MONITORING_TOPIC") {
            self.mqtt.monitoring_topic = val;
        }
        if let Some(val) = lookup("AQUAGROW_IRRIGATION_TOPIC") {
            self.mqtt.irrigation_topic = val;
        }
        if let Some(val) = lookup("AQUAGROW_THRESHOLD_URL") {
            self.thresholds.service_url = val;
        }
        if let Some(val) = lookup("AQUAGROW_API_KEY") {
            self.thresholds.api_key = val;
        }
        if let Some(val) = lookup("AQUAGROW_JWT_SECRET") {
            self.auth.jwt_secret = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(invalid("port must be non-zero"));
        }
        let topics = [&self.mqtt.monitoring_topic, &self.mqtt.irrigation_topic];
        if topics.iter().any(|topic| topic.trim().is_empty()) {
            return Err(invalid("MQTT topics must not be empty"));
        }
        if self.mqtt.monitoring_topic == self.mqtt.irrigation_topic {
            return Err(invalid("monitoring and irrigation topics must differ"));
        }
        if self.mqtt.qos > 2 {
            return Err(invalid("MQTT QoS must be 0, 1 or 2"));
        }
        if self.control.queue_capacity == 0 {
            return Err(invalid("queue capacity must be non-zero"));
        }
        if self.thresholds.timeout_secs == 0 {
            return Err(invalid("threshold timeout must be non-zero"));
        }
        if self.control.publish_timeout_ms == 0 {
            return Err(invalid("publish timeout must be non-zero"));
        }
        if self.auth.jwt_secret.is_empty() {
            return Err(invalid("JWT secret must be set (AQUAGROW_JWT_SECRET)"));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl ThresholdsConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Cache lifetime, or `None` when entries never expire.
    #[must_use]
    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs))
    }
}

impl ControlConfig {
    #[must_use]
    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }

    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Validation(reason.to_string())
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "aquagrowd=info,aquagrow=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:5001".to_string(),
            api_key: String::new(),
            timeout_secs: 5,
            cache_ttl_secs: 300,
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            publish_timeout_ms: 2000,
            shutdown_grace_secs: 5,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
