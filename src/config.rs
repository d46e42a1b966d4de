use serde::{Deserialize, Deserializer};
use std::time::Duration;
use strum_macros::{Display, EnumString};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid value for {var}: {message}")]
    Env { var: &'static str, message: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoints: EndpointsConfig,
    pub geocode: GeocodeConfig,
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub agent: AgentConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub satcat_url: String,
    pub gp_url: String,
    pub geocode_url: String,
    pub weather_url: String,
    #[serde(deserialize_with = "deserialize_duration")]
    pub http_timeout: Duration,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            satcat_url: "https://celestrak.org/satcat/records.php".to_string(),
            gp_url: "https://celestrak.org/NORAD/elements/gp.php".to_string(),
            geocode_url: "https://geocode.maps.co/search".to_string(),
            weather_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            http_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeocodeConfig {
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransportKind {
    #[default]
    Stdio,
    Http,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: TransportKind,
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::Stdio,
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Capacity and lifetime of one memoized operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachePolicyConfig {
    pub capacity: usize,
    pub ttl: Option<Duration>,
}

/// One operation's cache settings as written in the file. Fields left out
/// keep the operation's default.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CachePolicyOverride {
    #[serde(default)]
    pub capacity: Option<usize>,
    #[serde(default, deserialize_with = "deserialize_optional_duration")]
    pub ttl: Option<Duration>,
}

impl CachePolicyConfig {
    fn merged(self, file: Option<CachePolicyOverride>) -> Self {
        let Some(file) = file else { return self };
        Self {
            capacity: file.capacity.unwrap_or(self.capacity),
            ttl: file.ttl.or(self.ttl),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "CacheFile")]
pub struct CacheConfig {
    pub satellite_names: CachePolicyConfig,
    pub norad_ids: CachePolicyConfig,
    pub elements: CachePolicyConfig,
    pub geocode: CachePolicyConfig,
    pub weather: CachePolicyConfig,
}

/// The `cache` section as written in the file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CacheFile {
    pub satellite_names: Option<CachePolicyOverride>,
    pub norad_ids: Option<CachePolicyOverride>,
    pub elements: Option<CachePolicyOverride>,
    pub geocode: Option<CachePolicyOverride>,
    pub weather: Option<CachePolicyOverride>,
}

impl From<CacheFile> for CacheConfig {
    fn from(file: CacheFile) -> Self {
        let defaults = CacheConfig::default();
        Self {
            satellite_names: defaults.satellite_names.merged(file.satellite_names),
            norad_ids: defaults.norad_ids.merged(file.norad_ids),
            elements: defaults.elements.merged(file.elements),
            geocode: defaults.geocode.merged(file.geocode),
            weather: defaults.weather.merged(file.weather),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        let lru = CachePolicyConfig {
            capacity: 100,
            ttl: None,
        };
        Self {
            satellite_names: lru,
            norad_ids: lru,
            // CelesTrak refreshes element sets every 2 hours.
            elements: CachePolicyConfig {
                capacity: 100,
                ttl: Some(Duration::from_secs(2 * 60 * 60)),
            },
            geocode: lru,
            weather: CachePolicyConfig {
                capacity: 100,
                ttl: Some(Duration::from_secs(60 * 60)),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub model: String,
    pub instructions: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            instructions: "You are a satellite tracking agent. Use the MCP tools to calculate \
                           transits for satellites. Do not use any other tools and DO NOT make \
                           up answers."
                .to_string(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load the optional file, then apply environment overrides.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GEOCODE_API_KEY").filter(|k| !k.is_empty()) {
            self.geocode.api_key = Some(key);
        }
        if let Some(url) = lookup("CELESTRAK_SATCAT_URL") {
            self.endpoints.satcat_url = url;
        }
        if let Some(url) = lookup("CELESTRAK_GP_URL") {
            self.endpoints.gp_url = url;
        }
        if let Some(url) = lookup("GEOCODE_SEARCH_URL") {
            self.endpoints.geocode_url = url;
        }
        if let Some(url) = lookup("WEATHER_FORECAST_URL") {
            self.endpoints.weather_url = url;
        }
        if let Some(transport) = lookup("TRANSPORT") {
            self.server.transport = transport.parse().map_err(|_| ConfigError::Env {
                var: "TRANSPORT",
                message: format!("unknown transport '{}'", transport),
            })?;
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Env {
                    var: "PORT",
                    message: e.to_string(),
                }
            })?;
        }
        if let Some(model) = lookup("AGENT_MODEL") {
            self.agent.model = model;
        }
        if let Some(instructions) = lookup("AGENT_INSTRUCTIONS") {
            self.agent.instructions = instructions;
        }
        Ok(())
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

fn deserialize_optional_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    s.map(|s| humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_upstream_refresh_cadence() {
        let config = Config::default();
        assert_eq!(config.cache.elements.ttl, Some(Duration::from_secs(7200)));
        assert_eq!(config.cache.satellite_names.ttl, None);
        assert_eq!(config.cache.geocode.capacity, 100);
        assert_eq!(config.server.transport, TransportKind::Stdio);
        assert!(config.geocode.api_key.is_none());
    }

    #[test]
    fn yaml_overrides_with_human_durations() {
        let yaml = r#"
server:
  transport: http
  port: 9000
cache:
  elements:
    capacity: 10
    ttl: 30m
endpoints:
  http_timeout: 5s
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.transport, TransportKind::Http);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.cache.elements.capacity, 10);
        assert_eq!(config.cache.elements.ttl, Some(Duration::from_secs(1800)));
        assert_eq!(config.endpoints.http_timeout, Duration::from_secs(5));
        assert_eq!(
            config.endpoints.gp_url,
            "https://celestrak.org/NORAD/elements/gp.php"
        );
    }

    #[test]
    fn partial_cache_override_keeps_other_defaults() {
        let config: Config = serde_yaml::from_str("cache:\n  elements:\n    capacity: 50\n").unwrap();
        assert_eq!(config.cache.elements.capacity, 50);
        assert_eq!(config.cache.elements.ttl, Some(Duration::from_secs(7200)));
        assert_eq!(config.cache.weather, CacheConfig::default().weather);

        let config: Config = serde_yaml::from_str("cache:\n  weather:\n    ttl: 10m\n").unwrap();
        assert_eq!(config.cache.weather.capacity, 100);
        assert_eq!(config.cache.weather.ttl, Some(Duration::from_secs(600)));
        assert_eq!(config.cache.satellite_names.ttl, None);
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            ("GEOCODE_API_KEY", "secret"),
            ("TRANSPORT", "http"),
            ("PORT", "8123"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config
            .apply_env(|var| env.get(var).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.geocode.api_key.as_deref(), Some("secret"));
        assert_eq!(config.server.transport, TransportKind::Http);
        assert_eq!(config.server.bind_addr(), "127.0.0.1:8123");
    }

    #[test]
    fn empty_api_key_is_treated_as_missing() {
        let mut config = Config::default();
        config
            .apply_env(|var| (var == "GEOCODE_API_KEY").then(String::new))
            .unwrap();
        assert!(config.geocode.api_key.is_none());
    }

    #[test]
    fn bad_port_is_rejected() {
        let mut config = Config::default();
        let result = config.apply_env(|var| (var == "PORT").then(|| "eighty".to_string()));
        assert!(matches!(result, Err(ConfigError::Env { var: "PORT", .. })));
    }
}
