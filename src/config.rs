use crate::dns::DEFAULT_TTL;
use crate::error::ConfigError;
use crate::resolver::DOMAIN_TOKEN;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

/// File picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "httpdns.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub resolver: ResolverConfig,
    pub dns: DnsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// One UDP socket is bound per address.
    pub bind_addresses: Vec<String>,
    pub port: u16,
    /// Datagrams handled at once; 0 disables the limit.
    pub max_in_flight: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addresses: vec!["0.0.0.0".to_string()],
            port: 53,
            max_in_flight: 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Lookup URL; `{domain}` is replaced by the queried name.
    pub endpoint: String,
    pub delimiter: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            endpoint: format!("http://127.0.0.1:8080/resolve?name={}", DOMAIN_TOKEN),
            delimiter: ",".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DnsConfig {
    pub ttl: u32,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self { ttl: DEFAULT_TTL }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Values given on the command line; each one wins over the file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind_addresses: Option<Vec<String>>,
    pub port: Option<u16>,
    pub endpoint: Option<String>,
    pub delimiter: Option<String>,
    pub ttl: Option<u32>,
    pub max_in_flight: Option<usize>,
    pub log_level: Option<String>,
}

impl Config {
    /// Loads the given file, else `httpdns.toml` if present, else defaults,
    /// then applies `overrides` and validates the result.
    pub fn load(path: Option<&str>, overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE)?,
            None => Self::default(),
        };

        config.apply_cli_overrides(overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;

        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(addresses) = overrides.bind_addresses {
            self.server.bind_addresses = addresses;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(max_in_flight) = overrides.max_in_flight {
            self.server.max_in_flight = max_in_flight;
        }
        if let Some(endpoint) = overrides.endpoint {
            self.resolver.endpoint = endpoint;
        }
        if let Some(delimiter) = overrides.delimiter {
            self.resolver.delimiter = delimiter;
        }
        if let Some(ttl) = overrides.ttl {
            self.dns.ttl = ttl;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.resolver.endpoint.contains(DOMAIN_TOKEN) {
            return Err(ConfigError::Validation(format!(
                "resolver endpoint must contain {}",
                DOMAIN_TOKEN
            )));
        }

        if self.resolver.delimiter.is_empty() {
            return Err(ConfigError::Validation(
                "resolver delimiter must not be empty".to_string(),
            ));
        }

        if self.server.bind_addresses.is_empty() {
            return Err(ConfigError::Validation(
                "at least one bind address is required".to_string(),
            ));
        }

        self.listen_addrs().map(|_| ())
    }

    /// Socket addresses to bind, one per configured address.
    pub fn listen_addrs(&self) -> Result<Vec<SocketAddr>, ConfigError> {
        self.server
            .bind_addresses
            .iter()
            .map(|address| {
                address
                    .parse::<IpAddr>()
                    .map(|ip| SocketAddr::new(ip, self.server.port))
                    .map_err(|_| ConfigError::InvalidAddress(address.clone()))
            })
            .collect()
    }
}
