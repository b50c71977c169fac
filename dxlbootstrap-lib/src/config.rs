//! Client (`dxlclient.config`) and application configuration files.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::pool::{DEFAULT_QUEUE_SIZE, DEFAULT_THREAD_COUNT, PoolSettings};

/// A broker entry of the form `<id>;<port>;<host>[;<ip>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Broker {
    pub id: String,
    pub port: u16,
    pub hosts: Vec<String>,
}

impl Broker {
    pub fn parse(entry: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::Broker {
            entry: entry.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = entry.split(';').map(str::trim).collect();
        if parts.len() < 3 {
            return Err(invalid("expected <id>;<port>;<host>[;<ip>]"));
        }
        if parts[0].is_empty() {
            return Err(invalid("missing broker id"));
        }
        let port = parts[1].parse::<u16>().map_err(|_| invalid("port is not a number"))?;
        let hosts: Vec<String> = parts[2..]
            .iter()
            .filter(|h| !h.is_empty())
            .map(|h| (*h).to_string())
            .collect();
        if hosts.is_empty() {
            return Err(invalid("missing broker host"));
        }

        Ok(Self {
            id: parts[0].to_string(),
            port,
            hosts,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct ClientConfigFile {
    #[serde(rename = "Certs", default)]
    certs: CertsSection,
    #[serde(rename = "Brokers", default)]
    brokers: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CertsSection {
    broker_cert_chain: Option<PathBuf>,
    cert_file: Option<PathBuf>,
    private_key: Option<PathBuf>,
}

/// Settings used to create a fabric client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub broker_cert_chain: Option<PathBuf>,
    pub cert_file: Option<PathBuf>,
    pub private_key: Option<PathBuf>,
    pub brokers: Vec<Broker>,
    pub incoming_message_thread_pool_size: usize,
    pub incoming_message_queue_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            broker_cert_chain: None,
            cert_file: None,
            private_key: None,
            brokers: Vec::new(),
            incoming_message_thread_pool_size: DEFAULT_THREAD_COUNT,
            incoming_message_queue_size: DEFAULT_QUEUE_SIZE,
        }
    }
}

impl ClientConfig {
    /// Loads a `dxlclient.config` file. Relative certificate paths are
    /// resolved against the directory containing the file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&contents, base_dir).map_err(|err| match err {
            ConfigError::Parse { details, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                details,
            },
            other => other,
        })
    }

    pub fn parse(contents: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let file: ClientConfigFile = toml::from_str(contents).map_err(|err| ConfigError::Parse {
            path: PathBuf::new(),
            details: err.to_string(),
        })?;

        let resolve = |p: Option<PathBuf>| {
            p.map(|p| if p.is_absolute() { p } else { base_dir.join(p) })
        };

        let brokers = file
            .brokers
            .values()
            .map(|entry| Broker::parse(entry))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            broker_cert_chain: resolve(file.certs.broker_cert_chain),
            cert_file: resolve(file.certs.cert_file),
            private_key: resolve(file.certs.private_key),
            brokers,
            ..Self::default()
        })
    }

    pub fn with_incoming_pool(mut self, settings: PoolSettings) -> Self {
        self.incoming_message_thread_pool_size = settings.thread_count;
        self.incoming_message_queue_size = settings.queue_size;
        self
    }

    pub fn incoming_pool(&self) -> PoolSettings {
        PoolSettings {
            queue_size: self.incoming_message_queue_size,
            thread_count: self.incoming_message_thread_pool_size,
        }
    }
}

/// The application configuration file, kept as raw TOML so handlers can
/// read their own sections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    table: toml::Table,
}

impl AppConfig {
    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        Ok(Self {
            table: toml::from_str(contents)?,
        })
    }

    pub fn table(&self) -> &toml::Table {
        &self.table
    }

    pub fn section(&self, name: &str) -> Option<&toml::Table> {
        self.table.get(name).and_then(toml::Value::as_table)
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&toml::Value> {
        self.section(section).and_then(|s| s.get(key))
    }

    pub fn get_str(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key).and_then(toml::Value::as_str)
    }

    pub fn get_bool(&self, section: &str, key: &str) -> Option<bool> {
        self.get(section, key).and_then(toml::Value::as_bool)
    }

    /// Integer value; numeric strings are accepted.
    pub fn get_int(&self, section: &str, key: &str) -> Option<i64> {
        match self.get(section, key)? {
            toml::Value::Integer(i) => Some(*i),
            toml::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Reads `queueSize`/`threadCount` from `section`, keeping `defaults` for
    /// anything missing or not a positive integer.
    pub fn pool_settings(&self, section: &str, defaults: PoolSettings) -> PoolSettings {
        let positive = |key: &str| {
            self.get_int(section, key)
                .and_then(|v| usize::try_from(v).ok())
                .filter(|v| *v > 0)
        };
        PoolSettings {
            queue_size: positive("queueSize").unwrap_or(defaults.queue_size),
            thread_count: positive("threadCount").unwrap_or(defaults.thread_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLIENT_CONFIG: &str = r#"
[Certs]
BrokerCertChain = "ca-bundle.crt"
CertFile = "/etc/dxl/client.crt"
PrivateKey = "client.key"

[Brokers]
broker1 = "broker1;8883;broker.example.com;10.0.0.1"
broker2 = "broker2;443;broker2.example.com"
"#;

    #[test]
    fn test_client_config_parse() {
        let config = ClientConfig::parse(CLIENT_CONFIG, Path::new("/opt/app/config")).unwrap();
        assert_eq!(
            config.broker_cert_chain,
            Some(PathBuf::from("/opt/app/config/ca-bundle.crt"))
        );
        assert_eq!(config.cert_file, Some(PathBuf::from("/etc/dxl/client.crt")));
        assert_eq!(config.brokers.len(), 2);
        assert_eq!(config.brokers[0].port, 8883);
        assert_eq!(config.brokers[0].hosts, vec!["broker.example.com", "10.0.0.1"]);
        assert_eq!(config.incoming_pool(), PoolSettings::default());
    }

    #[test]
    fn test_invalid_broker() {
        assert!(Broker::parse("broker1;notaport;host").is_err());
        assert!(Broker::parse("broker1;8883").is_err());
        assert!(Broker::parse(";8883;host").is_err());
    }

    #[test]
    fn test_empty_client_config() {
        let config = ClientConfig::parse("", Path::new(".")).unwrap();
        assert!(config.brokers.is_empty());
        assert!(config.cert_file.is_none());
    }

    #[test]
    fn test_pool_settings_fall_back_to_defaults() {
        let config = AppConfig::parse(
            r#"
[IncomingMessagePool]
queueSize = 50
threadCount = "4"

[MessageCallbackPool]
queueSize = "lots"
threadCount = -2
"#,
        )
        .unwrap();

        let incoming = config.pool_settings("IncomingMessagePool", PoolSettings::default());
        assert_eq!(incoming, PoolSettings { queue_size: 50, thread_count: 4 });

        let callbacks = config.pool_settings("MessageCallbackPool", PoolSettings::default());
        assert_eq!(callbacks, PoolSettings::default());

        let missing = config.pool_settings("Nope", PoolSettings::default());
        assert_eq!(missing, PoolSettings::default());
    }
}
