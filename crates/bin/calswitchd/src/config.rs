//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `calswitch.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use calswitch_adapter_virtual::VirtualDevice;
use calswitch_app::engine::EngineConfig;
use calswitch_domain::calendar::CalendarId;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Reconciliation engine settings.
    pub scheduler: SchedulerConfig,
    /// Where calendars are read from.
    pub calendars: CalendarsConfig,
    /// Virtual devices events can switch.
    pub devices: Vec<DeviceConfig>,
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

/// Reconciliation engine configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Calendar ids to watch.
    pub calendars: Vec<String>,
    /// Seconds a pass looks into the past.
    pub historic_secs: u64,
    /// Seconds a pass looks into the future.
    pub preload_secs: u64,
    /// Seconds between two passes.
    pub interval_secs: u64,
}

/// Calendar storage configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CalendarsConfig {
    /// Directory holding `<calendar>.ics` files or `<calendar>/` directories.
    pub directory: PathBuf,
}

/// One virtual device declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    pub entity_id: String,
    pub name: String,
    #[serde(default)]
    pub area: Option<String>,
}

impl DeviceConfig {
    /// Build the virtual device this entry declares.
    #[must_use]
    pub fn to_device(&self) -> VirtualDevice {
        let device = VirtualDevice::new(&self.entity_id, &self.name);
        match &self.area {
            Some(area) => device.in_area(area),
            None => device,
        }
    }
}

impl Config {
    /// Load configuration from `calswitch.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("calswitch.toml")?;
        config.apply_env_overrides();
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

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CALSWITCH_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("CALSWITCH_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Ok(val) = std::env::var("CALSWITCH_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("CALSWITCH_CALENDAR_DIR") {
            self.calendars.directory = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("CALSWITCH_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.scheduler.calendars.is_empty() {
            return Err(ConfigError::Validation(
                "scheduler.calendars must name at least one calendar".to_string(),
            ));
        }
        if self.scheduler.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "scheduler.interval_secs must be non-zero".to_string(),
            ));
        }
        if let Some(device) = self.devices.iter().find(|d| d.entity_id.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "device {:?} has an empty entity_id",
                device.name
            )));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Engine settings derived from the `[scheduler]` section.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.scheduler.calendars.iter().map(CalendarId::new))
            .historic_window(Duration::from_secs(self.scheduler.historic_secs))
            .preload_window(Duration::from_secs(self.scheduler.preload_secs))
            .refresh_interval(Duration::from_secs(self.scheduler.interval_secs))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "calswitchd=info,calswitch=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            calendars: vec!["home".to_string()],
            historic_secs: 300,
            preload_secs: 86_400,
            interval_secs: 300,
        }
    }
}

impl Default for CalendarsConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("calendars"),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.scheduler.calendars, vec!["home"]);
        assert_eq!(config.scheduler.historic_secs, 300);
        assert_eq!(config.scheduler.preload_secs, 86_400);
        assert_eq!(config.scheduler.interval_secs, 300);
        assert_eq!(config.calendars.directory, PathBuf::from("calendars"));
        assert!(config.devices.is_empty());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [server]
            host = '127.0.0.1'
            port = 9090

            [logging]
            filter = 'debug'

            [scheduler]
            calendars = ['home', 'garden']
            historic_secs = 60
            preload_secs = 3600
            interval_secs = 120

            [calendars]
            directory = '/var/lib/calswitch'

            [[devices]]
            entity_id = 'light.kitchen'
            name = 'Kitchen Light'
            area = 'Kitchen'

            [[devices]]
            entity_id = 'switch.pump'
            name = 'Pump'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.scheduler.calendars, vec!["home", "garden"]);
        assert_eq!(config.scheduler.interval_secs, 120);
        assert_eq!(
            config.calendars.directory,
            PathBuf::from("/var/lib/calswitch")
        );
        assert_eq!(config.devices.len(), 2);
        assert_eq!(config.devices[0].area.as_deref(), Some("Kitchen"));
        assert!(config.devices[1].area.is_none());
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let toml = "
            [scheduler]
            interval_secs = 30
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.scheduler.interval_secs, 30);
        assert_eq!(config.scheduler.preload_secs, 86_400);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn should_reject_device_without_name() {
        let toml = "
            [[devices]]
            entity_id = 'switch.pump'
        ";
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_empty_calendar_list() {
        let mut config = Config::default();
        config.scheduler.calendars.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_zero_interval() {
        let mut config = Config::default();
        config.scheduler.interval_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_blank_device_entity_id() {
        let mut config = Config::default();
        config.devices.push(DeviceConfig {
            entity_id: " ".to_string(),
            name: "Pump".to_string(),
            area: None,
        });
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_format_bind_addr() {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 9090;
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
    }

    #[test]
    fn should_build_engine_config_from_scheduler_section() {
        let mut config = Config::default();
        config.scheduler.calendars = vec!["home".to_string(), "garden".to_string()];
        config.scheduler.interval_secs = 42;

        let engine = config.engine_config();

        assert_eq!(
            engine.calendars,
            vec![CalendarId::new("home"), CalendarId::new("garden")]
        );
        assert_eq!(engine.historic_window, Duration::from_secs(300));
        assert_eq!(engine.preload_window, Duration::from_secs(86_400));
        assert_eq!(engine.refresh_interval, Duration::from_secs(42));
    }

    #[test]
    fn should_build_virtual_device_with_area() {
        let device = DeviceConfig {
            entity_id: "light.kitchen".to_string(),
            name: "Ceiling".to_string(),
            area: Some("Kitchen".to_string()),
        }
        .to_device();

        assert_eq!(device.entity_id().as_str(), "light.kitchen");
        assert_eq!(device.name(), "Ceiling");
        assert_eq!(device.area(), Some("Kitchen"));
    }
}
