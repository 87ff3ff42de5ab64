use serde::Deserialize;

/// Top-level configuration for the application.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub bus: BusSettings,
}

/// Host and port the line server binds to, plus the log level.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

/// Per-topic capacity limits, fixed at registry construction.
#[derive(Debug, Deserialize, Clone)]
pub struct BusSettings {
    pub message_limit: usize,
    pub publisher_limit: usize,
    pub subscriber_limit: usize,
}

/// Partial configuration loaded from files or the environment.
///
/// Allows partial specification of settings; missing values are filled from
/// the defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub bus: Option<PartialBusSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartialBusSettings {
    pub message_limit: Option<usize>,
    pub publisher_limit: Option<usize>,
    pub subscriber_limit: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
                log_level: "info".to_string(),
            },
            bus: BusSettings {
                message_limit: 10,
                publisher_limit: 10,
                subscriber_limit: 10,
            },
        }
    }
}
