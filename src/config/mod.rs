mod settings;

use config::{Config, ConfigError, Environment, File};

use settings::PartialSettings;

pub use settings::{BusSettings, ServerSettings, Settings};

/// Loads the configuration from the default file and environment variables,
/// merged over the built-in defaults.
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(Environment::default().separator("_").try_parsing(true));

    let config = builder.build()?;

    // Deserialize what is available, then fill the gaps with defaults.
    let partial: PartialSettings = config.try_deserialize()?;
    let default = Settings::default();

    Ok(Settings {
        server: ServerSettings {
            host: partial
                .server
                .as_ref()
                .and_then(|s| s.host.clone())
                .unwrap_or(default.server.host),
            port: partial
                .server
                .as_ref()
                .and_then(|s| s.port)
                .unwrap_or(default.server.port),
            log_level: partial
                .server
                .as_ref()
                .and_then(|s| s.log_level.clone())
                .unwrap_or(default.server.log_level),
        },
        bus: BusSettings {
            message_limit: partial
                .bus
                .as_ref()
                .and_then(|b| b.message_limit)
                .unwrap_or(default.bus.message_limit),
            publisher_limit: partial
                .bus
                .as_ref()
                .and_then(|b| b.publisher_limit)
                .unwrap_or(default.bus.publisher_limit),
            subscriber_limit: partial
                .bus
                .as_ref()
                .and_then(|b| b.subscriber_limit)
                .unwrap_or(default.bus.subscriber_limit),
        },
    })
}
