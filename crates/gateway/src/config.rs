use common::{Environment, LogLevel};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct Config {
    pub log_level: LogLevel,
    pub environment: Environment,
    pub port: u16,
}

pub fn get_configuration() -> Result<Config, config::ConfigError> {
    let config = config::Config::builder()
        .set_default("log_level", "info")?
        .set_default("environment", "development")?
        .set_default("port", 5000_i64)?
        .add_source(
            config::Environment::with_prefix("GATEWAY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: Config = config.try_deserialize::<Config>()?;

    Ok(config)
}
