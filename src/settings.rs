use config::{builder::DefaultState, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_api_host")]
    pub api_host: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub database_pool_size: u32,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8000
}

fn default_database_url() -> String {
    "sqlite://issues.db".to_string()
}

fn default_database_pool_size() -> u32 {
    5
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:4200".to_string()]
}

fn default_static_dir() -> String {
    "static".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_host: default_api_host(),
            api_port: default_api_port(),
            database_url: default_database_url(),
            database_pool_size: default_database_pool_size(),
            cors_origins: default_cors_origins(),
            static_dir: default_static_dir(),
            environment: default_environment(),
        }
    }
}

impl AppConfig {
    /// Layers `config/default.toml` (optional) under `APP_*` environment
    /// variables, e.g. `APP_API_PORT=9000` or `APP_CORS_ORIGINS=a,b`.
    pub fn new() -> Result<Self, ConfigError> {
        let builder = ConfigBuilder::<DefaultState>::default()
            .add_source(File::with_name("config/default.toml").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let mut config = builder.try_deserialize::<AppConfig>()?;
        config.cors_origins = clean_origins(config.cors_origins);
        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

/// Origins copied out of shell files often keep their quotes.
fn clean_origins(origins: Vec<String>) -> Vec<String> {
    origins
        .into_iter()
        .map(|origin| {
            origin
                .trim()
                .trim_matches(|c| c == '"' || c == '\'')
                .to_string()
        })
        .filter(|origin| !origin.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_quotes_and_blank_origins() {
        let origins = clean_origins(vec![
            " \"http://localhost:4200\" ".to_string(),
            "'http://example.com'".to_string(),
            "  ".to_string(),
        ]);
        assert_eq!(origins, vec!["http://localhost:4200", "http://example.com"]);
    }

    #[test]
    fn default_binds_all_interfaces() {
        assert_eq!(AppConfig::default().bind_address(), "0.0.0.0:8000");
    }
}
