use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the summarizer service.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// API key used to authenticate against the OpenAI API.
    pub openai_api_key: String,
    /// Chat model identifier passed to the completions endpoint.
    pub openai_model: String,
    /// Completion token cap for each summarization request.
    pub openai_max_tokens: u32,
    /// Sampling temperature for summarization requests.
    pub openai_temperature: f32,
    /// Path to the OAuth2 client secrets downloaded from Google Cloud Console.
    pub google_credentials_path: PathBuf,
    /// Path where the Drive access/refresh token is persisted.
    pub google_token_path: PathBuf,
    /// Default Drive folder to summarize when a request omits one.
    pub drive_folder_id: Option<String>,
    /// Local staging directory for downloaded documents.
    pub download_dir: PathBuf,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            openai_api_key: load_env("OPENAI_API_KEY")?,
            openai_model: load_env_or("OPENAI_MODEL", "gpt-4o-mini"),
            openai_max_tokens: load_env_or("OPENAI_MAX_TOKENS", "1024")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("OPENAI_MAX_TOKENS".to_string()))?,
            openai_temperature: load_env_or("OPENAI_TEMPERATURE", "0.4")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("OPENAI_TEMPERATURE".to_string()))?,
            google_credentials_path: load_env_or(
                "GOOGLE_CREDENTIALS_PATH",
                "credentials/credentials.json",
            )
            .into(),
            google_token_path: load_env_or("GOOGLE_TOKEN_PATH", "credentials/token.json").into(),
            drive_folder_id: load_env_optional("DRIVE_FOLDER_ID"),
            download_dir: load_env_or("DOWNLOAD_DIR", "downloads").into(),
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_or(key: &str, default: &str) -> String {
    load_env_optional(key).unwrap_or_else(|| default.to_string())
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        model = %config.openai_model,
        credentials = %config.google_credentials_path.display(),
        download_dir = %config.download_dir.display(),
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
