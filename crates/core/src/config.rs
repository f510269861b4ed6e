use crate::Error;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for LexQA.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LexConfig {
    /// Path to configuration directory.
    pub config_dir: PathBuf,

    /// Path to data directory.
    pub data_dir: PathBuf,

    /// HTTP server configuration.
    pub http: HttpConfig,

    /// Database configuration.
    pub database: DatabaseConfig,

    /// LLM provider configuration.
    pub llm: LlmConfig,

    /// Authentication configuration.
    pub auth: AuthConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Host to bind to.
    pub host: String,

    /// Port to bind to.
    pub port: u16,

    /// Enable CORS.
    pub enable_cors: bool,

    /// Request timeout in seconds.
    pub request_timeout: u64,

    /// Enable request logging.
    pub enable_request_logging: bool,
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file.
    pub sqlite_path: PathBuf,

    /// Maximum number of connections in pool.
    pub max_connections: u32,

    /// Connection timeout in seconds.
    pub connection_timeout: u64,

    /// Enable WAL mode.
    pub enable_wal: bool,

    /// Enable foreign keys.
    pub enable_foreign_keys: bool,
}

/// LLM provider configuration.
///
/// The provider is any OpenAI-style chat-completion endpoint; the model name,
/// API key, and base URL come from here (or the environment).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Chat-completion endpoint URL.
    pub base_url: String,

    /// API key sent as a bearer token. Usually injected via `LEXQA_LLM_API_KEY`.
    pub api_key: String,

    /// Model identifier.
    pub model: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Maximum output tokens per completion.
    pub max_tokens: u32,

    /// Connect timeout in seconds.
    pub connect_timeout: u64,

    /// Overall request timeout in seconds.
    pub request_timeout: u64,
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret used to sign bearer tokens.
    pub token_secret: String,

    /// Token lifetime in seconds.
    pub token_ttl: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    pub level: LogLevel,

    /// Enable console logging.
    pub enable_console_logging: bool,
}

/// Log level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum LogLevel {
    /// Error level.
    Error,

    /// Warning level.
    Warn,

    /// Info level.
    Info,

    /// Debug level.
    Debug,

    /// Trace level.
    Trace,
}

impl LexConfig {
    /// Create default configuration rooted under the platform config/data dirs.
    pub fn with_default_dirs() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Cannot find config directory".to_string()))?
            .join("lexqa");

        let data_dir = dirs::data_dir()
            .ok_or_else(|| Error::Config("Cannot find data directory".to_string()))?
            .join("lexqa");

        Ok(Self {
            config_dir,
            data_dir,
            http: HttpConfig::default(),
            database: DatabaseConfig::default(),
            llm: LlmConfig::default(),
            auth: AuthConfig::default(),
            logging: LoggingConfig::default(),
        })
    }

    /// Load configuration from file.
    pub fn load(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let mut config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Save configuration to file.
    pub fn save(&self, path: &PathBuf) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))
    }

    /// Apply environment-variable overrides for deploy-time settings.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("LEXQA_LLM_API_KEY") {
            if !key.trim().is_empty() {
                self.llm.api_key = key.trim().to_string();
            }
        }
        if let Ok(url) = std::env::var("LEXQA_LLM_BASE_URL") {
            if !url.trim().is_empty() {
                self.llm.base_url = url.trim().to_string();
            }
        }
        if let Ok(path) = std::env::var("LEXQA_DB_PATH") {
            if !path.trim().is_empty() {
                self.database.sqlite_path = PathBuf::from(path.trim());
            }
        }
        if let Ok(secret) = std::env::var("LEXQA_TOKEN_SECRET") {
            if !secret.trim().is_empty() {
                self.auth.token_secret = secret.trim().to_string();
            }
        }
        if let Ok(host) = std::env::var("LEXQA_HTTP_HOST") {
            if !host.trim().is_empty() {
                self.http.host = host.trim().to_string();
            }
        }
        if let Ok(port) = std::env::var("LEXQA_HTTP_PORT") {
            if let Ok(port) = port.trim().parse() {
                self.http.port = port;
            }
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5040,
            enable_cors: true,
            request_timeout: 90,
            enable_request_logging: true,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("lexqa.db"),
            max_connections: 10,
            connection_timeout: 10,
            enable_wal: true,
            enable_foreign_keys: true,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepseek.com/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "deepseek-chat".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            connect_timeout: 30,
            request_timeout: 60,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: "change-me".to_string(),
            token_ttl: 7 * 24 * 3600,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            enable_console_logging: true,
        }
    }
}
