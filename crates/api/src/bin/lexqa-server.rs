//! LexQA API server entry point.

use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::fmt;

use lexqa_api::config::ApiConfig;
use lexqa_api::llm::LlmClient;
use lexqa_api::server::ApiServer;
use lexqa_api::{database, AppState};
use lexqa_core::config::LogLevel;
use lexqa_core::LexConfig;

fn tracing_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    }
}

/// Load `config.toml` from the platform config dir when present, otherwise
/// fall back to defaults. Environment overrides apply either way.
fn load_config() -> LexConfig {
    let mut config = LexConfig::with_default_dirs().unwrap_or_default();

    let config_path = config.config_dir.join("config.toml");
    if config_path.exists() {
        match LexConfig::load(&config_path) {
            Ok(loaded) => return loaded,
            Err(err) => {
                eprintln!(
                    "Failed to load config from {}: {}, using defaults",
                    config_path.display(),
                    err
                );
            }
        }
    }

    config.apply_env_overrides();
    config
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config();

    fmt()
        .with_max_level(tracing_level(config.logging.level))
        .with_target(false)
        .init();

    info!("Starting LexQA server...");

    if config.llm.api_key.is_empty() {
        warn!("LLM API key is not set; answers will degrade to fallback text");
    }

    let pool = database::init_pool(&config.database).await?;
    let llm = Arc::new(LlmClient::new(config.llm.clone())?);
    let state = Arc::new(AppState::new(pool, &config, llm));

    let api_config = ApiConfig::from_core_config(&config);
    info!("Listening on {}", api_config.bind_addr);

    ApiServer::new(api_config, state).run().await?;
    Ok(())
}
