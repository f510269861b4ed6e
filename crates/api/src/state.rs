//! Shared application state passed to every handler.

use std::sync::Arc;

use sqlx::sqlite::SqlitePool;

use lexqa_core::LexConfig;

use crate::auth::AuthService;
use crate::database::Repository;
use crate::llm::LlmGateway;
use crate::qa::QaService;

/// Everything the handlers need, injected through axum's `State` extractor.
pub struct AppState {
    pub repo: Repository,
    pub auth: AuthService,
    pub qa: QaService,
}

impl AppState {
    /// Wire services over an open pool and a gateway implementation.
    ///
    /// The gateway is a trait object so tests can substitute a canned
    /// implementation for the real HTTP client.
    pub fn new(pool: SqlitePool, config: &LexConfig, llm: Arc<dyn LlmGateway>) -> Self {
        let repo = Repository::new(pool);
        let auth = AuthService::new(
            repo.clone(),
            config.auth.token_secret.clone(),
            config.auth.token_ttl,
        );
        let qa = QaService::new(repo.clone(), llm);

        Self { repo, auth, qa }
    }
}
