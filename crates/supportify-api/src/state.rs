//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST
//! API. Services are generic over the completion and storage ports; AppState
//! pins them to the infra implementations.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use supportify_core::chat::{ChatRelayPipeline, ConversationService, PersistenceQueue};
use supportify_infra::backend::StoreBackend;
use supportify_infra::config::{
    apply_env_overrides, database_url, load_app_config, resolve_data_dir,
};
use supportify_infra::upstream::HttpCompletionClient;
use supportify_observe::ScopedLogger;
use supportify_types::config::AppConfig;

pub type ConcreteRelay = ChatRelayPipeline<HttpCompletionClient, StoreBackend>;
pub type ConcreteConversations = ConversationService<StoreBackend>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<ConcreteRelay>,
    pub conversations: Arc<ConcreteConversations>,
    pub store: Arc<StoreBackend>,
    pub config: Arc<AppConfig>,
    /// Unscoped root logger; handlers scope it per route.
    pub log: ScopedLogger,
    pub data_dir: PathBuf,
    pub started_at: Instant,
}

impl AppState {
    /// Resolve the data dir, load config, open the store and wire services.
    ///
    /// `memory` selects the in-memory store instead of SQLite.
    pub async fn init(log: ScopedLogger, memory: bool) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = apply_env_overrides(load_app_config(&data_dir).await, |key| {
            std::env::var(key).ok()
        });

        let store = if memory {
            StoreBackend::memory()
        } else {
            StoreBackend::sqlite(&database_url(&config, &data_dir)).await?
        };
        tracing::debug!(backend = store.kind(), data_dir = %data_dir.display(), "record store ready");

        Self::from_parts(config, store, log, data_dir)
    }

    /// Wire services around an already opened store.
    pub fn from_parts(
        config: AppConfig,
        store: StoreBackend,
        log: ScopedLogger,
        data_dir: PathBuf,
    ) -> anyhow::Result<Self> {
        let store = Arc::new(store);
        let conversations_log = log.scoped("conversations");
        let relay_log = conversations_log.scoped("processChatCompletion");

        let client = HttpCompletionClient::new(config.upstream.clone(), relay_log.clone())?;
        let persistence = PersistenceQueue::new(
            Arc::clone(&store),
            relay_log.clone(),
            Duration::from_secs(config.persistence.write_timeout_secs),
        );

        Ok(Self {
            relay: Arc::new(ChatRelayPipeline::new(client, persistence, relay_log)),
            conversations: Arc::new(ConversationService::new(
                Arc::clone(&store),
                conversations_log,
            )),
            store,
            config: Arc::new(config),
            log,
            data_dir,
            started_at: Instant::now(),
        })
    }

    /// Wait for detached writes, then release the store.
    pub async fn shutdown(&self) {
        self.relay.persistence().shutdown().await;
        self.store.close().await;
    }
}
