//! Shared application state.

use std::sync::Arc;

use crate::config::Config;
use zeno_core::{
    Analytics, AuthGate, AuthProvider, ChatModel, ChatService, Comments, ConfigStore,
    DirectoryStore, EmbeddingProvider, EmbeddingSync, KvStore, OpenAiChat, OpenAiEmbeddings,
    RestKv, SupabaseAuth, SupabaseDirectory, SupabaseVectors, SyncOutbox, ToolCatalog,
    UnconfiguredAuth, UnconfiguredChat, UnconfiguredDirectory, UnconfiguredEmbeddings,
    UnconfiguredKv, UnconfiguredVectors, VectorStore,
};

/// Shared application state.
pub struct AppState {
    pub config_store: ConfigStore,
    pub catalog: ToolCatalog,
    pub analytics: Analytics,
    pub comments: Comments,
    pub outbox: SyncOutbox,
    pub sync: EmbeddingSync,
    pub chat: ChatService,
    pub directory: Arc<dyn DirectoryStore>,
    pub gate: AuthGate,
    pub config: Config,
}

impl AppState {
    /// Wire up backends from configuration. Missing credentials select the
    /// unconfigured backend for that seam instead of failing startup.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let kv: Arc<dyn KvStore> = match (&config.kv_rest_url, &config.kv_rest_token) {
            (Some(url), Some(token)) => Arc::new(RestKv::new(url, token)?),
            _ => {
                tracing::warn!(target: "zeno::startup", "Key-value store credentials absent; config, analytics, and comments will answer 503");
                Arc::new(UnconfiguredKv)
            }
        };

        let (vectors, auth, directory): (
            Arc<dyn VectorStore>,
            Arc<dyn AuthProvider>,
            Arc<dyn DirectoryStore>,
        ) = match (&config.supabase_url, &config.supabase_service_key) {
            (Some(url), Some(key)) => (
                Arc::new(SupabaseVectors::new(url, key)?),
                Arc::new(SupabaseAuth::new(url, key)?),
                Arc::new(SupabaseDirectory::new(url, key)?),
            ),
            _ => {
                tracing::warn!(target: "zeno::startup", "Supabase credentials absent; retrieval, users, and sessions will answer 503");
                (
                    Arc::new(UnconfiguredVectors),
                    Arc::new(UnconfiguredAuth),
                    Arc::new(UnconfiguredDirectory),
                )
            }
        };

        let (embeddings, chat_model): (Arc<dyn EmbeddingProvider>, Arc<dyn ChatModel>) =
            match &config.openai_api_key {
                Some(key) => (
                    Arc::new(OpenAiEmbeddings::new(key)?),
                    Arc::new(OpenAiChat::new(key, config.chat_model.clone())?),
                ),
                None => {
                    tracing::warn!(target: "zeno::startup", "OPENAI_API_KEY absent; chat and embedding sync will answer 503");
                    (Arc::new(UnconfiguredEmbeddings), Arc::new(UnconfiguredChat))
                }
            };

        Ok(Self::with_backends(
            config, kv, vectors, embeddings, chat_model, auth, directory,
        ))
    }

    /// Assemble state from explicit backends; tests inject in-memory ones.
    pub fn with_backends(
        config: Config,
        kv: Arc<dyn KvStore>,
        vectors: Arc<dyn VectorStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
        chat_model: Arc<dyn ChatModel>,
        auth: Arc<dyn AuthProvider>,
        directory: Arc<dyn DirectoryStore>,
    ) -> Self {
        let config_store = ConfigStore::new(kv.clone());
        let catalog = ToolCatalog::new(config_store.clone());
        let sync = EmbeddingSync::new(catalog.clone(), vectors.clone(), embeddings.clone());
        let chat = ChatService::new(embeddings, vectors, chat_model);
        let gate = AuthGate::new(config.portal_password.clone(), auth, directory.clone());

        Self {
            config_store,
            catalog,
            analytics: Analytics::new(kv.clone()),
            comments: Comments::new(kv.clone()),
            outbox: SyncOutbox::new(kv),
            sync,
            chat,
            directory,
            gate,
            config,
        }
    }
}
