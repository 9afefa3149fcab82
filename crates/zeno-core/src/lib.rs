//! Core services for the Zeno Knowledge Hub.
//!
//! Storage seams (key-value store, embedding store, user directory, auth
//! provider, chat model) are traits with remote, in-memory, and
//! unconfigured backends; the domain services on top of them are plain
//! structs that take their dependencies at construction.

pub mod analytics;
pub mod auth;
pub mod catalog;
pub mod chat;
pub mod comments;
pub mod config_store;
pub mod directory;
pub mod embedding;
mod error;
pub mod kv;
pub mod outbox;
pub mod sync;
pub mod vectors;

pub use analytics::Analytics;
pub use auth::{AuthGate, AuthProvider, MemoryAuth, SupabaseAuth, UnconfiguredAuth};
pub use catalog::ToolCatalog;
pub use chat::{ChatModel, ChatService, OpenAiChat, UnconfiguredChat, DEFAULT_CHAT_MODEL};
pub use comments::Comments;
pub use config_store::ConfigStore;
pub use directory::{DirectoryStore, MemoryDirectory, SupabaseDirectory, UnconfiguredDirectory};
pub use embedding::{
    EmbeddingProvider, OpenAiEmbeddings, UnconfiguredEmbeddings, DEFAULT_EMBEDDING_MODEL,
};
pub use error::ZenoError;
pub use kv::{KvStore, MemoryKv, RestKv, UnconfiguredKv};
pub use outbox::SyncOutbox;
pub use sync::EmbeddingSync;
pub use vectors::{MemoryVectors, SupabaseVectors, UnconfiguredVectors, VectorStore};

/// Result type for Zeno operations.
pub type Result<T> = std::result::Result<T, ZenoError>;
