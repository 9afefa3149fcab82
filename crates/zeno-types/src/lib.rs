//! Shared types for the Zeno Knowledge Hub.

mod analytics;
mod chat;
mod comment;
mod config_doc;
mod embedding;
mod sync;
mod tool;
mod user;

pub use analytics::*;
pub use chat::*;
pub use comment::*;
pub use config_doc::*;
pub use embedding::*;
pub use sync::*;
pub use tool::*;
pub use user::*;
