//! Backend clients for evergreen.
//!
//! This crate provides the network backends behind the resolution chain:
//! the document-store cache, the historical archive, direct origin
//! fetches, the SERP fallback, and the chat-completion summarizer. Each
//! client implements the matching seam trait from `evergreen-core`.

pub mod archive;
pub mod docstore;
pub mod error;
pub mod llm;
pub mod origin;
pub mod serp;

pub use archive::{ArchiveClient, ArchiveConfig};
pub use docstore::{CachedDocument, DocStoreClient, DocStoreConfig};
pub use error::BackendError;
pub use llm::{LlmClient, LlmConfig};
pub use origin::{OriginClient, OriginConfig};
pub use serp::{SerpClient, SerpConfig, sanitize_query};
