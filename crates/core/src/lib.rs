//! Core types and shared logic for evergreen.
//!
//! This crate provides:
//! - Content addressing for cached documents
//! - Request-target normalization
//! - The resolution-chain orchestrator and its source traits
//! - Configuration structures

pub mod address;
pub mod config;
pub mod resolve;
pub mod target;

pub use address::content_address;
pub use config::{AppConfig, ConfigError};
pub use resolve::{CacheSink, ContentSource, Resolution, ResolutionChain, SourceKind, SourceOutcome, Summarizer};
pub use target::RequestTarget;
