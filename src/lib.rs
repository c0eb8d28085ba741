//! # riddlr
//!
//! Topic-keyed trivia riddles, generated once by a text-generation service and
//! served from a record store afterwards.
//!
//! ## Overview
//!
//! A raw topic such as `"  Sp@ce!!"` is normalized to a canonical key
//! (`"space"`). If a readable record exists under that key its riddles are
//! returned as-is. Otherwise the generation service is prompted, its free-form
//! output is repaired, parsed, validated and deduplicated, and the result is
//! written back in a single transaction.
//!
//! ## Key Features
//!
//! - **Cache-or-generate**: [`RiddleService`] drives the whole flow
//! - **Output repair**: ordered, named repair steps in [`structured`]
//! - **Pluggable storage**: [`store::KeyValueStore`] with an in-memory backend
//! - **Pluggable generation**: [`generation::TextGenerator`] with an HTTP client
//! - **Soft failures**: generation and decode problems degrade to an empty result
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use riddlr::config::RiddlrConfig;
//! use riddlr::generation::GenerativeLanguageClientBuilder;
//! use riddlr::store::{MemoryStore, RiddleStore};
//! use riddlr::{clock, RiddleService};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> riddlr::Result<()> {
//!     let config = RiddlrConfig::load(None)?;
//!     let client = GenerativeLanguageClientBuilder::from_config(&config.generation).build()?;
//!     let store = RiddleStore::new(Arc::new(MemoryStore::new()), clock::system_clock());
//!     let service = RiddleService::new(store, Arc::new(client), &config);
//!
//!     let result = service.get_riddles_for_topic("user-1", "The Solar System").await?;
//!     for riddle in &result.riddles {
//!         println!("{} -> {}", riddle.question, riddle.correct_answer);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`topic`] | Cache-key and prompt normalization of topics |
//! | [`types`] | Riddle, payload and result types |
//! | [`store`] | Transactional record storage |
//! | [`structured`] | Repair, validation and deduplication of generated output |
//! | [`generation`] | Text-generation service client |
//! | [`service`] | Cache-or-generate orchestration |
//! | [`config`] | YAML and environment configuration |
//! | [`clock`] | Injected time source |

pub mod clock;
pub mod config;
pub mod generation;
pub mod service;
pub mod store;
pub mod structured;
pub mod topic;
pub mod types;

// Re-export main types for convenience
pub use config::RiddlrConfig;
pub use service::RiddleService;
pub use topic::{humanize_topic, normalize_topic_key};
pub use types::{Riddle, RiddlesForTopic, RiddlesPayload};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
