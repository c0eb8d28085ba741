//! Riddle record store.
//!
//! Persists one riddle set per canonical topic key on top of a transactional
//! key-value service.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`KeyValueStore`] | Trait for the transactional key-value service |
//! | [`MemoryStore`] | In-process backend |
//! | [`Timestamped`] | Record wrapper with create/update timestamps |
//! | [`RecordKind`] | Per-kind storage description |
//! | [`RiddleStore`] | Lookup, create and save of [`TopicRiddleRecord`]s |
//!
//! Only the topic key is indexed. The riddle list is an opaque blob, and a blob
//! that no longer decodes is reported as a warning and treated as a miss.

mod backend;
mod codec;
mod record;
mod riddles;

pub use backend::{Entity, EntityKey, KeyValueStore, MemoryStore, Transaction};
pub use codec::{decode_payload, encode_payload};
pub use record::{RecordKind, Timestamped};
pub use riddles::{RiddleStore, TopicRiddleRecord, TopicRiddles, TOPIC_FIELD};
