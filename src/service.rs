//! Cache-or-generate orchestration.
//!
//! [`RiddleService::get_riddles_for_topic`] serves a topic from the record
//! store when a readable record exists, and otherwise asks the text generator
//! for new riddles and persists them. Recoverable failures (unreadable cache
//! entries, generation errors, unparsable candidates) degrade to an empty
//! result. Only a record that cannot be read back right after being written
//! escalates as an error.
//!
//! Concurrent misses for the same topic key may each generate and each create
//! a record; lookups then return the first one.

use crate::config::{GenerationConfig, RiddleConfig, RiddlrConfig};
use crate::generation::{riddle_request, TextGenerator};
use crate::store::{RiddleStore, TopicRiddleRecord, Transaction};
use crate::structured::RiddleExtractor;
use crate::topic::normalize_topic_key;
use crate::types::{Riddle, RiddlesForTopic, RiddlesPayload};
use crate::{Error, ErrorContext, Result};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct RiddleService {
    store: RiddleStore,
    generator: Arc<dyn TextGenerator>,
    extractor: RiddleExtractor,
    generation: GenerationConfig,
    riddles: RiddleConfig,
}

impl RiddleService {
    pub fn new(store: RiddleStore, generator: Arc<dyn TextGenerator>, config: &RiddlrConfig) -> Self {
        let extractor = RiddleExtractor::new()
            .with_policy(config.riddles.candidate_policy)
            .with_max_incorrect_answers(config.riddles.num_incorrect_answers);
        Self {
            store,
            generator,
            extractor,
            generation: config.generation.clone(),
            riddles: config.riddles.clone(),
        }
    }

    pub fn store(&self) -> &RiddleStore {
        &self.store
    }

    /// Riddles for `topic`, from cache or freshly generated.
    ///
    /// `uid` identifies the caller and does not influence the result.
    pub async fn get_riddles_for_topic(&self, uid: &str, topic: &str) -> Result<RiddlesForTopic> {
        let topic_key = normalize_topic_key(topic);
        if topic_key.is_empty() {
            debug!(uid, topic, "topic has no alphanumeric characters");
            return Ok(RiddlesForTopic::default());
        }

        let existing = self.store.find_by_topic(&topic_key).await?;
        if let Some(record) = &existing {
            if let Some(result) = record.to_result() {
                debug!(uid, topic_key = %topic_key, record_id = %record.id(), "cache hit");
                return Ok(result);
            }
        }
        debug!(uid, topic_key = %topic_key, stale = existing.is_some(), "cache miss");

        let riddles = match self.generate(topic, &topic_key).await {
            Ok(riddles) => riddles,
            Err(e) => {
                // Every generator failure yields the empty result and no write.
                warn!(uid, topic_key = %topic_key, error = %e,
                    recoverable = e.is_recoverable(), "generation unavailable");
                return Ok(RiddlesForTopic::default());
            }
        };
        if riddles.is_empty() && !self.riddles.cache_empty_results {
            info!(topic_key = %topic_key, "no riddles extracted; not caching");
            return Ok(RiddlesForTopic::default());
        }

        self.persist(&topic_key, existing, RiddlesPayload::new(riddles))
            .await
    }

    /// Calls the generator under the configured timeout and extracts riddles
    /// from whatever candidates come back.
    async fn generate(&self, raw_topic: &str, topic_key: &str) -> Result<Vec<Riddle>> {
        let request = riddle_request(raw_topic, &self.generation, &self.riddles);
        let timeout = self.generation.timeout();
        info!(topic_key, generator = self.generator.name(), "generating riddles");

        let candidates = tokio::time::timeout(timeout, self.generator.generate_text(&request))
            .await
            .map_err(|_| {
                Error::generation_with_context(
                    format!("no response within {:?}", timeout),
                    ErrorContext::new()
                        .with_details(format!("topic_key={}", topic_key))
                        .with_source(self.generator.name()),
                )
            })??;
        if candidates.is_empty() {
            return Err(Error::generation_with_context(
                "response contained no candidates",
                ErrorContext::new()
                    .with_details(format!("topic_key={}", topic_key))
                    .with_source(self.generator.name()),
            ));
        }

        let riddles = self.extractor.extract(candidates.as_slice());
        info!(
            topic_key,
            candidates = candidates.len(),
            riddles = riddles.len(),
            "extracted riddles"
        );
        Ok(riddles)
    }

    /// Overwrites `existing` or creates a new record, in one transaction.
    async fn persist(
        &self,
        topic_key: &str,
        existing: Option<TopicRiddleRecord>,
        payload: RiddlesPayload,
    ) -> Result<RiddlesForTopic> {
        let mut txn = self.store.begin_transaction().await?;
        let saved = match self.stage(topic_key, existing, &payload, &mut txn).await {
            Ok(saved) => saved,
            Err(e) => {
                self.rollback_quietly(txn).await;
                return Err(e);
            }
        };

        let result = match self.read_back(&saved, &txn).await {
            Ok(result) => result,
            Err(e @ Error::InvariantViolation { .. }) => {
                error!(topic_key, record_id = %saved.id(), error = %e,
                    "record unreadable immediately after write");
                self.rollback_quietly(txn).await;
                return Err(e);
            }
            Err(e) => {
                self.rollback_quietly(txn).await;
                return Err(e);
            }
        };

        self.store.commit(txn).await?;
        info!(
            topic_key,
            record_id = %saved.id(),
            riddles = result.riddles.len(),
            updated = saved.last_updated_at().is_some(),
            "stored riddles"
        );
        Ok(result)
    }

    async fn stage(
        &self,
        topic_key: &str,
        existing: Option<TopicRiddleRecord>,
        payload: &RiddlesPayload,
        txn: &mut Transaction,
    ) -> Result<TopicRiddleRecord> {
        let record = match existing {
            Some(mut record) => {
                debug!(topic_key, record_id = %record.id(), "overwriting unreadable record");
                record.set_riddles(payload)?;
                record
            }
            None => self.store.create(topic_key, payload)?,
        };
        self.store.save(record, txn).await
    }

    /// The public result for `saved`, read through the store inside `txn`.
    ///
    /// A record that is missing or undecodable right after its own write is an
    /// invariant violation. Other store errors pass through unchanged.
    async fn read_back(&self, saved: &TopicRiddleRecord, txn: &Transaction) -> Result<RiddlesForTopic> {
        let violation = |reason: String| {
            Error::invariant_with_context(
                format!("record written for {} cannot be read back: {}", saved.topic_key(), reason),
                ErrorContext::new()
                    .with_field_path("record.riddles_payload")
                    .with_details(format!("id={}", saved.id()))
                    .with_source("riddle_service"),
            )
        };
        let stored = match self.store.get_by_id(txn, saved.id()).await {
            Ok(Some(stored)) => stored,
            Ok(None) => return Err(violation("not found in transaction".to_string())),
            Err(e @ Error::Decode { .. }) => return Err(violation(e.to_string())),
            Err(e) => return Err(e),
        };
        stored.try_to_result().map_err(|e| violation(e.to_string()))
    }

    async fn rollback_quietly(&self, txn: Transaction) {
        if let Err(e) = self.store.rollback(txn).await {
            warn!(error = %e, "rollback failed");
        }
    }
}
