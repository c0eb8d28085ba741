//! Topic riddle records and their data-access object.

use super::backend::{EntityKey, KeyValueStore, Transaction};
use super::codec::{self, base64_bytes};
use super::record::{RecordKind, Timestamped};
use crate::clock::Clock;
use crate::types::{RiddlesForTopic, RiddlesPayload};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

/// Indexed field holding the canonical topic key.
pub const TOPIC_FIELD: &str = "topic";

/// Fields of a cached riddle set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRiddles {
    topic_key: String,
    #[serde(with = "base64_bytes")]
    riddles_payload: Vec<u8>,
}

impl RecordKind for TopicRiddles {
    const KIND: &'static str = "Topic";

    fn indexed_fields(&self) -> Vec<(&'static str, String)> {
        vec![(TOPIC_FIELD, self.topic_key.clone())]
    }
}

/// One topic's cached riddle set.
pub type TopicRiddleRecord = Timestamped<TopicRiddles>;

impl Timestamped<TopicRiddles> {
    pub fn topic_key(&self) -> &str {
        &self.fields().topic_key
    }

    /// Replaces the stored riddles. Takes effect on the next save.
    pub fn set_riddles(&mut self, payload: &RiddlesPayload) -> Result<&mut Self> {
        self.fields_mut().riddles_payload = codec::encode_payload(payload)?;
        Ok(self)
    }

    /// Replaces the stored payload bytes without encoding them.
    pub fn set_raw_riddles_payload(&mut self, bytes: Vec<u8>) -> &mut Self {
        self.fields_mut().riddles_payload = bytes;
        self
    }

    pub fn raw_riddles_payload(&self) -> &[u8] {
        &self.fields().riddles_payload
    }

    /// Decodes the stored riddles, failing with `Error::Decode` when the payload
    /// has become incompatible.
    pub fn riddles(&self) -> Result<RiddlesPayload> {
        codec::decode_payload(&self.fields().riddles_payload).map_err(|e| match e {
            crate::Error::Decode { message, context } => crate::Error::Decode {
                message,
                context: context.with_details(format!("id={}", self.id())),
            },
            other => other,
        })
    }

    pub fn try_to_result(&self) -> Result<RiddlesForTopic> {
        let payload = self.riddles()?;
        Ok(RiddlesForTopic {
            id: self.id().to_string(),
            riddles: payload.riddles,
        })
    }

    /// The public result, or `None` (with a warning) when the payload is unreadable.
    pub fn to_result(&self) -> Option<RiddlesForTopic> {
        match self.try_to_result() {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::warn!(record_id = %self.id(), topic_key = %self.topic_key(), error = %e,
                    "failed to decode riddles payload");
                None
            }
        }
    }
}

/// Data-access object for [`TopicRiddleRecord`]s.
///
/// `topic_key` is indexed but not unique: nothing stops two records sharing a
/// key, and [`find_by_topic`](Self::find_by_topic) simply returns the first.
#[derive(Clone)]
pub struct RiddleStore {
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl RiddleStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { kv, clock }
    }

    pub fn backend_name(&self) -> &'static str {
        self.kv.name()
    }

    pub async fn begin_transaction(&self) -> Result<Transaction> {
        self.kv.begin_transaction().await
    }

    pub async fn commit(&self, txn: Transaction) -> Result<()> {
        self.kv.commit(txn).await
    }

    pub async fn rollback(&self, txn: Transaction) -> Result<()> {
        self.kv.rollback(txn).await
    }

    pub async fn get_by_id(&self, txn: &Transaction, id: &str) -> Result<Option<TopicRiddleRecord>> {
        let key = EntityKey::new(TopicRiddles::KIND, id);
        self.kv
            .get(txn, &key)
            .await?
            .map(|entity| TopicRiddleRecord::from_entity(&entity))
            .transpose()
    }

    pub async fn get_by_ids(
        &self,
        txn: &Transaction,
        ids: &HashSet<String>,
    ) -> Result<HashMap<String, TopicRiddleRecord>> {
        let keys: Vec<EntityKey> = ids
            .iter()
            .map(|id| EntityKey::new(TopicRiddles::KIND, id.clone()))
            .collect();
        self.kv
            .get_many(txn, &keys)
            .await?
            .into_iter()
            .map(|(key, entity)| Ok((key.name, TopicRiddleRecord::from_entity(&entity)?)))
            .collect()
    }

    /// Every record indexed under `topic_key`, oldest first.
    ///
    /// Records whose body cannot be read at all are skipped with a warning.
    /// Not transactional.
    pub async fn find_all_by_topic(&self, topic_key: &str) -> Result<Vec<TopicRiddleRecord>> {
        let entities = self
            .kv
            .find_by_indexed_field(TopicRiddles::KIND, TOPIC_FIELD, topic_key)
            .await?;
        let records = entities
            .iter()
            .filter_map(|entity| match TopicRiddleRecord::from_entity(entity) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(key = %entity.key, error = %e, "skipping unreadable record");
                    None
                }
            })
            .collect();
        Ok(records)
    }

    /// The first record indexed under `topic_key`. Not transactional.
    pub async fn find_by_topic(&self, topic_key: &str) -> Result<Option<TopicRiddleRecord>> {
        Ok(self.find_all_by_topic(topic_key).await?.into_iter().next())
    }

    /// A new, unsaved record with a random id.
    pub fn create(&self, topic_key: &str, payload: &RiddlesPayload) -> Result<TopicRiddleRecord> {
        let mut record = TopicRiddleRecord::new_unsaved(
            Uuid::new_v4().to_string(),
            TopicRiddles {
                topic_key: topic_key.to_string(),
                riddles_payload: Vec::new(),
            },
        );
        record.set_riddles(payload)?;
        Ok(record)
    }

    pub async fn save(
        &self,
        record: TopicRiddleRecord,
        txn: &mut Transaction,
    ) -> Result<TopicRiddleRecord> {
        record.save(txn, self.kv.as_ref(), self.clock.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::backend::MemoryStore;
    use crate::types::Riddle;
    use crate::Error;
    use chrono::{TimeZone, Utc};

    fn store() -> RiddleStore {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap());
        RiddleStore::new(Arc::new(MemoryStore::new()), Arc::new(clock))
    }

    fn payload(question: &str) -> RiddlesPayload {
        RiddlesPayload::new(vec![Riddle::new(question, "A").with_incorrect_answers(["B"])])
    }

    async fn persist(store: &RiddleStore, record: TopicRiddleRecord) -> TopicRiddleRecord {
        let mut txn = store.begin_transaction().await.unwrap();
        let saved = store.save(record, &mut txn).await.unwrap();
        store.commit(txn).await.unwrap();
        saved
    }

    #[tokio::test]
    async fn test_create_is_unsaved_until_committed() {
        let store = store();
        let record = store.create("space", &payload("Q1")).unwrap();
        assert!(!record.is_saved());
        assert!(store.find_by_topic("space").await.unwrap().is_none());

        let saved = persist(&store, record).await;
        let found = store.find_by_topic("space").await.unwrap().unwrap();
        assert_eq!(found.id(), saved.id());
        assert_eq!(found.topic_key(), "space");
        assert_eq!(found.riddles().unwrap(), payload("Q1"));
        assert!(found.created_at().is_some());
        assert!(found.last_updated_at().is_none());
    }

    #[tokio::test]
    async fn test_point_reads_by_id() {
        let store = store();
        let a = persist(&store, store.create("space", &payload("Q1")).unwrap()).await;
        let b = persist(&store, store.create("ocean", &payload("Q2")).unwrap()).await;

        let txn = store.begin_transaction().await.unwrap();
        let found = store.get_by_id(&txn, a.id()).await.unwrap().unwrap();
        assert_eq!(found.topic_key(), "space");
        assert!(store.get_by_id(&txn, "missing").await.unwrap().is_none());

        let ids: HashSet<String> = [a.id().to_string(), b.id().to_string(), "missing".to_string()]
            .into_iter()
            .collect();
        let found = store.get_by_ids(&txn, &ids).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[b.id()].topic_key(), "ocean");
        store.rollback(txn).await.unwrap();
    }

    #[tokio::test]
    async fn test_find_by_topic_returns_first_of_duplicates() {
        let store = store();
        let first = persist(&store, store.create("space", &payload("Q1")).unwrap()).await;
        persist(&store, store.create("space", &payload("Q2")).unwrap()).await;

        assert_eq!(store.find_all_by_topic("space").await.unwrap().len(), 2);
        let found = store.find_by_topic("space").await.unwrap().unwrap();
        assert_eq!(found.id(), first.id());
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_a_soft_failure() {
        let store = store();
        let mut record = store.create("space", &payload("Q1")).unwrap();
        record.set_raw_riddles_payload(b"riddles { question: 'legacy' }".to_vec());
        persist(&store, record).await;

        let found = store.find_by_topic("space").await.unwrap().unwrap();
        assert!(found.to_result().is_none());
        let err = found.try_to_result().unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
        assert!(err.to_string().contains(found.id()));
    }
}
