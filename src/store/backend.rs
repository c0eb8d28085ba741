//! Transactional key-value backends.

use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Primary key of a stored entity: a kind plus a name unique within the kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    pub kind: String,
    pub name: String,
}

impl EntityKey {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// An opaque stored unit: an encoded body plus the values of its indexed fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub key: EntityKey,
    pub indexed: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl Entity {
    pub fn new(key: EntityKey, body: Vec<u8>) -> Self {
        Self {
            key,
            indexed: BTreeMap::new(),
            body,
        }
    }

    pub fn with_indexed(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.indexed.insert(field.into(), value.into());
        self
    }
}

/// Writes staged against a backend, applied all-or-nothing on commit.
#[derive(Debug)]
pub struct Transaction {
    id: Uuid,
    writes: Vec<Entity>,
}

impl Transaction {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            writes: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn stage(&mut self, entity: Entity) {
        self.writes.retain(|w| w.key != entity.key);
        self.writes.push(entity);
    }

    pub fn pending(&self) -> &[Entity] {
        &self.writes
    }

    pub fn staged(&self, key: &EntityKey) -> Option<&Entity> {
        self.writes.iter().find(|w| &w.key == key)
    }

    pub fn into_writes(self) -> Vec<Entity> {
        self.writes
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

/// The key-value service the record store is built on.
///
/// Point reads take a transaction and see its staged writes. The index query is
/// not transactional and only sees committed entities.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn begin_transaction(&self) -> Result<Transaction>;
    async fn get(&self, txn: &Transaction, key: &EntityKey) -> Result<Option<Entity>>;
    async fn get_many(
        &self,
        txn: &Transaction,
        keys: &[EntityKey],
    ) -> Result<HashMap<EntityKey, Entity>>;
    async fn put(&self, txn: &mut Transaction, entity: Entity) -> Result<()>;
    async fn commit(&self, txn: Transaction) -> Result<()>;
    async fn rollback(&self, txn: Transaction) -> Result<()>;
    async fn find_by_indexed_field(&self, kind: &str, field: &str, value: &str)
        -> Result<Vec<Entity>>;
    async fn len(&self) -> Result<usize>;
    fn name(&self) -> &'static str;
}

struct StoredEntity {
    seq: u64,
    entity: Entity,
}

/// In-process backend. Index queries return matches in first-insertion order.
pub struct MemoryStore {
    entities: Arc<RwLock<HashMap<EntityKey, StoredEntity>>>,
    next_seq: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entities: Arc::new(RwLock::new(HashMap::new())),
            next_seq: AtomicU64::new(0),
        }
    }

    fn poisoned() -> Error {
        Error::storage_with_context(
            "memory store lock poisoned",
            ErrorContext::new().with_source("memory_store"),
        )
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn begin_transaction(&self) -> Result<Transaction> {
        Ok(Transaction::new())
    }

    async fn get(&self, txn: &Transaction, key: &EntityKey) -> Result<Option<Entity>> {
        if let Some(staged) = txn.staged(key) {
            return Ok(Some(staged.clone()));
        }
        let entities = self.entities.read().map_err(|_| Self::poisoned())?;
        Ok(entities.get(key).map(|stored| stored.entity.clone()))
    }

    async fn get_many(
        &self,
        txn: &Transaction,
        keys: &[EntityKey],
    ) -> Result<HashMap<EntityKey, Entity>> {
        let entities = self.entities.read().map_err(|_| Self::poisoned())?;
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            let entity = txn
                .staged(key)
                .cloned()
                .or_else(|| entities.get(key).map(|stored| stored.entity.clone()));
            if let Some(entity) = entity {
                found.insert(key.clone(), entity);
            }
        }
        Ok(found)
    }

    async fn put(&self, txn: &mut Transaction, entity: Entity) -> Result<()> {
        if entity.key.kind.is_empty() || entity.key.name.is_empty() {
            return Err(Error::storage_with_context(
                "entity key must have a kind and a name",
                ErrorContext::new()
                    .with_details(entity.key.to_string())
                    .with_source("memory_store"),
            ));
        }
        txn.stage(entity);
        Ok(())
    }

    async fn commit(&self, txn: Transaction) -> Result<()> {
        let txn_id = txn.id();
        let writes = txn.into_writes();
        let count = writes.len();
        let mut entities = self.entities.write().map_err(|_| Self::poisoned())?;
        for entity in writes {
            let seq = match entities.get(&entity.key) {
                Some(existing) => existing.seq,
                None => self.next_seq.fetch_add(1, Ordering::Relaxed),
            };
            entities.insert(entity.key.clone(), StoredEntity { seq, entity });
        }
        tracing::debug!(txn = %txn_id, writes = count, "committed transaction");
        Ok(())
    }

    async fn rollback(&self, txn: Transaction) -> Result<()> {
        tracing::debug!(txn = %txn.id(), discarded = txn.pending().len(), "rolled back transaction");
        Ok(())
    }

    async fn find_by_indexed_field(
        &self,
        kind: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Entity>> {
        let entities = self.entities.read().map_err(|_| Self::poisoned())?;
        let mut matches: Vec<&StoredEntity> = entities
            .values()
            .filter(|stored| {
                stored.entity.key.kind == kind
                    && stored.entity.indexed.get(field).map(String::as_str) == Some(value)
            })
            .collect();
        matches.sort_by_key(|stored| stored.seq);
        Ok(matches.into_iter().map(|stored| stored.entity.clone()).collect())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entities.read().map_err(|_| Self::poisoned())?.len())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(name: &str, topic: &str) -> Entity {
        Entity::new(EntityKey::new("Topic", name), name.as_bytes().to_vec()).with_indexed("topic", topic)
    }

    #[tokio::test]
    async fn test_writes_are_invisible_until_commit() {
        let store = MemoryStore::new();
        let mut txn = store.begin_transaction().await.unwrap();
        store.put(&mut txn, entity("a", "space")).await.unwrap();

        assert!(store
            .find_by_indexed_field("Topic", "topic", "space")
            .await
            .unwrap()
            .is_empty());
        assert!(store.get(&txn, &EntityKey::new("Topic", "a")).await.unwrap().is_some());

        store.commit(txn).await.unwrap();
        assert_eq!(store.len().await.unwrap(), 1);
        let found = store
            .find_by_indexed_field("Topic", "topic", "space")
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key.name, "a");
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let store = MemoryStore::new();
        let mut txn = store.begin_transaction().await.unwrap();
        store.put(&mut txn, entity("a", "space")).await.unwrap();
        store.rollback(txn).await.unwrap();
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_index_query_keeps_insertion_order() {
        let store = MemoryStore::new();
        for name in ["z", "m", "a"] {
            let mut txn = store.begin_transaction().await.unwrap();
            store.put(&mut txn, entity(name, "space")).await.unwrap();
            store.commit(txn).await.unwrap();
        }
        // Overwriting keeps the original position.
        let mut txn = store.begin_transaction().await.unwrap();
        store.put(&mut txn, entity("z", "space")).await.unwrap();
        store.commit(txn).await.unwrap();

        let names: Vec<String> = store
            .find_by_indexed_field("Topic", "topic", "space")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.key.name)
            .collect();
        assert_eq!(names, vec!["z", "m", "a"]);
    }

    #[tokio::test]
    async fn test_get_many_skips_missing_keys() {
        let store = MemoryStore::new();
        let mut txn = store.begin_transaction().await.unwrap();
        store.put(&mut txn, entity("a", "space")).await.unwrap();
        store.commit(txn).await.unwrap();

        let txn = store.begin_transaction().await.unwrap();
        let found = store
            .get_many(
                &txn,
                &[EntityKey::new("Topic", "a"), EntityKey::new("Topic", "missing")],
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(found.contains_key(&EntityKey::new("Topic", "a")));
    }

    #[tokio::test]
    async fn test_put_rejects_empty_key() {
        let store = MemoryStore::new();
        let mut txn = store.begin_transaction().await.unwrap();
        let err = store
            .put(&mut txn, Entity::new(EntityKey::new("Topic", ""), vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage { .. }));
    }
}
