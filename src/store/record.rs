//! Timestamped record wrapper shared by every persisted record kind.

use super::backend::{Entity, EntityKey, KeyValueStore, Transaction};
use crate::clock::Clock;
use crate::{Error, ErrorContext, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Per-kind storage description for the fields held by a [`Timestamped`] record.
pub trait RecordKind: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Entity kind the record is stored under.
    const KIND: &'static str;

    /// Field name/value pairs written to the secondary index.
    fn indexed_fields(&self) -> Vec<(&'static str, String)>;
}

/// A record of kind `F` plus create/update bookkeeping.
///
/// The first [`save`](Self::save) sets `created_at`; every later save sets
/// `last_updated_at`. This is not a version number and gives no optimistic
/// concurrency guarantee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timestamped<F> {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_updated_at: Option<DateTime<Utc>>,
    fields: F,
}

impl<F: RecordKind> Timestamped<F> {
    /// A record that has never been saved.
    pub fn new_unsaved(id: impl Into<String>, fields: F) -> Self {
        Self {
            id: id.into(),
            created_at: None,
            last_updated_at: None,
            fields,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::new(F::KIND, self.id.clone())
    }

    pub fn fields(&self) -> &F {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut F {
        &mut self.fields
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn last_updated_at(&self) -> Option<DateTime<Utc>> {
        self.last_updated_at
    }

    /// Last update time, falling back to creation time.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.last_updated_at.or(self.created_at)
    }

    pub fn is_saved(&self) -> bool {
        self.created_at.is_some()
    }

    fn stamp(&mut self, now: DateTime<Utc>) {
        if self.created_at.is_some() {
            self.last_updated_at = Some(now);
        } else {
            self.created_at = Some(now);
        }
    }

    pub fn to_entity(&self) -> Result<Entity> {
        let body = serde_json::to_vec(self)?;
        let entity = self
            .fields
            .indexed_fields()
            .into_iter()
            .fold(Entity::new(self.key(), body), |entity, (field, value)| {
                entity.with_indexed(field, value)
            });
        Ok(entity)
    }

    pub fn from_entity(entity: &Entity) -> Result<Self> {
        if entity.key.kind != F::KIND {
            return Err(Error::storage_with_context(
                format!("expected kind {}, found {}", F::KIND, entity.key.kind),
                ErrorContext::new().with_details(entity.key.to_string()),
            ));
        }
        let mut record: Self = serde_json::from_slice(&entity.body).map_err(|e| {
            Error::decode_with_context(
                format!("record body is unreadable: {}", e),
                ErrorContext::new()
                    .with_details(entity.key.to_string())
                    .with_source("timestamped_record"),
            )
        })?;
        // The key is authoritative for the id.
        record.id = entity.key.name.clone();
        Ok(record)
    }

    /// Stamps the record and stages it in `txn`. Nothing is visible until the
    /// transaction commits.
    pub async fn save<S>(mut self, txn: &mut Transaction, store: &S, clock: &dyn Clock) -> Result<Self>
    where
        S: KeyValueStore + ?Sized,
    {
        self.stamp(clock.now());
        store.put(txn, self.to_entity()?).await?;
        Ok(self)
    }
}
