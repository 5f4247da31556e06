use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{Collection, Record, StoreError, StoreResult};

/// Insertion-ordered in-memory collection.
///
/// Cloning the handle shares the underlying records.
pub struct MemoryCollection<R> {
    records: Arc<RwLock<Vec<R>>>,
}

impl<R: Record> MemoryCollection<R> {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Create a collection pre-populated with `records`.
    ///
    /// Later records with a key already seen are dropped.
    pub fn with_records(records: impl IntoIterator<Item = R>) -> Self {
        let mut seeded: Vec<R> = Vec::new();
        for record in records {
            if seeded.iter().any(|existing| existing.key() == record.key()) {
                tracing::warn!(key = ?record.key(), "skipping duplicate seed record");
                continue;
            }
            seeded.push(record);
        }

        Self {
            records: Arc::new(RwLock::new(seeded)),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl<R: Record> Default for MemoryCollection<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for MemoryCollection<R> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

fn position<R: Record>(records: &[R], key: &R::Key) -> StoreResult<usize> {
    records
        .iter()
        .position(|record| record.key() == key)
        .ok_or(StoreError::NotFound)
}

#[async_trait]
impl<R: Record> Collection<R> for MemoryCollection<R> {
    async fn find(&self) -> StoreResult<Vec<R>> {
        Ok(self.records.read().await.clone())
    }

    async fn find_one(&self, key: &R::Key) -> StoreResult<R> {
        let records = self.records.read().await;
        let index = position(&records, key)?;
        Ok(records[index].clone())
    }

    async fn insert_one(&self, record: R) -> StoreResult<R::Key> {
        let mut records = self.records.write().await;
        if records.iter().any(|existing| existing.key() == record.key()) {
            return Err(StoreError::Duplicate);
        }
        let key = record.key().clone();
        records.push(record);
        Ok(key)
    }

    async fn update_one(&self, key: &R::Key, patch: R::Patch) -> StoreResult<R> {
        let mut records = self.records.write().await;
        let index = position(&records, key)?;
        let record = &mut records[index];
        record.apply(patch);
        debug_assert!(record.key() == key, "patch changed the record key");
        Ok(record.clone())
    }

    async fn delete_one(&self, key: &R::Key) -> StoreResult<R> {
        let mut records = self.records.write().await;
        let index = position(&records, key)?;
        Ok(records.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: u32,
        body: String,
    }

    impl Record for Note {
        type Key = u32;
        type Patch = String;

        fn key(&self) -> &u32 {
            &self.id
        }

        fn apply(&mut self, patch: String) {
            self.body = patch;
        }
    }

    fn note(id: u32, body: &str) -> Note {
        Note {
            id,
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn find_preserves_insertion_order() {
        let notes = MemoryCollection::new();
        notes.insert_one(note(3, "c")).await.unwrap();
        notes.insert_one(note(1, "a")).await.unwrap();
        notes.insert_one(note(2, "b")).await.unwrap();

        let ids: Vec<u32> = notes.find().await.unwrap().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_keys() {
        let notes = MemoryCollection::with_records([note(1, "a")]);
        let err = notes.insert_one(note(1, "again")).await.unwrap_err();

        assert!(matches!(err, StoreError::Duplicate));
        assert_eq!(notes.find_one(&1).await.unwrap().body, "a");
    }

    #[tokio::test]
    async fn seeding_drops_repeated_keys() {
        let notes = MemoryCollection::with_records([note(1, "a"), note(1, "b"), note(2, "c")]);
        assert_eq!(notes.len().await, 2);
        assert_eq!(notes.find_one(&1).await.unwrap().body, "a");
    }

    #[tokio::test]
    async fn missing_keys_report_not_found() {
        let notes: MemoryCollection<Note> = MemoryCollection::new();

        assert!(matches!(notes.find_one(&9).await, Err(StoreError::NotFound)));
        assert!(matches!(
            notes.update_one(&9, "x".to_string()).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(notes.delete_one(&9).await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn update_and_delete_round_trip() {
        let notes = MemoryCollection::with_records([note(1, "a"), note(2, "b")]);

        let updated = notes.update_one(&2, "bee".to_string()).await.unwrap();
        assert_eq!(updated, note(2, "bee"));

        let removed = notes.delete_one(&1).await.unwrap();
        assert_eq!(removed, note(1, "a"));
        assert_eq!(notes.find().await.unwrap(), vec![note(2, "bee")]);
    }

    #[tokio::test]
    async fn clones_share_records() {
        let notes = MemoryCollection::new();
        let handle = notes.clone();
        handle.insert_one(note(7, "shared")).await.unwrap();

        assert!(!notes.is_empty().await);
        assert_eq!(notes.find_one(&7).await.unwrap().body, "shared");
    }
}
