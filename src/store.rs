use crate::error::StoreError;
use crate::model::{Entity, EntityKind, Record};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Bulk surface of the durable storage engine.
#[async_trait]
pub trait Store: Send + Sync {
    /// Returns the records found, in any order. Unknown ids are not an error.
    async fn get_many(&self, kind: EntityKind, ids: &[String]) -> Result<Vec<Record>, StoreError>;

    /// Upserts.
    async fn put_many(&self, kind: EntityKind, records: Vec<Record>) -> Result<(), StoreError>;

    /// Append-only writes, an existing id is an error.
    async fn insert_many(&self, kind: EntityKind, records: Vec<Record>) -> Result<(), StoreError>;
}

/// In-memory `Store`, also records every `get_many` it serves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<BTreeMap<EntityKind, BTreeMap<String, Record>>>,
    reads: Mutex<Vec<(EntityKind, Vec<String>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = Record>) -> Self {
        let store = Self::new();
        {
            let mut rows = store.rows.lock();
            for record in records {
                rows.entry(record.kind())
                    .or_default()
                    .insert(record.id().to_string(), record);
            }
        }
        store
    }

    pub fn get<E: Entity>(&self, id: &str) -> Option<E> {
        let rows = self.rows.lock();
        rows.get(&E::KIND)
            .and_then(|table| table.get(id))
            .and_then(|record| E::from_record(record.clone()))
    }

    pub fn all<E: Entity>(&self) -> Vec<E> {
        let rows = self.rows.lock();
        match rows.get(&E::KIND) {
            None => vec![],
            Some(table) => table
                .values()
                .filter_map(|record| E::from_record(record.clone()))
                .collect(),
        }
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.rows.lock().get(&kind).map_or(0, |table| table.len())
    }

    pub fn reads(&self) -> Vec<(EntityKind, Vec<String>)> {
        self.reads.lock().clone()
    }

    pub fn clear_reads(&self) {
        self.reads.lock().clear();
    }
}

fn check_kind(kind: EntityKind, records: &[Record]) -> Result<(), StoreError> {
    match records.iter().find(|record| record.kind() != kind) {
        Some(record) => Err(StoreError::KindMismatch {
            kind,
            got: record.kind(),
        }),
        None => Ok(()),
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_many(&self, kind: EntityKind, ids: &[String]) -> Result<Vec<Record>, StoreError> {
        self.reads.lock().push((kind, ids.to_vec()));

        let rows = self.rows.lock();
        let table = match rows.get(&kind) {
            None => return Ok(vec![]),
            Some(table) => table,
        };
        Ok(ids.iter().filter_map(|id| table.get(id).cloned()).collect())
    }

    async fn put_many(&self, kind: EntityKind, records: Vec<Record>) -> Result<(), StoreError> {
        check_kind(kind, &records)?;

        let mut rows = self.rows.lock();
        let table = rows.entry(kind).or_default();
        for record in records {
            table.insert(record.id().to_string(), record);
        }
        Ok(())
    }

    async fn insert_many(&self, kind: EntityKind, records: Vec<Record>) -> Result<(), StoreError> {
        check_kind(kind, &records)?;

        let mut rows = self.rows.lock();
        let table = rows.entry(kind).or_default();
        if let Some(existing) = records.iter().find(|r| table.contains_key(r.id())) {
            return Err(StoreError::Duplicate {
                kind,
                id: existing.id().to_string(),
            });
        }
        for record in records {
            table.insert(record.id().to_string(), record);
        }
        Ok(())
    }
}
