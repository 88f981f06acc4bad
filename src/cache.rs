use crate::error::{Error, StoreError};
use crate::model::{Entity, EntityKind, Record};
use crate::store::Store;
use std::collections::{btree_map, BTreeMap, BTreeSet, HashMap, HashSet};
use std::marker::PhantomData;

/// Per-batch entity cache. Lookups are deferred and coalesced so that a given
/// (kind, id) is read from the backing store at most once per batch.
#[derive(Debug, Default)]
pub struct EntityCache {
    entries: HashMap<EntityKind, BTreeMap<String, Record>>,
    deferred: HashMap<EntityKind, BTreeSet<String>>,
    // ids already asked to the store this batch, found or not
    requested: HashMap<EntityKind, HashSet<String>>,
    // ids known to exist in the store
    persisted: HashMap<EntityKind, HashSet<String>>,
    dirty: BTreeMap<EntityKind, BTreeSet<String>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlushStats {
    pub upserted: usize,
    pub inserted: usize,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks ids as wanted for the next `load` of `E`. Returns how many were not already
    /// cached, requested or deferred.
    pub fn defer<E, I, S>(&mut self, ids: I) -> usize
    where
        E: Entity,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut added = 0;
        for id in ids {
            let id = id.into();
            if self.contains(E::KIND, &id) || self.was_requested(E::KIND, &id) {
                continue;
            }
            if self.deferred.entry(E::KIND).or_default().insert(id) {
                added += 1;
            }
        }
        added
    }

    /// Fetches every deferred id of `E` in a single `get_many` and returns the full cached
    /// view of `E`. Nothing is read when nothing is deferred.
    pub async fn load<E: Entity>(&mut self, store: &dyn Store) -> Result<Values<'_, E>, Error> {
        let ids: Vec<String> = self
            .deferred
            .remove(&E::KIND)
            .map(|ids| ids.into_iter().collect())
            .unwrap_or_default();

        if !ids.is_empty() {
            log::debug!("loading {} {} entities", ids.len(), E::KIND.name());
            let records = store.get_many(E::KIND, &ids).await?;

            self.requested.entry(E::KIND).or_default().extend(ids);
            let entries = self.entries.entry(E::KIND).or_default();
            let persisted = self.persisted.entry(E::KIND).or_default();
            for record in records {
                if record.kind() != E::KIND {
                    return Err(StoreError::KindMismatch {
                        kind: E::KIND,
                        got: record.kind(),
                    }
                    .into());
                }
                persisted.insert(record.id().to_string());
                // entities added during the batch win over the stored copy
                if !entries.contains_key(record.id()) {
                    entries.insert(record.id().to_string(), record);
                }
            }
        }

        Ok(self.values::<E>())
    }

    pub fn get<E: Entity>(&self, id: &str) -> Option<&E> {
        self.entries
            .get(&E::KIND)
            .and_then(|entries| entries.get(id))
            .and_then(E::from_record_ref)
    }

    pub fn get_or_fail<E: Entity>(&self, id: &str) -> Result<&E, Error> {
        self.get::<E>(id).ok_or_else(|| Error::missing(E::KIND, id))
    }

    /// Mutable access, marks the entity for flush.
    pub fn get_mut<E: Entity>(&mut self, id: &str) -> Option<&mut E> {
        let record = self
            .entries
            .get_mut(&E::KIND)
            .and_then(|entries| entries.get_mut(id))?;
        self.dirty.entry(E::KIND).or_default().insert(id.to_string());
        E::from_record_mut(record)
    }

    pub fn get_mut_or_fail<E: Entity>(&mut self, id: &str) -> Result<&mut E, Error> {
        self.get_mut::<E>(id).ok_or_else(|| Error::missing(E::KIND, id))
    }

    /// Returns the cached entity, inserting `init()` when absent. Marks it for flush.
    pub fn get_or_create<E, F>(&mut self, id: &str, init: F) -> Result<&mut E, Error>
    where
        E: Entity,
        F: FnOnce() -> E,
    {
        self.dirty.entry(E::KIND).or_default().insert(id.to_string());
        let record = self
            .entries
            .entry(E::KIND)
            .or_default()
            .entry(id.to_string())
            .or_insert_with(|| init().into_record());
        E::from_record_mut(record).ok_or_else(|| Error::missing(E::KIND, id))
    }

    pub fn contains(&self, kind: EntityKind, id: &str) -> bool {
        self.entries
            .get(&kind)
            .map_or(false, |entries| entries.contains_key(id))
    }

    /// Inserts or replaces the cached copy and marks it for flush.
    pub fn add<E: Entity>(&mut self, entity: E) {
        let id = entity.id().to_string();
        self.dirty.entry(E::KIND).or_default().insert(id.clone());
        self.entries
            .entry(E::KIND)
            .or_default()
            .insert(id, entity.into_record());
    }

    /// Every cached `E`, ordered by id.
    pub fn values<E: Entity>(&self) -> Values<'_, E> {
        Values {
            inner: self.entries.get(&E::KIND).map(|entries| entries.values()),
            _marker: PhantomData,
        }
    }

    pub fn ids<E: Entity>(&self) -> Vec<String> {
        self.values::<E>().map(|e| e.id().to_string()).collect()
    }

    pub fn is_dirty(&self, kind: EntityKind, id: &str) -> bool {
        self.dirty.get(&kind).map_or(false, |ids| ids.contains(id))
    }

    fn is_persisted(&self, kind: EntityKind, id: &str) -> bool {
        self.persisted
            .get(&kind)
            .map_or(false, |ids| ids.contains(id))
    }

    fn was_requested(&self, kind: EntityKind, id: &str) -> bool {
        self.requested
            .get(&kind)
            .map_or(false, |ids| ids.contains(id))
    }

    /// Writes every dirty entity, kind after kind in declaration order. Write-once kinds
    /// go through `insert_many` and skip rows the store already holds.
    pub async fn flush(&mut self, store: &dyn Store) -> Result<FlushStats, Error> {
        let mut stats = FlushStats::default();
        let dirty = std::mem::take(&mut self.dirty);

        for (kind, ids) in dirty {
            let entries = match self.entries.get(&kind) {
                None => continue,
                Some(entries) => entries,
            };
            let records: Vec<Record> = ids
                .iter()
                .filter(|id| !(kind.is_insert_only() && self.is_persisted(kind, id)))
                .filter_map(|id| entries.get(id).cloned())
                .collect();
            if records.is_empty() {
                continue;
            }

            log::debug!("flushing {} {} entities", records.len(), kind.name());
            let persisted = self.persisted.entry(kind).or_default();
            persisted.extend(records.iter().map(|record| record.id().to_string()));
            if kind.is_insert_only() {
                stats.inserted += records.len();
                store.insert_many(kind, records).await?;
            } else {
                stats.upserted += records.len();
                store.put_many(kind, records).await?;
            }
        }

        Ok(stats)
    }
}

pub struct Values<'a, E> {
    inner: Option<btree_map::Values<'a, String, Record>>,
    _marker: PhantomData<E>,
}

impl<'a, E: Entity> Iterator for Values<'a, E> {
    type Item = &'a E;

    fn next(&mut self) -> Option<&'a E> {
        let inner = self.inner.as_mut()?;
        loop {
            let record = inner.next()?;
            if let Some(entity) = E::from_record_ref(record) {
                return Some(entity);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bundle, Pool, Transaction};
    use crate::store::MemoryStore;

    fn pool(id: &str) -> Pool {
        Pool {
            id: id.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_load_issues_a_single_batched_read() {
        let store = MemoryStore::with_records(vec![pool("A").into_record()]);
        let mut cache = EntityCache::new();

        assert_eq!(2, cache.defer::<Pool, _, _>(["A", "B"]));
        let loaded: Vec<String> = cache
            .load::<Pool>(&store)
            .await
            .unwrap()
            .map(|p| p.id.clone())
            .collect();
        assert_eq!(vec!["A".to_string()], loaded);
        assert_eq!(
            vec![(EntityKind::Pool, vec!["A".to_string(), "B".to_string()])],
            store.reads()
        );

        cache.load::<Pool>(&store).await.unwrap();
        assert_eq!(1, store.reads().len());
    }

    #[tokio::test]
    async fn test_missing_ids_are_never_requested_twice() {
        let store = MemoryStore::new();
        let mut cache = EntityCache::new();

        cache.defer::<Pool, _, _>(["B"]);
        cache.load::<Pool>(&store).await.unwrap();
        assert!(cache.get::<Pool>("B").is_none());

        assert_eq!(0, cache.defer::<Pool, _, _>(["B"]));
        cache.load::<Pool>(&store).await.unwrap();
        assert_eq!(1, store.reads().len());
    }

    #[tokio::test]
    async fn test_added_entities_win_over_stored_copy() {
        let mut stored = pool("A");
        stored.tx_count = 1;
        let store = MemoryStore::with_records(vec![stored.into_record()]);
        let mut cache = EntityCache::new();

        let mut fresh = pool("A");
        fresh.tx_count = 9;
        cache.add(fresh);
        assert_eq!(0, cache.defer::<Pool, _, _>(["A"]));
        cache.load::<Pool>(&store).await.unwrap();

        assert_eq!(9, cache.get::<Pool>("A").unwrap().tx_count);
        assert!(store.reads().is_empty());
    }

    #[test]
    fn test_get_or_fail_reports_kind_and_id() {
        let cache = EntityCache::new();
        match cache.get_or_fail::<Bundle>("1") {
            Err(Error::MissingEntity { kind, id }) => {
                assert_eq!(EntityKind::Bundle, kind);
                assert_eq!("1", id);
            }
            other => panic!("unexpected {:?}", other.map(|b| b.id.clone())),
        }
    }

    #[test]
    fn test_get_or_create_never_overwrites() {
        let mut cache = EntityCache::new();
        cache.get_or_create("A", || pool("A")).unwrap().tx_count = 4;
        let existing = cache
            .get_or_create("A", || {
                let mut other = pool("A");
                other.tx_count = 100;
                other
            })
            .unwrap();
        assert_eq!(4, existing.tx_count);
        assert!(cache.is_dirty(EntityKind::Pool, "A"));
    }

    #[tokio::test]
    async fn test_flush_writes_dirty_entities_once() {
        let tx = Transaction {
            id: "0x01".to_string(),
            ..Default::default()
        };
        let store = MemoryStore::with_records(vec![pool("A").into_record(), tx.into_record()]);
        let mut cache = EntityCache::new();
        cache.defer::<Pool, _, _>(["A"]);
        cache.defer::<Transaction, _, _>(["0x01"]);
        cache.load::<Pool>(&store).await.unwrap();
        cache.load::<Transaction>(&store).await.unwrap();

        cache.get_mut::<Pool>("A").unwrap().tx_count = 3;
        // a stored transaction touched again must not be inserted twice
        cache.get_mut::<Transaction>("0x01").unwrap();
        cache.add(Transaction {
            id: "0x02".to_string(),
            ..Default::default()
        });

        let stats = cache.flush(&store).await.unwrap();
        assert_eq!(FlushStats { upserted: 1, inserted: 1 }, stats);
        assert_eq!(3, store.get::<Pool>("A").unwrap().tx_count);
        assert_eq!(2, store.count(EntityKind::Transaction));

        let stats = cache.flush(&store).await.unwrap();
        assert_eq!(FlushStats::default(), stats);
    }

    #[tokio::test]
    async fn test_flush_inserts_rows_the_store_did_not_have() {
        let store = MemoryStore::new();
        let mut cache = EntityCache::new();
        cache.defer::<Transaction, _, _>(["0x03"]);
        cache.load::<Transaction>(&store).await.unwrap();
        cache.add(Transaction {
            id: "0x03".to_string(),
            ..Default::default()
        });

        let stats = cache.flush(&store).await.unwrap();
        assert_eq!(1, stats.inserted);

        // touched again after the flush, already in the store
        cache.get_mut::<Transaction>("0x03").unwrap();
        assert_eq!(0, cache.flush(&store).await.unwrap().inserted);
    }
}
