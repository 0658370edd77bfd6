use crate::models::account::Account;
use crate::models::job::PrintJob;
use crate::models::printer::Printer;
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Records addressed by their numeric id.
pub trait Keyed {
    fn key(&self) -> u32;
}

impl Keyed for Account {
    fn key(&self) -> u32 {
        self.id
    }
}

impl Keyed for PrintJob {
    fn key(&self) -> u32 {
        self.id
    }
}

impl Keyed for Printer {
    fn key(&self) -> u32 {
        self.id
    }
}

struct Entry<T> {
    /// Feed position, used to hand records back in feed order
    seq: u64,
    record: Arc<T>,
}

/// In-memory copy of one backend collection.
///
/// Local mutations are optimistic: they change the record in place and
/// mark the store stale until the next full refresh replaces it.
pub struct RecordStore<T> {
    records: DashMap<u32, Entry<T>>,
    next_seq: AtomicU64,
    stale: AtomicBool,
}

impl<T: Keyed + Clone> RecordStore<T> {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            next_seq: AtomicU64::new(0),
            stale: AtomicBool::new(false),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: DashMap::with_capacity(capacity),
            next_seq: AtomicU64::new(0),
            stale: AtomicBool::new(false),
        }
    }

    /// Insert or replace a record. A replaced record keeps its position.
    pub fn upsert(&self, record: T) {
        let key = record.key();
        let record = Arc::new(record);
        match self.records.entry(key) {
            MapEntry::Occupied(mut occupied) => occupied.get_mut().record = record,
            MapEntry::Vacant(vacant) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                vacant.insert(Entry { seq, record });
            }
        }
    }

    /// Replace the whole collection with a fresh fetch and clear the stale flag.
    pub fn replace_all(&self, records: Vec<T>) {
        self.records.clear();
        self.next_seq.store(0, Ordering::Relaxed);
        for record in records {
            self.upsert(record);
        }
        self.stale.store(false, Ordering::Release);
    }

    pub fn get(&self, key: u32) -> Option<Arc<T>> {
        self.records.get(&key).map(|entry| Arc::clone(&entry.record))
    }

    pub fn contains(&self, key: u32) -> bool {
        self.records.contains_key(&key)
    }

    /// Apply `mutate` to a copy of the record and store it back if it
    /// succeeds. Returns `None` when the key is unknown.
    pub fn update<E, F>(&self, key: u32, mutate: F) -> Option<Result<Arc<T>, E>>
    where
        F: FnOnce(&mut T) -> Result<(), E>,
    {
        let mut entry = self.records.get_mut(&key)?;
        let mut record = T::clone(&entry.record);
        if let Err(e) = mutate(&mut record) {
            return Some(Err(e));
        }
        entry.record = Arc::new(record);
        self.mark_stale();
        Some(Ok(Arc::clone(&entry.record)))
    }

    /// Drop a record locally. Returns the removed record if it existed.
    pub fn remove(&self, key: u32) -> Option<Arc<T>> {
        let removed = self.records.remove(&key).map(|(_, entry)| entry.record);
        if removed.is_some() {
            self.mark_stale();
        }
        removed
    }

    /// Owned copy of every record, in feed order.
    pub fn snapshot(&self) -> Vec<T> {
        let mut entries: Vec<(u64, Arc<T>)> = self
            .records
            .iter()
            .map(|entry| (entry.seq, Arc::clone(&entry.record)))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, record)| T::clone(&record)).collect()
    }

    pub fn mark_stale(&self) {
        self.stale.store(true, Ordering::Release);
    }

    /// Whether a local mutation is waiting for a re-fetch.
    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T: Keyed + Clone> Default for RecordStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::role::Role;
    use chrono::{TimeZone, Utc};

    fn account(id: u32) -> Account {
        Account::new(id, format!("user{}", id), Role::Student, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    fn ids(store: &RecordStore<Account>) -> Vec<u32> {
        store.snapshot().iter().map(|a| a.id).collect()
    }

    #[test]
    fn test_snapshot_keeps_feed_order() {
        let store = RecordStore::new();
        store.replace_all(vec![account(5), account(2), account(9)]);
        assert_eq!(ids(&store), vec![5, 2, 9]);
        assert_eq!(store.len(), 3);
        assert!(!store.is_stale());
    }

    #[test]
    fn test_upsert_keeps_position() {
        let store = RecordStore::new();
        store.replace_all(vec![account(1), account(2)]);
        let mut renamed = account(1);
        renamed.username = "renamed".to_string();
        store.upsert(renamed);
        store.upsert(account(3));

        assert_eq!(ids(&store), vec![1, 2, 3]);
        assert_eq!(store.get(1).unwrap().username, "renamed");
    }

    #[test]
    fn test_update_marks_stale() {
        let store = RecordStore::new();
        store.replace_all(vec![account(1)]);

        let result: Option<Result<_, ()>> = store.update(1, |a| {
            a.active = false;
            Ok(())
        });
        assert!(!result.unwrap().unwrap().active);
        assert!(store.is_stale());
        assert!(!store.get(1).unwrap().active);

        store.replace_all(vec![account(1)]);
        assert!(!store.is_stale());
        assert!(store.get(1).unwrap().active);
    }

    #[test]
    fn test_failed_update_leaves_record() {
        let store = RecordStore::new();
        store.replace_all(vec![account(1)]);

        let result = store.update(1, |a| {
            a.active = false;
            Err("nope")
        });
        assert_eq!(result.unwrap().unwrap_err(), "nope");
        assert!(store.get(1).unwrap().active);
        assert!(!store.is_stale());

        let missing: Option<Result<_, ()>> = store.update(42, |_| Ok(()));
        assert!(missing.is_none());
    }

    #[test]
    fn test_remove() {
        let store = RecordStore::new();
        store.replace_all(vec![account(1), account(2)]);
        assert!(store.remove(1).is_some());
        assert!(store.is_stale());
        assert!(store.remove(1).is_none());
        assert_eq!(ids(&store), vec![2]);
        assert!(!store.contains(1));
    }

    #[test]
    fn test_concurrent_upserts() {
        let store = Arc::new(RecordStore::<Account>::with_capacity(64));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        store.upsert(account(t * 100 + i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 200);
        assert_eq!(store.snapshot().len(), 200);
    }
}
