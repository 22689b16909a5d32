//! Keyed in-memory store with named secondary indexes.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

/// Implemented by records that carry a stable string identity usable as a
/// cache key.
pub trait Keyed {
    fn key(&self) -> &str;
}

type IndexFn<T> = Box<dyn Fn(&T) -> Vec<String> + Send + Sync>;

/// Thread-safe keyed store with secondary-index support.
///
/// Readers get `Arc` snapshots of the stored records; the write path
/// replaces records wholesale, it never mutates them in place.
pub struct Store<T> {
    indexes: Vec<(String, IndexFn<T>)>,
    inner: RwLock<Inner<T>>,
}

struct Inner<T> {
    items: HashMap<String, Arc<T>>,
    /// index name -> index key -> primary keys
    by_index: HashMap<String, HashMap<String, BTreeSet<String>>>,
}

impl<T: Keyed> Store<T> {
    pub fn new() -> Self {
        Self {
            indexes: Vec::new(),
            inner: RwLock::new(Inner {
                items: HashMap::new(),
                by_index: HashMap::new(),
            }),
        }
    }

    /// Register a named secondary index. Index functions must be registered
    /// before the store holds any records.
    pub fn with_index(
        mut self,
        name: impl Into<String>,
        index_fn: impl Fn(&T) -> Vec<String> + Send + Sync + 'static,
    ) -> Self {
        self.indexes.push((name.into(), Box::new(index_fn)));
        self
    }

    /// Replace the entire contents of the store with `items`.
    pub fn replace(&self, items: Vec<T>) {
        let mut inner = self.inner.write();
        inner.items.clear();
        inner.by_index.clear();
        for item in items {
            self.insert_locked(&mut inner, Arc::new(item));
        }
    }

    /// Insert or overwrite a single record.
    pub fn upsert(&self, item: T) {
        let mut inner = self.inner.write();
        self.remove_locked(&mut inner, item.key());
        self.insert_locked(&mut inner, Arc::new(item));
    }

    /// Remove the record stored under `key`, returning it if present.
    pub fn delete(&self, key: &str) -> Option<Arc<T>> {
        let mut inner = self.inner.write();
        self.remove_locked(&mut inner, key)
    }

    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        self.inner.read().items.get(key).cloned()
    }

    /// All stored records, in indeterminate order.
    pub fn list(&self) -> Vec<Arc<T>> {
        self.inner.read().items.values().cloned().collect()
    }

    /// Records whose index function produced `key` for the index `name`.
    /// Unknown index names yield an empty result.
    pub fn by_index(&self, name: &str, key: &str) -> Vec<Arc<T>> {
        let inner = self.inner.read();
        let Some(keys) = inner.by_index.get(name).and_then(|idx| idx.get(key)) else {
            return Vec::new();
        };
        keys.iter()
            .filter_map(|k| inner.items.get(k).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().items.is_empty()
    }

    fn insert_locked(&self, inner: &mut Inner<T>, item: Arc<T>) {
        let key = item.key().to_string();
        for (name, index_fn) in &self.indexes {
            for index_key in index_fn(&item) {
                inner
                    .by_index
                    .entry(name.clone())
                    .or_default()
                    .entry(index_key)
                    .or_default()
                    .insert(key.clone());
            }
        }
        inner.items.insert(key, item);
    }

    fn remove_locked(&self, inner: &mut Inner<T>, key: &str) -> Option<Arc<T>> {
        let item = inner.items.remove(key)?;
        for (name, index_fn) in &self.indexes {
            for index_key in index_fn(&item) {
                if let Some(index) = inner.by_index.get_mut(name)
                    && let Some(keys) = index.get_mut(&index_key)
                {
                    keys.remove(key);
                    if keys.is_empty() {
                        index.remove(&index_key);
                    }
                }
            }
        }
        Some(item)
    }
}

impl<T: Keyed> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}
