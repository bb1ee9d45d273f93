use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Debug, Clone, PartialEq)]
pub enum MapChange<K, V> {
    Inserted { key: K, value: V },
    Updated { key: K, old: V, new: V },
    Removed { key: K, value: V },
    Cleared,
}

/// Ordered key/value map that reports every effective change to its
/// subscribers. Writes that leave the map unchanged are silent.
#[derive(Debug)]
pub struct ObservableMap<K, V> {
    entries: BTreeMap<K, V>,
    subscribers: Vec<Sender<MapChange<K, V>>>,
}

impl<K, V> Default for ObservableMap<K, V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            subscribers: Vec::new(),
        }
    }
}

impl<K, V> ObservableMap<K, V>
where
    K: Ord + Clone,
    V: Clone + PartialEq,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<MapChange<K, V>> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub fn snapshot(&self) -> BTreeMap<K, V> {
        self.entries.clone()
    }

    /// Returns the previous value. Re-inserting an equal value emits nothing
    /// and keeps the stored value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(existing) = self.entries.get(&key) {
            if *existing == value {
                return Some(existing.clone());
            }
        }

        let previous = self.entries.insert(key.clone(), value.clone());
        let change = match previous.clone() {
            Some(old) => MapChange::Updated {
                key,
                old,
                new: value,
            },
            None => MapChange::Inserted { key, value },
        };
        self.notify(change);
        previous
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let removed = self.entries.remove(key)?;
        self.notify(MapChange::Removed {
            key: key.clone(),
            value: removed.clone(),
        });
        Some(removed)
    }

    /// Removes every entry whose key fails `keep`, one event per entry.
    pub fn retain_keys<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&K) -> bool,
    {
        let doomed: Vec<K> = self
            .entries
            .keys()
            .filter(|key| !keep(key))
            .cloned()
            .collect();
        for key in &doomed {
            self.remove(key);
        }
        doomed.len()
    }

    pub fn clear(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        self.entries.clear();
        self.notify(MapChange::Cleared);
    }

    fn notify(&mut self, change: MapChange<K, V>) {
        self.subscribers.retain(|tx| tx.send(change.clone()).is_ok());
    }
}
