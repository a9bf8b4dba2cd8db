use std::cmp::Reverse;
use std::collections::HashMap;
use std::hash::Hash;

use log::debug;
use priority_queue::PriorityQueue;
use serde::{Deserialize, Serialize};

use crate::error::{FlashcardError, Result};

/// Key-value storage for per-user and per-session state. The caller owns the
/// store and decides its lifetime; nothing in this crate keeps global state.
pub trait Store<K, V> {
    fn get(&self, key: &K) -> Option<&V>;

    fn get_mut(&mut self, key: &K) -> Option<&mut V>;

    /// Returns the value for `key`, creating it with `default` if absent.
    fn get_or_insert_with<F: FnOnce() -> V>(&mut self, key: K, default: F) -> &mut V;

    fn insert(&mut self, key: K, value: V) -> Option<V>;

    fn remove(&mut self, key: &K) -> Option<V>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvictionPolicy {
    /// Upper bound on stored entries. `None` keeps everything.
    pub max_entries: Option<usize>,
}

impl EvictionPolicy {
    pub fn bounded(max_entries: usize) -> Self {
        Self {
            max_entries: Some(max_entries),
        }
    }
}

/// In-memory [`Store`] that evicts the least recently touched entry once the
/// policy's capacity is reached. Shared reads through [`Store::get`] do not
/// count as a touch.
#[derive(Debug)]
pub struct MemoryStore<K: Hash + Eq, V> {
    entries: HashMap<K, V>,
    recency: PriorityQueue<K, Reverse<u64>>,
    tick: u64,
    policy: EvictionPolicy,
}

impl<K: Hash + Eq + Clone, V> Default for MemoryStore<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            recency: PriorityQueue::new(),
            tick: 0,
            policy: EvictionPolicy::default(),
        }
    }
}

impl<K: Hash + Eq + Clone, V> MemoryStore<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: EvictionPolicy) -> Result<Self> {
        if policy.max_entries == Some(0) {
            return Err(FlashcardError::InvalidPolicy);
        }
        Ok(Self {
            policy,
            ..Self::default()
        })
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    fn touch(&mut self, key: &K) {
        self.tick += 1;
        self.recency.push(key.clone(), Reverse(self.tick));
    }

    fn make_room(&mut self) {
        let Some(max) = self.policy.max_entries else {
            return;
        };
        while self.entries.len() >= max {
            match self.recency.pop() {
                Some((evicted, Reverse(tick))) => {
                    debug!("evicting entry last touched at tick {tick}");
                    self.entries.remove(&evicted);
                }
                None => break,
            }
        }
    }
}

impl<K: Hash + Eq + Clone, V> Store<K, V> for MemoryStore<K, V> {
    fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        if self.entries.contains_key(key) {
            self.touch(key);
        }
        self.entries.get_mut(key)
    }

    fn get_or_insert_with<F: FnOnce() -> V>(&mut self, key: K, default: F) -> &mut V {
        if !self.entries.contains_key(&key) {
            self.make_room();
        }
        self.touch(&key);
        self.entries.entry(key).or_insert_with(default)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        if !self.entries.contains_key(&key) {
            self.make_room();
        }
        self.touch(&key);
        self.entries.insert(key, value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        self.recency.remove(key);
        self.entries.remove(key)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
