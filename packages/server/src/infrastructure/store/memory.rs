//! In-process key-value store.
//!
//! Mirrors the subset of Redis semantics the adapter relies on: hashes and
//! sets live in one keyspace, a key holding the wrong kind is an error, and
//! a set or hash whose last element is removed disappears.

use std::{
    collections::{BTreeSet, HashMap},
    sync::atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{KeyValueStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    Hash(HashMap<String, String>),
    Set(BTreeSet<String>),
}

fn wrong_type(key: &str) -> StoreError {
    StoreError::Backend(format!(
        "WRONGTYPE operation against key '{key}' holding the wrong kind of value"
    ))
}

/// Key-value store held in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every request fail with [`StoreError::Unavailable`] until
    /// switched back, to exercise failure handling.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".to_string()));
        }
        Ok(())
    }

    /// Whether no key is stored at all
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.check_online()
    }

    async fn hset_all(&self, key: &str, fields: &[(&str, String)]) -> Result<(), StoreError> {
        self.check_online()?;
        let mut entries = self.entries.lock().await;
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::Hash(HashMap::new()));
        let Entry::Hash(hash) = entry else {
            return Err(wrong_type(key));
        };
        for (field, value) in fields {
            hash.insert((*field).to_string(), value.clone());
        }
        Ok(())
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        self.check_online()?;
        let entries = self.entries.lock().await;
        match entries.get(key) {
            None => Ok(HashMap::new()),
            Some(Entry::Hash(hash)) => Ok(hash.clone()),
            Some(Entry::Set(_)) => Err(wrong_type(key)),
        }
    }

    async fn smembers(&self, key: &str) -> Result<BTreeSet<String>, StoreError> {
        self.check_online()?;
        let entries = self.entries.lock().await;
        match entries.get(key) {
            None => Ok(BTreeSet::new()),
            Some(Entry::Set(set)) => Ok(set.clone()),
            Some(Entry::Hash(_)) => Err(wrong_type(key)),
        }
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<(), StoreError> {
        self.check_online()?;
        let mut entries = self.entries.lock().await;
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::Set(BTreeSet::new()));
        let Entry::Set(set) = entry else {
            return Err(wrong_type(key));
        };
        set.insert(member.to_string());
        Ok(())
    }

    async fn srem(&self, key: &str, member: &str) -> Result<(), StoreError> {
        self.check_online()?;
        let mut entries = self.entries.lock().await;
        let emptied = match entries.get_mut(key) {
            None => return Ok(()),
            Some(Entry::Hash(_)) => return Err(wrong_type(key)),
            Some(Entry::Set(set)) => {
                set.remove(member);
                set.is_empty()
            }
        };
        if emptied {
            entries.remove(key);
        }
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        self.check_online()?;
        let entries = self.entries.lock().await;
        let mut keys: Vec<String> = entries
            .keys()
            .filter(|key| glob_match(pattern, key))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        self.check_online()?;
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// Glob match supporting `*` (any run, including empty) and `?` (one char).
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    // Position of the last `*` and the text index it was tried against.
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    t = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}
