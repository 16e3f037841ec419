//! Set reconciliation.
//!
//! Brings a stored set to exactly a desired membership by issuing only the
//! delta: members present only in the store are removed, members present
//! only in the desired set are added, members in both are left alone.
//!
//! The read of the current set and the writes are not atomic. Two
//! reconcilers racing on the same key issue idempotent adds and removes, but
//! the final set may match neither writer's desired state; the last
//! reconciliation to run against a quiet key wins (eventual, not
//! linearizable, consistency).

use std::collections::BTreeSet;

use crate::domain::{KeyValueStore, StoreError};

/// Changes needed to turn one set into another
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetDelta {
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
}

impl SetDelta {
    /// Compute the delta from `current` to `desired`
    pub fn between(current: &BTreeSet<String>, desired: &BTreeSet<String>) -> Self {
        Self {
            added: desired.difference(current).cloned().collect(),
            removed: current.difference(desired).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Reconcile the set at `key` to `desired`.
///
/// Empty strings are never stored. Every add/remove is attempted even when
/// an earlier one fails; the last failure is returned after all of them
/// ran.
pub async fn reconcile_set(
    store: &dyn KeyValueStore,
    key: &str,
    desired: &BTreeSet<String>,
) -> Result<SetDelta, StoreError> {
    let current = store.smembers(key).await?;
    let desired: BTreeSet<String> = desired.iter().filter(|m| !m.is_empty()).cloned().collect();
    let delta = SetDelta::between(&current, &desired);

    let mut failure = None;
    for member in &delta.removed {
        if let Err(e) = store.srem(key, member).await {
            tracing::error!("Failed to remove '{}' from '{}': {}", member, key, e);
            failure = Some(e);
        }
    }
    for member in &delta.added {
        if let Err(e) = store.sadd(key, member).await {
            tracing::error!("Failed to add '{}' to '{}': {}", member, key, e);
            failure = Some(e);
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(delta),
    }
}
