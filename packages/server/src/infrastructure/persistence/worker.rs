//! Background reconciliation of membership sets.
//!
//! Writes schedule one [`SetSync`] per membership set onto a bounded queue;
//! a single worker task drains it. Scheduling never waits: when the queue is
//! full the job is dropped and counted. Jobs for the same key are applied in
//! the order they were scheduled.

use std::{collections::BTreeSet, sync::Arc};

use tokio::{
    sync::{
        mpsc::{self, error::TrySendError},
        oneshot,
    },
    task::JoinHandle,
};

use crate::domain::KeyValueStore;
use crate::infrastructure::store::reconcile_set;

use super::health::PersistenceHealth;

/// Request to bring the set at `key` to exactly `members`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetSync {
    pub key: String,
    pub members: BTreeSet<String>,
}

#[derive(Debug)]
enum SyncJob {
    Reconcile(SetSync),
    /// Answered once every job queued before it has been applied
    Flush(oneshot::Sender<()>),
}

/// Handle for scheduling reconciliations. The worker stops once every
/// scheduler has been dropped.
#[derive(Debug, Clone)]
pub struct SyncScheduler {
    tx: mpsc::Sender<SyncJob>,
    health: Arc<PersistenceHealth>,
}

impl SyncScheduler {
    /// Queue a reconciliation without waiting for it
    pub fn schedule(&self, key: String, members: BTreeSet<String>) {
        match self.tx.try_send(SyncJob::Reconcile(SetSync { key, members })) {
            Ok(()) => {}
            Err(TrySendError::Full(SyncJob::Reconcile(job))) => {
                tracing::warn!("Sync queue full, dropping reconciliation of '{}'", job.key);
                self.health.record_dropped();
            }
            Err(TrySendError::Closed(_) | TrySendError::Full(_)) => {
                tracing::warn!("Sync worker stopped, dropping reconciliation");
                self.health.record_dropped();
            }
        }
    }

    /// Wait until everything scheduled so far has been applied
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(SyncJob::Flush(tx)).await.is_err() {
            return;
        }
        let _ = rx.await;
    }
}

/// Task applying scheduled reconciliations against the store
pub struct SyncWorker {
    store: Arc<dyn KeyValueStore>,
    rx: mpsc::Receiver<SyncJob>,
    health: Arc<PersistenceHealth>,
}

impl SyncWorker {
    /// Start the worker with a queue of `capacity` jobs
    pub fn spawn(
        store: Arc<dyn KeyValueStore>,
        capacity: usize,
        health: Arc<PersistenceHealth>,
    ) -> (SyncScheduler, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = Self {
            store,
            rx,
            health: health.clone(),
        };
        let handle = tokio::spawn(worker.run());
        (SyncScheduler { tx, health }, handle)
    }

    async fn run(mut self) {
        while let Some(job) = self.rx.recv().await {
            match job {
                SyncJob::Reconcile(sync) => self.apply(sync).await,
                SyncJob::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
        tracing::debug!("Sync worker stopped");
    }

    async fn apply(&self, sync: SetSync) {
        match reconcile_set(self.store.as_ref(), &sync.key, &sync.members).await {
            Ok(delta) => {
                tracing::debug!(
                    "Reconciled '{}' (+{} -{})",
                    sync.key,
                    delta.added.len(),
                    delta.removed.len()
                );
                self.health.record_success();
            }
            Err(e) => {
                tracing::error!("Failed to reconcile '{}': {}", sync.key, e);
                self.health.record_failure(&e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::store::MemoryStore;

    fn set(members: &[&str]) -> BTreeSet<String> {
        members.iter().map(|m| (*m).to_string()).collect()
    }

    #[tokio::test]
    async fn test_scheduled_syncs_apply_in_order() {
        // テスト項目: 同じキーへの同期は後のものが優先される
        // given (前提条件):
        let store = Arc::new(MemoryStore::new());
        let health = Arc::new(PersistenceHealth::default());
        let (scheduler, _handle) = SyncWorker::spawn(store.clone(), 16, health.clone());

        // when (操作):
        scheduler.schedule("k".to_string(), set(&["a", "b"]));
        scheduler.schedule("k".to_string(), set(&["b", "c"]));
        scheduler.flush().await;

        // then (期待する結果):
        assert_eq!(store.smembers("k").await.unwrap(), set(&["b", "c"]));
        assert_eq!(health.snapshot().completed_jobs, 2);
    }

    #[tokio::test]
    async fn test_worker_stops_when_schedulers_dropped() {
        // テスト項目: すべてのスケジューラを破棄するとキューが処理されタスクが終了する
        // given (前提条件):
        let store = Arc::new(MemoryStore::new());
        let health = Arc::new(PersistenceHealth::default());
        let (scheduler, handle) = SyncWorker::spawn(store.clone(), 16, health);
        scheduler.schedule("k".to_string(), set(&["a"]));

        // when (操作):
        drop(scheduler);
        handle.await.unwrap();

        // then (期待する結果):
        assert_eq!(store.smembers("k").await.unwrap(), set(&["a"]));
    }

    #[tokio::test]
    async fn test_failures_are_recorded() {
        // テスト項目: ストアの失敗は集計され、呼び出し元には伝播しない
        // given (前提条件):
        let store = Arc::new(MemoryStore::new());
        store.set_offline(true);
        let health = Arc::new(PersistenceHealth::new(2));
        let (scheduler, _handle) = SyncWorker::spawn(store.clone(), 16, health.clone());

        // when (操作):
        scheduler.schedule("k".to_string(), set(&["a"]));
        scheduler.schedule("k".to_string(), set(&["b"]));
        scheduler.flush().await;

        // then (期待する結果):
        assert!(!health.is_healthy());
        assert_eq!(health.snapshot().total_failures, 2);
    }
}
