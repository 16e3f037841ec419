//! [`MembershipMirror`] backed by the persistence adapter.

use std::sync::Arc;

use tokio::{
    sync::{
        mpsc::{self, error::TrySendError},
        oneshot,
    },
    task::JoinHandle,
};

use crate::domain::{MembershipMirror, MirrorEvent, StoreError};

use super::{adapter::PersistenceAdapter, health::PersistenceHealth};

enum MirrorJob {
    Event(MirrorEvent),
    Flush(oneshot::Sender<()>),
}

/// Queues mirror events and writes them from a single background task, so
/// writes for one client reach the store in the order they were published.
#[derive(Clone)]
pub struct StoreMirror {
    tx: mpsc::Sender<MirrorJob>,
    adapter: PersistenceAdapter,
    health: Arc<PersistenceHealth>,
}

impl StoreMirror {
    pub fn spawn(
        adapter: PersistenceAdapter,
        capacity: usize,
        health: Arc<PersistenceHealth>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel(capacity.max(1));

        let writer = adapter.clone();
        let writer_health = health.clone();
        let handle = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                match job {
                    MirrorJob::Event(event) => {
                        if let Err(e) = apply(&writer, event).await {
                            tracing::error!("Failed to mirror membership change: {}", e);
                            writer_health.record_failure(&e);
                        } else {
                            writer_health.record_success();
                        }
                    }
                    MirrorJob::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            tracing::debug!("Store mirror stopped");
        });

        (
            Self {
                tx,
                adapter,
                health,
            },
            handle,
        )
    }

    /// Wait until every event published so far, and the set reconciliations
    /// it scheduled, has reached the store
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(MirrorJob::Flush(tx)).await.is_ok() {
            let _ = rx.await;
        }
        self.adapter.flush().await;
    }

    pub fn adapter(&self) -> &PersistenceAdapter {
        &self.adapter
    }
}

impl MembershipMirror for StoreMirror {
    fn publish(&self, event: MirrorEvent) {
        match self.tx.try_send(MirrorJob::Event(event)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!("Mirror queue full, dropping membership change");
                self.health.record_dropped();
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!("Store mirror stopped, dropping membership change");
                self.health.record_dropped();
            }
        }
    }
}

async fn apply(adapter: &PersistenceAdapter, event: MirrorEvent) -> Result<(), StoreError> {
    match event {
        MirrorEvent::Connected { user } => adapter.write_user(&user).await,
        MirrorEvent::MembershipChanged { user, room, group } => {
            adapter.write_room(&room).await?;
            adapter.write_user(&user).await?;
            adapter.write_group(&group).await
        }
        MirrorEvent::Disconnected {
            user,
            rooms,
            groups,
        } => {
            for room in &rooms {
                adapter.write_room(room).await?;
            }
            for group in &groups {
                adapter.write_group(group).await?;
            }
            // Pending set syncs for this user must land before its keys go
            adapter.flush().await;
            adapter.delete_user(&user).await
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::domain::{ClientId, Group, KeyValueStore, Room, User};
    use crate::infrastructure::store::MemoryStore;

    fn create_test_mirror(
        store: Arc<MemoryStore>,
        health: Arc<PersistenceHealth>,
    ) -> StoreMirror {
        let (adapter, _sync) = PersistenceAdapter::spawn(store, 64, health.clone());
        let (mirror, _handle) = StoreMirror::spawn(adapter, 64, health);
        mirror
    }

    fn lobby(members: &[ClientId]) -> (Room, Group) {
        let room = Room {
            title: "lobby".to_string(),
            group: "default".to_string(),
            private: false,
            members: members.iter().copied().collect(),
        };
        let group = Group {
            title: "default".to_string(),
            rooms: BTreeSet::from(["lobby".to_string()]),
            users: members.iter().copied().collect(),
        };
        (room, group)
    }

    #[tokio::test]
    async fn test_connected_writes_user() {
        // テスト項目: 接続が接続中のユーザーレコードとしてミラーされる
        // given (前提条件):
        let store = Arc::new(MemoryStore::new());
        let mirror = create_test_mirror(store.clone(), Arc::new(PersistenceHealth::default()));
        let user = User::guest(ClientId::generate());

        // when (操作):
        mirror.publish(MirrorEvent::Connected { user: user.clone() });
        mirror.flush().await;

        // then (期待する結果):
        let loaded = mirror.adapter().get_user(&user.id).await.unwrap();
        assert_eq!(loaded, Some(user));
    }

    #[tokio::test]
    async fn test_membership_then_disconnect() {
        // テスト項目: 入室後に切断すると、ルームは空になりユーザーレコードは削除される
        // given (前提条件):
        let store = Arc::new(MemoryStore::new());
        let mirror = create_test_mirror(store.clone(), Arc::new(PersistenceHealth::default()));
        let mut user = User::guest(ClientId::generate());
        mirror.publish(MirrorEvent::Connected { user: user.clone() });
        user.rooms.insert("lobby".to_string());
        user.groups.insert("default".to_string());
        let (room, group) = lobby(&[user.id]);
        mirror.publish(MirrorEvent::MembershipChanged {
            user: user.clone(),
            room,
            group,
        });

        // when (操作):
        let mut gone = User::guest(user.id);
        gone.connected = false;
        let (room, group) = lobby(&[]);
        mirror.publish(MirrorEvent::Disconnected {
            user: gone,
            rooms: vec![room],
            groups: vec![group],
        });
        mirror.flush().await;

        // then (期待する結果):
        assert!(store.smembers("room-default-lobby-list").await.unwrap().is_empty());
        assert!(store.smembers("group-default-users").await.unwrap().is_empty());
        assert_eq!(mirror.adapter().get_user(&user.id).await.unwrap(), None);
        assert!(store.keys("user-*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failures_are_recorded() {
        // テスト項目: ストアに到達できないとき、publish は失敗せずヘルスが低下する
        // given (前提条件):
        let store = Arc::new(MemoryStore::new());
        store.set_offline(true);
        let health = Arc::new(PersistenceHealth::new(1));
        let mirror = create_test_mirror(store, health.clone());

        // when (操作):
        mirror.publish(MirrorEvent::Connected {
            user: User::guest(ClientId::generate()),
        });
        mirror.flush().await;

        // then (期待する結果):
        assert!(!health.is_healthy());
        assert_eq!(health.snapshot().total_failures, 1);
    }
}
