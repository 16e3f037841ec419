//! UseCase: client connection
//!
//! Registers the connection, mirrors the new guest user and builds the
//! greeting the client receives before anything else.

use std::sync::Arc;

use agora_shared::time::Clock;

use crate::domain::{
    ClientId, ConnectionRegistry, MembershipMirror, MirrorEvent, OutboundChannel, Reply,
    ResponseCode, User,
};

/// A freshly registered client and the replies that greet it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedClient {
    pub client_id: ClientId,
    pub greeting: Vec<Reply>,
}

pub struct ConnectClientUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    mirror: Arc<dyn MembershipMirror>,
    clock: Arc<dyn Clock>,
}

impl ConnectClientUseCase {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        mirror: Arc<dyn MembershipMirror>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            mirror,
            clock,
        }
    }

    /// Register `channel` under a newly generated id
    pub async fn execute(&self, channel: OutboundChannel) -> ConnectedClient {
        let client_id = self.registry.register(channel).await;
        tracing::info!("Client '{}' connected", client_id);

        self.mirror.publish(MirrorEvent::Connected {
            user: User::guest(client_id),
        });

        let now = self.clock.now_unix_seconds();
        ConnectedClient {
            client_id,
            greeting: vec![
                Reply::alert(ResponseCode::Ok, now),
                Reply::alert_with(
                    ResponseCode::Info,
                    now,
                    format!("Connected with ID {client_id}"),
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::MockMembershipMirror, infrastructure::registry::ChannelConnectionRegistry,
    };
    use agora_shared::time::FixedClock;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_connect_registers_and_greets() {
        // テスト項目: 新しい接続が登録・ミラーされ、挨拶が返される
        // given (前提条件):
        let registry = Arc::new(ChannelConnectionRegistry::default());
        let mut mirror = MockMembershipMirror::new();
        mirror
            .expect_publish()
            .withf(|event| {
                matches!(event, MirrorEvent::Connected { user } if user.connected && user.rooms.is_empty())
            })
            .times(1)
            .return_const(());
        let usecase = ConnectClientUseCase::new(
            registry.clone(),
            Arc::new(mirror),
            Arc::new(FixedClock::new(1_700_000_000_000)),
        );
        let (tx, _rx) = mpsc::channel(4);

        // when (操作):
        let connected = usecase.execute(tx).await;

        // then (期待する結果):
        assert!(registry.lookup(&connected.client_id).await.is_some());
        assert_eq!(
            connected.greeting,
            vec![
                Reply::alert(ResponseCode::Ok, 1_700_000_000),
                Reply::alert_with(
                    ResponseCode::Info,
                    1_700_000_000,
                    format!("Connected with ID {}", connected.client_id)
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_each_connection_gets_a_distinct_id() {
        // テスト項目: 2 つの接続が同じ ID を共有しない
        // given (前提条件):
        let registry = Arc::new(ChannelConnectionRegistry::default());
        let mut mirror = MockMembershipMirror::new();
        mirror.expect_publish().times(2).return_const(());
        let usecase = ConnectClientUseCase::new(
            registry.clone(),
            Arc::new(mirror),
            Arc::new(FixedClock::new(0)),
        );

        // when (操作):
        let (tx1, _rx1) = mpsc::channel(1);
        let (tx2, _rx2) = mpsc::channel(1);
        let first = usecase.execute(tx1).await;
        let second = usecase.execute(tx2).await;

        // then (期待する結果):
        assert_ne!(first.client_id, second.client_id);
        assert_eq!(registry.count().await, 2);
    }
}
