//! UseCase: inbound envelope routing
//!
//! The per-connection protocol state machine. Each inbound frame yields
//! exactly one reply for its sender:
//!
//! | Envelope                        | Reply                         |
//! |---------------------------------|-------------------------------|
//! | undecodable                     | 400 `invalid envelope`        |
//! | `time <= 0`                     | 400 `missing or invalid time` |
//! | `msg` to `#room`, room missing  | 404                           |
//! | `msg` to `#room`                | 200, frame fanned out         |
//! | `msg` to unknown id             | 404                           |
//! | `msg` to id                     | 200, frame delivered          |
//! | `join` with a bad room name     | 400 `invalid room name`       |
//! | `join`                          | 200                           |
//! | `leave`/`part`, room missing    | 404                           |
//! | `leave`/`part`, not a member    | 410                           |
//! | `leave`/`part`                  | 200                           |
//! | anything else                   | 400                           |
//!
//! Delivered frames are the raw inbound bytes, unchanged.

use std::sync::Arc;

use agora_shared::time::Clock;
use bytes::Bytes;

use crate::domain::{
    Action, ClientId, ConnectionRegistry, DirectoryError, Envelope, MembershipMirror,
    MirrorEvent, RegistryError, Reply, ResponseCode, RoomDirectory, RoomName, RoomSnapshot,
};

use super::current_user;

/// Router behaviour knobs
#[derive(Debug, Clone)]
pub struct RouterSettings {
    /// Deliver a room broadcast back to its sender when it is a member
    pub include_sender: bool,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            include_sender: true,
        }
    }
}

pub struct RouteEnvelopeUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    directory: Arc<dyn RoomDirectory>,
    mirror: Arc<dyn MembershipMirror>,
    clock: Arc<dyn Clock>,
    settings: RouterSettings,
}

impl RouteEnvelopeUseCase {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        directory: Arc<dyn RoomDirectory>,
        mirror: Arc<dyn MembershipMirror>,
        clock: Arc<dyn Clock>,
        settings: RouterSettings,
    ) -> Self {
        Self {
            registry,
            directory,
            mirror,
            clock,
            settings,
        }
    }

    /// Route one inbound frame from `sender` and return its reply
    pub async fn execute(&self, sender: ClientId, frame: Bytes) -> Reply {
        let now = self.clock.now_unix_seconds();

        let envelope = match Envelope::decode(&frame) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!("Malformed envelope from '{}': {}", sender, e);
                return Reply::error_with(ResponseCode::BadRequest, now, "invalid envelope");
            }
        };

        if !envelope.has_valid_time() {
            tracing::warn!("Envelope from '{}' has time {}", sender, envelope.time);
            return Reply::error_with(ResponseCode::BadRequest, now, "missing or invalid time");
        }

        let code = match envelope.action {
            Action::Msg => self.message(sender, envelope.to.unwrap_or_default(), frame).await,
            Action::Join => {
                match RoomName::new(envelope.room.unwrap_or_default()) {
                    Ok(name) => self.join(sender, &name).await,
                    Err(e) => {
                        tracing::warn!("Join from '{}' rejected: {}", sender, e);
                        return Reply::error_with(
                            ResponseCode::BadRequest,
                            now,
                            "invalid room name",
                        );
                    }
                }
            }
            Action::Leave | Action::Part => {
                self.part(sender, envelope.room.unwrap_or_default()).await
            }
            Action::Unknown => {
                tracing::warn!("Unknown action from '{}'", sender);
                ResponseCode::BadRequest
            }
        };

        match code {
            ResponseCode::Ok | ResponseCode::Info => Reply::alert(code, now),
            _ => Reply::error(code, now),
        }
    }

    async fn message(&self, sender: ClientId, to: String, frame: Bytes) -> ResponseCode {
        if to.starts_with(RoomName::PREFIX) {
            let Ok(name) = RoomName::new(&to) else {
                return ResponseCode::NotFound;
            };
            return match self.directory.get_room(&name).await {
                Some(room) => {
                    self.broadcast(sender, &room, frame).await;
                    ResponseCode::Ok
                }
                None => {
                    tracing::debug!("Message from '{}' to missing room '{}'", sender, name);
                    ResponseCode::NotFound
                }
            };
        }

        let Ok(recipient) = to.parse::<ClientId>() else {
            tracing::debug!("Message from '{}' to invalid id '{}'", sender, to);
            return ResponseCode::NotFound;
        };
        match self.registry.send(&recipient, frame).await {
            Ok(()) => {
                tracing::debug!("Delivered message from '{}' to '{}'", sender, recipient);
                ResponseCode::Ok
            }
            // Best effort: the recipient exists but is lagging.
            Err(RegistryError::QueueFull(_)) => ResponseCode::Ok,
            Err(RegistryError::NotFound(_) | RegistryError::Closed(_)) => ResponseCode::NotFound,
        }
    }

    /// Deliver `frame` to every member of the snapshot. Members that vanished
    /// or lag behind are skipped.
    async fn broadcast(&self, sender: ClientId, room: &RoomSnapshot, frame: Bytes) {
        let mut delivered = 0usize;
        for member in &room.members {
            if *member == sender && !self.settings.include_sender {
                continue;
            }
            match self.registry.send(member, frame.clone()).await {
                Ok(()) => delivered += 1,
                Err(e) => tracing::debug!("Skipping member of '{}': {}", room.name, e),
            }
        }
        tracing::debug!(
            "Broadcast from '{}' to '{}' reached {}/{} member(s)",
            sender,
            room.name,
            delivered,
            room.members.len()
        );
    }

    async fn join(&self, sender: ClientId, name: &RoomName) -> ResponseCode {
        let outcome = self.directory.join(name, sender).await;
        if outcome.newly_joined {
            tracing::info!("Client '{}' joined room '{}'", sender, name);
            self.mirror_membership(sender, &outcome.room).await;
        }
        ResponseCode::Ok
    }

    async fn part(&self, sender: ClientId, raw: String) -> ResponseCode {
        let Ok(name) = RoomName::new(&raw) else {
            return ResponseCode::NotFound;
        };
        match self.directory.part(&name, &sender).await {
            Ok(outcome) => {
                tracing::info!("Client '{}' left room '{}'", sender, name);
                if outcome.collected {
                    tracing::info!("Room '{}' removed after its last member left", name);
                }
                self.mirror_membership(sender, &outcome.room).await;
                ResponseCode::Ok
            }
            Err(DirectoryError::RoomNotFound(_)) => ResponseCode::NotFound,
            Err(DirectoryError::NotAMember(_)) => ResponseCode::Gone,
        }
    }

    async fn mirror_membership(&self, client_id: ClientId, room: &RoomSnapshot) {
        let user = current_user(self.directory.as_ref(), client_id).await;
        let group = self.directory.group(&room.group).await.to_record();
        self.mirror.publish(MirrorEvent::MembershipChanged {
            user,
            room: room.to_record(),
            group,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::{
        domain::MockMembershipMirror,
        infrastructure::{
            directory::InMemoryRoomDirectory,
            registry::{ChannelConnectionRegistry, SlowConsumerPolicy},
        },
    };
    use agora_shared::time::FixedClock;
    use tokio::sync::mpsc;

    const NOW_MILLIS: i64 = 1_700_000_000_000;
    const NOW: i64 = 1_700_000_000;

    struct Harness {
        usecase: RouteEnvelopeUseCase,
        registry: Arc<ChannelConnectionRegistry>,
        directory: Arc<InMemoryRoomDirectory>,
    }

    impl Harness {
        async fn connect(&self, capacity: usize) -> (ClientId, mpsc::Receiver<Bytes>) {
            let (tx, rx) = mpsc::channel(capacity);
            (self.registry.register(tx).await, rx)
        }

        async fn route(&self, sender: ClientId, frame: &str) -> Reply {
            self.usecase
                .execute(sender, Bytes::copy_from_slice(frame.as_bytes()))
                .await
        }
    }

    fn quiet_mirror() -> MockMembershipMirror {
        let mut mirror = MockMembershipMirror::new();
        mirror.expect_publish().return_const(());
        mirror
    }

    fn create_harness_with(
        mirror: MockMembershipMirror,
        settings: RouterSettings,
        policy: SlowConsumerPolicy,
    ) -> Harness {
        let registry = Arc::new(ChannelConnectionRegistry::new(policy));
        let directory = Arc::new(InMemoryRoomDirectory::default());
        let usecase = RouteEnvelopeUseCase::new(
            registry.clone(),
            directory.clone(),
            Arc::new(mirror),
            Arc::new(FixedClock::new(NOW_MILLIS)),
            settings,
        );
        Harness {
            usecase,
            registry,
            directory,
        }
    }

    fn create_harness() -> Harness {
        create_harness_with(
            quiet_mirror(),
            RouterSettings::default(),
            SlowConsumerPolicy::Drop,
        )
    }

    #[tokio::test]
    async fn test_non_positive_time_is_rejected_for_every_action() {
        // テスト項目: time <= 0 のときはアクションに関係なく副作用なしで 400 を返す
        // given (前提条件):
        let harness = create_harness();
        let (alice, _rx) = harness.connect(8).await;
        let frames = [
            r#"{"action":"join","room":"lobby","time":0}"#,
            r##"{"action":"msg","to":"#lobby","time":-5}"##,
            r#"{"action":"part","room":"lobby"}"#,
            r#"{"action":"dance"}"#,
        ];

        // when (操作):
        let mut replies = Vec::new();
        for frame in frames {
            replies.push(harness.route(alice, frame).await);
        }

        // then (期待する結果):
        for reply in replies {
            assert_eq!(
                reply,
                Reply::error_with(ResponseCode::BadRequest, NOW, "missing or invalid time")
            );
        }
        assert!(harness.directory.rooms().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_envelope() {
        // テスト項目: デコードできない入力には 400 を返し、ルーティングは続行する
        // given (前提条件):
        let harness = create_harness();
        let (alice, _rx) = harness.connect(8).await;

        // when (操作):
        let reply = harness.route(alice, "{not json").await;
        let next = harness
            .route(alice, r#"{"action":"join","room":"lobby","time":1}"#)
            .await;

        // then (期待する結果):
        assert_eq!(
            reply,
            Reply::error_with(ResponseCode::BadRequest, NOW, "invalid envelope")
        );
        assert_eq!(next, Reply::alert(ResponseCode::Ok, NOW));
    }

    #[tokio::test]
    async fn test_unknown_action() {
        // テスト項目: 不明なアクションには本文なしの 400 を返す
        // given (前提条件):
        let harness = create_harness();
        let (alice, _rx) = harness.connect(8).await;

        // when (操作):
        let reply = harness.route(alice, r#"{"action":"dance","time":1}"#).await;

        // then (期待する結果):
        assert_eq!(reply, Reply::error(ResponseCode::BadRequest, NOW));
    }

    #[tokio::test]
    async fn test_join_creates_room_with_sender() {
        // テスト項目: 存在しないルームに参加すると、送信者をメンバーとしてルームが作成される
        // given (前提条件):
        let harness = create_harness();
        let (alice, _rx) = harness.connect(8).await;

        // when (操作):
        let reply = harness
            .route(alice, r##"{"action":"join","room":"#lobby","time":1}"##)
            .await;

        // then (期待する結果):
        assert_eq!(reply, Reply::alert(ResponseCode::Ok, NOW));
        let room = harness
            .directory
            .get_room(&RoomName::new("lobby").unwrap())
            .await
            .unwrap();
        assert!(room.is_member(&alice));
    }

    #[tokio::test]
    async fn test_join_with_invalid_room_name() {
        // テスト項目: 有効なルーム名のない join には理由付きの 400 を返す
        // given (前提条件):
        let harness = create_harness();
        let (alice, _rx) = harness.connect(8).await;

        // when (操作):
        let missing = harness.route(alice, r#"{"action":"join","time":1}"#).await;
        let spaced = harness
            .route(alice, r#"{"action":"join","room":"two words","time":1}"#)
            .await;

        // then (期待する結果):
        let expected = Reply::error_with(ResponseCode::BadRequest, NOW, "invalid room name");
        assert_eq!(missing, expected);
        assert_eq!(spaced, expected);
    }

    #[tokio::test]
    async fn test_part_outcomes() {
        // テスト項目: part は存在しないルームに 404、非メンバーに 410、それ以外は 200 を返す
        // given (前提条件):
        let harness = create_harness();
        let (alice, _rx_a) = harness.connect(8).await;
        let (bob, _rx_b) = harness.connect(8).await;
        harness
            .route(alice, r#"{"action":"join","room":"lobby","time":1}"#)
            .await;

        // when (操作):
        let missing = harness
            .route(bob, r#"{"action":"part","room":"attic","time":1}"#)
            .await;
        let stranger = harness
            .route(bob, r#"{"action":"leave","room":"lobby","time":1}"#)
            .await;
        let member = harness
            .route(alice, r#"{"action":"leave","room":"lobby","time":1}"#)
            .await;

        // then (期待する結果):
        assert_eq!(missing, Reply::error(ResponseCode::NotFound, NOW));
        assert_eq!(stranger, Reply::error(ResponseCode::Gone, NOW));
        assert_eq!(member, Reply::alert(ResponseCode::Ok, NOW));
        assert!(harness.directory.rooms_of(&alice).await.is_empty());
    }

    #[tokio::test]
    async fn test_message_to_missing_room() {
        // テスト項目: 作成されていないルームへのメッセージには 404 を返す
        // given (前提条件):
        let harness = create_harness();
        let (alice, _rx) = harness.connect(8).await;

        // when (操作):
        let reply = harness
            .route(alice, r##"{"action":"msg","to":"#nowhere","time":1}"##)
            .await;

        // then (期待する結果):
        assert_eq!(reply, Reply::error(ResponseCode::NotFound, NOW));
    }

    #[tokio::test]
    async fn test_room_broadcast_delivers_raw_frame() {
        // テスト項目: すべてのメンバーが受信したフレームをバイト単位でそのまま受け取る
        // given (前提条件):
        let harness = create_harness();
        let (alice, mut rx_a) = harness.connect(8).await;
        let (bob, mut rx_b) = harness.connect(8).await;
        let (carol, mut rx_c) = harness.connect(8).await;
        for member in [alice, bob] {
            harness
                .route(member, r#"{"action":"join","room":"lobby","time":1}"#)
                .await;
        }
        let frame = r##"{"action":"msg","to":"#lobby","time":2,"text":"hi", "extra":[1,2]}"##;

        // when (操作):
        let reply = harness.route(carol, frame).await;

        // then (期待する結果):
        assert_eq!(reply, Reply::alert(ResponseCode::Ok, NOW));
        assert_eq!(rx_a.try_recv().unwrap(), Bytes::from(frame));
        assert_eq!(rx_b.try_recv().unwrap(), Bytes::from(frame));
        assert!(rx_c.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_sender_inclusion_is_configurable() {
        // テスト項目: 送信者自身へのブロードキャストは、含める設定のときだけ届く
        // given (前提条件):
        let included = create_harness();
        let excluded = create_harness_with(
            quiet_mirror(),
            RouterSettings {
                include_sender: false,
            },
            SlowConsumerPolicy::Drop,
        );
        let frame = r##"{"action":"msg","to":"#lobby","time":2}"##;

        // when (操作):
        let mut received = Vec::new();
        for harness in [&included, &excluded] {
            let (alice, mut rx) = harness.connect(8).await;
            harness
                .route(alice, r#"{"action":"join","room":"lobby","time":1}"#)
                .await;
            harness.route(alice, frame).await;
            received.push(rx.try_recv().is_ok());
        }

        // then (期待する結果):
        assert_eq!(received, vec![true, false]);
    }

    #[tokio::test]
    async fn test_broadcast_skips_vanished_members() {
        // テスト項目: 接続が切れたメンバーがいてもブロードキャストは失敗しない
        // given (前提条件):
        let harness = create_harness();
        let (alice, mut rx_a) = harness.connect(8).await;
        let (bob, rx_b) = harness.connect(8).await;
        for member in [alice, bob] {
            harness
                .route(member, r#"{"action":"join","room":"lobby","time":1}"#)
                .await;
        }
        drop(rx_b);

        // when (操作):
        let reply = harness
            .route(alice, r##"{"action":"msg","to":"#lobby","time":2}"##)
            .await;

        // then (期待する結果):
        assert_eq!(reply, Reply::alert(ResponseCode::Ok, NOW));
        assert!(rx_a.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_direct_message() {
        // テスト項目: ダイレクトメッセージは接続中の ID に届き、それ以外は 404 になる
        // given (前提条件):
        let harness = create_harness();
        let (alice, _rx_a) = harness.connect(8).await;
        let (bob, mut rx_b) = harness.connect(8).await;
        let frame = format!(r#"{{"action":"msg","to":"{bob}","time":3,"text":"psst"}}"#);

        // when (操作):
        let delivered = harness.route(alice, &frame).await;
        let unknown = harness
            .route(
                alice,
                &format!(
                    r#"{{"action":"msg","to":"{}","time":3}}"#,
                    ClientId::generate()
                ),
            )
            .await;
        let garbage = harness
            .route(alice, r#"{"action":"msg","to":"bob","time":3}"#)
            .await;

        // then (期待する結果):
        assert_eq!(delivered, Reply::alert(ResponseCode::Ok, NOW));
        assert_eq!(rx_b.try_recv().unwrap(), Bytes::from(frame));
        assert_eq!(unknown, Reply::error(ResponseCode::NotFound, NOW));
        assert_eq!(garbage, Reply::error(ResponseCode::NotFound, NOW));
    }

    #[tokio::test]
    async fn test_direct_message_to_lagging_client() {
        // テスト項目: 受信者のキューが満杯のときはフレームを破棄するが、送信者には 200 を返す
        // given (前提条件):
        let harness = create_harness();
        let (alice, _rx_a) = harness.connect(8).await;
        let (bob, mut rx_b) = harness.connect(1).await;
        let frame = format!(r#"{{"action":"msg","to":"{bob}","time":3}}"#);
        harness.route(alice, &frame).await;

        // when (操作):
        let reply = harness.route(alice, &frame).await;

        // then (期待する結果):
        assert_eq!(reply, Reply::alert(ResponseCode::Ok, NOW));
        assert!(rx_b.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_membership_changes_are_mirrored() {
        // テスト項目: join と part がルーム・ユーザー・グループをミラーに通知する
        // given (前提条件):
        let events = Arc::new(std::sync::Mutex::new(Vec::new()));
        let recorded = events.clone();
        let mut mirror = MockMembershipMirror::new();
        mirror
            .expect_publish()
            .returning(move |event| recorded.lock().unwrap().push(event));
        let harness = create_harness_with(
            mirror,
            RouterSettings::default(),
            SlowConsumerPolicy::Drop,
        );
        let (alice, _rx) = harness.connect(8).await;

        // when (操作):
        harness
            .route(alice, r#"{"action":"join","room":"lobby","time":1}"#)
            .await;
        harness
            .route(alice, r#"{"action":"join","room":"lobby","time":1}"#)
            .await;
        harness
            .route(alice, r#"{"action":"part","room":"lobby","time":1}"#)
            .await;

        // then (期待する結果):
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        let MirrorEvent::MembershipChanged { user, room, group } = &events[0] else {
            panic!("expected a membership change, got {:?}", events[0]);
        };
        assert_eq!(user.rooms, BTreeSet::from(["lobby".to_string()]));
        assert_eq!(user.groups, BTreeSet::from(["default".to_string()]));
        assert_eq!(room.members, BTreeSet::from([alice]));
        assert_eq!(group.users, BTreeSet::from([alice]));
        let MirrorEvent::MembershipChanged { user, room, group } = &events[1] else {
            panic!("expected a membership change, got {:?}", events[1]);
        };
        assert!(user.rooms.is_empty());
        assert!(room.members.is_empty());
        assert!(group.rooms.is_empty());
    }

    #[tokio::test]
    async fn test_lobby_scenario() {
        // テスト項目: A が #lobby に参加し B がメッセージを送ると、A がフレームを受け取り B は 200 を受け取る
        // given (前提条件):
        let harness = create_harness();
        let (a, mut rx_a) = harness.connect(8).await;
        let (b, _rx_b) = harness.connect(8).await;

        // when (操作):
        let joined = harness
            .route(a, r##"{"action":"join","room":"#lobby","time":1}"##)
            .await;
        let frame = r##"{"action":"msg","to":"#lobby","time":2,"text":"hi"}"##;
        let sent = harness.route(b, frame).await;

        // then (期待する結果):
        assert_eq!(joined, Reply::alert(ResponseCode::Ok, NOW));
        assert_eq!(sent, Reply::alert(ResponseCode::Ok, NOW));
        let received: serde_json::Value =
            serde_json::from_slice(&rx_a.try_recv().unwrap()).unwrap();
        assert_eq!(received["text"], "hi");
    }
}
