//! UseCase: client disconnection
//!
//! Removes the client from the registry and from every room it joined, then
//! mirrors the rooms and groups it left and drops the guest record.

use std::{collections::BTreeSet, sync::Arc};

use crate::domain::{
    ClientId, ConnectionRegistry, MembershipMirror, MirrorEvent, RoomDirectory, RoomName, User,
};

pub struct DisconnectClientUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    directory: Arc<dyn RoomDirectory>,
    mirror: Arc<dyn MembershipMirror>,
}

impl DisconnectClientUseCase {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        directory: Arc<dyn RoomDirectory>,
        mirror: Arc<dyn MembershipMirror>,
    ) -> Self {
        Self {
            registry,
            directory,
            mirror,
        }
    }

    /// Tear the client down. Safe to call for a client the registry already
    /// dropped (slow-consumer disconnect); room cleanup still runs.
    ///
    /// Returns the rooms the client was removed from.
    pub async fn execute(&self, client_id: ClientId) -> Vec<RoomName> {
        if !self.registry.unregister(&client_id).await {
            tracing::debug!("Client '{}' was already unregistered", client_id);
        }

        let parted = self.directory.remove_client(&client_id).await;

        let mut titles = BTreeSet::new();
        let mut rooms = Vec::with_capacity(parted.len());
        let mut left = Vec::with_capacity(parted.len());
        for outcome in parted {
            if outcome.collected {
                tracing::info!("Room '{}' removed after its last member left", outcome.room.name);
            }
            titles.insert(outcome.room.group.clone());
            rooms.push(outcome.room.to_record());
            left.push(outcome.room.name);
        }

        let mut groups = Vec::with_capacity(titles.len());
        for title in titles {
            groups.push(self.directory.group(&title).await.to_record());
        }

        let mut user = User::guest(client_id);
        user.connected = false;
        self.mirror.publish(MirrorEvent::Disconnected {
            user,
            rooms,
            groups,
        });

        tracing::info!("Client '{}' disconnected, left {} room(s)", client_id, left.len());
        left
    }
}
