//! UseCase: store inspection
//!
//! Read path over what the mirror persisted, plus the one administrative
//! delete. Nothing here touches live routing state.

use std::sync::Arc;

use crate::domain::{ClientId, EntityStore, ResolvedGroup, ResolvedRoom, User};

use super::error::InspectStoreError;

pub struct InspectStoreUseCase {
    store: Arc<dyn EntityStore>,
}

impl InspectStoreUseCase {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub async fn get_user(&self, raw_id: &str) -> Result<User, InspectStoreError> {
        let id = parse_id(raw_id)?;
        self.store
            .get_user(&id)
            .await?
            .ok_or_else(|| InspectStoreError::UserNotFound(raw_id.to_string()))
    }

    /// Delete a stored user and return the record that was removed.
    ///
    /// Rooms and groups listing the user are not rewritten.
    pub async fn delete_user(&self, raw_id: &str) -> Result<User, InspectStoreError> {
        let user = self.get_user(raw_id).await?;
        self.store.delete_user(&user).await?;
        tracing::info!("Deleted stored user '{}'", user.id);
        Ok(user)
    }

    pub async fn get_room(&self, group: &str, title: &str) -> Result<ResolvedRoom, InspectStoreError> {
        self.store
            .get_room(group, title)
            .await?
            .ok_or_else(|| InspectStoreError::RoomNotFound(format!("{group}/{title}")))
    }

    /// A group that was never written resolves to an empty group
    pub async fn get_group(&self, title: &str) -> Result<ResolvedGroup, InspectStoreError> {
        Ok(self.store.get_group(title).await?)
    }
}

fn parse_id(raw_id: &str) -> Result<ClientId, InspectStoreError> {
    raw_id
        .parse()
        .map_err(|_| InspectStoreError::InvalidClientId(raw_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::StoreError,
        infrastructure::{
            persistence::{PersistenceAdapter, PersistenceHealth},
            store::MemoryStore,
        },
    };

    fn create_test_usecase() -> (InspectStoreUseCase, PersistenceAdapter, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let (adapter, _handle) =
            PersistenceAdapter::spawn(store.clone(), 16, Arc::new(PersistenceHealth::default()));
        (
            InspectStoreUseCase::new(Arc::new(adapter.clone())),
            adapter,
            store,
        )
    }

    #[tokio::test]
    async fn test_get_and_delete_user() {
        // テスト項目: 保存されたユーザーを読み取り、その後削除できる
        // given (前提条件):
        let (usecase, adapter, _store) = create_test_usecase();
        let user = User::guest(ClientId::generate());
        adapter.write_user(&user).await.unwrap();
        adapter.flush().await;
        let id = user.id.to_string();

        // when (操作):
        let loaded = usecase.get_user(&id).await.unwrap();
        let deleted = usecase.delete_user(&id).await.unwrap();
        let after = usecase.get_user(&id).await;

        // then (期待する結果):
        assert_eq!(loaded, user);
        assert_eq!(deleted, user);
        assert_eq!(after, Err(InspectStoreError::UserNotFound(id)));
    }

    #[tokio::test]
    async fn test_invalid_id() {
        // テスト項目: UUID でない ID はストアに触れる前に拒否される
        // given (前提条件):
        let (usecase, _adapter, _store) = create_test_usecase();

        // when (操作):
        let result = usecase.get_user("alice").await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(InspectStoreError::InvalidClientId("alice".to_string()))
        );
    }

    #[tokio::test]
    async fn test_missing_room() {
        // テスト項目: 未知のルームは見つからないと報告される
        // given (前提条件):
        let (usecase, _adapter, _store) = create_test_usecase();

        // when (操作):
        let result = usecase.get_room("default", "lobby").await;

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            InspectStoreError::RoomNotFound("default/lobby".to_string())
        );
    }

    #[tokio::test]
    async fn test_store_outage_surfaces() {
        // テスト項目: ストアの失敗はストアエラーとして呼び出し元に届く
        // given (前提条件):
        let (usecase, _adapter, store) = create_test_usecase();
        store.set_offline(true);

        // when (操作):
        let result = usecase.get_group("default").await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(InspectStoreError::Store(StoreError::Unavailable(_)))
        ));
    }
}
