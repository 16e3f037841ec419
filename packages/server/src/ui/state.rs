//! Shared application state.

use std::sync::Arc;

use crate::{
    domain::ConnectionRegistry,
    infrastructure::persistence::PersistenceHealth,
    usecase::{
        ConnectClientUseCase, DisconnectClientUseCase, GetRoomDetailUseCase, GetRoomsUseCase,
        InspectStoreUseCase, RouteEnvelopeUseCase,
    },
};

/// State handed to every handler. Built once per server; connection tasks
/// receive it at creation.
pub struct AppState {
    /// ConnectClientUseCase（クライアント接続のユースケース）
    pub connect_client_usecase: Arc<ConnectClientUseCase>,
    /// DisconnectClientUseCase（クライアント切断のユースケース）
    pub disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    /// RouteEnvelopeUseCase（エンベロープ配送のユースケース）
    pub route_envelope_usecase: Arc<RouteEnvelopeUseCase>,
    /// GetRoomsUseCase（ルーム一覧取得のユースケース）
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// GetRoomDetailUseCase（ルーム詳細取得のユースケース）
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    /// InspectStoreUseCase（永続化ストア参照のユースケース）
    pub inspect_store_usecase: Arc<InspectStoreUseCase>,
    /// Replies to a client's own envelopes go through its registry entry
    pub registry: Arc<dyn ConnectionRegistry>,
    pub health: Arc<PersistenceHealth>,
    /// Capacity of each connection's outbound queue
    pub outbound_queue: usize,
}
