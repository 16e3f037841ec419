//! Server construction and execution.

use std::{future::Future, sync::Arc};

use agora_shared::time::{Clock, SystemClock};
use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    config::ServerConfig,
    domain::{ConnectionRegistry, KeyValueStore, MembershipMirror, RoomDirectory},
    infrastructure::{
        directory::InMemoryRoomDirectory,
        persistence::{PersistenceAdapter, PersistenceHealth, StoreMirror},
        registry::ChannelConnectionRegistry,
    },
    usecase::{
        ConnectClientUseCase, DisconnectClientUseCase, GetRoomDetailUseCase, GetRoomsUseCase,
        InspectStoreUseCase, RouteEnvelopeUseCase,
    },
};

use super::{
    handler::{
        delete_stored_user, get_room_detail, get_rooms, get_stored_group, get_stored_room,
        get_stored_user, health_check, websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Presence and messaging server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(ServerConfig::default(), Arc::new(MemoryStore::new()));
/// server.run().await?;
/// ```
pub struct Server {
    config: ServerConfig,
    state: Arc<AppState>,
    mirror: StoreMirror,
}

impl Server {
    /// Wire every layer against `store`. Must be called inside a tokio
    /// runtime; the persistence workers are spawned here.
    pub fn new(config: ServerConfig, store: Arc<dyn KeyValueStore>) -> Self {
        // Initialize dependencies in order:
        // 1. Persistence (health, sync worker, mirror)
        // 2. Registry and Directory
        // 3. UseCases
        // 4. AppState

        // 1. Persistence
        let health = Arc::new(PersistenceHealth::new(config.failure_threshold));
        let (adapter, _sync_handle) =
            PersistenceAdapter::spawn(store, config.persist_queue, health.clone());
        let (mirror, _mirror_handle) =
            StoreMirror::spawn(adapter.clone(), config.persist_queue, health.clone());

        // 2. Registry and Directory (in-memory, authoritative for routing)
        let registry: Arc<dyn ConnectionRegistry> =
            Arc::new(ChannelConnectionRegistry::new(config.slow_consumer));
        let directory: Arc<dyn RoomDirectory> =
            Arc::new(InMemoryRoomDirectory::new(config.directory.clone()));
        let membership: Arc<dyn MembershipMirror> = Arc::new(mirror.clone());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        // 3. UseCases
        let state = Arc::new(AppState {
            connect_client_usecase: Arc::new(ConnectClientUseCase::new(
                registry.clone(),
                membership.clone(),
                clock.clone(),
            )),
            disconnect_client_usecase: Arc::new(DisconnectClientUseCase::new(
                registry.clone(),
                directory.clone(),
                membership.clone(),
            )),
            route_envelope_usecase: Arc::new(RouteEnvelopeUseCase::new(
                registry.clone(),
                directory.clone(),
                membership,
                clock,
                config.router.clone(),
            )),
            get_rooms_usecase: Arc::new(GetRoomsUseCase::new(directory.clone())),
            get_room_detail_usecase: Arc::new(GetRoomDetailUseCase::new(
                directory,
                registry.clone(),
            )),
            inspect_store_usecase: Arc::new(InspectStoreUseCase::new(Arc::new(adapter))),
            // 4. AppState
            registry,
            health,
            outbound_queue: config.outbound_queue,
        });

        Self {
            config,
            state,
            mirror,
        }
    }

    /// The HTTP application
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{room}", get(get_room_detail))
            .route(
                "/api/store/users/{id}",
                get(get_stored_user).delete(delete_stored_user),
            )
            .route("/api/store/rooms/{group}/{room}", get(get_stored_room))
            .route("/api/store/groups/{group}", get(get_stored_group))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind to the configured address and serve until Ctrl+C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the configured address
    /// or if there's an error during server execution.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = self.config.bind_addr();
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Agora server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves, then
    /// flush pending membership writes.
    pub async fn serve<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), Box<dyn std::error::Error>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Flushing pending membership writes");
        self.mirror.flush().await;
        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
