//! `PartyhallServer` builder and server loop.
//!
//! This is the entry point for running a Partyhall server. It wires the
//! WebSocket transport to the coordinator and serves the operational HTTP
//! listener next to it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use partyhall_protocol::{Codec, JsonCodec};
use partyhall_room::RoomRegistry;
use partyhall_session::{Authenticator, ConnectionRegistry};
use partyhall_transport::{Transport, WebSocketTransport};
use tokio::net::TcpListener;

use crate::admin::{self, AdminState};
use crate::handler::handle_connection;
use crate::{PartyhallError, ServerConfig, SessionCoordinator};

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<A: Authenticator, C: Codec> {
    pub(crate) coordinator: Arc<SessionCoordinator>,
    pub(crate) auth: A,
    pub(crate) codec: C,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting a Partyhall server.
///
/// # Example
///
/// ```rust,no_run
/// use partyhall::prelude::*;
///
/// # async fn run() -> Result<(), PartyhallError> {
/// let server = PartyhallServer::<GuestAuthenticator, _>::builder()
///     .bind("0.0.0.0:3001")
///     .admin_bind("127.0.0.1:3002")
///     .build(GuestAuthenticator)
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct PartyhallServerBuilder {
    config: ServerConfig,
}

impl PartyhallServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the address of the game WebSocket listener.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the address of the operational HTTP listener.
    pub fn admin_bind(mut self, addr: &str) -> Self {
        self.config.admin_bind_addr = Some(addr.to_string());
        self
    }

    /// Runs without the operational HTTP listener.
    pub fn no_admin(mut self) -> Self {
        self.config.admin_bind_addr = None;
        self
    }

    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Requires `Authorization: Bearer <token>` on `POST /reset`.
    pub fn admin_token(mut self, token: impl Into<String>) -> Self {
        self.config.admin_token = Some(token.into());
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds both listeners and builds the server with the given
    /// authenticator and the JSON codec.
    ///
    /// # Errors
    /// `Transport` if the game listener can't bind, `Admin` if the HTTP
    /// listener can't.
    pub async fn build<A: Authenticator>(
        self,
        auth: A,
    ) -> Result<PartyhallServer<A, JsonCodec>, PartyhallError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;
        let admin = match &self.config.admin_bind_addr {
            Some(addr) => Some(TcpListener::bind(addr).await.map_err(PartyhallError::Admin)?),
            None => None,
        };

        let coordinator = Arc::new(SessionCoordinator::new(
            RoomRegistry::new(),
            ConnectionRegistry::new(),
            self.config.seed,
        ));
        let state = Arc::new(ServerState {
            coordinator,
            auth,
            codec: JsonCodec,
            config: self.config,
        });

        Ok(PartyhallServer {
            transport,
            admin,
            state,
        })
    }
}

/// A bound Partyhall server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct PartyhallServer<A: Authenticator, C: Codec> {
    transport: WebSocketTransport,
    admin: Option<TcpListener>,
    state: Arc<ServerState<A, C>>,
}

impl<A: Authenticator> PartyhallServer<A, JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> PartyhallServerBuilder {
        PartyhallServerBuilder::new()
    }
}

impl<A, C> PartyhallServer<A, C>
where
    A: Authenticator,
    C: Codec,
{
    /// Returns the address the game listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns the address the HTTP listener is bound to, if enabled.
    pub fn admin_addr(&self) -> Option<SocketAddr> {
        self.admin.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// The coordinator every connection talks to.
    pub fn coordinator(&self) -> Arc<SessionCoordinator> {
        Arc::clone(&self.state.coordinator)
    }

    /// Runs the server.
    ///
    /// Spawns the HTTP listener, then accepts game connections and spawns a
    /// handler task for each. Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), PartyhallError> {
        if let Some(listener) = self.admin.take() {
            let router = admin::router(AdminState {
                coordinator: Arc::clone(&self.state.coordinator),
                token: self.state.config.admin_token.clone(),
            });
            tracing::info!(addr = ?listener.local_addr().ok(), "admin listener running");
            tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, router).await {
                    tracing::error!(error = %e, "admin listener stopped");
                }
            });
        }

        tracing::info!(addr = ?self.local_addr().ok(), "Partyhall server running");
        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
