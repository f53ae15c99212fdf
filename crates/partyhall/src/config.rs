//! Server configuration.

use std::time::Duration;

/// Everything the server needs to know before it starts.
///
/// Build one with [`PartyhallServerBuilder`](crate::PartyhallServerBuilder)
/// or start from `ServerConfig::default()` and override fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Where the game WebSocket listener binds.
    pub bind_addr: String,

    /// Where the operational HTTP listener binds. `None` disables it.
    pub admin_bind_addr: Option<String>,

    /// How long a new connection has to send its `hello` frame.
    pub handshake_timeout: Duration,

    /// A connection that sends nothing for this long is dropped, which
    /// counts as a disconnect.
    pub idle_timeout: Duration,

    /// Bearer token required by `POST /reset`. `None` leaves it open.
    pub admin_token: Option<String>,

    /// Seeds the coordinator's random source so runs can be replayed.
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3001".to_string(),
            admin_bind_addr: Some("127.0.0.1:3002".to_string()),
            handshake_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            admin_token: None,
            seed: None,
        }
    }
}
