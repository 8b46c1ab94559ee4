//! Client configuration.

use parlor_core::{ConnectionConfig, SendPolicy};

/// REST base of the forum backend.
pub const DEFAULT_API_BASE: &str = "http://localhost:8080/api";

/// Realtime endpoint of the forum backend.
pub const DEFAULT_SOCKET_URL: &str = "ws://localhost:8080/api/ws";

/// Where the backend lives and how to authenticate against it.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST base URL, without a trailing slash.
    pub api_base: String,
    /// Websocket URL.
    pub socket_url: String,
    /// Session credential, sent as the `session_token` cookie. Opaque.
    pub session_token: Option<String>,
    /// Per-view connection settings.
    pub connection: ConnectionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            socket_url: DEFAULT_SOCKET_URL.to_string(),
            session_token: None,
            connection: ConnectionConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Use this session credential.
    #[must_use]
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Use this send policy for intents submitted while connecting.
    #[must_use]
    pub fn with_send_policy(mut self, policy: SendPolicy) -> Self {
        self.connection.send_policy = policy;
        self
    }

    /// Value of the `Cookie` header, if a session token is set.
    pub fn cookie(&self) -> Option<String> {
        self.session_token.as_deref().map(session_cookie)
    }
}

pub(crate) fn session_cookie(token: &str) -> String {
    format!("session_token={token}")
}
