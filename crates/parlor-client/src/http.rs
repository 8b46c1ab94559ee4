//! REST room directory over HTTP.
//!
//! Every call carries the session cookie. Non-2xx responses become
//! [`DirectoryError::Status`] with the server's `message` when it sent one.
//! Transport failures become [`DirectoryError::Network`]; bodies that do not
//! parse become [`DirectoryError::InvalidResponse`].

use async_trait::async_trait;
use parlor_core::{DirectoryError, RoomDirectory};
use parlor_proto::{
    ChatMessage, RoomHash, User, UserId,
    api::{ChatHistory, ChatInfo, ChatList, CreateChatRequest, Envelope, UserList},
};
use reqwest::{Method, RequestBuilder, Response, header::COOKIE};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::ClientConfig;

/// [`RoomDirectory`] backed by the forum's REST API.
#[derive(Debug, Clone)]
pub struct HttpDirectory {
    http: reqwest::Client,
    api_base: String,
    cookie: Option<String>,
}

impl HttpDirectory {
    /// Directory for the backend described by `config`.
    ///
    /// # Errors
    ///
    /// - `DirectoryError::Network` if the HTTP client cannot be built
    pub fn new(config: &ClientConfig) -> Result<Self, DirectoryError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| DirectoryError::Network(format!("http client: {e}")))?;

        Ok(Self::with_client(http, config))
    }

    /// Directory using an existing HTTP client.
    pub fn with_client(http: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            cookie: config.cookie(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{path}", self.api_base));
        match &self.cookie {
            Some(cookie) => builder.header(COOKIE, cookie),
            None => builder,
        }
    }

    /// Send the request and return the body of a 2xx response.
    async fn execute(&self, builder: RequestBuilder) -> Result<String, DirectoryError> {
        let response = builder.send().await.map_err(|e| DirectoryError::Network(e.to_string()))?;
        read_body(response).await
    }

    /// Send the request and unwrap the response envelope's payload.
    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, DirectoryError> {
        let body = self.execute(builder).await?;
        let envelope: Envelope<T> = serde_json::from_str(&body)
            .map_err(|e| DirectoryError::InvalidResponse(e.to_string()))?;

        envelope
            .payload
            .ok_or_else(|| DirectoryError::InvalidResponse("response has no payload".to_string()))
    }
}

async fn read_body(response: Response) -> Result<String, DirectoryError> {
    let status = response.status();
    let body = response.text().await.map_err(|e| DirectoryError::Network(e.to_string()))?;

    if status.is_success() {
        return Ok(body);
    }

    let message = serde_json::from_str::<Envelope<Value>>(&body)
        .ok()
        .map(|env| env.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown status").to_string());

    tracing::debug!(status = status.as_u16(), %message, "directory call rejected");
    Err(DirectoryError::Status { status: status.as_u16(), message })
}

/// Extract the new room hash from a create response.
///
/// The hash normally sits in `payload.chatHash`; some deployments return it
/// at the top level.
fn created_hash(body: &str) -> Result<RoomHash, DirectoryError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| DirectoryError::InvalidResponse(e.to_string()))?;

    value
        .get("payload")
        .and_then(|p| p.get("chatHash"))
        .or_else(|| value.get("chatHash"))
        .and_then(Value::as_str)
        .map(RoomHash::new)
        .ok_or_else(|| DirectoryError::InvalidResponse("response has no chatHash".to_string()))
}

#[async_trait]
impl RoomDirectory for HttpDirectory {
    async fn list_rooms(&self) -> Result<Vec<ChatInfo>, DirectoryError> {
        let list: ChatList = self.fetch(self.request(Method::GET, "/chats")).await?;
        Ok(list.into_chats())
    }

    async fn create_room(&self, user1: UserId, user2: UserId) -> Result<RoomHash, DirectoryError> {
        let request = CreateChatRequest { user1_id: user1, user2_id: user2 };
        let body = self.execute(self.request(Method::POST, "/chats").json(&request)).await?;
        created_hash(&body)
    }

    async fn history(&self, room_hash: &RoomHash) -> Result<Vec<ChatMessage>, DirectoryError> {
        let path = format!("/chats/{room_hash}");
        let history: ChatHistory = self.fetch(self.request(Method::GET, &path)).await?;
        Ok(history.into_messages())
    }

    async fn list_users(&self) -> Result<Vec<User>, DirectoryError> {
        let list: UserList = self.fetch(self.request(Method::GET, "/users")).await?;
        Ok(list.into_users())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_hash_prefers_payload() {
        let body = r#"{"status":"Created","payload":{"chatHash":"h1"},"chatHash":"ignored"}"#;
        assert_eq!(created_hash(body).unwrap().as_str(), "h1");
    }

    #[test]
    fn created_hash_falls_back_to_top_level() {
        assert_eq!(created_hash(r#"{"chatHash":"h2"}"#).unwrap().as_str(), "h2");
    }

    #[test]
    fn created_hash_missing_is_invalid() {
        assert!(matches!(
            created_hash(r#"{"status":"Created","payload":{}}"#),
            Err(DirectoryError::InvalidResponse(_))
        ));
        assert!(matches!(created_hash("<html>"), Err(DirectoryError::InvalidResponse(_))));
    }
}
