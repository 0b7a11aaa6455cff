//! DTOs for the broadcast and connection listing endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{ConnectionId, Message};
use crate::error::GatewayError;

/// Request body for `POST /api/v1/broadcast`.
///
/// Same shape as the WebSocket wire envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BroadcastRequest {
    /// Message kind, forwarded as the `type` field.
    #[serde(rename = "type")]
    pub kind: String,
    /// Arbitrary JSON payload. Defaults to `null`.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
}

impl BroadcastRequest {
    /// Validates the request and converts it into a wire [`Message`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if `type` is blank.
    pub fn into_message(self) -> Result<Message, GatewayError> {
        if self.kind.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "message type must not be empty".to_string(),
            ));
        }
        Ok(Message::new(self.kind, self.data))
    }
}

/// Response for an accepted broadcast.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BroadcastAccepted {
    /// Always `"queued"`: delivery happens asynchronously.
    pub status: String,
    /// Kind of the queued message.
    #[serde(rename = "type")]
    pub kind: String,
    /// When the manager accepted the message.
    pub accepted_at: DateTime<Utc>,
}

/// Response for `GET /api/v1/connections`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConnectionListResponse {
    /// Number of registered connections.
    pub count: usize,
    /// Ids of the registered connections, unordered.
    pub connection_ids: Vec<ConnectionId>,
}
