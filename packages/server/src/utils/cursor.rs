use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Keyset position within the feed's `(created_at DESC, id DESC)` order.
///
/// Encoded as URL-safe base64 over a small JSON payload and handed to
/// clients as an opaque token; the next page continues strictly after this
/// position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedCursor {
    /// Milliseconds since the Unix epoch of the last row on the page.
    pub created_at: i64,
    /// Id of the last row on the page; breaks ties within one millisecond.
    pub id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum CursorError {
    #[error("not valid base64")]
    Encoding(#[from] base64::DecodeError),
    #[error("malformed payload")]
    Payload(#[from] serde_json::Error),
}

impl FeedCursor {
    pub fn encode(&self) -> String {
        let payload = serde_json::json!({
            "created_at": self.created_at,
            "id": self.id,
        });
        URL_SAFE_NO_PAD.encode(payload.to_string())
    }

    pub fn decode(token: &str) -> Result<Self, CursorError> {
        let bytes = URL_SAFE_NO_PAD.decode(token)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
