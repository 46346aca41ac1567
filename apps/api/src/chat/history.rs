use redis::AsyncCommands;
use uuid::Uuid;

use crate::llm_client::ChatMessage;

/// Messages kept per session; older ones are trimmed on every append.
pub const MAX_HISTORY: isize = 20;

/// Per-session chat transcript stored as a Redis list of JSON messages.
#[derive(Clone)]
pub struct ChatHistory {
    client: redis::Client,
    ttl_secs: u64,
}

fn session_key(session_id: Uuid) -> String {
    format!("astra:chat:{session_id}")
}

impl ChatHistory {
    pub fn new(client: redis::Client, ttl_secs: u64) -> Self {
        Self { client, ttl_secs }
    }

    pub async fn load(&self, session_id: Uuid) -> redis::RedisResult<Vec<ChatMessage>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Vec<String> = conn.lrange(session_key(session_id), 0, -1).await?;
        Ok(decode(raw))
    }

    /// Appends messages, trims to the last `MAX_HISTORY` and refreshes the TTL.
    pub async fn append(&self, session_id: Uuid, messages: &[ChatMessage]) -> redis::RedisResult<()> {
        let encoded: Vec<String> = messages
            .iter()
            .filter_map(|m| serde_json::to_string(m).ok())
            .collect();
        if encoded.is_empty() {
            return Ok(());
        }

        let key = session_key(session_id);
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::pipe()
            .atomic()
            .rpush(&key, encoded)
            .ignore()
            .ltrim(&key, -MAX_HISTORY, -1)
            .ignore()
            .expire(&key, self.ttl_secs as i64)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await
    }
}

/// Entries that no longer parse are skipped.
fn decode(raw: Vec<String>) -> Vec<ChatMessage> {
    raw.iter()
        .filter_map(|entry| serde_json::from_str(entry).ok())
        .collect()
}
