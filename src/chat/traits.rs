// Message store trait — backend-agnostic async interface for the chat log.
//
// The store is append-only: rows are written once by the send path and
// never revised, which is what keeps a message's content and is_toxic
// flag consistent with the verdict they came from.

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

use super::models::{Message, NewMessage, Scope};

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append a message; the store assigns `id` and `created_at` and pushes
    /// the row to matching subscribers.
    async fn persist(&self, message: NewMessage) -> Result<Message>;

    /// The most recent `limit` messages in a scope, oldest first.
    async fn history(&self, scope: &Scope, limit: u32) -> Result<Vec<Message>>;

    /// Newly persisted messages matching the scope, from now on.
    fn subscribe(&self, scope: Scope) -> BoxStream<'static, Message>;

    /// Total number of stored messages.
    async fn message_count(&self) -> Result<i64>;

    /// Number of stored messages flagged toxic.
    async fn toxic_count(&self) -> Result<i64>;
}
