// SqliteMessageStore — rusqlite backend implementing MessageStore.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Send.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
//
// Realtime push goes through a broadcast channel: every persisted row is
// sent once, and each subscription filters it through its Scope.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use rusqlite::Connection;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use super::models::{Message, NewMessage, Scope};
use super::traits::MessageStore;

/// How many rows a slow subscriber may fall behind before it skips ahead.
const REALTIME_BUFFER: usize = 256;

pub struct SqliteMessageStore {
    conn: Mutex<Connection>,
    realtime: broadcast::Sender<Message>,
}

impl SqliteMessageStore {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        let (realtime, _) = broadcast::channel(REALTIME_BUFFER);
        Self {
            conn: Mutex::new(conn),
            realtime,
        }
    }

    /// Open (or create) the database file and run migrations.
    pub fn initialize(db_path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create directory for database: {}", db_path)
                })?;
            }
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database at {}", db_path))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        super::schema::create_tables(&conn)?;

        info!(path = db_path, "Message store ready");
        Ok(Self::new(conn))
    }

    /// Open an existing database (fails if it doesn't exist yet).
    pub fn open(db_path: &str) -> Result<Self> {
        if !Path::new(db_path).exists() {
            anyhow::bail!(
                "Database not found at {}. Run `gigglechat init` first.",
                db_path
            );
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database at {}", db_path))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self::new(conn))
    }

    /// In-memory store with the schema applied.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        super::schema::create_tables(&conn)?;
        Ok(Self::new(conn))
    }

    pub async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }
}

#[async_trait]
impl MessageStore for SqliteMessageStore {
    async fn persist(&self, message: NewMessage) -> Result<Message> {
        let stored = {
            let conn = self.conn.lock().await;
            super::queries::insert_message(&conn, &message).context("Failed to store message")?
        };
        // No receivers is fine: nobody is watching right now.
        let _ = self.realtime.send(stored.clone());
        Ok(stored)
    }

    async fn history(&self, scope: &Scope, limit: u32) -> Result<Vec<Message>> {
        let conn = self.conn.lock().await;
        super::queries::get_history(&conn, scope, limit)
    }

    fn subscribe(&self, scope: Scope) -> BoxStream<'static, Message> {
        let receiver = self.realtime.subscribe();
        stream::unfold((receiver, scope), |(mut receiver, scope)| async move {
            loop {
                match receiver.recv().await {
                    Ok(message) if scope.matches(&message) => {
                        return Some((message, (receiver, scope)));
                    }
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Realtime subscriber lagged, skipping messages");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
        .boxed()
    }

    async fn message_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::count_messages(&conn)
    }

    async fn toxic_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::count_toxic_messages(&conn)
    }
}
