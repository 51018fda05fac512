// Message queries — every SQL statement against the chat log lives here.

use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};

use super::models::{Message, NewMessage, Scope};

const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, content, is_toxic, created_at";

/// Insert a message and return the stored row.
pub fn insert_message(conn: &Connection, message: &NewMessage) -> Result<Message> {
    // Millisecond precision keeps ordering stable for rapid sends.
    let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    conn.execute(
        "INSERT INTO messages (sender_id, receiver_id, content, is_toxic, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            message.sender_id,
            message.receiver_id,
            message.content,
            message.is_toxic,
            created_at,
        ],
    )?;

    Ok(Message {
        id: conn.last_insert_rowid(),
        sender_id: message.sender_id.clone(),
        receiver_id: message.receiver_id.clone(),
        content: message.content.clone(),
        is_toxic: message.is_toxic,
        created_at,
    })
}

/// The most recent `limit` messages in a scope, returned oldest first.
pub fn get_history(conn: &Connection, scope: &Scope, limit: u32) -> Result<Vec<Message>> {
    let mut messages = match scope {
        Scope::Global => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE receiver_id IS NULL
                 ORDER BY id DESC LIMIT ?1"
            ))?;
            let rows = stmt.query_map(params![limit], row_to_message)?;
            let messages = rows.collect::<rusqlite::Result<Vec<_>>>()?;
            messages
        }
        Scope::Direct { me, peer } => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE (sender_id = ?1 AND receiver_id = ?2)
                    OR (sender_id = ?2 AND receiver_id = ?1)
                 ORDER BY id DESC LIMIT ?3"
            ))?;
            let rows = stmt.query_map(params![me, peer, limit], row_to_message)?;
            let messages = rows.collect::<rusqlite::Result<Vec<_>>>()?;
            messages
        }
    };
    messages.reverse();
    Ok(messages)
}

pub fn count_messages(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
    Ok(count)
}

pub fn count_toxic_messages(conn: &Connection) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM messages WHERE is_toxic = 1",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn row_to_message(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        content: row.get(3)?,
        is_toxic: row.get(4)?,
        created_at: row.get(5)?,
    })
}
