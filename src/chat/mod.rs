// Chat layer — message model, SQLite message store, realtime subscriptions,
// and the moderated send path.
//
// We use rusqlite with the "bundled" feature so there's no system SQLite
// dependency. The database file lives wherever GIGGLE_DB_PATH points
// (defaults to ./gigglechat.db).

pub mod models;
pub mod queries;
pub mod schema;
pub mod send;
pub mod sqlite;
pub mod timeline;
pub mod traits;

pub use models::{Body, Draft, Message, NewMessage, Rendered, Scope};
pub use send::{Messenger, SendOutcome};
pub use sqlite::SqliteMessageStore;
pub use timeline::Timeline;
pub use traits::MessageStore;
