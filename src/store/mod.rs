mod session;

pub use session::{SessionStore, SqliteSessionStore, DISCONNECT_FLAG_KEY};
