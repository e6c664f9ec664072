use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::{error::Result, models::lobby::User};

const AUTH_TOKEN_KEY: &str = "auth_token";
const PROFILE_KEY: &str = "user_profile";

/// Device key-value storage. Holds the auth token and the user profile, nothing else.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        info!("Opened local storage at {}", path.as_ref().display());
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )?;
        Ok(Storage { conn })
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        debug!("Storing key {}", key);
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    pub fn auth_token(&self) -> Result<Option<String>> {
        self.get(AUTH_TOKEN_KEY)
    }

    pub fn save_auth_token(&self, token: &str) -> Result<()> {
        self.set(AUTH_TOKEN_KEY, token)
    }

    pub fn profile(&self) -> Result<Option<User>> {
        match self.get(PROFILE_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn save_profile(&self, user: &User) -> Result<()> {
        self.set(PROFILE_KEY, &serde_json::to_string(user)?)
    }

    /// Forgets the signed-in identity.
    pub fn clear_identity(&self) -> Result<()> {
        self.remove(AUTH_TOKEN_KEY)?;
        self.remove(PROFILE_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_token_and_profile() {
        let storage = Storage::open_in_memory().unwrap();
        assert_eq!(storage.auth_token().unwrap(), None);
        assert_eq!(storage.profile().unwrap(), None);

        let user = User {
            id: "u-1".to_string(),
            nickname: "ann".to_string(),
        };
        storage.save_auth_token("tok").unwrap();
        storage.save_profile(&user).unwrap();

        assert_eq!(storage.auth_token().unwrap().as_deref(), Some("tok"));
        assert_eq!(storage.profile().unwrap(), Some(user));
    }

    #[test]
    fn set_overwrites_previous_value() {
        let storage = Storage::open_in_memory().unwrap();
        storage.set("k", "one").unwrap();
        storage.set("k", "two").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn clear_identity_removes_both_entries() {
        let storage = Storage::open_in_memory().unwrap();
        storage.save_auth_token("tok").unwrap();
        storage
            .save_profile(&User {
                id: "u-1".to_string(),
                nickname: "ann".to_string(),
            })
            .unwrap();

        storage.clear_identity().unwrap();
        assert_eq!(storage.auth_token().unwrap(), None);
        assert_eq!(storage.profile().unwrap(), None);
    }

    #[test]
    fn corrupt_profile_is_an_error() {
        let storage = Storage::open_in_memory().unwrap();
        storage.set(PROFILE_KEY, "{not json").unwrap();
        assert!(storage.profile().is_err());
    }
}
