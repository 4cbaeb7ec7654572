use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::fs;
use tracing::error;

use crate::models::Profile;

pub const TOKEN: &str = "token";
pub const USER_DATA: &str = "user_data";
pub const CURRENT_USER_ID: &str = "current_user_id";
pub const SEARCHED_USER_ID: &str = "searched_user_id";

/// String key-value store persisted as a JSON object.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl SessionStore {
    /// A missing file is an empty session; an unreadable one is logged and
    /// treated the same way.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(entries) => entries,
                Err(err) => {
                    error!("failed to parse session file {}: {err}", path.display());
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                error!("failed to read session file {}: {err}", path.display());
                BTreeMap::new()
            }
        };
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn token(&self) -> Option<&str> {
        self.get(TOKEN).filter(|token| !token.is_empty())
    }

    pub fn profile(&self) -> Option<Profile> {
        let raw = self.get(USER_DATA)?;
        match serde_json::from_str(raw) {
            Ok(profile) => Some(profile),
            Err(err) => {
                error!("ignoring unreadable cached profile: {err}");
                None
            }
        }
    }

    pub fn current_user_id(&self) -> Option<i64> {
        self.get(CURRENT_USER_ID)?.parse().ok()
    }

    pub fn searched_user_id(&self) -> Option<i64> {
        self.get(SEARCHED_USER_ID)?.parse().ok()
    }

    pub fn store_login(&mut self, token: &str, profile: &Profile) -> anyhow::Result<()> {
        self.set(TOKEN, token);
        self.set(USER_DATA, serde_json::to_string(profile)?);
        self.set(CURRENT_USER_ID, profile.id.to_string());
        self.remove(SEARCHED_USER_ID);
        Ok(())
    }

    pub async fn persist(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let payload = serde_json::to_vec_pretty(&self.entries)?;
        fs::write(&self.path, payload)
            .await
            .with_context(|| format!("failed to write session file {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Profile {
        serde_json::from_value(serde_json::json!({
            "id": 4242,
            "login": "avery",
            "firstName": "Avery",
            "lastName": "Lee",
            "attrs": {}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn missing_file_is_an_empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::load(dir.path().join("session.json")).await;

        assert!(store.is_empty());
        assert!(store.token().is_none());
        assert!(store.current_user_id().is_none());
    }

    #[tokio::test]
    async fn login_round_trips_through_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let mut store = SessionStore::load(&path).await;
        store.set(SEARCHED_USER_ID, "7");
        store.store_login("abc.def.ghi", &profile()).unwrap();
        store.persist().await.unwrap();

        let reloaded = SessionStore::load(&path).await;
        assert_eq!(reloaded.token(), Some("abc.def.ghi"));
        assert_eq!(reloaded.current_user_id(), Some(4242));
        assert_eq!(reloaded.searched_user_id(), None);
        assert_eq!(reloaded.profile().unwrap().login, "avery");
    }

    #[tokio::test]
    async fn clear_wipes_every_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut store = SessionStore::load(&path).await;
        store.store_login("token", &profile()).unwrap();
        store.set(SEARCHED_USER_ID, "9");
        store.clear();
        store.persist().await.unwrap();

        let reloaded = SessionStore::load(&path).await;
        assert!(reloaded.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"not json").unwrap();

        let store = SessionStore::load(&path).await;
        assert!(store.is_empty());
    }
}
