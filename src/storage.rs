use crate::errors::StoreError;
use crate::models::UserRecord;
use async_trait::async_trait;
use serde_json::Value;
use std::{collections::BTreeMap, env, path::Path, path::PathBuf};
use tokio::{fs, sync::Mutex};
use tracing::error;

pub const TOKEN_KEY: &str = "clearnext_token";
pub const USER_ID_KEY: &str = "clearnext_user_id";
pub const USER_KEY: &str = "clearnext_user";

/// Key/value persistence for the client's profile state.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
    async fn clear(&self, key: &str) -> Result<(), StoreError>;
}

/// Whole-map JSON file; every write rewrites the file.
pub struct FileProfileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, Value>>,
}

impl FileProfileStore {
    pub async fn open(path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let entries = load_entries(&path).await;
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ProfileStore for FileProfileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), value);
        persist_entries(&self.path, &entries).await
    }

    async fn clear(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        if entries.remove(key).is_some() {
            persist_entries(&self.path, &entries).await?;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryProfileStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

pub fn resolve_data_path() -> PathBuf {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return PathBuf::from(path);
    }

    PathBuf::from("data/state.json")
}

async fn load_entries(path: &Path) -> BTreeMap<String, Value> {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(entries) => entries,
            Err(err) => {
                error!("failed to parse profile store: {err}");
                BTreeMap::new()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
        Err(err) => {
            error!("failed to read profile store: {err}");
            BTreeMap::new()
        }
    }
}

async fn persist_entries(path: &Path, entries: &BTreeMap<String, Value>) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(entries)?;
    fs::write(path, payload).await?;
    Ok(())
}

/// Bearer token and user id, both present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: String,
}

pub async fn load_session(store: &dyn ProfileStore) -> Result<Option<Session>, StoreError> {
    let token = read_string(store, TOKEN_KEY).await?;
    let user_id = read_string(store, USER_ID_KEY).await?;
    Ok(match (token, user_id) {
        (Some(token), Some(user_id)) => Some(Session { token, user_id }),
        _ => None,
    })
}

pub async fn save_session(store: &dyn ProfileStore, session: &Session) -> Result<(), StoreError> {
    store.set(TOKEN_KEY, Value::String(session.token.clone())).await?;
    store.set(USER_ID_KEY, Value::String(session.user_id.clone())).await
}

/// Drops the token, the user id and the cached user record.
pub async fn clear_session(store: &dyn ProfileStore) -> Result<(), StoreError> {
    store.clear(TOKEN_KEY).await?;
    store.clear(USER_ID_KEY).await?;
    store.clear(USER_KEY).await
}

async fn read_string(store: &dyn ProfileStore, key: &str) -> Result<Option<String>, StoreError> {
    Ok(store
        .get(key)
        .await?
        .and_then(|value| value.as_str().map(str::to_string))
        .filter(|value| !value.trim().is_empty()))
}

/// A missing record is empty. An undecodable one is an error, so callers
/// never write a blank record over stored history.
pub async fn load_user(store: &dyn ProfileStore) -> Result<UserRecord, StoreError> {
    let Some(value) = store.get(USER_KEY).await? else {
        return Ok(UserRecord::default());
    };
    serde_json::from_value(value).map_err(|err| {
        error!("failed to parse user record: {err}");
        StoreError::Json(err)
    })
}

pub async fn save_user(store: &dyn ProfileStore, record: &UserRecord) -> Result<(), StoreError> {
    store.set(USER_KEY, serde_json::to_value(record)?).await
}
