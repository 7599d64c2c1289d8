use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::Category;

/// Where a user is in the conversation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConvState {
    /// Nothing pending. A user without a username is not onboarded yet.
    #[default]
    Idle,
    AwaitingUsername,
    AwaitingCategory,
    AwaitingAmount,
}

/// Per-user conversational context.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    pub state: ConvState,
    pub username: Option<String>,
    /// Last chosen category. Kept after an expense is recorded so that the
    /// next amount sent without a menu reuses it.
    pub category: Option<Category>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UsernamesFile {
    users: HashMap<String, String>,
}

/// Sessions keyed by chat user id.
///
/// Sessions live in memory. When built with [`SessionStore::persistent`]
/// usernames are also written to a JSON file and restored on start, so users
/// do not have to onboard again after a restart.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<u64, Session>>>,
    path: Option<PathBuf>,
}

impl SessionStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads usernames from `path`. A missing or unreadable file starts empty.
    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let sessions = read_json_file(&path)
            .unwrap_or_default()
            .users
            .into_iter()
            .filter_map(|(id, username)| {
                let id = id.parse::<u64>().ok()?;
                let session = Session {
                    username: Some(username),
                    ..Session::default()
                };
                Some((id, session))
            })
            .collect();

        Self {
            inner: Arc::new(Mutex::new(sessions)),
            path: Some(path),
        }
    }

    pub async fn get(&self, user_id: u64) -> Session {
        let guard = self.inner.lock().await;
        guard.get(&user_id).cloned().unwrap_or_default()
    }

    /// Stores `session`, saving usernames to disk when one changed.
    pub async fn replace(&self, user_id: u64, session: Session) -> Result<(), std::io::Error> {
        let username = session.username.clone();
        let mut guard = self.inner.lock().await;
        let previous = guard.insert(user_id, session);
        let changed = previous.and_then(|s| s.username) != username;

        match &self.path {
            Some(path) if changed => write_json_file(path, &guard),
            _ => Ok(()),
        }
    }
}

fn read_json_file(path: &Path) -> Option<UsernamesFile> {
    let raw = fs::read_to_string(path).ok()?;
    serde_json::from_str(&raw).ok()
}

fn write_json_file(path: &Path, sessions: &HashMap<u64, Session>) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let file = UsernamesFile {
        users: sessions
            .iter()
            .filter_map(|(id, s)| Some((id.to_string(), s.username.clone()?)))
            .collect(),
    };
    let json = serde_json::to_string_pretty(&file)
        .map_err(|_| std::io::Error::other("serialize failed"))?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)?;
    match fs::rename(&tmp, path) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(&tmp, path)?;
            let _ = fs::remove_file(&tmp);
            Ok(())
        }
    }
}
