//! Persisted string-keyed session state.
//!
//! Each screen writes what the next one needs; logout clears everything.

pub mod context;

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use tokio::fs;
use tracing::debug;

use crate::error::Result;

pub use context::*;

pub mod keys {
    pub const ROLE: &str = "dsa-role";
    pub const DIFFICULTY: &str = "dsa-difficulty";
    pub const QUESTION: &str = "dsa-question";
    pub const EXPECTED_OUTPUT: &str = "dsa-expectedOutput";
    pub const INPUT: &str = "dsa-input";
    pub const CUSTOM_INPUT: &str = "dsa-customInput";
    pub const TOKEN: &str = "token";
    pub const USER_ID: &str = "userId";
    pub const RESUME_NAME: &str = "interview-resume-name";
    pub const INTERVIEW_TYPE: &str = "interview-type";
    pub const QUESTION_COUNT: &str = "interview-question-count";
    pub const ATTEMPTED: &str = "interview-attempted";
    pub const TIMER: &str = "interview-timer";
    pub const STARTED: &str = "interview-started";
    pub const QUESTIONS: &str = "interviewQuestions";
    pub const REPORT: &str = "interview-report";
}

#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl SessionStore {
    /// Load the store at `path`. A missing file is an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path).await {
            Ok(json) if json.trim().is_empty() => BTreeMap::new(),
            Ok(json) => serde_json::from_str(&json)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), keys = entries.len(), "session store opened");
        Ok(Self { path, entries })
    }

    /// An unsaved, empty store rooted at `path`.
    pub fn in_memory(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Like `get`, but an empty value counts as absent.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key) {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    pub fn set_json<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set(key, raw);
        Ok(())
    }

    pub async fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let pretty_json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, &pretty_json).await?;
        debug!(path = %self.path.display(), keys = self.entries.len(), "session store saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path().join("session.json"))
            .await
            .unwrap();
        assert!(store.get(keys::TOKEN).is_none());
    }

    #[tokio::test]
    async fn values_survive_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let mut store = SessionStore::open(&path).await.unwrap();
        store.set(keys::ROLE, "SDE");
        store
            .set_json(keys::QUESTIONS, &vec!["Why us?", "Biggest failure?"])
            .unwrap();
        store.save().await.unwrap();

        let reopened = SessionStore::open(&path).await.unwrap();
        assert_eq!(reopened.get(keys::ROLE), Some("SDE"));
        let questions: Vec<String> = reopened.get_json(keys::QUESTIONS).unwrap().unwrap();
        assert_eq!(questions, vec!["Why us?", "Biggest failure?"]);
    }

    #[tokio::test]
    async fn clear_removes_every_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut store = SessionStore::open(&path).await.unwrap();
        store.set(keys::TOKEN, "abc");
        store.set(keys::REPORT, "{}");
        store.save().await.unwrap();

        store.clear();
        store.save().await.unwrap();

        let reopened = SessionStore::open(&path).await.unwrap();
        assert!(!reopened.contains(keys::TOKEN));
        assert!(!reopened.contains(keys::REPORT));
    }

    #[test]
    fn empty_values_are_not_non_empty() {
        let mut store = SessionStore::in_memory("unused.json");
        store.set(keys::EXPECTED_OUTPUT, "  ");
        assert_eq!(store.get(keys::EXPECTED_OUTPUT), Some("  "));
        assert!(store.get_non_empty(keys::EXPECTED_OUTPUT).is_none());
    }
}
