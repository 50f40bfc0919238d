//! Chat history for visitors who are not signed in.
//!
//! Each anonymous session keeps its messages as a JSON array under the key
//! `anonymous-chat-<sessionId>`, one file per key.

use crate::{RenoplanError, Result};
use renoplan_types::Message;
use std::path::{Path, PathBuf};

const KEY_PREFIX: &str = "anonymous-chat-";

/// Storage key for an anonymous session.
pub fn storage_key(session_id: &str) -> String {
    format!("{}{}", KEY_PREFIX, session_id)
}

/// File-backed key/value store of anonymous chat histories.
#[derive(Debug, Clone)]
pub struct AnonymousChatStore {
    dir: PathBuf,
}

impl AnonymousChatStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, session_id: &str) -> Result<PathBuf> {
        let valid = !session_id.is_empty()
            && session_id.len() <= 128
            && session_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(RenoplanError::InvalidInput(format!(
                "invalid anonymous session id: {:?}",
                session_id
            )));
        }
        Ok(self.dir.join(format!("{}.json", storage_key(session_id))))
    }

    /// Load a session's messages. Missing or unreadable histories are empty.
    pub fn load(&self, session_id: &str) -> Result<Vec<Message>> {
        let path = self.path_for(session_id)?;
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&content) {
            Ok(messages) => Ok(messages),
            Err(e) => {
                tracing::warn!(target: "renoplan::chat", "Discarding corrupt anonymous history {:?}: {}", path, e);
                Ok(Vec::new())
            }
        }
    }

    pub fn save(&self, session_id: &str, messages: &[Message]) -> Result<()> {
        let path = self.path_for(session_id)?;
        std::fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec(messages)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    pub fn clear(&self, session_id: &str) -> Result<()> {
        let path = self.path_for(session_id)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
