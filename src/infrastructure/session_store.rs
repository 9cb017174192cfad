// File-backed session store with explicit load/save/clear
use crate::domain::error::{TrackingError, TrackingResult};
use crate::domain::session::Session;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file means signed out.
    pub fn load(&self) -> TrackingResult<Session> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                TrackingError::Storage(format!("corrupt session file {}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Session::default()),
            Err(e) => Err(storage_error(&self.path, e)),
        }
    }

    pub fn save(&self, session: &Session) -> TrackingResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| storage_error(parent, e))?;
            }
        }

        let raw = serde_json::to_string_pretty(session)
            .map_err(|e| TrackingError::Storage(e.to_string()))?;
        fs::write(&self.path, raw).map_err(|e| storage_error(&self.path, e))?;
        tracing::debug!("Saved session to {}", self.path.display());
        Ok(())
    }

    pub fn clear(&self) -> TrackingResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error(&self.path, e)),
        }
    }
}

fn storage_error(path: &Path, error: std::io::Error) -> TrackingError {
    TrackingError::Storage(format!("{}: {}", path.display(), error))
}
