use std::path::{Path, PathBuf};

use crate::foundation::error::{PapercutError, PapercutResult};

/// File name used by [`FileStore`].
pub const PROJECT_FILE_NAME: &str = "papercut.project.json";

/// Single-slot key/value store for the serialized project document.
pub trait ProjectStore {
    /// Replace the saved document.
    fn save(&mut self, json: &str) -> PapercutResult<()>;

    /// Fetch the saved document, or [`PapercutError::NoSavedProject`].
    fn load(&self) -> PapercutResult<String>;
}

/// Stores the project as one JSON file inside a directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(PROJECT_FILE_NAME),
        }
    }

    /// Use an explicit file path instead of the default file name.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProjectStore for FileStore {
    fn save(&mut self, json: &str) -> PapercutResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                PapercutError::storage(format!("create '{}': {e}", parent.display()))
            })?;
        }
        // Write next to the target and rename so a failed save never truncates the old one.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .map_err(|e| PapercutError::storage(format!("write '{}': {e}", tmp.display())))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            PapercutError::storage(format!("replace '{}': {e}", self.path.display()))
        })?;
        tracing::info!(path = %self.path.display(), bytes = json.len(), "project saved");
        Ok(())
    }

    fn load(&self) -> PapercutResult<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(s) => Ok(s),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(PapercutError::NoSavedProject),
            Err(e) => Err(PapercutError::storage(format!(
                "read '{}': {e}",
                self.path.display()
            ))),
        }
    }
}

/// In-process store, used by tests and embedders without a filesystem.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    saved: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProjectStore for MemoryStore {
    fn save(&mut self, json: &str) -> PapercutResult<()> {
        self.saved = Some(json.to_owned());
        Ok(())
    }

    fn load(&self) -> PapercutResult<String> {
        self.saved.clone().ok_or(PapercutError::NoSavedProject)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/storage.rs"]
mod tests;
