use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use docsync_core::DocumentId;
use docsync_logging::{sync_info, sync_warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

const STATE_FILENAME: &str = ".docsync_state.ron";

#[derive(Debug, Error)]
pub(crate) enum PersistError {
    #[error("state directory missing or not writable: {0}")]
    StateDir(String),
    #[error("could not serialize state: {0}")]
    Serialize(#[from] ron::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
struct PersistedState {
    last_selected: Option<String>,
}

/// Reads the id of the document shown last. Missing or unreadable state yields `None`.
pub(crate) fn load_last_selected(state_dir: &Path) -> Option<DocumentId> {
    let path = state_dir.join(STATE_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
        Err(err) => {
            sync_warn!("Failed to read saved state from {:?}: {}", path, err);
            return None;
        }
    };

    match ron::from_str::<PersistedState>(&content) {
        Ok(state) => state.last_selected.map(DocumentId::new),
        Err(err) => {
            sync_warn!("Failed to parse saved state from {:?}: {}", path, err);
            None
        }
    }
}

pub(crate) fn save_last_selected(
    state_dir: &Path,
    id: Option<&DocumentId>,
) -> Result<PathBuf, PersistError> {
    let state = PersistedState {
        last_selected: id.map(|id| id.as_str().to_string()),
    };
    let content = ron::ser::to_string_pretty(&state, ron::ser::PrettyConfig::new())?;
    let path = write_atomically(state_dir, STATE_FILENAME, &content)?;
    sync_info!("Saved selection to {:?}", path);
    Ok(path)
}

fn write_atomically(dir: &Path, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| PersistError::StateDir(e.to_string()))?;
    } else if !dir.is_dir() {
        return Err(PersistError::StateDir(format!("{} is not a directory", dir.display())));
    }

    let target = dir.join(filename);
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| PersistError::StateDir(e.to_string()))?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_survives_a_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let id = DocumentId::new("42");

        let path = save_last_selected(dir.path(), Some(&id)).unwrap();
        assert_eq!(path, dir.path().join(STATE_FILENAME));
        assert_eq!(load_last_selected(dir.path()), Some(id));

        save_last_selected(dir.path(), None).unwrap();
        assert_eq!(load_last_selected(dir.path()), None);
    }

    #[test]
    fn missing_or_corrupt_state_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_last_selected(dir.path()), None);

        fs::write(dir.path().join(STATE_FILENAME), "not ron at all (").unwrap();
        assert_eq!(load_last_selected(dir.path()), None);
    }

    #[test]
    fn creates_missing_state_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        save_last_selected(&nested, Some(&DocumentId::new("x"))).unwrap();
        assert_eq!(load_last_selected(&nested), Some(DocumentId::new("x")));
    }

    #[test]
    fn file_in_place_of_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        fs::write(&file, "").unwrap();
        let err = save_last_selected(&file, None).unwrap_err();
        assert!(matches!(err, PersistError::StateDir(_)));
    }
}
