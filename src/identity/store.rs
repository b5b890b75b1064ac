use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::warn;

use crate::error::AppResult;

/// Name of the single persisted slot holding the raw token.
pub const TOKEN_SLOT: &str = "token";

/// One named slot of client-local persistent storage. Nothing else is persisted.
///
/// `load` yields the token without surrounding whitespace, and `None` for a
/// blank slot, whichever backend holds it.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str) -> AppResult<()>;
    fn clear(&self) -> AppResult<()>;
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_token(token: &str) -> Self { Self { slot: RwLock::new(Some(token.to_string())) } }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.slot.read().as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
    }

    fn save(&self, token: &str) -> AppResult<()> {
        *self.slot.write() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        *self.slot.write() = None;
        Ok(())
    }
}

/// Keeps the slot as a file named [`TOKEN_SLOT`] under a state directory.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self { path: state_dir.as_ref().join(TOKEN_SLOT) }
    }

    pub fn path(&self) -> &Path { &self.path }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(s) => {
                let s = s.trim();
                if s.is_empty() { None } else { Some(s.to_string()) }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(target: "trail::session", path = %self.path.display(), "token slot unreadable: {}", e);
                None
            }
        }
    }

    fn save(&self, token: &str) -> AppResult<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.path, token)?;
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
