//! Session persistence between CLI invocations

use campus_client::types::User;
use campus_client::{MemorySessionStore, Session, SessionStore};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const STORAGE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct StoredSession {
    version: u32,
    state: Session,
}

/// Session store backed by a JSON file, rewritten after every change
pub struct FileSessionStore {
    path: PathBuf,
    memory: MemorySessionStore,
}

impl FileSessionStore {
    /// Open the store at `path`; a missing or unreadable file starts signed out
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let session = read_session(&path).unwrap_or_default();
        Self {
            path,
            memory: MemorySessionStore::restore(session),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, session: &Session) {
        let stored = StoredSession {
            version: STORAGE_VERSION,
            state: session.clone(),
        };
        let result = serde_json::to_string_pretty(&stored)
            .map_err(std::io::Error::other)
            .and_then(|content| write_private(&self.path, &content));
        if let Err(e) = result {
            warn!(path = %self.path.display(), error = %e, "Failed to save session");
        }
    }
}

/// Replace `path` with `content`, readable by the owner only.
///
/// The document is written next to `path` and renamed over it, so a crash
/// leaves either the old session or the new one.
fn write_private(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let staging = path.with_extension("json.tmp");

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    // Tokens must not be readable by other local users
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(&staging)?;

    // A leftover staging file keeps its old mode, so tighten it explicitly
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    drop(file);

    std::fs::rename(&staging, path)
}

fn read_session(path: &Path) -> Option<Session> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str::<StoredSession>(&content) {
        Ok(stored) if stored.version == STORAGE_VERSION => Some(stored.state),
        Ok(stored) => {
            warn!(version = stored.version, "Ignoring session saved by another version");
            None
        }
        Err(e) => {
            debug!(error = %e, "Ignoring unreadable session file");
            None
        }
    }
}

impl SessionStore for FileSessionStore {
    fn session(&self) -> Session {
        self.memory.session()
    }

    fn set_access_token(&self, access_token: String) {
        let session = self
            .memory
            .update(|session| session.access_token = Some(access_token));
        self.persist(&session);
    }

    fn set_auth(&self, user: User, access_token: String, refresh_token: String) {
        let session = self.memory.update(|session| {
            *session = Session {
                user: Some(user),
                access_token: Some(access_token),
                refresh_token: Some(refresh_token),
            };
        });
        self.persist(&session);
    }

    fn logout(&self) {
        let session = self.memory.update(|session| *session = Session::default());
        self.persist(&session);
    }
}
