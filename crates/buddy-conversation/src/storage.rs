use buddy_core::{BuddyError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::conversation::{ConversationMemory, StoredConversation};

pub const MEMORY_FILE_NAME: &str = "conversation-memory.json";
pub const CORRUPT_FILE_SUFFIX: &str = "corrupt";

/// Whole-document JSON persistence for [`ConversationMemory`].
///
/// The file is rewritten completely on every save, through a temporary file
/// renamed over the target so readers never observe a partial write.
pub struct ConversationStore {
    data_dir: PathBuf,
}

impl ConversationStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        debug!("ConversationStore initialized: data_dir={:?}", data_dir);
        Self { data_dir }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn file_path(&self) -> PathBuf {
        self.data_dir.join(MEMORY_FILE_NAME)
    }

    /// Where an unparsable document is moved aside by [`load`](Self::load).
    pub fn corrupt_file_path(&self) -> PathBuf {
        self.file_path().with_extension(format!("json.{}", CORRUPT_FILE_SUFFIX))
    }

    fn ensure_data_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }

    /// Create the data directory and an empty document if none exists.
    /// Returns `true` when a new file was written.
    pub fn try_initialize(&self) -> Result<bool> {
        self.ensure_data_dir()?;

        let path = self.file_path();
        if path.exists() {
            return Ok(false);
        }

        self.try_save(&ConversationMemory::new())?;
        Ok(true)
    }

    /// Like [`try_initialize`](Self::try_initialize) but never fails; errors are logged.
    pub fn initialize(&self) {
        match self.try_initialize() {
            Ok(true) => info!("Created conversation memory file at {:?}", self.file_path()),
            Ok(false) => debug!("Conversation memory file already present at {:?}", self.file_path()),
            Err(e) => error!("Failed to initialize conversation memory: {}", e),
        }
    }

    /// Read the document. A missing file is an empty memory, not an error.
    pub fn try_load(&self) -> Result<ConversationMemory> {
        let path = self.file_path();
        if !path.exists() {
            return Ok(ConversationMemory::new());
        }

        let json = fs::read_to_string(&path)?;
        if json.trim().is_empty() {
            return Ok(ConversationMemory::new());
        }

        let stored: BTreeMap<i64, StoredConversation> = serde_json::from_str(&json)
            .map_err(|e| BuddyError::StorageError(format!("Corrupt memory file {:?}: {}", path, e)))?;

        Ok(upgrade(stored))
    }

    /// Load for callers that cannot act on a failure: unreadable or corrupt
    /// files degrade to an empty memory. A corrupt file is renamed to
    /// [`corrupt_file_path`](Self::corrupt_file_path) first, so the next save
    /// does not overwrite it.
    pub fn load(&self) -> ConversationMemory {
        match self.try_load() {
            Ok(memory) => memory,
            Err(e @ BuddyError::StorageError(_)) => {
                error!("Failed to load conversation memory: {}", e);
                self.quarantine();
                ConversationMemory::new()
            }
            Err(e) => {
                error!("Failed to load conversation memory: {}", e);
                ConversationMemory::new()
            }
        }
    }

    fn quarantine(&self) {
        let target = self.corrupt_file_path();
        match fs::rename(self.file_path(), &target) {
            Ok(()) => warn!("Moved unreadable memory file to {:?}", target),
            Err(e) => error!("Failed to move unreadable memory file aside: {}", e),
        }
    }

    pub fn try_save(&self, memory: &ConversationMemory) -> Result<()> {
        self.ensure_data_dir()?;

        let path = self.file_path();
        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(memory)?;

        fs::write(&tmp_path, json)?;
        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        debug!("Saved conversation memory for {} users", memory.len());
        Ok(())
    }

    /// Save, logging instead of returning errors. The in-memory change is lost
    /// for this process only.
    pub fn save(&self, memory: &ConversationMemory) {
        if let Err(e) = self.try_save(memory) {
            error!("Failed to save conversation memory: {}", e);
        }
    }
}

fn upgrade(stored: BTreeMap<i64, StoredConversation>) -> ConversationMemory {
    let mut migrated = 0usize;
    let memory = stored
        .into_iter()
        .map(|(user_id, entry)| {
            if entry.is_legacy() {
                migrated += 1;
            }
            (user_id, entry.into_conversation())
        })
        .collect();

    if migrated > 0 {
        warn!("Migrated {} conversations from the legacy message-array format", migrated);
    }
    memory
}
