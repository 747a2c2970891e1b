use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use derive_new::new;
use std::path::{Path, PathBuf};

pub const MERGE_HEAD: &str = "MERGE_HEAD";
pub const MERGE_MSG: &str = "MERGE_MSG";

/// Files recording a merge that stopped on conflicts
#[derive(Debug, Clone, new)]
pub struct MergeState {
    path: Box<Path>,
}

impl MergeState {
    fn head_path(&self) -> PathBuf {
        self.path.join(MERGE_HEAD)
    }

    fn message_path(&self) -> PathBuf {
        self.path.join(MERGE_MSG)
    }

    pub fn is_pending(&self) -> bool {
        self.head_path().is_file()
    }

    pub fn record(&self, theirs: &ObjectId, message: &str) -> anyhow::Result<()> {
        std::fs::write(self.head_path(), format!("{theirs}\n"))
            .with_context(|| format!("failed to write {MERGE_HEAD}"))?;
        std::fs::write(self.message_path(), message)
            .with_context(|| format!("failed to write {MERGE_MSG}"))?;

        Ok(())
    }

    /// The commit being merged in, None when no merge is pending
    pub fn merge_head(&self) -> anyhow::Result<Option<ObjectId>> {
        if !self.is_pending() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(self.head_path())
            .with_context(|| format!("failed to read {MERGE_HEAD}"))?;

        Ok(Some(ObjectId::try_parse(content.trim())?))
    }

    pub fn message(&self) -> anyhow::Result<Option<String>> {
        let path = self.message_path();
        if !path.is_file() {
            return Ok(None);
        }

        let message =
            std::fs::read_to_string(&path).with_context(|| format!("failed to read {MERGE_MSG}"))?;

        Ok(Some(message))
    }

    pub fn clear(&self) -> anyhow::Result<()> {
        for path in [self.head_path(), self.message_path()] {
            if path.exists() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("failed to remove {}", path.display()))?;
            }
        }

        Ok(())
    }
}
