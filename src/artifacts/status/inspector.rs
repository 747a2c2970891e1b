use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::status::file_change::{IndexChangeType, WorkspaceChangeType};
use derive_new::new;
use std::path::{Path, PathBuf};

/// Per-path comparisons between HEAD, the index and the working tree
///
/// Working-tree files are compared by content: the file is hashed as a blob without being
/// stored.
#[derive(new)]
pub struct Inspector<'r> {
    repository: &'r Repository,
}

impl<'r> Inspector<'r> {
    /// Blob id the working-tree file would get, None when no regular file is there
    pub fn workspace_oid(&self, path: &Path) -> anyhow::Result<Option<ObjectId>> {
        let workspace = self.repository.workspace();
        if !workspace.is_file(path) {
            return Ok(None);
        }

        let content = workspace.read_file(path)?;
        let (oid, _) = object::digest(ObjectType::Blob, &content)?;

        Ok(Some(oid))
    }

    pub fn check_index_against_workspace(
        &self,
        entry: Option<&IndexEntry>,
        workspace_oid: Option<&ObjectId>,
    ) -> WorkspaceChangeType {
        match (entry, workspace_oid) {
            (None, Some(_)) => WorkspaceChangeType::Untracked,
            (Some(_), None) => WorkspaceChangeType::Deleted,
            (Some(entry), Some(oid)) if entry.oid != *oid => WorkspaceChangeType::Modified,
            _ => WorkspaceChangeType::None,
        }
    }

    pub fn check_index_against_head_tree(
        &self,
        index_oid: Option<&ObjectId>,
        head_oid: Option<&ObjectId>,
    ) -> IndexChangeType {
        match (index_oid, head_oid) {
            (Some(index_oid), Some(head_oid)) if index_oid != head_oid => IndexChangeType::Modified,
            (Some(_), None) => IndexChangeType::Added,
            (None, Some(_)) => IndexChangeType::Deleted,
            _ => IndexChangeType::None,
        }
    }

    /// Outermost untracked ancestor of an untracked file
    ///
    /// A directory holding no tracked file is reported once, with a trailing separator,
    /// instead of listing its contents.
    pub fn untracked_root(&self, path: &Path, index: &Index) -> PathBuf {
        let mut prefix = PathBuf::new();
        for component in path.components() {
            prefix.push(component);
            if prefix.as_path() == path {
                break;
            }
            if !index.is_directly_tracked(&prefix) {
                prefix.push("");
                return prefix;
            }
        }

        prefix
    }
}
