use crate::areas::repository::Repository;
use crate::artifacts::status::file_change::{FileChange, IndexChangeType, WorkspaceChangeType};
use crate::artifacts::status::inspector::Inspector;
use crate::artifacts::tree::walker::TreeWalker;
use derive_new::new;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

pub type FileSet = BTreeSet<PathBuf>;

/// Three-way comparison of HEAD, the index and the working tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusInfo {
    /// Index differs from HEAD
    pub staged: BTreeMap<PathBuf, IndexChangeType>,
    /// Working tree differs from the index
    pub unstaged: BTreeMap<PathBuf, WorkspaceChangeType>,
    /// Files (or wholly untracked directories, with a trailing separator) not in the index
    pub untracked: FileSet,
    /// Paths left unresolved by a merge
    pub conflicted: FileSet,
}

impl StatusInfo {
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty()
            && self.unstaged.is_empty()
            && self.untracked.is_empty()
            && self.conflicted.is_empty()
    }

    /// Both areas' changes per path, for the two-letter porcelain listing
    pub fn changed_files(&self) -> BTreeMap<PathBuf, FileChange> {
        let mut changes = BTreeMap::<PathBuf, FileChange>::new();

        for (path, change) in &self.staged {
            changes.entry(path.clone()).or_default().index_change = *change;
        }
        for (path, change) in &self.unstaged {
            changes.entry(path.clone()).or_default().workspace_change = *change;
        }

        changes
    }
}

#[derive(new)]
pub struct Status<'r> {
    repository: &'r Repository,
}

impl<'r> Status<'r> {
    /// Compare the loaded index against HEAD and the working tree
    pub fn collect(&self) -> anyhow::Result<StatusInfo> {
        let inspector = Inspector::new(self.repository);
        let index = self.repository.index();

        let head = self.repository.refs().read_head()?;
        let head_tree = TreeWalker::new(self.repository.database()).flatten_commit(head.as_ref())?;

        let mut info = StatusInfo::default();

        for entry in index.entries() {
            if entry.is_conflicted() {
                info.conflicted.insert(entry.name.clone());
                continue;
            }

            let index_change = inspector
                .check_index_against_head_tree(Some(&entry.oid), head_tree.get(&entry.name));
            if index_change != IndexChangeType::None {
                info.staged.insert(entry.name.clone(), index_change);
            }

            let workspace_oid = inspector.workspace_oid(&entry.name)?;
            let workspace_change =
                inspector.check_index_against_workspace(Some(entry), workspace_oid.as_ref());
            if workspace_change != WorkspaceChangeType::None {
                info.unstaged.insert(entry.name.clone(), workspace_change);
            }
        }

        for path in head_tree.keys() {
            if index.entry_by_path(path).is_none() {
                info.staged.insert(path.clone(), IndexChangeType::Deleted);
            }
        }

        for path in self.repository.workspace().list_files(None)? {
            if index.entry_by_path(&path).is_none() {
                info.untracked.insert(inspector.untracked_root(&path, &index));
            }
        }

        Ok(info)
    }
}
