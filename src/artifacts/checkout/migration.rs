//! Working tree migration between two snapshots
//!
//! A migration moves the working tree and the index from one flat tree to another:
//!
//! 1. The difference between the two trees is computed
//! 2. Every changed path is checked against local state (index and working tree)
//! 3. Deletions and writes are applied to the working tree
//! 4. The index entries of changed paths are updated
//!
//! ## Conflict Detection
//!
//! - Stale files: the index differs from both trees, or the working tree differs from the index
//! - Stale directories: a directory holding untracked files sits where a file must go
//! - Untracked overwrites: an untracked file would be replaced
//! - Untracked removals: an untracked file would be deleted
//!
//! Conflicts are reported before anything is touched. A forced migration skips the checks.

use crate::areas::repository::Repository;
use crate::artifacts::checkout::conflict::{ConflictMessage, ConflictType};
use crate::artifacts::diff::tree_diff::{TreeChangeType, TreeDiff};
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::status::file_change::IndexChangeType;
use crate::artifacts::status::inspector::Inspector;
use crate::artifacts::tree::FlatTree;
use crate::errors::UgitError;
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Type of file system action required by the migration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionType {
    Add,
    Delete,
    Modify,
}

/// Planned actions grouped by type; deletions carry no id
pub type ActionsSet = BTreeMap<ActionType, Vec<(PathBuf, Option<ObjectId>)>>;

/// Detected conflicts grouped by type
pub type ConflictsSet = BTreeMap<ConflictType, BTreeSet<PathBuf>>;

pub struct Migration<'r> {
    repository: &'r Repository,
    tree_diff: TreeDiff,
    inspector: Inspector<'r>,
    actions: ActionsSet,
    conflicts: ConflictsSet,
}

impl<'r> Migration<'r> {
    pub fn new(repository: &'r Repository, old: &FlatTree, new: &FlatTree) -> Self {
        Self {
            repository,
            tree_diff: TreeDiff::between(old, new),
            inspector: Inspector::new(repository),
            actions: ActionsSet::new(),
            conflicts: ConflictsSet::new(),
        }
    }

    /// Paths to delete from the working tree
    pub fn deletions(&self) -> impl Iterator<Item = &PathBuf> {
        self.actions
            .get(&ActionType::Delete)
            .into_iter()
            .flatten()
            .map(|(path, _)| path)
    }

    /// Paths to (re)write together with the blob to write there
    pub fn writes(&self) -> impl Iterator<Item = (&PathBuf, &ObjectId)> {
        [ActionType::Add, ActionType::Modify]
            .into_iter()
            .filter_map(|action_type| self.actions.get(&action_type))
            .flatten()
            .filter_map(|(path, oid)| oid.as_ref().map(|oid| (path, oid)))
    }

    /// Plan, check, and apply the migration to the working tree and the index
    pub fn apply_changes(&mut self, force: bool) -> anyhow::Result<()> {
        self.plan_changes(force)?;
        self.repository.workspace().apply_migration(self)?;
        self.update_index();

        Ok(())
    }

    fn plan_changes(&mut self, force: bool) -> anyhow::Result<()> {
        let changes = self
            .tree_diff
            .changes()
            .iter()
            .map(|(path, change)| (path.clone(), change.clone()))
            .collect::<Vec<_>>();

        for (path, change) in &changes {
            if !force {
                self.check_for_conflict(path, change)?;
            }
            self.record_change(path, change);
        }

        let errors = self.collect_errors();
        if !errors.is_empty() {
            let errors = errors
                .iter()
                .map(|e| format!("error: {e}"))
                .collect::<Vec<_>>()
                .join("\n\n");
            return Err(UgitError::Conflict(format!("{errors}\n\nAborting")).into());
        }

        Ok(())
    }

    fn collect_errors(&self) -> Vec<String> {
        self.conflicts
            .iter()
            .filter(|(_, paths)| !paths.is_empty())
            .map(|(conflict_type, paths)| {
                let paths = paths
                    .iter()
                    .map(|p| format!("\t{}", p.display()))
                    .collect::<Vec<String>>();

                let ConflictMessage { header, footer } = conflict_type.into();
                format!("{}\n{}\n{}", header, paths.join("\n"), footer)
                    .trim_end()
                    .to_string()
            })
            .collect()
    }

    fn record_conflict(&mut self, conflict_type: ConflictType, path: &Path) {
        self.conflicts
            .entry(conflict_type)
            .or_default()
            .insert(path.to_path_buf());
    }

    fn check_for_conflict(&mut self, path: &Path, change: &TreeChangeType) -> anyhow::Result<()> {
        let index = self.repository.index();
        let entry = index.entry_by_path(path).cloned();
        drop(index);

        let old_oid = change.old_entry();
        let new_oid = change.new_entry();

        if self.index_differs_from_trees(entry.as_ref(), old_oid, new_oid) {
            self.record_conflict(ConflictType::StaleFile, path);
            return Ok(());
        }

        let workspace = self.repository.workspace();
        if workspace.is_dir(path) {
            if new_oid.is_some() && self.has_untracked_files(path)? {
                self.record_conflict(ConflictType::StaleDirectory, path);
            }
        } else if workspace.is_file(path) {
            let workspace_oid = self.inspector.workspace_oid(path)?;
            let differs = match &entry {
                Some(entry) => workspace_oid.as_ref() != Some(&entry.oid),
                None => workspace_oid.as_ref() != new_oid,
            };
            if differs {
                let conflict_type =
                    ConflictType::get_conflict_type(entry.is_some(), false, new_oid.is_some());
                self.record_conflict(conflict_type, path);
            }
        } else if new_oid.is_some()
            && let Some(parent) = self.untracked_parent(path)
        {
            self.record_conflict(ConflictType::UntrackedOverwritten, &parent);
        }

        Ok(())
    }

    /// Closest ancestor that is an untracked regular file, blocking a directory
    fn untracked_parent(&self, path: &Path) -> Option<PathBuf> {
        let index = self.repository.index();
        let workspace = self.repository.workspace();

        path.ancestors()
            .skip(1)
            .filter(|ancestor| !ancestor.as_os_str().is_empty())
            .find(|ancestor| workspace.is_file(ancestor) && index.entry_by_path(ancestor).is_none())
            .map(Path::to_path_buf)
    }

    fn has_untracked_files(&self, dir: &Path) -> anyhow::Result<bool> {
        let files = self.repository.workspace().list_files(Some(dir))?;
        let index = self.repository.index();

        Ok(files.iter().any(|file| index.entry_by_path(file).is_none()))
    }

    fn index_differs_from_trees(
        &self,
        index_entry: Option<&IndexEntry>,
        old_oid: Option<&ObjectId>,
        new_oid: Option<&ObjectId>,
    ) -> bool {
        let index_oid = index_entry.map(|entry| &entry.oid);

        self.inspector.check_index_against_head_tree(index_oid, old_oid) != IndexChangeType::None
            && self.inspector.check_index_against_head_tree(index_oid, new_oid)
                != IndexChangeType::None
    }

    fn record_change(&mut self, path: &Path, change: &TreeChangeType) {
        let (action_type, oid) = match change {
            TreeChangeType::Added(new) => (ActionType::Add, Some(new.clone())),
            TreeChangeType::Deleted(_) => (ActionType::Delete, None),
            TreeChangeType::Modified { new, .. } => (ActionType::Modify, Some(new.clone())),
        };

        self.actions
            .entry(action_type)
            .or_default()
            .push((path.to_path_buf(), oid));
    }

    fn update_index(&self) {
        let mut index = self.repository.index_mut();

        for path in self.deletions() {
            index.remove(path);
        }
        for (path, oid) in self.writes() {
            index.add(IndexEntry::clean(path.clone(), oid.clone()));
        }
    }

    pub fn load_blob_data(&self, object_id: &ObjectId) -> anyhow::Result<Bytes> {
        let blob = self.repository.database().load_blob(object_id)?;

        Ok(blob.into_content())
    }
}
