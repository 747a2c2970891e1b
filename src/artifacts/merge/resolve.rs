//! Structural three-way merge of trees
//!
//! The base, ours and theirs trees are compared level by level. Subtrees with identical ids
//! are taken whole; only directories changed on both sides are descended, using an explicit
//! work stack.
//!
//! Per path:
//!
//! | base  | ours  | theirs | result                                   |
//! |-------|-------|--------|------------------------------------------|
//! | any   | X     | X      | X                                        |
//! | B     | B     | T      | T                                        |
//! | B     | O     | B      | O                                        |
//! | any   | file  | file   | content conflict, markers written        |
//! | file  | none  | file   | delete/modify conflict, theirs kept      |
//! | file  | file  | none   | delete/modify conflict, ours kept        |
//! | any   | file  | dir    | file/directory conflict, file renamed    |
//! | any   | dir   | dir    | descend                                  |

use crate::areas::database::Database;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::tree::FlatTree;
use crate::artifacts::tree::walker::TreeWalker;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// One side of a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Side {
    Ours,
    Theirs,
}

impl Side {
    fn pick<'a, T>(&self, ours: &'a T, theirs: &'a T) -> &'a T {
        match self {
            Side::Ours => ours,
            Side::Theirs => theirs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    /// Both sides changed the file differently
    Content,
    /// One side deleted what the other modified; the modified file is kept
    DeleteModify { deleted_by: Side },
    /// One side has a file where the other has a directory; the file moved to `renamed_to`
    FileDirectory { file_side: Side, renamed_to: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConflict {
    pub path: PathBuf,
    pub kind: ConflictKind,
}

impl MergeConflict {
    /// Path of the file left in the working tree for the user to resolve
    pub fn worktree_path(&self) -> &Path {
        match &self.kind {
            ConflictKind::FileDirectory { renamed_to, .. } => renamed_to,
            _ => &self.path,
        }
    }

    pub fn describe(&self) -> String {
        match &self.kind {
            ConflictKind::Content => format!(
                "CONFLICT (content): Merge conflict in {}",
                self.path.display()
            ),
            ConflictKind::DeleteModify { deleted_by } => {
                let (deleted, modified) = match deleted_by {
                    Side::Ours => ("ours", "theirs"),
                    Side::Theirs => ("theirs", "ours"),
                };
                format!(
                    "CONFLICT (modify/delete): {} deleted in {} and modified in {}",
                    self.path.display(),
                    deleted,
                    modified
                )
            }
            ConflictKind::FileDirectory { renamed_to, .. } => format!(
                "CONFLICT (file/directory): directory in the way of {}, adding it as {}",
                self.path.display(),
                renamed_to.display()
            ),
        }
    }
}

/// Names used in conflict markers and renamed files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeLabels {
    pub ours: String,
    pub theirs: String,
}

impl MergeLabels {
    pub fn new(ours: impl Into<String>, theirs: impl Into<String>) -> Self {
        MergeLabels {
            ours: ours.into(),
            theirs: theirs.into(),
        }
    }
}

impl Default for MergeLabels {
    fn default() -> Self {
        MergeLabels::new("ours", "theirs")
    }
}

/// The merged snapshot, conflicted paths included
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeMergeOutcome {
    /// Every file of the result; conflicted paths hold marker blobs or the surviving side
    pub files: FlatTree,
    pub conflicts: Vec<MergeConflict>,
}

impl TreeMergeOutcome {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Paths of `files` that must be flagged in the index
    pub fn conflicted_paths(&self) -> BTreeSet<PathBuf> {
        self.conflicts
            .iter()
            .map(|conflict| conflict.worktree_path().to_path_buf())
            .collect()
    }
}

type Slot = Option<DatabaseEntry>;

struct PendingDirectory {
    prefix: PathBuf,
    base: Option<ObjectId>,
    ours: Option<ObjectId>,
    theirs: Option<ObjectId>,
}

pub struct TreeMerge<'d> {
    database: &'d Database,
    labels: MergeLabels,
}

impl<'d> TreeMerge<'d> {
    pub fn new(database: &'d Database, labels: MergeLabels) -> Self {
        TreeMerge { database, labels }
    }

    /// Merge `ours` and `theirs` against `base` (None meaning the empty tree)
    ///
    /// Marker blobs are stored in the database so that the result can be checked out.
    pub fn merge(
        &self,
        base: Option<&ObjectId>,
        ours: &ObjectId,
        theirs: &ObjectId,
    ) -> anyhow::Result<TreeMergeOutcome> {
        let mut outcome = TreeMergeOutcome::default();
        let mut stack = vec![PendingDirectory {
            prefix: PathBuf::new(),
            base: base.cloned(),
            ours: Some(ours.clone()),
            theirs: Some(theirs.clone()),
        }];

        while let Some(directory) = stack.pop() {
            let base_tree = self.load(directory.base.as_ref())?;
            let ours_tree = self.load(directory.ours.as_ref())?;
            let theirs_tree = self.load(directory.theirs.as_ref())?;

            let names = base_tree
                .keys()
                .chain(ours_tree.keys())
                .chain(theirs_tree.keys())
                .cloned()
                .collect::<BTreeSet<_>>();

            for name in names {
                let path = directory.prefix.join(&name);
                let base_entry = base_tree.get(&name).cloned();
                let ours_entry = ours_tree.get(&name).cloned();
                let theirs_entry = theirs_tree.get(&name).cloned();

                if let Some(pending) =
                    self.merge_entry(&path, base_entry, ours_entry, theirs_entry, &mut outcome)?
                {
                    stack.push(pending);
                }
            }
        }
        outcome.conflicts.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(outcome)
    }

    fn load(&self, oid: Option<&ObjectId>) -> anyhow::Result<BTreeMap<String, DatabaseEntry>> {
        match oid {
            Some(oid) => Ok(self.database.load_tree(oid)?.into_entries().collect()),
            None => Ok(BTreeMap::new()),
        }
    }

    fn merge_entry(
        &self,
        path: &Path,
        base: Slot,
        ours: Slot,
        theirs: Slot,
        outcome: &mut TreeMergeOutcome,
    ) -> anyhow::Result<Option<PendingDirectory>> {
        if ours == theirs {
            self.take(path, ours.as_ref(), &mut outcome.files)?;
            return Ok(None);
        }
        if base == ours {
            self.take(path, theirs.as_ref(), &mut outcome.files)?;
            return Ok(None);
        }
        if base == theirs {
            self.take(path, ours.as_ref(), &mut outcome.files)?;
            return Ok(None);
        }

        let is_file = |slot: &Slot| slot.as_ref().is_some_and(|entry| !entry.is_tree());
        let tree_oid = |slot: &Slot| {
            slot.as_ref()
                .filter(|entry| entry.is_tree())
                .map(|entry| entry.oid.clone())
        };

        match (&ours, &theirs) {
            // both sides are directories or absent, at least one differs from base
            _ if !is_file(&ours) && !is_file(&theirs) => Ok(Some(PendingDirectory {
                prefix: path.to_path_buf(),
                base: tree_oid(&base),
                ours: tree_oid(&ours),
                theirs: tree_oid(&theirs),
            })),
            (Some(ours_entry), Some(theirs_entry)) if is_file(&ours) && is_file(&theirs) => {
                let base_oid = base
                    .as_ref()
                    .filter(|entry| !entry.is_tree())
                    .map(|entry| &entry.oid);
                let marker_oid = self.write_markers(base_oid, &ours_entry.oid, &theirs_entry.oid)?;

                outcome.files.insert(path.to_path_buf(), marker_oid);
                outcome.conflicts.push(MergeConflict {
                    path: path.to_path_buf(),
                    kind: ConflictKind::Content,
                });
                Ok(None)
            }
            (Some(ours_entry), Some(theirs_entry)) => {
                let file_side = if is_file(&ours) { Side::Ours } else { Side::Theirs };
                let file_entry = file_side.pick(ours_entry, theirs_entry);
                let dir_entry = file_side.pick(theirs_entry, ours_entry);
                let renamed_to = self.renamed_path(path, file_side);

                self.take(path, Some(dir_entry), &mut outcome.files)?;
                outcome.files.insert(renamed_to.clone(), file_entry.oid.clone());
                outcome.conflicts.push(MergeConflict {
                    path: path.to_path_buf(),
                    kind: ConflictKind::FileDirectory { file_side, renamed_to },
                });
                Ok(None)
            }
            (Some(kept), None) | (None, Some(kept)) => {
                let deleted_by = if ours.is_none() { Side::Ours } else { Side::Theirs };

                self.take(path, Some(kept), &mut outcome.files)?;
                outcome.conflicts.push(MergeConflict {
                    path: path.to_path_buf(),
                    kind: ConflictKind::DeleteModify { deleted_by },
                });
                Ok(None)
            }
            (None, None) => Ok(None),
        }
    }

    /// Copy one entry into the result, flattening a whole subtree
    fn take(
        &self,
        path: &Path,
        entry: Option<&DatabaseEntry>,
        files: &mut FlatTree,
    ) -> anyhow::Result<()> {
        match entry {
            Some(entry) if entry.is_tree() => {
                let subtree = TreeWalker::new(self.database).flatten(&entry.oid)?;
                files.extend(subtree.into_iter().map(|(sub_path, oid)| (path.join(sub_path), oid)));
            }
            Some(entry) => {
                files.insert(path.to_path_buf(), entry.oid.clone());
            }
            None => {}
        }

        Ok(())
    }

    fn renamed_path(&self, path: &Path, side: Side) -> PathBuf {
        let label = side.pick(&self.labels.ours, &self.labels.theirs).replace('/', "_");
        let mut renamed = path.as_os_str().to_os_string();
        renamed.push(format!("~{label}"));

        PathBuf::from(renamed)
    }

    fn write_markers(
        &self,
        base: Option<&ObjectId>,
        ours: &ObjectId,
        theirs: &ObjectId,
    ) -> anyhow::Result<ObjectId> {
        let base = match base {
            Some(base) => self.database.load_blob(base)?.into_content().to_vec(),
            None => Vec::new(),
        };
        let ours = self.database.load_blob(ours)?.into_content();
        let theirs = self.database.load_blob(theirs)?.into_content();

        let content = conflict_markers(&self.labels, &ours, &base, &theirs);

        self.database.put(ObjectType::Blob, &content)
    }
}

/// Whole-file diff3 layout: ours, then base, then theirs
pub fn conflict_markers(labels: &MergeLabels, ours: &[u8], base: &[u8], theirs: &[u8]) -> Vec<u8> {
    let mut content = Vec::new();

    let mut section = |marker: String, body: &[u8]| {
        content.extend_from_slice(marker.as_bytes());
        content.push(b'\n');
        content.extend_from_slice(body);
        if !body.is_empty() && !body.ends_with(b"\n") {
            content.push(b'\n');
        }
    };
    section(format!("<<<<<<< {}", labels.ours), ours);
    section("||||||| base".to_string(), base);
    section("=======".to_string(), theirs);
    content.extend_from_slice(format!(">>>>>>> {}\n", labels.theirs).as_bytes());

    content
}
