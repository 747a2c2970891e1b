use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::tree::FlatTree;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeChangeType {
    Added(ObjectId),
    Deleted(ObjectId),
    Modified { old: ObjectId, new: ObjectId },
}

impl TreeChangeType {
    pub fn from_entries(old: Option<&ObjectId>, new: Option<&ObjectId>) -> Option<Self> {
        match (old, new) {
            (None, Some(new)) => Some(TreeChangeType::Added(new.clone())),
            (Some(old), None) => Some(TreeChangeType::Deleted(old.clone())),
            (Some(old), Some(new)) if old != new => Some(TreeChangeType::Modified {
                old: old.clone(),
                new: new.clone(),
            }),
            _ => None,
        }
    }

    pub fn old_entry(&self) -> Option<&ObjectId> {
        match self {
            TreeChangeType::Deleted(oid) => Some(oid),
            TreeChangeType::Modified { old, .. } => Some(old),
            TreeChangeType::Added(_) => None,
        }
    }

    pub fn new_entry(&self) -> Option<&ObjectId> {
        match self {
            TreeChangeType::Added(oid) => Some(oid),
            TreeChangeType::Modified { new, .. } => Some(new),
            TreeChangeType::Deleted(_) => None,
        }
    }

    pub fn status_char(&self) -> char {
        match self {
            TreeChangeType::Added(_) => 'A',
            TreeChangeType::Deleted(_) => 'D',
            TreeChangeType::Modified { .. } => 'M',
        }
    }
}

pub type ChangeSet = BTreeMap<PathBuf, TreeChangeType>;

/// Path-level differences between two flattened snapshots
#[derive(Debug, Default)]
pub struct TreeDiff {
    change_set: ChangeSet,
}

impl TreeDiff {
    pub fn between(old: &FlatTree, new: &FlatTree) -> Self {
        let change_set = old
            .keys()
            .chain(new.keys())
            .filter_map(|path| {
                TreeChangeType::from_entries(old.get(path), new.get(path))
                    .map(|change| (path.clone(), change))
            })
            .collect();

        TreeDiff { change_set }
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.change_set
    }

    pub fn get(&self, path: &Path) -> Option<&TreeChangeType> {
        self.change_set.get(path)
    }

    pub fn is_empty(&self) -> bool {
        self.change_set.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn oid(seed: u8) -> ObjectId {
        ObjectId::from_digest(&[seed; 20]).unwrap()
    }

    #[test]
    fn changes_are_classified_per_path() {
        let old = FlatTree::from([
            (PathBuf::from("same"), oid(1)),
            (PathBuf::from("changed"), oid(2)),
            (PathBuf::from("removed"), oid(3)),
        ]);
        let new = FlatTree::from([
            (PathBuf::from("same"), oid(1)),
            (PathBuf::from("changed"), oid(4)),
            (PathBuf::from("added"), oid(5)),
        ]);

        let diff = TreeDiff::between(&old, &new);

        assert_eq!(
            diff.changes()
                .iter()
                .map(|(path, change)| (path.to_str().unwrap(), change.status_char()))
                .collect::<Vec<_>>(),
            vec![("added", 'A'), ("changed", 'M'), ("removed", 'D')]
        );
        assert_eq!(diff.get(Path::new("same")), None);
    }
}
