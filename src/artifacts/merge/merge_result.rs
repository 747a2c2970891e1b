use crate::artifacts::merge::resolve::MergeConflict;
use crate::artifacts::objects::object_id::ObjectId;

/// Outcome of merging another branch into the current one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeResult {
    /// The other side is already reachable from ours
    AlreadyUpToDate,
    /// Ours was an ancestor: the branch moved, no commit was created
    FastForward { from: ObjectId, to: ObjectId },
    /// A two-parent merge commit was created
    Merged { commit: ObjectId, base: Option<ObjectId> },
    /// The merge stopped with conflicts recorded in the index and the working tree
    Conflicted {
        base: Option<ObjectId>,
        conflicts: Vec<MergeConflict>,
    },
}

impl MergeResult {
    pub fn is_conflicted(&self) -> bool {
        matches!(self, MergeResult::Conflicted { .. })
    }

    /// Commit HEAD points to once the merge is done, None while conflicts are pending
    pub fn head(&self) -> Option<&ObjectId> {
        match self {
            MergeResult::FastForward { to, .. } => Some(to),
            MergeResult::Merged { commit, .. } => Some(commit),
            MergeResult::AlreadyUpToDate | MergeResult::Conflicted { .. } => None,
        }
    }

    pub fn conflicts(&self) -> &[MergeConflict] {
        match self {
            MergeResult::Conflicted { conflicts, .. } => conflicts,
            _ => &[],
        }
    }
}
