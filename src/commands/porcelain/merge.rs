use crate::areas::repository::Repository;
use crate::artifacts::branch::revision::Revision;
use crate::artifacts::checkout::migration::Migration;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::merge::merge_result::MergeResult;
use crate::artifacts::merge::resolve::{MergeLabels, TreeMerge};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::tree::walker::TreeWalker;
use crate::errors::UgitError;

impl Repository {
    /// Merge `target` (a branch or any revision) into the current HEAD
    ///
    /// Fast-forwards when HEAD is an ancestor of the target, otherwise merges the trees against
    /// the merge base. Conflicts leave markers in the working tree, flagged entries in the
    /// index and a pending merge for `commit` to conclude; they are reported through the
    /// returned [`MergeResult`], not as an error.
    ///
    /// Refused with `Conflict` while another merge is pending, when the index holds staged
    /// changes, or when working-tree changes would be overwritten.
    pub fn merge(&self, target: &str) -> anyhow::Result<MergeResult> {
        let merge_state = self.merge_state();
        if merge_state.is_pending() {
            return Err(UgitError::Conflict(
                "a merge is already in progress; commit the result or abort it first".to_string(),
            )
            .into());
        }

        let ours = self
            .refs()
            .read_head()?
            .ok_or_else(|| UgitError::not_found("commit", "HEAD (nothing to merge into)"))?;
        let theirs = Revision::resolve_str(target, self)?;

        if self.is_ancestor(&theirs, &ours)? {
            writeln!(self.writer(), "Already up to date.")?;
            return Ok(MergeResult::AlreadyUpToDate);
        }

        let _lock = self.lock_index()?;
        let walker = TreeWalker::new(self.database());
        let ours_tree = walker.flatten_commit(Some(&ours))?;
        if self.index().to_flat_tree() != ours_tree {
            return Err(UgitError::Conflict(
                "your index contains uncommitted changes; commit them before merging".to_string(),
            )
            .into());
        }

        if self.is_ancestor(&ours, &theirs)? {
            let theirs_tree = walker.flatten_commit(Some(&theirs))?;
            Migration::new(self, &ours_tree, &theirs_tree).apply_changes(false)?;
            self.index_mut().write_updates()?;
            self.refs().update_head(&theirs, Some(&ours))?;

            writeln!(
                self.writer(),
                "Updating {}..{}\nFast-forward",
                ours.to_short_oid(),
                theirs.to_short_oid()
            )?;
            return Ok(MergeResult::FastForward { from: ours, to: theirs });
        }

        let base = self.merge_base(&ours, &theirs)?;
        let labels = MergeLabels::new(self.refs().current_ref()?.short_name(), target);
        let outcome = TreeMerge::new(self.database(), labels).merge(
            self.commit_tree_of(base.as_ref())?.as_ref(),
            self.database().load_commit(&ours)?.tree_oid(),
            self.database().load_commit(&theirs)?.tree_oid(),
        )?;

        Migration::new(self, &ours_tree, &outcome.files).apply_changes(false)?;
        for path in outcome.conflicted_paths() {
            if let Some(oid) = outcome.files.get(&path) {
                self.index_mut().add(IndexEntry::conflicted(path, oid.clone()));
            }
        }
        self.index_mut().write_updates()?;

        let message = match self.refs().lookup(target).and_then(|name| name.branch_name()) {
            Some(branch) => format!("Merge branch '{branch}'\n"),
            None => format!("Merge commit '{target}'\n"),
        };
        if outcome.is_clean() {
            let tree_oid = self.store_flat_tree(&outcome.files)?;
            let commit = self.commit_tree(&tree_oid, &[ours.clone(), theirs], &message)?;
            self.refs().update_head(&commit, Some(&ours))?;

            writeln!(self.writer(), "Merge made by the 'recursive' strategy.")?;
            return Ok(MergeResult::Merged { commit, base });
        }

        merge_state.record(&theirs, &message)?;
        {
            let mut writer = self.writer();
            for conflict in &outcome.conflicts {
                writeln!(writer, "{}", conflict.describe())?;
            }
            writeln!(writer, "Automatic merge failed; fix conflicts and then commit the result.")?;
        }

        Ok(MergeResult::Conflicted {
            base,
            conflicts: outcome.conflicts,
        })
    }

    /// Abandon a pending merge, restoring HEAD's tree in the index and the working tree
    pub fn abort_merge(&self) -> anyhow::Result<()> {
        let merge_state = self.merge_state();
        if !merge_state.is_pending() {
            return Err(UgitError::not_found("merge in progress", "MERGE_HEAD").into());
        }

        let _lock = self.lock_index()?;
        let head = self.refs().read_head()?;
        let head_tree = TreeWalker::new(self.database()).flatten_commit(head.as_ref())?;

        let index_tree = self.index().to_flat_tree();
        Migration::new(self, &index_tree, &head_tree).apply_changes(true)?;
        {
            let mut index = self.index_mut();
            index.load_tree(&head_tree);
            index.write_updates()?;
        }
        merge_state.clear()?;

        writeln!(self.writer(), "Merge aborted.")?;

        Ok(())
    }

    fn commit_tree_of(&self, commit: Option<&ObjectId>) -> anyhow::Result<Option<ObjectId>> {
        commit
            .map(|commit| Ok(self.database().load_commit(commit)?.tree_oid().clone()))
            .transpose()
    }
}
