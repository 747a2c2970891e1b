use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::{BranchName, RefName};
use crate::artifacts::branch::revision::Revision;
use crate::artifacts::checkout::migration::Migration;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::tree::walker::TreeWalker;
use crate::errors::UgitError;

const DETACHMENT_NOTICE: &str = r#"
You are in 'detached HEAD' state. You can look around, make experimental
changes and commit them, and you can discard any commits you make in this
state without impacting any branches by performing another checkout.

If you want to create a new branch to retain commits you create, you may
do so (now or later) by using the branch command. Example:

    ugit branch <new-branch-name>
"#;

impl Repository {
    /// Switch the working tree, the index and HEAD to `target`
    ///
    /// A branch name leaves HEAD attached to that branch; any other revision (id, id prefix,
    /// `rev^`, `rev~n`, `@`) detaches HEAD at the commit. Local changes that would be
    /// overwritten fail the checkout with `Conflict` unless `force` is set, in which case the
    /// index is reset to the target. Any pending merge is abandoned once HEAD has moved.
    pub fn checkout(&self, target: &str, force: bool) -> anyhow::Result<ObjectId> {
        let target_branch = BranchName::try_parse(target)
            .ok()
            .filter(|branch| self.refs().exists(&RefName::branch(branch)));
        let target_oid = Revision::resolve_str(target, self)?;

        let current_ref = self.refs().current_ref()?;
        let current_oid = self.refs().read_head()?;

        let _lock = self.lock_index()?;
        if self.index().has_conflicts() && !force {
            return Err(UgitError::Conflict(
                "you need to resolve your current index first".to_string(),
            )
            .into());
        }

        let walker = TreeWalker::new(self.database());
        let target_tree = walker.flatten_commit(Some(&target_oid))?;

        if force {
            let index_tree = self.index().to_flat_tree();
            Migration::new(self, &index_tree, &target_tree).apply_changes(true)?;
            self.index_mut().load_tree(&target_tree);
        } else {
            let current_tree = walker.flatten_commit(current_oid.as_ref())?;
            Migration::new(self, &current_tree, &target_tree).apply_changes(false)?;
        }
        self.index_mut().write_updates()?;

        match &target_branch {
            Some(branch) => self.refs().set_symbolic(&RefName::head(), &RefName::branch(branch))?,
            None => self.refs().detach_head(&target_oid)?,
        }
        self.merge_state().clear()?;
        let new_ref = self.refs().current_ref()?;

        self.print_previous_head(&current_ref, current_oid.as_ref(), &target_oid)?;
        self.print_detachment_notice(&current_ref, &new_ref, target)?;
        self.print_new_head(&current_ref, &new_ref, &target_oid, target)?;

        Ok(target_oid)
    }

    fn print_previous_head(
        &self,
        current_ref: &RefName,
        current_oid: Option<&ObjectId>,
        target_oid: &ObjectId,
    ) -> anyhow::Result<()> {
        if let Some(current_oid) = current_oid
            && current_ref.is_head()
            && current_oid != target_oid
        {
            self.print_head_position("Previous HEAD position was", current_oid)?;
        }

        Ok(())
    }

    fn print_detachment_notice(
        &self,
        current_ref: &RefName,
        new_ref: &RefName,
        target: &str,
    ) -> anyhow::Result<()> {
        if !current_ref.is_head() && new_ref.is_head() {
            writeln!(self.writer(), "Note: checking out '{target}'.\n{DETACHMENT_NOTICE}")?;
        }

        Ok(())
    }

    fn print_new_head(
        &self,
        current_ref: &RefName,
        new_ref: &RefName,
        target_oid: &ObjectId,
        target: &str,
    ) -> anyhow::Result<()> {
        if new_ref.is_head() {
            self.print_head_position("HEAD is now at", target_oid)?;
        } else if new_ref == current_ref {
            writeln!(self.writer(), "Already on '{target}'")?;
        } else {
            writeln!(self.writer(), "Switched to branch '{target}'")?;
        }

        Ok(())
    }

    fn print_head_position(&self, message: &str, oid: &ObjectId) -> anyhow::Result<()> {
        let commit = self.database().load_commit(oid)?;

        writeln!(
            self.writer(),
            "{message} {} {}",
            oid.to_short_oid(),
            commit.short_message()
        )?;

        Ok(())
    }
}
