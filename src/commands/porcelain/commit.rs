use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::UgitError;

impl Repository {
    /// Record the index as a new commit on top of HEAD and advance the current branch
    ///
    /// While a merge is pending the merged commit becomes the second parent, an empty message
    /// falls back to the recorded merge message, and the merge state is cleared afterwards.
    /// Fails with `Conflict` while any index entry is still conflicted, or when HEAD moved
    /// under the operation.
    pub fn commit(&self, message: &str) -> anyhow::Result<ObjectId> {
        let _lock = self.lock_index()?;

        let merge_state = self.merge_state();
        let message = match (message.trim(), merge_state.message()?) {
            ("", Some(merge_message)) => merge_message.trim().to_string(),
            (message, _) => message.to_string(),
        };
        if message.is_empty() {
            return Err(UgitError::InvalidName {
                name: String::new(),
                reason: "aborting commit due to empty commit message".to_string(),
            }
            .into());
        }

        let tree_oid = self.write_index_tree()?;

        let head = self.refs().read_head()?;
        let merge_head = merge_state.merge_head()?;
        let parents = head.iter().chain(merge_head.iter()).cloned().collect::<Vec<_>>();

        let commit_oid = self.commit_tree(&tree_oid, &parents, &format!("{message}\n"))?;
        let updated_ref = self.refs().update_head(&commit_oid, head.as_ref())?;
        merge_state.clear()?;

        let is_root = if head.is_none() { "(root-commit) " } else { "" };
        writeln!(
            self.writer(),
            "[{} {}{}] {}",
            updated_ref.short_name(),
            is_root,
            commit_oid.to_short_oid(),
            message.lines().next().unwrap_or_default()
        )?;

        Ok(commit_oid)
    }
}
