use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::objects::object_id::ObjectId;

impl Repository {
    /// Store a commit object without touching any reference
    ///
    /// The tree must be a stored tree and every parent a stored commit; a missing object is
    /// `NotFound`, an object of another type is `CorruptObject`.
    pub fn commit_tree(
        &self,
        tree_oid: &ObjectId,
        parents: &[ObjectId],
        message: &str,
    ) -> anyhow::Result<ObjectId> {
        self.database().load_tree(tree_oid)?;
        for parent in parents {
            self.database().load_commit(parent)?;
        }

        let commit = Commit::new(
            parents.to_vec(),
            tree_oid.clone(),
            Author::load_from_env(),
            message.to_string(),
        );

        self.database().store(&commit)
    }

    /// Parents of a commit, in order
    pub fn parents(&self, commit_oid: &ObjectId) -> anyhow::Result<Vec<ObjectId>> {
        Ok(self.database().load_commit(commit_oid)?.parents().to_vec())
    }
}
