use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::branch::revision::Revision;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::UgitError;
use colored::Colorize;

impl Repository {
    /// Create a branch at `start` (a revision), or at HEAD when None
    pub fn branch(&self, branch_name: &str, start: Option<&str>) -> anyhow::Result<ObjectId> {
        let branch_name = BranchName::try_parse(branch_name)?;

        let source_oid = match start {
            Some(start) => Revision::resolve_str(start, self)?,
            None => self
                .refs()
                .read_head()?
                .ok_or_else(|| UgitError::not_found("commit", "HEAD (no commit to branch from)"))?,
        };

        self.refs().create_branch(&branch_name, &source_oid)?;

        Ok(source_oid)
    }

    /// Delete a branch other than the checked-out one, returning the commit it pointed to
    pub fn delete_branch(&self, branch_name: &str) -> anyhow::Result<ObjectId> {
        let branch_name = BranchName::try_parse(branch_name)?;
        let oid = self.refs().delete_branch(&branch_name)?;

        writeln!(
            self.writer(),
            "Deleted branch {branch_name} (was {}).",
            oid.to_short_oid()
        )?;

        Ok(oid)
    }

    /// Every branch name, sorted
    pub fn branches(&self) -> anyhow::Result<Vec<BranchName>> {
        self.refs().list_branches()
    }

    /// Print the branches, marking the checked-out one
    pub fn list_branches(&self) -> anyhow::Result<()> {
        let current = self.refs().current_branch()?;
        let mut writer = self.writer();

        for branch in self.branches()? {
            if current.as_ref() == Some(&branch) {
                writeln!(writer, "* {}", branch.as_ref().green())?;
            } else {
                writeln!(writer, "  {branch}")?;
            }
        }

        Ok(())
    }
}
