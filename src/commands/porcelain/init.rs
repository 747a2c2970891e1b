use crate::DEFAULT_BRANCH;
use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::{BranchName, RefName};
use crate::errors::UgitError;
use anyhow::Context;
use std::fs;

impl Repository {
    /// Create `.ugit` with an unborn default branch and an empty index
    pub fn init(&self) -> anyhow::Result<()> {
        let ugit_path = self.ugit_path();
        if ugit_path.exists() {
            return Err(UgitError::AlreadyExists(format!(
                "repository at {}",
                ugit_path.display()
            ))
            .into());
        }

        fs::create_dir_all(self.database().objects_path())
            .context("failed to create .ugit/objects directory")?;
        fs::create_dir_all(self.refs().heads_path())
            .context("failed to create .ugit/refs/heads directory")?;
        fs::create_dir_all(self.refs().tags_path())
            .context("failed to create .ugit/refs/tags directory")?;

        let default_branch = RefName::branch(&BranchName::try_parse(DEFAULT_BRANCH)?);
        self.refs()
            .set_symbolic(&RefName::head(), &default_branch)
            .context("failed to create the initial HEAD reference")?;

        let mut index = self.index_mut();
        index.clear();
        index.write_updates().context("failed to create .ugit/index")?;

        writeln!(
            self.writer(),
            "Initialized empty ugit repository in {}",
            ugit_path.display()
        )?;

        Ok(())
    }
}
