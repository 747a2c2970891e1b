use crate::areas::repository::Repository;
use crate::artifacts::status::file_change::FileChangeType;
use crate::artifacts::status::status_info::{Status, StatusInfo};
use colored::Colorize;

impl Repository {
    /// Compare HEAD, the index and the working tree
    pub fn status(&self) -> anyhow::Result<StatusInfo> {
        self.load_index()?;

        Status::new(self).collect()
    }

    /// Print a status, either as two-letter codes (`porcelain`) or in the long format
    pub fn print_status(&self, info: &StatusInfo, porcelain: bool) -> anyhow::Result<()> {
        if porcelain {
            self.print_porcelain_status(info)
        } else {
            self.print_long_status(info)
        }
    }

    fn print_porcelain_status(&self, info: &StatusInfo) -> anyhow::Result<()> {
        let mut writer = self.writer();

        for path in &info.conflicted {
            writeln!(writer, "UU {}", path.display())?;
        }
        for (path, change) in info.changed_files() {
            writeln!(writer, "{change} {}", path.display())?;
        }
        for path in &info.untracked {
            writeln!(writer, "?? {}", path.display())?;
        }

        Ok(())
    }

    fn print_long_status(&self, info: &StatusInfo) -> anyhow::Result<()> {
        let mut writer = self.writer();

        match self.refs().current_branch()? {
            Some(branch) => writeln!(writer, "On branch {branch}")?,
            None => writeln!(writer, "{}", "HEAD detached".red())?,
        }
        if self.merge_state().is_pending() {
            writeln!(writer, "You have unmerged paths.")?;
            writeln!(writer, "  (fix conflicts and run \"ugit commit\")")?;
            writeln!(writer, "  (use \"ugit merge --abort\" to abort the merge)")?;
        }

        if !info.conflicted.is_empty() {
            writeln!(writer, "\nUnmerged paths:")?;
            for path in &info.conflicted {
                writeln!(writer, "{}{}", FileChangeType::Conflicted, path.display())?;
            }
        }

        if !info.staged.is_empty() {
            writeln!(writer, "\nChanges to be committed:")?;
            for (path, change) in &info.staged {
                writeln!(writer, "{}{}", FileChangeType::Index(*change), path.display())?;
            }
        }

        if !info.unstaged.is_empty() {
            writeln!(writer, "\nChanges not staged for commit:")?;
            for (path, change) in &info.unstaged {
                writeln!(writer, "{}{}", FileChangeType::Workspace(*change), path.display())?;
            }
        }

        if !info.untracked.is_empty() {
            writeln!(writer, "\nUntracked files:")?;
            for path in &info.untracked {
                writeln!(writer, "        {}", path.display().to_string().red())?;
            }
        }

        if info.is_clean() {
            writeln!(writer, "nothing to commit, working tree clean")?;
        }

        Ok(())
    }
}
