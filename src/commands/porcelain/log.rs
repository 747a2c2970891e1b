use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::RefName;
use crate::artifacts::branch::revision::Revision;
use crate::artifacts::log::rev_list::RevList;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use colored::Colorize;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub oneline: bool,
    pub abbrev_commit: bool,
    pub decorate: bool,
}

impl Repository {
    /// History reachable from `start` (HEAD when None), newest first
    ///
    /// The walk is lazy and breadth-first over parent edges; each commit is yielded once. An
    /// unborn HEAD gives an empty history.
    pub fn log(&self, start: Option<&str>) -> anyhow::Result<RevList<'_>> {
        let start = match start {
            Some(start) => Some(Revision::resolve_str(start, self)?),
            None => self.refs().read_head()?,
        };

        Ok(RevList::new(self.database(), start))
    }

    pub fn print_log(&self, start: Option<&str>, options: &LogOptions) -> anyhow::Result<()> {
        let decorations = if options.decorate {
            self.refs().reverse_refs()?
        } else {
            HashMap::new()
        };
        let current_ref = self.refs().current_ref()?;

        for (index, entry) in self.log(start)?.enumerate() {
            let (oid, commit) = entry?;
            let decoration = Self::decoration(decorations.get(&oid), &current_ref);
            let shown_oid = if options.abbrev_commit || options.oneline {
                oid.to_short_oid()
            } else {
                oid.to_string()
            };

            if options.oneline {
                writeln!(
                    self.writer(),
                    "{}{decoration} {}",
                    shown_oid.yellow(),
                    commit.short_message()
                )?;
            } else {
                if index > 0 {
                    writeln!(self.writer())?;
                }
                self.show_commit_medium(&shown_oid, &decoration, &commit)?;
            }
        }

        Ok(())
    }

    fn show_commit_medium(
        &self,
        shown_oid: &str,
        decoration: &str,
        commit: &Commit,
    ) -> anyhow::Result<()> {
        let mut writer = self.writer();

        writeln!(writer, "{}{decoration}", format!("commit {shown_oid}").yellow())?;
        if commit.is_merge() {
            let parents = commit
                .parents()
                .iter()
                .map(ObjectId::to_short_oid)
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(writer, "Merge: {parents}")?;
        }
        writeln!(writer, "Author: {}", commit.author())?;
        writeln!(writer)?;
        for message_line in commit.message().lines() {
            writeln!(writer, "    {message_line}")?;
        }

        Ok(())
    }

    /// ` (HEAD -> main, feature)` style list of the references pointing at a commit
    fn decoration(ref_names: Option<&Vec<RefName>>, current_ref: &RefName) -> String {
        let Some(ref_names) = ref_names else {
            return String::new();
        };

        let head_here = ref_names.iter().any(RefName::is_head);
        let names = ref_names
            .iter()
            .filter(|name| !name.is_head() || current_ref.is_head())
            .map(|name| {
                if name.is_head() {
                    "HEAD".cyan().bold().to_string()
                } else if head_here && name == current_ref {
                    format!("{} -> {}", "HEAD".cyan().bold(), name.short_name().green().bold())
                } else {
                    name.short_name().green().bold().to_string()
                }
            })
            .collect::<Vec<_>>();

        if names.is_empty() {
            return String::new();
        }

        format!(" ({})", names.join(", "))
    }
}
