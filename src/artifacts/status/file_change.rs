use colored::Colorize;

const LABEL_WIDTH: usize = 8;

/// Difference between the index and the working tree for one path
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum WorkspaceChangeType {
    #[default]
    None,
    Untracked,
    Modified,
    Deleted,
}

impl From<&WorkspaceChangeType> for &str {
    fn from(change: &WorkspaceChangeType) -> Self {
        match change {
            WorkspaceChangeType::None => " ",
            WorkspaceChangeType::Untracked => "??",
            WorkspaceChangeType::Modified => "M",
            WorkspaceChangeType::Deleted => "D",
        }
    }
}

/// Difference between the HEAD tree and the index for one path
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum IndexChangeType {
    #[default]
    None,
    Added,
    Modified,
    Deleted,
}

impl From<&IndexChangeType> for &str {
    fn from(change: &IndexChangeType) -> Self {
        match change {
            IndexChangeType::None => " ",
            IndexChangeType::Added => "A",
            IndexChangeType::Modified => "M",
            IndexChangeType::Deleted => "D",
        }
    }
}

/// A change in one area, rendered as the long-format label of `status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FileChangeType {
    Workspace(WorkspaceChangeType),
    Index(IndexChangeType),
    Conflicted,
}

impl From<&FileChangeType> for &str {
    fn from(change: &FileChangeType) -> Self {
        match change {
            FileChangeType::Workspace(workspace_change) => match workspace_change {
                WorkspaceChangeType::None | WorkspaceChangeType::Untracked => "",
                WorkspaceChangeType::Modified => "modified:   ",
                WorkspaceChangeType::Deleted => "deleted:    ",
            },
            FileChangeType::Index(index_change) => match index_change {
                IndexChangeType::None => "",
                IndexChangeType::Added => "new file:   ",
                IndexChangeType::Modified => "modified:   ",
                IndexChangeType::Deleted => "deleted:    ",
            },
            FileChangeType::Conflicted => "both modified:   ",
        }
    }
}

impl std::fmt::Display for FileChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label: &str = self.into();
        let colored_label = match self {
            FileChangeType::Workspace(_) | FileChangeType::Conflicted => label.red(),
            FileChangeType::Index(_) => label.green(),
        };
        write!(f, "{:>width$}{}", "", colored_label, width = LABEL_WIDTH)
    }
}

/// Both sides of a path's status, printed as the two-letter porcelain code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct FileChange {
    pub index_change: IndexChangeType,
    pub workspace_change: WorkspaceChangeType,
}

impl From<&FileChange> for String {
    fn from(change: &FileChange) -> Self {
        if change.workspace_change == WorkspaceChangeType::Untracked {
            return "??".to_string();
        }

        let index_str: &str = (&change.index_change).into();
        let workspace_str: &str = (&change.workspace_change).into();
        format!("{index_str}{workspace_str}")
    }
}

impl std::fmt::Display for FileChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let change_str: String = self.into();
        write!(f, "{change_str}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(IndexChangeType::Added, WorkspaceChangeType::None, "A ")]
    #[case(IndexChangeType::Added, WorkspaceChangeType::Modified, "AM")]
    #[case(IndexChangeType::None, WorkspaceChangeType::Deleted, " D")]
    #[case(IndexChangeType::None, WorkspaceChangeType::Untracked, "??")]
    fn short_codes_combine_both_areas(
        #[case] index_change: IndexChangeType,
        #[case] workspace_change: WorkspaceChangeType,
        #[case] expected: &str,
    ) {
        let change = FileChange {
            index_change,
            workspace_change,
        };

        assert_eq!(change.to_string(), expected);
    }
}
