#[derive(Debug)]
pub struct ConflictMessage {
    pub header: &'static str,
    pub footer: &'static str,
}

impl From<&ConflictType> for ConflictMessage {
    fn from(value: &ConflictType) -> Self {
        match value {
            ConflictType::StaleFile => Self {
                header: "Your local changes to the following files would be overwritten:",
                footer: "Please commit your changes before you switch branches or merge.",
            },
            ConflictType::StaleDirectory => Self {
                header: "Updating the following directories would lose untracked files in them:",
                footer: "",
            },
            ConflictType::UntrackedOverwritten => Self {
                header: "The following untracked working tree files would be overwritten:",
                footer: "Please move or remove them before you switch branches or merge.",
            },
            ConflictType::UntrackedRemoved => Self {
                header: "The following untracked working tree files would be removed:",
                footer: "Please move or remove them before you switch branches or merge.",
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConflictType {
    StaleFile,
    StaleDirectory,
    UntrackedOverwritten,
    UntrackedRemoved,
}

impl ConflictType {
    /// Category for a working-tree file in the way of a planned change
    pub fn get_conflict_type(tracked: bool, is_dir: bool, keeps_file: bool) -> ConflictType {
        if tracked {
            ConflictType::StaleFile
        } else if is_dir {
            ConflictType::StaleDirectory
        } else if keeps_file {
            ConflictType::UntrackedOverwritten
        } else {
            ConflictType::UntrackedRemoved
        }
    }
}
