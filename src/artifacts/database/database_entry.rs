use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use derive_new::new;

/// What a tree entry points to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Blob,
    Tree,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        self.object_type().as_str()
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            EntryKind::Blob => ObjectType::Blob,
            EntryKind::Tree => ObjectType::Tree,
        }
    }
}

impl TryFrom<&str> for EntryKind {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> anyhow::Result<Self> {
        match ObjectType::try_from(value)? {
            ObjectType::Blob => Ok(EntryKind::Blob),
            ObjectType::Tree => Ok(EntryKind::Tree),
            ObjectType::Commit => anyhow::bail!("a tree cannot point to a commit"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, new)]
pub struct DatabaseEntry {
    pub oid: ObjectId,
    pub kind: EntryKind,
}

impl DatabaseEntry {
    pub fn blob(oid: ObjectId) -> Self {
        Self::new(oid, EntryKind::Blob)
    }

    pub fn tree(oid: ObjectId) -> Self {
        Self::new(oid, EntryKind::Tree)
    }

    pub fn is_tree(&self) -> bool {
        self.kind == EntryKind::Tree
    }
}
