//! Commit object
//!
//! ## Format
//!
//! ```text
//! tree <tree id>
//! parent <parent id>      (zero or more, in order)
//! author <name>
//!
//! <message>
//! ```
//!
//! The message is stored verbatim after the blank separator line.

use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use derive_new::new;

/// Environment variable naming the commit author
pub const AUTHOR_NAME_ENV: &str = "UGIT_AUTHOR_NAME";

/// Author used when the environment does not name one
pub const DEFAULT_AUTHOR_NAME: &str = "anonymous";

/// Plain author name
#[derive(Debug, Clone, Eq, PartialEq, new)]
pub struct Author {
    name: String,
}

impl Author {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the author from `UGIT_AUTHOR_NAME`, falling back to `anonymous`
    pub fn load_from_env() -> Self {
        let name = std::env::var(AUTHOR_NAME_ENV)
            .ok()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty() && !name.contains('\n'))
            .unwrap_or_else(|| DEFAULT_AUTHOR_NAME.to_string());

        Author::new(name)
    }
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    /// Empty for a root commit, two or more for a merge
    parents: Vec<ObjectId>,
    tree_oid: ObjectId,
    author: Author,
    message: String,
}

impl Commit {
    pub fn new(
        parents: Vec<ObjectId>,
        tree_oid: ObjectId,
        author: Author,
        message: String,
    ) -> Self {
        Commit {
            parents,
            tree_oid,
            author,
            message,
        }
    }

    /// First line of the message, used by one-line log output
    pub fn short_message(&self) -> String {
        self.message.lines().next().unwrap_or("").to_string()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    pub fn parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    fn header_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("tree {}", self.tree_oid)];
        lines.extend(self.parents.iter().map(|parent| format!("parent {parent}")));
        lines.push(format!("author {}", self.author));
        lines
    }
}

impl Packable for Commit {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let content = format!("{}\n\n{}", self.header_lines().join("\n"), self.message);
        Ok(Bytes::from(content))
    }
}

impl Unpackable for Commit {
    fn deserialize(payload: Bytes) -> anyhow::Result<Self> {
        let content = String::from_utf8(payload.to_vec()).context("commit is not valid UTF-8")?;
        let (header, message) = content
            .split_once("\n\n")
            .context("Invalid commit object: missing message separator")?;
        let mut lines = header.lines();

        let tree_oid = lines
            .next()
            .and_then(|line| line.strip_prefix("tree "))
            .context("Invalid commit object: missing tree line")?;
        let tree_oid = ObjectId::try_parse(tree_oid)?;

        let mut parents = Vec::new();
        let mut author = None;
        for line in lines {
            match (line.strip_prefix("parent "), line.strip_prefix("author ")) {
                (Some(parent), _) if author.is_none() => parents.push(ObjectId::try_parse(parent)?),
                (None, Some(name)) if author.is_none() => author = Some(Author::new(name.into())),
                _ => anyhow::bail!("Invalid commit object: unexpected header line '{line}'"),
            }
        }
        let author = author.context("Invalid commit object: missing author line")?;

        Ok(Self::new(parents, tree_oid, author, message.to_string()))
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    fn display(&self) -> String {
        format!("{}\n\n{}", self.header_lines().join("\n"), self.message)
    }
}
