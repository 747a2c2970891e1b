use crate::areas::refs::ResolvedRef;
use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::branch::{
    ANCESTOR_REGEX, MIN_ABBREVIATED_OID_LENGTH, PARENT_REGEX, REF_ALIASES,
};
use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::UgitError;
use anyhow::Context;

/// A revision expression naming one commit
///
/// Supported forms:
/// - Reference names: `main`, `feature/new-feature`, `HEAD`, `refs/heads/main`, tags
/// - Aliases: `@` (resolves to `HEAD`)
/// - Full object ids and abbreviated ids of at least four hex characters
/// - Parent notation: `<revision>^` (first parent)
/// - Ancestor notation: `<revision>~<n>` (n-th first-parent ancestor)
///
/// Hex strings parse as names too: a reference of that name wins over an id prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revision {
    /// A reference name, or an object id resolved as a fallback
    Ref(BranchName),
    /// The Nth ancestor of a revision (e.g., HEAD~3)
    Ancestor(Box<Revision>, usize),
    /// The parent of a revision (e.g., HEAD^)
    Parent(Box<Revision>),
}

impl Revision {
    /// Resolve to a commit id
    ///
    /// Fails with `NotFound` for unknown names, unborn branches and walks past a root commit,
    /// and with `CorruptObject` when the named object is not a commit.
    pub fn resolve(&self, repository: &Repository) -> anyhow::Result<ObjectId> {
        match self {
            Revision::Ref(name) => Self::resolve_name(name.as_ref(), repository),
            Revision::Parent(base_revision) => {
                Self::resolve_commit_parent(&base_revision.resolve(repository)?, repository)
            }
            Revision::Ancestor(base_revision, generations) => {
                let mut oid = base_revision.resolve(repository)?;
                for _ in 0..*generations {
                    oid = Self::resolve_commit_parent(&oid, repository)?;
                }

                Ok(oid)
            }
        }
    }

    /// Parse and resolve in one step
    pub fn resolve_str(revision: &str, repository: &Repository) -> anyhow::Result<ObjectId> {
        Self::try_parse(revision)?.resolve(repository)
    }

    fn resolve_name(name: &str, repository: &Repository) -> anyhow::Result<ObjectId> {
        if let Some(ref_name) = repository.refs().lookup(name) {
            return match repository.refs().read(&ref_name)? {
                ResolvedRef::Direct(oid) => Ok(oid),
                ResolvedRef::Unborn(target) => Err(UgitError::not_found(
                    "commit",
                    format!("{name} ({target} is unborn)"),
                )
                .into()),
            };
        }

        if Self::looks_like_oid(name) {
            Self::resolve_oid(name, repository)
        } else {
            Err(UgitError::not_found("revision", name).into())
        }
    }

    fn resolve_commit_parent(oid: &ObjectId, repository: &Repository) -> anyhow::Result<ObjectId> {
        let commit = repository.database().load_commit(oid)?;

        commit
            .parent()
            .cloned()
            .ok_or_else(|| {
                UgitError::not_found(
                    "parent commit",
                    format!("{} has no parent", oid.to_short_oid()),
                )
                .into()
            })
    }

    fn resolve_oid(oid_str: &str, repository: &Repository) -> anyhow::Result<ObjectId> {
        if oid_str.len() == OBJECT_ID_LENGTH {
            let oid = ObjectId::try_parse(oid_str)?;
            Self::validate_oid_is_commit(&oid, repository)?;
            return Ok(oid);
        }

        let matches = repository.database().find_objects_by_prefix(oid_str)?;
        let commit_matches = matches
            .iter()
            .filter(|oid| {
                repository
                    .database()
                    .object_type(oid)
                    .is_ok_and(|object_type| object_type == ObjectType::Commit)
            })
            .collect::<Vec<_>>();

        match (matches.len(), commit_matches.as_slice()) {
            (0, _) => Err(UgitError::not_found("revision", oid_str).into()),
            (_, [oid]) => Ok((*oid).clone()),
            (1, []) => {
                Self::validate_oid_is_commit(&matches[0], repository)?;
                Ok(matches[0].clone())
            }
            (_, []) => Err(UgitError::not_found("commit", oid_str).into()),
            (_, candidates) => {
                let mut error_msg =
                    format!("short id {oid_str} is ambiguous\nhint: The candidates are:");
                for oid in candidates {
                    error_msg.push_str(&format!("\nhint:   {} commit", oid.to_short_oid()));
                }
                Err(UgitError::InvalidName {
                    name: oid_str.to_string(),
                    reason: error_msg,
                }
                .into())
            }
        }
    }

    fn validate_oid_is_commit(oid: &ObjectId, repository: &Repository) -> anyhow::Result<()> {
        if !repository.database().exists(oid) {
            return Err(UgitError::not_found("object", oid).into());
        }
        repository.database().load_commit(oid)?;

        Ok(())
    }

    pub fn try_parse(revision: &str) -> anyhow::Result<Revision> {
        let parent_regex = regex::Regex::new(PARENT_REGEX)
            .with_context(|| format!("invalid parent regex: {PARENT_REGEX}"))?;
        let ancestor_regex = regex::Regex::new(ANCESTOR_REGEX)
            .with_context(|| format!("invalid ancestor regex: {ANCESTOR_REGEX}"))?;

        if let Some(caps) = parent_regex.captures(revision) {
            let base_revision = Self::try_parse(&caps[1])?;

            Ok(Revision::Parent(Box::new(base_revision)))
        } else if let Some(caps) = ancestor_regex.captures(revision) {
            let generations: usize = caps[2]
                .parse()
                .with_context(|| format!("failed to parse generations in revision: {revision}"))?;
            let base_revision = Self::try_parse(&caps[1])?;

            Ok(Revision::Ancestor(Box::new(base_revision), generations))
        } else {
            let resolved_name = *REF_ALIASES.get(revision).unwrap_or(&revision);
            let branch_name = BranchName::try_parse(resolved_name)?;
            Ok(Revision::Ref(branch_name))
        }
    }

    fn looks_like_oid(s: &str) -> bool {
        s.len() >= MIN_ABBREVIATED_OID_LENGTH
            && s.len() <= OBJECT_ID_LENGTH
            && s.chars().all(|c| c.is_ascii_hexdigit())
    }
}
