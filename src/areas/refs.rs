//! References (HEAD, branches, tags)
//!
//! A reference file holds either a 40-character object id (direct) or `ref: <name>`
//! (symbolic). Names are paths relative to the repository directory: `HEAD`,
//! `refs/heads/<branch>`, `refs/tags/<tag>`.
//!
//! ## Writes
//!
//! Every write takes an exclusive lock on `<ref>.lock`, re-reads the current value under the
//! lock, and replaces the file by renaming a fully written temp file over it. Updates that
//! carry an expected old value fail with `Conflict` when another writer got there first.

use crate::artifacts::branch::branch_name::{BranchName, HEADS_PREFIX, RefName};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::UgitError;
use anyhow::Context;
use derive_new::new;
use fake::rand;
use file_guard::Lock;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Regex pattern for parsing symbolic references
const SYMREF_REGEX: &str = r"^ref: (.+)$";

const LOCK_SUFFIX: &str = ".lock";

/// Outcome of following a reference to its end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedRef {
    /// The chain ends in a commit id
    Direct(ObjectId),
    /// The chain ends in a reference that was never written (e.g. a fresh branch)
    Unborn(RefName),
}

impl ResolvedRef {
    pub fn oid(&self) -> Option<&ObjectId> {
        match self {
            ResolvedRef::Direct(oid) => Some(oid),
            ResolvedRef::Unborn(_) => None,
        }
    }

    pub fn into_oid(self) -> Option<ObjectId> {
        match self {
            ResolvedRef::Direct(oid) => Some(oid),
            ResolvedRef::Unborn(_) => None,
        }
    }
}

/// Raw content of one reference file
#[derive(Debug, Clone, PartialEq, Eq)]
enum SymRefOrOid {
    SymRef(RefName),
    Oid(ObjectId),
}

impl SymRefOrOid {
    fn parse(name: &RefName, content: &str) -> anyhow::Result<Option<SymRefOrOid>> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(None);
        }

        let symref_match = regex::Regex::new(SYMREF_REGEX)?.captures(content);
        let parsed = match symref_match {
            Some(symref_match) => RefName::try_parse(&symref_match[1]).map(SymRefOrOid::SymRef),
            None => ObjectId::try_parse(content).map(SymRefOrOid::Oid),
        };

        parsed
            .map(Some)
            .map_err(|_| {
                UgitError::corrupt(name, format!("unreadable reference '{content}'")).into()
            })
    }

    fn render(&self) -> String {
        match self {
            SymRefOrOid::SymRef(target) => format!("ref: {target}\n"),
            SymRefOrOid::Oid(oid) => format!("{oid}\n"),
        }
    }
}

#[derive(Debug, new)]
pub struct Refs {
    /// Path to the repository directory (`.ugit`)
    path: Box<Path>,
}

impl Refs {
    fn ref_path(&self, name: &RefName) -> PathBuf {
        self.path.join(name.as_ref_path())
    }

    fn read_raw(&self, name: &RefName) -> anyhow::Result<Option<SymRefOrOid>> {
        let path = self.ref_path(name);
        if !path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read ref file at {}", path.display()))?;
        SymRefOrOid::parse(name, &content)
    }

    pub fn exists(&self, name: &RefName) -> bool {
        self.ref_path(name).is_file()
    }

    /// Follow `name` through any symbolic links to the commit it designates
    pub fn read(&self, name: &RefName) -> anyhow::Result<ResolvedRef> {
        if !self.exists(name) {
            return Err(UgitError::not_found("reference", name).into());
        }

        let mut visited = HashSet::from([name.clone()]);
        let mut current = name.clone();

        loop {
            match self.read_raw(&current)? {
                None => return Ok(ResolvedRef::Unborn(current)),
                Some(SymRefOrOid::Oid(oid)) => return Ok(ResolvedRef::Direct(oid)),
                Some(SymRefOrOid::SymRef(target)) => {
                    if !visited.insert(target.clone()) {
                        return Err(UgitError::SymbolicRefCycle(target.to_string()).into());
                    }
                    current = target;
                }
            }
        }
    }

    pub fn read_oid(&self, name: &RefName) -> anyhow::Result<Option<ObjectId>> {
        Ok(self.read(name)?.into_oid())
    }

    pub fn read_head(&self) -> anyhow::Result<Option<ObjectId>> {
        self.read_oid(&RefName::head())
    }

    /// Name of the direct reference HEAD ends at: a branch, or `HEAD` itself when detached
    pub fn current_ref(&self) -> anyhow::Result<RefName> {
        match self.read(&RefName::head())? {
            ResolvedRef::Unborn(name) => Ok(name),
            ResolvedRef::Direct(_) => self.terminal_name(&RefName::head()),
        }
    }

    pub fn is_detached(&self) -> anyhow::Result<bool> {
        Ok(matches!(self.read_raw(&RefName::head())?, Some(SymRefOrOid::Oid(_))))
    }

    pub fn current_branch(&self) -> anyhow::Result<Option<BranchName>> {
        Ok(self.current_ref()?.branch_name())
    }

    fn terminal_name(&self, name: &RefName) -> anyhow::Result<RefName> {
        let mut visited = HashSet::from([name.clone()]);
        let mut current = name.clone();

        while let Some(SymRefOrOid::SymRef(target)) = self.read_raw(&current)? {
            if !visited.insert(target.clone()) {
                return Err(UgitError::SymbolicRefCycle(target.to_string()).into());
            }
            current = target;
        }

        Ok(current)
    }

    /// Set a direct reference unconditionally
    pub fn write(&self, name: &RefName, oid: &ObjectId) -> anyhow::Result<()> {
        self.locked_write(name, SymRefOrOid::Oid(oid.clone()), |current| match current {
            Some(SymRefOrOid::SymRef(target)) => Err(UgitError::WrongRefType {
                name: name.to_string(),
                reason: format!("it is a symbolic reference to {target}"),
            }
            .into()),
            _ => Ok(()),
        })
    }

    /// Compare-and-swap a direct reference from `expected` (None = absent) to `new`
    pub fn update_ref(
        &self,
        name: &RefName,
        new: &ObjectId,
        expected: Option<&ObjectId>,
    ) -> anyhow::Result<()> {
        self.locked_write(name, SymRefOrOid::Oid(new.clone()), |current| {
            let current = match current {
                Some(SymRefOrOid::SymRef(target)) => {
                    return Err(UgitError::WrongRefType {
                        name: name.to_string(),
                        reason: format!("it is a symbolic reference to {target}"),
                    }
                    .into());
                }
                Some(SymRefOrOid::Oid(oid)) => Some(oid),
                None => None,
            };

            if current.as_ref() != expected {
                return Err(UgitError::Conflict(format!(
                    "reference {name} moved from {} to {} while the update was prepared",
                    expected.map_or("nothing".to_string(), |oid| oid.to_string()),
                    current.map_or("nothing".to_string(), |oid| oid.to_string()),
                ))
                .into());
            }

            Ok(())
        })
    }

    /// Advance whatever HEAD points to (the current branch, or HEAD when detached)
    ///
    /// Returns the name of the reference that was updated.
    pub fn update_head(
        &self,
        new: &ObjectId,
        expected: Option<&ObjectId>,
    ) -> anyhow::Result<RefName> {
        let target = self.current_ref()?;
        self.update_ref(&target, new, expected)?;

        Ok(target)
    }

    pub fn detach_head(&self, oid: &ObjectId) -> anyhow::Result<()> {
        self.locked_write(&RefName::head(), SymRefOrOid::Oid(oid.clone()), |_| Ok(()))
    }

    /// Point `name` at `target`, refusing to create a cycle
    pub fn set_symbolic(&self, name: &RefName, target: &RefName) -> anyhow::Result<()> {
        let mut visited = HashSet::new();
        let mut current = target.clone();
        loop {
            if current == *name || !visited.insert(current.clone()) {
                return Err(UgitError::SymbolicRefCycle(current.to_string()).into());
            }
            match self.read_raw(&current)? {
                Some(SymRefOrOid::SymRef(next)) => current = next,
                _ => break,
            }
        }

        self.locked_write(name, SymRefOrOid::SymRef(target.clone()), |_| Ok(()))
    }

    fn locked_write<F>(&self, name: &RefName, value: SymRefOrOid, check: F) -> anyhow::Result<()>
    where
        F: FnOnce(Option<SymRefOrOid>) -> anyhow::Result<()>,
    {
        let path = self.ref_path(name);
        let parent = path
            .parent()
            .with_context(|| format!("invalid ref path {}", path.display()))?;
        std::fs::create_dir_all(parent).with_context(|| {
            format!("failed to create parent directories for ref file at {}", path.display())
        })?;

        let lock_path = Self::lock_path(&path);
        let lock_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("failed to open lock file at {}", lock_path.display()))?;
        let _lock = file_guard::lock(&lock_file, Lock::Exclusive, 0, 1)
            .with_context(|| format!("failed to lock {name}"))?;

        check(self.read_raw(name)?)?;

        let temp_path = self.path.join(format!("tmp-ref-{}", rand::random::<u32>()));
        let written = std::fs::File::create(&temp_path)
            .and_then(|mut temp| {
                temp.write_all(value.render().as_bytes())?;
                temp.sync_all()
            })
            .and_then(|_| std::fs::rename(&temp_path, &path));

        if written.is_err() {
            let _ = std::fs::remove_file(&temp_path);
        }
        written.with_context(|| format!("failed to write ref file at {}", path.display()))
    }

    fn lock_path(path: &Path) -> PathBuf {
        let mut lock_path = path.as_os_str().to_owned();
        lock_path.push(LOCK_SUFFIX);
        PathBuf::from(lock_path)
    }

    /// Sorted names of all references starting with `prefix` (e.g. `refs/heads/`)
    pub fn list(&self, prefix: &str) -> anyhow::Result<Vec<RefName>> {
        let mut names = WalkDir::new(self.refs_path())
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let relative_path = entry.path().strip_prefix(self.path.as_ref()).ok()?;
                let name = relative_path.to_str()?.replace(std::path::MAIN_SEPARATOR, "/");
                if name.ends_with(LOCK_SUFFIX) || !name.starts_with(prefix) {
                    return None;
                }
                RefName::try_parse(name).ok()
            })
            .collect::<Vec<_>>();

        if RefName::head().as_ref().starts_with(prefix) && self.exists(&RefName::head()) {
            names.push(RefName::head());
        }
        names.sort();

        Ok(names)
    }

    /// Find the reference a short name refers to (`HEAD`, `refs/...`, a branch or a tag)
    pub fn lookup(&self, name: &str) -> Option<RefName> {
        [
            name.to_string(),
            format!("refs/{name}"),
            format!("refs/heads/{name}"),
            format!("refs/tags/{name}"),
        ]
        .into_iter()
        .filter_map(|candidate| RefName::try_parse(candidate).ok())
        .find(|candidate| self.exists(candidate))
    }

    pub fn create_branch(&self, name: &BranchName, source_oid: &ObjectId) -> anyhow::Result<()> {
        let ref_name = RefName::branch(name);

        self.locked_write(&ref_name, SymRefOrOid::Oid(source_oid.clone()), |current| {
            match current {
                Some(_) => Err(UgitError::AlreadyExists(format!("branch '{name}'")).into()),
                None => Ok(()),
            }
        })
    }

    /// Delete a branch, returning the commit it pointed to
    pub fn delete_branch(&self, name: &BranchName) -> anyhow::Result<ObjectId> {
        let ref_name = RefName::branch(name);

        if self.current_ref()? == ref_name {
            return Err(UgitError::Conflict(format!(
                "cannot delete branch '{name}' while it is checked out"
            ))
            .into());
        }

        let oid = match self.read_raw(&ref_name)? {
            Some(SymRefOrOid::Oid(oid)) => oid,
            Some(SymRefOrOid::SymRef(_)) => {
                return Err(UgitError::WrongRefType {
                    name: ref_name.to_string(),
                    reason: "branches must be direct references".to_string(),
                }
                .into());
            }
            None => return Err(UgitError::not_found("branch", name).into()),
        };

        let branch_path = self.ref_path(&ref_name);
        std::fs::remove_file(&branch_path)
            .with_context(|| format!("failed to delete branch file at {}", branch_path.display()))?;
        let _ = std::fs::remove_file(Self::lock_path(&branch_path));
        self.prune_branch_empty_parent_dirs(&branch_path)?;

        Ok(oid)
    }

    pub fn list_branches(&self) -> anyhow::Result<Vec<BranchName>> {
        Ok(self
            .list(HEADS_PREFIX)?
            .iter()
            .filter_map(RefName::branch_name)
            .collect())
    }

    /// Map from commit id to every reference (HEAD included) that resolves to it
    pub fn reverse_refs(&self) -> anyhow::Result<HashMap<ObjectId, Vec<RefName>>> {
        let mut reverse: BTreeMap<RefName, ObjectId> = BTreeMap::new();
        for name in self.list("")? {
            if let Ok(ResolvedRef::Direct(oid)) = self.read(&name) {
                reverse.insert(name, oid);
            }
        }

        Ok(reverse
            .into_iter()
            .fold(HashMap::new(), |mut acc, (name, oid)| {
                acc.entry(oid).or_insert_with(Vec::new).push(name);
                acc
            }))
    }

    fn prune_branch_empty_parent_dirs(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent()
            && parent != self.heads_path().as_ref()
            && parent.read_dir()?.next().is_none()
        {
            std::fs::remove_dir(parent).with_context(|| {
                format!("failed to remove empty branch directory at {}", parent.display())
            })?;
            self.prune_branch_empty_parent_dirs(parent)?;
        }

        Ok(())
    }

    pub fn head_path(&self) -> Box<Path> {
        self.path.join("HEAD").into_boxed_path()
    }

    pub fn refs_path(&self) -> Box<Path> {
        self.path.join("refs").into_boxed_path()
    }

    pub fn heads_path(&self) -> Box<Path> {
        self.refs_path().join("heads").into_boxed_path()
    }

    pub fn tags_path(&self) -> Box<Path> {
        self.refs_path().join("tags").into_boxed_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    fn oid(seed: u8) -> ObjectId {
        ObjectId::from_digest(&[seed; 20]).unwrap()
    }

    fn name(name: &str) -> RefName {
        RefName::try_parse(name).unwrap()
    }

    #[fixture]
    fn refs() -> (TempDir, Refs) {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("refs/heads")).unwrap();
        let refs = Refs::new(dir.path().to_path_buf().into_boxed_path());
        refs.set_symbolic(&RefName::head(), &name("refs/heads/main"))
            .unwrap();
        (dir, refs)
    }

    #[rstest]
    fn fresh_head_is_unborn(refs: (TempDir, Refs)) {
        let (_dir, refs) = refs;

        assert_eq!(
            refs.read(&RefName::head()).unwrap(),
            ResolvedRef::Unborn(name("refs/heads/main"))
        );
        assert_eq!(refs.current_ref().unwrap(), name("refs/heads/main"));
    }

    #[rstest]
    fn missing_reference_is_not_found(refs: (TempDir, Refs)) {
        let (_dir, refs) = refs;

        let error = refs.read(&name("refs/heads/nope")).unwrap_err();

        assert!(matches!(UgitError::kind_of(&error), Some(UgitError::NotFound { .. })));
    }

    #[rstest]
    fn update_head_advances_the_branch(refs: (TempDir, Refs)) {
        let (_dir, refs) = refs;

        let updated = refs.update_head(&oid(1), None).unwrap();
        refs.update_head(&oid(2), Some(&oid(1))).unwrap();

        assert_eq!(updated, name("refs/heads/main"));
        assert_eq!(refs.read_head().unwrap(), Some(oid(2)));
        assert_eq!(refs.read_oid(&name("refs/heads/main")).unwrap(), Some(oid(2)));
    }

    #[rstest]
    fn stale_expected_value_is_a_conflict(refs: (TempDir, Refs)) {
        let (_dir, refs) = refs;
        refs.update_head(&oid(1), None).unwrap();

        let error = refs.update_head(&oid(3), Some(&oid(2))).unwrap_err();

        assert!(matches!(UgitError::kind_of(&error), Some(UgitError::Conflict(_))));
        assert_eq!(refs.read_head().unwrap(), Some(oid(1)));
    }

    #[rstest]
    fn writing_through_a_symbolic_ref_is_rejected(refs: (TempDir, Refs)) {
        let (_dir, refs) = refs;

        let error = refs.write(&RefName::head(), &oid(1)).unwrap_err();

        assert!(matches!(
            UgitError::kind_of(&error),
            Some(UgitError::WrongRefType { .. })
        ));
    }

    #[rstest]
    fn detached_head_is_updated_in_place(refs: (TempDir, Refs)) {
        let (_dir, refs) = refs;
        refs.update_head(&oid(1), None).unwrap();

        refs.detach_head(&oid(1)).unwrap();
        refs.update_head(&oid(2), Some(&oid(1))).unwrap();

        assert!(refs.is_detached().unwrap());
        assert_eq!(refs.current_ref().unwrap(), RefName::head());
        assert_eq!(refs.read_head().unwrap(), Some(oid(2)));
        assert_eq!(refs.read_oid(&name("refs/heads/main")).unwrap(), Some(oid(1)));
    }

    #[rstest]
    fn symbolic_cycles_are_refused(refs: (TempDir, Refs)) {
        let (_dir, refs) = refs;
        refs.set_symbolic(&name("refs/heads/a"), &name("refs/heads/b"))
            .unwrap();

        let error = refs
            .set_symbolic(&name("refs/heads/b"), &name("refs/heads/a"))
            .unwrap_err();

        assert!(matches!(
            UgitError::kind_of(&error),
            Some(UgitError::SymbolicRefCycle(_))
        ));
    }

    #[rstest]
    fn cycles_written_behind_our_back_are_detected(refs: (TempDir, Refs)) {
        let (dir, refs) = refs;
        std::fs::write(dir.path().join("refs/heads/a"), "ref: refs/heads/b\n").unwrap();
        std::fs::write(dir.path().join("refs/heads/b"), "ref: refs/heads/a\n").unwrap();

        let error = refs.read(&name("refs/heads/a")).unwrap_err();

        assert!(matches!(
            UgitError::kind_of(&error),
            Some(UgitError::SymbolicRefCycle(_))
        ));
    }

    #[rstest]
    fn list_is_sorted_and_ignores_lock_files(refs: (TempDir, Refs)) {
        let (_dir, refs) = refs;
        refs.write(&name("refs/heads/zeta"), &oid(1)).unwrap();
        refs.write(&name("refs/heads/alpha/one"), &oid(2)).unwrap();
        refs.write(&name("refs/tags/v1"), &oid(3)).unwrap();

        assert_eq!(
            refs.list("refs/heads/").unwrap(),
            vec![name("refs/heads/alpha/one"), name("refs/heads/zeta")]
        );
        assert_eq!(refs.lookup("v1"), Some(name("refs/tags/v1")));
        assert_eq!(refs.lookup("zeta"), Some(name("refs/heads/zeta")));
        assert_eq!(refs.lookup("missing"), None);
    }

    #[rstest]
    fn branches_cannot_be_created_twice(refs: (TempDir, Refs)) {
        let (_dir, refs) = refs;
        let branch = BranchName::try_parse("topic").unwrap();
        refs.create_branch(&branch, &oid(1)).unwrap();

        let error = refs.create_branch(&branch, &oid(2)).unwrap_err();

        assert!(matches!(
            UgitError::kind_of(&error),
            Some(UgitError::AlreadyExists(_))
        ));
    }

    #[rstest]
    fn deleting_a_branch_prunes_empty_directories(refs: (TempDir, Refs)) {
        let (dir, refs) = refs;
        let branch = BranchName::try_parse("feature/deep/topic").unwrap();
        refs.create_branch(&branch, &oid(4)).unwrap();

        assert_eq!(refs.delete_branch(&branch).unwrap(), oid(4));
        assert!(!dir.path().join("refs/heads/feature").exists());
    }

    #[rstest]
    fn the_current_branch_cannot_be_deleted(refs: (TempDir, Refs)) {
        let (_dir, refs) = refs;
        refs.update_head(&oid(1), None).unwrap();

        let error = refs
            .delete_branch(&BranchName::try_parse("main").unwrap())
            .unwrap_err();

        assert!(matches!(UgitError::kind_of(&error), Some(UgitError::Conflict(_))));
    }
}
