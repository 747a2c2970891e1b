use crate::REPOSITORY_DIR;
use crate::areas::database::Database;
use crate::areas::index::{Index, IndexLock};
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::artifacts::merge::merge_state::MergeState;
use crate::errors::UgitError;
use anyhow::Context;
use std::cell::{Ref, RefCell, RefMut};
use std::path::{Path, PathBuf};

/// Handle on one working tree and its `.ugit` directory
///
/// Human-readable progress is written to the injected `writer`; nothing in the library logs
/// anywhere else.
pub struct Repository {
    path: Box<Path>,
    writer: RefCell<Box<dyn std::io::Write>>,
    index: RefCell<Index>,
    database: Database,
    workspace: Workspace,
    refs: Refs,
}

impl Repository {
    /// Build a handle rooted at `path` without checking that a repository exists there
    pub fn new(path: &Path, writer: Box<dyn std::io::Write>) -> anyhow::Result<Self> {
        if !path.exists() {
            std::fs::create_dir_all(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
        }
        let path = path
            .canonicalize()
            .with_context(|| format!("failed to resolve {}", path.display()))?;
        let ugit_path = path.join(REPOSITORY_DIR);

        let index = Index::new(ugit_path.join("index").into_boxed_path());
        let database = Database::new(ugit_path.join("objects").into_boxed_path());
        let workspace = Workspace::new(path.clone().into_boxed_path());
        let refs = Refs::new(ugit_path.into_boxed_path());

        Ok(Repository {
            path: path.into_boxed_path(),
            writer: RefCell::new(writer),
            index: RefCell::new(index),
            database,
            workspace,
            refs,
        })
    }

    /// Open the repository whose working tree is exactly `path`
    pub fn open(path: &Path, writer: Box<dyn std::io::Write>) -> anyhow::Result<Self> {
        if !path.join(REPOSITORY_DIR).is_dir() {
            return Err(UgitError::not_found("repository", path.display()).into());
        }

        Self::new(path, writer)
    }

    /// Open the closest repository at or above `start`
    pub fn discover(start: &Path, writer: Box<dyn std::io::Write>) -> anyhow::Result<Self> {
        let start = start
            .canonicalize()
            .with_context(|| format!("failed to resolve {}", start.display()))?;
        let root = start
            .ancestors()
            .find(|ancestor| ancestor.join(REPOSITORY_DIR).is_dir())
            .map(PathBuf::from)
            .ok_or_else(|| UgitError::not_found("repository", start.display()))?;

        Self::new(&root, writer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The `.ugit` directory
    pub fn ugit_path(&self) -> PathBuf {
        self.path.join(REPOSITORY_DIR)
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn std::io::Write>> {
        self.writer.borrow_mut()
    }

    pub fn index(&self) -> Ref<'_, Index> {
        self.index.borrow()
    }

    pub fn index_mut(&self) -> RefMut<'_, Index> {
        self.index.borrow_mut()
    }

    /// Take the index lock and reload the index from disk
    pub fn lock_index(&self) -> anyhow::Result<IndexLock> {
        let lock = IndexLock::acquire(&self.ugit_path().join("index.lock"))?;
        self.index_mut().rehydrate()?;

        Ok(lock)
    }

    /// Reload the index without taking the operation lock (read-only callers)
    pub fn load_index(&self) -> anyhow::Result<()> {
        self.index_mut().rehydrate()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub fn merge_state(&self) -> MergeState {
        MergeState::new(self.ugit_path().into_boxed_path())
    }
}
