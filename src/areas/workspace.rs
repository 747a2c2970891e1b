//! Working tree access
//!
//! All paths handed to the rest of the crate are relative to the working-tree root and have
//! been normalized by [`Workspace::normalize`]. The repository directory is never listed,
//! read, or written through this type.

use crate::REPOSITORY_DIR;
use crate::artifacts::checkout::migration::Migration;
use crate::errors::UgitError;
use anyhow::Context;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Turn a user-supplied path into a clean path relative to the root
    ///
    /// Relative paths are taken relative to the root. The empty path names the root itself.
    /// Fails with `InvalidPath` for paths leaving the root, paths through a symlinked directory
    /// and for paths inside the repository directory.
    pub fn normalize(&self, path: &Path) -> anyhow::Result<PathBuf> {
        let relative = if path.is_absolute() {
            path.strip_prefix(&self.path)
                .map_err(|_| UgitError::invalid_path(path, "outside the working tree"))?
        } else {
            path
        };

        let mut normalized = PathBuf::new();
        for component in relative.components() {
            match component {
                Component::CurDir => {}
                Component::Normal(name) => normalized.push(name),
                Component::ParentDir => {
                    if !normalized.pop() {
                        return Err(
                            UgitError::invalid_path(path, "escapes the working tree").into()
                        );
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(UgitError::invalid_path(path, "outside the working tree").into());
                }
            }
        }

        if normalized.starts_with(REPOSITORY_DIR) {
            return Err(UgitError::invalid_path(path, "inside the repository directory").into());
        }
        if normalized.to_str().is_none() {
            return Err(UgitError::invalid_path(path, "not valid UTF-8").into());
        }

        self.check_symlinked_parents(path, &normalized)?;
        self.check_symlink_escape(path, &normalized)?;

        Ok(normalized)
    }

    /// Symlinks are not modelled, so no directory on the way to a path may be one
    fn check_symlinked_parents(&self, original: &Path, normalized: &Path) -> anyhow::Result<()> {
        let symlinked = normalized
            .ancestors()
            .skip(1)
            .filter(|ancestor| !ancestor.as_os_str().is_empty())
            .find(|ancestor| {
                self.absolute(ancestor)
                    .symlink_metadata()
                    .is_ok_and(|metadata| metadata.file_type().is_symlink())
            });

        match symlinked {
            Some(link) => Err(UgitError::invalid_path(
                original,
                format!("{} is a symbolic link", link.display()),
            )
            .into()),
            None => Ok(()),
        }
    }

    fn check_symlink_escape(&self, original: &Path, normalized: &Path) -> anyhow::Result<()> {
        let root = self
            .path
            .canonicalize()
            .with_context(|| format!("failed to resolve {}", self.path.display()))?;

        let existing = self
            .path
            .join(normalized)
            .ancestors()
            .find(|ancestor| ancestor.symlink_metadata().is_ok())
            .map(Path::to_path_buf);

        if let Some(existing) = existing {
            let resolved = existing.canonicalize().unwrap_or(existing);
            if !resolved.starts_with(&root) {
                return Err(
                    UgitError::invalid_path(original, "resolves outside the working tree").into()
                );
            }
        }

        Ok(())
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        self.path.join(path)
    }

    pub fn is_file(&self, path: &Path) -> bool {
        self.absolute(path)
            .symlink_metadata()
            .is_ok_and(|metadata| metadata.is_file())
    }

    pub fn is_dir(&self, path: &Path) -> bool {
        self.absolute(path)
            .symlink_metadata()
            .is_ok_and(|metadata| metadata.is_dir())
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.absolute(path).symlink_metadata().is_ok()
    }

    /// Every regular file at or below `root_file_path` (the whole tree when None), sorted
    ///
    /// Symlinks are not followed and not listed.
    pub fn list_files(&self, root_file_path: Option<&Path>) -> anyhow::Result<Vec<PathBuf>> {
        let root_file_path = root_file_path.unwrap_or(Path::new(""));
        let start = self.absolute(root_file_path);

        if self.is_file(root_file_path) {
            return Ok(vec![root_file_path.to_path_buf()]);
        }
        if !self.is_dir(root_file_path) {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&start)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || entry.file_name() != REPOSITORY_DIR);

        for entry in walker {
            let entry = entry.with_context(|| format!("failed to walk {}", start.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.path)
                .with_context(|| format!("{} is outside the workspace", entry.path().display()))?;
            if relative.to_str().is_some() {
                files.push(relative.to_path_buf());
            }
        }
        files.sort();

        Ok(files)
    }

    pub fn read_file(&self, file_path: &Path) -> anyhow::Result<Bytes> {
        let absolute = self.absolute(file_path);
        if !self.is_file(file_path) {
            return Err(UgitError::not_found("file", file_path.display()).into());
        }

        let content = std::fs::read(&absolute)
            .with_context(|| format!("failed to read {}", absolute.display()))?;

        Ok(Bytes::from(content))
    }

    /// Write a file, creating parent directories and replacing whatever is in the way
    pub fn write_file(&self, file_path: &Path, content: &[u8]) -> anyhow::Result<()> {
        let mut prefix = PathBuf::new();
        if let Some(parent) = file_path.parent() {
            for component in parent.components() {
                prefix.push(component);
                if self.exists(&prefix) && !self.is_dir(&prefix) {
                    std::fs::remove_file(self.absolute(&prefix)).with_context(|| {
                        format!(
                            "failed to remove {} to make room for a directory",
                            prefix.display()
                        )
                    })?;
                }
            }
            std::fs::create_dir_all(self.absolute(parent))
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }

        let absolute = self.absolute(file_path);
        if self.is_dir(file_path) {
            std::fs::remove_dir_all(&absolute)
                .with_context(|| format!("failed to remove directory {}", file_path.display()))?;
        }

        std::fs::write(&absolute, content)
            .with_context(|| format!("failed to write {}", file_path.display()))
    }

    /// Remove a file and any directories the removal leaves empty
    pub fn remove_file(&self, file_path: &Path) -> anyhow::Result<()> {
        if self.exists(file_path) && !self.is_dir(file_path) {
            std::fs::remove_file(self.absolute(file_path))
                .with_context(|| format!("failed to remove {}", file_path.display()))?;
        }

        self.prune_empty_parent_dirs(file_path)
    }

    fn prune_empty_parent_dirs(&self, path: &Path) -> anyhow::Result<()> {
        for parent in path.ancestors().skip(1) {
            if parent.as_os_str().is_empty() || !self.is_dir(parent) {
                break;
            }

            let absolute = self.absolute(parent);
            if absolute.read_dir()?.next().is_some() {
                break;
            }
            std::fs::remove_dir(&absolute)
                .with_context(|| format!("failed to remove empty directory {}", parent.display()))?;
        }

        Ok(())
    }

    // Deletions first so that a file can replace a directory emptied by the same migration.
    pub fn apply_migration(&self, migration: &Migration) -> anyhow::Result<()> {
        for path in migration.deletions() {
            self.remove_file(path)?;
        }

        for (path, oid) in migration.writes() {
            let data = migration.load_blob_data(oid)?;
            self.write_file(path, &data)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn workspace() -> (TempDir, Workspace) {
        let dir = TempDir::new().unwrap();
        dir.child(".ugit/HEAD").write_str("ref: refs/heads/main\n").unwrap();
        let root = dir.path().canonicalize().unwrap();
        (dir, Workspace::new(root.into_boxed_path()))
    }

    #[rstest]
    #[case("a/./b/../c.txt", "a/c.txt")]
    #[case("./top.txt", "top.txt")]
    #[case(".", "")]
    fn paths_are_normalized_lexically(
        workspace: (TempDir, Workspace),
        #[case] input: &str,
        #[case] expected: &str,
    ) {
        let (_dir, workspace) = workspace;

        assert_eq!(workspace.normalize(Path::new(input)).unwrap(), PathBuf::from(expected));
    }

    #[rstest]
    #[case("../outside.txt")]
    #[case("a/../../outside.txt")]
    #[case(".ugit/HEAD")]
    #[case("sub/../.ugit")]
    fn escaping_paths_are_invalid(workspace: (TempDir, Workspace), #[case] input: &str) {
        let (_dir, workspace) = workspace;

        let error = workspace.normalize(Path::new(input)).unwrap_err();

        assert!(matches!(
            UgitError::kind_of(&error),
            Some(UgitError::InvalidPath { .. })
        ));
    }

    #[rstest]
    fn absolute_paths_outside_the_root_are_invalid(workspace: (TempDir, Workspace)) {
        let (_dir, workspace) = workspace;
        let outside = TempDir::new().unwrap();

        assert!(workspace.normalize(outside.path()).is_err());
        assert_eq!(
            workspace.normalize(&workspace.path().join("x/y.txt")).unwrap(),
            PathBuf::from("x/y.txt")
        );
    }

    #[cfg(unix)]
    #[rstest]
    fn symlinks_leaving_the_root_are_invalid(workspace: (TempDir, Workspace)) {
        let (dir, workspace) = workspace;
        let outside = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

        let error = workspace.normalize(Path::new("link/file.txt")).unwrap_err();

        assert!(matches!(
            UgitError::kind_of(&error),
            Some(UgitError::InvalidPath { .. })
        ));
    }

    #[cfg(unix)]
    #[rstest]
    fn symlinked_directories_inside_the_root_are_invalid(workspace: (TempDir, Workspace)) {
        let (dir, workspace) = workspace;
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("sub"), dir.path().join("link")).unwrap();

        let error = workspace.normalize(Path::new("link/f")).unwrap_err();

        assert!(matches!(
            UgitError::kind_of(&error),
            Some(UgitError::InvalidPath { .. })
        ));
        assert_eq!(
            workspace.normalize(Path::new("sub/f")).unwrap(),
            PathBuf::from("sub/f")
        );
    }

    #[rstest]
    fn listing_skips_the_repository_directory(workspace: (TempDir, Workspace)) {
        let (dir, workspace) = workspace;
        dir.child("b.txt").write_str("b").unwrap();
        dir.child("a/nested.txt").write_str("n").unwrap();
        dir.child("empty").create_dir_all().unwrap();

        assert_eq!(
            workspace.list_files(None).unwrap(),
            vec![PathBuf::from("a/nested.txt"), PathBuf::from("b.txt")]
        );
    }

    #[rstest]
    fn writing_replaces_obstructions(workspace: (TempDir, Workspace)) {
        let (dir, workspace) = workspace;
        dir.child("x").write_str("file in the way").unwrap();
        dir.child("y/inner.txt").write_str("dir in the way").unwrap();

        workspace.write_file(Path::new("x/child.txt"), b"child").unwrap();
        workspace.write_file(Path::new("y"), b"now a file").unwrap();

        dir.child("x/child.txt").assert("child");
        dir.child("y").assert("now a file");
    }

    #[rstest]
    fn removing_prunes_empty_directories(workspace: (TempDir, Workspace)) {
        let (dir, workspace) = workspace;
        dir.child("deep/er/file.txt").write_str("x").unwrap();

        workspace.remove_file(Path::new("deep/er/file.txt")).unwrap();

        assert!(!dir.child("deep").exists());
    }
}
