#![allow(dead_code)]

use assert_cmd::Command;
use assert_fs::TempDir;
use fake::Fake;
use fake::faker::lorem::en::Words;
use rstest::fixture;
use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use ugit::areas::repository::Repository;
use ugit::artifacts::objects::object_id::ObjectId;
use ugit::errors::UgitError;

/// Writer whose content stays readable after being handed to a repository
#[derive(Clone, Default)]
pub struct SharedOutput(Rc<RefCell<Vec<u8>>>);

impl SharedOutput {
    pub fn take(&self) -> String {
        String::from_utf8(std::mem::take(&mut *self.0.borrow_mut())).unwrap()
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub struct TestRepository {
    pub dir: TempDir,
    pub repository: Repository,
    pub output: SharedOutput,
}

impl TestRepository {
    pub fn root(&self) -> &Path {
        self.repository.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    pub fn write(&self, relative: &str, content: &str) {
        write_file(self.root(), relative, content);
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path(relative)).unwrap()
    }

    pub fn remove(&self, relative: &str) {
        let path = self.path(relative);
        if path.is_dir() {
            std::fs::remove_dir_all(path).unwrap();
        } else {
            std::fs::remove_file(path).unwrap();
        }
    }

    pub fn stage(&self, relatives: &[&str]) {
        let paths = relatives.iter().map(|relative| self.path(relative)).collect::<Vec<_>>();
        self.repository.stage(&paths).unwrap();
    }

    /// Stage the whole working tree and commit it
    pub fn commit_all(&self, message: &str) -> ObjectId {
        self.repository.stage(&[self.root()]).unwrap();
        self.repository.commit(message).unwrap()
    }

    pub fn head(&self) -> Option<ObjectId> {
        self.repository.refs().read_head().unwrap()
    }

    /// Files of the working tree (repository directory excluded), with their content
    pub fn snapshot(&self) -> Vec<(PathBuf, String)> {
        snapshot(self.root())
    }
}

#[fixture]
pub fn repository() -> TestRepository {
    let dir = TempDir::new().unwrap();
    let output = SharedOutput::default();
    let repository = Repository::new(dir.path(), Box::new(output.clone())).unwrap();
    repository.init().unwrap();
    output.take();

    TestRepository {
        dir,
        repository,
        output,
    }
}

pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

pub fn snapshot(root: &Path) -> Vec<(PathBuf, String)> {
    let mut files = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".ugit")
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let relative = entry.path().strip_prefix(root).unwrap().to_path_buf();
            (relative, std::fs::read_to_string(entry.path()).unwrap())
        })
        .collect::<Vec<_>>();
    files.sort();

    files
}

pub fn random_text() -> String {
    Words(5..12).fake::<Vec<String>>().join(" ")
}

/// Tagged error behind an operation failure
pub fn kind(error: &anyhow::Error) -> &UgitError {
    UgitError::kind_of(error).unwrap_or_else(|| panic!("untagged error: {error:#}"))
}

pub fn ugit(dir: &Path) -> Command {
    let mut command = Command::cargo_bin("ugit").unwrap();
    command
        .current_dir(dir)
        .env("NO_PAGER", "1")
        .env("UGIT_AUTHOR_NAME", "tester");

    command
}
