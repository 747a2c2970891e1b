use assert_fs::TempDir;
use assert_fs::prelude::*;
use common::ugit;
use predicates::prelude::*;

mod common;

fn initialized() -> TempDir {
    let dir = TempDir::new().unwrap();
    ugit(dir.path()).arg("init").assert().success();

    dir
}

fn commit(dir: &TempDir, message: &str) {
    ugit(dir.path()).args(["add", "."]).assert().success();
    ugit(dir.path()).args(["commit", "-m", message]).assert().success();
}

#[test]
fn init_announces_the_repository() {
    let dir = TempDir::new().unwrap();

    ugit(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Initialized empty ugit repository in"));

    dir.child(".ugit/HEAD").assert("ref: refs/heads/main\n");
}

#[test]
fn commands_outside_a_repository_fail() {
    let dir = TempDir::new().unwrap();

    ugit(dir.path()).arg("status").assert().failure();
}

#[test]
fn hash_object_prints_the_blob_id() {
    let dir = initialized();
    dir.child("hello.txt").write_str("hello\n").unwrap();

    ugit(dir.path())
        .args(["hash-object", "-w", "hello.txt"])
        .assert()
        .success()
        .stdout("ce013625030ba8dba906f756967f9e9ca394464a\n");
    ugit(dir.path())
        .args(["cat-file", "ce013625"])
        .assert()
        .success()
        .stdout("hello\n\n");
}

#[test]
fn commit_and_log_round_out_a_history() {
    let dir = initialized();
    dir.child("a.txt").write_str("one\n").unwrap();
    commit(&dir, "first");
    dir.child("a.txt").write_str("two\n").unwrap();
    commit(&dir, "second");

    ugit(dir.path())
        .args(["log", "--oneline"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^[0-9a-f]{7} second\n[0-9a-f]{7} first\n$").unwrap());
    ugit(dir.path())
        .arg("log")
        .assert()
        .success()
        .stdout(predicate::str::contains("Author: tester"));
}

#[test]
fn status_works_from_a_subdirectory() {
    let dir = initialized();
    dir.child("src/lib.rs").write_str("fn main() {}\n").unwrap();
    commit(&dir, "first");
    dir.child("src/lib.rs").write_str("fn main() { todo!() }\n").unwrap();
    dir.child("notes.txt").write_str("notes\n").unwrap();

    ugit(&dir.path().join("src"))
        .args(["status", "--porcelain"])
        .assert()
        .success()
        .stdout(" M src/lib.rs\n?? notes.txt\n");
}

#[test]
fn ls_tree_lists_the_head_snapshot() {
    let dir = initialized();
    dir.child("a.txt").write_str("a\n").unwrap();
    dir.child("dir/b.txt").write_str("b\n").unwrap();
    commit(&dir, "first");

    ugit(dir.path())
        .args(["ls-tree", "-r"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\ta.txt\n").and(predicate::str::contains("\tdir/b.txt\n")),
        );
}

#[test]
fn branches_can_be_created_switched_and_deleted() {
    let dir = initialized();
    dir.child("a.txt").write_str("a\n").unwrap();
    commit(&dir, "first");

    ugit(dir.path()).args(["branch", "topic"]).assert().success();
    ugit(dir.path())
        .arg("branch")
        .assert()
        .success()
        .stdout(predicate::str::contains("* main").and(predicate::str::contains("  topic")));
    ugit(dir.path())
        .args(["checkout", "topic"])
        .assert()
        .success()
        .stdout("Switched to branch 'topic'\n");
    ugit(dir.path())
        .args(["branch", "-d", "topic"])
        .assert()
        .failure();
    ugit(dir.path()).args(["checkout", "main"]).assert().success();
    ugit(dir.path())
        .args(["branch", "-d", "topic"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Deleted branch topic"));
}

#[test]
fn conflicted_merge_exits_with_failure() {
    let dir = initialized();
    dir.child("file.txt").write_str("Y\n").unwrap();
    commit(&dir, "base");
    ugit(dir.path()).args(["branch", "feature"]).assert().success();
    dir.child("file.txt").write_str("X\n").unwrap();
    commit(&dir, "ours");
    ugit(dir.path()).args(["checkout", "feature"]).assert().success();
    dir.child("file.txt").write_str("Z\n").unwrap();
    commit(&dir, "theirs");
    ugit(dir.path()).args(["checkout", "main"]).assert().success();

    ugit(dir.path())
        .args(["merge", "feature"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("CONFLICT (content): Merge conflict in file.txt"));
    dir.child("file.txt")
        .assert("<<<<<<< main\nX\n||||||| base\nY\n=======\nZ\n>>>>>>> feature\n");
    ugit(dir.path())
        .args(["status", "-s"])
        .assert()
        .success()
        .stdout("UU file.txt\n");

    ugit(dir.path()).args(["merge", "--abort"]).assert().success();
    dir.child("file.txt").assert("X\n");
}

#[test]
fn merge_base_reports_ancestry_through_the_exit_code() {
    let dir = initialized();
    dir.child("a.txt").write_str("1\n").unwrap();
    commit(&dir, "first");
    dir.child("a.txt").write_str("2\n").unwrap();
    commit(&dir, "second");

    ugit(dir.path())
        .args(["merge-base", "--is-ancestor", "HEAD^", "HEAD"])
        .assert()
        .success();
    ugit(dir.path())
        .args(["merge-base", "--is-ancestor", "HEAD", "HEAD^"])
        .assert()
        .code(1);
}

#[test]
fn unknown_revisions_are_reported() {
    let dir = initialized();

    ugit(dir.path())
        .args(["checkout", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nowhere"));
}
