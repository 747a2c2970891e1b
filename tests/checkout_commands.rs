use common::{TestRepository, kind, repository};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::path::PathBuf;
use ugit::artifacts::branch::branch_name::RefName;
use ugit::errors::UgitError;

mod common;

/// `main` has a.txt=main, shared/b.txt; `feature` has a.txt=feature, c.txt, no shared/
fn two_branches(repository: &TestRepository) {
    repository.write("a.txt", "base\n");
    repository.write("shared/b.txt", "b\n");
    repository.commit_all("base");
    repository.repository.branch("feature", None).unwrap();

    repository.write("a.txt", "main\n");
    repository.commit_all("main work");

    repository.repository.checkout("feature", false).unwrap();
    repository.write("a.txt", "feature\n");
    repository.write("c.txt", "c\n");
    repository.remove("shared");
    repository.commit_all("feature work");

    repository.repository.checkout("main", false).unwrap();
    repository.output.take();
}

#[rstest]
fn switching_branches_rewrites_the_working_tree(repository: TestRepository) {
    two_branches(&repository);

    repository.repository.checkout("feature", false).unwrap();

    assert_eq!(
        repository.snapshot(),
        vec![
            (PathBuf::from("a.txt"), "feature\n".to_string()),
            (PathBuf::from("c.txt"), "c\n".to_string()),
        ]
    );
    assert!(!repository.path("shared").exists());
    assert_eq!(
        repository.repository.refs().current_ref().unwrap(),
        RefName::try_parse("refs/heads/feature").unwrap()
    );
    assert!(repository.repository.status().unwrap().is_clean());
    assert_eq!(repository.output.take(), "Switched to branch 'feature'\n");
}

#[rstest]
fn checking_out_the_current_branch_changes_nothing(repository: TestRepository) {
    two_branches(&repository);

    repository.repository.checkout("main", false).unwrap();

    assert_eq!(repository.output.take(), "Already on 'main'\n");
}

#[rstest]
#[case("HEAD^")]
#[case("main~1")]
#[case("@^")]
fn other_revisions_detach_head(repository: TestRepository, #[case] revision: &str) {
    two_branches(&repository);
    let main = repository.head().unwrap();
    let parent = repository.repository.parents(&main).unwrap()[0].clone();

    let checked_out = repository.repository.checkout(revision, false).unwrap();

    assert_eq!(checked_out, parent);
    assert!(repository.repository.refs().is_detached().unwrap());
    assert_eq!(repository.head(), Some(parent));
    assert_eq!(repository.read("a.txt"), "base\n");
    assert!(repository.output.take().contains("You are in 'detached HEAD' state"));
}

#[rstest]
fn commits_on_a_detached_head_move_only_head(repository: TestRepository) {
    two_branches(&repository);
    let main = repository.head().unwrap();
    repository.repository.checkout(main.as_ref(), false).unwrap();

    repository.write("d.txt", "detached\n");
    let detached = repository.commit_all("detached work");

    assert_eq!(repository.head(), Some(detached));
    assert_eq!(
        repository
            .repository
            .refs()
            .read_oid(&RefName::try_parse("refs/heads/main").unwrap())
            .unwrap(),
        Some(main)
    );
}

#[rstest]
fn local_modifications_block_the_checkout(repository: TestRepository) {
    two_branches(&repository);
    repository.write("a.txt", "uncommitted\n");

    let error = repository.repository.checkout("feature", false).unwrap_err();

    assert!(matches!(kind(&error), UgitError::Conflict(message) if message.contains("a.txt")));
    assert_eq!(repository.read("a.txt"), "uncommitted\n");
    assert_eq!(
        repository.repository.refs().current_branch().unwrap().unwrap().as_ref(),
        "main"
    );
}

#[rstest]
fn untracked_files_in_the_way_block_the_checkout(repository: TestRepository) {
    two_branches(&repository);
    repository.write("c.txt", "mine\n");

    let error = repository.repository.checkout("feature", false).unwrap_err();

    assert!(matches!(kind(&error), UgitError::Conflict(message) if message.contains("untracked")));
    assert_eq!(repository.read("c.txt"), "mine\n");
}

#[rstest]
fn unrelated_local_changes_are_carried_over(repository: TestRepository) {
    two_branches(&repository);
    repository.write("notes.txt", "scratch\n");

    repository.repository.checkout("feature", false).unwrap();

    assert_eq!(repository.read("notes.txt"), "scratch\n");
}

#[rstest]
fn force_discards_conflicting_changes(repository: TestRepository) {
    two_branches(&repository);
    repository.write("a.txt", "uncommitted\n");
    repository.write("c.txt", "mine\n");

    repository.repository.checkout("feature", true).unwrap();

    assert_eq!(repository.read("a.txt"), "feature\n");
    assert_eq!(repository.read("c.txt"), "c\n");
    assert!(repository.repository.status().unwrap().is_clean());
}

#[rstest]
fn unknown_targets_are_not_found(repository: TestRepository) {
    two_branches(&repository);

    let error = repository.repository.checkout("does-not-exist", false).unwrap_err();

    assert!(matches!(kind(&error), UgitError::NotFound { .. }));
}
