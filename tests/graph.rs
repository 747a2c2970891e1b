use common::{TestRepository, repository};
use pretty_assertions::assert_eq;
use rstest::rstest;
use ugit::artifacts::objects::object_id::ObjectId;

mod common;

/// Commit graph built straight from `commit_tree`, all commits sharing the empty tree
struct Graph<'t> {
    repository: &'t TestRepository,
    tree: ObjectId,
}

impl<'t> Graph<'t> {
    fn new(repository: &'t TestRepository) -> Self {
        let tree = repository.repository.write_tree().unwrap();
        repository.output.take();

        Self { repository, tree }
    }

    fn commit(&self, message: &str, parents: &[&ObjectId]) -> ObjectId {
        let parents = parents.iter().map(|oid| (*oid).clone()).collect::<Vec<_>>();
        self.repository
            .repository
            .commit_tree(&self.tree, &parents, &format!("{message}\n"))
            .unwrap()
    }
}

#[rstest]
fn ancestry_is_reflexive_and_transitive(repository: TestRepository) {
    let graph = Graph::new(&repository);
    let a = graph.commit("a", &[]);
    let b = graph.commit("b", &[&a]);
    let c = graph.commit("c", &[&b]);
    let repo = &repository.repository;

    assert!(repo.is_ancestor(&a, &a).unwrap());
    assert!(repo.is_ancestor(&a, &c).unwrap());
    assert!(!repo.is_ancestor(&c, &a).unwrap());
}

#[rstest]
fn siblings_meet_at_their_fork_point(repository: TestRepository) {
    let graph = Graph::new(&repository);
    let root = graph.commit("root", &[]);
    let fork = graph.commit("fork", &[&root]);
    let left = graph.commit("left", &[&fork]);
    let right = graph.commit("right", &[&fork]);
    let right_again = graph.commit("right again", &[&right]);
    let repo = &repository.repository;

    assert_eq!(repo.merge_base(&left, &right_again).unwrap(), Some(fork.clone()));
    assert_eq!(repo.merge_base(&right_again, &left).unwrap(), Some(fork));
    assert!(!repo.is_ancestor(&left, &right_again).unwrap());
}

#[rstest]
fn a_commit_on_the_same_line_is_its_own_base(repository: TestRepository) {
    let graph = Graph::new(&repository);
    let old = graph.commit("old", &[]);
    let new = graph.commit("new", &[&old]);

    assert_eq!(repository.repository.merge_base(&old, &new).unwrap(), Some(old));
}

#[rstest]
fn unrelated_histories_have_no_base(repository: TestRepository) {
    let graph = Graph::new(&repository);
    let one = graph.commit("one", &[]);
    let other = graph.commit("other", &[]);

    assert_eq!(repository.repository.merge_base(&one, &other).unwrap(), None);
    assert!(
        repository
            .repository
            .lowest_common_ancestors(&one, &other)
            .unwrap()
            .is_empty()
    );
}

#[rstest]
fn merged_branches_meet_at_the_merged_tip(repository: TestRepository) {
    let graph = Graph::new(&repository);
    let root = graph.commit("root", &[]);
    let feature = graph.commit("feature", &[&root]);
    let main = graph.commit("main", &[&root]);
    let merge = graph.commit("merge", &[&main, &feature]);
    let feature_next = graph.commit("feature next", &[&feature]);
    let main_next = graph.commit("main next", &[&merge]);

    assert_eq!(
        repository.repository.merge_base(&main_next, &feature_next).unwrap(),
        Some(feature)
    );
}

#[rstest]
fn criss_cross_histories_have_two_lowest_ancestors(repository: TestRepository) {
    let graph = Graph::new(&repository);
    let root = graph.commit("root", &[]);
    let x = graph.commit("x", &[&root]);
    let y = graph.commit("y", &[&root]);
    let left = graph.commit("left", &[&x, &y]);
    let right = graph.commit("right", &[&y, &x]);
    let repo = &repository.repository;

    let mut expected = vec![x.clone(), y.clone()];
    expected.sort();
    let lowest = repo.lowest_common_ancestors(&left, &right).unwrap();
    let base = repo.merge_base(&left, &right).unwrap();

    assert_eq!(lowest, expected);
    assert_eq!(base, Some(expected[0].clone()));
}

#[rstest]
fn deeper_ancestor_wins_among_lowest(repository: TestRepository) {
    let graph = Graph::new(&repository);
    let root = graph.commit("root", &[]);
    let shallow = graph.commit("shallow", &[&root]);
    let middle = graph.commit("middle", &[&root]);
    let deep = graph.commit("deep", &[&middle]);
    let left = graph.commit("left", &[&shallow, &deep]);
    let right = graph.commit("right", &[&deep, &shallow]);

    assert_eq!(repository.repository.merge_base(&left, &right).unwrap(), Some(deep));
}
