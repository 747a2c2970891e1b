//! Common ancestor finder for merge operations
//!
//! ## Algorithm Overview
//!
//! Commits are visited in decreasing generation order, the generation of a commit being the
//! length of its longest parent path to a root (roots have generation 1). A commit is
//! therefore always processed after every descendant that reaches it, so its visit state is
//! final when it is popped from the queue.
//!
//! ### Phase 1: Mark
//!
//! - Both inputs start with their own side flag
//! - Flags flow from a commit to its parents
//! - A commit carrying both flags is a common ancestor; its parents are marked STALE
//! - STALE flows to every further ancestor
//!
//! ### Phase 2: Collect
//!
//! The lowest common ancestors are the commits visited from both sides that never became
//! STALE: common ancestors not reachable from another common ancestor.
//!
//! ## Choosing One Base
//!
//! When several lowest common ancestors exist, the one with the greatest generation wins and
//! ties go to the smallest id. The choice only depends on the graph.
//!
//! ## Debug Logging
//!
//! Build with `--features debug_merge` to trace the traversal on stderr.

use crate::artifacts::objects::object_id::ObjectId;
use bitflags::bitflags;
use std::cell::RefCell;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

/// `eprintln!` compiled in only with the `debug_merge` feature
macro_rules! debug_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "debug_merge")]
        {
            eprintln!($($arg)*);
        }
    };
}

bitflags! {
    /// Which walks reached a commit, and what the walk concluded about it
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    struct VisitState: u8 {
        const NONE = 0b00;
        const VISITED_FROM_SOURCE = 0b01;
        const VISITED_FROM_TARGET = 0b10;
        const VISITED_FROM_BOTH =
            Self::VISITED_FROM_SOURCE.bits() | Self::VISITED_FROM_TARGET.bits();
        const STALE = 0b100;
        const RESULT = 0b1000;
    }
}

/// Ancestry queries over a commit graph
///
/// The graph is read through `parent_loader`, which returns the ordered parents of a commit
/// (empty for a root). Any storage works: the object database or an in-memory map.
/// Generation numbers are memoized for the lifetime of the finder.
pub struct BCAFinder<ParentLoaderFn>
where
    ParentLoaderFn: Fn(&ObjectId) -> anyhow::Result<Vec<ObjectId>>,
{
    parent_loader: ParentLoaderFn,
    generations: RefCell<HashMap<ObjectId, u64>>,
}

impl<ParentLoaderFn> BCAFinder<ParentLoaderFn>
where
    ParentLoaderFn: Fn(&ObjectId) -> anyhow::Result<Vec<ObjectId>>,
{
    pub fn new(parent_loader: ParentLoaderFn) -> Self {
        Self {
            parent_loader,
            generations: RefCell::new(HashMap::new()),
        }
    }

    fn parents(&self, commit_id: &ObjectId) -> anyhow::Result<Vec<ObjectId>> {
        (self.parent_loader)(commit_id)
    }

    /// Length of the longest parent path from `commit_id` to a root, roots being 1
    ///
    /// Computed with an explicit post-order stack.
    pub fn generation(&self, commit_id: &ObjectId) -> anyhow::Result<u64> {
        if let Some(generation) = self.generations.borrow().get(commit_id) {
            return Ok(*generation);
        }

        let mut stack = vec![(commit_id.clone(), false)];
        while let Some((oid, expanded)) = stack.pop() {
            if self.generations.borrow().contains_key(&oid) {
                continue;
            }

            let parents = self.parents(&oid)?;
            if expanded {
                let generations = self.generations.borrow();
                let generation = parents
                    .iter()
                    .filter_map(|parent| generations.get(parent))
                    .max()
                    .map_or(1, |max| max + 1);
                drop(generations);

                self.generations.borrow_mut().insert(oid, generation);
                continue;
            }

            stack.push((oid, true));
            for parent in parents {
                if !self.generations.borrow().contains_key(&parent) {
                    stack.push((parent, false));
                }
            }
        }

        self.generations
            .borrow()
            .get(commit_id)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("generation of {commit_id} could not be computed"))
    }

    /// True when `ancestor` is reachable from `descendant` over parent edges (reflexive)
    pub fn is_ancestor(&self, ancestor: &ObjectId, descendant: &ObjectId) -> anyhow::Result<bool> {
        if ancestor == descendant {
            return Ok(true);
        }

        let ancestor_generation = self.generation(ancestor)?;
        let mut visited = HashSet::from([descendant.clone()]);
        let mut queue = VecDeque::from([descendant.clone()]);

        while let Some(commit_id) = queue.pop_front() {
            for parent in self.parents(&commit_id)? {
                if &parent == ancestor {
                    return Ok(true);
                }
                // a commit older than the ancestor cannot lead to it
                if self.generation(&parent)? > ancestor_generation
                    && visited.insert(parent.clone())
                {
                    queue.push_back(parent);
                }
            }
        }

        Ok(false)
    }

    fn find_common_ancestors(
        &self,
        source_commit_id: &ObjectId,
        target_commit_id: &ObjectId,
    ) -> anyhow::Result<HashMap<ObjectId, VisitState>> {
        if source_commit_id == target_commit_id {
            return Ok(HashMap::from([(source_commit_id.clone(), VisitState::RESULT)]));
        }

        let mut ancestors_states = HashMap::<ObjectId, VisitState>::new();
        let mut processed = HashSet::<ObjectId>::new();
        let mut priority_queue = BinaryHeap::new();

        ancestors_states.insert(source_commit_id.clone(), VisitState::VISITED_FROM_SOURCE);
        priority_queue.push((self.generation(source_commit_id)?, source_commit_id.clone()));
        ancestors_states.insert(target_commit_id.clone(), VisitState::VISITED_FROM_TARGET);
        priority_queue.push((self.generation(target_commit_id)?, target_commit_id.clone()));

        while let Some((_, commit_id)) = priority_queue.pop() {
            if !processed.insert(commit_id.clone()) {
                continue;
            }

            let mut current_state = ancestors_states
                .get(&commit_id)
                .copied()
                .unwrap_or(VisitState::NONE);

            debug_log!("visit {commit_id} {current_state:?}");

            let mut inherited = current_state & (VisitState::VISITED_FROM_BOTH | VisitState::STALE);
            if current_state.contains(VisitState::VISITED_FROM_BOTH)
                && !current_state.contains(VisitState::STALE)
            {
                current_state |= VisitState::RESULT;
                ancestors_states.insert(commit_id.clone(), current_state);
                inherited |= VisitState::STALE;
            }

            for parent_id in self.parents(&commit_id)? {
                let parent_state = ancestors_states
                    .get(&parent_id)
                    .copied()
                    .unwrap_or(VisitState::NONE);

                ancestors_states.insert(parent_id.clone(), parent_state | inherited);
                if !processed.contains(&parent_id) {
                    priority_queue.push((self.generation(&parent_id)?, parent_id));
                }
            }
        }

        debug_log!(
            "Final ancestors states: {}",
            ancestors_states
                .iter()
                .map(|(oid, state)| format!("{oid}: {state:?}"))
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(ancestors_states
            .into_iter()
            .filter(|(_, state)| state.contains(VisitState::RESULT))
            .collect())
    }

    /// Common ancestors of both commits that are not ancestors of another common ancestor
    ///
    /// Sorted by id; empty when the histories share no root.
    pub fn lowest_common_ancestors(
        &self,
        source_commit_id: &ObjectId,
        target_commit_id: &ObjectId,
    ) -> anyhow::Result<Vec<ObjectId>> {
        let mut common_ancestors = self
            .find_common_ancestors(source_commit_id, target_commit_id)?
            .into_keys()
            .collect::<Vec<_>>();
        common_ancestors.sort();

        debug_log!(
            "Lowest common ancestors: {}",
            common_ancestors
                .iter()
                .map(|oid| oid.as_ref())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(common_ancestors)
    }

    /// The single merge base: greatest generation first, then smallest id
    pub fn find_best_common_ancestor(
        &self,
        source_commit_id: &ObjectId,
        target_commit_id: &ObjectId,
    ) -> anyhow::Result<Option<ObjectId>> {
        let mut best: Option<(u64, ObjectId)> = None;

        for candidate in self.lowest_common_ancestors(source_commit_id, target_commit_id)? {
            let generation = self.generation(&candidate)?;
            let better = match &best {
                None => true,
                Some((best_generation, best_oid)) => {
                    generation > *best_generation
                        || (generation == *best_generation && candidate < *best_oid)
                }
            };
            if better {
                best = Some((generation, candidate));
            }
        }

        debug_log!("Best common ancestor: {:?}", best);

        Ok(best.map(|(_, oid)| oid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::*;

    /// In-memory commit store for testing
    #[derive(Debug, Clone, Default)]
    struct InMemoryCommitStore {
        commits: HashMap<ObjectId, Vec<ObjectId>>,
    }

    impl InMemoryCommitStore {
        fn add_commit(&mut self, commit_id: ObjectId, parents: Vec<ObjectId>) {
            self.commits.insert(commit_id, parents);
        }

        fn get_parents(&self, commit_id: &ObjectId) -> anyhow::Result<Vec<ObjectId>> {
            self.commits
                .get(commit_id)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("commit {commit_id} not in store"))
        }

        fn finder(&self) -> BCAFinder<impl Fn(&ObjectId) -> anyhow::Result<Vec<ObjectId>> + '_> {
            BCAFinder::new(|oid| self.get_parents(oid))
        }

        /// Every ancestor of `commit_id`, itself included
        fn ancestors(&self, commit_id: &ObjectId) -> HashSet<ObjectId> {
            let mut seen = HashSet::new();
            let mut queue = VecDeque::from([commit_id.clone()]);
            while let Some(current) = queue.pop_front() {
                if seen.insert(current.clone()) {
                    queue.extend(self.commits[&current].iter().cloned());
                }
            }
            seen
        }
    }

    fn create_oid(id: &str) -> ObjectId {
        // deterministic 40-character hex id from the name bytes
        let mut hex_string = id.bytes().map(|byte| format!("{byte:02x}")).collect::<String>();
        while hex_string.len() < 40 {
            hex_string.push('0');
        }
        hex_string.truncate(40);

        ObjectId::try_parse(hex_string).expect("Invalid test ObjectId")
    }

    fn oids<const N: usize>(names: [&str; N]) -> [ObjectId; N] {
        names.map(|name| create_oid(&format!("commit_{name}")))
    }

    #[fixture]
    fn linear_history() -> InMemoryCommitStore {
        let mut store = InMemoryCommitStore::default();

        // A <- B <- C <- D
        let [a, b, c, d] = oids(["a", "b", "c", "d"]);
        store.add_commit(a.clone(), vec![]);
        store.add_commit(b.clone(), vec![a]);
        store.add_commit(c.clone(), vec![b]);
        store.add_commit(d, vec![c]);

        store
    }

    #[fixture]
    fn simple_merge() -> InMemoryCommitStore {
        let mut store = InMemoryCommitStore::default();

        //     A
        //    / \
        //   B   C
        //    \ /
        //     D
        let [a, b, c, d] = oids(["a", "b", "c", "d"]);
        store.add_commit(a.clone(), vec![]);
        store.add_commit(b.clone(), vec![a.clone()]);
        store.add_commit(c.clone(), vec![a]);
        store.add_commit(d, vec![b, c]);

        store
    }

    #[fixture]
    fn criss_cross_merge() -> InMemoryCommitStore {
        let mut store = InMemoryCommitStore::default();

        //     A
        //    / \
        //   B   C
        //   |\ /|
        //   | X |
        //   |/ \|
        //   D   E
        //   |   |
        //   F   G
        let [a, b, c, d, e, f, g] = oids(["a", "b", "c", "d", "e", "f", "g"]);
        store.add_commit(a.clone(), vec![]);
        store.add_commit(b.clone(), vec![a.clone()]);
        store.add_commit(c.clone(), vec![a]);
        store.add_commit(d.clone(), vec![b.clone(), c.clone()]);
        store.add_commit(e.clone(), vec![c, b]);
        store.add_commit(f, vec![d]);
        store.add_commit(g, vec![e]);

        store
    }

    #[fixture]
    fn uneven_bases() -> InMemoryCommitStore {
        let mut store = InMemoryCommitStore::default();

        //     A
        //    / \
        //   B   C
        //   |   |\
        //   X   | Z
        //
        // M = merge(X, C), N = merge(Z, X): common ancestors X and C, X is deeper
        let [a, b, c, x, z, m, n] = oids(["a", "b", "c", "x", "z", "m", "n"]);
        store.add_commit(a.clone(), vec![]);
        store.add_commit(b.clone(), vec![a.clone()]);
        store.add_commit(c.clone(), vec![a]);
        store.add_commit(x.clone(), vec![b]);
        store.add_commit(z.clone(), vec![c.clone()]);
        store.add_commit(m, vec![x.clone(), c]);
        store.add_commit(n, vec![z, x]);

        store
    }

    #[rstest]
    fn test_linear_history_common_ancestor(linear_history: InMemoryCommitStore) {
        let [a, b, c, d] = oids(["a", "b", "c", "d"]);
        let finder = linear_history.finder();

        assert_eq!(finder.find_best_common_ancestor(&c, &c).unwrap(), Some(c));
        assert_eq!(finder.find_best_common_ancestor(&b, &d).unwrap(), Some(b.clone()));
        assert_eq!(finder.find_best_common_ancestor(&d, &b).unwrap(), Some(b));
        assert_eq!(finder.find_best_common_ancestor(&a, &d).unwrap(), Some(a));
    }

    #[rstest]
    fn test_simple_merge_common_ancestor(simple_merge: InMemoryCommitStore) {
        let [a, b, c, d] = oids(["a", "b", "c", "d"]);
        let finder = simple_merge.finder();

        assert_eq!(finder.find_best_common_ancestor(&b, &c).unwrap(), Some(a));
        assert_eq!(finder.find_best_common_ancestor(&d, &c).unwrap(), Some(c));
        assert_eq!(finder.find_best_common_ancestor(&b, &d).unwrap(), Some(b));
    }

    #[rstest]
    fn test_criss_cross_merge_reports_both_bases(criss_cross_merge: InMemoryCommitStore) {
        let [b, c, d, e, f, g] = oids(["b", "c", "d", "e", "f", "g"]);
        let finder = criss_cross_merge.finder();

        assert_eq!(finder.lowest_common_ancestors(&d, &e).unwrap(), vec![b.clone(), c.clone()]);
        assert_eq!(finder.lowest_common_ancestors(&f, &g).unwrap(), vec![b.clone(), c]);
    }

    #[rstest]
    fn test_criss_cross_merge_tie_goes_to_smallest_id(criss_cross_merge: InMemoryCommitStore) {
        let [b, f, g] = oids(["b", "f", "g"]);
        let finder = criss_cross_merge.finder();

        assert_eq!(finder.find_best_common_ancestor(&f, &g).unwrap(), Some(b.clone()));
        assert_eq!(finder.find_best_common_ancestor(&g, &f).unwrap(), Some(b));
    }

    #[rstest]
    fn test_deeper_base_wins(uneven_bases: InMemoryCommitStore) {
        let [c, x, m, n] = oids(["c", "x", "m", "n"]);
        let finder = uneven_bases.finder();

        assert_eq!(finder.lowest_common_ancestors(&m, &n).unwrap(), vec![c, x.clone()]);
        assert_eq!(finder.find_best_common_ancestor(&m, &n).unwrap(), Some(x));
    }

    #[rstest]
    fn test_no_common_ancestor_different_roots() {
        let mut store = InMemoryCommitStore::default();
        let [a, b] = oids(["a", "b"]);
        store.add_commit(a.clone(), vec![]);
        store.add_commit(b.clone(), vec![]);

        let finder = store.finder();

        assert_eq!(finder.find_best_common_ancestor(&a, &b).unwrap(), None);
        assert!(!finder.is_ancestor(&a, &b).unwrap());
    }

    #[rstest]
    fn test_generation_is_longest_path(simple_merge: InMemoryCommitStore) {
        let [a, b, d] = oids(["a", "b", "d"]);
        let finder = simple_merge.finder();

        assert_eq!(finder.generation(&a).unwrap(), 1);
        assert_eq!(finder.generation(&b).unwrap(), 2);
        assert_eq!(finder.generation(&d).unwrap(), 3);
    }

    #[rstest]
    fn test_ancestry_is_reflexive_and_transitive(linear_history: InMemoryCommitStore) {
        let [a, b, c, d] = oids(["a", "b", "c", "d"]);
        let finder = linear_history.finder();

        assert!(finder.is_ancestor(&c, &c).unwrap());
        assert!(finder.is_ancestor(&a, &b).unwrap());
        assert!(finder.is_ancestor(&b, &d).unwrap());
        assert!(finder.is_ancestor(&a, &d).unwrap());
        assert!(!finder.is_ancestor(&d, &a).unwrap());
    }

    #[rstest]
    fn test_missing_commit_is_an_error() {
        let store = InMemoryCommitStore::default();
        let [a, b] = oids(["a", "b"]);

        assert!(store.finder().find_best_common_ancestor(&a, &b).is_err());
    }

    /// Random DAG: commit `i` picks up to two parents among earlier commits
    fn random_history() -> impl Strategy<Value = Vec<Vec<usize>>> {
        (2usize..12).prop_flat_map(|size| {
            (0..size)
                .map(|i| {
                    if i == 0 {
                        Just(Vec::new()).boxed()
                    } else {
                        proptest::collection::vec(0..i, 0..=2)
                            .prop_map(|parents| {
                                parents
                                    .into_iter()
                                    .collect::<std::collections::BTreeSet<_>>()
                                    .into_iter()
                                    .collect()
                            })
                            .boxed()
                    }
                })
                .collect::<Vec<_>>()
        })
    }

    proptest! {
        #[test]
        fn lowest_common_ancestors_are_common_and_minimal(history in random_history()) {
            let mut store = InMemoryCommitStore::default();
            let ids = (0..history.len())
                .map(|i| create_oid(&format!("node_{i:02}")))
                .collect::<Vec<_>>();
            for (i, parents) in history.iter().enumerate() {
                store.add_commit(ids[i].clone(), parents.iter().map(|p| ids[*p].clone()).collect());
            }

            let finder = store.finder();
            let (x, y) = (&ids[history.len() - 1], &ids[history.len() - 2]);
            let common = store
                .ancestors(x)
                .intersection(&store.ancestors(y))
                .cloned()
                .collect::<HashSet<_>>();
            let lowest = finder.lowest_common_ancestors(x, y).unwrap();

            for candidate in &lowest {
                prop_assert!(common.contains(candidate));
                for other in &common {
                    if other != candidate {
                        prop_assert!(!store.ancestors(other).contains(candidate));
                    }
                }
            }
            prop_assert_eq!(lowest.is_empty(), common.is_empty());
        }
    }
}
