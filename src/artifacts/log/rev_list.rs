use crate::areas::database::Database;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use std::collections::{HashSet, VecDeque};

/// Breadth-first walk from a starting commit over parent edges
///
/// Each commit is yielded once, children before their parents along every path. Nothing is
/// read until the iterator is advanced; iterating a fresh `RevList` walks again.
#[derive(Clone)]
pub struct RevList<'r> {
    database: &'r Database,
    queue: VecDeque<ObjectId>,
    visited: HashSet<ObjectId>,
}

impl<'r> RevList<'r> {
    /// Walk from `start`; an unborn branch (None) yields nothing
    pub fn new(database: &'r Database, start: Option<ObjectId>) -> Self {
        let mut rev_list = RevList {
            database,
            queue: VecDeque::new(),
            visited: HashSet::new(),
        };
        if let Some(start) = start {
            rev_list.enqueue(start);
        }

        rev_list
    }

    fn enqueue(&mut self, oid: ObjectId) {
        if self.visited.insert(oid.clone()) {
            self.queue.push_back(oid);
        }
    }
}

impl Iterator for RevList<'_> {
    type Item = anyhow::Result<(ObjectId, Commit)>;

    fn next(&mut self) -> Option<Self::Item> {
        let oid = self.queue.pop_front()?;

        match self.database.load_commit(&oid) {
            Ok(commit) => {
                for parent in commit.parents() {
                    self.enqueue(parent.clone());
                }
                Some(Ok((oid, commit)))
            }
            Err(error) => {
                // a broken commit ends the walk
                self.queue.clear();
                Some(Err(error))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::commit::Author;
    use crate::artifacts::objects::object_type::ObjectType;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;

    fn commit(database: &Database, parents: Vec<ObjectId>, message: &str) -> ObjectId {
        let tree = database.put(ObjectType::Tree, b"").unwrap();
        let commit = Commit::new(parents, tree, Author::new("test".into()), message.into());
        database.store(&commit).unwrap()
    }

    fn messages(rev_list: RevList<'_>) -> Vec<String> {
        rev_list
            .map(|item| item.unwrap().1.message().to_string())
            .collect()
    }

    #[test]
    fn diamond_history_yields_each_commit_once() {
        let dir = TempDir::new().unwrap();
        let database = Database::new(dir.path().join("objects").into_boxed_path());

        let root = commit(&database, vec![], "root");
        let left = commit(&database, vec![root.clone()], "left");
        let right = commit(&database, vec![root], "right");
        let merge = commit(&database, vec![left, right], "merge");

        let rev_list = RevList::new(&database, Some(merge));

        assert_eq!(messages(rev_list.clone()), vec!["merge", "left", "right", "root"]);
        assert_eq!(messages(rev_list).len(), 4);
    }

    #[test]
    fn unborn_start_is_empty() {
        let dir = TempDir::new().unwrap();
        let database = Database::new(dir.path().join("objects").into_boxed_path());

        assert_eq!(RevList::new(&database, None).count(), 0);
    }
}
