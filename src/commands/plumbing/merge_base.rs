use crate::areas::repository::Repository;
use crate::artifacts::merge::bca_finder::BCAFinder;
use crate::artifacts::objects::object_id::ObjectId;

impl Repository {
    pub(crate) fn bca_finder(
        &self,
    ) -> BCAFinder<impl Fn(&ObjectId) -> anyhow::Result<Vec<ObjectId>> + '_> {
        BCAFinder::new(|oid: &ObjectId| self.database().commit_parents(oid))
    }

    /// The single base a merge of `a` and `b` would use
    ///
    /// Among several lowest common ancestors the one with the greatest generation number wins,
    /// ties going to the smallest id. None when the histories are unrelated.
    pub fn merge_base(&self, a: &ObjectId, b: &ObjectId) -> anyhow::Result<Option<ObjectId>> {
        self.bca_finder().find_best_common_ancestor(a, b)
    }

    /// Common ancestors of `a` and `b` that are not ancestors of another common ancestor
    pub fn lowest_common_ancestors(
        &self,
        a: &ObjectId,
        b: &ObjectId,
    ) -> anyhow::Result<Vec<ObjectId>> {
        self.bca_finder().lowest_common_ancestors(a, b)
    }

    /// True when `ancestor` is reachable from `descendant` (every commit is its own ancestor)
    pub fn is_ancestor(&self, ancestor: &ObjectId, descendant: &ObjectId) -> anyhow::Result<bool> {
        self.bca_finder().is_ancestor(ancestor, descendant)
    }
}
