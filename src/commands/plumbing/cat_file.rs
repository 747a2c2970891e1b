use crate::areas::repository::Repository;
use crate::artifacts::branch::MIN_ABBREVIATED_OID_LENGTH;
use crate::artifacts::branch::revision::Revision;
use crate::artifacts::objects::object::ObjectBox;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::UgitError;

impl Repository {
    /// Print the object named by `object`
    pub fn cat_file(&self, object: &str) -> anyhow::Result<ObjectBox> {
        let oid = self.resolve_object(object)?;

        let object = self.database().parse_object(&oid)?;
        writeln!(self.writer(), "{}", object.display())?;

        Ok(object)
    }

    /// Find any object by full id, reference, unique id prefix or revision expression
    ///
    /// Unlike [`Revision::resolve`], a prefix may name a blob or a tree.
    pub fn resolve_object(&self, name: &str) -> anyhow::Result<ObjectId> {
        if let Ok(oid) = ObjectId::try_parse(name) {
            return Ok(oid);
        }

        if self.refs().lookup(name).is_none()
            && name.len() >= MIN_ABBREVIATED_OID_LENGTH
            && let [oid] = self.database().find_objects_by_prefix(name)?.as_slice()
        {
            return Ok(oid.clone());
        }

        Revision::resolve_str(name, self)
    }

    /// Resolve `name` to a tree, peeling a commit to its root tree
    pub fn resolve_tree(&self, name: &str) -> anyhow::Result<ObjectId> {
        let oid = self.resolve_object(name)?;

        match self.database().object_type(&oid)? {
            ObjectType::Tree => Ok(oid),
            ObjectType::Commit => Ok(self.database().load_commit(&oid)?.tree_oid().clone()),
            ObjectType::Blob => {
                Err(UgitError::corrupt(&oid, "expected a tree or a commit, found a blob").into())
            }
        }
    }
}
