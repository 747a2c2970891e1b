use crate::areas::repository::Repository;
use crate::artifacts::objects::object::digest;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use std::path::Path;

impl Repository {
    /// Hash a working-tree file as a blob; store it only when `write` is set
    pub fn hash_object(&self, path: &Path, write: bool) -> anyhow::Result<ObjectId> {
        let path = self.workspace().normalize(path)?;
        let data = self.workspace().read_file(&path)?;

        let oid = if write {
            self.database().put(ObjectType::Blob, &data)?
        } else {
            digest(ObjectType::Blob, &data)?.0
        };

        writeln!(self.writer(), "{oid}")?;

        Ok(oid)
    }
}
