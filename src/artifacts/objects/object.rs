use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use anyhow::Result;
use bytes::Bytes;
use sha1::{Digest, Sha1};

/// Produce the payload of an object (without the frame header)
pub trait Packable {
    fn serialize(&self) -> Result<Bytes>;
}

pub trait Unpackable {
    fn deserialize(payload: Bytes) -> Result<Self>
    where
        Self: Sized;
}

pub trait Object: Packable {
    fn object_type(&self) -> ObjectType;

    /// Human-readable rendering used by `cat-file`
    fn display(&self) -> String;

    fn object_id(&self) -> Result<ObjectId> {
        Ok(digest(self.object_type(), &self.serialize()?)?.0)
    }
}

/// Frame a payload and hash it, returning the id together with the framed bytes
pub fn digest(object_type: ObjectType, payload: &[u8]) -> Result<(ObjectId, Bytes)> {
    let mut framed = Vec::with_capacity(payload.len() + 16);
    framed.extend_from_slice(object_type.header(payload.len()).as_bytes());
    framed.extend_from_slice(payload);

    let oid = ObjectId::from_digest(&Sha1::digest(&framed))?;
    Ok((oid, Bytes::from(framed)))
}

#[derive(Debug, Clone)]
pub enum ObjectBox {
    Blob(Box<Blob>),
    Tree(Box<Tree>),
    Commit(Box<Commit>),
}

impl ObjectBox {
    pub fn display(&self) -> String {
        match self {
            ObjectBox::Blob(blob) => blob.display(),
            ObjectBox::Tree(tree) => tree.display(),
            ObjectBox::Commit(commit) => commit.display(),
        }
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            ObjectBox::Blob(_) => ObjectType::Blob,
            ObjectBox::Tree(_) => ObjectType::Tree,
            ObjectBox::Commit(_) => ObjectType::Commit,
        }
    }
}
