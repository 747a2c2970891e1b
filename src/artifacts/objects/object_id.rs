//! Object identifier
//!
//! A 40-character lowercase hexadecimal SHA-1 digest. Objects live under
//! `.ugit/objects/<first 2 chars>/<remaining 38 chars>`.

use crate::artifacts::objects::{OBJECT_ID_BYTES, OBJECT_ID_LENGTH};
use crate::errors::UgitError;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

/// Length of the abbreviated form printed to users
pub const SHORT_OID_LENGTH: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Validate a full hexadecimal id, normalizing it to lowercase
    pub fn try_parse(id: impl Into<String>) -> anyhow::Result<Self> {
        let id = id.into();

        if id.len() != OBJECT_ID_LENGTH || !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(UgitError::InvalidName {
                name: id,
                reason: format!("expected {OBJECT_ID_LENGTH} hexadecimal characters"),
            }
            .into());
        }

        Ok(Self(id.to_ascii_lowercase()))
    }

    pub fn from_digest(digest: &[u8]) -> anyhow::Result<Self> {
        Self::try_parse(digest.iter().map(|b| format!("{b:02x}")).collect::<String>())
    }

    /// Write the id as 20 raw bytes (tree entries and index entries use this form)
    pub fn write_binary_to<W: io::Write>(&self, writer: &mut W) -> anyhow::Result<()> {
        let mut raw = [0u8; OBJECT_ID_BYTES];

        for (i, byte) in raw.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&self.0[i * 2..i * 2 + 2], 16)?;
        }
        writer.write_all(&raw)?;

        Ok(())
    }

    /// Read 20 raw bytes back into a hexadecimal id
    pub fn read_binary_from<R: io::Read + ?Sized>(reader: &mut R) -> anyhow::Result<Self> {
        let mut raw = [0u8; OBJECT_ID_BYTES];
        reader.read_exact(&mut raw)?;

        Self::from_digest(&raw)
    }

    /// Fan-out path relative to the objects directory, e.g. `ab/c123...`
    pub fn to_path(&self) -> PathBuf {
        let (dir, file) = self.0.split_at(2);
        PathBuf::from(dir).join(file)
    }

    pub fn to_short_oid(&self) -> String {
        self.0[..SHORT_OID_LENGTH].to_string()
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ObjectId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse(s)
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("abc")]
    #[case("zz39a3ee5e6b4b0d3255bfef95601890afd80709")]
    #[case("da39a3ee5e6b4b0d3255bfef95601890afd807091")]
    fn malformed_ids_are_rejected(#[case] id: &str) {
        assert!(ObjectId::try_parse(id).is_err());
    }

    #[test]
    fn uppercase_ids_are_normalized() {
        let oid = ObjectId::try_parse("DA39A3EE5E6B4B0D3255BFEF95601890AFD80709").unwrap();

        assert_eq!(oid.as_ref(), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
        assert_eq!(oid.to_short_oid(), "da39a3e");
        assert_eq!(
            oid.to_path(),
            PathBuf::from("da").join("39a3ee5e6b4b0d3255bfef95601890afd80709")
        );
    }

    proptest! {
        #[test]
        fn binary_form_preserves_the_id(id in "[0-9a-f]{40}") {
            let oid = ObjectId::try_parse(id.clone()).unwrap();
            let mut raw = Vec::new();
            oid.write_binary_to(&mut raw).unwrap();

            prop_assert_eq!(raw.len(), OBJECT_ID_BYTES);
            let decoded = ObjectId::read_binary_from(&mut raw.as_slice()).unwrap();
            prop_assert_eq!(decoded.as_ref(), id.as_str());
        }
    }
}
