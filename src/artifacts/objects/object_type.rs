use crate::errors::UgitError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
            ObjectType::Commit => "commit",
        }
    }

    /// Frame header digested together with the payload
    pub fn header(&self, payload_len: usize) -> String {
        format!("{} {}\0", self.as_str(), payload_len)
    }

    /// Split framed bytes into `(type, declared length, payload offset)`
    ///
    /// Fails with `CorruptObject` (tagged with `oid`) when the header is malformed.
    pub fn parse_header(framed: &[u8], oid: &str) -> anyhow::Result<(ObjectType, usize, usize)> {
        let nul = framed
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| UgitError::corrupt(oid, "missing header terminator"))?;

        let header = std::str::from_utf8(&framed[..nul])
            .map_err(|_| UgitError::corrupt(oid, "header is not valid UTF-8"))?;
        let (kind, len) = header
            .split_once(' ')
            .ok_or_else(|| UgitError::corrupt(oid, "header has no length"))?;

        let object_type = ObjectType::try_from(kind)
            .map_err(|_| UgitError::corrupt(oid, format!("unknown object type '{kind}'")))?;
        let len = len
            .parse::<usize>()
            .map_err(|_| UgitError::corrupt(oid, format!("invalid length '{len}'")))?;

        Ok((object_type, len, nul + 1))
    }
}

impl TryFrom<&str> for ObjectType {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> anyhow::Result<Self> {
        match value {
            "blob" => Ok(ObjectType::Blob),
            "tree" => Ok(ObjectType::Tree),
            "commit" => Ok(ObjectType::Commit),
            _ => Err(UgitError::InvalidName {
                name: value.to_string(),
                reason: "not an object type".to_string(),
            }
            .into()),
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
