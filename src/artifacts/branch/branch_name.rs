use crate::artifacts::branch::INVALID_BRANCH_NAME_REGEX;
use crate::errors::UgitError;
use anyhow::Context;

pub const HEAD_REF_NAME: &str = "HEAD";
pub const HEADS_PREFIX: &str = "refs/heads/";
pub const TAGS_PREFIX: &str = "refs/tags/";

/// Full reference name: `HEAD` or a path under `refs/`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefName(String);

impl RefName {
    pub fn try_parse(name: impl Into<String>) -> anyhow::Result<Self> {
        let name = name.into();
        if name == HEAD_REF_NAME {
            return Ok(Self(name));
        }

        match name.strip_prefix("refs/") {
            Some(rest) if BranchName::try_parse(rest).is_ok() => Ok(Self(name)),
            _ => Err(UgitError::InvalidName {
                name,
                reason: "reference names are HEAD or live under refs/".to_string(),
            }
            .into()),
        }
    }

    pub fn head() -> Self {
        Self(HEAD_REF_NAME.to_string())
    }

    pub fn branch(branch_name: &BranchName) -> Self {
        Self(format!("{HEADS_PREFIX}{branch_name}"))
    }

    pub fn is_head(&self) -> bool {
        self.0 == HEAD_REF_NAME
    }

    /// The branch this reference names, if it lives under `refs/heads/`
    pub fn branch_name(&self) -> Option<BranchName> {
        self.0
            .strip_prefix(HEADS_PREFIX)
            .map(|name| BranchName(name.to_string()))
    }

    /// Name without the `refs/heads/` or `refs/tags/` prefix
    pub fn short_name(&self) -> &str {
        self.0
            .strip_prefix(HEADS_PREFIX)
            .or_else(|| self.0.strip_prefix(TAGS_PREFIX))
            .unwrap_or(&self.0)
    }

    pub fn as_ref_path(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated short branch name, e.g. `main` or `feature/login`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchName(String);

impl BranchName {
    pub fn try_parse(name: impl Into<String>) -> anyhow::Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Self::invalid(name, "branch name cannot be empty"));
        }

        let re = regex::Regex::new(INVALID_BRANCH_NAME_REGEX)
            .with_context(|| format!("invalid branch name regex: {INVALID_BRANCH_NAME_REGEX}"))?;

        if re.is_match(&name) || name.split('/').any(str::is_empty) {
            Err(Self::invalid(name, "not a valid branch name"))
        } else {
            Ok(Self(name))
        }
    }

    fn invalid(name: String, reason: &str) -> anyhow::Error {
        UgitError::InvalidName {
            name,
            reason: reason.to_string(),
        }
        .into()
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
