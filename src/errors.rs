//! Failure taxonomy
//!
//! Every operation returns `anyhow::Result`; the failures callers are expected to react to are
//! raised as a [`UgitError`] and can be recovered with [`UgitError::kind_of`] (or
//! `anyhow::Error::downcast_ref`) even after context has been attached.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UgitError {
    /// A missing object, reference, commit or path
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// The path escapes the working tree or is malformed
    #[error("invalid path '{}': {reason}", path.display())]
    InvalidPath { path: PathBuf, reason: String },

    /// A symbolic reference was used where a direct one was expected (or vice versa)
    #[error("wrong reference type for '{name}': {reason}")]
    WrongRefType { name: String, reason: String },

    /// The operation would destroy uncommitted state, or unresolved conflicts remain
    #[error("{0}")]
    Conflict(String),

    /// Stored bytes do not match their id, or an object/index failed to parse
    #[error("corrupt object {id}: {reason}")]
    CorruptObject { id: String, reason: String },

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("symbolic reference cycle detected at '{0}'")]
    SymbolicRefCycle(String),

    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },
}

impl UgitError {
    pub fn not_found(kind: &'static str, name: impl ToString) -> Self {
        UgitError::NotFound {
            kind,
            name: name.to_string(),
        }
    }

    pub fn invalid_path(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        UgitError::InvalidPath {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn corrupt(id: impl ToString, reason: impl ToString) -> Self {
        UgitError::CorruptObject {
            id: id.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Look through an `anyhow` chain for the tagged error that caused it
    pub fn kind_of(error: &anyhow::Error) -> Option<&UgitError> {
        error.downcast_ref::<UgitError>()
    }
}
