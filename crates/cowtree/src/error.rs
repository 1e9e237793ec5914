//! Error type shared by the draft engine, the patch applier and the codec.

use thiserror::Error;

use crate::value::Kind;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// An operation the draft's container kind does not offer, e.g. a
    /// property-style write on a set.
    #[error("'{kind}' draft does not support {op}")]
    InvalidOperation { kind: Kind, op: &'static str },

    /// A draft handle used outside the produce call that created it.
    #[error("draft handle used outside of the produce call that created it")]
    StaleDraft,

    /// A non-final path segment did not lead to a container, or the final
    /// segment names nothing to remove or replace.
    #[error("cannot resolve path {path} at segment {depth}")]
    PathResolution { path: String, depth: usize },

    /// Applying a patch list stopped at patch `index`; patches before it
    /// applied cleanly but the whole call was rolled back.
    #[error("patch {index} failed: {source}")]
    PatchFailed {
        index: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("cannot edit frozen {kind}")]
    Frozen { kind: Kind },

    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: Kind,
        found: &'static str,
    },

    /// The base handed to produce is a primitive or an opaque container.
    #[error("cannot draft a value of type {found}")]
    NotDraftable { found: &'static str },

    #[error("invalid patch: {0}")]
    InvalidPatch(String),

    /// A mutator gave up. The draft tree is discarded.
    #[error("mutator failed: {0}")]
    Mutator(String),
}

impl Error {
    pub fn mutator(msg: impl Into<String>) -> Self {
        Error::Mutator(msg.into())
    }

    pub(crate) fn property_write(kind: Kind) -> Self {
        Error::InvalidOperation {
            kind,
            op: "any property assignment",
        }
    }
}
