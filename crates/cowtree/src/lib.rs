//! cowtree: copy-on-write drafts over nested values.
//!
//! A mutator edits a *draft* of a base value as if it were mutable. The
//! base is never touched; the call returns a new value that shares every
//! untouched subtree with the base, and can also return the forward and
//! inverse patches describing the change.
//!
//! ```
//! use cowtree::{apply, produce_with_patches, Value};
//!
//! let base = Value::record([
//!     ("title", Value::from("draft")),
//!     ("tags", Value::sequence(["a", "b"])),
//! ]);
//! let (next, patches, inverse) = produce_with_patches(&base, |drafts, root| {
//!     drafts.set(root, "title", "final")?;
//!     let tags = drafts.child(root, "tags")?;
//!     drafts.push(tags, "c")
//! })
//! .unwrap();
//!
//! assert_eq!(apply(&base, &patches).unwrap(), next);
//! assert_eq!(apply(&next, &inverse).unwrap(), base);
//! ```
//!
//! Modules:
//! - [`value`]: the value model and JSON conversion
//! - [`draft`]: draft handles and the per-call draft arena
//! - [`patch`]: patch types, application and JSON codec
//! - [`diff`]: the sequence diff used for sequence patches

pub mod classify;
pub mod diff;
pub mod draft;
pub mod error;
mod finalize;
pub mod options;
pub mod patch;
pub mod produce;
pub mod value;

pub use classify::{Classifier, Draftability};
pub use draft::{Draft, Drafts, Item};
pub use error::Error;
pub use options::{EnablePatches, Options, PatchOptions, PathStyle};
pub use patch::{apply, apply_with, Patch, PatchPath};
pub use produce::{produce, produce_with_patches, PatchPair, Produced, Producer};
pub use value::{Key, Kind, Value};

pub use cowtree_pointer::{Path, PathSegment};
