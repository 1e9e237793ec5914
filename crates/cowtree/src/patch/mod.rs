//! Patches: what changed between a base and a produced value.
//!
//! Three operations, `add`, `remove` and `replace`, addressed by a path of
//! record keys, map keys and sequence/set positions. Sequence patches may
//! also target the synthetic `length` key (a `replace` that truncates).

use cowtree_pointer::{format_pointer, parse_pointer, Path, PathSegment};

use crate::error::Error;
use crate::value::json::key_text;
use crate::value::{Key, Value};

pub mod apply;
pub mod codec;
pub(crate) mod generate;

pub use apply::{apply, apply_with};
pub use codec::{from_json, from_json_patch, to_json, to_json_patch};

/// A patch path, in whichever style the producer was configured with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchPath {
    Segments(Path),
    /// Slash-joined and escaped, `""` for the root.
    Pointer(String),
}

impl PatchPath {
    /// The path as segments. Pointer strings come back as key segments;
    /// the applier reads numeric keys as positions where it needs one.
    pub fn segments(&self) -> Result<Path, Error> {
        match self {
            PatchPath::Segments(path) => Ok(path.clone()),
            PatchPath::Pointer(pointer) => parse_pointer(pointer).map_err(|e| Error::InvalidPatch(e.to_string())),
        }
    }

    pub fn is_root(&self) -> bool {
        match self {
            PatchPath::Segments(path) => path.is_empty(),
            PatchPath::Pointer(pointer) => pointer.is_empty(),
        }
    }
}

impl From<Path> for PatchPath {
    fn from(path: Path) -> Self {
        PatchPath::Segments(path)
    }
}

impl From<&str> for PatchPath {
    fn from(pointer: &str) -> Self {
        PatchPath::Pointer(pointer.to_string())
    }
}

impl std::fmt::Display for PatchPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatchPath::Segments(path) => f.write_str(&format_pointer(path)),
            PatchPath::Pointer(pointer) => f.write_str(pointer),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    Add { path: PatchPath, value: Value },
    /// Set removals carry the removed member.
    Remove { path: PatchPath, value: Option<Value> },
    Replace { path: PatchPath, value: Value },
}

impl Patch {
    pub fn add(path: impl Into<PatchPath>, value: impl Into<Value>) -> Self {
        Patch::Add {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn remove(path: impl Into<PatchPath>) -> Self {
        Patch::Remove {
            path: path.into(),
            value: None,
        }
    }

    pub fn replace(path: impl Into<PatchPath>, value: impl Into<Value>) -> Self {
        Patch::Replace {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn op_name(&self) -> &'static str {
        match self {
            Patch::Add { .. } => "add",
            Patch::Remove { .. } => "remove",
            Patch::Replace { .. } => "replace",
        }
    }

    pub fn path(&self) -> &PatchPath {
        match self {
            Patch::Add { path, .. } | Patch::Remove { path, .. } | Patch::Replace { path, .. } => path,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Patch::Add { value, .. } | Patch::Replace { value, .. } => Some(value),
            Patch::Remove { value, .. } => value.as_ref(),
        }
    }

    pub(crate) fn path_mut(&mut self) -> &mut PatchPath {
        match self {
            Patch::Add { path, .. } | Patch::Remove { path, .. } | Patch::Replace { path, .. } => path,
        }
    }
}

/// Path segment for a map key: strings as they are, non-negative integers
/// as indices, other primitives as their JSON text.
///
/// Container keys have no faithful segment; the generator patches maps
/// holding them as a whole instead of going through here.
pub(crate) fn key_segment(key: &Key) -> PathSegment {
    match key.value() {
        Value::String(s) => PathSegment::Key(s.to_string()),
        Value::Number(n) => match n.as_u64() {
            Some(i) => PathSegment::Index(i as usize),
            None => PathSegment::Key(key_text(key)),
        },
        _ => PathSegment::Key(key_text(key)),
    }
}
