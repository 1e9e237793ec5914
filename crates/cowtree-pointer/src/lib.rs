//! Patch paths for cowtree.
//!
//! A patch path is either a list of [`PathSegment`]s or a slash-joined
//! string in the style of JSON Pointer (RFC 6901), where `~` is escaped as
//! `~0` and `/` as `~1`.
//!
//! # Example
//!
//! ```
//! use cowtree_pointer::{format_pointer, parse_pointer, PathSegment};
//!
//! let path = vec![PathSegment::from("a/b"), PathSegment::Index(2)];
//! let pointer = format_pointer(&path);
//! assert_eq!(pointer, "/a~1b/2");
//!
//! let parsed = parse_pointer(&pointer).unwrap();
//! assert_eq!(parsed, vec![PathSegment::from("a/b"), PathSegment::from("2")]);
//! ```

use thiserror::Error;

pub mod types;
pub use types::{Path, PathSegment};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PointerError {
    #[error("pointer must be empty or start with '/': {0:?}")]
    MissingLeadingSlash(String),
}

/// Unescapes a pointer component.
///
/// `~1` becomes `/` and `~0` becomes `~`.
///
/// ```
/// use cowtree_pointer::unescape_component;
///
/// assert_eq!(unescape_component("a~0b"), "a~b");
/// assert_eq!(unescape_component("c~1d"), "c/d");
/// ```
pub fn unescape_component(component: &str) -> String {
    if !component.contains('~') {
        return component.to_string();
    }
    // ~1 must go before ~0, otherwise "~01" decodes to "/".
    component.replace("~1", "/").replace("~0", "~")
}

/// Escapes a pointer component.
///
/// ```
/// use cowtree_pointer::escape_component;
///
/// assert_eq!(escape_component("a~b"), "a~0b");
/// assert_eq!(escape_component("c/d"), "c~1d");
/// assert_eq!(escape_component("plain"), "plain");
/// ```
pub fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    component.replace('~', "~0").replace('/', "~1")
}

/// Formats path segments into a slash-joined pointer string.
///
/// The root path formats as the empty string.
pub fn format_pointer(path: &[PathSegment]) -> String {
    let mut out = String::with_capacity(path.len() * 8);
    for segment in path {
        out.push('/');
        match segment {
            PathSegment::Index(i) => out.push_str(&i.to_string()),
            PathSegment::Key(k) => out.push_str(&escape_component(k)),
        }
    }
    out
}

/// Parses a pointer string into path segments.
///
/// Every segment comes back as [`PathSegment::Key`]; callers that know they
/// are addressing a sequence use [`PathSegment::as_index`].
pub fn parse_pointer(pointer: &str) -> Result<Path, PointerError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    if !pointer.starts_with('/') {
        return Err(PointerError::MissingLeadingSlash(pointer.to_string()));
    }
    Ok(pointer[1..]
        .split('/')
        .map(|c| PathSegment::Key(unescape_component(c)))
        .collect())
}

/// Checks whether a string is a canonical non-negative integer index.
///
/// ```
/// use cowtree_pointer::is_valid_index;
///
/// assert!(is_valid_index("0"));
/// assert!(is_valid_index("42"));
/// assert!(!is_valid_index("042"));
/// assert!(!is_valid_index("-1"));
/// assert!(!is_valid_index(""));
/// ```
pub fn is_valid_index(index: &str) -> bool {
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    index == "0" || !index.starts_with('0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_formats_empty() {
        assert_eq!(format_pointer(&[]), "");
        assert_eq!(parse_pointer("").unwrap(), Vec::<PathSegment>::new());
    }

    #[test]
    fn escapes_tilde_before_slash() {
        let path = vec![PathSegment::from("~/")];
        assert_eq!(format_pointer(&path), "/~0~1");
        assert_eq!(parse_pointer("/~0~1").unwrap(), path);
    }

    #[test]
    fn double_escape_is_not_collapsed() {
        assert_eq!(unescape_component("~01"), "~1");
    }

    #[test]
    fn rejects_relative_pointer() {
        assert_eq!(
            parse_pointer("foo"),
            Err(PointerError::MissingLeadingSlash("foo".to_string()))
        );
    }
}
