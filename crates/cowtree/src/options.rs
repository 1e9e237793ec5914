//! Configuration for produce calls.
//!
//! `Options` deserializes from JSON or TOML using camelCase names:
//!
//! ```toml
//! enableAutoFreeze = true
//!
//! [enablePatches]
//! pathStyle = "string"
//! lengthAssignment = false
//! ```
//!
//! `enablePatches` also accepts a plain boolean. The classification hook is
//! code-only, see [`Options::with_classifier`].

use serde::{Deserialize, Serialize};

use crate::classify::{Classifier, Draftability};
use crate::value::Value;

/// How patch paths are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathStyle {
    /// A list of keys and indices.
    #[default]
    Array,
    /// A slash-joined, escaped pointer string.
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PatchOptions {
    pub path_style: PathStyle,
    /// Represent a trailing sequence shrink as one `replace` of the
    /// synthetic `length` segment instead of one `remove` per element.
    #[serde(alias = "representLengthAsAssignment", alias = "arrayLengthAssignment")]
    pub length_assignment: bool,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            path_style: PathStyle::Array,
            length_assignment: true,
        }
    }
}

/// `enablePatches`: either a switch or a full set of patch options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnablePatches {
    Flag(bool),
    With(PatchOptions),
}

impl Default for EnablePatches {
    fn default() -> Self {
        EnablePatches::Flag(false)
    }
}

impl EnablePatches {
    /// Patch options in effect, `None` if patches are disabled.
    pub fn settings(&self) -> Option<PatchOptions> {
        match self {
            EnablePatches::Flag(false) => None,
            EnablePatches::Flag(true) => Some(PatchOptions::default()),
            EnablePatches::With(options) => Some(*options),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    pub enable_patches: EnablePatches,
    pub enable_auto_freeze: bool,
    #[serde(skip)]
    pub classify: Classifier,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_patches(mut self, patches: PatchOptions) -> Self {
        self.enable_patches = EnablePatches::With(patches);
        self
    }

    pub fn with_auto_freeze(mut self, enabled: bool) -> Self {
        self.enable_auto_freeze = enabled;
        self
    }

    pub fn with_classifier(mut self, hook: impl Fn(&Value) -> Draftability + 'static) -> Self {
        self.classify = Classifier::new(hook);
        self
    }

    /// Patch options to use when patches are requested explicitly.
    pub(crate) fn patch_settings(&self) -> PatchOptions {
        self.enable_patches.settings().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = Options::default();
        assert_eq!(options.enable_patches.settings(), None);
        assert!(!options.enable_auto_freeze);
        assert_eq!(options.patch_settings(), PatchOptions::default());
        assert!(PatchOptions::default().length_assignment);
    }

    #[test]
    fn enable_patches_accepts_bool_or_table() {
        let flag: EnablePatches = serde_json::from_str("true").unwrap();
        assert_eq!(flag.settings(), Some(PatchOptions::default()));

        let with: EnablePatches =
            serde_json::from_str(r#"{"pathStyle": "string", "representLengthAsAssignment": false}"#)
                .unwrap();
        assert_eq!(
            with.settings(),
            Some(PatchOptions {
                path_style: PathStyle::String,
                length_assignment: false,
            })
        );
    }

    #[test]
    fn options_from_json() {
        let options: Options =
            serde_json::from_str(r#"{"enablePatches": true, "enableAutoFreeze": true}"#).unwrap();
        assert!(options.enable_auto_freeze);
        assert!(options.enable_patches.settings().is_some());
    }
}
