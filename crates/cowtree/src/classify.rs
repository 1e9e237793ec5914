//! Value classifier: decides which values get drafted.
//!
//! Every container is draftable unless a classification hook marks it
//! opaque. Opaque containers are treated like primitives: reads hand them
//! out as plain values, writes compare them by reference, and patches carry
//! them whole.

use std::fmt;
use std::rc::Rc;

use crate::value::{Kind, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Draftability {
    Draftable,
    Opaque,
}

pub type ClassifyFn = dyn Fn(&Value) -> Draftability;

/// Draftability check with an optional user hook.
///
/// Lives in [`Options`](crate::Options); it is only read during a call.
#[derive(Clone, Default)]
pub struct Classifier {
    hook: Option<Rc<ClassifyFn>>,
}

impl Classifier {
    pub fn new(hook: impl Fn(&Value) -> Draftability + 'static) -> Self {
        Self {
            hook: Some(Rc::new(hook)),
        }
    }

    /// Returns the draft kind for `value`, or `None` if it must not be
    /// drafted.
    pub fn classify(&self, value: &Value) -> Option<Kind> {
        let kind = value.kind()?;
        match &self.hook {
            Some(hook) if hook(value) == Draftability::Opaque => None,
            _ => Some(kind),
        }
    }

    pub fn is_draftable(&self, value: &Value) -> bool {
        self.classify(value).is_some()
    }
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("hook", &self.hook.as_ref().map(|_| "fn"))
            .finish()
    }
}
