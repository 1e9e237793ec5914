//! Entry points: run a mutator over drafts of a base value.
//!
//! ```
//! use cowtree::{produce, Value};
//!
//! let base = Value::record([("todo", Value::sequence(["write"]))]);
//! let next = produce(&base, |drafts, root| {
//!     let todo = drafts.child(root, "todo")?;
//!     drafts.push(todo, "test")
//! })
//! .unwrap();
//!
//! assert_eq!(next.get("todo").unwrap().len(), Some(2));
//! assert_eq!(base.get("todo").unwrap().len(), Some(1));
//! ```

use tracing::debug;

use crate::draft::{Draft, Drafts};
use crate::error::Error;
use crate::finalize::finalize;
use crate::options::{Options, PatchOptions};
use crate::patch::generate::generate;
use crate::patch::Patch;
use crate::value::Value;

/// Result of [`Producer::create`].
#[derive(Debug, Clone, PartialEq)]
pub struct Produced {
    pub state: Value,
    /// Present when the producer has patches enabled.
    pub patches: Option<PatchPair>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatchPair {
    pub patches: Vec<Patch>,
    pub inverse: Vec<Patch>,
}

/// A configured producer. Cheap to clone, holds no state between calls.
#[derive(Debug, Clone, Default)]
pub struct Producer {
    options: Options,
}

impl Producer {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Runs `mutate` over a draft of `base` and returns the next state.
    ///
    /// `base` itself is never modified. If `mutate` fails, its error is
    /// returned and every draft of the call is discarded.
    pub fn produce<F, E>(&self, base: &Value, mutate: F) -> Result<Value, E>
    where
        F: FnOnce(&mut Drafts, Draft) -> Result<(), E>,
        E: From<Error>,
    {
        let (state, _) = self.run(base, mutate, None)?;
        Ok(state)
    }

    /// Like [`produce`](Self::produce), also returning forward and inverse
    /// patches. Uses the configured patch options, or the defaults if
    /// patches are switched off.
    pub fn produce_with_patches<F, E>(&self, base: &Value, mutate: F) -> Result<(Value, Vec<Patch>, Vec<Patch>), E>
    where
        F: FnOnce(&mut Drafts, Draft) -> Result<(), E>,
        E: From<Error>,
    {
        let (state, pair) = self.run(base, mutate, Some(self.options.patch_settings()))?;
        let pair = pair.unwrap_or_default();
        Ok((state, pair.patches, pair.inverse))
    }

    /// Produces the next state, with patches only if `enablePatches` is on.
    pub fn create<F, E>(&self, base: &Value, mutate: F) -> Result<Produced, E>
    where
        F: FnOnce(&mut Drafts, Draft) -> Result<(), E>,
        E: From<Error>,
    {
        let (state, patches) = self.run(base, mutate, self.options.enable_patches.settings())?;
        Ok(Produced { state, patches })
    }

    fn run<F, E>(&self, base: &Value, mutate: F, patches: Option<PatchOptions>) -> Result<(Value, Option<PatchPair>), E>
    where
        F: FnOnce(&mut Drafts, Draft) -> Result<(), E>,
        E: From<Error>,
    {
        let mut drafts = Drafts::new(self.options.classify.clone());
        let root = drafts.open_root(base)?;
        debug!(scope = drafts.scope(), patches = patches.is_some(), "produce");

        if let Err(err) = mutate(&mut drafts, root) {
            debug!(scope = drafts.scope(), "mutator failed, drafts discarded");
            return Err(err);
        }

        let root_id = drafts.resolve(root)?;
        let state = finalize(&mut drafts, root_id, self.options.enable_auto_freeze);
        let pair = patches.map(|options| {
            let (patches, inverse) = generate(&drafts, root_id, &options);
            PatchPair { patches, inverse }
        });
        debug!(
            scope = drafts.scope(),
            changed = !state.ptr_eq(base),
            patches = pair.as_ref().map_or(0, |p| p.patches.len()),
            "produce finished"
        );
        Ok((state, pair))
    }
}

/// [`Producer::produce`] with default options.
pub fn produce<F, E>(base: &Value, mutate: F) -> Result<Value, E>
where
    F: FnOnce(&mut Drafts, Draft) -> Result<(), E>,
    E: From<Error>,
{
    Producer::default().produce(base, mutate)
}

/// [`Producer::produce_with_patches`] with default options.
pub fn produce_with_patches<F, E>(base: &Value, mutate: F) -> Result<(Value, Vec<Patch>, Vec<Patch>), E>
where
    F: FnOnce(&mut Drafts, Draft) -> Result<(), E>,
    E: From<Error>,
{
    Producer::default().produce_with_patches(base, mutate)
}
