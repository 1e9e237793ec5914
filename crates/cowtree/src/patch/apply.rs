//! Patch application.
//!
//! Patches are applied in order inside a single produce call, so the whole
//! list lands or none of it does: the first failure discards the drafts and
//! comes back as [`Error::PatchFailed`] with the offending index.

use cowtree_pointer::PathSegment;
use tracing::debug;

use super::Patch;
use crate::draft::{Draft, Drafts, Item};
use crate::error::Error;
use crate::options::Options;
use crate::produce::Producer;
use crate::value::{Kind, Value};

/// Applies `patches` to `base` with default options.
pub fn apply(base: &Value, patches: &[Patch]) -> Result<Value, Error> {
    apply_with(base, patches, &Options::default())
}

/// Applies `patches` to `base`. Patch recording is switched off; auto-freeze
/// and the classifier follow `options`.
pub fn apply_with(base: &Value, patches: &[Patch], options: &Options) -> Result<Value, Error> {
    let mut options = options.clone();
    options.enable_patches = Default::default();
    let producer = Producer::new(options);

    // Root replacements cannot go through a draft; they restart the run on
    // the new value instead.
    let mut state = base.clone();
    let mut start = 0;
    for (index, patch) in patches.iter().enumerate() {
        if !patch.path().is_root() {
            continue;
        }
        // The run before a root patch is discarded, but must still apply.
        apply_run(&producer, &state, &patches[start..index], start)?;
        state = match patch {
            Patch::Add { value, .. } | Patch::Replace { value, .. } => value.clone(),
            Patch::Remove { .. } => {
                return Err(failed(
                    index,
                    Error::PathResolution {
                        path: String::new(),
                        depth: 0,
                    },
                ))
            }
        };
        start = index + 1;
    }
    apply_run(&producer, &state, &patches[start..], start)
}

fn failed(index: usize, source: Error) -> Error {
    debug!(index, error = %source, "patch failed");
    Error::PatchFailed {
        index,
        source: Box::new(source),
    }
}

fn apply_run(producer: &Producer, base: &Value, patches: &[Patch], offset: usize) -> Result<Value, Error> {
    if patches.is_empty() {
        return Ok(base.clone());
    }
    producer
        .produce(base, |drafts, root| {
            for (i, patch) in patches.iter().enumerate() {
                apply_patch(drafts, root, patch).map_err(|e| failed(offset + i, e))?;
            }
            Ok(())
        })
        .map_err(|e| match e {
            Error::NotDraftable { .. } => failed(offset, e),
            other => other,
        })
}

fn apply_patch(drafts: &mut Drafts, root: Draft, patch: &Patch) -> Result<(), Error> {
    let segments = patch.path().segments()?;
    let unresolved = |depth: usize| Error::PathResolution {
        path: patch.path().to_string(),
        depth,
    };
    let Some((last, parents)) = segments.split_last() else {
        return Err(unresolved(0));
    };

    let mut target = root;
    for (depth, segment) in parents.iter().enumerate() {
        target = step(drafts, target, segment)?.ok_or_else(|| unresolved(depth))?;
    }
    let depth = parents.len();

    match patch {
        Patch::Add { value, .. } => add(drafts, target, last, value.clone(), depth),
        Patch::Remove { .. } => remove(drafts, target, last, depth),
        Patch::Replace { value, .. } => replace(drafts, target, last, value.clone(), depth),
    }
    .map_err(|e| match e {
        Error::PathResolution { depth, .. } => unresolved(depth),
        other => other,
    })
}

/// Descends one segment, yielding the nested draft if there is one.
fn step(drafts: &mut Drafts, draft: Draft, segment: &PathSegment) -> Result<Option<Draft>, Error> {
    let item = match drafts.kind(draft)? {
        Kind::Record | Kind::Sequence => drafts.get(draft, segment.clone())?,
        Kind::Map => match map_key(drafts, draft, segment)? {
            Some(key) => drafts.map_get(draft, key)?,
            None => None,
        },
        Kind::Set => match segment.as_index() {
            Some(i) => drafts.set_values(draft)?.into_iter().nth(i),
            None => None,
        },
    };
    Ok(item.and_then(|item| item.as_draft()))
}

/// Resolves a path segment to an existing map key: the string itself, or
/// the primitive its JSON text spells.
fn map_key(drafts: &Drafts, draft: Draft, segment: &PathSegment) -> Result<Option<Value>, Error> {
    for candidate in map_key_candidates(segment) {
        if drafts.map_has(draft, candidate.clone())? {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

fn map_key_candidates(segment: &PathSegment) -> Vec<Value> {
    match segment {
        PathSegment::Index(i) => vec![Value::from(*i), Value::from(i.to_string())],
        PathSegment::Key(k) => {
            let mut candidates = vec![Value::from(k.as_str())];
            if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(k) {
                if !parsed.is_string() && !parsed.is_array() && !parsed.is_object() {
                    candidates.push(Value::from_json(&parsed));
                }
            }
            candidates
        }
    }
}

/// Key for an entry that does not exist yet. Index segments are numbers;
/// key segments are strings unless their text is a primitive that map key
/// paths only ever spell as text (booleans, null, negative or fractional
/// numbers).
fn new_map_key(segment: &PathSegment) -> Value {
    match segment {
        PathSegment::Index(i) => Value::from(*i),
        PathSegment::Key(k) => match serde_json::from_str::<serde_json::Value>(k) {
            Ok(parsed @ (serde_json::Value::Bool(_) | serde_json::Value::Null)) => Value::from_json(&parsed),
            Ok(serde_json::Value::Number(n)) if n.as_u64().is_none() => Value::Number(n),
            _ => Value::from(k.as_str()),
        },
    }
}

fn index_of(segment: &PathSegment, depth: usize) -> Result<usize, Error> {
    segment.as_index().ok_or(Error::PathResolution {
        path: String::new(),
        depth,
    })
}

fn add(drafts: &mut Drafts, target: Draft, segment: &PathSegment, value: Value, depth: usize) -> Result<(), Error> {
    match drafts.kind(target)? {
        Kind::Record => drafts.set(target, segment.to_key(), value),
        Kind::Sequence => {
            if segment == &PathSegment::Key("-".into()) {
                return drafts.push(target, value);
            }
            drafts.insert(target, index_of(segment, depth)?, value)
        }
        Kind::Map => {
            let key = match map_key(drafts, target, segment)? {
                Some(key) => key,
                None => new_map_key(segment),
            };
            drafts.map_insert(target, key, value)
        }
        Kind::Set => drafts
            .set_insert_at(target, index_of(segment, depth)?, Item::Value(value))
            .map(|_| ()),
    }
}

fn remove(drafts: &mut Drafts, target: Draft, segment: &PathSegment, depth: usize) -> Result<(), Error> {
    let missing = Error::PathResolution {
        path: String::new(),
        depth,
    };
    match drafts.kind(target)? {
        Kind::Record => {
            if drafts.delete(target, segment.to_key())? {
                Ok(())
            } else {
                Err(missing)
            }
        }
        Kind::Sequence => drafts.remove(target, index_of(segment, depth)?).map(|_| ()),
        Kind::Map => match map_key(drafts, target, segment)? {
            Some(key) => drafts.map_remove(target, key).map(|_| ()),
            None => Err(missing),
        },
        Kind::Set => drafts.set_remove_at(target, index_of(segment, depth)?).map(|_| ()),
    }
}

fn replace(drafts: &mut Drafts, target: Draft, segment: &PathSegment, value: Value, depth: usize) -> Result<(), Error> {
    match drafts.kind(target)? {
        Kind::Record => drafts.set(target, segment.to_key(), value),
        Kind::Sequence => {
            if segment == &PathSegment::Key("length".into()) {
                // Patches only ever shrink a sequence through its length.
                let len = drafts.len(target)?;
                return match value.as_u64().and_then(|n| usize::try_from(n).ok()) {
                    Some(new_len) if new_len <= len => drafts.truncate(target, new_len),
                    Some(new_len) => Err(Error::InvalidPatch(format!(
                        "length replace may only shrink a sequence, got {new_len} for length {len}"
                    ))),
                    None => Err(Error::InvalidPatch(format!("length must be a non-negative integer, got {value:?}"))),
                };
            }
            let index = index_of(segment, depth)?;
            let len = drafts.len(target)?;
            if index >= len {
                return Err(Error::IndexOutOfRange { index, len });
            }
            drafts.set(target, index, value)
        }
        Kind::Map => {
            let key = match map_key(drafts, target, segment)? {
                Some(key) => key,
                None => new_map_key(segment),
            };
            drafts.map_insert(target, key, value)
        }
        Kind::Set => {
            let index = index_of(segment, depth)?;
            drafts.set_remove_at(target, index)?;
            drafts.set_insert_at(target, index, Item::Value(value)).map(|_| ())
        }
    }
}
