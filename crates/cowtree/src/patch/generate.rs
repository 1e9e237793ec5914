//! Patch generation from a finalized draft tree.
//!
//! Changed nodes are visited in pre-order, each once even when reachable
//! along several paths. Every node contributes a chunk of forward patches
//! and a chunk of inverse patches; the inverse list is the chunks in
//! reverse visiting order, so undoing a child comes before undoing the
//! structure around it.

use std::collections::HashSet;

use cowtree_pointer::{format_pointer, Path, PathSegment};

use super::{key_segment, Patch, PatchPath};
use crate::diff::{self, RunOp};
use crate::draft::{Assigned, DraftNode, Drafts, NodeId, Shadow, Slot};
use crate::options::{PatchOptions, PathStyle};
use crate::value::{Key, Kind, Value};

#[derive(Default)]
struct Chunk {
    forward: Vec<Patch>,
    inverse: Vec<Patch>,
    children: Vec<(NodeId, Path)>,
}

impl Chunk {
    fn emit(&mut self, forward: Patch, inverse: Patch) {
        self.forward.push(forward);
        self.inverse.push(inverse);
    }
}

fn child_path(path: &Path, segment: PathSegment) -> PatchPath {
    let mut path = path.clone();
    path.push(segment);
    PatchPath::Segments(path)
}

/// Forward and inverse patches for the finalized tree under `root`.
pub(crate) fn generate(drafts: &Drafts, root: NodeId, options: &PatchOptions) -> (Vec<Patch>, Vec<Patch>) {
    let mut forward = Vec::new();
    let mut inverse_chunks = Vec::new();
    let mut visited = HashSet::new();
    let mut stack: Vec<(NodeId, Path)> = vec![(root, Vec::new())];

    while let Some((id, path)) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        let node = drafts.node(id);
        if !node.changed {
            continue;
        }
        let chunk = match node.kind {
            Kind::Record | Kind::Map => keyed(drafts, node, &path),
            Kind::Sequence => sequence(drafts, node, &path, options),
            Kind::Set => set(node, &path),
        };
        forward.extend(chunk.forward);
        inverse_chunks.push(chunk.inverse);
        stack.extend(chunk.children.into_iter().rev());
    }

    let mut inverse: Vec<Patch> = inverse_chunks.into_iter().rev().flatten().collect();
    if options.path_style == PathStyle::String {
        for patch in forward.iter_mut().chain(inverse.iter_mut()) {
            let pointer = match patch.path() {
                PatchPath::Segments(path) => format_pointer(path),
                PatchPath::Pointer(pointer) => pointer.clone(),
            };
            *patch.path_mut() = PatchPath::Pointer(pointer);
        }
    }
    (forward, inverse)
}

fn finalized(node: &DraftNode) -> &Value {
    node.finalized.as_ref().unwrap_or(&node.original)
}

/// Whether a map edit touches an entry keyed by a container.
fn touches_container_key(drafts: &Drafts, node: &DraftNode) -> bool {
    if node.assigned.keys().any(|key| key.value().is_container()) {
        return true;
    }
    match &node.shadow {
        Some(Shadow::Map(entries)) => entries.iter().any(|(key, slot)| {
            key.value().is_container() && drafts.slot_node(slot).is_some_and(|child| drafts.node(child).changed)
        }),
        _ => false,
    }
}

/// Records and maps: one patch per assigned key, then descend into
/// untouched keys whose child draft changed in place. A map edit under a
/// container key replaces the whole map, since such keys have no path form.
fn keyed(drafts: &Drafts, node: &DraftNode, path: &Path) -> Chunk {
    let mut chunk = Chunk::default();
    let original = &node.original;
    let result = finalized(node);

    if node.kind == Kind::Map && touches_container_key(drafts, node) {
        let at = PatchPath::Segments(path.clone());
        chunk.emit(Patch::replace(at.clone(), result.clone()), Patch::replace(at, original.clone()));
        return chunk;
    }

    let lookup = |value: &Value, key: &Key| -> Option<Value> {
        match value {
            Value::Record(_) => key.value().as_str().and_then(|k| value.get(k)).cloned(),
            Value::Map(_) => value.as_map().and_then(|m| m.get(key)).cloned(),
            _ => None,
        }
    };
    let segment = |key: &Key| -> PathSegment {
        match node.kind {
            Kind::Record => PathSegment::Key(key.value().as_str().unwrap_or_default().to_string()),
            _ => key_segment(key),
        }
    };

    for (key, state) in &node.assigned {
        let at = child_path(path, segment(key));
        let before = lookup(original, key);
        match state {
            Assigned::Removed => {
                if let Some(before) = before {
                    chunk.emit(Patch::remove(at.clone()), Patch::add(at, before));
                }
            }
            Assigned::Added | Assigned::Replaced => {
                let Some(after) = lookup(result, key) else {
                    continue;
                };
                match before {
                    Some(before) if before == after => {}
                    Some(before) => chunk.emit(Patch::replace(at.clone(), after), Patch::replace(at, before)),
                    None => chunk.emit(Patch::add(at.clone(), after), Patch::remove(at)),
                }
            }
        }
    }

    let slots: Vec<(Key, &Slot)> = match &node.shadow {
        Some(Shadow::Record(entries)) => entries.iter().map(|(k, s)| (Key::from(k.as_str()), s)).collect(),
        Some(Shadow::Map(entries)) => entries.iter().map(|(k, s)| (k.clone(), s)).collect(),
        _ => Vec::new(),
    };
    for (key, slot) in slots {
        if node.assigned.contains_key(&key) {
            continue;
        }
        let Some(child) = drafts.slot_node(slot) else {
            continue;
        };
        let child_node = drafts.node(child);
        let in_place = lookup(original, &key).is_some_and(|v| v.ptr_eq(&child_node.original));
        if child_node.changed && in_place {
            let mut child_path = path.clone();
            child_path.push(segment(&key));
            chunk.children.push((child, child_path));
        }
    }
    chunk
}

/// Sequences: an edit script over element identities, emitted with two
/// cursors. Forward patches address the partially rebuilt result (final
/// index), inverse patches the partially restored original.
fn sequence(drafts: &Drafts, node: &DraftNode, path: &Path, options: &PatchOptions) -> Chunk {
    let mut chunk = Chunk::default();
    let (Some(original), Some(result), Some(Shadow::Sequence(slots))) =
        (node.original.as_sequence(), finalized(node).as_sequence(), &node.shadow)
    else {
        return chunk;
    };

    let before: Vec<Key> = original.iter().cloned().map(Key::new).collect();
    let after: Vec<Key> = slots.iter().map(|slot| drafts.slot_identity(slot)).collect();
    let runs = if node.sequence_ops.is_empty() && before.len() == after.len() {
        diff::positional(&before, &after)
    } else {
        diff::edit_script(&before, &after)
    };

    let index = |i: usize| child_path(path, PathSegment::Index(i));
    let (mut oc, mut fc) = (0, 0);
    let last = runs.len().saturating_sub(1);
    for (i, run) in runs.iter().enumerate() {
        match run.op {
            RunOp::Equal => {
                for k in 0..run.len {
                    if let Some(child) = drafts.slot_node(&slots[fc + k]) {
                        if drafts.node(child).changed {
                            let mut child_path = path.clone();
                            child_path.push(PathSegment::Index(fc + k));
                            chunk.children.push((child, child_path));
                        }
                    }
                }
                oc += run.len;
                fc += run.len;
            }
            RunOp::Replace => {
                for _ in 0..run.len {
                    chunk.emit(
                        Patch::replace(index(fc), result[fc].clone()),
                        Patch::replace(index(oc), original[oc].clone()),
                    );
                    oc += 1;
                    fc += 1;
                }
            }
            RunOp::Insert => {
                for _ in 0..run.len {
                    chunk.emit(Patch::add(index(fc), result[fc].clone()), Patch::remove(index(oc)));
                    fc += 1;
                }
            }
            RunOp::Delete if i == last && options.length_assignment => {
                chunk.forward.push(Patch::replace(
                    child_path(path, PathSegment::from("length")),
                    result.len(),
                ));
                for _ in 0..run.len {
                    chunk.inverse.push(Patch::add(index(oc), original[oc].clone()));
                    oc += 1;
                }
            }
            RunOp::Delete => {
                for _ in 0..run.len {
                    chunk.emit(Patch::remove(index(fc)), Patch::add(index(oc), original[oc].clone()));
                    oc += 1;
                }
            }
        }
    }
    chunk
}

/// Sets: removals at their position among the survivors, then additions at
/// their final position. The inverse chunk runs fully reversed.
fn set(node: &DraftNode, path: &Path) -> Chunk {
    let mut chunk = Chunk::default();
    let (Some(original), Some(result)) = (node.original.as_set(), finalized(node).as_set()) else {
        return chunk;
    };
    let index = |i: usize| child_path(path, PathSegment::Index(i));

    let mut removed = 0;
    for (i, member) in original.iter().enumerate() {
        if !result.contains(member) {
            let at = i - removed;
            let value = member.value().clone();
            chunk.emit(
                Patch::Remove {
                    path: index(at),
                    value: Some(value.clone()),
                },
                Patch::add(index(at), value),
            );
            removed += 1;
        }
    }
    for (j, member) in result.iter().enumerate() {
        if !original.contains(member) {
            let value = member.value().clone();
            chunk.emit(
                Patch::add(index(j), value.clone()),
                Patch::Remove {
                    path: index(j),
                    value: Some(value),
                },
            );
        }
    }
    chunk.inverse.reverse();
    chunk
}
