//! Turns a draft tree back into plain values.
//!
//! Unchanged nodes yield their original container untouched; changed nodes
//! yield a fresh container built from their shadow with every slot
//! resolved. Raw container slots that have a draft in this call resolve
//! through it, so an aliased container reads the same at every place it
//! was reached from. Pinned slots are taken as they are. The walk uses an
//! explicit stack and visits each node once.

use std::collections::{HashMap, HashSet};

use indexmap::{IndexMap, IndexSet};
use tracing::trace;

use crate::draft::{Drafts, NodeId, Shadow, Slot};
use crate::value::{Key, Value};

/// Finalizes the tree under `root`, memoizing every node's result.
pub(crate) fn finalize(drafts: &mut Drafts, root: NodeId, freeze: bool) -> Value {
    let mut memo = HashMap::new();
    let result = materialize(drafts, root, &mut memo);
    for (id, value) in memo {
        drafts.node_mut(id).finalized = Some(value);
    }
    if freeze {
        result.freeze();
    }
    result
}

/// Present state of the tree under `root`, without touching the drafts.
pub(crate) fn snapshot(drafts: &Drafts, root: NodeId) -> Value {
    materialize(drafts, root, &mut HashMap::new())
}

fn materialize(drafts: &Drafts, root: NodeId, memo: &mut HashMap<NodeId, Value>) -> Value {
    let mut stack = vec![(root, false)];
    let mut in_progress = HashSet::new();
    while let Some((id, expanded)) = stack.pop() {
        if memo.contains_key(&id) {
            continue;
        }
        let node = drafts.node(id);
        if !node.changed {
            memo.insert(id, node.original.clone());
            continue;
        }
        if !expanded {
            in_progress.insert(id);
            stack.push((id, true));
            for slot in shadow_slots(node.shadow.as_ref()) {
                if let Some(child) = drafts.slot_node(slot) {
                    if !memo.contains_key(&child) && !in_progress.contains(&child) {
                        stack.push((child, false));
                    }
                }
            }
            continue;
        }
        trace!(node = id, kind = %node.kind, "finalize");
        let value = build(drafts, id, memo);
        in_progress.remove(&id);
        memo.insert(id, value);
    }
    memo.get(&root)
        .cloned()
        .unwrap_or_else(|| drafts.node(root).original.clone())
}

fn shadow_slots(shadow: Option<&Shadow>) -> Box<dyn Iterator<Item = &Slot> + '_> {
    match shadow {
        Some(Shadow::Record(entries)) => Box::new(entries.values()),
        Some(Shadow::Sequence(items)) => Box::new(items.iter()),
        Some(Shadow::Map(entries)) => Box::new(entries.values()),
        Some(Shadow::Set(members)) => Box::new(members.values()),
        None => Box::new(std::iter::empty()),
    }
}

fn resolve(drafts: &Drafts, memo: &HashMap<NodeId, Value>, slot: &Slot) -> Value {
    match drafts.slot_node(slot) {
        Some(child) => memo
            .get(&child)
            .cloned()
            .unwrap_or_else(|| drafts.node(child).original.clone()),
        None => match slot {
            Slot::Value(v) | Slot::Pinned(v) => v.clone(),
            Slot::Draft(child) => drafts.node(*child).original.clone(),
        },
    }
}

fn build(drafts: &Drafts, id: NodeId, memo: &HashMap<NodeId, Value>) -> Value {
    let node = drafts.node(id);
    match &node.shadow {
        Some(Shadow::Record(entries)) => Value::from_record(
            entries
                .iter()
                .map(|(k, slot)| (k.clone(), resolve(drafts, memo, slot)))
                .collect(),
        ),
        Some(Shadow::Sequence(items)) => {
            Value::from_sequence(items.iter().map(|slot| resolve(drafts, memo, slot)).collect())
        }
        Some(Shadow::Map(entries)) => Value::from_map(
            entries
                .iter()
                .map(|(k, slot)| (k.clone(), resolve(drafts, memo, slot)))
                .collect::<IndexMap<Key, Value>>(),
        ),
        Some(Shadow::Set(members)) => {
            let members: IndexSet<Key> = members
                .values()
                .map(|slot| Key::new(resolve(drafts, memo, slot)))
                .collect();
            let unchanged = node
                .original
                .as_set()
                .is_some_and(|original| original.len() == members.len() && original.iter().eq(members.iter()));
            if unchanged {
                node.original.clone()
            } else {
                Value::from_set(members)
            }
        }
        None => node.original.clone(),
    }
}
