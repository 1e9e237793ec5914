//! Draft manager: the arena of draft nodes behind one produce call.
//!
//! A [`Draft`] is a copyable handle (scope id + arena index). All reads and
//! writes go through [`Drafts`], which dispatches on the node's [`Kind`]:
//!
//! | Kind     | Operations |
//! |----------|------------|
//! | record   | `get`, `set`, `delete`, `keys`, `contains`, `len` |
//! | sequence | the record set plus `push`, `pop`, `insert`, `remove`, `splice`, `shift`, `unshift`, `truncate`, `set_len` |
//! | map      | `map_get`, `map_insert`, `map_remove`, `map_has`, `map_keys`, `map_entries`, `map_clear`, `len` |
//! | set      | `set_has`, `set_add`, `set_remove`, `set_clear`, `set_values`, `len` |
//!
//! Nodes are created lazily the first time a container is read through a
//! draft, and at most once per container identity within a call. The
//! shadow (mutable shallow copy) of a node only exists once something below
//! or at the node has been written.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use tracing::trace;

use cowtree_pointer::{Path, PathSegment};

use crate::classify::Classifier;
use crate::error::Error;
use crate::value::{Key, Kind, Value};

mod map;
mod record;
mod sequence;
mod set;

pub(crate) type NodeId = usize;

static NEXT_SCOPE: AtomicU64 = AtomicU64::new(1);

/// Handle to a draft node. Only valid inside the produce call that made it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Draft {
    scope: u64,
    node: NodeId,
}

/// What a read hands back: a nested draft, or a plain value for
/// primitives and opaque containers.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Draft(Draft),
    Value(Value),
}

impl Item {
    pub fn as_draft(&self) -> Option<Draft> {
        match self {
            Item::Draft(d) => Some(*d),
            Item::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Item::Value(v) => Some(v),
            Item::Draft(_) => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Item::Value(v) => Some(v),
            Item::Draft(_) => None,
        }
    }
}

impl From<Draft> for Item {
    fn from(d: Draft) -> Self {
        Item::Draft(d)
    }
}

impl From<Value> for Item {
    fn from(v: Value) -> Self {
        Item::Value(v)
    }
}

impl From<&Value> for Item {
    fn from(v: &Value) -> Self {
        Item::Value(v.clone())
    }
}

macro_rules! item_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Item {
                fn from(v: $ty) -> Self {
                    Item::Value(Value::from(v))
                }
            }
        )*
    };
}

item_from!(bool, i32, i64, u32, u64, usize, f64, &str, String);

// ── Node ──────────────────────────────────────────────────────────────────

/// A shadow entry: still the raw value, or the draft that replaced it.
#[derive(Debug, Clone)]
pub(crate) enum Slot {
    Value(Value),
    Draft(NodeId),
    /// A container written back after its draft in this call was edited.
    /// Taken as is; never resolved through the registry.
    Pinned(Value),
}

#[derive(Debug, Clone)]
pub(crate) enum Shadow {
    Record(IndexMap<String, Slot>),
    Sequence(Vec<Slot>),
    Map(IndexMap<Key, Slot>),
    /// Keyed by member identity; a drafted member keeps its original's key.
    Set(IndexMap<Key, Slot>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Assigned {
    Added,
    Replaced,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SequenceOp {
    Insert { index: usize, count: usize },
    Remove { index: usize, count: usize },
}

/// How a node is reached from its parent.
#[derive(Debug, Clone)]
pub(crate) enum Edge {
    Key(String),
    Index(usize),
    MapKey(Key),
    Member(Key),
}

#[derive(Debug)]
pub(crate) struct DraftNode {
    pub(crate) kind: Kind,
    pub(crate) original: Value,
    pub(crate) shadow: Option<Shadow>,
    pub(crate) finalized: Option<Value>,
    pub(crate) changed: bool,
    pub(crate) parent: Option<(NodeId, Edge)>,
    pub(crate) assigned: IndexMap<Key, Assigned>,
    pub(crate) sequence_ops: Vec<SequenceOp>,
    pub(crate) member_drafts: HashMap<Key, NodeId>,
    /// Opened over a pinned container; nested containers are pinned too.
    pub(crate) pinned: bool,
}

impl DraftNode {
    fn new(kind: Kind, original: Value, parent: Option<(NodeId, Edge)>) -> Self {
        Self {
            kind,
            original,
            shadow: None,
            finalized: None,
            changed: false,
            parent,
            assigned: IndexMap::new(),
            sequence_ops: Vec::new(),
            member_drafts: HashMap::new(),
            pinned: false,
        }
    }

    /// Slot for a value read straight from `original`.
    pub(crate) fn raw_slot(&self, value: Value) -> Slot {
        if self.pinned && value.is_container() {
            Slot::Pinned(value)
        } else {
            Slot::Value(value)
        }
    }

    fn make_shadow(&self) -> Shadow {
        match &self.original {
            Value::Record(rc) => Shadow::Record(
                rc.iter()
                    .map(|(k, v)| (k.clone(), self.raw_slot(v.clone())))
                    .collect(),
            ),
            Value::Sequence(rc) => Shadow::Sequence(rc.iter().map(|v| self.raw_slot(v.clone())).collect()),
            Value::Map(rc) => Shadow::Map(
                rc.iter()
                    .map(|(k, v)| (k.clone(), self.raw_slot(v.clone())))
                    .collect(),
            ),
            Value::Set(rc) => Shadow::Set(
                rc.iter()
                    .map(|k| {
                        let slot = match self.member_drafts.get(k) {
                            Some(&child) => Slot::Draft(child),
                            None => self.raw_slot(k.value().clone()),
                        };
                        (k.clone(), slot)
                    })
                    .collect(),
            ),
            // Nodes are only ever opened over containers.
            _ => Shadow::Record(IndexMap::new()),
        }
    }
}

// ── Drafts ────────────────────────────────────────────────────────────────

/// The draft arena and identity registry of one produce call.
#[derive(Debug)]
pub struct Drafts {
    scope: u64,
    nodes: Vec<DraftNode>,
    registry: HashMap<usize, NodeId>,
    classify: Classifier,
}

impl Drafts {
    pub(crate) fn new(classify: Classifier) -> Self {
        Self {
            scope: NEXT_SCOPE.fetch_add(1, Ordering::Relaxed),
            nodes: Vec::new(),
            registry: HashMap::new(),
            classify,
        }
    }

    pub(crate) fn scope(&self) -> u64 {
        self.scope
    }

    /// Opens the root draft of a call.
    pub(crate) fn open_root(&mut self, base: &Value) -> Result<Draft, Error> {
        match self.open(base, None) {
            Some(id) => Ok(self.handle(id)),
            None => Err(Error::NotDraftable {
                found: base.type_name(),
            }),
        }
    }

    /// Returns the draft for `original`, creating it if this call has not
    /// seen that container yet. `None` if the value is not draftable.
    pub(crate) fn open(&mut self, original: &Value, parent: Option<(NodeId, Edge)>) -> Option<NodeId> {
        let kind = self.classify.classify(original)?;
        let addr = original.addr()?;
        if let Some(&id) = self.registry.get(&addr) {
            return Some(id);
        }
        let id = self.nodes.len();
        trace!(scope = self.scope, node = id, %kind, "open draft");
        self.nodes.push(DraftNode::new(kind, original.clone(), parent));
        self.registry.insert(addr, id);
        Some(id)
    }

    /// Opens a draft over a pinned container. It stays out of the registry,
    /// so it never merges with the live draft of the same container.
    fn open_pinned(&mut self, original: &Value, parent: Option<(NodeId, Edge)>) -> Option<NodeId> {
        let kind = self.classify.classify(original)?;
        let id = self.nodes.len();
        trace!(scope = self.scope, node = id, %kind, "open pinned draft");
        let mut node = DraftNode::new(kind, original.clone(), parent);
        node.pinned = true;
        self.nodes.push(node);
        Some(id)
    }

    pub(crate) fn handle(&self, node: NodeId) -> Draft {
        Draft {
            scope: self.scope,
            node,
        }
    }

    pub(crate) fn resolve(&self, draft: Draft) -> Result<NodeId, Error> {
        if draft.scope != self.scope || draft.node >= self.nodes.len() {
            return Err(Error::StaleDraft);
        }
        Ok(draft.node)
    }

    pub(crate) fn node(&self, id: NodeId) -> &DraftNode {
        &self.nodes[id]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut DraftNode {
        &mut self.nodes[id]
    }

    /// The draft node a raw value stands for in this call, if any.
    pub(crate) fn registered(&self, value: &Value) -> Option<NodeId> {
        value.addr().and_then(|addr| self.registry.get(&addr).copied())
    }

    /// The node behind a slot: its draft, or the draft of the container it
    /// still holds raw.
    pub(crate) fn slot_node(&self, slot: &Slot) -> Option<NodeId> {
        match slot {
            Slot::Draft(id) => Some(*id),
            Slot::Value(v) => self.registered(v),
            Slot::Pinned(_) => None,
        }
    }

    /// Identity of a slot: a draft stands for the container it wraps.
    pub(crate) fn slot_identity(&self, slot: &Slot) -> Key {
        match slot {
            Slot::Draft(id) => Key::new(self.nodes[*id].original.clone()),
            Slot::Value(v) | Slot::Pinned(v) => Key::new(v.clone()),
        }
    }

    /// Whether writing `new` over `current` would change nothing.
    ///
    /// A pinned container only matches the live draft of the same container
    /// while that draft is unedited.
    pub(crate) fn same_slot(&self, current: &Slot, new: &Slot) -> bool {
        let live = match (current, new) {
            (Slot::Pinned(_), Slot::Pinned(_)) => None,
            (Slot::Pinned(_), live) | (live, Slot::Pinned(_)) => Some(live),
            _ => None,
        };
        if live.and_then(|slot| self.slot_node(slot)).is_some_and(|id| self.nodes[id].changed) {
            return false;
        }
        self.slot_identity(current) == self.slot_identity(new)
    }

    /// Slot for a written item. A raw container whose draft was already
    /// edited is pinned, so the write restores the container as it was.
    pub(crate) fn input_slot(&self, item: Item) -> Result<Slot, Error> {
        match item {
            Item::Draft(d) => Ok(Slot::Draft(self.resolve(d)?)),
            Item::Value(v) => match self.registered(&v) {
                Some(id) if self.nodes[id].changed => Ok(Slot::Pinned(v)),
                _ => Ok(Slot::Value(v)),
            },
        }
    }

    pub(crate) fn input_key(&self, item: Item) -> Result<Key, Error> {
        match item {
            Item::Draft(d) => Ok(Key::new(self.nodes[self.resolve(d)?].original.clone())),
            Item::Value(v) => Ok(Key::new(v)),
        }
    }

    /// Turns a slot read from `owner` into an item, drafting containers.
    pub(crate) fn slot_item(&mut self, owner: NodeId, slot: Slot, edge: Edge) -> Item {
        match slot {
            Slot::Draft(id) => Item::Draft(self.handle(id)),
            Slot::Value(v) => match self.open(&v, Some((owner, edge))) {
                Some(id) => Item::Draft(self.handle(id)),
                None => Item::Value(v),
            },
            Slot::Pinned(v) => {
                // Pinned drafts are not deduplicated, so the owner's shadow
                // must hold on to the one handed out.
                self.ensure_shadow(owner);
                match self.open_pinned(&v, Some((owner, edge))) {
                    Some(id) => Item::Draft(self.handle(id)),
                    None => Item::Value(v),
                }
            }
        }
    }

    /// Item for a slot that left its container; no new draft is opened.
    pub(crate) fn detached_item(&self, slot: Slot) -> Item {
        match slot {
            Slot::Draft(id) => Item::Draft(self.handle(id)),
            Slot::Value(v) | Slot::Pinned(v) => Item::Value(v),
        }
    }

    pub(crate) fn expect_kind(&self, id: NodeId, kind: Kind, op: &'static str) -> Result<(), Error> {
        let actual = self.nodes[id].kind;
        if actual == kind {
            Ok(())
        } else {
            Err(Error::InvalidOperation { kind: actual, op })
        }
    }

    /// Creates the shadow on first write and marks the node and its
    /// ancestors changed, stopping at the first ancestor already marked.
    pub(crate) fn prepare_write(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(n) = current {
            self.ensure_shadow(n);
            let node = &mut self.nodes[n];
            if node.changed {
                break;
            }
            node.changed = true;
            current = node.parent.as_ref().map(|(p, _)| *p);
        }
    }

    fn ensure_shadow(&mut self, id: NodeId) {
        let node = &mut self.nodes[id];
        if node.shadow.is_none() {
            trace!(scope = self.scope, node = id, "create shadow");
            node.shadow = Some(node.make_shadow());
        }
    }

    // ── Introspection ─────────────────────────────────────────────────────

    pub fn kind(&self, draft: Draft) -> Result<Kind, Error> {
        Ok(self.nodes[self.resolve(draft)?].kind)
    }

    /// The value the draft was opened over.
    pub fn original(&self, draft: Draft) -> Result<Value, Error> {
        Ok(self.nodes[self.resolve(draft)?].original.clone())
    }

    /// Whether the draft or anything below it has been written.
    pub fn is_changed(&self, draft: Draft) -> Result<bool, Error> {
        Ok(self.nodes[self.resolve(draft)?].changed)
    }

    /// Snapshot of the draft's present state.
    ///
    /// Unchanged subtrees come back as the original containers. Nothing is
    /// frozen and the draft stays usable.
    pub fn current(&self, draft: Draft) -> Result<Value, Error> {
        let id = self.resolve(draft)?;
        Ok(crate::finalize::snapshot(self, id))
    }

    /// Path from the root draft, as recorded when each node was opened.
    ///
    /// Sequence indices are the positions at the time of the read; later
    /// structural edits are not reflected.
    pub fn path(&self, draft: Draft) -> Result<Path, Error> {
        let mut id = self.resolve(draft)?;
        let mut path = Vec::new();
        while let Some((parent, edge)) = &self.nodes[id].parent {
            path.push(self.edge_segment(*parent, edge));
            id = *parent;
        }
        path.reverse();
        Ok(path)
    }

    fn edge_segment(&self, parent: NodeId, edge: &Edge) -> PathSegment {
        match edge {
            Edge::Key(k) => PathSegment::Key(k.clone()),
            Edge::Index(i) => PathSegment::Index(*i),
            Edge::MapKey(k) => crate::patch::key_segment(k),
            Edge::Member(k) => {
                let node = &self.nodes[parent];
                let position = match &node.shadow {
                    Some(Shadow::Set(members)) => members.get_index_of(k),
                    _ => node.original.as_set().and_then(|members| members.get_index_of(k)),
                };
                PathSegment::Index(position.unwrap_or(0))
            }
        }
    }

    /// Number of entries of any draft kind.
    pub fn len(&self, draft: Draft) -> Result<usize, Error> {
        let id = self.resolve(draft)?;
        let node = &self.nodes[id];
        Ok(match &node.shadow {
            Some(Shadow::Record(e)) => e.len(),
            Some(Shadow::Sequence(s)) => s.len(),
            Some(Shadow::Map(e)) => e.len(),
            Some(Shadow::Set(e)) => e.len(),
            None => node.original.len().unwrap_or(0),
        })
    }

    pub fn is_empty(&self, draft: Draft) -> Result<bool, Error> {
        Ok(self.len(draft)? == 0)
    }

    /// Draft behind `prop`, failing if it holds no container.
    pub fn child(&mut self, draft: Draft, prop: impl Into<PathSegment>) -> Result<Draft, Error> {
        let prop = prop.into();
        match self.get(draft, prop.clone())? {
            Some(Item::Draft(child)) => Ok(child),
            _ => Err(Error::PathResolution {
                path: prop.to_string(),
                depth: 0,
            }),
        }
    }
}
