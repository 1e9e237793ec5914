//! Property access shared by record and sequence drafts.
//!
//! Sequences answer to index segments plus the synthetic `length` key;
//! maps and sets refuse property-style access altogether.

use cowtree_pointer::PathSegment;

use super::{Assigned, Draft, Drafts, Edge, Item, NodeId, Shadow, Slot};
use crate::error::Error;
use crate::value::{Key, Kind, Value};

pub(crate) const LENGTH: &str = "length";

impl Drafts {
    /// Reads a record field or sequence element.
    ///
    /// Containers come back as drafts, everything else as plain values.
    /// `Ok(None)` when the key or index does not exist.
    pub fn get(&mut self, draft: Draft, prop: impl Into<PathSegment>) -> Result<Option<Item>, Error> {
        let id = self.resolve(draft)?;
        let prop = prop.into();
        match self.node(id).kind {
            Kind::Record => Ok(self.record_get(id, prop.to_key())),
            Kind::Sequence => {
                if prop == PathSegment::Key(LENGTH.into()) {
                    return Ok(Some(Item::Value(Value::from(self.sequence_len(id)))));
                }
                Ok(prop.as_index().and_then(|index| self.sequence_get(id, index)))
            }
            kind => Err(Error::InvalidOperation {
                kind,
                op: "property access",
            }),
        }
    }

    /// Writes a record field or sequence element.
    ///
    /// Writing the value already held (the same container, draft, or an
    /// equal primitive) is a no-op. On a sequence, writing at `len` appends
    /// and `length` resizes.
    pub fn set(&mut self, draft: Draft, prop: impl Into<PathSegment>, item: impl Into<Item>) -> Result<(), Error> {
        let id = self.resolve(draft)?;
        let prop = prop.into();
        let slot = self.input_slot(item.into())?;
        match self.node(id).kind {
            Kind::Record => {
                self.record_set(id, prop.to_key(), slot);
                Ok(())
            }
            Kind::Sequence => {
                if prop == PathSegment::Key(LENGTH.into()) {
                    let len = match &slot {
                        Slot::Value(v) => v.as_u64().and_then(|n| usize::try_from(n).ok()),
                        _ => None,
                    };
                    return match len {
                        Some(len) => {
                            self.resize(id, len);
                            Ok(())
                        }
                        None => Err(Error::InvalidOperation {
                            kind: Kind::Sequence,
                            op: "non-numeric length",
                        }),
                    };
                }
                match prop.as_index() {
                    Some(index) => self.sequence_set(id, index, slot),
                    None => Err(Error::InvalidOperation {
                        kind: Kind::Sequence,
                        op: "non-index property assignment",
                    }),
                }
            }
            kind => Err(Error::property_write(kind)),
        }
    }

    /// Deletes a record field, or removes a sequence element and shifts the
    /// rest down. Returns whether anything was there.
    pub fn delete(&mut self, draft: Draft, prop: impl Into<PathSegment>) -> Result<bool, Error> {
        let id = self.resolve(draft)?;
        let prop = prop.into();
        match self.node(id).kind {
            Kind::Record => Ok(self.record_delete(id, &prop.to_key())),
            Kind::Sequence => match prop.as_index() {
                Some(index) if index < self.sequence_len(id) => {
                    self.sequence_splice(id, index, 1, Vec::new());
                    Ok(true)
                }
                _ => Ok(false),
            },
            kind => Err(Error::property_write(kind)),
        }
    }

    pub fn contains(&self, draft: Draft, prop: impl Into<PathSegment>) -> Result<bool, Error> {
        let id = self.resolve(draft)?;
        let prop = prop.into();
        match self.node(id).kind {
            Kind::Record => Ok(self.record_slot(id, &prop.to_key()).is_some()),
            Kind::Sequence => Ok(prop.as_index().is_some_and(|i| i < self.sequence_len(id))),
            kind => Err(Error::InvalidOperation {
                kind,
                op: "property access",
            }),
        }
    }

    /// Record keys in order, or sequence indices.
    pub fn keys(&self, draft: Draft) -> Result<Vec<PathSegment>, Error> {
        let id = self.resolve(draft)?;
        let node = self.node(id);
        match node.kind {
            Kind::Record => Ok(match &node.shadow {
                Some(Shadow::Record(entries)) => entries.keys().map(PathSegment::from).collect(),
                _ => node
                    .original
                    .as_record()
                    .map(|r| r.keys().map(PathSegment::from).collect())
                    .unwrap_or_default(),
            }),
            Kind::Sequence => Ok((0..self.sequence_len(id)).map(PathSegment::Index).collect()),
            kind => Err(Error::InvalidOperation {
                kind,
                op: "property access",
            }),
        }
    }

    // ── Record internals ──────────────────────────────────────────────────

    pub(crate) fn record_slot(&self, id: NodeId, key: &str) -> Option<Slot> {
        let node = self.node(id);
        match &node.shadow {
            Some(Shadow::Record(entries)) => entries.get(key).cloned(),
            _ => node
                .original
                .as_record()
                .and_then(|r| r.get(key))
                .cloned()
                .map(|v| node.raw_slot(v)),
        }
    }

    fn record_get(&mut self, id: NodeId, key: String) -> Option<Item> {
        let slot = self.record_slot(id, &key)?;
        let item = self.slot_item(id, slot, Edge::Key(key.clone()));
        if let (Item::Draft(child), Some(Shadow::Record(entries))) = (&item, &mut self.node_mut(id).shadow) {
            entries.insert(key, Slot::Draft(child.node));
        }
        Some(item)
    }

    fn record_set(&mut self, id: NodeId, key: String, slot: Slot) {
        if let Some(current) = self.record_slot(id, &key) {
            if self.same_slot(&current, &slot) {
                return;
            }
        }
        self.prepare_write(id);
        let node = self.node_mut(id);
        let in_original = node.original.get(&key).is_some();
        let state = if in_original { Assigned::Replaced } else { Assigned::Added };
        node.assigned.insert(Key::from(key.as_str()), state);
        if let Some(Shadow::Record(entries)) = &mut node.shadow {
            entries.insert(key, slot);
        }
    }

    fn record_delete(&mut self, id: NodeId, key: &str) -> bool {
        if self.record_slot(id, key).is_none() {
            return false;
        }
        self.prepare_write(id);
        let node = self.node_mut(id);
        let marker = Key::from(key);
        if node.original.get(key).is_some() {
            node.assigned.insert(marker, Assigned::Removed);
        } else {
            node.assigned.shift_remove(&marker);
        }
        if let Some(Shadow::Record(entries)) = &mut node.shadow {
            entries.shift_remove(key);
        }
        true
    }
}
