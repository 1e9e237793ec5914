//! Structural sequence edits.
//!
//! Every insertion or removal funnels through [`Drafts::sequence_splice`],
//! which also appends to the node's structural log. In-place element writes
//! are not logged; the patch generator uses an empty log to compare
//! positionally instead of diffing.

use super::{Draft, Drafts, Edge, Item, NodeId, SequenceOp, Shadow, Slot};
use crate::error::Error;
use crate::value::{Kind, Value};

impl Drafts {
    pub fn push(&mut self, draft: Draft, item: impl Into<Item>) -> Result<(), Error> {
        let id = self.sequence_node(draft, "push")?;
        let slot = self.input_slot(item.into())?;
        let len = self.sequence_len(id);
        self.sequence_splice(id, len, 0, vec![slot]);
        Ok(())
    }

    pub fn pop(&mut self, draft: Draft) -> Result<Option<Item>, Error> {
        let id = self.sequence_node(draft, "pop")?;
        let len = self.sequence_len(id);
        if len == 0 {
            return Ok(None);
        }
        Ok(self.sequence_splice(id, len - 1, 1, Vec::new()).pop())
    }

    pub fn shift(&mut self, draft: Draft) -> Result<Option<Item>, Error> {
        let id = self.sequence_node(draft, "shift")?;
        if self.sequence_len(id) == 0 {
            return Ok(None);
        }
        Ok(self.sequence_splice(id, 0, 1, Vec::new()).pop())
    }

    pub fn unshift(&mut self, draft: Draft, item: impl Into<Item>) -> Result<(), Error> {
        let id = self.sequence_node(draft, "unshift")?;
        let slot = self.input_slot(item.into())?;
        self.sequence_splice(id, 0, 0, vec![slot]);
        Ok(())
    }

    /// Inserts at `index`, shifting later elements up. `index == len`
    /// appends.
    pub fn insert(&mut self, draft: Draft, index: usize, item: impl Into<Item>) -> Result<(), Error> {
        let id = self.sequence_node(draft, "insert")?;
        let len = self.sequence_len(id);
        if index > len {
            return Err(Error::IndexOutOfRange { index, len });
        }
        let slot = self.input_slot(item.into())?;
        self.sequence_splice(id, index, 0, vec![slot]);
        Ok(())
    }

    /// Removes and returns the element at `index`.
    pub fn remove(&mut self, draft: Draft, index: usize) -> Result<Item, Error> {
        let id = self.sequence_node(draft, "remove")?;
        let len = self.sequence_len(id);
        if index >= len {
            return Err(Error::IndexOutOfRange { index, len });
        }
        self.sequence_splice(id, index, 1, Vec::new())
            .pop()
            .ok_or(Error::IndexOutOfRange { index, len })
    }

    /// Removes `delete_count` elements at `start` and inserts `items` in
    /// their place. Both `start` and `delete_count` are clamped to the
    /// sequence. Returns the removed elements.
    pub fn splice<I, T>(&mut self, draft: Draft, start: usize, delete_count: usize, items: I) -> Result<Vec<Item>, Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<Item>,
    {
        let id = self.sequence_node(draft, "splice")?;
        let slots = items
            .into_iter()
            .map(|item| self.input_slot(item.into()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.sequence_splice(id, start, delete_count, slots))
    }

    /// Drops every element from `len` on.
    pub fn truncate(&mut self, draft: Draft, len: usize) -> Result<(), Error> {
        let id = self.sequence_node(draft, "truncate")?;
        let current = self.sequence_len(id);
        if len < current {
            self.sequence_splice(id, len, current - len, Vec::new());
        }
        Ok(())
    }

    /// Truncates, or pads with nulls up to `len`.
    pub fn set_len(&mut self, draft: Draft, len: usize) -> Result<(), Error> {
        let id = self.sequence_node(draft, "length assignment")?;
        self.resize(id, len);
        Ok(())
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn sequence_node(&self, draft: Draft, op: &'static str) -> Result<NodeId, Error> {
        let id = self.resolve(draft)?;
        self.expect_kind(id, Kind::Sequence, op)?;
        Ok(id)
    }

    pub(crate) fn sequence_len(&self, id: NodeId) -> usize {
        let node = self.node(id);
        match &node.shadow {
            Some(Shadow::Sequence(items)) => items.len(),
            _ => node.original.as_sequence().map_or(0, <[Value]>::len),
        }
    }

    pub(crate) fn sequence_slot(&self, id: NodeId, index: usize) -> Option<Slot> {
        let node = self.node(id);
        match &node.shadow {
            Some(Shadow::Sequence(items)) => items.get(index).cloned(),
            _ => node.original.at(index).cloned().map(|v| node.raw_slot(v)),
        }
    }

    pub(crate) fn sequence_get(&mut self, id: NodeId, index: usize) -> Option<Item> {
        let slot = self.sequence_slot(id, index)?;
        let item = self.slot_item(id, slot, Edge::Index(index));
        if let (Item::Draft(child), Some(Shadow::Sequence(items))) = (&item, &mut self.node_mut(id).shadow) {
            items[index] = Slot::Draft(child.node);
        }
        Some(item)
    }

    pub(crate) fn sequence_set(&mut self, id: NodeId, index: usize, slot: Slot) -> Result<(), Error> {
        let len = self.sequence_len(id);
        if index > len {
            return Err(Error::IndexOutOfRange { index, len });
        }
        if index == len {
            self.sequence_splice(id, len, 0, vec![slot]);
            return Ok(());
        }
        if let Some(current) = self.sequence_slot(id, index) {
            if self.same_slot(&current, &slot) {
                return Ok(());
            }
        }
        self.prepare_write(id);
        if let Some(Shadow::Sequence(items)) = &mut self.node_mut(id).shadow {
            items[index] = slot;
        }
        Ok(())
    }

    pub(crate) fn sequence_splice(&mut self, id: NodeId, start: usize, delete_count: usize, slots: Vec<Slot>) -> Vec<Item> {
        let len = self.sequence_len(id);
        let start = start.min(len);
        let delete_count = delete_count.min(len - start);
        if delete_count == 0 && slots.is_empty() {
            return Vec::new();
        }
        self.prepare_write(id);
        let inserted = slots.len();
        let node = self.node_mut(id);
        let removed: Vec<Slot> = match &mut node.shadow {
            Some(Shadow::Sequence(items)) => items.splice(start..start + delete_count, slots).collect(),
            _ => Vec::new(),
        };
        if delete_count > 0 {
            node.sequence_ops.push(SequenceOp::Remove {
                index: start,
                count: delete_count,
            });
        }
        if inserted > 0 {
            node.sequence_ops.push(SequenceOp::Insert {
                index: start,
                count: inserted,
            });
        }
        removed.into_iter().map(|slot| self.detached_item(slot)).collect()
    }

    pub(crate) fn resize(&mut self, id: NodeId, len: usize) {
        let current = self.sequence_len(id);
        if len < current {
            self.sequence_splice(id, len, current - len, Vec::new());
        } else if len > current {
            let padding = vec![Slot::Value(Value::Null); len - current];
            self.sequence_splice(id, current, 0, padding);
        }
    }
}
