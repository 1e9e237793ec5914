//! Set drafts.
//!
//! Members keep insertion order. Adding a member that is already present
//! never moves it, and a drafted member keeps its original's slot so later
//! edits to it land in place.

use super::{Draft, Drafts, Edge, Item, NodeId, Shadow, Slot};
use crate::error::Error;
use crate::value::{Key, Kind};

impl Drafts {
    pub fn set_has(&self, draft: Draft, member: impl Into<Item>) -> Result<bool, Error> {
        let id = self.set_node(draft, "has")?;
        let key = self.input_key(member.into())?;
        Ok(self.set_position(id, &key).is_some())
    }

    /// Adds a member at the end. Returns `false` if it was already there.
    pub fn set_add(&mut self, draft: Draft, member: impl Into<Item>) -> Result<bool, Error> {
        let id = self.set_node(draft, "add")?;
        let slot = self.input_slot(member.into())?;
        let key = self.slot_identity(&slot);
        if self.set_position(id, &key).is_some() {
            return Ok(false);
        }
        self.prepare_write(id);
        if let Some(Shadow::Set(members)) = &mut self.node_mut(id).shadow {
            members.insert(key, slot);
        }
        Ok(true)
    }

    /// Removes a member. Returns `false` if it was not there.
    pub fn set_remove(&mut self, draft: Draft, member: impl Into<Item>) -> Result<bool, Error> {
        let id = self.set_node(draft, "delete")?;
        let key = self.input_key(member.into())?;
        if self.set_position(id, &key).is_none() {
            return Ok(false);
        }
        self.prepare_write(id);
        if let Some(Shadow::Set(members)) = &mut self.node_mut(id).shadow {
            members.shift_remove(&key);
        }
        Ok(true)
    }

    pub fn set_clear(&mut self, draft: Draft) -> Result<(), Error> {
        let id = self.set_node(draft, "clear")?;
        if self.len(draft)? == 0 {
            return Ok(());
        }
        self.prepare_write(id);
        if let Some(Shadow::Set(members)) = &mut self.node_mut(id).shadow {
            members.clear();
        }
        Ok(())
    }

    /// Members in order. Container members come back as drafts.
    pub fn set_values(&mut self, draft: Draft) -> Result<Vec<Item>, Error> {
        let id = self.set_node(draft, "values")?;
        let members: Vec<(Key, Slot)> = match &self.node(id).shadow {
            Some(Shadow::Set(members)) => members.iter().map(|(k, s)| (k.clone(), s.clone())).collect(),
            _ => self
                .node(id)
                .original
                .as_set()
                .map(|m| {
                    let node = self.node(id);
                    m.iter().map(|k| (k.clone(), node.raw_slot(k.value().clone()))).collect()
                })
                .unwrap_or_default(),
        };
        let mut items = Vec::with_capacity(members.len());
        for (key, slot) in members {
            let known = self.node(id).member_drafts.get(&key).copied();
            let item = match (slot, known) {
                (Slot::Value(_), Some(child)) => Item::Draft(self.handle(child)),
                (slot, _) => self.slot_item(id, slot, Edge::Member(key.clone())),
            };
            if let Item::Draft(child) = &item {
                let node = self.node_mut(id);
                node.member_drafts.insert(key.clone(), child.node);
                if let Some(Shadow::Set(members)) = &mut node.shadow {
                    members.insert(key, Slot::Draft(child.node));
                }
            }
            items.push(item);
        }
        Ok(items)
    }

    // ── Positional access, for the patch applier ──────────────────────────

    /// Inserts `member` at `index` (clamped). Returns `false` and leaves
    /// the order alone if it is already present.
    pub(crate) fn set_insert_at(&mut self, draft: Draft, index: usize, member: Item) -> Result<bool, Error> {
        let id = self.set_node(draft, "add")?;
        let slot = self.input_slot(member)?;
        let key = self.slot_identity(&slot);
        if self.set_position(id, &key).is_some() {
            return Ok(false);
        }
        self.prepare_write(id);
        if let Some(Shadow::Set(members)) = &mut self.node_mut(id).shadow {
            let index = index.min(members.len());
            members.shift_insert(index, key, slot);
        }
        Ok(true)
    }

    pub(crate) fn set_remove_at(&mut self, draft: Draft, index: usize) -> Result<Item, Error> {
        let id = self.set_node(draft, "delete")?;
        let len = self.len(draft)?;
        if index >= len {
            return Err(Error::IndexOutOfRange { index, len });
        }
        self.prepare_write(id);
        let removed = match &mut self.node_mut(id).shadow {
            Some(Shadow::Set(members)) => members.shift_remove_index(index),
            _ => None,
        };
        match removed {
            Some((_, slot)) => Ok(self.detached_item(slot)),
            None => Err(Error::IndexOutOfRange { index, len }),
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn set_node(&self, draft: Draft, op: &'static str) -> Result<NodeId, Error> {
        let id = self.resolve(draft)?;
        self.expect_kind(id, Kind::Set, op)?;
        Ok(id)
    }

    fn set_position(&self, id: NodeId, key: &Key) -> Option<usize> {
        let node = self.node(id);
        match &node.shadow {
            Some(Shadow::Set(members)) => members.get_index_of(key),
            _ => node.original.as_set().and_then(|m| m.get_index_of(key)),
        }
    }
}
