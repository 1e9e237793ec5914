//! Map drafts: keyed by arbitrary values, containers compared by identity.
//! A draft handle used as a key stands for the container it wraps.

use super::{Assigned, Draft, Drafts, Edge, Item, NodeId, Shadow, Slot};
use crate::error::Error;
use crate::value::{Key, Kind, Value};

impl Drafts {
    pub fn map_get(&mut self, draft: Draft, key: impl Into<Item>) -> Result<Option<Item>, Error> {
        let id = self.map_node(draft, "get")?;
        let key = self.input_key(key.into())?;
        let Some(slot) = self.map_slot(id, &key) else {
            return Ok(None);
        };
        let item = self.slot_item(id, slot, Edge::MapKey(key.clone()));
        if let (Item::Draft(child), Some(Shadow::Map(entries))) = (&item, &mut self.node_mut(id).shadow) {
            entries.insert(key, Slot::Draft(child.node));
        }
        Ok(Some(item))
    }

    /// Inserts or overwrites an entry. New keys go to the end.
    pub fn map_insert(&mut self, draft: Draft, key: impl Into<Item>, item: impl Into<Item>) -> Result<(), Error> {
        let id = self.map_node(draft, "insert")?;
        let key = self.input_key(key.into())?;
        let slot = self.input_slot(item.into())?;
        if let Some(current) = self.map_slot(id, &key) {
            if self.same_slot(&current, &slot) {
                return Ok(());
            }
        }
        self.prepare_write(id);
        let node = self.node_mut(id);
        let in_original = node.original.as_map().is_some_and(|m| m.contains_key(&key));
        let state = if in_original { Assigned::Replaced } else { Assigned::Added };
        node.assigned.insert(key.clone(), state);
        if let Some(Shadow::Map(entries)) = &mut node.shadow {
            entries.insert(key, slot);
        }
        Ok(())
    }

    /// Removes an entry, returning whether it existed.
    pub fn map_remove(&mut self, draft: Draft, key: impl Into<Item>) -> Result<bool, Error> {
        let id = self.map_node(draft, "remove")?;
        let key = self.input_key(key.into())?;
        Ok(self.map_remove_key(id, key))
    }

    pub fn map_has(&self, draft: Draft, key: impl Into<Item>) -> Result<bool, Error> {
        let id = self.map_node(draft, "has")?;
        let key = self.input_key(key.into())?;
        Ok(self.map_slot(id, &key).is_some())
    }

    pub fn map_keys(&self, draft: Draft) -> Result<Vec<Value>, Error> {
        let id = self.map_node(draft, "keys")?;
        Ok(self.map_key_list(id).into_iter().map(Key::into_value).collect())
    }

    /// Entries in order, drafting container values.
    pub fn map_entries(&mut self, draft: Draft) -> Result<Vec<(Value, Item)>, Error> {
        let id = self.map_node(draft, "entries")?;
        let mut entries = Vec::new();
        for key in self.map_key_list(id) {
            if let Some(item) = self.map_get(draft, key.value().clone())? {
                entries.push((key.into_value(), item));
            }
        }
        Ok(entries)
    }

    pub fn map_clear(&mut self, draft: Draft) -> Result<(), Error> {
        let id = self.map_node(draft, "clear")?;
        for key in self.map_key_list(id) {
            self.map_remove_key(id, key);
        }
        Ok(())
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn map_node(&self, draft: Draft, op: &'static str) -> Result<NodeId, Error> {
        let id = self.resolve(draft)?;
        self.expect_kind(id, Kind::Map, op)?;
        Ok(id)
    }

    pub(crate) fn map_slot(&self, id: NodeId, key: &Key) -> Option<Slot> {
        let node = self.node(id);
        match &node.shadow {
            Some(Shadow::Map(entries)) => entries.get(key).cloned(),
            _ => node
                .original
                .as_map()
                .and_then(|m| m.get(key))
                .cloned()
                .map(|v| node.raw_slot(v)),
        }
    }

    fn map_key_list(&self, id: NodeId) -> Vec<Key> {
        let node = self.node(id);
        match &node.shadow {
            Some(Shadow::Map(entries)) => entries.keys().cloned().collect(),
            _ => node
                .original
                .as_map()
                .map(|m| m.keys().cloned().collect())
                .unwrap_or_default(),
        }
    }

    fn map_remove_key(&mut self, id: NodeId, key: Key) -> bool {
        if self.map_slot(id, &key).is_none() {
            return false;
        }
        self.prepare_write(id);
        let node = self.node_mut(id);
        if let Some(Shadow::Map(entries)) = &mut node.shadow {
            entries.shift_remove(&key);
        }
        if node.original.as_map().is_some_and(|m| m.contains_key(&key)) {
            node.assigned.insert(key, Assigned::Removed);
        } else {
            node.assigned.shift_remove(&key);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classifier;

    fn drafts_over(base: &Value) -> (Drafts, Draft) {
        let mut drafts = Drafts::new(Classifier::default());
        let root = drafts.open_root(base).unwrap();
        (drafts, root)
    }

    #[test]
    fn container_keys_compare_by_identity() {
        let owner = Value::record([("name", "a")]);
        let twin = Value::record([("name", "a")]);
        let base = Value::map([(owner.clone(), 1)]);
        let (mut drafts, root) = drafts_over(&base);
        assert!(drafts.map_has(root, owner.clone()).unwrap());
        assert!(!drafts.map_has(root, twin).unwrap());
        assert_eq!(
            drafts.map_get(root, owner).unwrap(),
            Some(Item::Value(Value::from(1)))
        );
    }

    #[test]
    fn insert_remove_and_clear() {
        let base = Value::map([("a", 1), ("b", 2)]);
        let (mut drafts, root) = drafts_over(&base);
        drafts.map_insert(root, "a", 1).unwrap();
        assert!(!drafts.is_changed(root).unwrap());

        drafts.map_insert(root, "c", 3).unwrap();
        assert!(drafts.map_remove(root, "a").unwrap());
        assert!(!drafts.map_remove(root, "a").unwrap());
        assert_eq!(
            drafts.map_keys(root).unwrap(),
            vec![Value::from("b"), Value::from("c")]
        );

        drafts.map_clear(root).unwrap();
        assert_eq!(drafts.len(root).unwrap(), 0);
        assert_eq!(drafts.node(root.node).assigned.len(), 2);
    }

    #[test]
    fn entries_draft_container_values() {
        let base = Value::map([(1, Value::record([("x", 1)])), (2, Value::from("plain"))]);
        let (mut drafts, root) = drafts_over(&base);
        let entries = drafts.map_entries(root).unwrap();
        assert_eq!(entries.len(), 2);
        let nested = entries[0].1.as_draft().unwrap();
        drafts.set(nested, "x", 2).unwrap();
        assert!(drafts.is_changed(root).unwrap());
        assert_eq!(entries[1].1, Item::Value(Value::from("plain")));
    }

    #[test]
    fn map_ops_on_a_sequence_are_refused() {
        let base = Value::sequence([1]);
        let (mut drafts, root) = drafts_over(&base);
        assert_eq!(
            drafts.map_insert(root, "k", 1).unwrap_err(),
            Error::InvalidOperation {
                kind: Kind::Sequence,
                op: "insert"
            }
        );
    }
}
