mod common;

use common::producer;
use cowtree::{apply, Draft, Drafts, Error, Item, Value};
use proptest::prelude::*;

const RECORD_KEYS: [&str; 3] = ["a", "b", "c"];

#[derive(Debug, Clone)]
enum Edit {
    RecordSet(usize, i64),
    RecordDelete(usize),
    MapInsert(usize, i64),
    MapRemove(usize),
    MapEdit(usize, i64),
    SetAdd(i64),
    SetRemove(i64),
    TouchShared { via_map: bool, n: i64 },
}

impl Edit {
    fn reaches_record(&self) -> bool {
        matches!(
            self,
            Edit::RecordSet(..) | Edit::RecordDelete(_) | Edit::TouchShared { via_map: false, .. }
        )
    }
}

/// String and integer keys, mixed in one map.
fn map_key(i: usize) -> Value {
    match i {
        0 => Value::from("a"),
        1 => Value::from("b"),
        2 => Value::from("c"),
        n => Value::from((n - 3) as i64),
    }
}

fn edit() -> impl Strategy<Value = Edit> {
    let small = || any::<i8>().prop_map(i64::from);
    prop_oneof![
        (0..3usize, small()).prop_map(|(k, v)| Edit::RecordSet(k, v)),
        (0..3usize).prop_map(Edit::RecordDelete),
        (0..7usize, small()).prop_map(|(k, v)| Edit::MapInsert(k, v)),
        (0..7usize).prop_map(Edit::MapRemove),
        (0..7usize, small()).prop_map(|(k, v)| Edit::MapEdit(k, v)),
        (0..6i64).prop_map(Edit::SetAdd),
        (0..6i64).prop_map(Edit::SetRemove),
        (any::<bool>(), small()).prop_map(|(via_map, n)| Edit::TouchShared { via_map, n }),
    ]
}

/// `r` and `m` both hold `shared`.
fn base() -> Value {
    let shared = Value::record([("n", 100)]);
    Value::record([
        (
            "r",
            Value::record([
                ("a", Value::from(0)),
                ("b", shared.clone()),
                ("c", Value::record([("n", 1)])),
            ]),
        ),
        (
            "m",
            Value::map([
                (map_key(0), Value::from(0)),
                (map_key(1), Value::record([("n", 2)])),
                (map_key(3), Value::from(1)),
                (map_key(4), shared),
                (map_key(5), Value::record([("n", 3)])),
            ]),
        ),
        ("s", Value::set([1, 2, 3])),
    ])
}

fn set_n(d: &mut Drafts, item: Option<Item>, n: i64) -> Result<(), Error> {
    match item {
        Some(Item::Draft(entry)) => d.set(entry, "n", n),
        _ => Ok(()),
    }
}

fn run(d: &mut Drafts, root: Draft, edits: &[Edit]) -> Result<(), Error> {
    for edit in edits {
        match edit {
            Edit::RecordSet(k, v) => {
                let r = d.child(root, "r")?;
                d.set(r, RECORD_KEYS[*k], *v)?;
            }
            Edit::RecordDelete(k) => {
                let r = d.child(root, "r")?;
                d.delete(r, RECORD_KEYS[*k])?;
            }
            Edit::MapInsert(k, v) => {
                let m = d.child(root, "m")?;
                d.map_insert(m, map_key(*k), Value::record([("n", *v)]))?;
            }
            Edit::MapRemove(k) => {
                let m = d.child(root, "m")?;
                d.map_remove(m, map_key(*k))?;
            }
            Edit::MapEdit(k, v) => {
                let m = d.child(root, "m")?;
                let entry = d.map_get(m, map_key(*k))?;
                set_n(d, entry, *v)?;
            }
            Edit::SetAdd(v) => {
                let s = d.child(root, "s")?;
                d.set_add(s, *v)?;
            }
            Edit::SetRemove(v) => {
                let s = d.child(root, "s")?;
                d.set_remove(s, *v)?;
            }
            Edit::TouchShared { via_map: true, n } => {
                let m = d.child(root, "m")?;
                let entry = d.map_get(m, map_key(4))?;
                set_n(d, entry, *n)?;
            }
            Edit::TouchShared { via_map: false, n } => {
                let r = d.child(root, "r")?;
                let entry = d.get(r, "b")?;
                set_n(d, entry, *n)?;
            }
        }
    }
    Ok(())
}

/// Set order as plain insertion: re-adding keeps the slot, new members go last.
fn expected_set(edits: &[Edit]) -> Vec<i64> {
    let mut members = vec![1, 2, 3];
    for edit in edits {
        match edit {
            Edit::SetAdd(v) if !members.contains(v) => members.push(*v),
            Edit::SetRemove(v) => members.retain(|m| m != v),
            _ => {}
        }
    }
    members
}

proptest! {
    #[test]
    fn keyed_patches_replay_in_both_directions(
        edits in prop::collection::vec(edit(), 0..12),
        length_assignment in any::<bool>(),
    ) {
        let base = base();
        let (state, patches, inverse) = producer(length_assignment)
            .produce_with_patches(&base, |d, root| run(d, root, &edits))
            .unwrap();

        prop_assert_eq!(apply(&base, &patches).unwrap(), state.clone());
        prop_assert_eq!(apply(&state, &inverse).unwrap(), base.clone());
        if patches.is_empty() {
            prop_assert!(inverse.is_empty());
        }
        if !edits.iter().any(Edit::reaches_record) {
            prop_assert!(state.get("r").unwrap().ptr_eq(base.get("r").unwrap()));
        }
    }

    #[test]
    fn set_members_keep_insertion_order(
        edits in prop::collection::vec(edit(), 0..16),
    ) {
        let base = base();
        let (state, patches, _) = producer(true)
            .produce_with_patches(&base, |d, root| run(d, root, &edits))
            .unwrap();

        let order: Vec<Value> = state
            .get("s")
            .unwrap()
            .as_set()
            .unwrap()
            .iter()
            .map(|k| k.value().clone())
            .collect();
        let expected: Vec<Value> = expected_set(&edits).into_iter().map(Value::from).collect();
        prop_assert_eq!(&order, &expected);

        let replayed = apply(&base, &patches).unwrap();
        let replayed: Vec<Value> = replayed
            .get("s")
            .unwrap()
            .as_set()
            .unwrap()
            .iter()
            .map(|k| k.value().clone())
            .collect();
        prop_assert_eq!(replayed, expected);
    }
}
