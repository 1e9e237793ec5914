mod common;

use common::{check_round_trip, item, items, producer};
use cowtree::{Patch, PatchPath, PathSegment, Value};

fn at(segments: &[PathSegment]) -> PatchPath {
    PatchPath::Segments(segments.to_vec())
}

fn key(k: &str) -> PathSegment {
    PathSegment::from(k)
}

fn idx(i: usize) -> PathSegment {
    PathSegment::Index(i)
}

fn numbers(values: &[i64]) -> Value {
    Value::sequence(values.iter().copied())
}

fn both(check: impl Fn(bool)) {
    check(false);
    check(true);
}

#[test]
fn shift_numbers() {
    both(|length| {
        let base = Value::record([("items", numbers(&[1, 2, 3, 4, 5]))]);
        let (state, patches, inverse) = check_round_trip(&producer(length), &base, |d, root| {
            let list = d.child(root, "items")?;
            d.shift(list)?;
            d.shift(list)?;
            Ok(())
        });
        assert_eq!(state, Value::record([("items", numbers(&[3, 4, 5]))]));
        assert_eq!(
            patches,
            vec![
                Patch::remove(at(&[key("items"), idx(0)])),
                Patch::remove(at(&[key("items"), idx(0)])),
            ]
        );
        assert_eq!(
            inverse,
            vec![
                Patch::add(at(&[key("items"), idx(0)]), 1),
                Patch::add(at(&[key("items"), idx(1)]), 2),
            ]
        );
    });
}

#[test]
fn pop_without_length_assignment() {
    let base = Value::record([("items", numbers(&[1, 2, 3, 4, 5]))]);
    let (state, patches, inverse) = check_round_trip(&producer(false), &base, |d, root| {
        let list = d.child(root, "items")?;
        d.pop(list)?;
        d.pop(list)?;
        Ok(())
    });
    assert_eq!(state, Value::record([("items", numbers(&[1, 2, 3]))]));
    assert_eq!(
        patches,
        vec![
            Patch::remove(at(&[key("items"), idx(3)])),
            Patch::remove(at(&[key("items"), idx(3)])),
        ]
    );
    assert_eq!(inverse.len(), 2);
}

#[test]
fn pop_with_length_assignment() {
    let base = Value::record([("items", numbers(&[1, 2, 3, 4, 5]))]);
    let (_, patches, inverse) = check_round_trip(&producer(true), &base, |d, root| {
        let list = d.child(root, "items")?;
        d.pop(list)?;
        d.pop(list)?;
        Ok(())
    });
    assert_eq!(patches, vec![Patch::replace(at(&[key("items"), key("length")]), 3)]);
    assert_eq!(
        inverse,
        vec![
            Patch::add(at(&[key("items"), idx(3)]), 4),
            Patch::add(at(&[key("items"), idx(4)]), 5),
        ]
    );
}

#[test]
fn push_appends() {
    both(|length| {
        let base = Value::record([("items", numbers(&[1, 2]))]);
        let (state, patches, _) = check_round_trip(&producer(length), &base, |d, root| {
            let list = d.child(root, "items")?;
            d.push(list, 3)?;
            d.push(list, 4)
        });
        assert_eq!(state.get("items"), Some(&numbers(&[1, 2, 3, 4])));
        assert_eq!(
            patches,
            vec![
                Patch::add(at(&[key("items"), idx(2)]), 3),
                Patch::add(at(&[key("items"), idx(3)]), 4),
            ]
        );
    });
}

#[test]
fn splice_numbers() {
    both(|length| {
        let base = Value::record([("items", numbers(&[1, 2, 3, 4, 5]))]);
        let (state, _, _) = check_round_trip(&producer(length), &base, |d, root| {
            let list = d.child(root, "items")?;
            d.splice(list, 0, 1, [10, 11])?;
            d.splice(list, 4, 1, [12, 13])?;
            d.splice(list, 2, 1, [14, 15])?;
            Ok(())
        });
        assert_eq!(state.get("items"), Some(&numbers(&[10, 11, 14, 15, 3, 12, 13, 5])));
    });
}

#[test]
fn shift_objects() {
    both(|length| {
        let base = Value::record([("items", items(&[1, 2, 3, 4, 5]))]);
        let (state, patches, _) = check_round_trip(&producer(length), &base, |d, root| {
            let list = d.child(root, "items")?;
            d.shift(list)?;
            d.shift(list)?;
            Ok(())
        });
        assert_eq!(state.get("items"), Some(&items(&[3, 4, 5])));
        assert_eq!(patches.len(), 2);
        let kept = state.get("items").unwrap().at(0).unwrap();
        assert!(kept.ptr_eq(base.get("items").unwrap().at(2).unwrap()));
    });
}

#[test]
fn pop_objects() {
    both(|length| {
        let base = Value::record([("items", items(&[1, 2, 3, 4, 5]))]);
        let (state, _, _) = check_round_trip(&producer(length), &base, |d, root| {
            let list = d.child(root, "items")?;
            d.pop(list)?;
            d.pop(list)?;
            Ok(())
        });
        assert_eq!(state.get("items"), Some(&items(&[1, 2, 3])));
    });
}

#[test]
fn splice_objects() {
    both(|length| {
        let base = Value::record([("items", items(&[1, 2, 3, 4, 5]))]);
        let (state, patches, _) = check_round_trip(&producer(length), &base, |d, root| {
            let list = d.child(root, "items")?;
            d.splice(list, 0, 1, [item(10), item(11)])?;
            d.splice(list, 4, 1, [item(12), item(13)])?;
            d.splice(list, 2, 1, [item(14), item(15)])?;
            Ok(())
        });
        assert_eq!(state.get("items"), Some(&items(&[10, 11, 14, 15, 3, 12, 13, 5])));
        // Three splices stay a handful of patches, not one per element.
        assert!(patches.len() <= 7, "{patches:?}");
    });
}

#[test]
fn splice_and_property_edit() {
    both(|length| {
        let base = Value::record([("items", items(&[1, 2, 3]))]);
        let (state, _, _) = check_round_trip(&producer(length), &base, |d, root| {
            let list = d.child(root, "items")?;
            for i in 0..d.len(list)? {
                let entry = d.child(list, i)?;
                d.set(entry, "added", true)?;
            }
            d.splice(list, 1, 1, [item(10)])?;
            for i in 0..d.len(list)? {
                let entry = d.child(list, i)?;
                d.set(entry, "added2", true)?;
            }
            Ok(())
        });
        assert_eq!(
            state.get("items"),
            Some(&Value::sequence([
                Value::record([("value", Value::from(1)), ("added", true.into()), ("added2", true.into())]),
                Value::record([("value", Value::from(10)), ("added2", true.into())]),
                Value::record([("value", Value::from(3)), ("added", true.into()), ("added2", true.into())]),
            ]))
        );
    });
}

#[test]
fn complex_edit_mix() {
    both(|length| {
        let base = Value::record([("items", items(&[1, 2, 3, 4, 5]))]);
        let (state, _, _) = check_round_trip(&producer(length), &base, |d, root| {
            let list = d.child(root, "items")?;
            let first = d.child(list, 0usize)?;
            d.set(first, "added0", 21)?;
            let fifth = d.child(list, 4usize)?;
            d.set(fifth, "added1", 22)?;
            d.splice(list, 3, 1, [item(10), item(11)])?;
            d.push(list, item(100))?;
            let moved = d.child(list, 5usize)?;
            d.set(moved, "added2", 23)
        });
        assert_eq!(
            state.get("items"),
            Some(&Value::sequence([
                Value::record([("value", 1), ("added0", 21)]),
                item(2),
                item(3),
                item(10),
                item(11),
                Value::record([("value", 5), ("added1", 22), ("added2", 23)]),
                item(100),
            ]))
        );
        let untouched = state.get("items").unwrap().at(1).unwrap();
        assert!(untouched.ptr_eq(base.get("items").unwrap().at(1).unwrap()));
    });
}

#[test]
fn shared_object_reads_the_same_everywhere() {
    both(|length| {
        let shared = item(100);
        let base = Value::record([
            ("items1", Value::sequence([item(11), item(12), shared.clone()])),
            ("items2", Value::sequence([shared.clone(), item(21)])),
        ]);
        let (state, _, _) = check_round_trip(&producer(length), &base, |d, root| {
            let first = d.child(root, "items1")?;
            d.splice(first, 0, 0, [item(13), item(14)])?;
            let second = d.child(root, "items2")?;
            d.splice(second, 0, 0, [item(22)])?;
            let target = d.child(first, 4usize)?;
            d.set(target, "added", true)
        });
        let edited = Value::record([("value", Value::from(100)), ("added", Value::from(true))]);
        assert_eq!(
            state,
            Value::record([
                ("items1", Value::sequence([item(13), item(14), item(11), item(12), edited.clone()])),
                ("items2", Value::sequence([item(22), edited, item(21)])),
            ])
        );
        let in_first = state.get("items1").unwrap().at(4).unwrap();
        let in_second = state.get("items2").unwrap().at(1).unwrap();
        assert!(in_first.ptr_eq(in_second));
        assert!(shared.get("added").is_none());
    });
}

#[test]
fn nested_sequences() {
    both(|length| {
        let base = Value::record([(
            "items",
            Value::sequence([items(&[11]), items(&[21, 22, 23]), items(&[31])]),
        )]);
        let (state, _, _) = check_round_trip(&producer(length), &base, |d, root| {
            let list = d.child(root, "items")?;
            let inner = d.child(list, 1usize)?;
            d.splice(inner, 1, 0, [item(24)])?;
            d.splice(list, 0, 1, [items(&[41, 42]), items(&[])])?;
            Ok(())
        });
        assert_eq!(
            state.get("items"),
            Some(&Value::sequence([
                items(&[41, 42]),
                items(&[]),
                items(&[21, 24, 22, 23]),
                items(&[31]),
            ]))
        );
        let last = state.get("items").unwrap().at(3).unwrap();
        assert!(last.ptr_eq(base.get("items").unwrap().at(2).unwrap()));
    });
}

#[test]
fn in_place_writes_patch_by_position() {
    let base = Value::record([("items", numbers(&[1, 2, 3]))]);
    let (_, patches, inverse) = check_round_trip(&producer(true), &base, |d, root| {
        let list = d.child(root, "items")?;
        d.set(list, 1usize, 20)
    });
    assert_eq!(patches, vec![Patch::replace(at(&[key("items"), idx(1)]), 20)]);
    assert_eq!(inverse, vec![Patch::replace(at(&[key("items"), idx(1)]), 2)]);
}

#[test]
fn large_sequence_edit_stays_small() {
    let values: Vec<i64> = (0..10_000).collect();
    let base = Value::record([("items", numbers(&values))]);
    let (_, patches, inverse) = check_round_trip(&producer(true), &base, |d, root| {
        let list = d.child(root, "items")?;
        d.remove(list, 5_000)?;
        d.insert(list, 10, -1)?;
        Ok(())
    });
    assert_eq!(patches.len(), 2);
    assert_eq!(inverse.len(), 2);
}
