#![allow(dead_code)]

use cowtree::{apply, Draft, Drafts, Error, Options, PatchOptions, Patch, Producer, Value};

/// `{ "value": v }`
pub fn item(v: impl Into<Value>) -> Value {
    Value::record([("value", v.into())])
}

pub fn items(values: &[i64]) -> Value {
    Value::sequence(values.iter().map(|&v| item(v)))
}

pub fn producer(length_assignment: bool) -> Producer {
    Producer::new(Options::new().with_patches(PatchOptions {
        length_assignment,
        ..PatchOptions::default()
    }))
}

/// Produces with patches and checks both directions replay.
pub fn check_round_trip<F>(producer: &Producer, base: &Value, mutate: F) -> (Value, Vec<Patch>, Vec<Patch>)
where
    F: FnOnce(&mut Drafts, Draft) -> Result<(), Error>,
{
    let (state, patches, inverse) = producer.produce_with_patches(base, mutate).unwrap();
    assert_eq!(apply(base, &patches).unwrap(), state, "forward patches: {patches:?}");
    assert_eq!(apply(&state, &inverse).unwrap(), *base, "inverse patches: {inverse:?}");
    (state, patches, inverse)
}
