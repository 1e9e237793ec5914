//! JSON codec for patches.
//!
//! `{"op": "replace", "path": ["a", 0], "value": ...}`, where `path` is an
//! array for segment paths and a string for pointer paths. Values go
//! through [`crate::value::json`], so container identity and the map/set
//! distinction do not survive a round trip.

use serde_json::{json, Map, Value as Json};

use cowtree_pointer::PathSegment;

use super::{Patch, PatchPath};
use crate::error::Error;
use crate::value::json::{from_json as value_from_json, to_json as value_to_json};

fn encode_path(path: &PatchPath) -> Json {
    match path {
        PatchPath::Segments(segments) => Json::Array(
            segments
                .iter()
                .map(|segment| match segment {
                    PathSegment::Index(i) => json!(i),
                    PathSegment::Key(k) => json!(k),
                })
                .collect(),
        ),
        PatchPath::Pointer(pointer) => Json::String(pointer.clone()),
    }
}

fn decode_path(v: &Json) -> Result<PatchPath, Error> {
    match v {
        Json::String(pointer) => Ok(PatchPath::Pointer(pointer.clone())),
        Json::Array(items) => items
            .iter()
            .map(|item| match item {
                Json::String(k) => Ok(PathSegment::Key(k.clone())),
                Json::Number(n) => n
                    .as_u64()
                    .map(|i| PathSegment::Index(i as usize))
                    .ok_or_else(|| Error::InvalidPatch(format!("invalid path index: {n}"))),
                other => Err(Error::InvalidPatch(format!("invalid path segment: {other}"))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(PatchPath::Segments),
        _ => Err(Error::InvalidPatch("path must be a string or an array".into())),
    }
}

/// Serialize a [`Patch`] to a JSON object.
pub fn to_json(patch: &Patch) -> Json {
    let mut m = Map::new();
    m.insert("op".into(), json!(patch.op_name()));
    m.insert("path".into(), encode_path(patch.path()));
    if let Some(value) = patch.value() {
        m.insert("value".into(), value_to_json(value));
    }
    Json::Object(m)
}

/// Deserialize a [`Patch`] from a JSON object.
pub fn from_json(v: &Json) -> Result<Patch, Error> {
    let obj = v
        .as_object()
        .ok_or_else(|| Error::InvalidPatch("patch must be an object".into()))?;
    let op = obj
        .get("op")
        .and_then(Json::as_str)
        .ok_or_else(|| Error::InvalidPatch("missing op".into()))?;
    let path = decode_path(
        obj.get("path")
            .ok_or_else(|| Error::InvalidPatch("missing path".into()))?,
    )?;
    let value = obj.get("value").map(value_from_json);
    let required = |value: Option<crate::value::Value>| {
        value.ok_or_else(|| Error::InvalidPatch(format!("'{op}' requires a value")))
    };
    match op {
        "add" => Ok(Patch::Add {
            path,
            value: required(value)?,
        }),
        "remove" => Ok(Patch::Remove { path, value }),
        "replace" => Ok(Patch::Replace {
            path,
            value: required(value)?,
        }),
        other => Err(Error::InvalidPatch(format!("unknown op: {other}"))),
    }
}

pub fn to_json_patch(patches: &[Patch]) -> Json {
    Json::Array(patches.iter().map(to_json).collect())
}

pub fn from_json_patch(v: &Json) -> Result<Vec<Patch>, Error> {
    v.as_array()
        .ok_or_else(|| Error::InvalidPatch("patch list must be an array".into()))?
        .iter()
        .map(from_json)
        .collect()
}
