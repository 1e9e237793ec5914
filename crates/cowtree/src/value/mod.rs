//! Value model: primitives plus reference-counted containers.
//!
//! Containers are shared by `Rc`, so cloning a [`Value`] is cheap and two
//! values can point at the very same container. That address is the
//! *identity* the draft engine works with: unchanged subtrees of a produced
//! value are the same `Rc` as in the base, and map keys / set members
//! compare containers by identity (see [`Key`]).

use std::cell::Cell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use serde_json::Number;

use crate::error::Error;

pub mod json;

pub type RecordEntries = IndexMap<String, Value>;
pub type MapEntries = IndexMap<Key, Value>;
pub type SetMembers = IndexSet<Key>;

// ── Kind ──────────────────────────────────────────────────────────────────

/// The four container kinds a draft can wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Record,
    Sequence,
    Map,
    Set,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Record => "record",
            Kind::Sequence => "sequence",
            Kind::Map => "map",
            Kind::Set => "set",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Container ─────────────────────────────────────────────────────────────

/// Storage behind every container variant of [`Value`].
///
/// Holds the items plus a `frozen` flag. A frozen container refuses the
/// owned editors ([`Value::as_record_mut`] and friends); the only way to
/// derive a changed version of it is through a draft.
#[derive(Clone, Default)]
pub struct Container<T> {
    items: T,
    frozen: Cell<bool>,
}

impl<T> Container<T> {
    pub fn new(items: T) -> Self {
        Self {
            items,
            frozen: Cell::new(false),
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.get()
    }

    pub fn items(&self) -> &T {
        &self.items
    }

    pub fn into_items(self) -> T {
        self.items
    }
}

impl<T> Deref for Container<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.items
    }
}

impl<T: PartialEq> PartialEq for Container<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T: fmt::Debug> fmt::Debug for Container<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.items.fmt(f)
    }
}

// ── Value ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(Rc<str>),
    Record(Rc<Container<RecordEntries>>),
    Sequence(Rc<Container<Vec<Value>>>),
    Map(Rc<Container<MapEntries>>),
    Set(Rc<Container<SetMembers>>),
}

impl Value {
    /// Builds a record from `(key, value)` pairs, keeping their order.
    pub fn record<K, V, I>(entries: I) -> Value
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::from_record(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn sequence<V, I>(items: I) -> Value
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Value::from_sequence(items.into_iter().map(Into::into).collect())
    }

    pub fn map<K, V, I>(entries: I) -> Value
    where
        K: Into<Value>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::from_map(
            entries
                .into_iter()
                .map(|(k, v)| (Key::new(k.into()), v.into()))
                .collect(),
        )
    }

    pub fn set<V, I>(members: I) -> Value
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Value::from_set(members.into_iter().map(|v| Key::new(v.into())).collect())
    }

    pub fn from_record(entries: RecordEntries) -> Value {
        Value::Record(Rc::new(Container::new(entries)))
    }

    pub fn from_sequence(items: Vec<Value>) -> Value {
        Value::Sequence(Rc::new(Container::new(items)))
    }

    pub fn from_map(entries: MapEntries) -> Value {
        Value::Map(Rc::new(Container::new(entries)))
    }

    pub fn from_set(members: SetMembers) -> Value {
        Value::Set(Rc::new(Container::new(members)))
    }

    /// Returns the container kind, or `None` for primitives.
    pub fn kind(&self) -> Option<Kind> {
        match self {
            Value::Record(_) => Some(Kind::Record),
            Value::Sequence(_) => Some(Kind::Sequence),
            Value::Map(_) => Some(Kind::Map),
            Value::Set(_) => Some(Kind::Set),
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        self.kind().is_some()
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Record(_) => "record",
            Value::Sequence(_) => "sequence",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
        }
    }

    /// Address of the shared container, `None` for primitives.
    pub fn addr(&self) -> Option<usize> {
        match self {
            Value::Record(rc) => Some(Rc::as_ptr(rc) as *const () as usize),
            Value::Sequence(rc) => Some(Rc::as_ptr(rc) as *const () as usize),
            Value::Map(rc) => Some(Rc::as_ptr(rc) as *const () as usize),
            Value::Set(rc) => Some(Rc::as_ptr(rc) as *const () as usize),
            _ => None,
        }
    }

    /// True when both values are the same container.
    ///
    /// Always false for primitives; use `==` for those.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self.addr(), other.addr()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Same container, or equal primitives.
    pub fn same(&self, other: &Value) -> bool {
        if self.is_container() || other.is_container() {
            self.ptr_eq(other)
        } else {
            self == other
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordEntries> {
        match self {
            Value::Record(rc) => Some(rc.items()),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(rc) => Some(rc.items()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapEntries> {
        match self {
            Value::Map(rc) => Some(rc.items()),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&SetMembers> {
        match self {
            Value::Set(rc) => Some(rc.items()),
            _ => None,
        }
    }

    /// Record field lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_record().and_then(|r| r.get(key))
    }

    /// Sequence element lookup.
    pub fn at(&self, index: usize) -> Option<&Value> {
        self.as_sequence().and_then(|s| s.get(index))
    }

    /// Number of entries in a container, `None` for primitives.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Record(rc) => Some(rc.len()),
            Value::Sequence(rc) => Some(rc.len()),
            Value::Map(rc) => Some(rc.len()),
            Value::Set(rc) => Some(rc.len()),
            _ => None,
        }
    }

    // ── Owned editors ─────────────────────────────────────────────────────

    pub fn as_record_mut(&mut self) -> Result<&mut RecordEntries, Error> {
        match self {
            Value::Record(rc) => Ok(&mut writable(rc, Kind::Record)?.items),
            other => Err(Error::TypeMismatch {
                expected: Kind::Record,
                found: other.type_name(),
            }),
        }
    }

    pub fn as_sequence_mut(&mut self) -> Result<&mut Vec<Value>, Error> {
        match self {
            Value::Sequence(rc) => Ok(&mut writable(rc, Kind::Sequence)?.items),
            other => Err(Error::TypeMismatch {
                expected: Kind::Sequence,
                found: other.type_name(),
            }),
        }
    }

    pub fn as_map_mut(&mut self) -> Result<&mut MapEntries, Error> {
        match self {
            Value::Map(rc) => Ok(&mut writable(rc, Kind::Map)?.items),
            other => Err(Error::TypeMismatch {
                expected: Kind::Map,
                found: other.type_name(),
            }),
        }
    }

    pub fn as_set_mut(&mut self) -> Result<&mut SetMembers, Error> {
        match self {
            Value::Set(rc) => Ok(&mut writable(rc, Kind::Set)?.items),
            other => Err(Error::TypeMismatch {
                expected: Kind::Set,
                found: other.type_name(),
            }),
        }
    }

    // ── Freezing ──────────────────────────────────────────────────────────

    /// Deep-freezes this value. Already frozen containers are not revisited.
    pub fn freeze(&self) {
        let mut stack = vec![self.clone()];
        while let Some(value) = stack.pop() {
            match &value {
                Value::Record(rc) => {
                    if !rc.frozen.replace(true) {
                        stack.extend(rc.values().cloned());
                    }
                }
                Value::Sequence(rc) => {
                    if !rc.frozen.replace(true) {
                        stack.extend(rc.iter().cloned());
                    }
                }
                Value::Map(rc) => {
                    if !rc.frozen.replace(true) {
                        for (k, v) in rc.iter() {
                            stack.push(k.value().clone());
                            stack.push(v.clone());
                        }
                    }
                }
                Value::Set(rc) => {
                    if !rc.frozen.replace(true) {
                        stack.extend(rc.iter().map(|k| k.value().clone()));
                    }
                }
                _ => {}
            }
        }
    }

    /// Whether this container is frozen. Primitives are always frozen.
    pub fn is_frozen(&self) -> bool {
        match self {
            Value::Record(rc) => rc.is_frozen(),
            Value::Sequence(rc) => rc.is_frozen(),
            Value::Map(rc) => rc.is_frozen(),
            Value::Set(rc) => rc.is_frozen(),
            _ => true,
        }
    }
}

fn writable<T: Clone>(rc: &mut Rc<Container<T>>, kind: Kind) -> Result<&mut Container<T>, Error> {
    if rc.is_frozen() {
        return Err(Error::Frozen { kind });
    }
    Ok(Rc::make_mut(rc))
}

fn number_eq(a: &Number, b: &Number) -> bool {
    if a == b {
        return true;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => number_eq(a, b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => Rc::ptr_eq(a, b) || a.items == b.items,
            (Value::Sequence(a), Value::Sequence(b)) => Rc::ptr_eq(a, b) || a.items == b.items,
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b) || a.items == b.items,
            (Value::Set(a), Value::Set(b)) => Rc::ptr_eq(a, b) || a.items == b.items,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Record(rc) => f.debug_map().entries(rc.iter()).finish(),
            Value::Sequence(rc) => f.debug_list().entries(rc.iter()).finish(),
            Value::Map(rc) => {
                f.write_str("Map ")?;
                f.debug_map().entries(rc.iter()).finish()
            }
            Value::Set(rc) => {
                f.write_str("Set ")?;
                f.debug_set().entries(rc.iter()).finish()
            }
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

// ── Key ───────────────────────────────────────────────────────────────────

/// A value used as a map key or set member.
///
/// Primitives compare by value, containers by identity: two records with
/// the same contents are different keys unless they are the same `Rc`.
#[derive(Clone)]
pub struct Key(Value);

impl Key {
    pub fn new(value: Value) -> Self {
        Key(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Key) -> bool {
        self.0.same(&other.0)
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.0 {
            Value::Null => 0u8.hash(state),
            Value::Bool(b) => {
                1u8.hash(state);
                b.hash(state);
            }
            Value::Number(n) => {
                2u8.hash(state);
                // -0.0 == 0.0, so both must land on the same bits.
                let f = n.as_f64().unwrap_or(0.0);
                let bits = if f == 0.0 { 0 } else { f.to_bits() };
                bits.hash(state);
            }
            Value::String(s) => {
                3u8.hash(state);
                s.hash(state);
            }
            container => {
                4u8.hash(state);
                container.addr().hash(state);
            }
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Value> for Key {
    fn from(value: Value) -> Self {
        Key(value)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key(Value::from(s))
    }
}

// ── Conversions ───────────────────────────────────────────────────────────

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(Number::from(n))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl From<f64> for Value {
    /// Non-finite floats have no number representation and become `Null`.
    fn from(f: f64) -> Self {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<Rc<str>> for Value {
    fn from(s: Rc<str>) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::from_sequence(items)
    }
}
