//! Core value types shared by producers and consumers.

use serde::{Serialize, Serializer};
use std::any::{type_name, Any};
use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use std::sync::Arc;

/// Handle to a per-sample object that has no numeric representation
/// (a rotation object from a math library, a decoded message, ...).
///
/// Cloning shares the underlying object; equality is identity.
#[derive(Clone)]
pub struct Opaque {
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl Opaque {
    /// Wrap a value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: type_name::<T>(),
            inner: Arc::new(value),
        }
    }

    /// Borrow the wrapped value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.inner).downcast_ref::<T>()
    }

    /// Name of the wrapped Rust type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// True if both handles point at the same object.
    pub fn ptr_eq(a: &Opaque, b: &Opaque) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        Opaque::ptr_eq(self, other)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opaque({})", self.type_name)
    }
}

impl Serialize for Opaque {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!("<opaque {}>", self.type_name))
    }
}

/// Storage kind of a field, fixed by its first occurrence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    Vector(usize),
    Opaque,
    Record,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Scalar => write!(f, "scalar"),
            FieldKind::Vector(dim) => write!(f, "vector[{}]", dim),
            FieldKind::Opaque => write!(f, "opaque"),
            FieldKind::Record => write!(f, "record"),
        }
    }
}

/// A single per-sample field value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// A single number.
    Scalar(f64),

    /// A fixed-size numeric vector (position, quaternion components, ...).
    Vector(Vec<f64>),

    /// A non-numeric object carried through as-is.
    Opaque(Opaque),

    /// A nested group of named fields.
    Record(Fields),
}

impl Value {
    /// Wrap an arbitrary object as an opaque value.
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Value::Opaque(Opaque::new(value))
    }

    /// The storage kind this value requires.
    pub fn kind(&self) -> FieldKind {
        match self {
            Value::Scalar(_) => FieldKind::Scalar,
            Value::Vector(v) => FieldKind::Vector(v.len()),
            Value::Opaque(_) => FieldKind::Opaque,
            Value::Record(_) => FieldKind::Record,
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[f64]> {
        match self {
            Value::Vector(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&Opaque> {
        match self {
            Value::Opaque(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Fields> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Scalar(x)
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Scalar(x.into())
    }
}

impl From<i32> for Value {
    fn from(x: i32) -> Self {
        Value::Scalar(x.into())
    }
}

impl From<u32> for Value {
    fn from(x: u32) -> Self {
        Value::Scalar(x.into())
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Vector(v)
    }
}

impl From<&[f64]> for Value {
    fn from(v: &[f64]) -> Self {
        Value::Vector(v.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for Value {
    fn from(v: [f64; N]) -> Self {
        Value::Vector(v.to_vec())
    }
}

impl From<Opaque> for Value {
    fn from(o: Opaque) -> Self {
        Value::Opaque(o)
    }
}

impl From<Fields> for Value {
    fn from(f: Fields) -> Self {
        Value::Record(f)
    }
}

/// Named field values, possibly nested.
///
/// Used both as the payload of a [`Point`] and as the reconstructed row in a
/// [`Sample`]. Names are kept in sorted order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Fields(BTreeMap<String, Value>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert a field, returning the previous value under that name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    /// Look up a direct child.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Look up a nested value by a `/`-separated path such as `"ctrl/thrust"`.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('/').filter(|p| !p.is_empty());
        let mut current = self.0.get(parts.next()?)?;
        for part in parts {
            current = current.as_record()?.get(part)?;
        }
        Some(current)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }
}

impl IntoIterator for Fields {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Fields(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Input for recording one sample (before it is split into columns).
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    /// Primary timestamp.
    pub time: f64,

    /// Optional secondary timestamp (e.g. hardware clock vs. host clock).
    pub meta_time: Option<f64>,

    /// Field values for this sample.
    pub fields: Fields,
}

impl Point {
    /// Create a point at `time` with no fields.
    pub fn at(time: f64) -> Self {
        Self {
            time,
            meta_time: None,
            fields: Fields::new(),
        }
    }

    /// Attach a secondary timestamp.
    pub fn with_meta_time(mut self, meta_time: f64) -> Self {
        self.meta_time = Some(meta_time);
        self
    }

    /// Add a field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name, value);
        self
    }

    /// Replace all fields.
    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.fields = fields;
        self
    }
}

/// One reconstructed row of a finalized series.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Sample {
    /// Timestamp of this row.
    pub t: f64,

    /// Secondary timestamp, if the series records them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_t: Option<f64>,

    /// Field values at this row, mirroring the series schema.
    pub fields: Fields,
}

impl Sample {
    /// Look up a field value by `/`-separated path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.fields.lookup(path)
    }

    /// Look up a scalar field by path.
    pub fn scalar(&self, path: &str) -> Option<f64> {
        self.get(path)?.as_scalar()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Rotation {
        w: f64,
    }

    #[test]
    fn test_opaque_identity() {
        let a = Opaque::new(Rotation { w: 1.0 });
        let b = a.clone();
        let c = Opaque::new(Rotation { w: 1.0 });

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.downcast_ref::<Rotation>().unwrap().w, 1.0);
        assert!(a.downcast_ref::<f64>().is_none());
        assert!(a.type_name().ends_with("Rotation"));
    }

    #[test]
    fn test_value_kinds() {
        assert_eq!(Value::from(1.5).kind(), FieldKind::Scalar);
        assert_eq!(Value::from([1.0, 2.0, 3.0]).kind(), FieldKind::Vector(3));
        assert_eq!(Value::opaque(Rotation { w: 0.0 }).kind(), FieldKind::Opaque);
        assert_eq!(Value::from(Fields::new()).kind(), FieldKind::Record);
        assert_eq!(FieldKind::Vector(4).to_string(), "vector[4]");
    }

    #[test]
    fn test_fields_lookup() {
        let fields = Fields::new()
            .with("x", 1.0)
            .with("ctrl", Fields::new().with("thrust", 9.81).with("rates", [0.1, 0.2, 0.3]));

        assert_eq!(fields.lookup("x").and_then(Value::as_scalar), Some(1.0));
        assert_eq!(fields.lookup("ctrl/thrust").and_then(Value::as_scalar), Some(9.81));
        assert_eq!(
            fields.lookup("ctrl/rates").and_then(Value::as_vector),
            Some(&[0.1, 0.2, 0.3][..])
        );
        assert!(fields.lookup("ctrl/missing").is_none());
        assert!(fields.lookup("x/deeper").is_none());
        assert!(fields.lookup("").is_none());
    }

    #[test]
    fn test_point_builder() {
        let point = Point::at(0.5).with_meta_time(12.0).with_field("x", 3);

        assert_eq!(point.time, 0.5);
        assert_eq!(point.meta_time, Some(12.0));
        assert_eq!(point.fields.get("x"), Some(&Value::Scalar(3.0)));
    }

    #[test]
    fn test_sample_serializes_as_nested_object() {
        let sample = Sample {
            t: 1.0,
            meta_t: None,
            fields: Fields::new().with("x", 2.0).with("pos", [1.0, 2.0]),
        };

        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json, serde_json::json!({"t": 1.0, "fields": {"pos": [1.0, 2.0], "x": 2.0}}));
    }
}
