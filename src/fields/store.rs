//! Growable per-field storage used while a series is recording.

use super::column::{Column, Field, Record};
use crate::error::{RecorderError, Result};
use crate::types::{FieldKind, Fields, Opaque, Value};
use std::collections::BTreeMap;

/// Storage for one field, shaped by the first value ever appended to it.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum FieldStore {
    Scalar(Vec<f64>),
    Vector {
        dim: usize,
        rows: usize,
        data: Vec<f64>,
    },
    Opaque(Vec<Opaque>),
    Record(RecordStore),
}

impl FieldStore {
    fn empty_for(value: &Value) -> Self {
        match value {
            Value::Scalar(_) => FieldStore::Scalar(Vec::new()),
            Value::Vector(v) => FieldStore::Vector {
                dim: v.len(),
                rows: 0,
                data: Vec::new(),
            },
            Value::Opaque(_) => FieldStore::Opaque(Vec::new()),
            Value::Record(_) => FieldStore::Record(RecordStore::default()),
        }
    }

    fn kind(&self) -> FieldKind {
        match self {
            FieldStore::Scalar(_) => FieldKind::Scalar,
            FieldStore::Vector { dim, .. } => FieldKind::Vector(*dim),
            FieldStore::Opaque(_) => FieldKind::Opaque,
            FieldStore::Record(_) => FieldKind::Record,
        }
    }

    fn check(&self, name: &str, value: &Value) -> Result<()> {
        match (self, value) {
            (FieldStore::Record(store), Value::Record(fields)) => store
                .check(fields, false)
                .map_err(|e| e.within_field(name)),
            _ if self.kind() == value.kind() => Ok(()),
            _ => Err(RecorderError::SchemaMismatch {
                path: String::new(),
                field: name.to_string(),
                expected: self.kind().to_string(),
                found: value.kind().to_string(),
            }),
        }
    }

    fn push(&mut self, value: Value) {
        match (self, value) {
            (FieldStore::Scalar(values), Value::Scalar(x)) => values.push(x),
            (FieldStore::Vector { rows, data, .. }, Value::Vector(v)) => {
                data.extend_from_slice(&v);
                *rows += 1;
            }
            (FieldStore::Opaque(values), Value::Opaque(o)) => values.push(o),
            (FieldStore::Record(store), Value::Record(fields)) => store.push(fields),
            (store, value) => unreachable!(
                "{} appended to {} store; points are checked before append",
                value.kind(),
                store.kind()
            ),
        }
    }

    fn finish(self) -> Field {
        match self {
            FieldStore::Scalar(values) => Field::Column(Column::Scalar(values.into_boxed_slice())),
            FieldStore::Vector { dim, rows, data } => Field::Column(Column::Vector {
                dim,
                rows,
                data: data.into_boxed_slice(),
            }),
            FieldStore::Opaque(values) => Field::Column(Column::Opaque(values.into_boxed_slice())),
            FieldStore::Record(store) => Field::Record(store.finish()),
        }
    }
}

/// Growable storage for a group of named fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct RecordStore {
    slots: BTreeMap<String, FieldStore>,
}

impl RecordStore {
    /// Check that `fields` can be appended without breaking row alignment.
    ///
    /// The first point of a series defines the schema, so nothing is checked
    /// when `first` is set. Afterwards every established field must be present
    /// with its original kind and no new field may appear.
    pub fn check(&self, fields: &Fields, first: bool) -> Result<()> {
        if first {
            return Ok(());
        }

        for (name, value) in fields {
            match self.slots.get(name) {
                Some(slot) => slot.check(name, value)?,
                None => {
                    return Err(RecorderError::SchemaMismatch {
                        path: String::new(),
                        field: name.clone(),
                        expected: "missing".to_string(),
                        found: value.kind().to_string(),
                    })
                }
            }
        }

        if let Some((name, slot)) = self.slots.iter().find(|(name, _)| !fields.contains(name)) {
            return Err(RecorderError::SchemaMismatch {
                path: String::new(),
                field: name.clone(),
                expected: slot.kind().to_string(),
                found: "missing".to_string(),
            });
        }

        Ok(())
    }

    /// Append one row. `check` must have accepted `fields`.
    pub fn push(&mut self, fields: Fields) {
        for (name, value) in fields {
            self.slots
                .entry(name)
                .or_insert_with(|| FieldStore::empty_for(&value))
                .push(value);
        }
    }

    /// Freeze every slot into a fixed-length column.
    pub fn finish(self) -> Record {
        Record::from_entries(
            self.slots
                .into_iter()
                .map(|(name, slot)| (name, slot.finish()))
                .collect(),
        )
    }
}
