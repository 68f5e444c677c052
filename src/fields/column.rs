//! Fixed-length columns produced at finalize.

use crate::error::Result;
use crate::types::{FieldKind, Fields, Opaque, Value};
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::collections::btree_map::{self, BTreeMap};

/// A finalized, fixed-length column of per-sample values.
#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    /// One number per row.
    Scalar(Box<[f64]>),

    /// `rows` vectors of length `dim`, stored row-major.
    Vector {
        dim: usize,
        rows: usize,
        data: Box<[f64]>,
    },

    /// One opaque handle per row.
    Opaque(Box<[Opaque]>),
}

impl Column {
    /// Number of rows.
    pub fn len(&self) -> usize {
        match self {
            Column::Scalar(values) => values.len(),
            Column::Vector { rows, .. } => *rows,
            Column::Opaque(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Column::Scalar(_) => FieldKind::Scalar,
            Column::Vector { dim, .. } => FieldKind::Vector(*dim),
            Column::Opaque(_) => FieldKind::Opaque,
        }
    }

    /// Value at `row`, copied out of the column.
    pub fn get(&self, row: usize) -> Option<Value> {
        match self {
            Column::Scalar(values) => values.get(row).copied().map(Value::Scalar),
            Column::Vector { .. } => self.vector_row(row).map(|r| Value::Vector(r.to_vec())),
            Column::Opaque(values) => values.get(row).cloned().map(Value::Opaque),
        }
    }

    /// The whole column as a slice, if it holds scalars.
    pub fn as_scalars(&self) -> Option<&[f64]> {
        match self {
            Column::Scalar(values) => Some(&values[..]),
            _ => None,
        }
    }

    /// The opaque handles, if this is an opaque column.
    pub fn as_opaque(&self) -> Option<&[Opaque]> {
        match self {
            Column::Opaque(values) => Some(&values[..]),
            _ => None,
        }
    }

    /// One row of a vector column.
    pub fn vector_row(&self, row: usize) -> Option<&[f64]> {
        match self {
            Column::Vector { dim, rows, data } if row < *rows => {
                Some(&data[row * dim..(row + 1) * dim])
            }
            _ => None,
        }
    }

    /// Iterate the rows of a vector column. Empty for other kinds.
    pub fn vector_rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        let rows = match self {
            Column::Vector { rows, .. } => *rows,
            _ => 0,
        };
        (0..rows).filter_map(move |row| self.vector_row(row))
    }

    /// One component of every row of a vector column (e.g. all `x` of a position).
    pub fn component(&self, index: usize) -> Option<Vec<f64>> {
        match self {
            Column::Vector { dim, .. } if index < *dim => {
                Some(self.vector_rows().map(|r| r[index]).collect())
            }
            _ => None,
        }
    }
}

impl Serialize for Column {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Column::Scalar(values) => values.serialize(serializer),
            Column::Vector { rows, .. } => {
                let mut seq = serializer.serialize_seq(Some(*rows))?;
                for row in self.vector_rows() {
                    seq.serialize_element(row)?;
                }
                seq.end()
            }
            Column::Opaque(values) => values.serialize(serializer),
        }
    }
}

/// A finalized field: either a column or a nested record of fields.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Field {
    Column(Column),
    Record(Record),
}

impl Field {
    pub fn as_column(&self) -> Option<&Column> {
        match self {
            Field::Column(c) => Some(c),
            Field::Record(_) => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Field::Record(r) => Some(r),
            Field::Column(_) => None,
        }
    }

    /// Value of this field at `row`, rebuilding nested records.
    pub fn row(&self, row: usize) -> Option<Value> {
        match self {
            Field::Column(c) => c.get(row),
            Field::Record(r) => Some(Value::Record(r.row(row))),
        }
    }
}

/// Named finalized fields of one series (or one nested group).
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    entries: BTreeMap<String, Field>,
}

impl Record {
    pub(crate) fn from_entries(entries: BTreeMap<String, Field>) -> Self {
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.entries.get(name)
    }

    /// Look up a nested field by `/`-separated path.
    pub fn lookup(&self, path: &str) -> Option<&Field> {
        let mut parts = path.split('/').filter(|p| !p.is_empty());
        let mut current = self.entries.get(parts.next()?)?;
        for part in parts {
            current = current.as_record()?.get(part)?;
        }
        Some(current)
    }

    /// Look up a column by `/`-separated path.
    pub fn column(&self, path: &str) -> Option<&Column> {
        self.lookup(path)?.as_column()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Field> {
        self.entries.iter()
    }

    pub(crate) fn try_map_fields(
        &self,
        mut f: impl FnMut(&Field) -> Result<Field>,
    ) -> Result<Record> {
        let entries = self
            .entries
            .iter()
            .map(|(name, field)| Ok((name.clone(), f(field)?)))
            .collect::<Result<_>>()?;
        Ok(Record { entries })
    }

    /// Rebuild the field values of one row.
    ///
    /// Rows past the end of a column are skipped; a finalized record never
    /// has those because all columns share the series length.
    pub fn row(&self, row: usize) -> Fields {
        self.entries
            .iter()
            .filter_map(|(name, field)| field.row(row).map(|v| (name.clone(), v)))
            .collect()
    }
}
