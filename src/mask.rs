//! Boolean row selection and shape-preserving masked copies.
//!
//! Every view is built the same way: compute a [`Mask`] over a series'
//! timestamps, then copy each column keeping only the selected rows. Nested
//! records are rebuilt with identical names so the copy has the same shape
//! as the source.

use crate::error::{RecorderError, Result};
use crate::fields::{Column, Field, Record};

/// Row selection over one series.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    bits: Vec<bool>,
    selected: usize,
}

impl Mask {
    /// Build a mask from explicit flags.
    pub fn from_bools(bits: impl Into<Vec<bool>>) -> Self {
        let bits = bits.into();
        let selected = bits.iter().filter(|b| **b).count();
        Self { bits, selected }
    }

    /// Select every timestamp for which `pred` holds.
    pub fn from_fn(times: &[f64], mut pred: impl FnMut(f64) -> bool) -> Self {
        Self::from_bools(times.iter().map(|&t| pred(t)).collect::<Vec<_>>())
    }

    /// Select timestamps in `[start, end]`, inclusive on both ends.
    ///
    /// An inverted or NaN range selects nothing.
    pub fn from_range(times: &[f64], start: f64, end: f64) -> Self {
        Self::from_fn(times, |t| start <= t && t <= end)
    }

    /// Number of rows the mask covers.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Number of selected rows.
    pub fn count(&self) -> usize {
        self.selected
    }

    pub fn is_selected(&self, row: usize) -> bool {
        self.bits.get(row).copied().unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }

    /// Fail unless the mask covers exactly `rows` rows.
    pub fn check_covers(&self, rows: usize) -> Result<()> {
        if self.bits.len() == rows {
            Ok(())
        } else {
            Err(RecorderError::MaskLength {
                expected: rows,
                found: self.bits.len(),
            })
        }
    }

    /// Copy the selected elements of `values`, preserving order.
    pub fn select<T: Clone>(&self, values: &[T]) -> Vec<T> {
        let mut out = Vec::with_capacity(self.selected);
        out.extend(
            values
                .iter()
                .zip(&self.bits)
                .filter(|(_, keep)| **keep)
                .map(|(v, _)| v.clone()),
        );
        out
    }
}

/// Types that can produce an independent copy restricted to a [`Mask`].
///
/// A mask that does not cover exactly the rows of `self` is rejected with
/// [`RecorderError::MaskLength`].
pub trait MaskedCopy: Sized {
    fn masked_copy(&self, mask: &Mask) -> Result<Self>;
}

impl MaskedCopy for Box<[f64]> {
    fn masked_copy(&self, mask: &Mask) -> Result<Self> {
        mask.check_covers(self.len())?;
        Ok(mask.select(self).into_boxed_slice())
    }
}

impl MaskedCopy for Column {
    fn masked_copy(&self, mask: &Mask) -> Result<Self> {
        mask.check_covers(self.len())?;
        Ok(match self {
            Column::Scalar(values) => Column::Scalar(mask.select(values).into_boxed_slice()),
            Column::Vector { dim, .. } => {
                let mut rows = 0;
                let mut data = Vec::with_capacity(mask.count() * dim);
                for (row, keep) in self.vector_rows().zip(mask.iter()) {
                    if keep {
                        data.extend_from_slice(row);
                        rows += 1;
                    }
                }
                Column::Vector {
                    dim: *dim,
                    rows,
                    data: data.into_boxed_slice(),
                }
            }
            // Handles are cloned one by one so every selected element keeps its identity.
            Column::Opaque(values) => Column::Opaque(mask.select(values).into_boxed_slice()),
        })
    }
}

impl MaskedCopy for Field {
    fn masked_copy(&self, mask: &Mask) -> Result<Self> {
        match self {
            Field::Column(c) => c.masked_copy(mask).map(Field::Column),
            Field::Record(r) => r.masked_copy(mask).map(Field::Record),
        }
    }
}

impl MaskedCopy for Record {
    fn masked_copy(&self, mask: &Mask) -> Result<Self> {
        self.try_map_fields(|field| field.masked_copy(mask))
    }
}
