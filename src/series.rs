//! A single recorded time series.
//!
//! A series starts out recording: each [`Point`] appends one timestamp and
//! one row to every field. [`TimeSeries::finalize`] freezes the growable
//! storage into fixed columns, after which the series only answers queries.
//! Every query returns a new, independently owned series.

use crate::error::{RecorderError, Result};
use crate::fields::{Column, Record, RecordStore};
use crate::mask::{Mask, MaskedCopy};
use crate::types::{Point, Sample};
use serde::ser::{Error as _, SerializeStruct};
use serde::{Serialize, Serializer};
use std::iter::FusedIterator;
use std::mem;
use tracing::{debug, trace};

/// Growable state while points are still being added.
#[derive(Clone, Debug, Default, PartialEq)]
struct Recording {
    times: Vec<f64>,
    meta_times: Vec<f64>,
    fields: RecordStore,
}

/// Fixed columnar state after finalize.
#[derive(Clone, Debug, PartialEq)]
struct Frozen {
    times: Box<[f64]>,
    meta_times: Option<Box<[f64]>>,
    t0: Option<f64>,
    fields: Record,
}

impl MaskedCopy for Frozen {
    fn masked_copy(&self, mask: &Mask) -> Result<Self> {
        Ok(Frozen {
            times: self.times.masked_copy(mask)?,
            meta_times: self
                .meta_times
                .as_ref()
                .map(|m| m.masked_copy(mask))
                .transpose()?,
            t0: self.t0,
            fields: self.fields.masked_copy(mask)?,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
enum SeriesState {
    Recording(Recording),
    Finalized(Frozen),
}

/// A leaf of the dataset tree: one time axis, an optional secondary time
/// axis, and a nested record of per-sample fields.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeSeries {
    /// Caller-supplied value carried into every view.
    metadata: serde_json::Value,

    state: SeriesState,
}

impl Default for TimeSeries {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSeries {
    /// Create an empty, recording series without metadata.
    pub fn new() -> Self {
        Self::with_metadata(serde_json::Value::Null)
    }

    /// Create an empty, recording series carrying `metadata`.
    pub fn with_metadata(metadata: impl Into<serde_json::Value>) -> Self {
        Self {
            metadata: metadata.into(),
            state: SeriesState::Recording(Recording::default()),
        }
    }

    /// Append one point.
    ///
    /// The first point fixes the schema: which fields exist, their kinds,
    /// and whether the series carries meta-times. Points that disagree, or
    /// whose time is not finite, are rejected before anything is appended.
    pub fn add_point(&mut self, point: Point) -> Result<()> {
        let SeriesState::Recording(rec) = &mut self.state else {
            return Err(RecorderError::AlreadyFinalized {
                path: String::new(),
            });
        };
        if !point.time.is_finite() {
            return Err(RecorderError::InvalidTime(point.time));
        }

        let first = rec.times.is_empty();
        if !first {
            let has_meta = !rec.meta_times.is_empty();
            if has_meta != point.meta_time.is_some() {
                return Err(RecorderError::MetaTimeMismatch {
                    expected: presence(has_meta),
                    found: presence(point.meta_time.is_some()),
                });
            }
        }
        rec.fields.check(&point.fields, first)?;

        rec.times.push(point.time);
        if let Some(meta_time) = point.meta_time {
            rec.meta_times.push(meta_time);
        }
        rec.fields.push(point.fields);

        Ok(())
    }

    /// Freeze the series. Fails if it is already finalized.
    pub fn finalize(&mut self) -> Result<()> {
        let SeriesState::Recording(rec) = &mut self.state else {
            return Err(RecorderError::AlreadyFinalized {
                path: String::new(),
            });
        };
        let rec = mem::take(rec);

        let t0 = rec.times.first().copied();
        let meta_times = if rec.meta_times.is_empty() {
            None
        } else {
            Some(rec.meta_times.into_boxed_slice())
        };

        debug!(points = rec.times.len(), "Finalized time series");

        self.state = SeriesState::Finalized(Frozen {
            times: rec.times.into_boxed_slice(),
            meta_times,
            t0,
            fields: rec.fields.finish(),
        });

        Ok(())
    }

    fn frozen(&self) -> Result<&Frozen> {
        match &self.state {
            SeriesState::Finalized(frozen) => Ok(frozen),
            SeriesState::Recording(_) => Err(RecorderError::NotFinalized {
                path: String::new(),
            }),
        }
    }

    fn derive(&self, frozen: &Frozen, mask: &Mask) -> Result<TimeSeries> {
        trace!(selected = mask.count(), total = mask.len(), "Building masked view");
        Ok(TimeSeries {
            metadata: self.metadata.clone(),
            state: SeriesState::Finalized(frozen.masked_copy(mask)?),
        })
    }

    /// Rows with `start <= t <= end`, as a new finalized series.
    pub fn get_view(&self, start_time: f64, end_time: f64) -> Result<TimeSeries> {
        let frozen = self.frozen()?;
        let mask = Mask::from_range(&frozen.times, start_time, end_time);
        self.derive(frozen, &mask)
    }

    /// Rows with `t >= start`.
    pub fn get_after(&self, start_time: f64) -> Result<TimeSeries> {
        self.get_view(start_time, f64::INFINITY)
    }

    /// A full copy of a finalized series.
    pub fn get_all(&self) -> Result<TimeSeries> {
        self.get_view(f64::NEG_INFINITY, f64::INFINITY)
    }

    /// Copy of the rows selected by an arbitrary mask.
    pub fn masked(&self, mask: &Mask) -> Result<TimeSeries> {
        self.derive(self.frozen()?, mask)
    }

    /// Iterate per-sample snapshots. Each call starts from the first row.
    pub fn point_iter(&self) -> Result<PointIter<'_>> {
        Ok(PointIter {
            frozen: self.frozen()?,
            next: 0,
        })
    }

    /// Number of recorded points.
    pub fn len(&self) -> usize {
        self.times().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self.state, SeriesState::Finalized(_))
    }

    /// Timestamps recorded so far.
    pub fn times(&self) -> &[f64] {
        match &self.state {
            SeriesState::Recording(rec) => rec.times.as_slice(),
            SeriesState::Finalized(frozen) => &frozen.times[..],
        }
    }

    /// Secondary timestamps, if this series records them.
    pub fn meta_times(&self) -> Option<&[f64]> {
        match &self.state {
            SeriesState::Recording(rec) if rec.meta_times.is_empty() => None,
            SeriesState::Recording(rec) => Some(rec.meta_times.as_slice()),
            SeriesState::Finalized(frozen) => frozen.meta_times.as_deref(),
        }
    }

    pub fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }

    /// First timestamp, known once the series is finalized with at least
    /// one point. Views keep the value of their source.
    pub fn t0(&self) -> Option<f64> {
        match &self.state {
            SeriesState::Finalized(frozen) => frozen.t0,
            SeriesState::Recording(_) => None,
        }
    }

    /// First and last timestamp.
    pub fn time_range(&self) -> Option<(f64, f64)> {
        let times = self.times();
        Some((*times.first()?, *times.last()?))
    }

    /// Timestamps relative to `t0`, for plotting against elapsed time.
    pub fn relative_times(&self) -> Result<Vec<f64>> {
        let frozen = self.frozen()?;
        let t0 = frozen.t0.unwrap_or(0.0);
        Ok(frozen.times.iter().map(|t| t - t0).collect())
    }

    /// All finalized fields.
    pub fn fields(&self) -> Result<&Record> {
        Ok(&self.frozen()?.fields)
    }

    /// A finalized column addressed by `/`-separated field path.
    pub fn column(&self, path: &str) -> Result<&Column> {
        self.fields()?
            .column(path)
            .ok_or_else(|| RecorderError::FieldNotFound(path.to_string()))
    }

    /// A finalized scalar column as a slice.
    pub fn scalars(&self, path: &str) -> Result<&[f64]> {
        let column = self.column(path)?;
        column
            .as_scalars()
            .ok_or_else(|| RecorderError::SchemaMismatch {
                path: String::new(),
                field: path.to_string(),
                expected: "scalar".to_string(),
                found: column.kind().to_string(),
            })
    }
}

fn presence(has: bool) -> &'static str {
    if has {
        "has meta-times"
    } else {
        "has no meta-times"
    }
}

impl Serialize for TimeSeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let frozen = self.frozen().map_err(S::Error::custom)?;

        let mut state = serializer.serialize_struct("TimeSeries", 5)?;
        state.serialize_field("times", &frozen.times)?;
        state.serialize_field("meta_times", &frozen.meta_times)?;
        state.serialize_field("t0", &frozen.t0)?;
        state.serialize_field("metadata", &self.metadata)?;
        state.serialize_field("fields", &frozen.fields)?;
        state.end()
    }
}

/// Lazy iterator over the rows of a finalized series.
pub struct PointIter<'a> {
    frozen: &'a Frozen,
    next: usize,
}

impl Iterator for PointIter<'_> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        let row = self.next;
        let t = *self.frozen.times.get(row)?;
        self.next += 1;

        Some(Sample {
            t,
            meta_t: self.frozen.meta_times.as_ref().and_then(|m| m.get(row).copied()),
            fields: self.frozen.fields.row(row),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.frozen.times.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PointIter<'_> {}

impl FusedIterator for PointIter<'_> {}
