//! # Time Series Tree
//!
//! An in-memory recorder for named, hierarchically organized time series.
//!
//! ## Core Concepts
//!
//! - **DataSet**: A tree addressed by paths like `"vehicle/imu"`; nodes are
//!   created on first insertion
//! - **TimeSeries**: A leaf with one time axis, an optional meta-time axis,
//!   and nested per-sample fields whose schema is fixed by the first point
//! - **Finalize**: One-way switch from growable storage to fixed columns
//! - **Views**: Time-range copies of a finalized series or whole tree
//!
//! ## Example
//!
//! ```ignore
//! use timeseries_tree::{DataSet, Fields, Point};
//!
//! let mut data = DataSet::new();
//! for i in 0..100 {
//!     let t = i as f64 * 0.01;
//!     data.add_point(
//!         "quad/state",
//!         Point::at(t)
//!             .with_field("pos", [t, 0.0, 1.0])
//!             .with_field("ctrl", Fields::new().with("thrust", 9.81)),
//!     )?;
//! }
//! data.finalize()?;
//!
//! // Everything recorded during the second half-second
//! let late = data.get_view(0.5, 1.0)?;
//! let thrust = late.series("quad/state")?.scalars("ctrl/thrust")?;
//!
//! // Row-wise processing
//! for sample in data.series("quad/state")?.point_iter()? {
//!     println!("{} {:?}", sample.t, sample.get("pos"));
//! }
//! ```

pub mod dataset;
pub mod error;
pub mod fields;
pub mod mask;
pub mod series;
pub mod types;

// Re-exports
pub use dataset::{DataSet, DataSetConfig, Node};
pub use error::{RecorderError, Result};
pub use fields::{Column, Field, Record};
pub use mask::{Mask, MaskedCopy};
pub use series::{PointIter, TimeSeries};
pub use types::*;
