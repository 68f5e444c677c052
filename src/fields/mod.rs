//! Per-field storage.
//!
//! While a series is recording, every field lives in a growable
//! [`store::FieldStore`]. Finalizing turns each store into a fixed-length
//! [`Column`] (or a nested [`Record`] of columns) with exactly one row per
//! recorded timestamp.

mod column;
mod store;

pub use column::{Column, Field, Record};
pub(crate) use store::RecordStore;
