//! Path-addressed tree of time series.
//!
//! A [`DataSet`] owns named children, each either another dataset or a
//! [`TimeSeries`] leaf. Producers address leaves with delimiter-separated
//! paths (`"vehicle/imu"`); missing nodes along the path are created on
//! first use. Queries only ever touch the leaves and rebuild the internal
//! nodes around them, so every derived tree has the shape of its source.

use crate::error::{RecorderError, Result};
use crate::series::TimeSeries;
use crate::types::Point;
use serde::{Serialize, Serializer};
use std::collections::btree_map::{self, BTreeMap};
use tracing::debug;

/// Dataset configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataSetConfig {
    /// Separator between path segments.
    pub delimiter: String,
}

impl Default for DataSetConfig {
    fn default() -> Self {
        Self {
            delimiter: "/".to_string(),
        }
    }
}

/// A child of a dataset.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Node {
    DataSet(DataSet),
    Series(TimeSeries),
}

impl Node {
    pub fn as_dataset(&self) -> Option<&DataSet> {
        match self {
            Node::DataSet(ds) => Some(ds),
            Node::Series(_) => None,
        }
    }

    pub fn as_series(&self) -> Option<&TimeSeries> {
        match self {
            Node::Series(s) => Some(s),
            Node::DataSet(_) => None,
        }
    }

    pub fn is_series(&self) -> bool {
        matches!(self, Node::Series(_))
    }
}

/// Trim `delim` from both ends of `path` and split off the first segment.
///
/// Repeated delimiters collapse: `"a//b"` splits into `"a"` and `"/b"`,
/// which trims to `"b"` one level down.
fn split_path<'p>(path: &'p str, delim: &str) -> Result<(&'p str, Option<&'p str>)> {
    if delim.is_empty() {
        return Err(RecorderError::InvalidPath(path.to_string()));
    }

    let trimmed = path.trim_start_matches(delim).trim_end_matches(delim);
    if trimmed.is_empty() {
        return Err(RecorderError::InvalidPath(path.to_string()));
    }

    Ok(match trimmed.split_once(delim) {
        Some((head, rest)) => (head, Some(rest)),
        None => (trimmed, None),
    })
}

/// An internal node of the tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataSet {
    config: DataSetConfig,
    children: BTreeMap<String, Node>,
}

impl DataSet {
    /// Create an empty dataset with the default `/` delimiter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty dataset with a custom configuration.
    ///
    /// Datasets created along inserted paths inherit it.
    pub fn with_config(config: DataSetConfig) -> Self {
        Self {
            config,
            children: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &DataSetConfig {
        &self.config
    }

    /// Record a point in the series at `path`, creating it and any missing
    /// parent datasets.
    pub fn add_point(&mut self, path: &str, point: Point) -> Result<()> {
        let delim = self.config.delimiter.clone();
        self.add_point_with_delim(path, &delim, point)
    }

    /// Like [`DataSet::add_point`] with a per-call delimiter.
    pub fn add_point_with_delim(&mut self, path: &str, delim: &str, point: Point) -> Result<()> {
        let (head, rest) = split_path(path, delim)?;

        match rest {
            Some(rest) => self
                .child_dataset(head)?
                .add_point_with_delim(rest, delim, point)
                .map_err(|e| e.within(head, delim)),
            None => {
                let config = &self.config;
                let node = self.children.entry(head.to_string()).or_insert_with(|| {
                    debug!(name = head, delimiter = %config.delimiter, "Created time series");
                    Node::Series(TimeSeries::new())
                });
                match node {
                    Node::Series(series) => {
                        series.add_point(point).map_err(|e| e.within(head, delim))
                    }
                    Node::DataSet(_) => Err(RecorderError::PathConflict(head.to_string())),
                }
            }
        }
    }

    /// Place a pre-built series (for example one carrying metadata) at `path`.
    pub fn insert_series(&mut self, path: &str, series: TimeSeries) -> Result<()> {
        let delim = self.config.delimiter.clone();
        self.insert_series_with_delim(path, &delim, series)
    }

    fn insert_series_with_delim(
        &mut self,
        path: &str,
        delim: &str,
        series: TimeSeries,
    ) -> Result<()> {
        let (head, rest) = split_path(path, delim)?;

        match rest {
            Some(rest) => self
                .child_dataset(head)?
                .insert_series_with_delim(rest, delim, series)
                .map_err(|e| e.within(head, delim)),
            None => match self.children.entry(head.to_string()) {
                btree_map::Entry::Occupied(_) => Err(RecorderError::PathConflict(head.to_string())),
                btree_map::Entry::Vacant(slot) => {
                    slot.insert(Node::Series(series));
                    Ok(())
                }
            },
        }
    }

    /// The child dataset `name`, created if absent.
    fn child_dataset(&mut self, name: &str) -> Result<&mut DataSet> {
        let config = &self.config;
        let node = self.children.entry(name.to_string()).or_insert_with(|| {
            debug!(name, "Created dataset");
            Node::DataSet(DataSet::with_config(config.clone()))
        });

        match node {
            Node::DataSet(ds) => Ok(ds),
            Node::Series(_) => Err(RecorderError::PathConflict(name.to_string())),
        }
    }

    /// Finalize every series that is still recording.
    ///
    /// Series finalized earlier are left as they are, so a tree that gained
    /// new paths after a finalize can be finalized again. Fails with
    /// [`RecorderError::AlreadyFinalized`] when the tree has series but none
    /// of them is still recording.
    pub fn finalize(&mut self) -> Result<()> {
        let pending = self
            .leaves()
            .filter(|(_, series)| !series.is_finalized())
            .count();
        if pending == 0 {
            if let Some((path, _)) = self.leaves().next() {
                return Err(RecorderError::AlreadyFinalized { path });
            }
        }

        self.finalize_leaves()?;
        debug!(series = pending, "Finalized dataset");
        Ok(())
    }

    fn finalize_leaves(&mut self) -> Result<()> {
        for (name, node) in self.children.iter_mut() {
            let result = match node {
                Node::DataSet(ds) => ds.finalize_leaves(),
                Node::Series(series) if series.is_finalized() => Ok(()),
                Node::Series(series) => series.finalize(),
            };
            result.map_err(|e| e.within(name, &self.config.delimiter))?;
        }
        Ok(())
    }

    /// Apply `f` to every series and rebuild the tree around the results.
    pub fn map_series<F>(&self, mut f: F) -> Result<DataSet>
    where
        F: FnMut(&TimeSeries) -> Result<TimeSeries>,
    {
        self.map_series_with(&mut f)
    }

    fn map_series_with<F>(&self, f: &mut F) -> Result<DataSet>
    where
        F: FnMut(&TimeSeries) -> Result<TimeSeries>,
    {
        let mut children = BTreeMap::new();
        for (name, node) in &self.children {
            let mapped = match node {
                Node::DataSet(ds) => ds.map_series_with(f).map(Node::DataSet),
                Node::Series(series) => f(series).map(Node::Series),
            }
            .map_err(|e| e.within(name, &self.config.delimiter))?;
            children.insert(name.clone(), mapped);
        }

        Ok(DataSet {
            config: self.config.clone(),
            children,
        })
    }

    /// Every series restricted to `start <= t <= end`.
    pub fn get_view(&self, start_time: f64, end_time: f64) -> Result<DataSet> {
        self.map_series(|series| series.get_view(start_time, end_time))
    }

    /// Every series restricted to `t >= start`.
    pub fn get_after(&self, start_time: f64) -> Result<DataSet> {
        self.map_series(|series| series.get_after(start_time))
    }

    /// A full copy of every series.
    pub fn get_all(&self) -> Result<DataSet> {
        self.map_series(TimeSeries::get_all)
    }

    /// Direct child by name.
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.children.get(name)
    }

    /// Node at `path`.
    pub fn node(&self, path: &str) -> Result<&Node> {
        let (head, rest) = split_path(path, &self.config.delimiter)?;
        let child = self
            .children
            .get(head)
            .ok_or_else(|| RecorderError::PathNotFound(head.to_string()))?;

        match (child, rest) {
            (_, None) => Ok(child),
            (Node::DataSet(ds), Some(rest)) => ds
                .node(rest)
                .map_err(|e| e.within(head, &self.config.delimiter)),
            (Node::Series(_), Some(rest)) => Err(RecorderError::PathNotFound(format!(
                "{head}{}{rest}",
                self.config.delimiter
            ))),
        }
    }

    /// Series at `path`.
    pub fn series(&self, path: &str) -> Result<&TimeSeries> {
        self.node(path)?
            .as_series()
            .ok_or_else(|| RecorderError::PathNotFound(path.to_string()))
    }

    /// Dataset at `path`.
    pub fn dataset(&self, path: &str) -> Result<&DataSet> {
        self.node(path)?
            .as_dataset()
            .ok_or_else(|| RecorderError::PathNotFound(path.to_string()))
    }

    /// Direct children in name order.
    pub fn children(&self) -> btree_map::Iter<'_, String, Node> {
        self.children.iter()
    }

    /// Every series with its full path, depth first in name order.
    pub fn leaves(&self) -> impl Iterator<Item = (String, &TimeSeries)> + '_ {
        let mut out = Vec::new();
        self.collect_leaves("", &mut out);
        out.into_iter()
    }

    fn collect_leaves<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a TimeSeries)>) {
        for (name, node) in &self.children {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}{}{name}", self.config.delimiter)
            };
            match node {
                Node::DataSet(ds) => ds.collect_leaves(&path, out),
                Node::Series(series) => out.push((path, series)),
            }
        }
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// True when every series in the tree is finalized.
    pub fn is_finalized(&self) -> bool {
        self.leaves().all(|(_, series)| series.is_finalized())
    }
}

impl Serialize for DataSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(&self.children)
    }
}
