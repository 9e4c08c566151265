//! Partition, row and document types.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Key under which a row's partition metadata is embedded.
pub const PARTITION_KEY: &str = "partition";

/// Name of the partition field that holds the row array.
pub const ROWS_KEY: &str = "rows";

/// Metadata fields of one partition, in input order, without `rows`.
pub type Partition = Map<String, Value>;

/// Fields of one element of a partition's `rows` array.
pub type Row = Map<String, Value>;

/// A row paired with the partition it was read from.
///
/// The partition is shared between all documents of the same partition and is
/// never mutated once its rows are being read, so each document holds a
/// snapshot of the metadata as it was when the row was decoded.
///
/// Serializes as the row's fields followed by `"partition": { ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    row: Row,
    partition: Arc<Partition>,
}

impl Document {
    /// Pair `row` with `partition`.
    ///
    /// Returns `None` if the row already has a [`PARTITION_KEY`] field.
    #[must_use]
    pub fn new(row: Row, partition: Arc<Partition>) -> Option<Self> {
        if row.contains_key(PARTITION_KEY) {
            return None;
        }
        Some(Self { row, partition })
    }

    #[must_use]
    pub fn row(&self) -> &Row {
        &self.row
    }

    #[must_use]
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// Merge into a single JSON object, the shape the document is written as.
    #[must_use]
    pub fn into_value(self) -> Value {
        let mut obj = self.row;
        let partition = Arc::unwrap_or_clone(self.partition);
        obj.insert(PARTITION_KEY.to_string(), Value::Object(partition));
        Value::Object(obj)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.row.len() + 1))?;
        for (k, v) in &self.row {
            map.serialize_entry(k, v)?;
        }
        map.serialize_entry(PARTITION_KEY, self.partition.as_ref())?;
        map.end()
    }
}
