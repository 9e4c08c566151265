//! Forward-only structural parser for `sstabledump` output.
//!
//! The input is a single JSON array of partition objects:
//!
//! ```text
//! [
//!   { "key": ["k1"], "position": 31, "rows": [ { ... }, { ... } ] },
//!   { "key": ["k2"], "position": 98, "rows": [ { ... } ] }
//! ]
//! ```
//!
//! [`parse_documents`] walks that structure with `serde_json`'s streaming
//! deserializer and a chain of [`DeserializeSeed`]s, so only one partition's
//! metadata and one row are held in memory at a time. Each row is handed to
//! the `emit` callback as a [`Document`] as soon as it has been decoded.
//!
//! # Structure rules
//! - The top-level value must be an array.
//! - Every array element must be an object.
//! - Partition fields up to `rows` (or the empty field name) are metadata; a
//!   metadata field may appear only once.
//! - `rows` must be an array of objects, none of which may contain a
//!   `partition` field.
//! - `rows` must be the last field of its partition.
//! - Only whitespace may follow the closing bracket.
//!
//! Violations are reported as [`StructureError`]s carrying the partition/row
//! index (and field name) where they were found.

use crate::document::{Document, Partition, ROWS_KEY, Row};
use crate::error::{Location, StructureError};
use anyhow::Result;
use serde::de::{self, DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_json::Value;
use serde_json::error::Category;
use std::fmt;
use std::io::Read;
use std::sync::Arc;

/// Counts gathered while walking one input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseSummary {
    /// Partitions whose `rows` array was read to the end.
    pub partitions: usize,
    /// Documents handed to `emit`.
    pub rows: usize,
}

/// Parse one `sstabledump` array from `reader`, calling `emit` for every row.
///
/// `reader` is consumed byte by byte; wrap unbuffered sources in a
/// [`BufReader`](std::io::BufReader).
///
/// # Errors
/// Returns a [`StructureError`] for malformed input. An error returned by
/// `emit` stops the walk and is returned unchanged. Documents emitted before
/// the failure are not retracted.
pub fn parse_documents<R, F>(reader: R, emit: F) -> Result<ParseSummary>
where
    R: Read,
    F: FnMut(Document) -> Result<()>,
{
    let mut walker = Walker {
        emit,
        location: Location::Start,
        opened: false,
        failure: None,
        summary: ParseSummary::default(),
    };
    let mut de = serde_json::Deserializer::from_reader(reader);
    if let Err(err) = (OuterArray {
        walker: &mut walker,
    })
    .deserialize(&mut de)
    {
        return Err(walker.into_error(err));
    }
    de.end()
        .map_err(|source| StructureError::TrailingData { source })?;
    Ok(walker.summary)
}

/// State shared by every level of the walk.
///
/// Visitors can only return the deserializer's own error type, so the typed
/// failure is parked here and recovered once the deserializer unwinds.
struct Walker<F> {
    emit: F,
    location: Location,
    opened: bool,
    failure: Option<anyhow::Error>,
    summary: ParseSummary,
}

impl<F> Walker<F> {
    fn fail<E: de::Error>(&mut self, err: impl Into<anyhow::Error>) -> E {
        let err = err.into();
        let out = E::custom(&err);
        self.failure = Some(err);
        out
    }

    fn into_error(self, err: serde_json::Error) -> anyhow::Error {
        if let Some(failure) = self.failure {
            return failure;
        }
        if !self.opened {
            return StructureError::NotAnArray.into();
        }
        let location = self.location;
        match err.classify() {
            Category::Eof => StructureError::UnterminatedArray {
                location,
                source: err,
            },
            _ => StructureError::Decode {
                location,
                source: err,
            },
        }
        .into()
    }
}

/// Rejects every JSON value kind other than the container a visitor expects,
/// through the visitor's `mismatch` method.
macro_rules! reject_scalars {
    () => {
        fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
            Err(self.mismatch())
        }

        fn visit_i64<E: de::Error>(self, _: i64) -> Result<Self::Value, E> {
            Err(self.mismatch())
        }

        fn visit_u64<E: de::Error>(self, _: u64) -> Result<Self::Value, E> {
            Err(self.mismatch())
        }

        fn visit_f64<E: de::Error>(self, _: f64) -> Result<Self::Value, E> {
            Err(self.mismatch())
        }

        fn visit_str<E: de::Error>(self, _: &str) -> Result<Self::Value, E> {
            Err(self.mismatch())
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Err(self.mismatch())
        }
    };
}

struct OuterArray<'w, F> {
    walker: &'w mut Walker<F>,
}

impl<F> OuterArray<'_, F> {
    fn mismatch<E: de::Error>(self) -> E {
        self.walker.fail(StructureError::NotAnArray)
    }
}

impl<'de, F> DeserializeSeed<'de> for OuterArray<'_, F>
where
    F: FnMut(Document) -> Result<()>,
{
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de, F> Visitor<'de> for OuterArray<'_, F>
where
    F: FnMut(Document) -> Result<()>,
{
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an array of partition objects")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<(), A::Error> {
        let walker = self.walker;
        walker.opened = true;
        let mut partition = 0;
        loop {
            walker.location = Location::Partition { partition };
            let seed = PartitionObject {
                walker: &mut *walker,
                partition,
            };
            if seq.next_element_seed(seed)?.is_none() {
                break;
            }
            partition += 1;
        }
        walker.location = Location::End;
        Ok(())
    }

    fn visit_map<A: MapAccess<'de>>(self, _map: A) -> Result<(), A::Error> {
        Err(self.mismatch())
    }

    reject_scalars!();
}

struct PartitionObject<'w, F> {
    walker: &'w mut Walker<F>,
    partition: usize,
}

impl<F> PartitionObject<'_, F> {
    fn mismatch<E: de::Error>(self) -> E {
        let partition = self.partition;
        self.walker
            .fail(StructureError::PartitionNotObject { partition })
    }
}

impl<'de, F> DeserializeSeed<'de> for PartitionObject<'_, F>
where
    F: FnMut(Document) -> Result<()>,
{
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de, F> Visitor<'de> for PartitionObject<'_, F>
where
    F: FnMut(Document) -> Result<()>,
{
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a partition object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        let PartitionObject { walker, partition } = self;

        let mut fields = Partition::new();
        loop {
            walker.location = Location::Partition { partition };
            let Some(name) = map.next_key::<String>()? else {
                // the object closed without ever reaching `rows`
                return Err(walker.fail(StructureError::RowsNotArray { partition }));
            };
            if name.is_empty() || name == ROWS_KEY {
                break;
            }
            if fields.contains_key(&name) {
                return Err(walker.fail(StructureError::DuplicateField {
                    partition,
                    field: name,
                }));
            }
            walker.location = Location::Field {
                partition,
                field: name.clone(),
            };
            let value: Value = map.next_value()?;
            fields.insert(name, value);
        }

        walker.location = Location::Rows { partition };
        map.next_value_seed(RowsArray {
            walker: &mut *walker,
            partition,
            fields: Arc::new(fields),
        })?;

        walker.location = Location::Partition { partition };
        if let Some(field) = map.next_key::<String>()? {
            return Err(walker.fail(StructureError::TrailingField { partition, field }));
        }
        walker.summary.partitions += 1;
        Ok(())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, _seq: A) -> Result<(), A::Error> {
        Err(self.mismatch())
    }

    reject_scalars!();
}

struct RowsArray<'w, F> {
    walker: &'w mut Walker<F>,
    partition: usize,
    fields: Arc<Partition>,
}

impl<F> RowsArray<'_, F> {
    fn mismatch<E: de::Error>(self) -> E {
        let partition = self.partition;
        self.walker.fail(StructureError::RowsNotArray { partition })
    }
}

impl<'de, F> DeserializeSeed<'de> for RowsArray<'_, F>
where
    F: FnMut(Document) -> Result<()>,
{
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de, F> Visitor<'de> for RowsArray<'_, F>
where
    F: FnMut(Document) -> Result<()>,
{
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an array of row objects")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<(), A::Error> {
        let RowsArray {
            walker,
            partition,
            fields,
        } = self;

        let mut row = 0;
        loop {
            walker.location = Location::Rows { partition };
            let seed = RowObject {
                walker: &mut *walker,
                partition,
                row,
            };
            let Some(decoded) = seq.next_element_seed(seed)? else {
                break;
            };
            let Some(doc) = Document::new(decoded, Arc::clone(&fields)) else {
                return Err(walker.fail(StructureError::RowHasPartitionKey { partition, row }));
            };
            walker.summary.rows += 1;
            if let Err(err) = (walker.emit)(doc) {
                return Err(walker.fail(err));
            }
            row += 1;
        }
        Ok(())
    }

    fn visit_map<A: MapAccess<'de>>(self, _map: A) -> Result<(), A::Error> {
        Err(self.mismatch())
    }

    reject_scalars!();
}

struct RowObject<'w, F> {
    walker: &'w mut Walker<F>,
    partition: usize,
    row: usize,
}

impl<F> RowObject<'_, F> {
    fn mismatch<E: de::Error>(self) -> E {
        let (partition, row) = (self.partition, self.row);
        self.walker
            .fail(StructureError::RowNotObject { partition, row })
    }
}

impl<'de, F> DeserializeSeed<'de> for RowObject<'_, F> {
    type Value = Row;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Row, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de, F> Visitor<'de> for RowObject<'_, F> {
    type Value = Row;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a row object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Row, A::Error> {
        self.walker.location = Location::Row {
            partition: self.partition,
            row: self.row,
        };
        let mut fields = Row::new();
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            fields.insert(key, value);
        }
        Ok(fields)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, _seq: A) -> Result<Row, A::Error> {
        Err(self.mismatch())
    }

    reject_scalars!();
}
