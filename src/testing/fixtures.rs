//! Pre-built `sstabledump` inputs and a reference flattening model.

use crate::document::{PARTITION_KEY, ROWS_KEY};
use anyhow::{Context, Result, bail};
use serde_json::{Map, Value, json};

/// A small dump in the shape Cassandra's `sstabledump` writes: two
/// partitions, three rows, nested clustering and cell values.
#[must_use]
pub fn sample_dump() -> String {
    json!([
        {
            "partition": { "key": ["user-1"], "position": 0 },
            "rows": [
                {
                    "type": "row",
                    "position": 31,
                    "clustering": ["2017-01-01"],
                    "cells": [ { "name": "score", "value": 10 } ]
                },
                {
                    "type": "row",
                    "position": 58,
                    "clustering": ["2017-01-02"],
                    "cells": [ { "name": "score", "value": 12.5 } ]
                }
            ]
        },
        {
            "partition": { "key": ["user-2"], "position": 96 },
            "rows": [
                {
                    "type": "row",
                    "position": 127,
                    "clustering": ["2017-02-01"],
                    "cells": [ { "name": "note", "value": "hé \"quoted\"" } ]
                }
            ]
        }
    ])
    .to_string()
}

/// Serialize `(metadata, rows)` pairs as a dump, metadata fields first.
///
/// # Panics
/// Panics if a metadata value is not a JSON object.
#[must_use]
pub fn dump_from_partitions(partitions: Vec<(Value, Vec<Value>)>) -> String {
    let array = partitions
        .into_iter()
        .map(|(meta, rows)| {
            let Value::Object(mut obj) = meta else {
                panic!("partition metadata must be an object, got {meta}");
            };
            obj.insert(ROWS_KEY.to_string(), Value::Array(rows));
            Value::Object(obj)
        })
        .collect();
    Value::Array(array).to_string()
}

/// `partitions` partitions of `rows_per_partition` rows each, with distinct ids.
#[must_use]
pub fn generated_dump(partitions: usize, rows_per_partition: usize) -> String {
    dump_from_partitions(
        (0..partitions)
            .map(|p| {
                let rows = (0..rows_per_partition)
                    .map(|r| json!({ "id": r, "cells": [p, r], "flag": r % 2 == 0 }))
                    .collect();
                (json!({ "key": [format!("k{p}")], "position": p * 100 }), rows)
            })
            .collect(),
    )
}

/// The documents a correct run must produce for `input`, in input order.
///
/// Built from a fully materialized parse, independent of the streaming
/// parser, so it only accepts well-formed dumps.
///
/// # Errors
/// Returns an error if `input` is not a well-formed dump.
pub fn expected_documents(input: &str) -> Result<Vec<Value>> {
    let parsed: Value = serde_json::from_str(input).context("parse input")?;
    let Value::Array(partitions) = parsed else {
        bail!("input is not an array");
    };
    let mut out = Vec::new();
    for partition in partitions {
        let Value::Object(mut fields) = partition else {
            bail!("partition is not an object");
        };
        let Some(Value::Array(rows)) = fields.shift_remove(ROWS_KEY) else {
            bail!("partition has no rows array");
        };
        for row in rows {
            let Value::Object(mut row) = row else {
                bail!("row is not an object");
            };
            row.insert(PARTITION_KEY.to_string(), Value::Object(fields.clone()));
            out.push(Value::Object(row));
        }
    }
    Ok(out)
}

/// Split a flattened document back into `(row, partition)`.
#[must_use]
pub fn split_document(doc: &Value) -> Option<(Map<String, Value>, Map<String, Value>)> {
    let mut row = doc.as_object()?.clone();
    let Value::Object(partition) = row.shift_remove(PARTITION_KEY)? else {
        return None;
    };
    Some((row, partition))
}
