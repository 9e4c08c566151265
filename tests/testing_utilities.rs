//! The helpers in `fss::testing`.

use anyhow::Result;
use fss::testing::*;
use serde_json::json;

#[test]
fn sample_dump_shape() -> Result<()> {
    let docs = expected_documents(&sample_dump())?;

    assert_eq!(docs.len(), 3);
    assert_all_have_partition(&docs);
    assert_eq!(docs[0]["partition"]["partition"]["key"], json!(["user-1"]));
    assert_eq!(docs[2]["cells"][0]["value"], "hé \"quoted\"");
    Ok(())
}

#[test]
fn generated_dump_is_distinct_per_row() -> Result<()> {
    let docs = expected_documents(&generated_dump(3, 4))?;

    assert_eq!(docs.len(), 12);
    for (i, a) in docs.iter().enumerate() {
        for b in &docs[i + 1..] {
            assert_ne!(a, b);
        }
    }
    Ok(())
}

#[test]
fn dump_from_partitions_puts_rows_last() -> Result<()> {
    let dump = dump_from_partitions(vec![(json!({"key": "k", "z": 1}), vec![json!({"a": 1})])]);

    assert_eq!(dump, r#"[{"key":"k","z":1,"rows":[{"a":1}]}]"#);
    Ok(())
}

#[test]
fn split_document_inverts_flattening() {
    let doc = json!({"a": 1, "partition": {"key": "k"}});
    let (row, partition) = split_document(&doc).expect("has partition");

    assert_eq!(serde_json::Value::Object(row), json!({"a": 1}));
    assert_eq!(serde_json::Value::Object(partition), json!({"key": "k"}));
    assert!(split_document(&json!({"a": 1})).is_none());
    assert!(split_document(&json!({"partition": 3})).is_none());
}

#[test]
fn output_lines_requires_trailing_newline() -> Result<()> {
    assert!(output_lines(b"")?.is_empty());
    assert_eq!(output_lines(b"{}\n{\"a\":1}\n")?, vec!["{}", "{\"a\":1}"]);
    assert!(output_lines(b"{}").is_err());
    Ok(())
}

#[test]
fn flatten_str_matches_reference_model() -> Result<()> {
    let input = sample_dump();
    assert_documents_unordered_equal(&flatten_str(&input)?, &expected_documents(&input)?);
    Ok(())
}

#[test]
#[should_panic(expected = "Document content mismatch")]
fn unordered_equal_detects_differences() {
    assert_documents_unordered_equal(&[json!({"a": 1})], &[json!({"a": 2})]);
}

#[test]
#[should_panic(expected = "not compact")]
fn compact_lines_rejects_whitespace() {
    assert_compact_lines(&[r#"{"a": 1}"#]);
}
