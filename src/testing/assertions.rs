//! Assertions for flattened output.
//!
//! Rows leave the pipeline in whatever order the encoders finish them, so
//! everything here compares multisets.

use serde_json::Value;

/// Assert that `actual` and `expected` hold the same documents, ignoring order.
///
/// Object key order is not significant either.
///
/// # Panics
/// Panics with the unmatched documents on either side.
///
/// # Example
///
/// ```
/// use fss::testing::assert_documents_unordered_equal;
/// use serde_json::json;
///
/// let actual = vec![json!({"b": 2}), json!({"a": 1})];
/// let expected = vec![json!({"a": 1}), json!({"b": 2})];
/// assert_documents_unordered_equal(&actual, &expected);
/// ```
pub fn assert_documents_unordered_equal(actual: &[Value], expected: &[Value]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Document count mismatch:\n  Expected: {}\n  Actual: {}\n  Expected documents: {expected:?}\n  Actual documents: {actual:?}",
        expected.len(),
        actual.len()
    );

    let mut unmatched: Vec<&Value> = expected.iter().collect();
    let mut extra = Vec::new();
    for doc in actual {
        match unmatched.iter().position(|e| *e == doc) {
            Some(i) => {
                unmatched.swap_remove(i);
            }
            None => extra.push(doc),
        }
    }

    assert!(
        unmatched.is_empty() && extra.is_empty(),
        "Document content mismatch:\n  Missing: {unmatched:?}\n  Extra: {extra:?}"
    );
}

/// Assert that every line is a JSON object printed without insignificant
/// whitespace.
///
/// # Panics
/// Panics on the first line that does not parse or is not minimal.
pub fn assert_compact_lines<S: AsRef<str>>(lines: &[S]) {
    for (i, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        let parsed: Value = serde_json::from_str(line)
            .unwrap_or_else(|e| panic!("line {i} is not valid JSON ({e}): {line}"));
        assert!(parsed.is_object(), "line {i} is not an object: {line}");
        let compact = serde_json::to_string(&parsed)
            .unwrap_or_else(|e| panic!("line {i} cannot be re-encoded ({e}): {line}"));
        assert_eq!(line, compact, "line {i} is not compact");
    }
}

/// Assert that every document carries an object under `partition`.
///
/// # Panics
/// Panics on the first document without one.
pub fn assert_all_have_partition(docs: &[Value]) {
    for (i, doc) in docs.iter().enumerate() {
        assert!(
            doc.get(crate::document::PARTITION_KEY)
                .is_some_and(Value::is_object),
            "document {i} has no partition object: {doc}"
        );
    }
}
