//! Helpers for testing code that produces or consumes flattened dumps.
//!
//! - **Mock I/O**: [`MemoryInput`] feeds the pipeline from a byte buffer,
//!   [`flatten_str`] runs a whole pipeline into memory.
//! - **Fixtures**: [`sample_dump`] and [`dump_from_partitions`] build
//!   `sstabledump`-shaped input.
//! - **Assertions**: output order is not defined, so comparisons are
//!   order-insensitive ([`assert_documents_unordered_equal`]); every line can
//!   be checked for minimal encoding with [`assert_compact_lines`].
//!
//! # Quick Start
//!
//! ```
//! use fss::testing::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let input = r#"[{"key":"k1","rows":[{"a":1}]}]"#;
//! let docs = flatten_str(input)?;
//! assert_documents_unordered_equal(&docs, &expected_documents(input)?);
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod mock_io;

pub use assertions::*;
pub use fixtures::*;
pub use mock_io::*;
