//! Docfill: keyword-driven document mail-merge.
//!
//! Text templates carry `{{ ... }}` placeholders whose first segment
//! selects a data source: `XL` for spreadsheet reads and scans, `INPUT`
//! for interactive fields, `TEMPLATE` for external text inclusion, `JSON`
//! for document lookups, and anything else as a named-range shorthand.
//! The [`resolver::KeywordResolver`] substitutes them all in one pass,
//! turning per-placeholder failures into inline bracketed diagnostics
//! instead of aborting.
//!
//! ```
//! use docfill::excel::{MemoryWorkbook, SpreadsheetAdapter};
//! use docfill::input::DefaultInputProvider;
//! use docfill::resolver::{KeywordResolver, PassOutcome};
//! use docfill::types::ParserConfig;
//!
//! let mut workbook = MemoryWorkbook::new();
//! workbook.set("Sheet1", 1, 1, 1995.0);
//! let excel = SpreadsheetAdapter::from_memory(workbook);
//!
//! let mut resolver = KeywordResolver::new(ParserConfig::default()).with_excel(&excel);
//! let mut provider = DefaultInputProvider;
//! let outcome = resolver.resolve("Total: {{XL!CELL!A1}}", &mut provider)?;
//!
//! let PassOutcome::Completed { text, .. } = outcome else { unreachable!() };
//! assert_eq!(text, "Total: 1,995.00");
//! # Ok::<(), docfill::MergeError>(())
//! ```

pub mod cli;
pub mod error;
pub mod excel;
pub mod input;
pub mod jsonpath;
pub mod resolver;
pub mod scanner;
pub mod table;
pub mod template;
pub mod types;

pub use error::{MergeError, MergeResult, ResolveError};
pub use resolver::{KeywordResolver, PassOutcome};
pub use types::ParserConfig;
