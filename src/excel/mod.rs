//! Spreadsheet access: workbook views, reference parsing, and the scan
//! operations behind XL placeholders.

pub mod adapter;
pub mod reference;
pub mod workbook;

pub use adapter::{format_number, format_value, SpreadsheetAdapter};
pub use reference::CellRef;
pub use workbook::{MemoryWorkbook, Workbook, XlsxWorkbook};
