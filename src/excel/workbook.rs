//! The workbook capability: dual computed-value / formula views.
//!
//! [`Workbook`] is the boundary to the spreadsheet file format. The engine
//! only ever reads through it; load/save mechanics stay behind the trait.
//! [`XlsxWorkbook`] backs it with calamine; [`MemoryWorkbook`] is an
//! in-memory implementation for tests and embedders.

use crate::error::{MergeError, MergeResult};
use crate::types::CellValue;
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use std::collections::HashMap;
use std::path::Path;

/// Read-only access to one workbook through two parallel views: computed
/// values and formula/number-format metadata. Coordinates are 1-based.
pub trait Workbook {
    /// Sheet names in document order; the first one is the default sheet.
    fn sheet_names(&self) -> &[String];

    /// Computed value at a coordinate; `CellValue::Empty` when absent.
    fn value(&self, sheet: &str, row: u32, col: u32) -> CellValue;

    /// Raw formula text at a coordinate, without the leading `=`.
    fn formula(&self, sheet: &str, row: u32, col: u32) -> Option<String>;

    /// Number-format string at a coordinate (used for currency detection).
    fn number_format(&self, sheet: &str, row: u32, col: u32) -> Option<String>;

    /// Last populated row of a sheet; downward scans never pass this.
    fn last_row(&self, sheet: &str) -> u32;

    /// Last populated column of a sheet; rightward scans never pass this.
    fn last_col(&self, sheet: &str) -> u32;

    /// Target of a defined name, e.g. `Sheet1!$A$1:$B$2`.
    fn defined_name(&self, name: &str) -> Option<&str>;
}

//==============================================================================
// Calamine-backed workbook
//==============================================================================

/// Workbook view over an `.xlsx` file.
///
/// Both the computed-value range and the formula range of every sheet are
/// loaded once at open; all reads are served from memory afterwards.
/// Calamine does not expose per-cell number formats, so `number_format`
/// always reports none here.
pub struct XlsxWorkbook {
    sheet_names: Vec<String>,
    values: HashMap<String, Range<Data>>,
    formulas: HashMap<String, Range<String>>,
    defined_names: HashMap<String, String>,
}

impl XlsxWorkbook {
    /// Open a workbook file and load every sheet's dual views.
    pub fn open<P: AsRef<Path>>(path: P) -> MergeResult<Self> {
        let path = path.as_ref();
        let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| {
            MergeError::Workbook(format!("failed to open {}: {}", path.display(), e))
        })?;

        let sheet_names = workbook.sheet_names().to_vec();
        let defined_names = workbook
            .defined_names()
            .iter()
            .map(|(name, target)| (name.clone(), target.clone()))
            .collect();

        let mut values = HashMap::new();
        let mut formulas = HashMap::new();
        for name in &sheet_names {
            if let Ok(range) = workbook.worksheet_range(name) {
                values.insert(name.clone(), range);
            }
            if let Ok(range) = workbook.worksheet_formula(name) {
                formulas.insert(name.clone(), range);
            }
        }

        tracing::info!(path = %path.display(), sheets = sheet_names.len(), "opened workbook");
        Ok(Self {
            sheet_names,
            values,
            formulas,
            defined_names,
        })
    }
}

fn convert(data: &Data) -> CellValue {
    match data {
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Empty => CellValue::Empty,
        other => CellValue::Text(other.to_string()),
    }
}

impl Workbook for XlsxWorkbook {
    fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    fn value(&self, sheet: &str, row: u32, col: u32) -> CellValue {
        self.values
            .get(sheet)
            .and_then(|range| range.get_value((row - 1, col - 1)))
            .map(convert)
            .unwrap_or(CellValue::Empty)
    }

    fn formula(&self, sheet: &str, row: u32, col: u32) -> Option<String> {
        self.formulas
            .get(sheet)
            .and_then(|range| range.get_value((row - 1, col - 1)))
            .filter(|f| !f.is_empty())
            .cloned()
    }

    fn number_format(&self, _sheet: &str, _row: u32, _col: u32) -> Option<String> {
        None
    }

    fn last_row(&self, sheet: &str) -> u32 {
        self.values
            .get(sheet)
            .and_then(|range| range.end())
            .map_or(0, |(row, _)| row + 1)
    }

    fn last_col(&self, sheet: &str) -> u32 {
        self.values
            .get(sheet)
            .and_then(|range| range.end())
            .map_or(0, |(_, col)| col + 1)
    }

    fn defined_name(&self, name: &str) -> Option<&str> {
        self.defined_names.get(name).map(String::as_str)
    }
}

//==============================================================================
// In-memory workbook
//==============================================================================

#[derive(Debug, Default)]
struct MemorySheet {
    cells: HashMap<(u32, u32), CellValue>,
    formats: HashMap<(u32, u32), String>,
    formulas: HashMap<(u32, u32), String>,
    last_row: u32,
    last_col: u32,
}

/// In-memory [`Workbook`] with explicit number formats and formulas.
///
/// The primary backend for tests; also useful for embedders that already
/// hold tabular data and want to serve XL placeholders from it.
#[derive(Debug, Default)]
pub struct MemoryWorkbook {
    sheet_names: Vec<String>,
    sheets: HashMap<String, MemorySheet>,
    defined_names: HashMap<String, String>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty sheet; sheet order is insertion order.
    pub fn add_sheet(&mut self, name: &str) {
        if !self.sheets.contains_key(name) {
            self.sheet_names.push(name.to_string());
            self.sheets.insert(name.to_string(), MemorySheet::default());
        }
    }

    /// Set a cell value (1-based coordinates), creating the sheet if needed.
    pub fn set(&mut self, sheet: &str, row: u32, col: u32, value: impl Into<CellValue>) {
        self.add_sheet(sheet);
        let s = self.sheets.get_mut(sheet).expect("sheet just added");
        s.last_row = s.last_row.max(row);
        s.last_col = s.last_col.max(col);
        s.cells.insert((row, col), value.into());
    }

    /// Attach a number-format string to a cell, e.g. `"$#,##0.00"`.
    pub fn set_format(&mut self, sheet: &str, row: u32, col: u32, format: &str) {
        self.add_sheet(sheet);
        let s = self.sheets.get_mut(sheet).expect("sheet just added");
        s.formats.insert((row, col), format.to_string());
    }

    /// Attach raw formula text to a cell.
    pub fn set_formula(&mut self, sheet: &str, row: u32, col: u32, formula: &str) {
        self.add_sheet(sheet);
        let s = self.sheets.get_mut(sheet).expect("sheet just added");
        s.formulas.insert((row, col), formula.to_string());
    }

    /// Register a defined name with a `Sheet!A1:B2`-style target.
    pub fn define_name(&mut self, name: &str, target: &str) {
        self.defined_names.insert(name.to_string(), target.to_string());
    }
}

impl Workbook for MemoryWorkbook {
    fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    fn value(&self, sheet: &str, row: u32, col: u32) -> CellValue {
        self.sheets
            .get(sheet)
            .and_then(|s| s.cells.get(&(row, col)))
            .cloned()
            .unwrap_or(CellValue::Empty)
    }

    fn formula(&self, sheet: &str, row: u32, col: u32) -> Option<String> {
        self.sheets
            .get(sheet)
            .and_then(|s| s.formulas.get(&(row, col)))
            .cloned()
    }

    fn number_format(&self, sheet: &str, row: u32, col: u32) -> Option<String> {
        self.sheets
            .get(sheet)
            .and_then(|s| s.formats.get(&(row, col)))
            .cloned()
    }

    fn last_row(&self, sheet: &str) -> u32 {
        self.sheets.get(sheet).map_or(0, |s| s.last_row)
    }

    fn last_col(&self, sheet: &str) -> u32 {
        self.sheets.get(sheet).map_or(0, |s| s.last_col)
    }

    fn defined_name(&self, name: &str) -> Option<&str> {
        self.defined_names.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_workbook_round_trip() {
        let mut wb = MemoryWorkbook::new();
        wb.set("Sheet1", 1, 1, 42.0);
        wb.set("Sheet1", 2, 1, "hello");
        wb.set_format("Sheet1", 1, 1, "$#,##0.00");
        wb.set_formula("Sheet1", 1, 1, "SUM(B1:B9)");

        assert_eq!(wb.sheet_names(), &["Sheet1".to_string()]);
        assert_eq!(wb.formula("Sheet1", 1, 1).as_deref(), Some("SUM(B1:B9)"));
        assert_eq!(wb.formula("Sheet1", 2, 1), None);
        assert_eq!(wb.value("Sheet1", 1, 1), CellValue::Number(42.0));
        assert_eq!(wb.value("Sheet1", 2, 1), CellValue::Text("hello".into()));
        assert_eq!(wb.value("Sheet1", 3, 1), CellValue::Empty);
        assert_eq!(wb.number_format("Sheet1", 1, 1).as_deref(), Some("$#,##0.00"));
        assert_eq!(wb.last_row("Sheet1"), 2);
        assert_eq!(wb.last_col("Sheet1"), 1);
    }

    #[test]
    fn test_sheet_order_is_insertion_order() {
        let mut wb = MemoryWorkbook::new();
        wb.add_sheet("Data");
        wb.add_sheet("Summary");
        wb.add_sheet("Data"); // no duplicate
        assert_eq!(wb.sheet_names(), &["Data".to_string(), "Summary".to_string()]);
    }
}
