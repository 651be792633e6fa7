//! Spreadsheet data adapter: cell/range reads and the downward/rightward
//! scan operations that locate totals and item lists.

use crate::error::{MergeResult, ResolveError};
use crate::excel::reference::{self, CellRef};
use crate::excel::workbook::{MemoryWorkbook, Workbook, XlsxWorkbook};
use crate::types::{CellValue, RangeMatrix};
use std::path::Path;
use tracing::{debug, warn};

const CURRENCY_SYMBOLS: [char; 4] = ['$', '€', '£', '¥'];

/// Wraps exactly one open workbook for the duration of one
/// document-processing session. All reads are served from it; dropping the
/// adapter releases the workbook.
pub struct SpreadsheetAdapter {
    workbook: Box<dyn Workbook>,
}

impl SpreadsheetAdapter {
    pub fn new(workbook: Box<dyn Workbook>) -> Self {
        Self { workbook }
    }

    /// Open an `.xlsx` file for the session.
    pub fn open_xlsx<P: AsRef<Path>>(path: P) -> MergeResult<Self> {
        Ok(Self::new(Box::new(XlsxWorkbook::open(path)?)))
    }

    /// Wrap an in-memory workbook.
    pub fn from_memory(workbook: MemoryWorkbook) -> Self {
        Self::new(Box::new(workbook))
    }

    pub fn sheet_names(&self) -> &[String] {
        self.workbook.sheet_names()
    }

    /// True if a sheet with this name exists (case-insensitive).
    pub fn has_sheet(&self, name: &str) -> bool {
        let lower = name.trim_matches('\'').to_lowercase();
        self.workbook
            .sheet_names()
            .iter()
            .any(|s| s.to_lowercase() == lower)
    }

    /// Map an optional requested sheet name to the workbook's canonical
    /// name. Absent name means the first sheet in document order.
    pub fn resolve_sheet(&self, requested: Option<&str>) -> Result<String, ResolveError> {
        match requested {
            None => self
                .workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| ResolveError::SheetNotFound("(empty workbook)".to_string())),
            Some(name) => {
                let lower = name.trim_matches('\'').to_lowercase();
                self.workbook
                    .sheet_names()
                    .iter()
                    .find(|s| s.to_lowercase() == lower)
                    .cloned()
                    .ok_or_else(|| ResolveError::SheetNotFound(name.to_string()))
            }
        }
    }

    /// Target range of a defined name, if the workbook has one.
    pub fn defined_target(&self, name: &str) -> Option<&str> {
        self.workbook.defined_name(name)
    }

    /// Read one cell's computed value as a formatted string.
    pub fn read_cell(&self, sheet: Option<&str>, reference: &str) -> Result<String, ResolveError> {
        let (sheet, cell) = self.locate(sheet, reference)?;
        let value = self.formatted(&sheet, cell.row, cell.col);
        debug!(sheet, cell = %cell.to_a1(), value, "read cell");
        Ok(value)
    }

    /// Read a rectangular `A1:C3` range as a matrix of formatted values.
    pub fn read_range(&self, sheet: Option<&str>, reference: &str) -> Result<RangeMatrix, ResolveError> {
        let (embedded, rest) = reference::split_sheet(reference.trim());
        let sheet = self.resolve_sheet(embedded.or(sheet))?;
        let (start, end) = reference::parse_range(rest)?;
        Ok(self.read_rect(&sheet, start, end))
    }

    fn read_rect(&self, sheet: &str, start: CellRef, end: CellRef) -> RangeMatrix {
        let mut rows = Vec::new();
        for row in start.row..=end.row {
            let mut cells = Vec::new();
            for col in start.col..=end.col {
                cells.push(self.formatted(sheet, row, col));
            }
            rows.push(cells);
        }
        debug!(sheet, from = %start.to_a1(), to = %end.to_a1(), "read range");
        RangeMatrix::new(rows)
    }

    /// Scan strictly downward from a start cell and return the last
    /// non-empty value before the first empty cell. Reaching the sheet's
    /// last row while holding a value returns that value; a scan that never
    /// sees a value returns `None`.
    pub fn read_total(&self, sheet: Option<&str>, reference: &str) -> Result<Option<String>, ResolveError> {
        let (sheet, start) = self.locate(sheet, reference)?;
        let last_row = self.workbook.last_row(&sheet);

        let mut last_seen: Option<u32> = None;
        for row in start.row..=last_row.max(start.row) {
            let value = self.workbook.value(&sheet, row, start.col);
            if value.is_empty() {
                if last_seen.is_some() {
                    break;
                }
            } else {
                last_seen = Some(row);
            }
        }

        Ok(last_seen.map(|row| {
            let value = self.formatted(&sheet, row, start.col);
            debug!(sheet, cell = %CellRef::new(row, start.col).to_a1(), value, "found total");
            value
        }))
    }

    /// Collect values downward from a start cell until the first empty cell
    /// (exclusive), then drop `offset` items from the end.
    pub fn read_items(
        &self,
        sheet: Option<&str>,
        reference: &str,
        offset: usize,
    ) -> Result<Vec<String>, ResolveError> {
        let (sheet, start) = self.locate(sheet, reference)?;
        Ok(self.items_below(&sheet, start, offset))
    }

    fn items_below(&self, sheet: &str, start: CellRef, offset: usize) -> Vec<String> {
        let last_row = self.workbook.last_row(sheet);
        let mut items = Vec::new();
        for row in start.row..=last_row.max(start.row) {
            if self.workbook.value(sheet, row, start.col).is_empty() {
                break;
            }
            items.push(self.formatted(sheet, row, start.col));
        }
        items.truncate(items.len().saturating_sub(offset));
        debug!(sheet, from = %start.to_a1(), count = items.len(), offset, "read items");
        items
    }

    /// Scan rightward along a header row for a case-insensitive title
    /// match, then read the total of the matched column starting one row
    /// below. `Err(TitleNotFound)` when no header matches.
    pub fn read_title_total(
        &self,
        sheet: Option<&str>,
        reference: &str,
        title: &str,
    ) -> Result<Option<String>, ResolveError> {
        let (sheet, start) = self.locate(sheet, reference)?;
        let last_col = self.workbook.last_col(&sheet);

        let title_col = (start.col..=last_col.max(start.col)).find(|col| {
            matches!(
                self.workbook.value(&sheet, start.row, *col),
                CellValue::Text(ref s) if s.to_lowercase() == title.to_lowercase()
            )
        });
        let Some(col) = title_col else {
            warn!(sheet, title, row = start.row, "title not found");
            return Err(ResolveError::TitleNotFound(title.to_string()));
        };

        debug!(sheet, title, column = %reference::column_letter(col), "found title");
        self.read_total(Some(&sheet), &CellRef::new(start.row + 1, col).to_a1())
    }

    /// Collect several columns side by side into one matrix with the header
    /// values as the first row. Selectors are comma-separated: either
    /// direct cell references of the header cells, or (when `use_titles`)
    /// titles to locate in `start_row`. Short columns are padded with
    /// empty values.
    pub fn read_columns(
        &self,
        sheet: &str,
        selectors: &str,
        use_titles: bool,
        start_row: Option<u32>,
    ) -> Result<RangeMatrix, ResolveError> {
        let sheet = self.resolve_sheet(Some(sheet))?;
        let selectors: Vec<&str> = selectors.split(',').map(str::trim).collect();

        let mut headers = Vec::new();
        let mut columns: Vec<Vec<String>> = Vec::new();

        for selector in selectors {
            if use_titles {
                let title_row = start_row.unwrap_or(1);
                let last_col = self.workbook.last_col(&sheet);
                let found = (1..=last_col.max(1)).find(|col| {
                    matches!(
                        self.workbook.value(&sheet, title_row, *col),
                        CellValue::Text(ref s) if s.to_lowercase() == selector.to_lowercase()
                    )
                });
                let Some(col) = found else {
                    warn!(sheet, title = selector, row = title_row, "column title not found, skipping");
                    continue;
                };
                headers.push(selector.to_string());
                columns.push(self.items_below(&sheet, CellRef::new(title_row + 1, col), 0));
            } else {
                let cell = reference::parse_cell(selector)?;
                headers.push(self.formatted(&sheet, cell.row, cell.col));
                columns.push(self.items_below(&sheet, CellRef::new(cell.row + 1, cell.col), 0));
            }
        }

        let depth = columns.iter().map(Vec::len).max().unwrap_or(0);
        let mut rows = vec![headers];
        for i in 0..depth {
            rows.push(
                columns
                    .iter()
                    .map(|col| col.get(i).cloned().unwrap_or_default())
                    .collect(),
            );
        }
        Ok(RangeMatrix::new(rows))
    }

    /// Resolve sheet + A1 literal (the literal may embed its own sheet
    /// name, which takes precedence) into canonical coordinates.
    fn locate(&self, sheet: Option<&str>, reference: &str) -> Result<(String, CellRef), ResolveError> {
        let (embedded, rest) = reference::split_sheet(reference.trim());
        let sheet = self.resolve_sheet(embedded.or(sheet))?;
        let cell = reference::parse_cell(rest)?;
        Ok((sheet, cell))
    }

    /// Formatted string form of a cell: numbers get thousands separators
    /// and two decimals, plus a currency prefix when the cell's
    /// number-format string carries a currency symbol.
    fn formatted(&self, sheet: &str, row: u32, col: u32) -> String {
        let value = self.workbook.value(sheet, row, col);
        let currency = self
            .workbook
            .number_format(sheet, row, col)
            .is_some_and(|f| f.contains(&CURRENCY_SYMBOLS[..]));
        format_value(&value, currency)
    }
}

/// Render a cell scalar. Non-numeric values pass through unchanged.
pub fn format_value(value: &CellValue, currency: bool) -> String {
    match value {
        CellValue::Number(n) => {
            let formatted = format_number(*n);
            if currency {
                format!("${formatted}")
            } else {
                formatted
            }
        }
        CellValue::Text(s) => s.clone(),
        CellValue::Bool(b) => b.to_string(),
        CellValue::Empty => String::new(),
    }
}

/// Thousands separators and exactly two decimal places.
pub fn format_number(n: f64) -> String {
    let rendered = format!("{:.2}", n.abs());
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((rendered.as_str(), "00"));

    let mut grouped = String::new();
    let digits = int_part.len();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (digits - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if n < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SpreadsheetAdapter {
        let mut wb = MemoryWorkbook::new();
        // Column A: three-value run to the last row.
        wb.set("S", 1, 1, "A");
        wb.set("S", 2, 1, "B");
        wb.set("S", 3, 1, "C");
        // Column B: run of two, a gap, then a stray value.
        wb.set("S", 1, 2, 10.0);
        wb.set("S", 2, 2, 20.0);
        wb.set("S", 4, 2, 99.0);
        SpreadsheetAdapter::from_memory(wb)
    }

    #[test]
    fn test_read_items_offsets() {
        let adapter = sample();
        let items = |offset| adapter.read_items(Some("S"), "A1", offset).unwrap();
        assert_eq!(items(0), vec!["A", "B", "C"]);
        assert_eq!(items(1), vec!["A", "B"]);
        assert_eq!(items(9), Vec::<String>::new());
    }

    #[test]
    fn test_read_total_stops_at_first_gap() {
        let adapter = sample();
        assert_eq!(
            adapter.read_total(Some("S"), "B1").unwrap(),
            Some("20.00".to_string())
        );
    }

    #[test]
    fn test_read_total_runs_to_sheet_end() {
        let adapter = sample();
        assert_eq!(
            adapter.read_total(Some("S"), "A1").unwrap(),
            Some("C".to_string())
        );
    }

    #[test]
    fn test_read_total_without_values_is_none() {
        let adapter = sample();
        assert_eq!(adapter.read_total(Some("S"), "D1").unwrap(), None);
    }

    #[test]
    fn test_read_columns_pads_ragged_columns() {
        let adapter = sample();
        // Column A runs two rows below its header, column B only one:
        // every row of the longest column appears and the short column
        // fills with empty values.
        let matrix = adapter.read_columns("S", "A1,B1", false, None).unwrap();
        assert_eq!(matrix.row_count(), 3);
        assert_eq!(matrix.rows()[0], vec!["A", "10.00"]);
        assert_eq!(matrix.rows()[1], vec!["B", "20.00"]);
        assert_eq!(matrix.rows()[2], vec!["C", ""]);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1234.5), "1,234.50");
        assert_eq!(format_number(0.0), "0.00");
        assert_eq!(format_number(999.999), "1,000.00");
        assert_eq!(format_number(-1234567.891), "-1,234,567.89");
        assert_eq!(format_number(12.0), "12.00");
    }

    #[test]
    fn test_format_value_currency() {
        assert_eq!(format_value(&CellValue::Number(1234.5), true), "$1,234.50");
        assert_eq!(format_value(&CellValue::Number(1234.5), false), "1,234.50");
        // Non-numeric values pass through even with a currency format.
        assert_eq!(format_value(&CellValue::Text("n/a".into()), true), "n/a");
        assert_eq!(format_value(&CellValue::Empty, true), "");
    }
}
