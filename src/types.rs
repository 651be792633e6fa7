use std::collections::HashMap;

//==============================================================================
// Parser configuration
//==============================================================================

/// Configuration for the placeholder grammar.
///
/// The separator character between placeholder segments changed across
/// grammar versions (`:` in early documents, `!` today), so it is a
/// parameter rather than a constant. One deployment uses one separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Segment separator inside `{{ ... }}` placeholders.
    pub separator: char,
    /// Maximum depth for nested placeholder resolution (template VARS,
    /// dynamic JSON keys, included template content).
    pub recursion_limit: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            separator: '!',
            recursion_limit: 8,
        }
    }
}

impl ParserConfig {
    /// Config for the legacy `:`-separated grammar.
    pub fn with_separator(separator: char) -> Self {
        Self {
            separator,
            ..Self::default()
        }
    }
}

//==============================================================================
// Cell values
//==============================================================================

/// Raw scalar read from the workbook's computed-value view.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Bool(bool),
    Empty,
}

impl CellValue {
    /// Empty cells and empty strings both terminate downward scans.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

//==============================================================================
// Range matrix
//==============================================================================

/// Row-major grid of formatted cell values.
///
/// Rows are padded to the longest row's length at construction, so both
/// the table-insertion and the plain-text rendering see the same
/// rectangular data.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeMatrix {
    rows: Vec<Vec<String>>,
}

impl RangeMatrix {
    pub fn new(mut rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.col_count() == 0
    }

    /// Per-column width: the max rendered-string length in each column.
    pub fn column_widths(&self) -> Vec<usize> {
        let mut widths = vec![0; self.col_count()];
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.len());
            }
        }
        widths
    }
}

/// Whether a rendered cell should be treated as numeric for alignment.
///
/// Currency symbols and thousands separators are stripped before the
/// parse attempt, matching the formatting the adapter produces.
pub fn looks_numeric(s: &str) -> bool {
    let stripped: String = s
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | '¥' | ','))
        .collect();
    !stripped.trim().is_empty() && stripped.trim().parse::<f64>().is_ok()
}

//==============================================================================
// Session context
//==============================================================================

/// Per-pass state for one document-processing session.
///
/// Holds the INPUT descriptor→value map collected in the batch round-trip.
/// Passed explicitly into the resolver; there is no ambient session store.
#[derive(Debug, Default, Clone)]
pub struct SessionContext {
    /// Collected input values, keyed by the raw placeholder argument string.
    pub input_values: HashMap<String, String>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_pads_ragged_rows() {
        let m = RangeMatrix::new(vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["c".to_string()],
        ]);
        assert_eq!(m.col_count(), 2);
        assert_eq!(m.rows()[1], vec!["c".to_string(), String::new()]);
    }

    #[test]
    fn test_looks_numeric() {
        assert!(looks_numeric("1,234.50"));
        assert!(looks_numeric("$1,234.50"));
        assert!(looks_numeric("-42"));
        assert!(!looks_numeric("Total"));
        assert!(!looks_numeric(""));
    }

    #[test]
    fn test_cell_value_empty() {
        assert!(CellValue::Empty.is_empty());
        assert!(CellValue::Text(String::new()).is_empty());
        assert!(!CellValue::Number(0.0).is_empty());
    }
}
