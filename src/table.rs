//! Table presentation: host-document insertion requests and the aligned
//! plain-text fallback. Both renderings derive from the same padded
//! [`RangeMatrix`].

use crate::error::ResolveError;
use crate::types::{looks_numeric, RangeMatrix};

/// Reserved marker returned in place of table content when the table was
/// inserted structurally into the host document. Callers must special-case
/// this value instead of splicing it as text.
pub const TABLE_SENTINEL: &str = "[TABLE_INSERTED]";

/// Shading for the header row.
pub const HEADER_FILL: &str = "D9D9D9";
/// Shading for alternating body rows.
pub const STRIPE_FILL: &str = "F5F5F5";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
}

/// Styling hints for one table cell. The synthesizer speaks only in these
/// terms; turning them into actual markup is the document's business.
#[derive(Debug, Clone, PartialEq)]
pub struct CellStyle {
    pub bold: bool,
    /// RRGGBB fill, e.g. `D9D9D9`.
    pub background: Option<&'static str>,
    pub alignment: Alignment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    pub text: String,
    pub style: CellStyle,
}

/// A fully-styled table-insertion request: one row per matrix row, one
/// column per matrix column.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSpec {
    pub rows: Vec<Vec<TableCell>>,
}

impl TableSpec {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }
}

/// Where an inserted table belongs: the placeholder's byte span within
/// the text fragment being resolved, plus the insertion's ordinal within
/// the pass. Spans of nested fragments are relative to their fragment,
/// so the ordinal is what tells same-shaped insertions apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableAnchor {
    pub start: usize,
    pub end: usize,
    pub ordinal: usize,
}

impl TableAnchor {
    pub fn new(start: usize, end: usize, ordinal: usize) -> Self {
        Self {
            start,
            end,
            ordinal,
        }
    }
}

/// Document-mutation capability: the host exposes "insert this table at
/// this location". Hosts without one get the plain-text rendering
/// instead.
pub trait DocumentSink {
    fn insert_table(&mut self, anchor: TableAnchor, spec: TableSpec);
}

/// Turns a rectangular data matrix into either a host-table insertion or
/// a formatted plain-text table.
pub struct TableSynthesizer;

impl TableSynthesizer {
    /// Present a matrix. With a sink, request insertion at the anchor and
    /// return the sentinel; without one, return the aligned text table.
    pub fn present(
        matrix: &RangeMatrix,
        sink: Option<&mut dyn DocumentSink>,
        anchor: TableAnchor,
    ) -> String {
        if matrix.is_empty() {
            return ResolveError::TableEmpty.to_string();
        }
        match sink {
            Some(sink) => {
                sink.insert_table(anchor, Self::build_spec(matrix));
                TABLE_SENTINEL.to_string()
            }
            None => Self::render_text(matrix),
        }
    }

    /// Build the styled insertion request: bold shaded header, right-
    /// aligned numeric cells, alternating body-row shading.
    pub fn build_spec(matrix: &RangeMatrix) -> TableSpec {
        let rows = matrix
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.iter()
                    .map(|cell| {
                        let header = i == 0;
                        let background = if header {
                            Some(HEADER_FILL)
                        } else if i % 2 == 1 {
                            Some(STRIPE_FILL)
                        } else {
                            None
                        };
                        let alignment = if !header && looks_numeric(cell) {
                            Alignment::Right
                        } else {
                            Alignment::Left
                        };
                        TableCell {
                            text: cell.clone(),
                            style: CellStyle {
                                bold: header,
                                background,
                                alignment,
                            },
                        }
                    })
                    .collect()
            })
            .collect();
        TableSpec { rows }
    }

    /// Aligned plain-text rendering: numeric cells right-justified, a
    /// dashed rule after the header sized to the column widths.
    pub fn render_text(matrix: &RangeMatrix) -> String {
        let widths = matrix.column_widths();
        let mut lines = Vec::new();

        for (i, row) in matrix.rows().iter().enumerate() {
            let rendered: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, width)| {
                    if looks_numeric(cell) {
                        format!("{cell:>width$}")
                    } else {
                        format!("{cell:<width$}")
                    }
                })
                .collect();
            lines.push(rendered.join(" | "));

            if i == 0 && matrix.row_count() > 1 {
                let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
                lines.push(rule.join("-+-"));
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[&[&str]]) -> RangeMatrix {
        RangeMatrix::new(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    struct RecordingSink {
        inserted: Vec<(TableAnchor, TableSpec)>,
    }

    impl DocumentSink for RecordingSink {
        fn insert_table(&mut self, anchor: TableAnchor, spec: TableSpec) {
            self.inserted.push((anchor, spec));
        }
    }

    #[test]
    fn test_present_with_sink_returns_sentinel() {
        let m = matrix(&[&["Item", "Cost"], &["Widget", "1,000.00"]]);
        let mut sink = RecordingSink { inserted: vec![] };
        let out = TableSynthesizer::present(&m, Some(&mut sink), TableAnchor::new(4, 27, 0));
        assert_eq!(out, TABLE_SENTINEL);
        assert_eq!(sink.inserted.len(), 1);
        let (anchor, spec) = &sink.inserted[0];
        assert_eq!(*anchor, TableAnchor::new(4, 27, 0));
        assert_eq!(spec.row_count(), 2);
        assert_eq!(spec.col_count(), 2);
    }

    #[test]
    fn test_spec_styles() {
        let m = matrix(&[&["Item", "Cost"], &["Widget", "12.50"], &["Bolt", "3.00"]]);
        let spec = TableSynthesizer::build_spec(&m);

        // Header: bold, shaded, left-aligned even when numeric-looking.
        assert!(spec.rows[0][0].style.bold);
        assert_eq!(spec.rows[0][0].style.background, Some(HEADER_FILL));

        // First body row gets the stripe; numeric cells right-align.
        assert_eq!(spec.rows[1][0].style.background, Some(STRIPE_FILL));
        assert_eq!(spec.rows[1][1].style.alignment, Alignment::Right);
        assert_eq!(spec.rows[1][0].style.alignment, Alignment::Left);

        // Second body row unshaded.
        assert_eq!(spec.rows[2][0].style.background, None);
    }

    #[test]
    fn test_render_text_alignment_and_rule() {
        let m = matrix(&[&["Item", "Cost"], &["Widget", "1,000.00"]]);
        let text = TableSynthesizer::render_text(&m);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Item   | Cost    ");
        assert_eq!(lines[1], "-------+---------");
        assert_eq!(lines[2], "Widget | 1,000.00");
    }

    #[test]
    fn test_present_empty_matrix() {
        let m = RangeMatrix::new(vec![]);
        assert_eq!(
            TableSynthesizer::present(&m, None, TableAnchor::new(0, 0, 0)),
            "[Empty table data]"
        );
    }
}
