//! Keyword resolution: placeholder classification, dispatch to the data
//! adapters, and the two-pass collect-then-substitute protocol.

use crate::error::{MergeResult, ResolveError};
use crate::excel::SpreadsheetAdapter;
use crate::input::{InputFieldDescriptor, InputOutcome, InputProvider};
use crate::jsonpath;
use crate::scanner::{KeywordType, Placeholder, PlaceholderScanner};
use crate::table::{DocumentSink, TableAnchor, TableSynthesizer, TABLE_SENTINEL};
use crate::template::{TemplateDirective, TemplateReference, TemplateIncluder};
use crate::types::{ParserConfig, RangeMatrix, SessionContext};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// Result of one resolution pass over a body of text.
#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    /// Every placeholder was substituted (failures as inline diagnostics).
    Completed { text: String, resolved: usize },
    /// The input provider has not submitted yet. No output was produced;
    /// retry later with the identical input text.
    Pending { fields: Vec<InputFieldDescriptor> },
}

/// Parses placeholder content, classifies it, and dispatches to the
/// spreadsheet adapter, the JSONPath evaluator, the template includer, and
/// the input-provider protocol.
///
/// One resolver serves one document-processing session; the spreadsheet
/// adapter it borrows wraps exactly one open workbook for that session.
pub struct KeywordResolver<'a> {
    config: ParserConfig,
    scanner: PlaceholderScanner,
    excel: Option<&'a SpreadsheetAdapter>,
    includer: TemplateIncluder<'a>,
    sink: Option<&'a mut dyn DocumentSink>,
    /// Span of the placeholder currently being resolved; anchors table
    /// insertions.
    current_span: (usize, usize),
    /// Tables inserted so far in this pass.
    table_ordinal: usize,
}

impl<'a> KeywordResolver<'a> {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            scanner: PlaceholderScanner::new(),
            excel: None,
            includer: TemplateIncluder::new(),
            sink: None,
            current_span: (0, 0),
            table_ordinal: 0,
        }
    }

    /// Attach the spreadsheet adapter serving XL placeholders.
    pub fn with_excel(mut self, excel: &'a SpreadsheetAdapter) -> Self {
        self.excel = Some(excel);
        self
    }

    /// Attach the template includer (catalog and section locator ride
    /// along inside it).
    pub fn with_includer(mut self, includer: TemplateIncluder<'a>) -> Self {
        self.includer = includer;
        self
    }

    /// Attach a document-mutation target; tabular results then become
    /// structural table insertions instead of text tables.
    pub fn with_sink(mut self, sink: &'a mut dyn DocumentSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Run one full resolution pass over `input`.
    ///
    /// Pass 1 collects every INPUT descriptor (deduplicated by raw
    /// argument string, in document order) and hands the batch to the
    /// provider. A pending provider aborts the pass: no output, retry
    /// with the same text. Pass 2 substitutes every placeholder,
    /// dispatching by keyword type; failed placeholders appear as
    /// bracketed diagnostics while the rest of the document fills in.
    pub fn resolve(
        &mut self,
        input: &str,
        provider: &mut dyn InputProvider,
    ) -> MergeResult<PassOutcome> {
        let placeholders = self.scanner.scan(input);
        if placeholders.is_empty() {
            return Ok(PassOutcome::Completed {
                text: input.to_string(),
                resolved: 0,
            });
        }

        self.table_ordinal = 0;
        let fields = self.collect_input_fields(&placeholders);
        let mut session = SessionContext::new();
        if !fields.is_empty() {
            match provider.collect(&fields)? {
                InputOutcome::Pending => {
                    debug!(fields = fields.len(), "input not submitted, pass yields no output");
                    return Ok(PassOutcome::Pending { fields });
                }
                InputOutcome::Submitted(values) => session.input_values = values,
            }
        }

        let resolved = placeholders.len();
        let text = self.substitute(input, &placeholders, &session, 0);
        Ok(PassOutcome::Completed { text, resolved })
    }

    /// Pass 1: ordered, deduplicated INPUT descriptors.
    fn collect_input_fields(&self, placeholders: &[Placeholder]) -> Vec<InputFieldDescriptor> {
        let mut fields = Vec::new();
        let mut seen = HashSet::new();
        for placeholder in placeholders {
            let first = placeholder
                .content
                .split(self.config.separator)
                .next()
                .unwrap_or("");
            if KeywordType::classify(first) != KeywordType::Input {
                continue;
            }
            if !seen.insert(placeholder.content.clone()) {
                continue;
            }
            match InputFieldDescriptor::parse(&placeholder.content, self.config.separator) {
                Ok(field) => fields.push(field),
                // Malformed INPUT placeholders become diagnostics in pass 2.
                Err(e) => warn!(content = %placeholder.content, error = %e, "skipping input field"),
            }
        }
        fields
    }

    /// Replace each placeholder span with its resolved value. The table
    /// sentinel is structural: the span is removed, and when the
    /// placeholder was the entire unit the whole unit's text is cleared.
    fn substitute(
        &mut self,
        text: &str,
        placeholders: &[Placeholder],
        session: &SessionContext,
        depth: usize,
    ) -> String {
        let whole_unit = placeholders.len() == 1
            && text.trim() == &text[placeholders[0].start..placeholders[0].end];

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for placeholder in placeholders {
            out.push_str(&text[last..placeholder.start]);
            self.current_span = (placeholder.start, placeholder.end);
            let value = self.resolve_content(&placeholder.content, session, depth);
            if value == TABLE_SENTINEL {
                if whole_unit {
                    return String::new();
                }
            } else {
                out.push_str(&value);
            }
            last = placeholder.end;
        }
        out.push_str(&text[last..]);
        out
    }

    /// Re-entry point for fragments produced during resolution (template
    /// content, VARS values, dynamic JSON arguments).
    fn resolve_fragment(&mut self, text: &str, session: &SessionContext, depth: usize) -> String {
        let placeholders = self.scanner.scan(text);
        if placeholders.is_empty() {
            return text.to_string();
        }
        self.substitute(text, &placeholders, session, depth)
    }

    /// Classify and dispatch one placeholder's content.
    fn resolve_content(&mut self, content: &str, session: &SessionContext, depth: usize) -> String {
        if depth >= self.config.recursion_limit {
            return ResolveError::RecursionLimitExceeded(content.to_string()).to_string();
        }

        let separator = self.config.separator;
        let (first, rest) = content.split_once(separator).unwrap_or((content, ""));
        match KeywordType::classify(first) {
            KeywordType::Input => self.resolve_input(content, session),
            KeywordType::Xl => self.resolve_excel(rest),
            KeywordType::Json => self.resolve_json(rest, session, depth),
            KeywordType::Template => self.resolve_template(rest, session, depth),
            // Backward compatibility: bare names are named-range lookups.
            KeywordType::ImplicitRange => {
                let args = format!("RANGE{separator}{content}");
                self.resolve_excel(&args)
            }
        }
    }

    fn resolve_input(&self, content: &str, session: &SessionContext) -> String {
        if let Some(value) = session.input_values.get(content) {
            return value.clone();
        }
        // Not collected in pass 1 (nested fragment or malformed): fall
        // back to the field's default value.
        match InputFieldDescriptor::parse(content, self.config.separator) {
            Ok(field) => field.fallback_value(),
            Err(e) => e.to_string(),
        }
    }

    fn resolve_excel(&mut self, args: &str) -> String {
        let Some(excel) = self.excel else {
            return "[Excel workbook not loaded]".to_string();
        };
        if args.trim().is_empty() {
            return ResolveError::Malformed("Excel reference".to_string()).to_string();
        }

        let separator = self.config.separator;
        let (op, params) = args.split_once(separator).unwrap_or((args, ""));
        match op.trim().to_uppercase().as_str() {
            "CELL" => {
                let (sheet, reference) = sheet_and_ref(excel, params, separator);
                excel
                    .read_cell(sheet.as_deref(), &reference)
                    .unwrap_or_else(|e| e.to_string())
            }
            "LAST" => self.resolve_last(excel, params),
            "RANGE" => {
                let (sheet, reference) = sheet_and_ref(excel, params, separator);
                match read_range_or_name(excel, sheet.as_deref(), &reference) {
                    Ok(matrix) => self.present_table(&matrix),
                    Err(e) => e.to_string(),
                }
            }
            "COLUMN" => self.resolve_column(excel, params),
            other => ResolveError::UnknownExcelOp(other.to_string()).to_string(),
        }
    }

    fn resolve_last(&self, excel: &SpreadsheetAdapter, params: &str) -> String {
        let separator = self.config.separator;
        let parts: Vec<&str> = params.split(separator).collect();
        if parts.len() >= 3 {
            // Title form: sheet, header-row start, column title.
            let sheet = parts[0].trim();
            let reference = parts[1].trim();
            let title = parts[2].trim();
            if !excel.has_sheet(sheet) {
                return ResolveError::SheetNotFound(sheet.to_string()).to_string();
            }
            match excel.read_title_total(Some(sheet), reference, title) {
                Ok(Some(value)) => value,
                Ok(None) => ResolveError::NoData(format!("below title {title}")).to_string(),
                Err(e) => e.to_string(),
            }
        } else {
            let (sheet, reference) = sheet_and_ref(excel, params, separator);
            match excel.read_total(sheet.as_deref(), &reference) {
                Ok(Some(value)) => value,
                Ok(None) => ResolveError::NoData(reference).to_string(),
                Err(e) => e.to_string(),
            }
        }
    }

    fn resolve_column(&mut self, excel: &SpreadsheetAdapter, params: &str) -> String {
        let separator = self.config.separator;
        let parts: Vec<&str> = params.split(separator).collect();
        if parts.len() < 2 {
            return ResolveError::Malformed(format!("COLUMN keyword: {params}")).to_string();
        }
        let sheet = parts[0].trim();
        if !excel.has_sheet(sheet) {
            return ResolveError::SheetNotFound(sheet.to_string()).to_string();
        }
        let selectors = parts[1].trim().trim_matches('"');

        // Explicit start row implies titles; otherwise selectors are
        // titles iff they carry no digits at all.
        let (use_titles, start_row) = if parts.len() > 2 {
            match parts[2].trim().parse::<u32>() {
                Ok(row) => (true, Some(row)),
                Err(_) => {
                    return ResolveError::Malformed(format!("start row for COLUMN: {}", parts[2]))
                        .to_string()
                }
            }
        } else {
            (!selectors.chars().any(|c| c.is_ascii_digit()), None)
        };

        match excel.read_columns(sheet, selectors, use_titles, start_row) {
            Ok(matrix) => self.present_table(&matrix),
            Err(e) => e.to_string(),
        }
    }

    /// Hand a tabular result to the synthesizer, anchored at the current
    /// placeholder span. The ordinal advances only when a table actually
    /// lands in the sink.
    fn present_table(&mut self, matrix: &RangeMatrix) -> String {
        let (start, end) = self.current_span;
        let anchor = TableAnchor::new(start, end, self.table_ordinal);
        let out = TableSynthesizer::present(
            matrix,
            self.sink
                .as_deref_mut()
                .map(|s| s as &mut dyn DocumentSink),
            anchor,
        );
        if out == TABLE_SENTINEL {
            self.table_ordinal += 1;
        }
        out
    }

    fn resolve_json(&mut self, args: &str, session: &SessionContext, depth: usize) -> String {
        // Dynamic filenames and keys are nested placeholders; resolve
        // them before splitting the argument list.
        let args = if self.scanner.contains_placeholder(args) {
            self.resolve_fragment(args, session, depth + 1)
        } else {
            args.to_string()
        };

        let parts: Vec<&str> = args.split(self.config.separator).collect();
        if parts.len() < 2 || parts[0].trim().is_empty() {
            return ResolveError::Malformed("JSON keyword: filename and path required".to_string())
                .to_string();
        }
        let filename = parts[0].trim();
        let path_expr = parts[1].trim();

        let document = match jsonpath::load_json(Path::new(filename)) {
            Ok(doc) => doc,
            Err(e) => return e.to_string(),
        };
        let expr = match jsonpath::parse_path(path_expr) {
            Ok(expr) => expr,
            Err(e) => return e.to_string(),
        };
        let value = match jsonpath::evaluate(&document, &expr) {
            Ok(value) => value,
            Err(e) => return e.to_string(),
        };

        match parts.get(2).map(|s| s.trim()).filter(|s| !s.is_empty()) {
            Some(spec) => match jsonpath::parse_transform(spec) {
                Ok(transform) => jsonpath::apply_transform(value, &transform)
                    .unwrap_or_else(|e| e.to_string()),
                Err(e) => e.to_string(),
            },
            None => jsonpath::render(value),
        }
    }

    fn resolve_template(&mut self, args: &str, session: &SessionContext, depth: usize) -> String {
        let reference = match TemplateReference::parse(args, self.config.separator) {
            Ok(reference) => reference,
            Err(e) => return e.to_string(),
        };

        // VARS values may themselves be placeholders.
        let reference = match reference {
            TemplateReference::File {
                path,
                directive: TemplateDirective::Vars(pairs),
            } => {
                let resolved = pairs
                    .into_iter()
                    .map(|(key, value)| {
                        let value = self.resolve_fragment(&value, session, depth + 1);
                        (key, value)
                    })
                    .collect();
                TemplateReference::File {
                    path,
                    directive: TemplateDirective::Vars(resolved),
                }
            }
            other => other,
        };

        match self.includer.include(&reference) {
            // Included content may contain further placeholders; a
            // self-including template terminates at the recursion cap.
            Ok(content) => self.resolve_fragment(&content, session, depth + 1),
            Err(e) => e.to_string(),
        }
    }
}

/// Peel an explicit sheet name off the front of the parameter list when
/// the first token names an existing sheet (case-insensitive); otherwise
/// the whole string is the reference and the first sheet is implied.
fn sheet_and_ref(
    excel: &SpreadsheetAdapter,
    params: &str,
    separator: char,
) -> (Option<String>, String) {
    let parts: Vec<&str> = params.split(separator).collect();
    if parts.len() > 1 && excel.has_sheet(parts[0].trim()) {
        (
            Some(parts[0].trim().to_string()),
            parts[1..].join(&separator.to_string()),
        )
    } else {
        (None, params.trim().to_string())
    }
}

/// RANGE reference fallback order: `A1:C3` literal, then single cell,
/// then defined name. Best-effort by design; a typo in a cell reference
/// can land in the named-range lookup.
fn read_range_or_name(
    excel: &SpreadsheetAdapter,
    sheet: Option<&str>,
    reference: &str,
) -> Result<crate::types::RangeMatrix, ResolveError> {
    if reference.contains(':') {
        return excel.read_range(sheet, reference);
    }
    let single = format!("{reference}:{reference}");
    match excel.read_range(sheet, &single) {
        Ok(matrix) => Ok(matrix),
        Err(_) => match excel.defined_target(reference.trim()) {
            Some(target) => excel.read_range(None, target),
            None => Err(ResolveError::InvalidReference(reference.to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excel::MemoryWorkbook;
    use crate::input::StaticInputProvider;

    fn adapter() -> SpreadsheetAdapter {
        let mut wb = MemoryWorkbook::new();
        wb.set("Sheet1", 1, 2, 1234.5);
        SpreadsheetAdapter::from_memory(wb)
    }

    #[test]
    fn test_identity_on_plain_text() {
        let mut resolver = KeywordResolver::new(ParserConfig::default());
        let mut provider = StaticInputProvider::pending();
        let outcome = resolver.resolve("nothing to do here", &mut provider).unwrap();
        assert_eq!(
            outcome,
            PassOutcome::Completed {
                text: "nothing to do here".to_string(),
                resolved: 0,
            }
        );
    }

    #[test]
    fn test_cell_dispatch() {
        let excel = adapter();
        let mut resolver = KeywordResolver::new(ParserConfig::default()).with_excel(&excel);
        let mut provider = StaticInputProvider::pending();
        let outcome = resolver.resolve("total: {{XL!CELL!B1}}", &mut provider).unwrap();
        let PassOutcome::Completed { text, resolved } = outcome else {
            panic!("expected completion");
        };
        assert_eq!(text, "total: 1,234.50");
        assert_eq!(resolved, 1);
    }

    #[test]
    fn test_unknown_excel_op_diagnostic() {
        let excel = adapter();
        let mut resolver = KeywordResolver::new(ParserConfig::default()).with_excel(&excel);
        let mut provider = StaticInputProvider::pending();
        let PassOutcome::Completed { text, .. } = resolver
            .resolve("{{XL!FROB!A1}}", &mut provider)
            .unwrap()
        else {
            panic!("expected completion");
        };
        assert_eq!(text, "[Unknown XL type: FROB]");
    }

    #[test]
    fn test_missing_workbook_diagnostic() {
        let mut resolver = KeywordResolver::new(ParserConfig::default());
        let mut provider = StaticInputProvider::pending();
        let PassOutcome::Completed { text, .. } = resolver
            .resolve("{{XL!CELL!A1}}", &mut provider)
            .unwrap()
        else {
            panic!("expected completion");
        };
        assert_eq!(text, "[Excel workbook not loaded]");
    }
}
