//! INPUT placeholder descriptors and the external input-provider protocol.
//!
//! The resolver collects every INPUT descriptor up front, hands the batch
//! to an [`InputProvider`] in one round-trip, and blocks the pass until
//! values come back. A provider answering [`InputOutcome::Pending`] aborts
//! the pass with no output; the caller retries later with identical text.

use crate::error::{MergeResult, ResolveError};
use chrono::{Local, NaiveDate};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Area,
    Date,
    Select,
    Check,
}

impl InputKind {
    fn parse(token: &str) -> Result<Self, ResolveError> {
        match token.trim().to_lowercase().as_str() {
            "text" => Ok(InputKind::Text),
            "area" => Ok(InputKind::Area),
            "date" => Ok(InputKind::Date),
            "select" => Ok(InputKind::Select),
            "check" => Ok(InputKind::Check),
            other => Err(ResolveError::UnsupportedInputType(other.to_string())),
        }
    }
}

/// Rendering/parsing format for date inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFormat {
    #[default]
    SlashYmd,
    SlashDmy,
    SlashMdy,
    Iso,
}

impl DateFormat {
    fn parse(token: &str) -> Self {
        match token.trim() {
            "YYYY/MM/DD" => DateFormat::SlashYmd,
            "DD/MM/YYYY" => DateFormat::SlashDmy,
            "MM/DD/YYYY" => DateFormat::SlashMdy,
            _ => DateFormat::Iso,
        }
    }

    fn chrono_format(self) -> &'static str {
        match self {
            DateFormat::SlashYmd => "%Y/%m/%d",
            DateFormat::SlashDmy => "%d/%m/%Y",
            DateFormat::SlashMdy => "%m/%d/%Y",
            DateFormat::Iso => "%Y-%m-%d",
        }
    }
}

/// One interactive field, parsed from an `INPUT!` placeholder.
///
/// Identity is the raw argument string: two placeholders with identical
/// raw content are the same field and resolve to one collected value.
#[derive(Debug, Clone, PartialEq)]
pub struct InputFieldDescriptor {
    /// Full placeholder content, the deduplication key.
    pub raw: String,
    pub kind: InputKind,
    pub label: String,
    pub default: String,
    /// Area height in pixels, when given.
    pub height: Option<u32>,
    pub date_format: DateFormat,
    /// Select options.
    pub options: Vec<String>,
    /// Check default state.
    pub checked: bool,
}

impl InputFieldDescriptor {
    /// Parse placeholder content of the form
    /// `INPUT<sep>kind<sep>label<sep>default[<sep>extra]`.
    pub fn parse(content: &str, separator: char) -> Result<Self, ResolveError> {
        let tokens: Vec<&str> = content.split(separator).collect();
        if tokens.len() < 2 || !tokens[0].trim().eq_ignore_ascii_case("INPUT") {
            return Err(ResolveError::Malformed(format!("INPUT keyword: {content}")));
        }

        let kind = InputKind::parse(tokens[1])?;
        let label = tokens.get(2).map(|s| s.trim()).unwrap_or("").to_string();
        let third = tokens.get(3).map(|s| s.trim()).unwrap_or("").to_string();
        let extra = tokens.get(4).map(|s| s.trim()).unwrap_or("");

        let mut field = Self {
            raw: content.to_string(),
            kind,
            label,
            default: third.clone(),
            height: None,
            date_format: DateFormat::default(),
            options: Vec::new(),
            checked: false,
        };

        match kind {
            InputKind::Area => {
                field.height = extra.parse().ok();
            }
            InputKind::Date => {
                if !extra.is_empty() {
                    field.date_format = DateFormat::parse(extra);
                }
            }
            InputKind::Select => {
                // The third token carries the comma-separated options.
                field.default = String::new();
                field.options = third
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            InputKind::Check => {
                field.checked = third.eq_ignore_ascii_case("true");
            }
            InputKind::Text => {}
        }
        Ok(field)
    }

    /// Non-interactive value for this field: the default, rendered the
    /// same way a submitted value would be.
    pub fn fallback_value(&self) -> String {
        match self.kind {
            InputKind::Text | InputKind::Area => self.default.clone(),
            InputKind::Date => {
                let format = self.date_format.chrono_format();
                let date = if self.default.is_empty() || self.default.eq_ignore_ascii_case("today")
                {
                    Local::now().date_naive()
                } else {
                    NaiveDate::parse_from_str(&self.default, format)
                        .unwrap_or_else(|_| Local::now().date_naive())
                };
                date.format(format).to_string()
            }
            InputKind::Select => self
                .options
                .first()
                .cloned()
                .unwrap_or_else(|| "[No options provided]".to_string()),
            InputKind::Check => self.checked.to_string(),
        }
    }
}

/// Result of one batched input round-trip.
#[derive(Debug, Clone, PartialEq)]
pub enum InputOutcome {
    /// The user has not submitted yet; the whole pass yields no output.
    Pending,
    /// Values keyed by each field's raw argument string.
    Submitted(HashMap<String, String>),
}

/// External collaborator that turns an ordered batch of field descriptors
/// into human-supplied values.
pub trait InputProvider {
    fn collect(&mut self, fields: &[InputFieldDescriptor]) -> MergeResult<InputOutcome>;
}

/// Provider that answers every field with its default, for non-interactive
/// runs.
#[derive(Debug, Default)]
pub struct DefaultInputProvider;

impl InputProvider for DefaultInputProvider {
    fn collect(&mut self, fields: &[InputFieldDescriptor]) -> MergeResult<InputOutcome> {
        Ok(InputOutcome::Submitted(
            fields
                .iter()
                .map(|f| (f.raw.clone(), f.fallback_value()))
                .collect(),
        ))
    }
}

/// Provider backed by a prepared raw-argument → value map, with an
/// explicit submitted flag so the pending/retry protocol is exercisable.
#[derive(Debug, Default)]
pub struct StaticInputProvider {
    values: HashMap<String, String>,
    submitted: bool,
}

impl StaticInputProvider {
    /// A provider that reports "not yet submitted" for any batch.
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn submitted(values: HashMap<String, String>) -> Self {
        Self {
            values,
            submitted: true,
        }
    }
}

impl InputProvider for StaticInputProvider {
    fn collect(&mut self, fields: &[InputFieldDescriptor]) -> MergeResult<InputOutcome> {
        if !self.submitted {
            return Ok(InputOutcome::Pending);
        }
        Ok(InputOutcome::Submitted(
            fields
                .iter()
                .map(|f| {
                    let value = self
                        .values
                        .get(&f.raw)
                        .cloned()
                        .unwrap_or_else(|| f.fallback_value());
                    (f.raw.clone(), value)
                })
                .collect(),
        ))
    }
}
