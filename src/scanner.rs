//! Placeholder scanning and keyword classification.

use regex::Regex;

/// A `{{ ... }}` span found in a body of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    /// Byte offset of the opening `{{`.
    pub start: usize,
    /// Byte offset one past the closing `}}`.
    pub end: usize,
    /// Trimmed content between the braces.
    pub content: String,
}

/// Keyword classifier: the token before the first separator, uppercased.
///
/// Anything unrecognized falls back to an implicit named-range RANGE
/// lookup, kept for backward compatibility with older documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordType {
    Xl,
    Input,
    Template,
    Json,
    ImplicitRange,
}

impl KeywordType {
    pub fn classify(first_segment: &str) -> Self {
        match first_segment.trim().to_uppercase().as_str() {
            "XL" => KeywordType::Xl,
            "INPUT" => KeywordType::Input,
            "TEMPLATE" => KeywordType::Template,
            "JSON" => KeywordType::Json,
            _ => KeywordType::ImplicitRange,
        }
    }
}

/// Finds placeholder spans in text.
pub struct PlaceholderScanner {
    pattern: Regex,
}

impl Default for PlaceholderScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaceholderScanner {
    pub fn new() -> Self {
        Self {
            // Non-greedy so adjacent placeholders do not merge.
            pattern: Regex::new(r"\{\{(.*?)\}\}").expect("placeholder pattern is valid"),
        }
    }

    /// Return every placeholder span in document order.
    pub fn scan(&self, text: &str) -> Vec<Placeholder> {
        self.pattern
            .captures_iter(text)
            .map(|cap| {
                let whole = cap.get(0).expect("group 0 always present");
                let inner = cap.get(1).expect("pattern has one capture group");
                Placeholder {
                    start: whole.start(),
                    end: whole.end(),
                    content: inner.as_str().trim().to_string(),
                }
            })
            .collect()
    }

    /// True if the text contains at least one placeholder.
    pub fn contains_placeholder(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}
