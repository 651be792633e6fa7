use thiserror::Error;

pub type MergeResult<T> = Result<T, MergeError>;

/// Fatal errors: environment problems that abort a command, as opposed to
/// per-placeholder failures which become [`ResolveError`] diagnostics.
#[derive(Error, Debug)]
pub enum MergeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Input error: {0}")]
    Input(String),
}

/// Per-placeholder resolution failures.
///
/// Every variant renders as a bracketed human-readable diagnostic. The
/// resolver substitutes the diagnostic string in place of the value and
/// keeps going; one broken placeholder never aborts the pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("[Sheet not found: {0}]")]
    SheetNotFound(String),

    #[error("[Invalid cell reference: {0}]")]
    InvalidReference(String),

    #[error("[Title not found: {0}]")]
    TitleNotFound(String),

    #[error("[File not found: {0}]")]
    MissingFile(String),

    #[error("[Error decoding JSON file: {0}]")]
    BadJson(String),

    #[error("[Invalid JSON path (must start with $.): {0}]")]
    InvalidPath(String),

    #[error("[JSON key not found: {0}]")]
    KeyNotFound(String),

    #[error("[JSON path error: {0} is not a collection]")]
    NotACollection(String),

    #[error("[JSON index out of bounds: {0}]")]
    IndexOutOfRange(usize),

    #[error("[Transform failed: {0}]")]
    TransformFailure(String),

    #[error("[Unsupported input type: {0}]")]
    UnsupportedInputType(String),

    #[error("[Unknown XL type: {0}]")]
    UnknownExcelOp(String),

    #[error("[Template not found in library: {name} (version: {version})]")]
    UnknownTemplate { name: String, version: String },

    #[error("[Section not found: {section} in {file}]")]
    SectionNotFound { section: String, file: String },

    #[error("[Recursion limit exceeded while resolving: {0}]")]
    RecursionLimitExceeded(String),

    #[error("[Empty table data]")]
    TableEmpty,

    #[error("[No values found: {0}]")]
    NoData(String),

    #[error("[Invalid format: {0}]")]
    Malformed(String),
}
