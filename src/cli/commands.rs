use crate::error::{MergeError, MergeResult};
use crate::excel::SpreadsheetAdapter;
use crate::input::{
    DefaultInputProvider, InputFieldDescriptor, InputOutcome, InputProvider,
};
use crate::resolver::{KeywordResolver, PassOutcome};
use crate::scanner::{KeywordType, PlaceholderScanner};
use crate::types::ParserConfig;
use colored::Colorize;
use std::collections::HashMap;
use std::fs;
use std::io::Write as _;
use std::path::PathBuf;

/// Answers loaded from a JSON file, matched by field label first and by
/// raw argument string second. Unanswered fields get their defaults.
struct AnswerFileProvider {
    values: HashMap<String, String>,
}

impl InputProvider for AnswerFileProvider {
    fn collect(&mut self, fields: &[InputFieldDescriptor]) -> MergeResult<InputOutcome> {
        Ok(InputOutcome::Submitted(
            fields
                .iter()
                .map(|f| {
                    let value = self
                        .values
                        .get(&f.label)
                        .or_else(|| self.values.get(&f.raw))
                        .cloned()
                        .unwrap_or_else(|| f.fallback_value());
                    (f.raw.clone(), value)
                })
                .collect(),
        ))
    }
}

/// Interactive provider: one prompt per field on stdin, empty answer
/// takes the default.
struct PromptInputProvider;

impl InputProvider for PromptInputProvider {
    fn collect(&mut self, fields: &[InputFieldDescriptor]) -> MergeResult<InputOutcome> {
        let stdin = std::io::stdin();
        let mut values = HashMap::new();
        for field in fields {
            let fallback = field.fallback_value();
            print!("{} [{}]: ", field.label.cyan(), fallback.bright_yellow());
            std::io::stdout().flush()?;
            let mut line = String::new();
            stdin.read_line(&mut line)?;
            let answer = line.trim();
            let value = if answer.is_empty() {
                fallback
            } else {
                answer.to_string()
            };
            values.insert(field.raw.clone(), value);
        }
        Ok(InputOutcome::Submitted(values))
    }
}

/// Execute the fill command: resolve every placeholder in a template and
/// write the merged text.
pub fn fill(
    template: PathBuf,
    workbook: Option<PathBuf>,
    out: Option<PathBuf>,
    answers: Option<PathBuf>,
    defaults: bool,
    separator: char,
) -> MergeResult<()> {
    eprintln!("{}", "📄 Filling template".bold().green());
    eprintln!("   Template: {}", template.display());
    if let Some(ref path) = workbook {
        eprintln!("   Workbook: {}", path.display());
    }
    eprintln!();

    let text = fs::read_to_string(&template)?;
    let excel = match &workbook {
        Some(path) => Some(SpreadsheetAdapter::open_xlsx(path)?),
        None => None,
    };

    let mut provider: Box<dyn InputProvider> = if let Some(path) = answers {
        let content = fs::read_to_string(&path)?;
        let values: HashMap<String, String> = serde_json::from_str(&content)?;
        Box::new(AnswerFileProvider { values })
    } else if defaults {
        Box::new(DefaultInputProvider)
    } else {
        Box::new(PromptInputProvider)
    };

    let mut resolver = KeywordResolver::new(ParserConfig::with_separator(separator));
    if let Some(ref excel) = excel {
        resolver = resolver.with_excel(excel);
    }

    match resolver.resolve(&text, provider.as_mut())? {
        PassOutcome::Completed { text, resolved } => match out {
            Some(path) => {
                fs::write(&path, &text)?;
                eprintln!(
                    "{}",
                    format!("✅ Resolved {} placeholders → {}", resolved, path.display())
                        .bold()
                        .green()
                );
            }
            None => {
                println!("{text}");
            }
        },
        PassOutcome::Pending { fields } => {
            return Err(MergeError::Input(format!(
                "input not submitted for {} field(s)",
                fields.len()
            )));
        }
    }
    Ok(())
}

/// Execute the scan command: list placeholders without resolving them.
pub fn scan(template: PathBuf, separator: char) -> MergeResult<()> {
    println!("{}", "🔍 Scanning template".bold().green());
    println!("   File: {}\n", template.display());

    let text = fs::read_to_string(&template)?;
    let scanner = PlaceholderScanner::new();
    let found = scanner.scan(&text);

    if found.is_empty() {
        println!("{}", "No placeholders found".yellow());
        return Ok(());
    }

    for placeholder in &found {
        let first = placeholder
            .content
            .split(separator)
            .next()
            .unwrap_or("");
        let kind = match KeywordType::classify(first) {
            KeywordType::Xl => "XL",
            KeywordType::Input => "INPUT",
            KeywordType::Template => "TEMPLATE",
            KeywordType::Json => "JSON",
            KeywordType::ImplicitRange => "NAMED RANGE",
        };
        println!(
            "   {} {}",
            format!("[{kind}]").bright_blue(),
            placeholder.content
        );
    }

    println!();
    println!(
        "{}",
        format!("✅ {} placeholder(s)", found.len()).bold().green()
    );
    Ok(())
}

/// Execute the sheets command: list a workbook's sheets in document order.
pub fn sheets(workbook: PathBuf) -> MergeResult<()> {
    println!("{}", "📊 Workbook sheets".bold().green());
    println!("   File: {}\n", workbook.display());

    let adapter = SpreadsheetAdapter::open_xlsx(&workbook)?;
    for (i, name) in adapter.sheet_names().iter().enumerate() {
        println!("   {}. {}", i + 1, name.bright_blue());
    }
    Ok(())
}
