use clap::{Parser, Subcommand};
use docfill::cli;
use docfill::error::MergeResult;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docfill")]
#[command(about = "Keyword-driven document mail-merge from spreadsheets, JSON, and templates")]
#[command(long_about = "Docfill - Keyword-driven document mail-merge

Resolves {{ ... }} placeholders in text templates against live data:
spreadsheet cells and scans, JSON documents, external template files,
and interactive inputs.

PLACEHOLDER GRAMMAR:
  {{XL!CELL!Sheet1!B2}}          - one cell's computed value
  {{XL!LAST!B5}}                 - last value of a column run (totals)
  {{XL!RANGE!A1:C10}}            - rectangular range as a table
  {{XL!COLUMN!Sheet1!\"Qty,Cost\"}} - columns matched by title
  {{INPUT!text!Name!default}}    - interactive input field
  {{TEMPLATE!notes.txt!line=3}}  - external template inclusion
  {{JSON!data.json!$.items[0]}}  - JSON document lookup
  {{my_range}}                   - named-range shorthand

EXAMPLES:
  docfill fill letter.txt -w report.xlsx -o merged.txt --defaults
  docfill fill letter.txt -a answers.json
  docfill scan letter.txt
  docfill sheets report.xlsx")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every placeholder in a template and write the merged text
    Fill {
        /// Path to the template text file
        template: PathBuf,

        /// Excel workbook (.xlsx) serving XL placeholders
        #[arg(short, long)]
        workbook: Option<PathBuf>,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// JSON file of label-to-value answers for INPUT placeholders
        #[arg(short, long)]
        answers: Option<PathBuf>,

        /// Answer every INPUT placeholder with its default, no prompting
        #[arg(short, long)]
        defaults: bool,

        /// Placeholder segment separator (':' for legacy documents)
        #[arg(short, long, default_value = "!")]
        separator: char,
    },

    /// List a template's placeholders without resolving them
    Scan {
        /// Path to the template text file
        template: PathBuf,

        /// Placeholder segment separator (':' for legacy documents)
        #[arg(short, long, default_value = "!")]
        separator: char,
    },

    /// List the sheets of a workbook in document order
    Sheets {
        /// Path to the Excel workbook (.xlsx)
        workbook: PathBuf,
    },
}

fn main() -> MergeResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fill {
            template,
            workbook,
            out,
            answers,
            defaults,
            separator,
        } => cli::fill(template, workbook, out, answers, defaults, separator),

        Commands::Scan {
            template,
            separator,
        } => cli::scan(template, separator),

        Commands::Sheets { workbook } => cli::sheets(workbook),
    }
}
