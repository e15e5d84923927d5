use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "legalindex",
    version,
    about = "Categorized concept index generation for legal documents"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Index(IndexArgs),
    Terms(TermsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct IndexArgs {
    /// Input document: a PDF, or a plain-text file using form feeds as
    /// page breaks.
    pub input: PathBuf,

    #[arg(short, long, default_value = "legal_index.txt")]
    pub output: PathBuf,

    /// Output format; detected from the output extension when omitted.
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Signed offset added to raw page numbers before indexing (e.g. -4
    /// when the printed page 1 sits on physical page 5).
    #[arg(long, default_value_t = 0)]
    pub page_offset: i64,

    /// JSON file of additional terms: {"category": ["phrase", ...]}.
    #[arg(long)]
    pub terms_file: Option<PathBuf>,

    /// Omit the per-category breakdown in the subject-matter index.
    #[arg(long, default_value_t = false)]
    pub no_subcategories: bool,

    /// Embed index statistics in the output.
    #[arg(long, default_value_t = false)]
    pub stats: bool,

    #[arg(long, default_value_t = 10)]
    pub top_terms: usize,

    /// Cap on cross-references per term (unbounded when omitted).
    #[arg(long)]
    pub max_cross_refs: Option<usize>,

    #[arg(long)]
    pub max_pages: Option<usize>,

    #[arg(long, default_value = ".cache/legalindex")]
    pub cache_root: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct TermsArgs {
    #[arg(long)]
    pub terms_file: Option<PathBuf>,

    /// Restrict the listing to one category.
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
    Xml,
    Markdown,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Xml => "xml",
            Self::Markdown => "markdown",
        }
    }

    pub fn from_extension(path: &Path) -> OutputFormat {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            "xml" => OutputFormat::Xml,
            "md" | "markdown" => OutputFormat::Markdown,
            _ => OutputFormat::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_detection_from_extension() {
        assert_eq!(
            OutputFormat::from_extension(Path::new("index.json")),
            OutputFormat::Json
        );
        assert_eq!(
            OutputFormat::from_extension(Path::new("index.MD")),
            OutputFormat::Markdown
        );
        assert_eq!(
            OutputFormat::from_extension(Path::new("index.txt")),
            OutputFormat::Text
        );
        assert_eq!(
            OutputFormat::from_extension(Path::new("index")),
            OutputFormat::Text
        );
    }
}
