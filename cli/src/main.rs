//! docfill CLI - template filling tool

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use docfill::fill::{FillReport, PhaseOutcome};
use docfill::locate::{find_all_occurrences, list_placeholders, Placeholder};
use docfill::service::{HttpImageFetcher, MemoryDocumentService};
use docfill::sizing::ImageSizer;
use docfill::{
    document_to_json, load_document, Block, Document, FieldValues, FillOptions, Filler,
    GalleryOptions, GalleryState, ImageCategory, SizingOptions,
};

#[derive(Parser)]
#[command(name = "docfill")]
#[command(version)]
#[command(about = "Fill {{placeholder}} templates in structured documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill a document snapshot with field values
    Fill {
        /// Document snapshot (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Field values (JSON)
        #[arg(long, value_name = "FILE")]
        values: PathBuf,

        /// Gallery state from a previous run (JSON)
        #[arg(long, value_name = "FILE")]
        state: Option<PathBuf>,

        /// Output file for the filled document (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Write the applied batches to this file
        #[arg(long, value_name = "FILE")]
        plan: Option<PathBuf>,

        /// Maximum operations per batch
        #[arg(long, env = "DOCFILL_MAX_BATCH", default_value = "50")]
        max_batch: usize,

        /// Use one replace-all operation per text field
        #[arg(long)]
        replace_all: bool,

        /// Gallery anchor placeholder name
        #[arg(long, env = "DOCFILL_ANCHOR", default_value = docfill::fill::DEFAULT_ANCHOR)]
        anchor: String,

        /// Gallery images per row
        #[arg(long, default_value = "3")]
        per_row: usize,

        /// Image fetch timeout in seconds
        #[arg(long, default_value = "30")]
        timeout: u64,
    },

    /// Print the offsets of placeholders
    Locate {
        /// Document snapshot (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Placeholder names (without braces)
        #[arg(value_name = "NAME", required = true)]
        names: Vec<String>,
    },

    /// Show document information and the placeholders it contains
    Info {
        /// Document snapshot (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Compute the rendered size of an image
    Size {
        /// Image URL
        #[arg(value_name = "URL")]
        url: String,

        /// Sizing preset
        #[arg(long, value_enum, default_value = "other")]
        category: Category,

        /// Image fetch timeout in seconds
        #[arg(long, default_value = "30")]
        timeout: u64,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Category {
    /// Primary subject photo
    Main,
    /// Signature detail
    Signature,
    /// Age-evidence detail
    Age,
    /// Gallery thumbnail
    Gallery,
    /// Default box
    Other,
}

impl From<Category> for ImageCategory {
    fn from(category: Category) -> Self {
        match category {
            Category::Main => ImageCategory::Main,
            Category::Signature => ImageCategory::Signature,
            Category::Age => ImageCategory::Age,
            Category::Gallery => ImageCategory::Gallery,
            Category::Other => ImageCategory::Other,
        }
    }
}

struct FillArgs {
    values: PathBuf,
    state: Option<PathBuf>,
    output: Option<PathBuf>,
    plan: Option<PathBuf>,
    options: FillOptions,
    timeout: Duration,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Fill {
            input,
            values,
            state,
            output,
            plan,
            max_batch,
            replace_all,
            anchor,
            per_row,
            timeout,
        } => {
            let options = FillOptions::new()
                .with_max_batch_operations(max_batch)
                .with_replace_all(replace_all)
                .with_anchor(anchor)
                .with_gallery(GalleryOptions::new().with_images_per_row(per_row));
            cmd_fill(
                &input,
                FillArgs {
                    values,
                    state,
                    output,
                    plan,
                    options,
                    timeout: Duration::from_secs(timeout),
                },
            )
        }
        Commands::Locate { input, names } => cmd_locate(&input, &names),
        Commands::Info { input } => cmd_info(&input),
        Commands::Size {
            url,
            category,
            timeout,
        } => cmd_size(&url, category, Duration::from_secs(timeout)),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Read a JSON input file into `T`.
fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
    Ok(serde_json::from_str(&data).map_err(|e| format!("Invalid JSON in {}: {}", path.display(), e))?)
}

/// Snapshots without an id are addressed by their file stem.
fn document_id(doc: &Document, input: &Path) -> String {
    if doc.id.is_empty() {
        input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string())
    } else {
        doc.id.clone()
    }
}

fn cmd_fill(input: &Path, args: FillArgs) -> Result<(), Box<dyn std::error::Error>> {
    let FillArgs {
        values,
        state,
        output,
        plan,
        options,
        timeout,
    } = args;

    let mut doc = load_document(input)?;
    let id = document_id(&doc, input);
    doc.id = id.clone();
    log::debug!("loaded {} (end offset {})", id, doc.end_offset());

    let values: FieldValues = read_json(&values)?;
    let state = state
        .as_deref()
        .map(read_json::<GalleryState>)
        .transpose()?;

    let service = MemoryDocumentService::new().with_document(doc);
    let fetcher = HttpImageFetcher::with_timeout(timeout)?;

    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(async {
        Filler::new(&service, &fetcher)
            .with_options(options)
            .fill(&id, &values, state.as_ref())
            .await
    })?;

    print_report(&report);

    let filled = service
        .document(&id)
        .ok_or_else(|| format!("Document {} disappeared", id))?;
    let json = document_to_json(&filled)?;
    if let Some(path) = &output {
        fs::write(path, &json)?;
        eprintln!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    if let Some(path) = &plan {
        fs::write(path, serde_json::to_string_pretty(&service.history(&id))?)?;
        eprintln!("{} {}", "Plan saved to".green(), path.display());
    }

    if !report.is_complete() {
        return Err("one or more phases failed".into());
    }
    Ok(())
}

/// Phase summary, on stderr so the filled document can be piped.
fn print_report(report: &FillReport) {
    eprintln!("{}", "Fill Report".cyan().bold());
    eprintln!("{}", "─".repeat(40).dimmed());

    for phase in &report.phases {
        let status = match &phase.outcome {
            PhaseOutcome::Applied {
                operations,
                batches,
            } => format!("{} ({} operations, {} batches)", "applied".green(), operations, batches),
            PhaseOutcome::Skipped { reason } => format!("{} ({})", "skipped".yellow(), reason),
            PhaseOutcome::Failed { error } => format!("{} ({})", "failed".red(), error),
        };
        eprintln!("{}: {}", phase.phase.to_string().bold(), status);
    }

    if !report.warnings.is_empty() {
        eprintln!();
        for warning in &report.warnings {
            eprintln!("{} {}", "warning:".yellow(), warning);
        }
    }
    eprintln!();
}

fn cmd_locate(input: &Path, names: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load_document(input)?;
    let placeholders = names
        .iter()
        .map(|n| Placeholder::new(n.as_str()))
        .collect::<Result<Vec<_>, _>>()?;

    let found = find_all_occurrences(&doc, &placeholders);
    println!("{}", serde_json::to_string_pretty(&found)?);
    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load_document(input)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Id".bold(), document_id(&doc, input));
    if let Some(ref title) = doc.title {
        println!("{}: {}", "Title".bold(), title);
    }
    println!("{}: {}", "Revision".bold(), doc.revision);

    let text = doc.plain_text();
    println!("{}: {}", "Paragraphs".bold(), doc.paragraphs().count());
    println!("{}: {}", "Words".bold(), text.split_whitespace().count());
    println!("{}: {}", "Images".bold(), doc.image_count());
    let depth = doc
        .body
        .iter()
        .filter_map(|b| match b {
            Block::Table(t) => Some(t.depth()),
            Block::Paragraph(_) => None,
        })
        .max()
        .unwrap_or(0);
    println!(
        "{}: {} (nesting depth {})",
        "Tables".bold(),
        doc.body.iter().filter(|b| b.is_table()).count(),
        depth
    );
    println!("{}: {}", "End offset".bold(), doc.end_offset());

    println!();
    println!("{}", "Placeholders".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let placeholders = list_placeholders(&doc);
    if placeholders.is_empty() {
        println!("{}", "none".dimmed());
    }
    for (name, count) in &placeholders {
        println!("{}: {}", format!("{{{{{}}}}}", name).bold(), count);
    }

    Ok(())
}

fn cmd_size(url: &str, category: Category, timeout: Duration) -> Result<(), Box<dyn std::error::Error>> {
    let fetcher = HttpImageFetcher::with_timeout(timeout)?;
    let options = SizingOptions::default();
    let max_box = options.preset(category.into());

    let rt = tokio::runtime::Runtime::new()?;
    let native = rt.block_on(ImageSizer::new(&fetcher, &options).native_dimensions(url))?;

    println!("{}: {}", "Native".bold(), native);
    println!("{}: {}", "Box".bold(), max_box);
    println!("{}: {}", "Rendered".bold(), docfill::fit_within(native, max_box));
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "docfill".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Template filling tool for structured documents");
    println!();
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_json_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let err = read_json::<FieldValues>(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn test_read_values_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"text": {{"artist": "Doe"}}}}"#).unwrap();
        let values: FieldValues = read_json(file.path()).unwrap();
        assert_eq!(values.text["artist"], "Doe");
    }

    #[test]
    fn test_document_id_falls_back_to_file_stem() {
        let doc = Document::new("");
        assert_eq!(document_id(&doc, Path::new("/tmp/report.json")), "report");
        let doc = Document::new("abc");
        assert_eq!(document_id(&doc, Path::new("/tmp/report.json")), "abc");
    }

    #[test]
    fn test_cli_parses_fill() {
        let cli = Cli::try_parse_from([
            "docfill", "fill", "doc.json", "--values", "v.json", "--replace-all",
        ])
        .unwrap();
        match cli.command {
            Commands::Fill {
                replace_all,
                anchor,
                per_row,
                ..
            } => {
                assert!(replace_all);
                assert_eq!(anchor, "gallery");
                assert_eq!(per_row, 3);
            }
            _ => panic!("expected fill"),
        }
    }
}
