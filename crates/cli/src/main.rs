//! CLI tool for populating PowerPoint templates from JSON and reading
//! decks back into JSON.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pptfill_core::Payload;
use pptfill_pptx::extract::extract as extract_payload;
use pptfill_pptx::inspect::inspect;
use pptfill_pptx::populate::populate as populate_deck;
use pptfill_pptx::{PopulateOptions, Presentation, TemplateInspection};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Fill named shapes in PowerPoint templates from JSON data.
#[derive(Parser, Debug)]
#[command(name = "pptfill")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Populate a template with JSON data
    Populate(PopulateArgs),
    /// Extract shape contents as populate-ready JSON
    Extract(ExtractArgs),
    /// List the fields a template offers
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct PopulateArgs {
    /// Template presentation (.pptx)
    #[arg(short, long)]
    template: PathBuf,

    /// JSON data file, or "-" for stdin
    #[arg(short, long)]
    data: PathBuf,

    /// Template slide for single-slide data (default: 0)
    #[arg(short, long, default_value = "0")]
    slide_index: usize,

    /// Output file (default: <template>_populated.pptx)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Fail if any field has no matching shape
    #[arg(long)]
    strict: bool,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Presentation to read (.pptx)
    input: PathBuf,

    /// Slide to extract (default: 0)
    #[arg(short, long, default_value = "0", conflicts_with = "all")]
    slide_index: usize,

    /// Extract every slide in the multi-slide form
    #[arg(short, long)]
    all: bool,

    /// Write JSON to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Template to inspect (.pptx)
    input: PathBuf,

    /// Print a populate-ready JSON definition instead of the report
    #[arg(long)]
    json: bool,

    /// Turn autofit on for shapes that have it off and write the result here
    #[arg(long, value_name = "OUTPUT")]
    fix: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let outcome = match &cli.command {
        Command::Populate(args) => run_populate(args),
        Command::Extract(args) => run_extract(args),
        Command::Inspect(args) => run_inspect(args),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            if is_input_failure(&e) {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

/// Whether the failure is a problem with the caller's template or data.
fn is_input_failure(err: &anyhow::Error) -> bool {
    err.downcast_ref::<pptfill_core::Error>()
        .is_some_and(pptfill_core::Error::is_input_error)
}

fn run_populate(args: &PopulateArgs) -> Result<()> {
    let template = read_bytes(&args.template)?;
    let data = read_data(&args.data)?;

    let payload = Payload::from_json_str(&data)?;
    let options = PopulateOptions::new()
        .with_slide_index(args.slide_index)
        .with_strict(args.strict);

    let deck = populate_deck(&template, &payload, &options)?;

    let output_path = match &args.output {
        Some(path) => path.clone(),
        None => default_output_path(&args.template, "_populated", "pptx"),
    };
    write_output(&output_path, &deck.bytes)?;

    println!("{}", deck.report.summary());
    let unmatched = deck.report.unmatched_fields();
    if !unmatched.is_empty() {
        eprintln!("Unmatched field(s): {}", unmatched.join(", "));
    }
    log::debug!("Written to: {}", output_path.display());

    Ok(())
}

fn run_extract(args: &ExtractArgs) -> Result<()> {
    let presentation = open(&args.input)?;
    let slide_index = if args.all { None } else { Some(args.slide_index) };
    let payload = extract_payload(&presentation, slide_index)?;

    let json = serde_json::to_string_pretty(&payload).context("Failed to serialize JSON")?;
    emit(args.output.as_deref(), &json)
}

fn run_inspect(args: &InspectArgs) -> Result<()> {
    let mut presentation = open(&args.input)?;
    let report = inspect(&presentation)?;

    if args.json {
        let json = serde_json::to_string_pretty(&report.json_definition())
            .context("Failed to serialize JSON")?;
        println!("{}", json);
    } else {
        print!("{}", render_report(&args.input, &report));
    }

    if let Some(path) = &args.fix {
        let changed = presentation.enable_autofit()?;
        write_output(path, &presentation.to_bytes()?)?;
        eprintln!(
            "Enabled autofit on {} shape(s); written to {}",
            changed,
            path.display()
        );
    }

    Ok(())
}

/// Human-readable inspection report.
fn render_report(input: &Path, report: &TemplateInspection) -> String {
    let mut out = format!("Template: {}\n", input.display());

    for slide in &report.slides {
        out.push_str(&format!("\nSlide {}\n", slide.slide_index));
        if slide.field_count() == 0 && slide.other_shapes.is_empty() {
            out.push_str("  (no named shapes)\n");
        }
        for field in &slide.text_fields {
            let size = field
                .font_size
                .map(|pt| format!(", {}pt", pt))
                .unwrap_or_default();
            out.push_str(&format!(
                "  text   {} [autofit: {}{}] \"{}\"\n",
                field.name, field.autofit, size, field.preview
            ));
        }
        for table in &slide.tables {
            out.push_str(&format!(
                "  table  {} [{}x{}] headers: {}\n",
                table.name,
                table.rows,
                table.columns,
                table.headers.join(" | ")
            ));
        }
        for name in &slide.other_shapes {
            out.push_str(&format!("  other  {}\n", name));
        }
    }

    let warnings = report.warnings();
    if !warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for warning in warnings {
            out.push_str(&format!("  {}\n", warning));
        }
    }

    out
}

fn open(path: &Path) -> Result<Presentation> {
    let bytes = read_bytes(path)?;
    Presentation::open(&bytes)
        .with_context(|| format!("Failed to open presentation {}", path.display()))
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Read the JSON data file, or stdin for `-`.
fn read_data(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut data = String::new();
        std::io::stdin()
            .read_to_string(&mut data)
            .context("Failed to read data from stdin")?;
        return Ok(data);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// `<dir>/<stem><suffix>.<extension>` next to the input.
fn default_output_path(input: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let file_name = format!("{}{}.{}", stem, suffix, extension);

    match input.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Print to stdout or write to a file.
fn emit(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => write_output(path, format!("{}\n", content).as_bytes()),
        None => {
            println!("{}", content);
            Ok(())
        }
    }
}

/// Write output to a file.
fn write_output(path: &Path, content: &[u8]) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content)
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_populate_args() {
        let cli = Cli::try_parse_from([
            "pptfill", "populate", "-t", "deck.pptx", "-d", "data.json", "--strict", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Command::Populate(args) = cli.command else {
            panic!("expected populate");
        };
        assert_eq!(args.slide_index, 0);
        assert!(args.strict);
        assert!(args.output.is_none());
    }

    #[test]
    fn test_extract_all_conflicts_with_slide_index() {
        assert!(Cli::try_parse_from(["pptfill", "extract", "deck.pptx", "--all", "-s", "2"]).is_err());
    }

    #[test]
    fn test_extract_rejects_non_pptx_as_input_error() {
        let path = std::env::temp_dir().join(format!("pptfill-extract-{}.pptx", std::process::id()));
        std::fs::write(&path, b"not a presentation").unwrap();

        let args = ExtractArgs {
            input: path.clone(),
            slide_index: 0,
            all: false,
            output: None,
        };
        let err = run_extract(&args).unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert!(is_input_failure(&err));
        assert!(matches!(
            err.downcast_ref::<pptfill_core::Error>(),
            Some(pptfill_core::Error::InvalidPackage(_))
        ));
    }

    #[test]
    fn test_missing_file_is_not_input_error() {
        let args = ExtractArgs {
            input: PathBuf::from("/nonexistent/pptfill/deck.pptx"),
            slide_index: 0,
            all: true,
            output: None,
        };
        let err = run_extract(&args).unwrap_err();
        assert!(!is_input_failure(&err));
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("dir/template.pptx"), "_populated", "pptx"),
            PathBuf::from("dir/template_populated.pptx")
        );
        assert_eq!(
            default_output_path(Path::new("template.pptx"), "_populated", "pptx"),
            PathBuf::from("template_populated.pptx")
        );
    }
}
