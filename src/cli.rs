use crate::input::Encoding;
use crate::language::GrammarRegistry;
use crate::pipeline::generate;
use crate::scanner::FileScanner;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use log::{debug, error, info, warn};
use std::path::PathBuf;

/// Generate OpenAPI documents from @api comment annotations in source code
#[derive(Parser, Debug)]
#[command(name = "apidoc-from-source")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Source file or directory to scan
    #[arg(value_name = "SOURCE_PATH")]
    pub source_path: PathBuf,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Only read sources of this language (if not specified, detect from file extensions)
    #[arg(short = 'l', long = "lang", value_name = "LANG")]
    pub language: Option<String>,

    /// Encoding of the source files
    #[arg(short = 'e', long = "encoding", default_value = "utf-8")]
    pub encoding: String,

    /// Scan subdirectories too
    #[arg(short = 'r', long = "recursive")]
    pub recursive: bool,

    /// Number of worker threads (0 uses every available core)
    #[arg(short = 'j', long = "jobs", default_value_t = 0)]
    pub jobs: usize,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.source_path.exists() {
        bail!("Source path does not exist: {}", args.source_path.display());
    }
    let encoding: Encoding = args.encoding.parse()?;

    info!("Source path: {}", args.source_path.display());
    info!("Output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }
    if let Some(ref language) = args.language {
        info!("Language: {}", language);
    } else {
        info!("Language: detect from extension");
    }
    info!("Encoding: {}", encoding);

    Ok(args)
}

/// Run the main workflow
///
/// Documents of every valid group are written even when other groups or
/// files failed; the run still fails if anything was reported.
pub fn run(args: CliArgs) -> Result<()> {
    let encoding: Encoding = args.encoding.parse()?;
    let registry = GrammarRegistry::builtin();

    info!("Starting OpenAPI document generation...");

    // Step 1: Find source files
    info!("Scanning {}...", args.source_path.display());
    let scan_result = FileScanner::new(args.source_path.clone(), &registry)
        .recursive(args.recursive)
        .language(args.language.clone())
        .encoding(encoding)
        .scan()?;

    info!("Found {} source files", scan_result.sources.len());
    for warning in &scan_result.warnings {
        warn!("{}", warning);
    }
    if scan_result.sources.is_empty() {
        bail!(
            "No source files found (supported languages: {})",
            registry.languages().join(", ")
        );
    }
    let files = scan_result.sources.len();

    // Step 2: Extract, interpret, assemble, build and validate
    let outcome = generate(&registry, scan_result.sources, args.jobs);
    for e in &outcome.errors {
        error!("{}", e);
    }
    info!("Built {} documents", outcome.documents.len());

    // Step 3: Serialize to requested format
    if !outcome.documents.is_empty() {
        info!("Serializing to {:?} format...", args.output_format);
        let content = match args.output_format {
            OutputFormat::Yaml => serialize_yaml(&outcome.documents)?,
            OutputFormat::Json => serialize_json(&outcome.documents)?,
        };

        // Step 4: Output to file or stdout
        if let Some(output_path) = &args.output_path {
            info!("Writing output to: {}", output_path.display());
            write_to_file(&content, output_path)?;
        } else {
            println!("{}", content);
        }
    }

    info!("Summary:");
    info!("  - Files scanned: {}", files);
    info!("  - Groups written: {:?}", outcome.documents.keys().collect::<Vec<_>>());
    info!("  - Errors: {}", outcome.errors.len());

    if !outcome.errors.is_empty() {
        bail!("{} errors reported", outcome.errors.len());
    }
    Ok(())
}
