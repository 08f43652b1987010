//! The per-file pipeline and the worker pool that runs it.
//!
//! Each file goes through extraction, tag parsing and interpretation on one
//! worker; the resulting entries land in a shared [`DocumentSet`]. Once every
//! file is done the groups are built into OpenAPI documents and validated.

use crate::assembler::{DocumentSet, GroupEntries};
use crate::error::{Error, SyntaxError};
use crate::extractor::CommentExtractor;
use crate::input::{load_source, SourceFile, SourceText};
use crate::interpreter::interpret;
use crate::language::GrammarRegistry;
use crate::openapi::{build_document, OpenApiDocument};
use crate::tag::parse_block;
use crate::validator::Validate;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::thread;

/// Entries collected from a set of files, plus every error met on the way.
#[derive(Debug)]
pub struct ScanOutcome {
    pub documents: DocumentSet,
    pub errors: Vec<Error>,
    /// Number of files handed to the pool
    pub files: usize,
}

/// Validated documents keyed by group, plus every error met on the way.
#[derive(Debug, Default)]
pub struct BuildOutcome {
    pub documents: BTreeMap<String, OpenApiDocument>,
    pub errors: Vec<Error>,
}

/// Runs one decoded file through the pipeline, adding its entries to `documents`.
///
/// # Returns
///
/// The syntax errors of the file. An unterminated block comment or an
/// unknown language yields a single error and no entries; a malformed run
/// only drops that run.
pub fn process_text(
    extractor: &CommentExtractor,
    documents: &DocumentSet,
    path: &Path,
    language: &str,
    text: &str,
) -> Vec<SyntaxError> {
    let blocks = match extractor.extract(path, language, text) {
        Ok(blocks) => blocks,
        Err(e) => return vec![e],
    };
    let Some(grammar) = extractor.registry().get(language) else {
        return vec![SyntaxError::new(path, 0, format!("unknown language `{}`", language))];
    };

    let mut errors = Vec::new();
    let mut entries = 0;
    for block in &blocks {
        let annotations = parse_block(block, grammar);
        if annotations.is_empty() {
            continue;
        }
        let interpretation = interpret(annotations);
        errors.extend(interpretation.errors);
        for entry in interpretation.entries {
            documents.assemble(entry);
            entries += 1;
        }
    }

    debug!(
        "{}: {} comment blocks, {} entries, {} errors",
        path.display(),
        blocks.len(),
        entries,
        errors.len()
    );
    errors
}

/// Runs already-decoded texts through the pipeline on `jobs` workers.
///
/// `jobs == 0` uses the available parallelism.
pub fn scan_texts(registry: &GrammarRegistry, sources: Vec<SourceText>, jobs: usize) -> ScanOutcome {
    run_pool(registry, sources, jobs, Ok)
}

/// Loads and runs source files through the pipeline on `jobs` workers.
///
/// A file that cannot be loaded is reported and skipped.
pub fn scan_files(registry: &GrammarRegistry, sources: Vec<SourceFile>, jobs: usize) -> ScanOutcome {
    run_pool(registry, sources, jobs, |source| load_source(&source))
}

fn run_pool<S, F>(registry: &GrammarRegistry, sources: Vec<S>, jobs: usize, load: F) -> ScanOutcome
where
    S: Send,
    F: Fn(S) -> Result<SourceText, Error> + Sync,
{
    let files = sources.len();
    let workers = effective_jobs(jobs, files);
    let documents = DocumentSet::new();
    let extractor = CommentExtractor::new(registry);
    info!("Processing {} files on {} workers", files, workers);

    let mut errors = thread::scope(|scope| {
        let (source_tx, source_rx) = crossbeam_channel::unbounded::<S>();
        let (error_tx, error_rx) = crossbeam_channel::unbounded::<Error>();

        for _ in 0..workers {
            let source_rx = source_rx.clone();
            let error_tx = error_tx.clone();
            let extractor = &extractor;
            let documents = &documents;
            let load = &load;
            scope.spawn(move || {
                while let Ok(source) = source_rx.recv() {
                    let text = match load(source) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!("Skipping file: {}", e);
                            let _ = error_tx.send(e);
                            continue;
                        }
                    };
                    for e in process_text(extractor, documents, &text.path, &text.language, &text.text) {
                        let _ = error_tx.send(Error::Syntax(e));
                    }
                }
            });
        }
        drop(error_tx);

        for source in sources {
            if source_tx.send(source).is_err() {
                break;
            }
        }
        drop(source_tx);

        error_rx.iter().collect::<Vec<_>>()
    });

    errors.sort_by_cached_key(error_location);
    ScanOutcome {
        documents,
        errors,
        files,
    }
}

fn effective_jobs(requested: usize, files: usize) -> usize {
    let requested = if requested == 0 {
        thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    } else {
        requested
    };
    requested.clamp(1, files.max(1))
}

/// Orders errors by where they happened; errors without a location come first
fn error_location(error: &Error) -> (PathBuf, usize) {
    match error {
        Error::Syntax(e) => (e.file.clone(), e.line),
        Error::Decode { file, .. } => (file.clone(), 0),
        _ => (PathBuf::new(), 0),
    }
}

/// Builds and validates the document of every group.
///
/// A group with a conflicting declaration or a validation failure is left
/// out of the documents; its errors are reported. Other groups are not
/// affected.
pub fn build_documents(groups: BTreeMap<String, GroupEntries>) -> BuildOutcome {
    let mut outcome = BuildOutcome::default();

    for (group, entries) in groups {
        let (document, conflicts) = build_document(&group, &entries);
        if !conflicts.is_empty() {
            outcome.errors.extend(conflicts.into_iter().map(|error| Error::Validation {
                group: group.clone(),
                error,
            }));
            continue;
        }

        match document.validate() {
            Ok(()) => {
                debug!("Group {} is valid ({} paths)", group, document.paths.len());
                outcome.documents.insert(group, document);
            }
            Err(error) => outcome.errors.push(Error::Validation { group, error }),
        }
    }

    outcome
}

/// Scans `sources` and builds every group's document.
///
/// Scan errors come first in the returned error list, followed by build
/// errors in group order.
pub fn generate(registry: &GrammarRegistry, sources: Vec<SourceFile>, jobs: usize) -> BuildOutcome {
    let scan = scan_files(registry, sources, jobs);
    let mut outcome = build_documents(scan.documents.into_groups());

    let mut errors = scan.errors;
    errors.append(&mut outcome.errors);
    outcome.errors = errors;
    outcome
}
