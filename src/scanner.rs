use crate::input::{Encoding, SourceFile};
use crate::language::GrammarRegistry;
use anyhow::{bail, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directory names never descended into
const SKIPPED_DIRS: [&str; 3] = ["target", "node_modules", "vendor"];

/// File scanner for finding documented source files.
///
/// The `FileScanner` walks a directory (only its top level unless recursion
/// is enabled) and keeps every file whose extension belongs to a language
/// of the grammar registry. It skips hidden directories (those starting
/// with `.`) and the usual dependency and build directories: `target`,
/// `node_modules` and `vendor`.
///
/// # Example
///
/// ```no_run
/// use apidoc_from_source::language::GrammarRegistry;
/// use apidoc_from_source::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let registry = GrammarRegistry::builtin();
/// let scanner = FileScanner::new(PathBuf::from("./my-service"), &registry).recursive(true);
/// let result = scanner.scan().unwrap();
/// println!("Found {} source files", result.sources.len());
/// ```
pub struct FileScanner<'r> {
    root_path: PathBuf,
    registry: &'r GrammarRegistry,
    recursive: bool,
    language: Option<String>,
    encoding: Encoding,
}

/// Result of directory scanning operation.
///
/// Contains the discovered source files and any warnings encountered during scanning.
pub struct ScanResult {
    /// Discovered files in path order, with their detected language
    pub sources: Vec<SourceFile>,
    /// Warning messages for any issues encountered (e.g., inaccessible directories)
    pub warnings: Vec<String>,
}

impl<'r> FileScanner<'r> {
    /// Creates a new `FileScanner`.
    ///
    /// # Arguments
    ///
    /// * `root_path` - The directory to scan, or a single file
    /// * `registry` - Grammars whose extensions decide which files are kept
    pub fn new(root_path: PathBuf, registry: &'r GrammarRegistry) -> Self {
        Self {
            root_path,
            registry,
            recursive: false,
            language: None,
            encoding: Encoding::Utf8,
        }
    }

    /// Descend into subdirectories
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Only keep files of `language` instead of every known language.
    ///
    /// A single file given as the root is read as `language` whatever its
    /// extension.
    pub fn language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    /// Encoding recorded on every discovered file
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Scans the root and collects every source file of a known language.
    ///
    /// If any directories or files cannot be accessed, warnings are logged and added to
    /// the result, but scanning continues.
    ///
    /// # Returns
    ///
    /// Returns a `ScanResult` containing the discovered files and any warnings.
    ///
    /// # Errors
    ///
    /// Returns an error if the forced language is not registered, or if the
    /// root is a single file whose language cannot be determined.
    pub fn scan(&self) -> Result<ScanResult> {
        if let Some(language) = &self.language {
            if self.registry.get(language).is_none() {
                bail!(
                    "Unknown language `{}` (supported: {})",
                    language,
                    self.registry.languages().join(", ")
                );
            }
        }

        if self.root_path.is_file() {
            let language = match &self.language {
                Some(language) => language.to_ascii_lowercase(),
                None => match self.detect(&self.root_path) {
                    Some(language) => language.to_string(),
                    None => bail!(
                        "Cannot determine the language of {}; use --lang",
                        self.root_path.display()
                    ),
                },
            };
            return Ok(ScanResult {
                sources: vec![self.source(&self.root_path, language)],
                warnings: Vec::new(),
            });
        }

        let mut sources = Vec::new();
        let mut warnings = Vec::new();
        let max_depth = if self.recursive { usize::MAX } else { 1 };

        for entry in WalkDir::new(&self.root_path)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                // Don't filter the root directory itself
                if e.path() == self.root_path || !e.file_type().is_dir() {
                    return true;
                }
                let file_name = e.file_name().to_string_lossy();
                !file_name.starts_with('.') && !SKIPPED_DIRS.contains(&file_name.as_ref())
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    match self.detect(path) {
                        Some(language) if self.accepts(language) => {
                            sources.push(self.source(path, language.to_string()));
                        }
                        Some(language) => debug!("Skipping {} file {}", language, path.display()),
                        None => {}
                    }
                }
                Err(e) => {
                    // Record warning for inaccessible directories/files
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        Ok(ScanResult { sources, warnings })
    }

    fn detect(&self, path: &Path) -> Option<&'static str> {
        let ext = path.extension()?.to_str()?;
        self.registry.language_for_extension(ext)
    }

    fn accepts(&self, language: &str) -> bool {
        match &self.language {
            Some(forced) => forced.eq_ignore_ascii_case(language),
            None => true,
        }
    }

    fn source(&self, path: &Path, language: String) -> SourceFile {
        SourceFile {
            path: path.to_path_buf(),
            language,
            encoding: self.encoding,
        }
    }
}
