//! apidoc-from-source - OpenAPI documents from `@api` comment annotations.
//!
//! This library reads source files written in Go, C, C++, PHP, JavaScript or
//! Ruby, collects the documentation annotations in their comments, and turns
//! them into one validated OpenAPI 3.0 document per documentation group.
//!
//! # Architecture
//!
//! 1. [`scanner`] - Finds source files and detects their language
//! 2. [`input`] - Reads and decodes a source file
//! 3. [`extractor`] - Pulls comment blocks out of source text using a [`language`] grammar
//! 4. [`tag`] - Splits a comment block into `@tag` annotations
//! 5. [`interpreter`] - Turns annotation runs into [`entry`] values, reading
//!    structured bodies with the [`outline`] parser
//! 6. [`assembler`] - Collects entries per group, from many threads at once
//! 7. [`openapi`] - Builds the document of each group
//! 8. [`validator`] - Checks documents against OpenAPI rules
//! 9. [`pipeline`] - Runs all of the above over a worker pool
//! 10. [`serializer`] - Writes the documents as YAML or JSON
//!
//! # Example Usage
//!
//! ```no_run
//! use apidoc_from_source::{
//!     language::GrammarRegistry,
//!     pipeline::generate,
//!     scanner::FileScanner,
//!     serializer::serialize_yaml,
//! };
//! use std::path::PathBuf;
//!
//! let registry = GrammarRegistry::builtin();
//! let scan = FileScanner::new(PathBuf::from("./my-service"), &registry)
//!     .recursive(true)
//!     .scan()
//!     .unwrap();
//!
//! let outcome = generate(&registry, scan.sources, 0);
//! for error in &outcome.errors {
//!     eprintln!("{}", error);
//! }
//! println!("{}", serialize_yaml(&outcome.documents).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod assembler;
pub mod cli;
pub mod entry;
pub mod error;
pub mod extractor;
pub mod input;
pub mod interpreter;
pub mod language;
pub mod openapi;
pub mod outline;
pub mod pipeline;
pub mod scanner;
pub mod serializer;
pub mod tag;
pub mod validator;
