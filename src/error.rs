use std::fmt;
use std::path::{Path, PathBuf};

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the application
#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),
    Syntax(SyntaxError),
    Validation { group: String, error: ValidationError },
    InvalidArgument(String),
    UnknownEncoding(String),
    Decode { file: PathBuf, encoding: String },
    SerializationError(String),
}

/// A malformed comment or annotation, located in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// File the offending text came from
    pub file: PathBuf,
    /// 1-based line number
    pub line: usize,
    pub message: String,
}

/// A structural violation in an assembled document.
///
/// `field` is a dotted path relative to the record that was validated; each
/// enclosing record prefixes its own field name on the way up, so the error
/// returned from a whole document reads like `info.contact.email`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl SyntaxError {
    pub fn new(file: &Path, line: usize, message: impl Into<String>) -> Self {
        Self {
            file: file.to_path_buf(),
            line,
            message: message.into(),
        }
    }
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Error for a required field left empty
    pub fn required(field: impl Into<String>) -> Self {
        Self::new(field, "is required")
    }

    /// Error for a field whose value has the wrong shape
    pub fn invalid_format(field: impl Into<String>) -> Self {
        Self::new(field, "has an invalid format")
    }

    /// Error for a field whose value is outside its allowed set
    pub fn invalid_value(field: impl Into<String>) -> Self {
        Self::new(field, "has an invalid value")
    }

    /// Prepends `prefix` to the field path.
    ///
    /// Index-style segments (`[0]`, `[name]`) are joined without a dot.
    pub fn prefixed(mut self, prefix: &str) -> Self {
        self.field = if self.field.is_empty() {
            prefix.to_string()
        } else if self.field.starts_with('[') {
            format!("{}{}", prefix, self.field)
        } else {
            format!("{}.{}", prefix, self.field)
        };
        self
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file.display(), self.line, self.message)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

impl std::error::Error for SyntaxError {}

impl std::error::Error for ValidationError {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "IO error: {}", e),
            Error::Syntax(e) => write!(f, "syntax error {}", e),
            Error::Validation { group, error } => {
                write!(f, "validation error in group `{}`: {}", group, error)
            }
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Error::UnknownEncoding(name) => write!(f, "unknown encoding: {}", name),
            Error::Decode { file, encoding } => {
                write!(f, "{} is not valid {}", file.display(), encoding)
            }
            Error::SerializationError(msg) => write!(f, "serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            Error::Syntax(e) => Some(e),
            Error::Validation { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<SyntaxError> for Error {
    fn from(err: SyntaxError) -> Self {
        Error::Syntax(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::SerializationError(format!("YAML serialization error: {}", err))
    }
}
