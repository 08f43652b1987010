//! Loading source files into text.

use crate::error::{Error, Result};
use log::debug;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

/// Character encoding of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    Gbk,
    Gb18030,
    Gb2312,
    Big5,
}

impl Encoding {
    /// The decoder for this encoding.
    ///
    /// gb2312 sources are EUC-CN, which GBK extends byte for byte.
    fn codec(&self) -> &'static encoding_rs::Encoding {
        match self {
            Encoding::Utf8 => encoding_rs::UTF_8,
            Encoding::Gbk | Encoding::Gb2312 => encoding_rs::GBK,
            Encoding::Gb18030 => encoding_rs::GB18030,
            Encoding::Big5 => encoding_rs::BIG5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Gbk => "gbk",
            Encoding::Gb18030 => "gb18030",
            Encoding::Gb2312 => "gb2312",
            Encoding::Big5 => "big5",
        }
    }
}

impl FromStr for Encoding {
    type Err = Error;

    /// Parses an encoding name, ignoring case. `utf8` and `utf-8` are the same.
    fn from_str(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            "gbk" => Ok(Encoding::Gbk),
            "gb18030" => Ok(Encoding::Gb18030),
            "gb2312" => Ok(Encoding::Gb2312),
            "big5" => Ok(Encoding::Big5),
            _ => Err(Error::UnknownEncoding(name.to_string())),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file to read, with the language its comments are written in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Language id known to the grammar registry
    pub language: String,
    pub encoding: Encoding,
}

/// Decoded contents of a [`SourceFile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    pub path: PathBuf,
    pub language: String,
    pub text: String,
}

/// Reads and decodes `source`.
///
/// The byte order mark of a UTF-8 file is dropped.
///
/// # Errors
///
/// Returns `Error::IoError` if the file cannot be read and `Error::Decode`
/// if its bytes are malformed in the file's encoding.
pub fn load_source(source: &SourceFile) -> Result<SourceText> {
    debug!("Loading {} as {}", source.path.display(), source.encoding);

    let bytes = fs::read(&source.path)?;
    let (text, had_errors) = source.encoding.codec().decode_with_bom_removal(&bytes);
    if had_errors {
        return Err(Error::Decode {
            file: source.path.clone(),
            encoding: source.encoding.to_string(),
        });
    }

    Ok(SourceText {
        path: source.path.clone(),
        language: source.language.clone(),
        text: text.into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn source(path: PathBuf, encoding: Encoding) -> SourceFile {
        SourceFile {
            path,
            language: "go".to_string(),
            encoding,
        }
    }

    #[test]
    fn test_encoding_names() {
        assert_eq!("utf8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!("UTF-8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!("GBK".parse::<Encoding>().unwrap(), Encoding::Gbk);
        assert_eq!("big5".parse::<Encoding>().unwrap(), Encoding::Big5);
        assert!(matches!("latin1".parse::<Encoding>(), Err(Error::UnknownEncoding(name)) if name == "latin1"));
    }

    #[test]
    fn test_load_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.go");
        fs::write(&path, "\u{feff}// @api GET / root\n").unwrap();

        let text = load_source(&source(path.clone(), Encoding::Utf8)).unwrap();
        assert_eq!(text.text, "// @api GET / root\n");
        assert_eq!(text.path, path);
        assert_eq!(text.language, "go");
    }

    #[test]
    fn test_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.go");
        fs::write(&path, [b'/', b'/', 0xff, 0xfe]).unwrap();

        match load_source(&source(path.clone(), Encoding::Utf8)) {
            Err(Error::Decode { file, encoding }) => {
                assert_eq!(file, path);
                assert_eq!(encoding, "utf-8");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_load_gbk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.go");
        let mut bytes = b"// @api GET /users ".to_vec();
        // "中文" in GBK
        bytes.extend([0xd6, 0xd0, 0xce, 0xc4]);
        bytes.push(b'\n');
        fs::write(&path, &bytes).unwrap();

        for encoding in [Encoding::Gbk, Encoding::Gb2312, Encoding::Gb18030] {
            let text = load_source(&source(path.clone(), encoding)).unwrap();
            assert_eq!(text.text, "// @api GET /users 中文\n");
        }
        assert!(matches!(
            load_source(&source(path, Encoding::Utf8)),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn test_load_big5() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.rb");
        // "中文" in Big5
        fs::write(&path, [b'#', b' ', 0xa4, 0xa4, 0xa4, 0xe5]).unwrap();

        let text = load_source(&source(path, Encoding::Big5)).unwrap();
        assert_eq!(text.text, "# 中文");
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = load_source(&source(dir.path().join("missing.go"), Encoding::Utf8));
        assert!(matches!(result, Err(Error::IoError(_))));
    }
}
