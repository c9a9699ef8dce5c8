#![deny(missing_docs)]
//! Parser and writer for deb822 paragraphs.
//!
//! deb822 is the RFC822-like format used by Debian control files, `.dsc` and
//! `.changes` files, and archive indexes such as `Packages` and `Sources`.
//!
//! Values are kept as text: a folded field keeps its continuation lines,
//! leading whitespace included, so that parsing and writing a paragraph gives
//! back the input. PGP armor around signed files is stripped (not verified)
//! before parsing.
//!
//! # Example
//!
//! ```rust
//! use deb822::Paragraph;
//!
//! let p: Paragraph = "Package: hello\nversion: 2.10-3\n".parse().unwrap();
//! assert_eq!(p.get("Version"), Some("2.10-3"));
//! assert_eq!(p.to_string(), "Package: hello\nversion: 2.10-3\n");
//! ```

mod dict;
pub mod multivalued;
mod paragraph;
mod signature;

pub use dict::Deb822Dict;
pub use multivalued::{MultivaluedParagraph, Row, Schema, SizeJustification, Table};
pub use paragraph::{iter_paragraphs, Paragraph, ParagraphReader, ParseOptions};

/// Error type for the parser.
#[derive(Debug)]
pub enum Error {
    /// A line that is neither a field, a continuation, nor a comment.
    Parse {
        /// 1-based line number in the input.
        line_number: usize,
        /// The offending line.
        line: String,
    },

    /// No paragraph was found in the input.
    EmptyInput,

    /// A row of a multivalued field does not match its columns.
    InvalidRow {
        /// The field the row belongs to.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Two values of a field cannot be merged.
    Merge {
        /// The field being merged.
        field: String,
        /// Why the values cannot be merged.
        reason: String,
    },

    /// IO error.
    Io(std::io::Error),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Self::Parse { line_number, line } => {
                write!(f, "Parse error at line {}: {:?}", line_number, line)
            }
            Self::EmptyInput => f.write_str("No paragraph found in input"),
            Self::InvalidRow { field, reason } => {
                write!(f, "Invalid row in field {}: {}", field, reason)
            }
            Self::Merge { field, reason } => {
                write!(f, "Cannot merge field {}: {}", field, reason)
            }
            Self::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}
