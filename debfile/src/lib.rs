#![deny(missing_docs)]
//! Reader for Debian binary packages.
//!
//! A `.deb` file is an `ar` archive with three members: `debian-binary`,
//! holding the format version, and two compressed tar archives, the control
//! part (`control.tar.*`) with the package metadata and maintainer scripts,
//! and the data part (`data.tar.*`) with the installed files.
//!
//! The parts are only decompressed when first looked at.
//!
//! # Example
//!
//! ```rust,no_run
//! use debfile::DebFile;
//!
//! let deb = DebFile::open("hello_2.10-3_amd64.deb").unwrap();
//! let control = deb.debcontrol().unwrap();
//! println!("{} {}", deb.package_name().unwrap(), control.get("Version").unwrap());
//! for name in deb.data().names().unwrap() {
//!     println!("{}", name);
//! }
//! ```

pub mod arfile;
mod debfile;

pub use crate::debfile::{
    Compression, DebControl, DebFile, DebPart, TarEntry, TarIndex, MAINTAINER_SCRIPTS,
};

/// Error reading a package.
#[derive(Debug)]
pub enum Error {
    /// The container is not a valid ar archive.
    Ar(arfile::Error),

    /// Required members are missing from the archive.
    MissingMembers(Vec<String>),

    /// No such file in a package part.
    FileNotFound(String),

    /// A part is compressed in a way that is not supported.
    UnsupportedCompression(String),

    /// The control file has no `Package` field.
    MissingPackageField,

    /// A line of a checksums file is not `checksum path`.
    InvalidChecksumLine {
        /// The checksums file.
        file: String,
        /// 1-based line number.
        line_number: usize,
        /// The offending line.
        line: String,
    },

    /// Text that should be UTF-8 is not.
    Utf8(std::str::Utf8Error),

    /// The control file could not be parsed.
    Paragraph(deb822::Error),

    /// The changelog could not be parsed.
    Changelog(debian_changelog::Error),

    /// IO error.
    Io(std::io::Error),
}

impl From<arfile::Error> for Error {
    fn from(e: arfile::Error) -> Self {
        Self::Ar(e)
    }
}

impl From<deb822::Error> for Error {
    fn from(e: deb822::Error) -> Self {
        Self::Paragraph(e)
    }
}

impl From<debian_changelog::Error> for Error {
    fn from(e: debian_changelog::Error) -> Self {
        Self::Changelog(e)
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(e: std::str::Utf8Error) -> Self {
        Self::Utf8(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Self::Ar(e) => write!(f, "{}", e),
            Self::MissingMembers(names) => write!(
                f,
                "The following required .deb members are missing: {}",
                names.join(", ")
            ),
            Self::FileNotFound(name) => write!(f, "File not found: {}", name),
            Self::UnsupportedCompression(name) => {
                write!(f, "Unsupported compression for member {}", name)
            }
            Self::MissingPackageField => f.write_str("Control file has no Package field"),
            Self::InvalidChecksumLine {
                file,
                line_number,
                line,
            } => write!(
                f,
                "Invalid line {} in {}: {:?}",
                line_number, file, line
            ),
            Self::Utf8(e) => write!(f, "Invalid UTF-8: {}", e),
            Self::Paragraph(e) => write!(f, "{}", e),
            Self::Changelog(e) => write!(f, "{}", e),
            Self::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Ar(e) => Some(e),
            Self::Utf8(e) => Some(e),
            Self::Paragraph(e) => Some(e),
            Self::Changelog(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}
