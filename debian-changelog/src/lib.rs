#![deny(missing_docs)]
//! Parser for Debian changelog files.
//!
//! A changelog is a list of blocks, newest first. Each block has a heading
//! naming the package, version, target distributions and urgency, a number of
//! change lines, and a trailer with the author and date:
//!
//! ```text
//! hello (2.10-3) unstable; urgency=medium
//!
//!   * Fix the build with newer compilers.
//!
//!  -- Jane Doe <jane@example.com>  Mon, 01 Jan 2024 12:00:00 +0000
//! ```
//!
//! Parsing keeps every line, so writing a changelog that was read unmodified
//! gives back the exact input.
//!
//! # Example
//!
//! ```rust
//! use debian_changelog::Changelog;
//!
//! let text = "hello (2.10-3) unstable; urgency=medium\n\n  * New release.\n\n -- Jane Doe <jane@example.com>  Mon, 01 Jan 2024 12:00:00 +0000\n";
//! let mut cl: Changelog = text.parse().unwrap();
//! assert_eq!(cl.package(), "hello");
//! assert_eq!(cl.to_string(), text);
//!
//! cl.set_distributions("experimental");
//! assert!(cl.to_string().starts_with("hello (2.10-3) experimental; urgency=medium\n"));
//! ```

mod block;
mod parse;

pub use block::ChangeBlock;
pub use debian_version::{Version, VersionFormatError};

use std::io::Read;
use std::str::FromStr;

/// Error parsing a changelog.
#[derive(Debug)]
pub enum Error {
    /// A line that does not fit where it appears.
    Parse {
        /// 1-based line number in the input.
        line_number: usize,
        /// The offending line.
        line: String,
        /// What the parser was looking for.
        expected: String,
    },

    /// The input contains no block.
    EmptyInput,

    /// The input ended in the middle of a block.
    UnexpectedEndOfInput {
        /// What the parser was looking for.
        expected: String,
    },

    /// A block has an author but no date, or a date but no author, so its
    /// trailer cannot be written.
    IncompleteBlock {
        /// Package of the block.
        package: String,
        /// Version of the block, as written.
        version: String,
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
            Self::Parse {
                line_number,
                line,
                expected,
            } => write!(
                f,
                "Parse error at line {}: expected {}, got {:?}",
                line_number, expected, line
            ),
            Self::EmptyInput => f.write_str("No changelog block found in input"),
            Self::UnexpectedEndOfInput { expected } => {
                write!(f, "Unexpected end of input, expected {}", expected)
            }
            Self::IncompleteBlock { package, version } => write!(
                f,
                "Block {} ({}) needs both an author and a date",
                package, version
            ),
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

/// Options for parsing a changelog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub(crate) max_blocks: Option<usize>,
    pub(crate) allow_empty_author: bool,
    pub(crate) strict: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_blocks: None,
            allow_empty_author: false,
            strict: true,
        }
    }
}

impl ParseOptions {
    /// Default options: read every block, require an author in every trailer,
    /// and fail on malformed lines.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop after this many blocks.
    pub fn max_blocks(mut self, max_blocks: usize) -> Self {
        self.max_blocks = Some(max_blocks);
        self
    }

    /// Accept a bare ` --` trailer without author or date.
    pub fn allow_empty_author(mut self, allow: bool) -> Self {
        self.allow_empty_author = allow;
        self
    }

    /// When false, malformed lines are logged and kept instead of failing
    /// the parse, and a block cut short by the end of input is kept without
    /// a trailer.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// A parsed changelog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changelog {
    pub(crate) initial_blank_lines: Vec<String>,
    // Never empty, newest first.
    pub(crate) blocks: Vec<ChangeBlock>,
    pub(crate) missing_final_newline: bool,
}

impl Changelog {
    /// Create a changelog holding a single block.
    pub fn new(block: ChangeBlock) -> Self {
        Self {
            initial_blank_lines: Vec::new(),
            blocks: vec![block],
            missing_final_newline: false,
        }
    }

    /// Parse a changelog with the default options.
    pub fn parse(text: &str) -> Result<Self, Error> {
        Self::parse_with(text, &ParseOptions::default())
    }

    /// Parse a changelog.
    pub fn parse_with(text: &str, options: &ParseOptions) -> Result<Self, Error> {
        parse::parse(text, options)
    }

    /// Read and parse a changelog.
    pub fn read<R: Read>(mut r: R, options: &ParseOptions) -> Result<Self, Error> {
        let mut text = String::new();
        r.read_to_string(&mut text)?;
        Self::parse_with(&text, options)
    }

    /// Blank lines before the first block.
    pub fn initial_blank_lines(&self) -> &[String] {
        &self.initial_blank_lines
    }

    /// The blocks, newest first.
    pub fn blocks(&self) -> &[ChangeBlock] {
        &self.blocks
    }

    /// Iterate over the blocks, newest first.
    pub fn iter(&self) -> std::slice::Iter<'_, ChangeBlock> {
        self.blocks.iter()
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false, a changelog has at least one block.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Add a new newest block.
    ///
    /// A blank line is added after it, separating it from the block that was
    /// previously the newest.
    pub fn new_block(&mut self, mut block: ChangeBlock) {
        block.add_trailing_line("");
        self.blocks.insert(0, block);
    }

    /// The versions of every block, newest first.
    pub fn versions(&self) -> Result<Vec<Version>, VersionFormatError> {
        self.blocks.iter().map(|b| b.version()).collect()
    }

    fn newest(&self) -> &ChangeBlock {
        &self.blocks[0]
    }

    fn newest_mut(&mut self) -> &mut ChangeBlock {
        &mut self.blocks[0]
    }

    /// Package name of the newest block.
    pub fn package(&self) -> &str {
        self.newest().package()
    }

    /// Set the package name of the newest block.
    pub fn set_package(&mut self, package: &str) {
        self.newest_mut().set_package(package)
    }

    /// Version of the newest block.
    pub fn version(&self) -> Result<Version, VersionFormatError> {
        self.newest().version()
    }

    /// Set the version of the newest block.
    pub fn set_version(&mut self, version: &Version) {
        self.newest_mut().set_version(version)
    }

    /// Version of the newest block, as written.
    pub fn full_version(&self) -> &str {
        self.newest().raw_version()
    }

    /// Epoch of the newest version.
    pub fn epoch(&self) -> Result<Option<u32>, VersionFormatError> {
        Ok(self.version()?.epoch())
    }

    /// Upstream part of the newest version.
    pub fn upstream_version(&self) -> Result<String, VersionFormatError> {
        Ok(self.version()?.upstream_version().to_string())
    }

    /// Debian revision of the newest version.
    pub fn debian_revision(&self) -> Result<Option<String>, VersionFormatError> {
        Ok(self.version()?.debian_revision().map(|r| r.to_string()))
    }

    /// Distributions of the newest block.
    pub fn distributions(&self) -> &str {
        self.newest().distributions()
    }

    /// Set the distributions of the newest block.
    pub fn set_distributions(&mut self, distributions: &str) {
        self.newest_mut().set_distributions(distributions)
    }

    /// Urgency of the newest block.
    pub fn urgency(&self) -> Option<&str> {
        self.newest().urgency()
    }

    /// Set the urgency of the newest block.
    pub fn set_urgency(&mut self, urgency: &str) {
        self.newest_mut().set_urgency(urgency)
    }

    /// Author of the newest block.
    pub fn author(&self) -> Option<&str> {
        self.newest().author()
    }

    /// Set the author of the newest block.
    pub fn set_author(&mut self, author: &str) {
        self.newest_mut().set_author(author)
    }

    /// Date of the newest block.
    pub fn date(&self) -> Option<&str> {
        self.newest().date()
    }

    /// Set the date of the newest block.
    pub fn set_date(&mut self, date: &str) {
        self.newest_mut().set_date(date)
    }

    /// Add a change line to the newest block.
    pub fn add_change(&mut self, change: &str) {
        self.newest_mut().add_change(change)
    }

    /// Write the changelog, refusing blocks with half a trailer.
    ///
    /// Unlike `Display`, this checks every block first, so nothing is
    /// written when one of them has an author but no date or the reverse.
    pub fn write_to<W: std::io::Write>(&self, mut w: W) -> Result<(), Error> {
        for block in &self.blocks {
            block.check_trailer()?;
        }
        w.write_all(self.to_string().as_bytes())?;
        Ok(())
    }
}

impl FromStr for Changelog {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Changelog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut text = String::new();
        for line in &self.initial_blank_lines {
            text.push_str(line);
            text.push('\n');
        }
        for block in &self.blocks {
            text.push_str(&block.to_string());
        }
        if self.missing_final_newline {
            text.pop();
        }
        f.write_str(&text)
    }
}

impl<'a> IntoIterator for &'a Changelog {
    type Item = &'a ChangeBlock;
    type IntoIter = std::slice::Iter<'a, ChangeBlock>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const GNUTLS: &str = indoc! {"
        gnutls13 (1:1.4.1-1) unstable; urgency=HIGH

          [ James Westby ]
          * New upstream release.
          * Remove the following patches as they are now included upstream:
            - 10_certtoolmanpage.diff
            - 15_fixcompilewarning.diff
          * Link the API reference in /usr/share/gtk-doc/html as gnutls rather than
            gnutls-api so that devhelp can find it.

         -- Andreas Metzler <ametzler@debian.org>  Sat, 15 Jul 2006 11:11:08 +0200

        gnutls13 (1.4.0-2) unstable; urgency=low

          [ Andreas Metzler ]
          * Use /usr/share/dpatch/dpatch.make for patching.

         -- Andreas Metzler <ametzler@debian.org>  Sat,  1 Jul 2006 12:50:44 +0200

        gnutls13 (1.4.0-1) experimental; urgency=low (not urgent at all), binary-only=yes

          * New upstream version.

         -- Andreas Metzler <ametzler@debian.org>  Tue, 20 Jun 2006 21:44:14 +0200

        Local variables:
        mode: debian-changelog
        End:
    "};

    #[test]
    fn test_round_trip() {
        let cl = Changelog::parse(GNUTLS).unwrap();
        assert_eq!(cl.len(), 3);
        assert_eq!(cl.to_string(), GNUTLS);
        assert_eq!(
            cl.blocks()[2].trailing_lines(),
            &["", "Local variables:", "mode: debian-changelog", "End:"]
        );
    }

    #[test]
    fn test_fields() {
        let cl = Changelog::parse(GNUTLS).unwrap();
        assert_eq!(cl.package(), "gnutls13");
        assert_eq!(cl.full_version(), "1:1.4.1-1");
        assert_eq!(cl.epoch().unwrap(), Some(1));
        assert_eq!(cl.upstream_version().unwrap(), "1.4.1");
        assert_eq!(cl.debian_revision().unwrap().as_deref(), Some("1"));
        assert_eq!(cl.distributions(), "unstable");
        assert_eq!(cl.urgency(), Some("HIGH"));
        assert_eq!(cl.author(), Some("Andreas Metzler <ametzler@debian.org>"));
        assert_eq!(cl.date(), Some("Sat, 15 Jul 2006 11:11:08 +0200"));

        let oldest = &cl.blocks()[2];
        assert_eq!(oldest.distributions(), "experimental");
        assert_eq!(oldest.urgency(), Some("low"));
        assert_eq!(oldest.urgency_comment(), " (not urgent at all)");
        assert_eq!(
            oldest.other_pairs(),
            &[("binary-only".to_string(), "yes".to_string())]
        );
        assert_eq!(cl.blocks()[1].date(), Some("Sat,  1 Jul 2006 12:50:44 +0200"));
    }

    #[test]
    fn test_versions() {
        let cl = Changelog::parse(GNUTLS).unwrap();
        let versions: Vec<String> = cl
            .versions()
            .unwrap()
            .iter()
            .map(|v| v.to_string())
            .collect();
        assert_eq!(versions, vec!["1:1.4.1-1", "1.4.0-2", "1.4.0-1"]);
        let versions = cl.versions().unwrap();
        assert!(versions[0] > versions[1]);
        assert!(versions[1] > versions[2]);
        assert_eq!(cl.iter().count(), 3);
        assert_eq!((&cl).into_iter().count(), 3);
    }

    #[test]
    fn test_max_blocks() {
        let options = ParseOptions::new().max_blocks(1);
        let cl = Changelog::parse_with(GNUTLS, &options).unwrap();
        assert_eq!(cl.len(), 1);
        let text = cl.to_string();
        assert!(text.starts_with("gnutls13 (1:1.4.1-1) unstable; urgency=HIGH\n"));
        assert!(text.ends_with(" -- Andreas Metzler <ametzler@debian.org>  Sat, 15 Jul 2006 11:11:08 +0200\n\n"));
    }

    #[test]
    fn test_modify() {
        let mut cl = Changelog::parse(GNUTLS).unwrap();
        cl.set_package("gnutls14");
        cl.set_version(&"1:1.4.1-2".parse().unwrap());
        cl.set_distributions("experimental");
        cl.set_urgency("medium");
        cl.set_author("James Westby <jw+debian@jameswestby.net>");
        cl.set_date("Sat, 16 Jul 2008 11:11:08 -0200");
        cl.add_change("  * Add a change.");

        let text = cl.to_string();
        let expected = indoc! {"
            gnutls14 (1:1.4.1-2) experimental; urgency=medium

              [ James Westby ]
              * New upstream release.
              * Remove the following patches as they are now included upstream:
                - 10_certtoolmanpage.diff
                - 15_fixcompilewarning.diff
              * Link the API reference in /usr/share/gtk-doc/html as gnutls rather than
                gnutls-api so that devhelp can find it.
              * Add a change.

             -- James Westby <jw+debian@jameswestby.net>  Sat, 16 Jul 2008 11:11:08 -0200

            gnutls13 (1.4.0-2) unstable; urgency=low
        "};
        assert!(text.starts_with(expected), "{}", text);
        assert!(text.ends_with(&GNUTLS[GNUTLS.find("\n  [ Andreas Metzler ]").unwrap()..]));
    }

    #[test]
    fn test_new_block() {
        let mut cl = Changelog::parse(GNUTLS).unwrap();
        let mut block = ChangeBlock::new(
            "gnutls13",
            &"1:1.4.1-2".parse().unwrap(),
            "unstable",
            "low",
        );
        block.add_change("");
        block.add_change("  * Fix the build.");
        block.add_change("");
        block.set_author("Jane Doe <jane@example.com>");
        block.set_date("Mon, 01 Jan 2024 12:00:00 +0000");
        cl.new_block(block);

        assert_eq!(cl.len(), 4);
        assert_eq!(cl.full_version(), "1:1.4.1-2");
        let expected = format!(
            "gnutls13 (1:1.4.1-2) unstable; urgency=low\n\n  * Fix the build.\n\n -- Jane Doe <jane@example.com>  Mon, 01 Jan 2024 12:00:00 +0000\n\n{}",
            GNUTLS
        );
        assert_eq!(cl.to_string(), expected);
    }

    #[test]
    fn test_no_author() {
        let text = indoc! {"
            foo (1.0-1) UNRELEASED; urgency=low

              * Work in progress.

             --
        "};
        let err = Changelog::parse(text).unwrap_err();
        assert!(matches!(err, Error::Parse { line_number: 5, .. }), "{}", err);

        let options = ParseOptions::new().allow_empty_author(true);
        let cl = Changelog::parse_with(text, &options).unwrap();
        assert_eq!(cl.author(), None);
        assert_eq!(cl.date(), None);
        assert_eq!(cl.to_string(), text);
    }

    #[test]
    fn test_single_block_without_final_newline() {
        let text = "foo (1.0-1) unstable; urgency=low\n\n  * Initial release.\n\n -- Jane Doe <jane@example.com>  Mon, 01 Jan 2024 12:00:00 +0000";
        let cl = Changelog::parse(text).unwrap();
        assert_eq!(cl.len(), 1);
        assert_eq!(cl.to_string(), text);
    }

    #[test]
    fn test_initial_blank_lines() {
        let text = "\n\nfoo (1.0-1) unstable; urgency=low\n\n  * Initial release.\n\n -- Jane Doe <jane@example.com>  Mon, 01 Jan 2024 12:00:00 +0000\n";
        let cl = Changelog::parse(text).unwrap();
        assert_eq!(cl.initial_blank_lines(), &["", ""]);
        assert_eq!(cl.to_string(), text);
    }

    #[test]
    fn test_unexpected_end() {
        let text = "foo (1.0-1) unstable; urgency=low\n\n  * Initial release.\n";
        assert!(matches!(
            Changelog::parse(text),
            Err(Error::UnexpectedEndOfInput { .. })
        ));

        let cl = Changelog::parse_with(text, &ParseOptions::new().strict(false)).unwrap();
        assert!(!cl.blocks()[0].has_trailer());
        assert_eq!(cl.to_string(), text);
    }

    #[test]
    fn test_garbage() {
        let text = indoc! {"
            foo (1.0-1) unstable; urgency=low

              * Initial release.
            this is not a change line
             -- Jane Doe <jane@example.com>  Mon, 01 Jan 2024 12:00:00 +0000
        "};
        match Changelog::parse(text) {
            Err(Error::Parse {
                line_number, line, ..
            }) => {
                assert_eq!(line_number, 4);
                assert_eq!(line, "this is not a change line");
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let cl = Changelog::parse_with(text, &ParseOptions::new().strict(false)).unwrap();
        assert_eq!(cl.blocks()[0].changes().len(), 3);
        assert_eq!(cl.to_string(), text);
    }

    #[test]
    fn test_bad_heading() {
        let text = "no heading here\n";
        assert!(matches!(
            Changelog::parse(text),
            Err(Error::Parse { line_number: 1, .. })
        ));

        let text = "foo (1.0-1) unstable; urgency=low, urgency=high\n\n -- Jane Doe <jane@example.com>  Mon, 01 Jan 2024 12:00:00 +0000\n";
        assert!(matches!(Changelog::parse(text), Err(Error::Parse { .. })));
        let cl = Changelog::parse_with(text, &ParseOptions::new().strict(false)).unwrap();
        assert_eq!(cl.to_string(), text);
    }

    #[test]
    fn test_single_space_separator() {
        let text = "foo (1.0-1) unstable; urgency=low\n\n -- Jane Doe <jane@example.com> Mon, 01 Jan 2024 12:00:00 +0000\n";
        assert!(matches!(
            Changelog::parse(text),
            Err(Error::Parse { line_number: 3, .. })
        ));
        let mut cl = Changelog::parse_with(text, &ParseOptions::new().strict(false)).unwrap();
        assert_eq!(cl.to_string(), text);
        cl.set_date("Tue, 02 Jan 2024 12:00:00 +0000");
        assert!(cl
            .to_string()
            .ends_with(" -- Jane Doe <jane@example.com> Tue, 02 Jan 2024 12:00:00 +0000\n"));
    }

    #[test]
    fn test_old_format_tail() {
        let text = indoc! {"
            foo (1.0-1) unstable; urgency=low

              * New release.

             -- Jane Doe <jane@example.com>  Mon, 01 Jan 2024 12:00:00 +0000

            Old Changelog:
            Fri Mar  1 10:00:00 1996  John Smith  <john@example.com>
            \tSome ancient change
        "};
        let cl = Changelog::parse(text).unwrap();
        assert_eq!(cl.len(), 1);
        assert_eq!(cl.blocks()[0].trailing_lines().len(), 4);
        assert_eq!(cl.to_string(), text);
    }

    #[test]
    fn test_comments_between_blocks() {
        let text = indoc! {"
            foo (1.1-1) unstable; urgency=low

              * New release.

             -- Jane Doe <jane@example.com>  Mon, 01 Jan 2024 12:00:00 +0000

            # a comment
            /* another one */

            foo (1.0-1) unstable; urgency=low

              * Initial release.

             -- Jane Doe <jane@example.com>  Sun, 31 Dec 2023 12:00:00 +0000
            vim: ft=debchangelog
        "};
        let cl = Changelog::parse(text).unwrap();
        assert_eq!(cl.len(), 2);
        assert_eq!(cl.blocks()[1].trailing_lines(), &["vim: ft=debchangelog"]);
        assert_eq!(cl.to_string(), text);
    }

    #[test]
    fn test_empty() {
        assert!(matches!(Changelog::parse(""), Err(Error::EmptyInput)));
        assert!(matches!(Changelog::parse("\n\n"), Err(Error::EmptyInput)));
        let options = ParseOptions::new().max_blocks(0);
        assert!(matches!(
            Changelog::parse_with(GNUTLS, &options),
            Err(Error::EmptyInput)
        ));
    }

    #[test]
    fn test_read() {
        let cl = Changelog::read(GNUTLS.as_bytes(), &ParseOptions::new()).unwrap();
        assert_eq!(cl.to_string(), GNUTLS);
    }

    #[test]
    fn test_error_display() {
        let e = Error::Parse {
            line_number: 4,
            line: "junk".to_string(),
            expected: "first heading".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "Parse error at line 4: expected first heading, got \"junk\""
        );
        let e = Error::UnexpectedEndOfInput {
            expected: "trailer".to_string(),
        };
        assert_eq!(e.to_string(), "Unexpected end of input, expected trailer");
        let e = Error::IncompleteBlock {
            package: "foo".to_string(),
            version: "1.0-1".to_string(),
        };
        assert_eq!(e.to_string(), "Block foo (1.0-1) needs both an author and a date");
    }

    #[test]
    fn test_new_changelog() {
        let mut block = ChangeBlock::new("foo", &"0.1".parse().unwrap(), "UNRELEASED", "medium");
        block.add_change("");
        block.add_change("  * Initial release.");
        block.add_change("");
        let cl = Changelog::new(block);
        assert_eq!(
            cl.to_string(),
            "foo (0.1) UNRELEASED; urgency=medium\n\n  * Initial release.\n\n --\n"
        );
        let options = ParseOptions::new().allow_empty_author(true);
        let reparsed = Changelog::parse_with(&cl.to_string(), &options).unwrap();
        assert_eq!(reparsed.to_string(), cl.to_string());
        assert_eq!(reparsed.package(), "foo");
    }

    #[test]
    fn test_write_incomplete_trailer() {
        let mut block = ChangeBlock::new("foo", &"1.0-1".parse().unwrap(), "unstable", "low");
        block.add_change("  * Initial release.");
        block.set_author("Jane <j@example.com>");
        let mut cl = Changelog::new(block);
        let mut out = Vec::new();
        assert!(matches!(
            cl.write_to(&mut out),
            Err(Error::IncompleteBlock { ref package, ref version })
                if package == "foo" && version == "1.0-1"
        ));
        assert!(out.is_empty());

        cl.set_date("Mon, 01 Jan 2024 12:00:00 +0000");
        cl.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "foo (1.0-1) unstable; urgency=low\n  * Initial release.\n -- Jane <j@example.com>  Mon, 01 Jan 2024 12:00:00 +0000\n"
        );
        assert_eq!(Changelog::parse(&text).unwrap().author(), Some("Jane <j@example.com>"));
    }

    #[test]
    fn test_write_read_changelog() {
        let cl = Changelog::parse(GNUTLS).unwrap();
        let mut out = Vec::new();
        cl.write_to(&mut out).unwrap();
        assert_eq!(out, GNUTLS.as_bytes());
    }
}
