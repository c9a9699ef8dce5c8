//! A single changelog entry.
use debian_version::{Version, VersionFormatError};

/// One versioned, dated entry of a changelog.
///
/// A block read from a file remembers its heading and trailer lines as they
/// were written, and writes them back unchanged until one of the fields they
/// are made of is modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBlock {
    pub(crate) package: String,
    pub(crate) version: String,
    pub(crate) distributions: String,
    pub(crate) urgency: Option<String>,
    pub(crate) urgency_comment: String,
    pub(crate) other_pairs: Vec<(String, String)>,
    pub(crate) changes: Vec<String>,
    pub(crate) author: Option<String>,
    pub(crate) date: Option<String>,
    pub(crate) trailer_separator: String,
    pub(crate) trailing: Vec<String>,
    pub(crate) no_trailer: bool,
    pub(crate) raw_header: Option<String>,
    pub(crate) raw_trailer: Option<String>,
}

impl ChangeBlock {
    /// Create a block with no changes, author or date.
    pub fn new(package: &str, version: &Version, distributions: &str, urgency: &str) -> Self {
        Self {
            package: package.to_string(),
            version: version.to_string(),
            distributions: distributions.to_string(),
            urgency: Some(urgency.to_string()),
            urgency_comment: String::new(),
            other_pairs: Vec::new(),
            changes: Vec::new(),
            author: None,
            date: None,
            trailer_separator: "  ".to_string(),
            trailing: Vec::new(),
            no_trailer: false,
            raw_header: None,
            raw_trailer: None,
        }
    }

    /// Source package name.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Set the source package name.
    pub fn set_package(&mut self, package: &str) {
        self.package = package.to_string();
        self.raw_header = None;
    }

    /// The version, parsed.
    pub fn version(&self) -> Result<Version, VersionFormatError> {
        self.version.parse()
    }

    /// The version as written in the heading.
    pub fn raw_version(&self) -> &str {
        &self.version
    }

    /// Set the version.
    pub fn set_version(&mut self, version: &Version) {
        self.version = version.to_string();
        self.raw_header = None;
    }

    /// Target distributions, space separated.
    pub fn distributions(&self) -> &str {
        &self.distributions
    }

    /// Set the target distributions.
    pub fn set_distributions(&mut self, distributions: &str) {
        self.distributions = distributions.to_string();
        self.raw_header = None;
    }

    /// The urgency, e.g. `low`.
    pub fn urgency(&self) -> Option<&str> {
        self.urgency.as_deref()
    }

    /// Anything written after the urgency level, such as ` (HIGH for users of foo)`.
    pub fn urgency_comment(&self) -> &str {
        &self.urgency_comment
    }

    /// Set the urgency. The urgency comment is kept.
    pub fn set_urgency(&mut self, urgency: &str) {
        self.urgency = Some(urgency.to_string());
        self.raw_header = None;
    }

    /// Other `key=value` pairs from the heading, in order.
    pub fn other_pairs(&self) -> &[(String, String)] {
        &self.other_pairs
    }

    /// Set a `key=value` pair in the heading, replacing any with the same key.
    pub fn set_pair(&mut self, key: &str, value: &str) {
        match self
            .other_pairs
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
        {
            Some((_, v)) => *v = value.to_string(),
            None => self.other_pairs.push((key.to_string(), value.to_string())),
        }
        self.raw_header = None;
    }

    /// The change lines, including blank lines.
    pub fn changes(&self) -> &[String] {
        &self.changes
    }

    /// Add a change line.
    ///
    /// The line goes after the last non-blank change line, so a blank line
    /// closing the list of changes stays last.
    pub fn add_change(&mut self, change: &str) {
        match self.changes.iter().rposition(|c| !c.trim().is_empty()) {
            Some(i) => self.changes.insert(i + 1, change.to_string()),
            None => self.changes.push(change.to_string()),
        }
    }

    /// The author, as `Name <email>`.
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    /// Set the author.
    pub fn set_author(&mut self, author: &str) {
        self.author = Some(author.to_string());
        self.no_trailer = false;
        self.raw_trailer = None;
    }

    /// The date from the trailer, as written.
    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    /// Set the date.
    pub fn set_date(&mut self, date: &str) {
        self.date = Some(date.to_string());
        self.no_trailer = false;
        self.raw_trailer = None;
    }

    /// Lines following the trailer, up to the next block.
    pub fn trailing_lines(&self) -> &[String] {
        &self.trailing
    }

    /// Add a line after the trailer.
    pub fn add_trailing_line(&mut self, line: &str) {
        self.trailing.push(line.to_string());
    }

    /// Whether the block ended without a trailer line.
    pub fn has_trailer(&self) -> bool {
        !self.no_trailer
    }

    /// Parse the trailer date.
    #[cfg(feature = "chrono")]
    pub fn datetime(&self) -> Option<Result<chrono::DateTime<chrono::FixedOffset>, chrono::ParseError>> {
        self.date
            .as_deref()
            .map(|d| chrono::DateTime::parse_from_rfc2822(d.trim()))
    }

    /// Check that the trailer can be written: a block needs both an author
    /// and a date, or neither.
    pub fn check_trailer(&self) -> Result<(), crate::Error> {
        if self.no_trailer || self.raw_trailer.is_some() {
            return Ok(());
        }
        match (&self.author, &self.date) {
            (Some(_), None) | (None, Some(_)) => Err(crate::Error::IncompleteBlock {
                package: self.package.clone(),
                version: self.version.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Write the block, failing with [`crate::Error::IncompleteBlock`] instead of
    /// writing a trailer that would not parse back.
    pub fn write_to<W: std::io::Write>(&self, mut w: W) -> Result<(), crate::Error> {
        self.check_trailer()?;
        w.write_all(self.to_string().as_bytes())?;
        Ok(())
    }

    fn write_header(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if let Some(header) = &self.raw_header {
            return writeln!(f, "{}", header);
        }
        write!(
            f,
            "{} ({}) {};",
            self.package, self.version, self.distributions
        )?;
        let mut sep = " ";
        if let Some(urgency) = &self.urgency {
            write!(f, "{}urgency={}{}", sep, urgency, self.urgency_comment)?;
            sep = ", ";
        }
        for (key, value) in &self.other_pairs {
            write!(f, "{}{}={}", sep, key, value)?;
            sep = ", ";
        }
        writeln!(f)
    }

    fn write_trailer(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.no_trailer {
            return Ok(());
        }
        if let Some(trailer) = &self.raw_trailer {
            return writeln!(f, "{}", trailer);
        }
        match (&self.author, &self.date) {
            (None, None) => writeln!(f, " --"),
            (author, date) => writeln!(
                f,
                " -- {}{}{}",
                author.as_deref().unwrap_or(""),
                self.trailer_separator,
                date.as_deref().unwrap_or("")
            ),
        }
    }
}

impl std::fmt::Display for ChangeBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.write_header(f)?;
        for change in &self.changes {
            writeln!(f, "{}", change)?;
        }
        self.write_trailer(f)?;
        for line in &self.trailing {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
