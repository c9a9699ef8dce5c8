//! Paragraph parsing and serialization.
use crate::dict::Deb822Dict;
use crate::signature::{collect_paragraph, Collected};
use crate::Error;
use lazy_regex::regex_captures;
use std::io::BufRead;

/// Options controlling how paragraphs are parsed.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    fields: Option<Vec<String>>,
}

impl ParseOptions {
    /// Default options: keep every field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only keep the named fields. Names are matched without case; other
    /// fields are still parsed but dropped from the result.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.fields = Some(
            fields
                .into_iter()
                .map(|f| f.as_ref().to_lowercase())
                .collect(),
        );
        self
    }

    fn wants(&self, name: &str) -> bool {
        match &self.fields {
            None => true,
            Some(fields) => {
                let name = name.to_lowercase();
                fields.iter().any(|f| *f == name)
            }
        }
    }
}

/// A single deb822 paragraph.
///
/// Field names are case-insensitive and keep the spelling they were first
/// given. Continuation lines are stored as part of the value, separated by
/// `\n` and with their leading whitespace intact, so that a paragraph writes
/// back the way it was read.
#[derive(Debug, Clone, Default)]
pub struct Paragraph {
    fields: Deb822Dict<String>,
    armor_header: Vec<String>,
    armor_signature: Vec<String>,
}

impl Paragraph {
    /// Create an empty paragraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the first paragraph of `text`.
    ///
    /// Anything after the blank line ending the first paragraph is ignored;
    /// see [`crate::iter_paragraphs`] for reading several.
    ///
    /// In PGP-signed input the whole signed body is one paragraph: blank
    /// lines between the armor lines do not end it, so a signed text holding
    /// several blank-separated paragraphs reads as a single merged one.
    pub fn parse(text: &str) -> Result<Self, Error> {
        Self::parse_with(text, &ParseOptions::default())
    }

    /// Parse the first paragraph of `text` with the given options.
    pub fn parse_with(text: &str, options: &ParseOptions) -> Result<Self, Error> {
        let mut lines = text
            .lines()
            .map(|l| Ok::<_, std::io::Error>(l.to_string()))
            .enumerate();
        match collect_paragraph(&mut lines)? {
            Some(collected) => parse_collected(collected, options),
            None => Err(Error::EmptyInput),
        }
    }

    /// Read the first paragraph from a reader.
    pub fn from_reader<R: BufRead>(reader: R, options: &ParseOptions) -> Result<Self, Error> {
        let mut lines = reader.lines().enumerate();
        match collect_paragraph(&mut lines)? {
            Some(collected) => parse_collected(collected, options),
            None => Err(Error::EmptyInput),
        }
    }

    /// Get the value of a field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|v| v.as_str())
    }

    /// Set the value of a field, returning the old value.
    ///
    /// An existing field keeps its spelling and position. The value is
    /// stored the way parsing its written form would give it back: the first
    /// line is trimmed, continuation lines without leading whitespace are
    /// indented by one space, blank continuation lines become ` .`, and
    /// trailing blank lines are dropped.
    ///
    /// ```rust
    /// use deb822::Paragraph;
    ///
    /// let mut p = Paragraph::new();
    /// p.set("Description", "short\nlong text\n");
    /// assert_eq!(p.get("Description"), Some("short\n long text"));
    /// ```
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Option<String> {
        let value: String = value.into();
        self.fields.insert(name, normalize_value(&value))
    }

    /// The value of field `key` merged from this paragraph and `other`.
    ///
    /// When only one paragraph has the field, its value is used as is. Two
    /// single-line values are split into items, sorted and de-duplicated; the
    /// items are separated by `, ` if either value contains one, and by spaces
    /// otherwise. For two multi-line values, the lines of `other` missing
    /// from this value are appended. A single-line value cannot be merged
    /// with a multi-line one.
    ///
    /// ```rust
    /// use deb822::Paragraph;
    ///
    /// let a = Paragraph::parse("Binary: foo foo-doc\n").unwrap();
    /// let b = Paragraph::parse("Binary: foo bar\n").unwrap();
    /// assert_eq!(a.merged_field("Binary", &b).unwrap(), "bar foo foo-doc");
    /// ```
    pub fn merged_field(&self, key: &str, other: &Paragraph) -> Result<String, Error> {
        match (self.get(key), other.get(key)) {
            (Some(a), Some(b)) => merge_values(key, a, b),
            (Some(v), None) | (None, Some(v)) => Ok(v.to_string()),
            (None, None) => Err(Error::Merge {
                field: key.to_string(),
                reason: "field is in neither paragraph".to_string(),
            }),
        }
    }

    /// Replace field `key` with its value merged from this paragraph and
    /// `other`; see [`Paragraph::merged_field`].
    pub fn merge_fields(&mut self, key: &str, other: &Paragraph) -> Result<(), Error> {
        let merged = self.merged_field(key, other)?;
        self.set(key, merged);
        Ok(())
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    /// Whether the paragraph has a field.
    pub fn contains_key(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Field names, in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys()
    }

    /// Fields and their values, in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k, v.as_str()))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the paragraph has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The underlying field map.
    pub fn as_dict(&self) -> &Deb822Dict<String> {
        &self.fields
    }

    /// Whether the paragraph was read from PGP-signed input.
    pub fn is_signed(&self) -> bool {
        !self.armor_header.is_empty()
    }

    /// Armor lines found before the body, e.g. `-----BEGIN PGP SIGNED
    /// MESSAGE-----` and `Hash: SHA256`.
    pub fn armor_header(&self) -> &[String] {
        &self.armor_header
    }

    /// The signature block found after the body, armor lines included.
    pub fn armor_signature(&self) -> &[String] {
        &self.armor_signature
    }

    /// Write the paragraph in deb822 format.
    ///
    /// Armor lines are not written back.
    pub fn dump<W: std::io::Write>(&self, mut w: W) -> std::io::Result<()> {
        write!(w, "{}", self)
    }
}

/// Equality only looks at the fields, not at the armor.
impl PartialEq for Paragraph {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl Eq for Paragraph {}

impl std::fmt::Display for Paragraph {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (key, value) in self.fields.iter() {
            if value.is_empty() || value.starts_with('\n') {
                writeln!(f, "{}:{}", key, value)?;
            } else {
                writeln!(f, "{}: {}", key, value)?;
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for Paragraph {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Paragraph {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Paragraph {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k, normalize_value(&Into::<String>::into(v))))
                .collect(),
            ..Default::default()
        }
    }
}

impl From<Deb822Dict<String>> for Paragraph {
    fn from(fields: Deb822Dict<String>) -> Self {
        Paragraph {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k, normalize_value(&v)))
                .collect(),
            ..Default::default()
        }
    }
}

fn merge_values(field: &str, a: &str, b: &str) -> Result<String, Error> {
    if b.is_empty() {
        return Ok(a.to_string());
    }
    if a.is_empty() {
        return Ok(b.to_string());
    }
    match (a.contains('\n'), b.contains('\n')) {
        (false, false) => {
            let delim = if a.contains(", ") || b.contains(", ") {
                ", "
            } else {
                " "
            };
            let mut items: Vec<&str> = a
                .split(delim)
                .chain(b.split(delim))
                .filter(|item| !item.is_empty())
                .collect();
            items.sort_unstable();
            items.dedup();
            Ok(items.join(delim))
        }
        (true, true) => {
            let mut merged = a.to_string();
            let lines: Vec<&str> = a.lines().collect();
            for line in b.lines() {
                if !lines.contains(&line) {
                    merged.push('\n');
                    merged.push_str(line);
                }
            }
            Ok(merged)
        }
        _ => Err(Error::Merge {
            field: field.to_string(),
            reason: "cannot merge a single-line value with a multi-line one".to_string(),
        }),
    }
}

fn normalize_value(value: &str) -> String {
    let mut lines = value.lines();
    let mut normalized = lines.next().unwrap_or("").trim().to_string();
    let mut rest: Vec<&str> = lines.map(str::trim_end).collect();
    while rest.last().is_some_and(|l| l.is_empty()) {
        rest.pop();
    }
    for line in rest {
        normalized.push('\n');
        if line.is_empty() {
            normalized.push_str(" .");
        } else {
            if !line.starts_with(char::is_whitespace) {
                normalized.push(' ');
            }
            normalized.push_str(line);
        }
    }
    normalized
}

fn parse_collected(collected: Collected, options: &ParseOptions) -> Result<Paragraph, Error> {
    let Collected {
        header,
        body,
        signature,
    } = collected;

    let mut fields = Deb822Dict::new();
    // The field continuation lines are appended to; `None` while skipping an
    // unwanted field.
    let mut current: Option<(String, String)> = None;
    let mut seen_field = false;

    for (line_number, line) in body {
        let field = if let Some((_, key, data)) =
            regex_captures!(r"^([^:\s]+)\s*:\s*(\S.*?)\s*$", &line)
        {
            Some((key.to_string(), data.to_string()))
        } else if let Some((_, key)) = regex_captures!(r"^([^:\s]+)\s*:\s*$", &line) {
            Some((key.to_string(), String::new()))
        } else {
            None
        };

        match field {
            Some((key, data)) => {
                if let Some((k, v)) = current.take() {
                    fields.insert(&k, v);
                }
                seen_field = true;
                if options.wants(&key) {
                    current = Some((key, data));
                }
            }
            None if seen_field && line.starts_with(char::is_whitespace) => {
                if let Some((_, value)) = current.as_mut() {
                    value.push('\n');
                    value.push_str(line.trim_end());
                }
            }
            None => return Err(Error::Parse { line_number, line }),
        }
    }

    if let Some((k, v)) = current.take() {
        fields.insert(&k, v);
    }

    tracing::trace!(fields = fields.len(), "parsed paragraph");

    Ok(Paragraph {
        fields,
        armor_header: header,
        armor_signature: signature,
    })
}

/// Iterator over the paragraphs read from a [`BufRead`].
///
/// Created by [`iter_paragraphs`]. Paragraphs are parsed one at a time as the
/// iterator advances.
pub struct ParagraphReader<R: BufRead> {
    lines: std::iter::Enumerate<std::io::Lines<R>>,
    options: ParseOptions,
    started: bool,
    finished: bool,
}

impl<R: BufRead> ParagraphReader<R> {
    /// Create a new paragraph reader.
    pub fn new(reader: R, options: ParseOptions) -> Self {
        Self {
            lines: reader.lines().enumerate(),
            options,
            started: false,
            finished: false,
        }
    }
}

impl<R: BufRead> Iterator for ParagraphReader<R> {
    type Item = Result<Paragraph, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match collect_paragraph(&mut self.lines) {
            Ok(Some(collected)) => {
                self.started = true;
                Some(parse_collected(collected, &self.options))
            }
            Ok(None) => {
                self.finished = true;
                if self.started {
                    None
                } else {
                    Some(Err(Error::EmptyInput))
                }
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Iterate over the paragraphs in `reader`.
///
/// Iteration stops at the end of input. If the input holds no paragraph at
/// all, the first item is [`Error::EmptyInput`]. A paragraph that fails to
/// parse yields an error without ending iteration.
///
/// ```rust
/// use deb822::{iter_paragraphs, ParseOptions};
///
/// let text = "Package: foo\n\nPackage: bar\n";
/// let names: Vec<String> = iter_paragraphs(text.as_bytes(), ParseOptions::new())
///     .map(|p| p.unwrap().get("Package").unwrap().to_string())
///     .collect();
/// assert_eq!(names, vec!["foo", "bar"]);
/// ```
pub fn iter_paragraphs<R: BufRead>(reader: R, options: ParseOptions) -> ParagraphReader<R> {
    ParagraphReader::new(reader, options)
}

#[cfg(feature = "serde")]
impl serde::Serialize for Paragraph {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Paragraph {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ParagraphVisitor;

        impl<'de> serde::de::Visitor<'de> for ParagraphVisitor {
            type Value = Paragraph;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map of field names to strings")
            }

            fn visit_map<A: serde::de::MapAccess<'de>>(
                self,
                mut access: A,
            ) -> Result<Self::Value, A::Error> {
                let mut paragraph = Paragraph::new();
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    paragraph.set(&k, v);
                }
                Ok(paragraph)
            }
        }

        deserializer.deserialize_map(ParagraphVisitor)
    }
}
