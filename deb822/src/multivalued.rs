//! Paragraphs with table-shaped fields.
//!
//! Some fields hold one row of whitespace-separated tokens per line, such as
//! the `Files` field of a `.dsc`:
//!
//! ```text
//! Files:
//!  469202dfd24d55a932af717c6377ee59 1117 hello_2.10.dsc
//!  4857552b0156fdd4fa99d21ec131d3d2 109573 hello_2.10.tar.gz
//! ```
//!
//! A [`Schema`] names these fields and their columns for each kind of file.
use crate::dict::Deb822Dict;
use crate::paragraph::{iter_paragraphs, ParseOptions, Paragraph};
use crate::Error;
use std::io::BufRead;

/// One row of a multivalued field, keyed by column name.
pub type Row = Deb822Dict<String>;

/// The decoded value of a multivalued field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Table {
    /// A single row written on the same line as the field name.
    Inline(Row),

    /// One row per line, starting on the line after the field name.
    Lines(Vec<Row>),
}

impl Table {
    /// The rows of the table.
    pub fn rows(&self) -> &[Row] {
        match self {
            Table::Inline(row) => std::slice::from_ref(row),
            Table::Lines(rows) => rows,
        }
    }
}

/// How the `size` column is padded when a table is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeJustification {
    /// No padding.
    None,

    /// Right-justify to a fixed width, as apt-ftparchive does.
    Fixed(usize),

    /// Right-justify to the longest size in the field, as dak does.
    Longest,
}

/// The multivalued fields of one kind of paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    /// Field names with their column names.
    pub fields: &'static [(&'static str, &'static [&'static str])],

    /// Padding of the `size` column.
    pub size: SizeJustification,
}

impl Schema {
    /// The columns of `field`, if it is multivalued.
    pub fn columns(&self, field: &str) -> Option<&'static [&'static str]> {
        self.fields
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(field))
            .map(|(_, columns)| *columns)
    }

    /// The same schema with a different size column behavior.
    pub const fn with_size(self, size: SizeJustification) -> Self {
        Schema {
            fields: self.fields,
            size,
        }
    }
}

/// Source package descriptions (`.dsc`).
pub const DSC: Schema = Schema {
    fields: &[
        ("Files", &["md5sum", "size", "name"]),
        ("Checksums-Sha1", &["sha1", "size", "name"]),
        ("Checksums-Sha256", &["sha256", "size", "name"]),
    ],
    size: SizeJustification::None,
};

/// `Sources` index entries, which share the `.dsc` layout.
pub const SOURCES: Schema = DSC;

/// Upload descriptions (`.changes`).
pub const CHANGES: Schema = Schema {
    fields: &[
        ("Files", &["md5sum", "size", "section", "priority", "name"]),
        ("Checksums-Sha1", &["sha1", "size", "name"]),
        ("Checksums-Sha256", &["sha256", "size", "name"]),
    ],
    size: SizeJustification::None,
};

/// Archive `Release` files, laid out the way apt-ftparchive writes them.
pub const RELEASE: Schema = Schema {
    fields: &[
        ("MD5Sum", &["md5sum", "size", "name"]),
        ("SHA1", &["sha1", "size", "name"]),
        ("SHA256", &["sha256", "size", "name"]),
    ],
    size: SizeJustification::Fixed(16),
};

/// Archive `Release` files, laid out the way dak writes them.
pub const RELEASE_DAK: Schema = RELEASE.with_size(SizeJustification::Longest);

/// Index files of the pdiff scheme (`Packages.diff/Index`).
pub const PDIFF_INDEX: Schema = Schema {
    fields: &[
        ("SHA1-Current", &["SHA1", "size"]),
        ("SHA1-History", &["SHA1", "size", "date"]),
        ("SHA1-Patches", &["SHA1", "size", "date"]),
    ],
    size: SizeJustification::Longest,
};

fn decode_row(field: &str, columns: &[&str], line: &str) -> Result<Row, Error> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != columns.len() {
        return Err(Error::InvalidRow {
            field: field.to_string(),
            reason: format!(
                "expected {} columns, found {} in {:?}",
                columns.len(),
                tokens.len(),
                line.trim()
            ),
        });
    }
    Ok(columns
        .iter()
        .zip(tokens)
        .map(|(c, t)| (*c, t.to_string()))
        .collect())
}

fn decode(field: &str, columns: &[&str], value: &str) -> Result<Table, Error> {
    if value.contains('\n') || value.is_empty() {
        value
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| decode_row(field, columns, l))
            .collect::<Result<Vec<_>, _>>()
            .map(Table::Lines)
    } else {
        decode_row(field, columns, value).map(Table::Inline)
    }
}

fn encode(
    field: &str,
    columns: &[&str],
    size: SizeJustification,
    table: &Table,
) -> Result<String, Error> {
    let rows = table.rows();
    let width = match size {
        SizeJustification::None => 0,
        SizeJustification::Fixed(width) => width,
        SizeJustification::Longest => rows
            .iter()
            .filter_map(|r| r.get("size"))
            .map(|s| s.len())
            .max()
            .unwrap_or(0),
    };

    let mut lines = Vec::with_capacity(rows.len());
    for row in rows {
        let mut values = Vec::with_capacity(columns.len());
        for column in columns {
            let value = row.get(column).ok_or_else(|| Error::InvalidRow {
                field: field.to_string(),
                reason: format!("missing column {}", column),
            })?;
            if value.is_empty() || value.contains(char::is_whitespace) {
                return Err(Error::InvalidRow {
                    field: field.to_string(),
                    reason: format!("invalid value {:?} for column {}", value, column),
                });
            }
            if column.eq_ignore_ascii_case("size") {
                values.push(format!("{:>width$}", value, width = width));
            } else {
                values.push(value.clone());
            }
        }
        lines.push(values.join(" "));
    }

    Ok(match table {
        Table::Inline(_) => lines.concat(),
        Table::Lines(_) => lines.iter().map(|l| format!("\n {}", l)).collect(),
    })
}

/// A paragraph whose multivalued fields can be read and written as tables.
///
/// The fields are kept as text in the underlying [`Paragraph`], so a
/// paragraph that is not modified is written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultivaluedParagraph {
    paragraph: Paragraph,
    schema: Schema,
}

impl MultivaluedParagraph {
    /// Wrap a paragraph.
    pub fn new(paragraph: Paragraph, schema: Schema) -> Self {
        Self { paragraph, schema }
    }

    /// Parse a paragraph and check that its multivalued fields are well formed.
    ///
    /// ```rust
    /// use deb822::multivalued::{MultivaluedParagraph, DSC};
    ///
    /// let text = "Source: hello\nFiles:\n abc 12 hello_1.0.dsc\n";
    /// let dsc = MultivaluedParagraph::parse(text, DSC).unwrap();
    /// let files = dsc.table("files").unwrap().unwrap();
    /// assert_eq!(files.rows()[0].get("name").map(|s| s.as_str()), Some("hello_1.0.dsc"));
    /// ```
    pub fn parse(text: &str, schema: Schema) -> Result<Self, Error> {
        Self::validated(Paragraph::parse(text)?, schema)
    }

    fn validated(paragraph: Paragraph, schema: Schema) -> Result<Self, Error> {
        let p = Self::new(paragraph, schema);
        for (field, _) in schema.fields {
            p.table(field)?;
        }
        Ok(p)
    }

    /// The underlying paragraph.
    pub fn paragraph(&self) -> &Paragraph {
        &self.paragraph
    }

    /// Mutable access to the underlying paragraph.
    pub fn paragraph_mut(&mut self) -> &mut Paragraph {
        &mut self.paragraph
    }

    /// Unwrap the underlying paragraph.
    pub fn into_paragraph(self) -> Paragraph {
        self.paragraph
    }

    /// The schema in use.
    pub fn schema(&self) -> Schema {
        self.schema
    }

    /// Change how the `size` column is padded on write.
    pub fn with_size_justification(mut self, size: SizeJustification) -> Self {
        self.schema = self.schema.with_size(size);
        self
    }

    /// Whether `field` is multivalued in this schema.
    pub fn is_multivalued(&self, field: &str) -> bool {
        self.schema.columns(field).is_some()
    }

    /// Get the value of a field as text.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.paragraph.get(field)
    }

    /// Decode a multivalued field.
    ///
    /// Returns `None` if the field is absent or not multivalued.
    pub fn table(&self, field: &str) -> Result<Option<Table>, Error> {
        let Some(columns) = self.schema.columns(field) else {
            return Ok(None);
        };
        match self.paragraph.get(field) {
            Some(value) => decode(field, columns, value).map(Some),
            None => Ok(None),
        }
    }

    /// Replace a multivalued field with the encoding of `table`.
    ///
    /// Every row must have a value for each column, and values may not
    /// contain whitespace.
    pub fn set_table(&mut self, field: &str, table: &Table) -> Result<(), Error> {
        let columns = self.schema.columns(field).ok_or_else(|| Error::InvalidRow {
            field: field.to_string(),
            reason: "not a multivalued field".to_string(),
        })?;
        let value = encode(field, columns, self.schema.size, table)?;
        self.paragraph.set(field, value);
        Ok(())
    }
}

impl std::fmt::Display for MultivaluedParagraph {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.paragraph)
    }
}

/// Iterate over the paragraphs in `reader`, checking each against `schema`.
pub fn iter_multivalued<R: BufRead>(
    reader: R,
    schema: Schema,
    options: ParseOptions,
) -> impl Iterator<Item = Result<MultivaluedParagraph, Error>> {
    iter_paragraphs(reader, options)
        .map(move |p| p.and_then(|p| MultivaluedParagraph::validated(p, schema)))
}
