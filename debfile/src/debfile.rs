//! Debian binary packages and the tar parts inside them.
//!
//! A part is indexed from its tar headers alone. File contents are only read,
//! by decompressing the part again, when one is asked for, and are then kept.
use crate::arfile::{ArArchive, ArMember, MemberReader};
use crate::Error;
use deb822::Paragraph;
use debian_changelog::{Changelog, ParseOptions};
use std::cell::{OnceCell, RefCell};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use std::rc::Rc;

const INFO_PART: &str = "debian-binary";
const CONTROL_PART: &str = "control.tar";
const DATA_PART: &str = "data.tar";
const CONTROL_FILE: &str = "control";
const MD5_FILE: &str = "md5sums";

/// Names of the maintainer scripts a control part may hold.
pub const MAINTAINER_SCRIPTS: &[&str] = &["preinst", "postinst", "prerm", "postrm", "config"];

/// Compression of a package part, from the suffix of its member name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Plain `.tar`.
    None,
    /// `.tar.gz`.
    Gzip,
    /// `.tar.xz`.
    Xz,
    /// `.tar.zst`.
    Zstd,
}

impl Compression {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "" => Some(Self::None),
            ".gz" => Some(Self::Gzip),
            ".xz" => Some(Self::Xz),
            ".zst" => Some(Self::Zstd),
            _ => None,
        }
    }
}

/// Strip one leading `./` or `/`, and a trailing `/`.
fn normalize(name: &str) -> &str {
    let name = name
        .strip_prefix("./")
        .or_else(|| name.strip_prefix('/'))
        .unwrap_or(name);
    name.strip_suffix('/').unwrap_or(name)
}

/// A file in a package part.
#[derive(Debug, Clone)]
pub struct TarEntry {
    name: String,
    kind: tar::EntryType,
    mode: u32,
    size: u64,
    link_name: Option<String>,
    // Position in the archive, used to find the entry again when reading it.
    position: usize,
    content: OnceCell<Vec<u8>>,
}

impl TarEntry {
    /// Name as stored in the archive, e.g. `./usr/bin/hello`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type of the entry.
    pub fn kind(&self) -> tar::EntryType {
        self.kind
    }

    /// Whether this is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// File mode.
    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// Size of the file content in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Target of a symbolic or hard link.
    pub fn link_name(&self) -> Option<&str> {
        self.link_name.as_deref()
    }
}

/// The entries of a decompressed package part.
#[derive(Debug, Clone, Default)]
pub struct TarIndex {
    entries: Vec<TarEntry>,
}

impl TarIndex {
    fn load<R: Read>(reader: R) -> Result<Self, Error> {
        let mut archive = tar::Archive::new(reader);
        let mut entries = Vec::new();
        for (position, entry) in archive.entries()?.enumerate() {
            let entry = entry?;
            let name = entry.path()?.to_string_lossy().into_owned();
            let header = entry.header();
            let kind = header.entry_type();
            let mode = header.mode()?;
            let link_name = entry
                .link_name()?
                .map(|l| l.to_string_lossy().into_owned());
            entries.push(TarEntry {
                name,
                kind,
                mode,
                size: entry.size(),
                link_name,
                position,
                content: OnceCell::new(),
            });
        }
        Ok(Self { entries })
    }

    /// Iterate over the entries, in archive order.
    pub fn iter(&self) -> std::slice::Iter<'_, TarEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the part is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find an entry. `name`, `./name` and `/name` all refer to the same
    /// file; if the archive holds it more than once, the last one wins.
    pub fn get(&self, name: &str) -> Option<&TarEntry> {
        let name = normalize(name);
        self.entries
            .iter()
            .rev()
            .find(|e| normalize(&e.name) == name)
    }
}

/// One of the compressed tar archives in a package.
///
/// File names can be given as `file`, `./file` or `/file`; all are relative
/// to the root of the part.
#[derive(Debug)]
pub struct DebPart<R> {
    member: ArMember,
    source: Rc<RefCell<R>>,
    index: OnceCell<TarIndex>,
}

impl<R: Read + Seek> DebPart<R> {
    fn new(member: ArMember, source: Rc<RefCell<R>>) -> Self {
        Self {
            member,
            source,
            index: OnceCell::new(),
        }
    }

    /// The ar member holding this part.
    pub fn member(&self) -> &ArMember {
        &self.member
    }

    /// Compression of this part, if it is one we know of.
    pub fn compression(&self) -> Option<Compression> {
        let name = self.member.name();
        let suffix = name
            .strip_prefix(CONTROL_PART)
            .or_else(|| name.strip_prefix(DATA_PART))
            .unwrap_or(name);
        Compression::from_suffix(suffix)
    }

    /// Reader over the raw, still compressed, member data.
    pub fn raw_reader(&self) -> MemberReader<R> {
        MemberReader::new(Rc::clone(&self.source), &self.member)
    }

    fn decompressed<'a>(&self) -> Result<Box<dyn Read + 'a>, Error>
    where
        R: 'a,
    {
        let reader = self.raw_reader();
        let unsupported = || Error::UnsupportedCompression(self.member.name().to_string());
        match self.compression().ok_or_else(unsupported)? {
            Compression::None => Ok(Box::new(reader)),
            Compression::Gzip => Ok(Box::new(flate2::read::GzDecoder::new(reader))),
            #[cfg(feature = "xz")]
            Compression::Xz => Ok(Box::new(liblzma::read::XzDecoder::new(reader))),
            #[cfg(feature = "zstd")]
            Compression::Zstd => Ok(Box::new(zstd::stream::read::Decoder::new(reader)?)),
            #[allow(unreachable_patterns)]
            _ => Err(unsupported()),
        }
    }

    /// The files in this part. The part is decompressed on first use, and
    /// only the tar headers are kept.
    pub fn index(&self) -> Result<&TarIndex, Error> {
        if let Some(index) = self.index.get() {
            return Ok(index);
        }
        tracing::debug!(
            member = self.member.name(),
            size = self.member.size(),
            "decompressing package part"
        );
        let index = TarIndex::load(self.decompressed()?)?;
        tracing::debug!(
            member = self.member.name(),
            entries = index.len(),
            "indexed package part"
        );
        Ok(self.index.get_or_init(|| index))
    }

    /// Names of the files in this part, as stored in the archive.
    pub fn names(&self) -> Result<Vec<&str>, Error> {
        Ok(self.index()?.iter().map(|e| e.name()).collect())
    }

    /// Whether this part holds a file.
    pub fn has_file(&self, name: &str) -> Result<bool, Error> {
        Ok(self.index()?.get(name).is_some())
    }

    /// Look up a file.
    pub fn get_file(&self, name: &str) -> Result<&TarEntry, Error> {
        self.index()?
            .get(name)
            .ok_or_else(|| Error::FileNotFound(name.to_string()))
    }

    /// Content of a file, or `None` if it is not a regular file.
    ///
    /// The content is read on first request and kept for later calls.
    pub fn get_content(&self, name: &str) -> Result<Option<&[u8]>, Error> {
        let entry = self.get_file(name)?;
        if !entry.is_file() {
            return Ok(None);
        }
        self.load_content(entry).map(Some)
    }

    fn load_content<'a>(&'a self, wanted: &'a TarEntry) -> Result<&'a [u8], Error> {
        if let Some(content) = wanted.content.get() {
            return Ok(content.as_slice());
        }
        tracing::debug!(
            member = self.member.name(),
            path = wanted.name(),
            size = wanted.size(),
            "extracting file"
        );
        let mut archive = tar::Archive::new(self.decompressed()?);
        for (position, entry) in archive.entries()?.enumerate() {
            let mut entry = entry?;
            if position == wanted.position {
                let mut content = Vec::new();
                entry.read_to_end(&mut content)?;
                return Ok(wanted.content.get_or_init(|| content).as_slice());
            }
        }
        Err(Error::FileNotFound(wanted.name().to_string()))
    }

    fn get_text(&self, name: &str) -> Result<&str, Error> {
        let content = self
            .get_content(name)?
            .ok_or_else(|| Error::FileNotFound(name.to_string()))?;
        Ok(std::str::from_utf8(content)?)
    }
}

/// The control part of a package.
#[derive(Debug)]
pub struct DebControl<R> {
    part: DebPart<R>,
}

impl<R> std::ops::Deref for DebControl<R> {
    type Target = DebPart<R>;

    fn deref(&self) -> &Self::Target {
        &self.part
    }
}

impl<R: Read + Seek> DebControl<R> {
    /// The `control` file.
    pub fn paragraph(&self) -> Result<Paragraph, Error> {
        Ok(Paragraph::parse(self.get_text(CONTROL_FILE)?)?)
    }

    /// Maintainer scripts present in the part, by name.
    pub fn scripts(&self) -> Result<BTreeMap<&'static str, &[u8]>, Error> {
        let mut scripts = BTreeMap::new();
        for name in MAINTAINER_SCRIPTS {
            if let Some(entry) = self.index()?.get(name).filter(|e| e.is_file()) {
                scripts.insert(*name, self.load_content(entry)?);
            }
        }
        Ok(scripts)
    }

    /// Parse a checksums file such as `md5sums`, mapping file names in the
    /// data part to their checksum.
    pub fn checksums(&self, file: &str) -> Result<BTreeMap<String, String>, Error> {
        let text = self.get_text(file)?;
        let mut sums = BTreeMap::new();
        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let invalid = || Error::InvalidChecksumLine {
                file: file.to_string(),
                line_number: idx + 1,
                line: line.to_string(),
            };
            let (sum, path) = line.split_once(char::is_whitespace).ok_or_else(invalid)?;
            let path = path.trim();
            if sum.is_empty() || path.is_empty() {
                return Err(invalid());
            }
            sums.insert(path.to_string(), sum.to_string());
        }
        Ok(sums)
    }

    /// The `md5sums` file.
    pub fn md5sums(&self) -> Result<BTreeMap<String, String>, Error> {
        self.checksums(MD5_FILE)
    }
}

/// A Debian binary package.
#[derive(Debug)]
pub struct DebFile<R> {
    archive: ArArchive<R>,
    version: String,
    control: DebControl<R>,
    data: DebPart<R>,
    package_name: OnceCell<String>,
}

impl DebFile<File> {
    /// Open a package on disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::new(File::open(path)?)
    }
}

/// The last member named `prefix` or `prefix.<suffix>`.
fn find_part<'a, R: Read + Seek>(archive: &'a ArArchive<R>, prefix: &str) -> Option<&'a ArMember> {
    archive.iter().rev().find(|m| {
        m.name()
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
    })
}

impl<R: Read + Seek> DebFile<R> {
    /// Read a package.
    pub fn new(reader: R) -> Result<Self, Error> {
        let archive = ArArchive::new(reader)?;

        let info = archive.member(INFO_PART).ok();
        let control = find_part(&archive, CONTROL_PART);
        let data = find_part(&archive, DATA_PART);
        let (info, control, data) = match (info, control, data) {
            (Some(info), Some(control), Some(data)) => (info, control.clone(), data.clone()),
            (info, control, data) => {
                let missing = [
                    (info.is_none(), INFO_PART),
                    (control.is_none(), CONTROL_PART),
                    (data.is_none(), DATA_PART),
                ]
                .iter()
                .filter(|(missing, _)| *missing)
                .map(|(_, name)| name.to_string())
                .collect();
                return Err(Error::MissingMembers(missing));
            }
        };

        let mut version = String::new();
        archive.reader(info).read_to_string(&mut version)?;
        let version = version.trim().to_string();
        tracing::debug!(version = version.as_str(), control = control.name(), data = data.name(), "opened package");

        let source = archive.source();
        Ok(Self {
            version,
            control: DebControl {
                part: DebPart::new(control, Rc::clone(&source)),
            },
            data: DebPart::new(data, source),
            archive,
            package_name: OnceCell::new(),
        })
    }

    /// The underlying ar archive.
    pub fn archive(&self) -> &ArArchive<R> {
        &self.archive
    }

    /// Package format version from `debian-binary`, e.g. `2.0`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The control part.
    pub fn control(&self) -> &DebControl<R> {
        &self.control
    }

    /// The data part.
    pub fn data(&self) -> &DebPart<R> {
        &self.data
    }

    /// The control file.
    pub fn debcontrol(&self) -> Result<Paragraph, Error> {
        self.control.paragraph()
    }

    /// Maintainer scripts, by name.
    pub fn scripts(&self) -> Result<BTreeMap<&'static str, &[u8]>, Error> {
        self.control.scripts()
    }

    /// MD5 sums of the files in the data part.
    pub fn md5sums(&self) -> Result<BTreeMap<String, String>, Error> {
        self.control.md5sums()
    }

    /// Name of the package, from the control file.
    pub fn package_name(&self) -> Result<&str, Error> {
        if let Some(name) = self.package_name.get() {
            return Ok(name);
        }
        let name = self
            .debcontrol()?
            .get("Package")
            .ok_or(Error::MissingPackageField)?
            .to_string();
        Ok(self.package_name.get_or_init(|| name))
    }

    /// The Debian changelog shipped in the package, if any.
    pub fn changelog(&self) -> Result<Option<Changelog>, Error> {
        self.changelog_with(&ParseOptions::default())
    }

    /// The Debian changelog shipped in the package, parsed with `options`.
    ///
    /// `changelog.Debian.gz` is preferred over `changelog.gz`, which native
    /// packages ship instead.
    pub fn changelog_with(&self, options: &ParseOptions) -> Result<Option<Changelog>, Error> {
        let package = self.package_name()?;
        let candidates = [
            format!("usr/share/doc/{}/changelog.Debian.gz", package),
            format!("usr/share/doc/{}/changelog.gz", package),
        ];
        for path in &candidates {
            let Some(entry) = self.data.index()?.get(path).filter(|e| e.is_file()) else {
                continue;
            };
            let compressed = self.data.load_content(entry)?;
            tracing::debug!(path = path.as_str(), "reading changelog");
            let mut raw = Vec::new();
            flate2::read::GzDecoder::new(compressed).read_to_end(&mut raw)?;
            let text = std::str::from_utf8(&raw)?;
            return Ok(Some(Changelog::parse_with(text, options)?));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("./control"), "control");
        assert_eq!(normalize("/usr/bin/hello"), "usr/bin/hello");
        assert_eq!(normalize("usr/share/doc/"), "usr/share/doc");
        assert_eq!(normalize("./"), "");
        assert_eq!(normalize(".//x"), "/x");
    }

    #[test]
    fn test_compression_suffix() {
        assert_eq!(Compression::from_suffix(".gz"), Some(Compression::Gzip));
        assert_eq!(Compression::from_suffix(".xz"), Some(Compression::Xz));
        assert_eq!(Compression::from_suffix(".zst"), Some(Compression::Zstd));
        assert_eq!(Compression::from_suffix(""), Some(Compression::None));
        assert_eq!(Compression::from_suffix(".bz2"), None);
    }

    #[test]
    fn test_index_lookup_last_wins() {
        let entry = |name: &str, kind: tar::EntryType, position: usize| TarEntry {
            name: name.to_string(),
            kind,
            mode: 0o644,
            size: 3,
            link_name: None,
            position,
            content: OnceCell::new(),
        };
        let index = TarIndex {
            entries: vec![
                entry("./etc/foo", tar::EntryType::Regular, 0),
                entry("./etc/", tar::EntryType::Directory, 1),
                entry("etc/foo", tar::EntryType::Regular, 2),
            ],
        };
        assert_eq!(index.get("/etc/foo").unwrap().position, 2);
        assert!(!index.get("etc").unwrap().is_file());
        assert!(index.get("etc/bar").is_none());
        assert_eq!(index.len(), 3);
    }

    fn tarball(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(tar::EntryType::Regular);
            header.set_mode(0o644);
            header.set_size(data.len() as u64);
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap()
    }

    fn ar(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut out = b"!<arch>\n".to_vec();
        for (name, data) in members {
            out.extend(
                format!(
                    "{:<16}{:<12}{:<6}{:<6}{:<8}{:<10}`\n",
                    name,
                    0,
                    0,
                    0,
                    "100644",
                    data.len()
                )
                .into_bytes(),
            );
            out.extend_from_slice(data);
            if data.len() % 2 == 1 {
                out.push(b'\n');
            }
        }
        out
    }

    #[test]
    fn test_content_read_on_demand() {
        let big = vec![0u8; 4 << 20];
        let control = tarball(&[("control", &b"Package: big\n"[..])]);
        let data = tarball(&[("usr/share/big", &big[..]), ("usr/bin/small", &b"small"[..])]);
        let deb = ar(&[
            ("debian-binary", &b"2.0\n"[..]),
            ("control.tar", &control[..]),
            ("data.tar", &data[..]),
        ]);
        let deb = DebFile::new(std::io::Cursor::new(deb)).unwrap();

        assert!(deb.data().has_file("/usr/share/big").unwrap());
        let index = deb.data().index().unwrap();
        assert_eq!(index.get("usr/share/big").unwrap().size(), 4 << 20);
        assert!(index.iter().all(|e| e.content.get().is_none()));

        assert_eq!(
            deb.data().get_content("usr/bin/small").unwrap(),
            Some(&b"small"[..])
        );
        assert!(index.get("usr/share/big").unwrap().content.get().is_none());
        assert!(index.get("usr/bin/small").unwrap().content.get().is_some());

        assert_eq!(
            deb.data().get_content("usr/share/big").unwrap().map(|c| c.len()),
            Some(4 << 20)
        );
    }
}
