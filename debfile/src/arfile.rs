//! Reader for Unix `ar` archives, the container format of `.deb` files.
//!
//! An archive starts with the magic `!<arch>\n`, followed by members. Each
//! member has a 60 byte header:
//!
//! | bytes  | field                         |
//! |--------|-------------------------------|
//! | 0-16   | name, space padded            |
//! | 16-28  | modification time, decimal    |
//! | 28-34  | owner id, decimal             |
//! | 34-40  | group id, decimal             |
//! | 40-48  | mode, octal                   |
//! | 48-58  | size in bytes, decimal        |
//! | 58-60  | `` `\n ``                     |
//!
//! Member data follows the header, padded to an even offset.
//!
//! Member data is never copied up front: [`ArArchive::reader`] returns a
//! [`MemberReader`] that reads the bytes from the underlying source on demand.
use std::cell::RefCell;
use std::io::{self, BufRead, Cursor, Read, Seek, SeekFrom};
use std::rc::Rc;

const GLOBAL_HEADER: &[u8; 8] = b"!<arch>\n";
const HEADER_SIZE: usize = 60;
const MEMBER_MAGIC: &[u8; 2] = b"`\n";
const CHUNK_SIZE: usize = 8192;

/// Error reading an ar archive.
#[derive(Debug)]
pub enum Error {
    /// The input does not start with `!<arch>\n`.
    BadGlobalHeader,

    /// The input ends in the middle of a member header.
    TruncatedHeader {
        /// Offset of the header.
        offset: u64,
    },

    /// A member header does not end with `` `\n ``.
    BadMemberMagic {
        /// Offset of the header.
        offset: u64,
    },

    /// A numeric header field could not be parsed.
    InvalidHeaderField {
        /// Name of the field.
        field: &'static str,
        /// Raw value of the field.
        value: String,
    },

    /// A member extends past the end of the input.
    SizeOverrun {
        /// Name of the member.
        name: String,
        /// Declared size.
        size: u64,
        /// Bytes available after the header.
        available: u64,
    },

    /// No member with this name.
    MemberNotFound(String),

    /// IO error.
    Io(io::Error),
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Self::BadGlobalHeader => f.write_str("Not an ar archive: bad global header"),
            Self::TruncatedHeader { offset } => {
                write!(f, "Truncated member header at offset {}", offset)
            }
            Self::BadMemberMagic { offset } => {
                write!(f, "Bad member header magic at offset {}", offset)
            }
            Self::InvalidHeaderField { field, value } => {
                write!(f, "Invalid {} in member header: {:?}", field, value)
            }
            Self::SizeOverrun {
                name,
                size,
                available,
            } => write!(
                f,
                "Member {} has size {} but only {} bytes are available",
                name, size, available
            ),
            Self::MemberNotFound(name) => write!(f, "No member named {}", name),
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

/// Header information of an archive member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArMember {
    name: String,
    mtime: u64,
    uid: u32,
    gid: u32,
    mode: u32,
    size: u64,
    offset: u64,
}

impl ArMember {
    /// Name of the member, without padding or a trailing `/`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Modification time, in seconds since the epoch.
    pub fn mtime(&self) -> u64 {
        self.mtime
    }

    /// Owner id.
    pub fn uid(&self) -> u32 {
        self.uid
    }

    /// Group id.
    pub fn gid(&self) -> u32 {
        self.gid
    }

    /// File mode.
    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// Size of the member data.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Offset of the member data in the archive.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

fn parse_name(raw: &[u8]) -> String {
    let end = raw
        .iter()
        .rposition(|b| *b != b' ')
        .map_or(0, |i| i + 1);
    let raw = &raw[..end];
    let raw = raw.strip_suffix(b"/").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

fn parse_number<T: TryFrom<u64>>(field: &'static str, raw: &[u8], radix: u32) -> Result<T, Error> {
    let invalid = || Error::InvalidHeaderField {
        field,
        value: String::from_utf8_lossy(raw).into_owned(),
    };
    let text = std::str::from_utf8(raw).map_err(|_| invalid())?;
    let n = u64::from_str_radix(text.trim_end_matches(' '), radix).map_err(|_| invalid())?;
    T::try_from(n).map_err(|_| invalid())
}

fn parse_header(header: &[u8; HEADER_SIZE], offset: u64) -> Result<ArMember, Error> {
    if &header[58..60] != MEMBER_MAGIC {
        return Err(Error::BadMemberMagic { offset });
    }
    Ok(ArMember {
        name: parse_name(&header[0..16]),
        mtime: parse_number("mtime", &header[16..28], 10)?,
        uid: parse_number("uid", &header[28..34], 10)?,
        gid: parse_number("gid", &header[34..40], 10)?,
        mode: parse_number("mode", &header[40..48], 8)?,
        size: parse_number("size", &header[48..58], 10)?,
        offset: offset + HEADER_SIZE as u64,
    })
}

/// Read as much of `buf` as the input has, returning the number of bytes read.
fn read_up_to<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// An ar archive.
///
/// The source is shared by every [`MemberReader`] handed out, so the archive
/// and its readers can not be sent to other threads.
#[derive(Debug)]
pub struct ArArchive<R> {
    source: Rc<RefCell<R>>,
    members: Vec<ArMember>,
}

impl ArArchive<Cursor<Vec<u8>>> {
    /// Read an archive held in memory.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Result<Self, Error> {
        Self::new(Cursor::new(data.into()))
    }
}

impl<R: Read + Seek> ArArchive<R> {
    /// Index the members of an archive.
    pub fn new(mut reader: R) -> Result<Self, Error> {
        let length = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        let mut magic = [0u8; 8];
        if read_up_to(&mut reader, &mut magic)? < magic.len() || &magic != GLOBAL_HEADER {
            return Err(Error::BadGlobalHeader);
        }

        let mut members = Vec::new();
        let mut pos = GLOBAL_HEADER.len() as u64;
        loop {
            let mut header = [0u8; HEADER_SIZE];
            let n = read_up_to(&mut reader, &mut header)?;
            if n == 0 {
                break;
            }
            if n < HEADER_SIZE {
                return Err(Error::TruncatedHeader { offset: pos });
            }
            let member = parse_header(&header, pos)?;
            let available = length - member.offset;
            if member.size > available {
                return Err(Error::SizeOverrun {
                    name: member.name,
                    size: member.size,
                    available,
                });
            }
            tracing::debug!(
                name = member.name.as_str(),
                offset = member.offset,
                size = member.size,
                "indexed ar member"
            );

            pos = member.offset + member.size + member.size % 2;
            members.push(member);
            reader.seek(SeekFrom::Start(pos))?;
        }

        Ok(Self {
            source: Rc::new(RefCell::new(reader)),
            members,
        })
    }

    /// The members, in archive order.
    pub fn members(&self) -> &[ArMember] {
        &self.members
    }

    /// Iterate over the members, in archive order.
    pub fn iter(&self) -> std::slice::Iter<'_, ArMember> {
        self.members.iter()
    }

    /// Names of the members, in archive order. Duplicates are included.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.name())
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the archive has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Look up a member by name. If several members share the name, the last
    /// one wins.
    pub fn member(&self, name: &str) -> Result<&ArMember, Error> {
        self.members
            .iter()
            .rev()
            .find(|m| m.name == name)
            .ok_or_else(|| Error::MemberNotFound(name.to_string()))
    }

    /// Open a reader over the data of a member.
    pub fn reader(&self, member: &ArMember) -> MemberReader<R> {
        MemberReader::new(Rc::clone(&self.source), member)
    }

    /// Open a reader over the data of the member with this name.
    pub fn open(&self, name: &str) -> Result<MemberReader<R>, Error> {
        Ok(self.reader(self.member(name)?))
    }

    pub(crate) fn source(&self) -> Rc<RefCell<R>> {
        Rc::clone(&self.source)
    }
}

impl<'a, R> IntoIterator for &'a ArArchive<R> {
    type Item = &'a ArMember;
    type IntoIter = std::slice::Iter<'a, ArMember>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

/// A bounded view over the data of one member.
///
/// Positions are relative to the start of the member. Each reader keeps its
/// own position, so several readers over the same archive do not interfere.
#[derive(Debug)]
pub struct MemberReader<R> {
    source: Rc<RefCell<R>>,
    start: u64,
    size: u64,
    pos: u64,
    buffer: Vec<u8>,
    buffer_start: u64,
}

impl<R> MemberReader<R> {
    pub(crate) fn new(source: Rc<RefCell<R>>, member: &ArMember) -> Self {
        Self {
            source,
            start: member.offset,
            size: member.size,
            pos: 0,
            buffer: Vec::new(),
            buffer_start: 0,
        }
    }

    /// Size of the member.
    pub fn size(&self) -> u64 {
        self.size
    }

    fn buffered(&self) -> bool {
        self.pos >= self.buffer_start && self.pos < self.buffer_start + self.buffer.len() as u64
    }
}

impl<R: Read + Seek> BufRead for MemberReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if !self.buffered() {
            let remaining = self.size.saturating_sub(self.pos);
            if remaining == 0 {
                return Ok(&[]);
            }
            let len = remaining.min(CHUNK_SIZE as u64) as usize;
            self.buffer.resize(len, 0);
            let mut source = self.source.borrow_mut();
            source.seek(SeekFrom::Start(self.start + self.pos))?;
            source.read_exact(&mut self.buffer)?;
            self.buffer_start = self.pos;
        }
        let skip = (self.pos - self.buffer_start) as usize;
        Ok(&self.buffer[skip..])
    }

    fn consume(&mut self, amt: usize) {
        self.pos = (self.pos + amt as u64).min(self.size);
    }
}

impl<R: Read + Seek> Read for MemberReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl<R: Read + Seek> Seek for MemberReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => i128::from(n),
            SeekFrom::Current(d) => i128::from(self.pos) + i128::from(d),
            SeekFrom::End(d) => i128::from(self.size) + i128::from(d),
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before the start of the member",
            ));
        }
        self.pos = u64::try_from(target).unwrap_or(u64::MAX).min(self.size);
        Ok(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(name: &str, data: &[u8]) -> Vec<u8> {
        let mut out = format!(
            "{:<16}{:<12}{:<6}{:<6}{:<8}{:<10}`\n",
            name,
            1700000000,
            0,
            0,
            "100644",
            data.len()
        )
        .into_bytes();
        out.extend_from_slice(data);
        if data.len() % 2 == 1 {
            out.push(b'\n');
        }
        out
    }

    fn archive(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut out = GLOBAL_HEADER.to_vec();
        for (name, data) in members {
            out.extend(member(name, data));
        }
        out
    }

    #[test]
    fn test_members() {
        let data = archive(&[("debian-binary", b"2.0\n"), ("odd/", b"abc"), ("after", b"xyz!")]);
        let ar = ArArchive::from_bytes(data.clone()).unwrap();
        assert_eq!(ar.len(), 3);
        assert_eq!(ar.names().collect::<Vec<_>>(), vec!["debian-binary", "odd", "after"]);

        let m = ar.member("debian-binary").unwrap();
        assert_eq!(m.size(), 4);
        assert_eq!(m.offset(), 68);
        assert_eq!(m.mode(), 0o100644);
        assert_eq!(m.mtime(), 1700000000);
        assert_eq!(m.uid(), 0);

        // Offsets and sizes cover the whole input, pad bytes included.
        let last = ar.member("after").unwrap();
        assert_eq!(last.offset() + last.size(), data.len() as u64);

        let mut content = String::new();
        ar.open("after").unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "xyz!");
    }

    #[test]
    fn test_duplicate_names() {
        let data = archive(&[("dup", b"first"), ("dup", b"second")]);
        let ar = ArArchive::from_bytes(data).unwrap();
        assert_eq!(ar.len(), 2);
        let mut content = String::new();
        ar.open("dup").unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "second");
        assert!(matches!(ar.member("missing"), Err(Error::MemberNotFound(n)) if n == "missing"));
    }

    #[test]
    fn test_empty_archive() {
        let ar = ArArchive::from_bytes(GLOBAL_HEADER.to_vec()).unwrap();
        assert!(ar.is_empty());
    }

    #[test]
    fn test_bad_archives() {
        assert!(matches!(
            ArArchive::from_bytes(b"!<arc".to_vec()),
            Err(Error::BadGlobalHeader)
        ));
        assert!(matches!(
            ArArchive::from_bytes(b"not an archive at all".to_vec()),
            Err(Error::BadGlobalHeader)
        ));

        let mut data = archive(&[("a", b"ab")]);
        data.extend_from_slice(b"short header");
        assert!(matches!(
            ArArchive::from_bytes(data),
            Err(Error::TruncatedHeader { offset: 70 })
        ));

        let mut data = archive(&[("a", b"ab")]);
        data[8 + 58] = b'X';
        assert!(matches!(
            ArArchive::from_bytes(data),
            Err(Error::BadMemberMagic { offset: 8 })
        ));

        let mut data = archive(&[("a", b"ab")]);
        data[8 + 48] = b'x';
        assert!(matches!(
            ArArchive::from_bytes(data),
            Err(Error::InvalidHeaderField { field: "size", .. })
        ));

        let mut data = archive(&[("a", b"abcd")]);
        data.truncate(data.len() - 2);
        assert!(matches!(
            ArArchive::from_bytes(data),
            Err(Error::SizeOverrun { size: 4, available: 2, .. })
        ));
    }

    #[test]
    fn test_reader_seek() {
        let data = archive(&[("first", b"0123456789"), ("second", b"abcdef")]);
        let ar = ArArchive::from_bytes(data).unwrap();
        let mut r = ar.open("first").unwrap();
        assert_eq!(r.size(), 10);

        let mut buf = [0u8; 4];
        r.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"0123");
        assert_eq!(r.stream_position().unwrap(), 4);

        assert_eq!(r.seek(SeekFrom::End(-2)).unwrap(), 8);
        let mut rest = Vec::new();
        r.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"89");
        assert_eq!(r.read(&mut buf).unwrap(), 0);

        assert_eq!(r.seek(SeekFrom::Start(100)).unwrap(), 10);
        assert_eq!(r.seek(SeekFrom::Current(-3)).unwrap(), 7);
        let err = r.seek(SeekFrom::Current(-8)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert_eq!(r.stream_position().unwrap(), 7);
    }

    #[test]
    fn test_independent_readers() {
        let data = archive(&[("first", b"0123456789"), ("second", b"abcdef")]);
        let ar = ArArchive::from_bytes(data).unwrap();
        let mut a = ar.open("first").unwrap();
        let mut b = ar.open("second").unwrap();
        let mut c = ar.open("first").unwrap();

        let mut buf = [0u8; 3];
        a.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"012");
        b.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"abc");
        c.seek(SeekFrom::Start(5)).unwrap();
        c.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"567");
        a.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"345");
    }

    #[test]
    fn test_read_lines() {
        let data = archive(&[("lines", b"one\ntwo\nthree")]);
        let ar = ArArchive::from_bytes(data).unwrap();
        let lines: Vec<String> = ar
            .open("lines")
            .unwrap()
            .lines()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(lines, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::BadGlobalHeader.to_string(),
            "Not an ar archive: bad global header"
        );
        assert_eq!(
            Error::MemberNotFound("data.tar.gz".to_string()).to_string(),
            "No member named data.tar.gz"
        );
    }
}
