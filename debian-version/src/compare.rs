//! Version comparison backends.
use crate::{Version, VersionFormatError};
use std::cmp::Ordering;

/// A strategy for ordering two versions.
pub trait VersionCompare {
    /// Compare `a` with `b`.
    fn compare(&self, a: &Version, b: &Version) -> Ordering;
}

/// The dpkg algorithm, implemented natively.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCompare;

impl VersionCompare for NativeCompare {
    fn compare(&self, a: &Version, b: &Version) -> Ordering {
        a.epoch()
            .unwrap_or(0)
            .cmp(&b.epoch().unwrap_or(0))
            .then_with(|| verrevcmp(a.upstream_version(), b.upstream_version()))
            .then_with(|| {
                verrevcmp(
                    a.debian_revision().unwrap_or(""),
                    b.debian_revision().unwrap_or(""),
                )
            })
    }
}

/// Comparison backed by the `debversion` crate.
///
/// Versions `debversion` refuses to parse fall back to [`NativeCompare`].
#[cfg(feature = "debversion")]
#[derive(Debug, Clone, Copy, Default)]
pub struct DebversionCompare;

#[cfg(feature = "debversion")]
impl VersionCompare for DebversionCompare {
    fn compare(&self, a: &Version, b: &Version) -> Ordering {
        match (
            a.full_version().parse::<debversion::Version>(),
            b.full_version().parse::<debversion::Version>(),
        ) {
            (Ok(a), Ok(b)) => a.cmp(&b),
            _ => NativeCompare.compare(a, b),
        }
    }
}

/// Parse two strings and compare them with the dpkg algorithm.
pub fn version_compare(a: &str, b: &str) -> Result<Ordering, VersionFormatError> {
    let a: Version = a.parse()?;
    let b: Version = b.parse()?;
    Ok(a.cmp_dpkg(&b))
}

/// Sort weight of a single character; `None` stands for end of string.
fn order(c: Option<u8>) -> i32 {
    match c {
        None => 0,
        Some(c) if c.is_ascii_digit() => 0,
        Some(c) if c.is_ascii_alphabetic() => c as i32,
        Some(b'~') => -1,
        Some(c) => c as i32 + 256,
    }
}

fn is_digit(c: Option<u8>) -> bool {
    matches!(c, Some(c) if c.is_ascii_digit())
}

/// Compare one version component, alternating between non-digit and digit runs.
fn verrevcmp(a: &str, b: &str) -> Ordering {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let (mut i, mut j) = (0, 0);
    let at = |s: &[u8], k: usize| s.get(k).copied();

    while i < a.len() || j < b.len() {
        while (i < a.len() && !is_digit(at(a, i))) || (j < b.len() && !is_digit(at(b, j))) {
            let ac = order(at(a, i));
            let bc = order(at(b, j));
            if ac != bc {
                return ac.cmp(&bc);
            }
            i += 1;
            j += 1;
        }

        while at(a, i) == Some(b'0') {
            i += 1;
        }
        while at(b, j) == Some(b'0') {
            j += 1;
        }

        let mut first_diff = Ordering::Equal;
        while is_digit(at(a, i)) && is_digit(at(b, j)) {
            if first_diff == Ordering::Equal {
                first_diff = a[i].cmp(&b[j]);
            }
            i += 1;
            j += 1;
        }
        if is_digit(at(a, i)) {
            return Ordering::Greater;
        }
        if is_digit(at(b, j)) {
            return Ordering::Less;
        }
        if first_diff != Ordering::Equal {
            return first_diff;
        }
    }
    Ordering::Equal
}
