#![deny(missing_docs)]
//! Debian version strings.
//!
//! A version has the shape `[epoch:]upstream_version[-debian_revision]`. This
//! crate parses such strings and orders them the way dpkg does.
//!
//! # Examples
//!
//! ```rust
//! use debian_version::Version;
//!
//! let rc: Version = "1.5~rc1".parse().unwrap();
//! let release: Version = "1.5".parse().unwrap();
//! assert!(rc < release);
//! assert_eq!(rc.to_string(), "1.5~rc1");
//! ```
use lazy_regex::regex_captures;
use std::cmp::Ordering;
use std::str::FromStr;

pub mod compare;
pub mod release;

pub use compare::{version_compare, NativeCompare, VersionCompare};
#[cfg(feature = "debversion")]
pub use compare::DebversionCompare;
pub use release::{intern_release, releases, Release};

/// Error returned for strings outside the Debian version grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionFormatError(String);

impl VersionFormatError {
    /// The string that failed to parse.
    pub fn input(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VersionFormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Invalid version string: {:?}", self.0)
    }
}

impl std::error::Error for VersionFormatError {}

/// A Debian version.
///
/// The string a version was parsed from is kept verbatim and returned by
/// [`Version::full_version`] and `Display`. Equality and hashing work on that
/// string, so `1.0` and `1.0-0` are different values even though dpkg
/// considers them equivalent; use [`Version::cmp_dpkg`] for the pure dpkg
/// ordering.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    epoch: Option<u32>,
    upstream_version: String,
    debian_revision: Option<String>,
}

impl Version {
    /// Build a version from its components.
    pub fn from_parts(
        epoch: Option<u32>,
        upstream_version: &str,
        debian_revision: Option<&str>,
    ) -> Result<Self, VersionFormatError> {
        let mut raw = String::new();
        if let Some(epoch) = epoch {
            raw.push_str(&epoch.to_string());
            raw.push(':');
        }
        raw.push_str(upstream_version);
        if let Some(revision) = debian_revision {
            raw.push('-');
            raw.push_str(revision);
        }
        raw.parse()
    }

    /// The full version string, exactly as given.
    pub fn full_version(&self) -> &str {
        &self.raw
    }

    /// The epoch, if one was given.
    pub fn epoch(&self) -> Option<u32> {
        self.epoch
    }

    /// The upstream part of the version.
    pub fn upstream_version(&self) -> &str {
        &self.upstream_version
    }

    /// The Debian revision, if any. Native packages have none.
    pub fn debian_revision(&self) -> Option<&str> {
        self.debian_revision.as_deref()
    }

    /// Whether this is the version of a native package.
    pub fn is_native(&self) -> bool {
        self.debian_revision.is_none()
    }

    /// Replace the whole version string.
    pub fn set_full_version(&mut self, text: &str) -> Result<(), VersionFormatError> {
        *self = text.parse()?;
        Ok(())
    }

    /// Replace the epoch, rebuilding the version string.
    pub fn set_epoch(&mut self, epoch: Option<u32>) -> Result<(), VersionFormatError> {
        *self = Self::from_parts(
            epoch,
            &self.upstream_version,
            self.debian_revision.as_deref(),
        )?;
        Ok(())
    }

    /// Replace the upstream version, rebuilding the version string.
    pub fn set_upstream_version(&mut self, upstream: &str) -> Result<(), VersionFormatError> {
        *self = Self::from_parts(self.epoch, upstream, self.debian_revision.as_deref())?;
        Ok(())
    }

    /// Replace the Debian revision, rebuilding the version string.
    pub fn set_debian_revision(&mut self, revision: Option<&str>) -> Result<(), VersionFormatError> {
        *self = Self::from_parts(self.epoch, &self.upstream_version, revision)?;
        Ok(())
    }

    /// Compare using the dpkg algorithm only.
    ///
    /// Unlike `Ord`, this returns `Equal` for versions that differ only in
    /// spelling, such as `1.0` and `0:1.0-0`.
    pub fn cmp_dpkg(&self, other: &Self) -> Ordering {
        NativeCompare.compare(self, other)
    }

    /// Compare using an explicitly chosen backend.
    pub fn compare_with(&self, other: &Self, backend: &dyn VersionCompare) -> Ordering {
        backend.compare(self, other)
    }
}

impl FromStr for Version {
    type Err = VersionFormatError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (_, epoch, upstream_version, debian_revision) = regex_captures!(
            r"^(?:(\d+):)?([A-Za-z0-9.+:~-]+?)(?:-([A-Za-z0-9+.~]+))?$",
            text
        )
        .ok_or_else(|| VersionFormatError(text.to_string()))?;

        let epoch = if epoch.is_empty() {
            None
        } else {
            Some(
                epoch
                    .parse::<u32>()
                    .map_err(|_| VersionFormatError(text.to_string()))?,
            )
        };

        // A colon in the upstream part is only unambiguous with an explicit
        // epoch, and a hyphen only with an explicit revision.
        if epoch.is_none() && upstream_version.contains(':') {
            return Err(VersionFormatError(text.to_string()));
        }
        if debian_revision.is_empty() && upstream_version.contains('-') {
            return Err(VersionFormatError(text.to_string()));
        }

        Ok(Version {
            raw: text.to_string(),
            epoch,
            upstream_version: upstream_version.to_string(),
            debian_revision: if debian_revision.is_empty() {
                None
            } else {
                Some(debian_revision.to_string())
            },
        })
    }
}

impl TryFrom<&str> for Version {
    type Error = VersionFormatError;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        text.parse()
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Version {}

impl std::hash::Hash for Version {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        // The raw string breaks ties so that the order agrees with `Eq`.
        self.cmp_dpkg(other).then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Version {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Version {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
