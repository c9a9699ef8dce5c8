//! Debian release names, ordered chronologically.
use std::sync::OnceLock;

/// Known release codenames, oldest first.
const RELEASE_NAMES: &[&str] = &[
    "potato", "woody", "sarge", "etch", "lenny", "squeeze", "wheezy", "jessie", "stretch",
    "buster", "bullseye", "bookworm", "trixie", "forky", "sid",
];

/// A Debian release.
///
/// Releases are interned: [`intern_release`] always hands out the same
/// instance for a name, and releases sort by age.
#[derive(Debug)]
pub struct Release {
    name: &'static str,
    order: usize,
}

impl Release {
    /// The codename, e.g. `bookworm`.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for Release {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order
    }
}

impl Eq for Release {}

impl PartialOrd for Release {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Release {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.order.cmp(&other.order)
    }
}

impl std::hash::Hash for Release {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.order.hash(state);
    }
}

impl std::fmt::Display for Release {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// All known releases, oldest first.
pub fn releases() -> &'static [Release] {
    static RELEASES: OnceLock<Vec<Release>> = OnceLock::new();
    RELEASES.get_or_init(|| {
        RELEASE_NAMES
            .iter()
            .enumerate()
            .map(|(order, name)| Release { name, order })
            .collect()
    })
}

/// Look up a release by codename.
pub fn intern_release(name: &str) -> Option<&'static Release> {
    releases().iter().find(|r| r.name == name)
}
