//! Cloud Controller API version parsing and feature gates.

use std::fmt;

use crate::metadata::MetadataKind;

/// A `major.minor.patch` version as advertised by the Cloud Controller.
///
/// Pre-release versions (`3.63.0-rc.1`) order below the release they precede;
/// build suffixes (`+sha`) are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    release: bool,
}

impl ApiVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            release: true,
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let core = input.split('+').next()?;
        let (core, release) = match core.split_once('-') {
            Some((core, pre)) if !pre.is_empty() => (core, false),
            Some(_) => return None,
            None => (core, true),
        };
        let mut parts = core.split('.');
        let major = parse_component(parts.next()?)?;
        let minor = parse_component(parts.next()?)?;
        let patch = parse_component(parts.next()?)?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            major,
            minor,
            patch,
            release,
        })
    }

    /// Whether the given metadata kind can be read and written on this version.
    pub fn supports_metadata(&self, kind: MetadataKind) -> bool {
        *self >= kind.minimum_version()
    }
}

fn parse_component(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // No leading zeros, as in semver.
    if part.len() > 1 && part.starts_with('0') {
        return None;
    }
    part.parse().ok()
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Gate for an advertised version string.
///
/// An unparsable version answers `true` so that calls are attempted anyway;
/// the metadata writer tolerates the 404 an old controller would return.
pub fn metadata_available(advertised: &str, kind: MetadataKind) -> bool {
    match ApiVersion::parse(advertised) {
        Some(version) => version.supports_metadata(kind),
        None => true,
    }
}
