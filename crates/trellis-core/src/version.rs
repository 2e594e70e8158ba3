//! Four-part version numbers.
//!
//! Versions have the shape `major.minor.maintenance_update`, optionally
//! followed by a free-form build string. They are used to report the toolkit
//! and host runtime versions and accept the formats commonly found in runtime
//! version properties:
//!
//! ```
//! use trellis_core::Version;
//!
//! let v = Version::decode("1.8.0_131").unwrap();
//! assert_eq!(v, Version::new(1, 8, 0, 131).unwrap());
//!
//! let v = Version::decode("9.0.1+11").unwrap();
//! assert_eq!(v.to_string(), "9.0.1_00-11");
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::VersionError;

/// Largest value accepted for any revision component.
pub const MAX_REVISION: u32 = 32767;

const BUILD_SEPARATORS: [char; 3] = ['-', '+', ' '];

/// A version number with an optional build suffix.
///
/// Equality, hashing and ordering consider only the four numeric revisions;
/// the build string is informational.
#[derive(Debug, Clone)]
pub struct Version {
    major: u16,
    minor: u16,
    maintenance: u16,
    update: u16,
    build: Option<String>,
}

impl Version {
    /// Create a version from its four revisions.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::OutOfRange`] if any revision exceeds
    /// [`MAX_REVISION`].
    pub fn new(major: u32, minor: u32, maintenance: u32, update: u32) -> Result<Self, VersionError> {
        Ok(Self {
            major: check_revision("major revision", major)?,
            minor: check_revision("minor revision", minor)?,
            maintenance: check_revision("maintenance revision", maintenance)?,
            update: check_revision("update revision", update)?,
            build: None,
        })
    }

    /// Create a version with a build string.
    pub fn with_build(
        major: u32,
        minor: u32,
        maintenance: u32,
        update: u32,
        build: impl Into<String>,
    ) -> Result<Self, VersionError> {
        let mut version = Self::new(major, minor, maintenance, update)?;
        let build = build.into();
        if !build.is_empty() {
            version.build = Some(build);
        }
        Ok(version)
    }

    /// Parse a version string.
    ///
    /// The numeric part ends at the first `-`, `+` or space; everything after
    /// that separator is kept as the build string. Missing revisions default
    /// to zero and an `_NN` suffix on the last numeric part is the update
    /// revision.
    pub fn decode(text: &str) -> Result<Self, VersionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(VersionError::Empty);
        }

        let (numeric, build) = match text.find(BUILD_SEPARATORS) {
            Some(index) => (&text[..index], Some(&text[index + 1..])),
            None => (text, None),
        };

        let (revisions, update) = match numeric.split_once('_') {
            Some((revisions, update)) => (revisions, Some(update)),
            None => (numeric, None),
        };

        let mut parts = [0u32; 4];
        let mut count = 0;
        for part in revisions.split('.') {
            if count == parts.len() {
                return Err(VersionError::InvalidFormat(text.to_string()));
            }
            parts[count] = parse_number(part, text)?;
            count += 1;
        }
        if let Some(update) = update {
            parts[3] = parse_number(update, text)?;
        }

        let version = Self::new(parts[0], parts[1], parts[2], parts[3])?;
        Ok(match build {
            Some(build) if !build.is_empty() => Self {
                build: Some(build.to_string()),
                ..version
            },
            _ => version,
        })
    }

    /// The major revision.
    pub fn major(&self) -> u16 {
        self.major
    }

    /// The minor revision.
    pub fn minor(&self) -> u16 {
        self.minor
    }

    /// The maintenance revision.
    pub fn maintenance(&self) -> u16 {
        self.maintenance
    }

    /// The update revision.
    pub fn update(&self) -> u16 {
        self.update
    }

    /// The build string, if any.
    pub fn build(&self) -> Option<&str> {
        self.build.as_deref()
    }

    /// The revisions packed into one integer, 16 bits each.
    pub fn number(&self) -> u64 {
        (u64::from(self.major) << 48)
            | (u64::from(self.minor) << 32)
            | (u64::from(self.maintenance) << 16)
            | u64::from(self.update)
    }

    /// `major.minor.maintenance` without update or build.
    pub fn simple_to_string(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.maintenance)
    }
}

fn check_revision(name: &'static str, value: u32) -> Result<u16, VersionError> {
    if value > MAX_REVISION {
        return Err(VersionError::OutOfRange { name, value });
    }
    // MAX_REVISION fits in u16.
    Ok(value as u16)
}

fn parse_number(part: &str, text: &str) -> Result<u32, VersionError> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VersionError::InvalidFormat(text.to_string()));
    }
    part.parse::<u32>()
        .map_err(|_| VersionError::InvalidFormat(text.to_string()))
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}_{:02}",
            self.major, self.minor, self.maintenance, self.update
        )?;
        if let Some(build) = &self.build {
            write!(f, "-{build}")?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.number() == other.number()
    }
}

impl Eq for Version {}

impl std::hash::Hash for Version {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.number().hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.number().cmp(&other.number())
    }
}
