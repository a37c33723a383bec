use std::{fmt::Display, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Format of the date stamp embedded in build names, e.g. `20170616`.
pub const BUILD_STAMP_FORMAT: &str = "%Y%m%d";

/// Separator between the product name and the version in a build name.
const HOST_SEPARATOR: &str = "-host-";

/// Marker of 4.0 builds, which lack kernel and user space rpm persistence.
const LEGACY_RELEASE_MARKER: &str = "-4.0-";

/// Date a build was produced on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BuildStamp(NaiveDate);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildNameError {
    #[error("'{0}' is not a YYYYMMDD date stamp")]
    InvalidStamp(String),
    #[error("build name '{0}' does not end in a YYYYMMDD date stamp")]
    MissingStamp(String),
}

impl BuildStamp {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl FromStr for BuildStamp {
    type Err = BuildNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // chrono accepts shorter years, the stamp is always eight digits
        if s.len() != 8 || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(BuildNameError::InvalidStamp(s.to_string()));
        }

        NaiveDate::parse_from_str(s, BUILD_STAMP_FORMAT)
            .map(Self)
            .map_err(|_| BuildNameError::InvalidStamp(s.to_string()))
    }
}

impl Display for BuildStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(BUILD_STAMP_FORMAT))
    }
}

impl Serialize for BuildStamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for BuildStamp {
    fn deserialize<D>(deserializer: D) -> Result<BuildStamp, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Accept both `20170616` and "20170616", YAML reads the former as an
        // integer.
        let raw = serde_yaml::Value::deserialize(deserializer)?;
        let s = match raw {
            serde_yaml::Value::String(s) => s,
            serde_yaml::Value::Number(n) => n.to_string(),
            other => {
                return Err(serde::de::Error::custom(format!(
                    "expected a YYYYMMDD date stamp, got {other:?}"
                )))
            }
        };
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Name of an RHVH build, e.g. `redhat-virtualization-host-4.1-20170616.0`.
///
/// The trailing `-`-delimited field, up to its first `.`, is the build date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildName {
    name: String,
    stamp: BuildStamp,
}

impl BuildName {
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Date embedded in the build name.
    pub fn stamp(&self) -> BuildStamp {
        self.stamp
    }

    /// Version part of the build name, everything after `-host-`. Names
    /// without the separator are returned whole.
    ///
    /// `redhat-virtualization-host-4.1-20170616.0` -> `4.1-20170616.0`
    pub fn version(&self) -> &str {
        self.name
            .rsplit_once(HOST_SEPARATOR)
            .map(|(_, v)| v)
            .unwrap_or(&self.name)
    }

    /// Whether this is a 4.0 build.
    pub fn is_legacy_release(&self) -> bool {
        self.name.contains(LEGACY_RELEASE_MARKER)
    }
}

impl FromStr for BuildName {
    type Err = BuildNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let stamp = name
            .rsplit('-')
            .next()
            .and_then(|tail| tail.split('.').next())
            .ok_or_else(|| BuildNameError::MissingStamp(name.to_string()))?
            .parse()
            .map_err(|_| BuildNameError::MissingStamp(name.to_string()))?;

        Ok(Self {
            name: name.to_string(),
            stamp,
        })
    }
}

impl Display for BuildName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

impl Serialize for BuildName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.name)
    }
}

impl<'de> Deserialize<'de> for BuildName {
    fn deserialize<D>(deserializer: D) -> Result<BuildName, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}
