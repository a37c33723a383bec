use std::{fmt::Display, str::FromStr};

/// Numeric components of a dotted or dash-delimited version string.
///
/// `"4.1.2"` parses into `[4, 1, 2]` and `"4.1-3"` into `[4, 1, 3]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionToken(Vec<u64>);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionParseError {
    #[error("version string is empty")]
    Empty,
    #[error("version component '{component}' in '{version}' is not numeric")]
    NonNumeric { version: String, component: String },
}

/// Why one version is not an acceptable successor of another.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionOrderError {
    #[error("old version {old} has {old_len} components but new version {new} has {new_len}")]
    LengthMismatch {
        old: VersionToken,
        new: VersionToken,
        old_len: usize,
        new_len: usize,
    },
    #[error("component {index} decreased from {old_component} to {new_component} ({old} -> {new})")]
    Regression {
        old: VersionToken,
        new: VersionToken,
        index: usize,
        old_component: u64,
        new_component: u64,
    },
}

impl VersionToken {
    pub fn components(&self) -> &[u64] {
        &self.0
    }

    /// Checks that `self`, the newer version, is not behind `old` in any
    /// component. Components are compared one by one, not as a tuple, so
    /// `1.9 -> 2.0` is a regression of the second component.
    pub fn check_not_older_than(&self, old: &VersionToken) -> Result<(), VersionOrderError> {
        if self.0.len() != old.0.len() {
            return Err(VersionOrderError::LengthMismatch {
                old: old.clone(),
                new: self.clone(),
                old_len: old.0.len(),
                new_len: self.0.len(),
            });
        }

        match old
            .0
            .iter()
            .zip(self.0.iter())
            .enumerate()
            .find(|(_, (o, n))| o > n)
        {
            Some((index, (o, n))) => Err(VersionOrderError::Regression {
                old: old.clone(),
                new: self.clone(),
                index,
                old_component: *o,
                new_component: *n,
            }),
            None => Ok(()),
        }
    }
}

impl FromStr for VersionToken {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(VersionParseError::Empty);
        }

        s.split(['.', '-'])
            .map(|c| {
                c.parse::<u64>().map_err(|_| VersionParseError::NonNumeric {
                    version: s.to_string(),
                    component: c.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl Display for VersionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered = self
            .0
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(".");
        f.write_str(&rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> VersionToken {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse() {
        assert_eq!(v("4.1.2").components(), &[4, 1, 2]);
        assert_eq!(v("0.9-30").components(), &[0, 9, 30]);
        assert_eq!(v(" 1.0 ").to_string(), "1.0");

        assert_eq!("".parse::<VersionToken>(), Err(VersionParseError::Empty));
        assert!(matches!(
            "1.x.3".parse::<VersionToken>(),
            Err(VersionParseError::NonNumeric { component, .. }) if component == "x"
        ));
    }

    #[test]
    fn test_monotonic() {
        v("4.1.3").check_not_older_than(&v("4.1.2")).unwrap();
        v("4.1.2").check_not_older_than(&v("4.1.2")).unwrap();

        assert!(matches!(
            v("4.1").check_not_older_than(&v("4.1.2")),
            Err(VersionOrderError::LengthMismatch {
                old_len: 3,
                new_len: 2,
                ..
            })
        ));

        assert!(matches!(
            v("4.0.9").check_not_older_than(&v("4.1.2")),
            Err(VersionOrderError::Regression { index: 1, .. })
        ));
    }

    #[test]
    fn test_element_wise_not_tuple() {
        // A tuple comparison would accept this, element-wise does not.
        assert!(matches!(
            v("2.0").check_not_older_than(&v("1.9")),
            Err(VersionOrderError::Regression {
                index: 1,
                old_component: 9,
                new_component: 0,
                ..
            })
        ));
    }
}
