//! Parsing of `lvs -a -o lv_name,lv_size --unit=m --noheadings` output.
//!
//! Each line holds a volume name and its size in MiB, e.g.
//!
//! ```text
//!   home                    1024.00m
//!   [pool00_tmeta]          1024.00m
//!   rhvh-4.1-0.20170616.0+1 <6.56g
//! ```
//!
//! Hidden volumes, such as the thin pool metadata, are shown in brackets.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::lines;

/// Matches the thin pool metadata volume.
static POOL_TMETA_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[pool.*_tmeta\]").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LvsError {
    #[error("No pool metadata volume in lvs output")]
    MissingPoolTmeta,
    #[error("Cannot read size '{0}' as MiB")]
    InvalidSize(String),
    #[error("Line '{0}' is not '<name> <size>'")]
    InvalidRecord(String),
}

/// Whether `line` describes the thin pool metadata volume.
pub fn is_pool_tmeta(line: &str) -> bool {
    POOL_TMETA_REGEX.is_match(line)
}

/// One `lvs` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalVolumeRecord {
    pub name: String,
    pub size: String,
}

impl LogicalVolumeRecord {
    /// Reads the first token as the name and the last one as the size.
    pub fn parse(line: &str) -> Result<Self, LvsError> {
        let mut tokens = line.split_whitespace();
        match (tokens.next(), tokens.last()) {
            (Some(name), Some(size)) => Ok(Self {
                name: name.to_string(),
                size: size.to_string(),
            }),
            _ => Err(LvsError::InvalidRecord(line.trim().to_string())),
        }
    }

    /// Integer part of the size in MiB, e.g. `1023.99m` -> 1023.
    pub fn size_mib(&self) -> Result<u64, LvsError> {
        self.size
            .trim_start_matches('<')
            .split('.')
            .next()
            .and_then(|whole| whole.trim_end_matches('m').parse().ok())
            .ok_or_else(|| LvsError::InvalidSize(self.size.clone()))
    }
}

/// Normalized set of `lvs` lines. The order `lvs` printed them in is kept
/// next to the set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LvsListing {
    lines: BTreeSet<String>,
    printed: Vec<String>,
}

impl LvsListing {
    pub fn parse(raw: &str) -> Self {
        Self::from_printed(lines::normalized_lines(raw).map(str::to_string))
    }

    /// Parses `raw`, dropping every line that contains `marker`.
    pub fn parse_filtered(raw: &str, marker: &str) -> Self {
        Self::from_printed(
            lines::normalized_lines(raw)
                .filter(|line| !line.contains(marker))
                .map(str::to_string),
        )
    }

    fn from_printed(printed: impl IntoIterator<Item = String>) -> Self {
        let mut listing = Self::default();
        for line in printed {
            if listing.lines.insert(line.clone()) {
                listing.printed.push(line);
            }
        }
        listing
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines of `self` absent from `other`.
    pub fn difference(&self, other: &LvsListing) -> LvsListing {
        Self::from_printed(
            self.printed
                .iter()
                .filter(|line| !other.lines.contains(*line))
                .cloned(),
        )
    }

    /// Lines describing the volume `name`, i.e. starting with `"{name} "`.
    pub fn records_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        let prefix = format!("{name} ");
        self.lines().filter(move |line| line.starts_with(&prefix))
    }

    /// Whether any line contains `needle`.
    pub fn contains_substring(&self, needle: &str) -> bool {
        self.lines().any(|line| line.contains(needle))
    }

    /// The thin pool metadata volume, from the first matching line in the
    /// order `lvs` printed them.
    pub fn pool_tmeta(&self) -> Result<LogicalVolumeRecord, LvsError> {
        self.printed
            .iter()
            .map(String::as_str)
            .find(|line| is_pool_tmeta(line))
            .ok_or(LvsError::MissingPoolTmeta)
            .and_then(LogicalVolumeRecord::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use indoc::indoc;

    const OLD_LVS: &str = indoc! {"
          WARNING: Not using lvmetad because config setting use_lvmetad=0.\r
          [lvol0_pmspare]              16.00m\r
          pool00                       36292.00m\r
          [pool00_tdata]               36292.00m\r
          [pool00_tmeta]               16.00m\r
          rhvh-4.1-0.20170522.0        36292.00m\r
          rhvh-4.1-0.20170522.0+1      36292.00m\r
          root                         36292.00m\r
          swap                         8064.00m\r
          var                          15360.00m\r
    "};

    #[test]
    fn test_parse_filtered() {
        let old = LvsListing::parse_filtered(OLD_LVS, "WARNING");
        assert_eq!(old.len(), 9);
        assert!(!old.contains_substring("lvmetad"));
        assert!(LvsListing::parse(OLD_LVS).contains_substring("lvmetad"));
    }

    #[test]
    fn test_difference_and_records() {
        let old = LvsListing::parse_filtered(OLD_LVS, "WARNING");
        let new = LvsListing::parse(indoc! {"
            [pool00_tmeta] 1024.00m
            home 1024.00m
            root 36292.00m
        "});

        let diff = new.difference(&old);
        assert_eq!(
            diff.lines().collect::<Vec<_>>(),
            vec!["[pool00_tmeta] 1024.00m", "home 1024.00m"]
        );
        assert_eq!(diff.records_named("home").count(), 1);
        assert_eq!(diff.records_named("hom").count(), 0);
        assert_eq!(old.records_named("var").count(), 1);
        assert_eq!(old.difference(&old).len(), 0);
    }

    #[test]
    fn test_pool_tmeta() {
        let old = LvsListing::parse_filtered(OLD_LVS, "WARNING");
        let tmeta = old.pool_tmeta().unwrap();
        assert_eq!(tmeta.name, "[pool00_tmeta]");
        assert_eq!(tmeta.size_mib().unwrap(), 16);

        assert_eq!(
            LvsListing::parse("root 1.00m").pool_tmeta(),
            Err(LvsError::MissingPoolTmeta)
        );
        assert!(!is_pool_tmeta("pool00 100.00m"));

        // Two thin pools: the one printed first wins, not the one sorting first.
        let listing = LvsListing::parse(indoc! {"
            [pool01_tmeta] 2048.00m
            [pool00_tmeta] 16.00m
        "});
        let tmeta = listing.pool_tmeta().unwrap();
        assert_eq!(tmeta.name, "[pool01_tmeta]");
        assert_eq!(tmeta.size_mib().unwrap(), 2048);
        assert!(!is_pool_tmeta(" x [pool00_tmeta] 1.00m"));
    }

    #[test]
    fn test_size_mib() {
        let record = LogicalVolumeRecord::parse("[pool00_tmeta] <1023.99m").unwrap();
        assert_eq!(record.size_mib().unwrap(), 1023);

        let record = LogicalVolumeRecord::parse("home 2048m").unwrap();
        assert_eq!(record.size_mib().unwrap(), 2048);

        let record = LogicalVolumeRecord::parse("home large").unwrap();
        assert_eq!(
            record.size_mib(),
            Err(LvsError::InvalidSize("large".into()))
        );

        LogicalVolumeRecord::parse("home").unwrap_err();
    }
}
