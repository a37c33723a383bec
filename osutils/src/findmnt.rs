//! Module for reading `findmnt -r -n` output.
//!
//! In raw mode `findmnt` prints one mount per line, with target, source,
//! filesystem type and options separated by spaces:
//!
//! ```text
//! / /dev/mapper/rhvh-rhvh--4.1--0.20170616.0+1 ext4 rw,relatime,discard
//! /var /dev/mapper/rhvh-var ext4 rw,relatime,discard
//! ```
//!
//! Device mapper escapes `-` in volume names as `--`, so layer names show up
//! in mount sources in their escaped form.

use std::collections::BTreeSet;

use crate::lines;

/// Escapes a logical volume name the way device mapper does in
/// `/dev/mapper` paths.
pub fn dm_escape(name: &str) -> String {
    name.replace('-', "--")
}

/// Normalized set of mount lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountTable {
    lines: BTreeSet<String>,
}

impl MountTable {
    pub fn parse(raw: &str) -> Self {
        Self {
            lines: lines::line_set(raw),
        }
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

    /// Mounts present in `self` but not in `other`.
    pub fn difference(&self, other: &MountTable) -> MountTable {
        Self {
            lines: self.lines.difference(&other.lines).cloned().collect(),
        }
    }

    /// Lines containing `key` anywhere, e.g. a mount point or device path.
    pub fn containing<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.lines().filter(move |line| line.contains(key))
    }

    pub fn mentions(&self, key: &str) -> bool {
        self.containing(key).next().is_some()
    }
}
