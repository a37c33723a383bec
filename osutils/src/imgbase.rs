//! Helpers for `imgbase` output.
//!
//! `imgbase w` names the layer the host booted into:
//!
//! ```text
//! You are on rhvh-4.1-0.20170616.0+1
//! ```
//!
//! A layer is a base name followed by `+N`. `imgbase layout` prints the base
//! and its layers as a tree.

use crate::{findmnt::dm_escape, lines};

/// Separator between the base name and the layer number.
const LAYER_SEPARATOR: char = '+';

/// Width of the date stamp in a layer name.
const STAMP_WIDTH: usize = 8;

/// Characters between the end of the stamp and the end of the `imgbase w`
/// output, e.g. `.0+1`.
const STAMP_SUFFIX_WIDTH: usize = 4;

/// Current layer, as reported by `imgbase w`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer(String);

impl Layer {
    /// Reads the layer from `imgbase w` output: its last token.
    pub fn from_imgbase_w(raw: &str) -> Option<Self> {
        lines::last_token(raw).map(|token| Self(token.to_string()))
    }

    /// Full layer name, e.g. `rhvh-4.1-0.20170616.0+1`.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Layer name without the layer number, e.g. `rhvh-4.1-0.20170616.0`.
    pub fn base(&self) -> &str {
        self.0
            .split(LAYER_SEPARATOR)
            .next()
            .unwrap_or(self.0.as_str())
    }

    /// Layer name as it appears in `/dev/mapper` paths.
    pub fn dm_name(&self) -> String {
        dm_escape(&self.0)
    }
}

/// Date stamp of the current layer, taken from the fixed position it holds
/// at the end of `imgbase w` output: `...0.20170616.0+1` -> `20170616`.
///
/// Returns `None` when the output is too short to hold a stamp.
pub fn build_stamp_window(raw: &str) -> Option<String> {
    let chars: Vec<char> = raw.trim_end().chars().collect();
    let width = STAMP_WIDTH + STAMP_SUFFIX_WIDTH;
    if chars.len() < width {
        return None;
    }

    let start = chars.len() - width;
    Some(chars[start..start + STAMP_WIDTH].iter().collect())
}
