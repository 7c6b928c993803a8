//! Name Codec - Layer Identity From Filenames
//!
//! A layer's on-disk name carries its whole identity:
//! `<segment>( :: <segment>)*__<order>`, e.g.
//! `hero :: pose_stand :: expression_smile__3`.
//!
//! Parsing fails softly (None). A directory mixing layer exports with
//! unrelated files must never fail a scan.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Separator between the segment section and the numeric order suffix.
pub const SECTION_SEP: &str = "__";

/// Separator between hierarchy segments (surrounding whitespace tolerated).
pub const SEGMENT_SEP: &str = "::";

/// `all` or `all-2` / `all_2`: marks the preceding attrib as a catch-all
/// target group.
static WILDCARD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(all|all[-_][0-9]+)$").unwrap());

/// Structured identity of one layer file. Built exactly once per path,
/// never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerIdentity {
    /// Original file path; primary key for dedup.
    pub path: PathBuf,
    /// Full hierarchical name, normalized.
    pub segments: Vec<String>,
    /// First segment; the subject this layer belongs to.
    pub tag: String,
    /// Remaining segments after the tag, in hierarchy order. Never empty.
    pub attribs: Vec<String>,
    /// Most specific attribute (last of `attribs`).
    pub leaf: String,
    /// Numeric stacking-order suffix.
    pub order: u32,
    /// Attribute immediately preceding the last wildcard marker, if any.
    #[serde(default)]
    pub target: Option<String>,
    /// Canonical re-serialization of `segments` + `order`.
    pub name: String,
}

impl LayerIdentity {
    /// Whether any attrib is a wildcard ("apply to all") marker.
    pub fn is_wildcard_layer(&self) -> bool {
        self.attribs.iter().any(|a| is_wildcard(a))
    }
}

/// True when an attrib is a wildcard marker.
pub fn is_wildcard(attr: &str) -> bool {
    WILDCARD.is_match(attr)
}

/// Lowercase, trim, collapse internal whitespace runs to a single `_`.
/// Idempotent: normalized input comes back unchanged.
pub fn normalize_segment(segment: &str) -> String {
    segment
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Parse a layer file path into its identity.
///
/// Returns None when the name has no order suffix, the order does not
/// parse, a segment is empty or whitespace-only, or the name is tag-only
/// (a layer with no attributes is invalid for resolution).
pub fn parse_path(path: &Path) -> Option<LayerIdentity> {
    let stem = path.file_stem()?.to_str()?;

    // The order is a suffix: split on the last separator so segments may
    // contain literal underscores.
    let (segment_section, order_section) = stem.rsplit_once(SECTION_SEP)?;
    let order: u32 = order_section.trim().parse().ok()?;

    let segments: Vec<String> = segment_section
        .split(SEGMENT_SEP)
        .map(normalize_segment)
        .collect();
    if segments.iter().any(String::is_empty) {
        return None;
    }

    let (tag, attribs) = segments.split_first()?;
    if attribs.is_empty() {
        return None;
    }
    let attribs = attribs.to_vec();

    // The *last* wildcard marker decides the target; a marker in first
    // position has nothing before it to name.
    let target = attribs
        .iter()
        .rposition(|a| is_wildcard(a))
        .filter(|&i| i > 0)
        .map(|i| attribs[i - 1].clone());

    Some(LayerIdentity {
        path: path.to_path_buf(),
        tag: tag.clone(),
        leaf: attribs.last()?.clone(),
        name: build_name(&segments, order),
        segments,
        attribs,
        order,
        target,
    })
}

/// Serialize segments + order back into the canonical name (no extension).
/// Left inverse of [`parse_path`]: segments are normalized on the way out,
/// so a round-trip through the codec is exact.
pub fn build_name<S: AsRef<str>>(segments: &[S], order: u32) -> String {
    let joined = segments
        .iter()
        .map(|s| normalize_segment(s.as_ref()))
        .collect::<Vec<_>>()
        .join(" :: ");
    format!("{joined}{SECTION_SEP}{order}")
}

/// Set-intersection test over attrib lists. Tag equality is the caller's
/// precondition (candidates are already indexed per tag).
pub fn overlaps(a: &[String], b: &[String]) -> bool {
    a.iter().any(|attr| b.contains(attr))
}
