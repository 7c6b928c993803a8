//! Resolution Engine - Tag/Attribute Disambiguation
//!
//! Turns (tag, requested attributes, candidate pool) into a
//! conflict-checked, deduplicated, bottom-to-top stack of layer paths.
//!
//! Ambiguity aborts, never guesses: a silent wrong pick would produce a
//! visually wrong composite with no signal to the user.

use std::path::PathBuf;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::diff::{diff_stage, StackDiff};
use crate::names::{normalize_segment, overlaps, LayerIdentity};

#[derive(Debug, Error)]
pub enum ResolveError {
    /// Zero layers to composite, either because the tag has no candidates
    /// at all or because every candidate was filtered out.
    #[error("no layers to composite for tag '{tag}'")]
    EmptyStack { tag: String },

    /// More than one candidate survived the strict overlap re-test inside
    /// a leaf group. The caller must surface every group to a human.
    #[error(
        "ambiguous resolution for tag '{tag}': {} conflicting leaf group(s)",
        groups.len()
    )]
    Ambiguous {
        tag: String,
        groups: Vec<ConflictGroup>,
    },
}

/// Competing candidates that the resolution rules cannot tell apart,
/// keyed by the leaf attribute that caused the collision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictGroup {
    pub leaf: String,
    pub layers: Vec<LayerIdentity>,
}

/// Non-fatal diagnostics, computed for every successful resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolutionReport {
    /// Requested attributes never seen on any candidate for the tag.
    pub unknown_attribs: Vec<String>,
    /// Requested attributes absent from the final stack.
    pub unresolved_attribs: Vec<String>,
    /// Path-level diff between each consecutive resolution stage.
    pub stages: Vec<StackDiff>,
}

/// A successful resolution: the composite stack plus its diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    /// Deduplicated layers in bottom-to-top stacking order
    /// (first = background).
    pub layers: Vec<LayerIdentity>,
    pub report: ResolutionReport,
}

impl Resolution {
    /// The ordered path list handed to the compositor.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.layers.iter().map(|layer| layer.path.clone()).collect()
    }
}

/// One resolution request: a tag and the desired attribute values.
/// Attributes are normalized through the codec on construction, so the
/// request compares case-insensitively against parsed identities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveRequest {
    tag: String,
    attribs: Vec<String>,
}

impl ResolveRequest {
    pub fn new<I, S>(tag: &str, attribs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let attribs: IndexSet<String> = attribs
            .into_iter()
            .map(|a| normalize_segment(a.as_ref()))
            .filter(|a| !a.is_empty())
            .collect();
        Self {
            tag: normalize_segment(tag),
            attribs: attribs.into_iter().collect(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attribs(&self) -> &[String] {
        &self.attribs
    }
}

/// Resolve one request against the candidate pool for its tag.
///
/// Deterministic and side-effect-free apart from diagnostic logging; a
/// pure function of its inputs, safe to call concurrently for different
/// tags over an immutable index snapshot.
pub fn resolve(
    request: &ResolveRequest,
    candidates: &[LayerIdentity],
) -> Result<Resolution, ResolveError> {
    if candidates.is_empty() {
        return Err(ResolveError::EmptyStack {
            tag: request.tag().to_string(),
        });
    }
    let requested = request.attribs();

    // Pass 1: baseline overlap filter. Also records every attribute seen
    // on the tag, for the unknown-attribute diagnostic.
    let mut seen_attribs: IndexSet<&str> = IndexSet::new();
    let mut baseline: Vec<LayerIdentity> = Vec::new();
    for layer in candidates {
        seen_attribs.extend(layer.attribs.iter().map(String::as_str));
        if overlaps(&layer.attribs, requested) {
            baseline.push(layer.clone());
        }
    }
    debug!(tag = request.tag(), matches = baseline.len(), "initial overlap pass");

    // Pass 2: partition by leaf value. Each group holds mutually
    // exclusive variants of the same terminal attribute.
    let mut by_leaf: IndexMap<&str, Vec<&LayerIdentity>> = IndexMap::new();
    for layer in &baseline {
        by_leaf.entry(layer.leaf.as_str()).or_default().push(layer);
    }

    // Pass 3: conflict detection. Groups of more than one member are
    // re-tested with the leaf stripped (non-terminal ancestry only).
    let mut survivors: Vec<LayerIdentity> = Vec::new();
    let mut conflicts: Vec<ConflictGroup> = Vec::new();
    for (leaf, group) in &by_leaf {
        if group.len() <= 1 {
            survivors.extend(group.iter().map(|layer| (*layer).clone()));
            continue;
        }

        let strict: Vec<LayerIdentity> = group
            .iter()
            .filter(|layer| {
                let ancestry = &layer.attribs[..layer.attribs.len() - 1];
                overlaps(ancestry, requested)
            })
            .map(|layer| (*layer).clone())
            .collect();

        if strict.len() > 1 {
            conflicts.push(ConflictGroup {
                leaf: leaf.to_string(),
                layers: strict,
            });
        } else {
            survivors.extend(strict);
        }
    }

    if !conflicts.is_empty() {
        return Err(ResolveError::Ambiguous {
            tag: request.tag().to_string(),
            groups: conflicts,
        });
    }
    let conflict_diff = diff_stage("conflict-resolved", &baseline, &survivors);

    // Pass 4: keep only layers explicitly requested by leaf, plus
    // wildcard ("apply to all") layers.
    let kept: Vec<LayerIdentity> = survivors
        .iter()
        .filter(|layer| requested.contains(&layer.leaf) || layer.is_wildcard_layer())
        .cloned()
        .collect();
    let leaf_diff = diff_stage("leaf-filtered", &survivors, &kept);

    // Pass 5: wildcard/target expansion. The target map comes from the
    // full per-tag pool; a catch-all layer need not have matched the
    // request directly to cover an attribute group on a kept layer.
    let mut by_target: IndexMap<&str, Vec<&LayerIdentity>> = IndexMap::new();
    for layer in candidates {
        if let Some(target) = &layer.target {
            by_target.entry(target.as_str()).or_default().push(layer);
        }
    }
    let mut expanded = kept.clone();
    for layer in &kept {
        for attr in &layer.attribs {
            if let Some(group) = by_target.get(attr.as_str()) {
                expanded.extend(group.iter().map(|covering| (*covering).clone()));
            }
        }
    }
    let expanded_diff = diff_stage("expanded", &kept, &expanded);

    // Pass 6: ascending order is the document's creation order; the
    // compositor wants bottom-to-top, so sort descending. The sort is
    // stable: equal orders keep their relative input order.
    let mut ordered = expanded.clone();
    ordered.sort_by(|a, b| b.order.cmp(&a.order));

    // Pass 7: first occurrence of each path wins.
    let mut seen_paths: IndexSet<&PathBuf> = IndexSet::new();
    let mut stack: Vec<LayerIdentity> = Vec::new();
    for layer in &ordered {
        if seen_paths.insert(&layer.path) {
            stack.push(layer.clone());
        }
    }
    let dedup_diff = diff_stage("deduped", &expanded, &stack);

    if stack.is_empty() {
        return Err(ResolveError::EmptyStack {
            tag: request.tag().to_string(),
        });
    }

    // Pass 8: diagnostics.
    let unknown_attribs: Vec<String> = requested
        .iter()
        .filter(|attr| !seen_attribs.contains(attr.as_str()))
        .cloned()
        .collect();
    let final_attribs: IndexSet<&str> = stack
        .iter()
        .flat_map(|layer| layer.attribs.iter().map(String::as_str))
        .collect();
    let unresolved_attribs: Vec<String> = requested
        .iter()
        .filter(|attr| !final_attribs.contains(attr.as_str()))
        .cloned()
        .collect();
    for attr in &unknown_attribs {
        debug!(tag = request.tag(), attr = %attr, "requested attribute never seen on tag");
    }

    Ok(Resolution {
        layers: stack,
        report: ResolutionReport {
            unknown_attribs,
            unresolved_attribs,
            stages: vec![conflict_diff, leaf_diff, expanded_diff, dedup_diff],
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::parse_path;
    use std::path::Path;

    fn layer(name: &str) -> LayerIdentity {
        parse_path(Path::new(name)).unwrap()
    }

    fn orders(resolution: &Resolution) -> Vec<u32> {
        resolution.layers.iter().map(|l| l.order).collect()
    }

    #[test]
    fn smile_scenario_excludes_frown_and_pulls_wildcard() {
        let pool = vec![
            layer("hero :: pose_stand :: smile__1.png"),
            layer("hero :: pose_stand :: frown__2.png"),
            layer("hero :: pose_stand :: all__0.png"),
        ];
        let request = ResolveRequest::new("hero", ["smile"]);

        let resolution = resolve(&request, &pool).unwrap();
        let leaves: Vec<_> = resolution.layers.iter().map(|l| l.leaf.as_str()).collect();
        assert_eq!(leaves, vec!["smile", "all"]);
        assert_eq!(orders(&resolution), vec![1, 0]);
    }

    #[test]
    fn wildcard_covers_attribute_group_of_kept_layer() {
        let pool = vec![
            layer("char :: pose :: all__0.png"),
            layer("char :: pose :: stand__1.png"),
        ];
        let request = ResolveRequest::new("char", ["stand"]);

        let resolution = resolve(&request, &pool).unwrap();
        let leaves: Vec<_> = resolution.layers.iter().map(|l| l.leaf.as_str()).collect();
        assert!(leaves.contains(&"stand"));
        assert!(leaves.contains(&"all"));
    }

    #[test]
    fn shared_leaf_with_overlapping_ancestry_is_ambiguous() {
        let pool = vec![
            layer("cat :: body :: red__1.png"),
            layer("cat :: fur :: red__2.png"),
        ];
        let request = ResolveRequest::new("cat", ["body", "fur", "red"]);

        let err = resolve(&request, &pool).unwrap_err();
        match err {
            ResolveError::Ambiguous { groups, .. } => {
                assert_eq!(groups.len(), 1);
                assert_eq!(groups[0].leaf, "red");
                assert_eq!(groups[0].layers.len(), 2);
            }
            other => panic!("expected Ambiguous, got {other}"),
        }
    }

    #[test]
    fn strict_retest_resolves_shared_leaf_to_one_survivor() {
        let pool = vec![
            layer("cat :: body :: red__1.png"),
            layer("cat :: fur :: red__2.png"),
        ];
        let request = ResolveRequest::new("cat", ["body", "red"]);

        let resolution = resolve(&request, &pool).unwrap();
        assert_eq!(resolution.layers.len(), 1);
        assert_eq!(resolution.layers[0].attribs, vec!["body", "red"]);
    }

    #[test]
    fn empty_pool_is_empty_stack_error() {
        let request = ResolveRequest::new("ghost", ["smile"]);
        assert!(matches!(
            resolve(&request, &[]),
            Err(ResolveError::EmptyStack { .. })
        ));
    }

    #[test]
    fn all_candidates_filtered_is_empty_stack_error() {
        let pool = vec![layer("hero :: pose :: smile__1.png")];
        let request = ResolveRequest::new("hero", ["hat"]);
        assert!(matches!(
            resolve(&request, &pool),
            Err(ResolveError::EmptyStack { .. })
        ));
    }

    #[test]
    fn output_order_is_non_increasing_and_deduplicated() {
        let pool = vec![
            layer("hero :: pose :: stand__3.png"),
            layer("hero :: pose :: all__0.png"),
            layer("hero :: hat :: crown__2.png"),
        ];
        let request = ResolveRequest::new("hero", ["stand", "crown"]);

        let resolution = resolve(&request, &pool).unwrap();
        let ord = orders(&resolution);
        assert!(ord.windows(2).all(|w| w[0] >= w[1]));

        let mut paths = resolution.paths();
        let before = paths.len();
        paths.dedup();
        assert_eq!(paths.len(), before);
    }

    #[test]
    fn equal_orders_keep_input_order() {
        let pool = vec![
            layer("t :: a :: x__5.png"),
            layer("t :: b :: y__5.png"),
        ];
        let request = ResolveRequest::new("t", ["x", "y"]);

        let resolution = resolve(&request, &pool).unwrap();
        let leaves: Vec<_> = resolution.layers.iter().map(|l| l.leaf.as_str()).collect();
        assert_eq!(leaves, vec!["x", "y"]);
    }

    #[test]
    fn unknown_attribute_is_reported_not_fatal() {
        let pool = vec![layer("hero :: pose :: smile__1.png")];
        let request = ResolveRequest::new("hero", ["smile", "unicorn"]);

        let resolution = resolve(&request, &pool).unwrap();
        assert_eq!(resolution.report.unknown_attribs, vec!["unicorn"]);
        assert_eq!(resolution.report.unresolved_attribs, vec!["unicorn"]);
        assert_eq!(resolution.layers.len(), 1);
    }

    #[test]
    fn request_normalizes_and_dedups_attribs() {
        let request = ResolveRequest::new("Hero", ["Pose  Stand", "pose_stand", "SMILE"]);
        assert_eq!(request.tag(), "hero");
        assert_eq!(request.attribs(), ["pose_stand", "smile"]);
    }
}
