//! Permutation Generator - Every Combination, One Pick Per Category
//!
//! The conflict-free sibling of the resolution engine: instead of
//! resolving one request, emit the full Cartesian product across
//! categories for exhaustive composite generation. No conflict detection
//! applies; one pick per category is consistent by construction.

use indexmap::IndexMap;

use crate::names::LayerIdentity;

/// Which segment groups layers into categories. The hierarchy depth is a
/// configuration choice, not positional magic: today the grouping key is
/// the tag segment (index 0).
pub const CATEGORY_SEGMENT: usize = 0;

/// The category key of one layer.
pub fn category(layer: &LayerIdentity) -> &str {
    &layer.segments[CATEGORY_SEGMENT]
}

/// Emit every combination that selects exactly one layer per category,
/// in category-then-encounter order.
///
/// Zero categories yield exactly one empty combination, not zero
/// combinations.
pub fn permute(pool: &[LayerIdentity]) -> Vec<Vec<LayerIdentity>> {
    let mut by_category: IndexMap<&str, Vec<&LayerIdentity>> = IndexMap::new();
    for layer in pool {
        by_category.entry(category(layer)).or_default().push(layer);
    }

    // Fold each category into the accumulated product. Starting from the
    // single empty combination makes the zero-category case explicit.
    let mut combos: Vec<Vec<LayerIdentity>> = vec![Vec::new()];
    for members in by_category.values() {
        let mut next = Vec::with_capacity(combos.len() * members.len());
        for combo in &combos {
            for member in members {
                let mut extended = combo.clone();
                extended.push((*member).clone());
                next.push(extended);
            }
        }
        combos = next;
    }
    combos
}
