//! Parent/child relationships between states, counties and tracts.
//!
//! Relationships are derived purely from identifier prefixes: a county's first two digits
//! name its state and a tract's first five name its county. Nothing here consults loaded
//! boundaries; whether the derived parent actually exists is a data-quality question
//! answered by [`find_orphans`].

use super::id::{BoundaryId, BoundaryLevel, MalformedIdentifier};
use serde::Serialize;
use std::collections::HashSet;

/// Whether `value` is a well-formed identifier at some level.
pub fn validate(value: &str) -> bool {
    BoundaryId::parse(value).is_ok()
}

/// Level implied by the identifier's width.
pub fn level_of(value: &str) -> Result<BoundaryLevel, MalformedIdentifier> {
    BoundaryId::parse(value).map(|id| id.level())
}

/// Immediate parent: tract to county, county to state. States have none.
pub fn parent(id: &BoundaryId) -> Option<BoundaryId> {
    id.level()
        .parent()
        .and_then(|level| id.truncate_to(level))
}

pub fn state_of(id: &BoundaryId) -> BoundaryId {
    id.truncate_to(BoundaryLevel::State)
        .unwrap_or_else(|| id.clone())
}

/// County containing `id`; `None` for state identifiers.
pub fn county_of(id: &BoundaryId) -> Option<BoundaryId> {
    id.truncate_to(BoundaryLevel::County)
}

/// Ancestors from the immediate parent up to the state.
pub fn ancestors(id: &BoundaryId) -> Vec<BoundaryId> {
    let mut chain = Vec::with_capacity(2);
    let mut current = parent(id);
    while let Some(next) = current {
        current = parent(&next);
        chain.push(next);
    }
    chain
}

pub fn is_ancestor_of(ancestor: &BoundaryId, descendant: &BoundaryId) -> bool {
    ancestor.level() < descendant.level() && descendant.as_str().starts_with(ancestor.as_str())
}

/// A boundary or dataset record pointing at a boundary that is not loaded.
///
/// For boundaries `missing` is the derived parent; for records it is the record's own
/// boundary id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanReference {
    pub child: BoundaryId,
    pub missing: BoundaryId,
    pub context: String,
}

/// Children whose derived parent is absent from `known_parents`.
///
/// Results are sorted by child id so reports are stable between runs.
pub fn find_orphans<'a, I>(
    children: I,
    known_parents: &HashSet<BoundaryId>,
    context: &str,
) -> Vec<OrphanReference>
where
    I: IntoIterator<Item = &'a BoundaryId>,
{
    let mut orphans: Vec<OrphanReference> = children
        .into_iter()
        .filter_map(|child| {
            let missing = parent(child)?;
            if known_parents.contains(&missing) {
                None
            } else {
                Some(OrphanReference {
                    child: child.clone(),
                    missing,
                    context: context.to_string(),
                })
            }
        })
        .collect();
    orphans.sort_by(|a, b| a.child.cmp(&b.child));
    orphans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> BoundaryId {
        BoundaryId::parse(value).expect("valid id")
    }

    #[test]
    fn parent_truncates_one_level() {
        assert_eq!(parent(&id("54039000100")), Some(id("54039")));
        assert_eq!(parent(&id("54039")), Some(id("54")));
        assert_eq!(parent(&id("54")), None);
    }

    #[test]
    fn validate_checks_width_and_digits() {
        assert!(validate("54"));
        assert!(validate("54039"));
        assert!(validate("54039000100"));
        assert!(!validate("5403900010"));
        assert!(!validate("54-39"));
        assert!(!validate(""));
    }

    #[test]
    fn level_of_reports_malformed_identifiers() {
        assert_eq!(level_of("54039").unwrap(), BoundaryLevel::County);
        assert!(matches!(
            level_of("540390"),
            Err(MalformedIdentifier::Length { length: 6, .. })
        ));
    }

    #[test]
    fn ancestors_walk_to_state() {
        assert_eq!(ancestors(&id("54039000100")), vec![id("54039"), id("54")]);
        assert!(ancestors(&id("54")).is_empty());
        assert_eq!(state_of(&id("54039000100")), id("54"));
        assert_eq!(county_of(&id("54")), None);
    }

    #[test]
    fn ancestor_check_requires_prefix_and_coarser_level() {
        assert!(is_ancestor_of(&id("54"), &id("54039000100")));
        assert!(is_ancestor_of(&id("54039"), &id("54039000100")));
        assert!(!is_ancestor_of(&id("54039"), &id("54039")));
        assert!(!is_ancestor_of(&id("54041"), &id("54039000100")));
    }

    #[test]
    fn find_orphans_reports_missing_parents_in_order() {
        let children = vec![id("54041000200"), id("54039000100"), id("54039000200")];
        let parents: HashSet<BoundaryId> = [id("54039")].into_iter().collect();

        let orphans = find_orphans(&children, &parents, "tract");

        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].child, id("54041000200"));
        assert_eq!(orphans[0].missing, id("54041"));
        assert_eq!(orphans[0].context, "tract");
    }
}
