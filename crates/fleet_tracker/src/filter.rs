use std::collections::BTreeSet;
use std::fmt;

use crate::models::{MobileUnit, Route};

pub const ALL_TAGS_LABEL: &str = "All";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TagSelector {
    #[default]
    All,
    Tag(String),
}

impl TagSelector {
    /// `"All"` (any case) or an empty string selects everything; anything
    /// else is an exact tag.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL_TAGS_LABEL) {
            TagSelector::All
        } else {
            TagSelector::Tag(trimmed.to_string())
        }
    }

    pub fn admits(&self, route: &Route) -> bool {
        match self {
            TagSelector::All => true,
            TagSelector::Tag(tag) => route.has_tag(tag),
        }
    }
}

impl fmt::Display for TagSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagSelector::All => f.write_str(ALL_TAGS_LABEL),
            TagSelector::Tag(tag) => f.write_str(tag),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct VisibleSet<'a> {
    pub units: Vec<&'a MobileUnit>,
    pub routes: Vec<&'a Route>,
}

/// Routes whose tags admit `selector`, and the units riding them. Input
/// order is preserved.
pub fn filter_visible<'a>(
    units: &'a [MobileUnit],
    routes: &'a [Route],
    selector: &TagSelector,
) -> VisibleSet<'a> {
    if *selector == TagSelector::All {
        return VisibleSet {
            units: units.iter().collect(),
            routes: routes.iter().collect(),
        };
    }
    let visible_routes: Vec<&Route> = routes.iter().filter(|route| selector.admits(route)).collect();
    let visible_ids: BTreeSet<&str> = visible_routes.iter().map(|route| route.id.as_str()).collect();
    VisibleSet {
        units: units
            .iter()
            .filter(|unit| visible_ids.contains(unit.route_id.as_str()))
            .collect(),
        routes: visible_routes,
    }
}

/// Sorted, de-duplicated tags across `routes`, for a selector list.
pub fn available_tags(routes: &[Route]) -> Vec<String> {
    routes
        .iter()
        .flat_map(|route| route.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
