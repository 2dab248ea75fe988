//! Question-group reconstruction from an unordered widget collection.

use std::collections::{BTreeMap, HashMap};

use crate::dom::ChoiceWidget;

/// Partition widgets into question groups, as indices into the snapshot.
///
/// Two passes, concatenated: container-based first (the host's per-question
/// wrapper), then name-attribute-based as a fallback for markup that does
/// carry a form name. The results are deliberately not deduplicated — a
/// widget matched by both passes appears in two groups, and selecting the
/// same best member twice is harmless for mutually-exclusive controls.
pub fn group_widgets(widgets: &[ChoiceWidget]) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = Vec::new();

    let mut by_container: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, w) in widgets.iter().enumerate() {
        if let Some(c) = w.container {
            by_container.entry(c).or_default().push(i);
        }
    }
    groups.extend(by_container.into_values());

    // Fallback pass, preserving first-seen name order.
    let mut name_order: Vec<&str> = Vec::new();
    let mut by_name: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, w) in widgets.iter().enumerate() {
        let Some(name) = w.name.as_deref() else { continue };
        if name.is_empty() {
            continue;
        }
        if !by_name.contains_key(name) {
            name_order.push(name);
        }
        by_name.entry(name).or_default().push(i);
    }
    for name in name_order {
        if let Some(members) = by_name.remove(name) {
            groups.push(members);
        }
    }

    groups
}

/// Whether any member of the group is checked.
pub fn is_checked(group: &[usize], widgets: &[ChoiceWidget]) -> bool {
    group.iter().any(|&i| widgets[i].checked)
}
