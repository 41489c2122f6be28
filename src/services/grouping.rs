//! Category grouping.
//!
//! Partitions listed items into ordered groups keyed by category. The
//! derivation is pure and rebuilt from the merged projection on every read.

use std::cmp::Ordering;

use crate::domain::{Category, CategoryId, EmailItem};

use super::item_store::ItemView;

/// Anything that can be placed into a category group.
pub trait Groupable {
    /// Effective category of the item.
    fn category_id(&self) -> Option<&CategoryId>;

    /// Ranking score within a group.
    fn confidence(&self) -> Option<f64>;
}

impl Groupable for EmailItem {
    fn category_id(&self) -> Option<&CategoryId> {
        self.category_id.as_ref()
    }

    fn confidence(&self) -> Option<f64> {
        self.confidence
    }
}

impl Groupable for ItemView {
    fn category_id(&self) -> Option<&CategoryId> {
        self.item.category_id.as_ref()
    }

    fn confidence(&self) -> Option<f64> {
        self.item.confidence
    }
}

/// What a group is keyed by.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupKey {
    /// A known category.
    Known(Category),
    /// A category ID that matches nothing in the catalog.
    Unrecognized(CategoryId),
    /// Items with no category at all.
    Uncategorized,
}

impl GroupKey {
    /// Display label for the group header.
    pub fn label(&self) -> String {
        match self {
            Self::Known(category) => category.label.clone(),
            Self::Unrecognized(id) => format!("Category {}", id),
            Self::Uncategorized => "Uncategorized".to_string(),
        }
    }

    /// Category ID the group is keyed by, if any.
    pub fn category_id(&self) -> Option<&CategoryId> {
        match self {
            Self::Known(category) => Some(&category.id),
            Self::Unrecognized(id) => Some(id),
            Self::Uncategorized => None,
        }
    }

    fn matches(&self, category_id: Option<&CategoryId>) -> bool {
        self.category_id() == category_id
    }
}

/// One group of items sharing a category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup<T> {
    /// Group key.
    pub key: GroupKey,
    /// Members ordered by confidence, highest first.
    pub items: Vec<T>,
}

impl<T> CategoryGroup<T> {
    fn new(key: GroupKey) -> Self {
        Self {
            key,
            items: Vec::new(),
        }
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the group has no members.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Higher confidence first; a missing score sorts after any present one.
fn by_confidence_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Groups `items` by category.
///
/// Every category in `categories` gets a group, in the given order, even when
/// empty. Items whose category is not in `categories` get an ad-hoc group per
/// raw ID in order of first appearance, followed by an uncategorized group if
/// needed. No item is dropped. Within a group, ties keep input order.
pub fn group_by_category<T: Groupable>(
    categories: &[Category],
    items: impl IntoIterator<Item = T>,
) -> Vec<CategoryGroup<T>> {
    let mut groups: Vec<CategoryGroup<T>> = categories
        .iter()
        .cloned()
        .map(|category| CategoryGroup::new(GroupKey::Known(category)))
        .collect();
    let mut uncategorized = CategoryGroup::new(GroupKey::Uncategorized);

    for item in items {
        let Some(category_id) = item.category_id() else {
            uncategorized.items.push(item);
            continue;
        };
        match groups.iter().position(|g| g.key.matches(Some(category_id))) {
            Some(index) => groups[index].items.push(item),
            None => {
                let mut group = CategoryGroup::new(GroupKey::Unrecognized(category_id.clone()));
                group.items.push(item);
                groups.push(group);
            }
        }
    }

    if !uncategorized.is_empty() {
        groups.push(uncategorized);
    }
    for group in &mut groups {
        group
            .items
            .sort_by(|a, b| by_confidence_desc(a.confidence(), b.confidence()));
    }
    groups
}
