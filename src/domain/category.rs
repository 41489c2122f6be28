//! Category, bucket and folder domain types.
//!
//! Categories are the fine-grained classification labels; each belongs to a
//! coarse bucket (master category) that scopes which list a user is looking at.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{CategoryId, FolderId};

/// Coarse grouping of categories (e.g. "Work" vs "Other").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bucket(pub String);

impl Bucket {
    /// The bucket for work items.
    pub fn work() -> Self {
        Self::from("Work")
    }

    /// The bucket for everything that is not work.
    pub fn other() -> Self {
        Self::from("Other")
    }

    /// Returns true for the work bucket, compared case-insensitively.
    pub fn is_work(&self) -> bool {
        self.0.eq_ignore_ascii_case("work")
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Bucket {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A classification category. Read-only to this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier.
    pub id: CategoryId,
    /// Ordinal used for ranking groups and batch eligibility.
    pub number: u32,
    /// Display label.
    pub label: String,
    /// The bucket this category belongs to.
    pub master_category: Bucket,
    /// Display color (hex format, e.g. "#3498DB").
    #[serde(default)]
    pub color: Option<String>,
    /// Emoji or icon name.
    #[serde(default)]
    pub icon: Option<String>,
}

impl Category {
    /// Creates a category with no color or icon.
    pub fn new(
        id: impl Into<CategoryId>,
        number: u32,
        label: impl Into<String>,
        master_category: Bucket,
    ) -> Self {
        Self {
            id: id.into(),
            number,
            label: label.into(),
            master_category,
            color: None,
            icon: None,
        }
    }
}

/// A mail folder used as a routing target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    /// Unique identifier.
    pub id: FolderId,
    /// Display name.
    pub name: String,
}

/// Lookup table over every known category.
#[derive(Debug, Clone, Default)]
pub struct CategoryCatalog {
    categories: Vec<Category>,
}

impl CategoryCatalog {
    /// Builds a catalog, ordered by category number.
    pub fn new(mut categories: Vec<Category>) -> Self {
        categories.sort_by_key(|c| c.number);
        Self { categories }
    }

    /// Looks up a category by ID.
    pub fn get(&self, id: &CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| &c.id == id)
    }

    /// Returns the bucket a category belongs to, if the category is known.
    pub fn bucket_of(&self, id: &CategoryId) -> Option<&Bucket> {
        self.get(id).map(|c| &c.master_category)
    }

    /// Categories in one bucket, ordered by number.
    pub fn in_bucket<'a>(&'a self, bucket: &'a Bucket) -> impl Iterator<Item = &'a Category> + 'a {
        self.categories
            .iter()
            .filter(move |c| &c.master_category == bucket)
    }

    /// All categories, ordered by number.
    pub fn all(&self) -> &[Category] {
        &self.categories
    }

    /// Returns true if no categories are known.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
