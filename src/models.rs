use std::fmt::{Display, Formatter, Result as FmtResult};

/// Opaque identifier of one archive work, as it appears in `/works/<id>` links.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkId(String);

impl WorkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl Display for WorkId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}
impl From<&str> for WorkId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
impl From<String> for WorkId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
impl AsRef<str> for WorkId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The six tag groups of a work's metadata block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagCategory {
    Rating,
    Category,
    Fandom,
    Relationship,
    Character,
    Freeform,
}
impl TagCategory {
    pub const ALL: [TagCategory; 6] = [
        TagCategory::Rating,
        TagCategory::Category,
        TagCategory::Fandom,
        TagCategory::Relationship,
        TagCategory::Character,
        TagCategory::Freeform,
    ];

    /// Class name of the `dd` element holding this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            TagCategory::Rating => "rating",
            TagCategory::Category => "category",
            TagCategory::Fandom => "fandom",
            TagCategory::Relationship => "relationship",
            TagCategory::Character => "character",
            TagCategory::Freeform => "freeform",
        }
    }
}
impl Display for TagCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Normalized tag texts, grouped by category and kept in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags {
    pub rating: Vec<String>,
    pub category: Vec<String>,
    pub fandom: Vec<String>,
    pub relationship: Vec<String>,
    pub character: Vec<String>,
    pub freeform: Vec<String>,
}
impl Tags {
    pub fn get(&self, category: TagCategory) -> &[String] {
        match category {
            TagCategory::Rating => &self.rating,
            TagCategory::Category => &self.category,
            TagCategory::Fandom => &self.fandom,
            TagCategory::Relationship => &self.relationship,
            TagCategory::Character => &self.character,
            TagCategory::Freeform => &self.freeform,
        }
    }

    pub(crate) fn get_mut(&mut self, category: TagCategory) -> &mut Vec<String> {
        match category {
            TagCategory::Rating => &mut self.rating,
            TagCategory::Category => &mut self.category,
            TagCategory::Fandom => &mut self.fandom,
            TagCategory::Relationship => &mut self.relationship,
            TagCategory::Character => &mut self.character,
            TagCategory::Freeform => &mut self.freeform,
        }
    }
}

/// A successfully scraped work. All text is ASCII-normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkRecord {
    pub id: WorkId,
    pub title: String,
    pub tags: Tags,
    /// Chapter paragraphs joined with a blank line.
    pub body: String,
}

/// A work that was denied or could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub id: WorkId,
    pub message: String,
}

/// Candidates found on one page of search results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    /// Work ids in page order, duplicates within the page included.
    pub candidates: Vec<WorkId>,
    /// The page had no result entries at all.
    pub is_empty: bool,
}
