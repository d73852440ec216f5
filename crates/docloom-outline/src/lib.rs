//! Outline data model: a document's ordered sections with ordered points.
//!
//! This crate is pure data plus validation; it performs no I/O. The outline
//! is the intermediate artifact between a topic and a generated document: the
//! service drafts it, the user edits it, and the confirm sequence submits the
//! normalized form back.
//!
//! Normalization trims every title and point and drops points that are empty
//! after trimming. It deliberately does NOT drop sections that end up with no
//! points: an empty section is a validation error the user must resolve, not
//! something to fix silently.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use docloom_utils::error::{OutlineError, ValidationError};

/// Title given to sections created through [`Outline::add_section`].
pub const SECTION_PLACEHOLDER_TITLE: &str = "新章节";

/// Text given to points created through [`Section::add_point`].
pub const POINT_PLACEHOLDER: &str = "在此输入要点";

/// Generated body text keyed by section title.
///
/// Section title is the content identity the generation service uses, so the
/// map key mirrors that. `BTreeMap` keeps iteration deterministic.
pub type ContentMap = BTreeMap<String, String>;

/// Kind of document the workflow produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// Slide deck (`.pptx`).
    Ppt,
    /// Text document (`.docx`).
    Word,
}

impl DocumentType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ppt => "ppt",
            Self::Word => "word",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ppt" => Ok(Self::Ppt),
            "word" => Ok(Self::Word),
            other => Err(format!(
                "unsupported document type '{other}' (expected 'ppt' or 'word')"
            )),
        }
    }
}

/// One section of an outline: a title and its ordered points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    #[serde(default)]
    pub content: Vec<String>,
}

impl Section {
    /// Create a section with the given title and no points.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: Vec::new(),
        }
    }

    /// Create a section with the given title and points.
    #[must_use]
    pub fn with_points<S: Into<String>>(title: impl Into<String>, points: Vec<S>) -> Self {
        Self {
            title: title.into(),
            content: points.into_iter().map(Into::into).collect(),
        }
    }

    /// Create the placeholder section the edit UI offers for "add section".
    #[must_use]
    pub fn placeholder() -> Self {
        Self::with_points(SECTION_PLACEHOLDER_TITLE, vec![POINT_PLACEHOLDER])
    }

    /// Append a placeholder point. Never fails.
    pub fn add_point(&mut self) -> &mut String {
        self.content.push(POINT_PLACEHOLDER.to_string());
        // Just pushed, so the last element exists.
        self.content.last_mut().unwrap()
    }

    /// Remove the point at `index`, shifting later points down by one.
    ///
    /// # Errors
    ///
    /// Returns `OutlineError::IndexOutOfRange` if `index` is not a valid
    /// position.
    pub fn remove_point(&mut self, index: usize) -> Result<String, OutlineError> {
        if index >= self.content.len() {
            return Err(OutlineError::IndexOutOfRange {
                index,
                len: self.content.len(),
            });
        }
        Ok(self.content.remove(index))
    }

    /// Trimmed copy: title trimmed, points trimmed, empty points dropped.
    ///
    /// A section whose points all trim to empty keeps an empty point list;
    /// validation rejects it rather than normalization hiding it.
    #[must_use]
    pub fn normalized(&self) -> Section {
        Section {
            title: self.title.trim().to_string(),
            content: self
                .content
                .iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }
}

/// Ordered sequence of sections. Order is significant and preserved across
/// edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Outline(Vec<Section>);

impl Outline {
    /// Empty outline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a placeholder section and return a handle to it. Never fails.
    pub fn add_section(&mut self) -> &mut Section {
        self.0.push(Section::placeholder());
        // Just pushed, so the last element exists.
        self.0.last_mut().unwrap()
    }

    /// Append an existing section.
    pub fn push(&mut self, section: Section) {
        self.0.push(section);
    }

    /// Remove the section at `index`, shifting later sections down by one.
    ///
    /// # Errors
    ///
    /// Returns `OutlineError::IndexOutOfRange` if `index` is not a valid
    /// position.
    pub fn remove_section(&mut self, index: usize) -> Result<Section, OutlineError> {
        if index >= self.0.len() {
            return Err(OutlineError::IndexOutOfRange {
                index,
                len: self.0.len(),
            });
        }
        Ok(self.0.remove(index))
    }

    /// Mutable access to the section at `index`.
    ///
    /// # Errors
    ///
    /// Returns `OutlineError::IndexOutOfRange` if `index` is not a valid
    /// position.
    pub fn section_mut(&mut self, index: usize) -> Result<&mut Section, OutlineError> {
        let len = self.0.len();
        self.0
            .get_mut(index)
            .ok_or(OutlineError::IndexOutOfRange { index, len })
    }

    /// Normalized copy of the whole outline. Idempotent.
    #[must_use]
    pub fn normalized(&self) -> Outline {
        Outline(self.0.iter().map(Section::normalized).collect())
    }

    /// Check that a (normalized) outline is fit to submit: at least one
    /// section, every section titled, every section with at least one point.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found, in section order.
    pub fn validate_for_submission(&self) -> Result<(), ValidationError> {
        if self.0.is_empty() {
            return Err(ValidationError::EmptyOutline);
        }
        for (index, section) in self.0.iter().enumerate() {
            if section.title.trim().is_empty() {
                return Err(ValidationError::UntitledSection { index });
            }
            if section.content.is_empty() {
                return Err(ValidationError::EmptySection {
                    index,
                    title: section.title.clone(),
                });
            }
        }
        Ok(())
    }
}

impl From<Vec<Section>> for Outline {
    fn from(sections: Vec<Section>) -> Self {
        Self(sections)
    }
}

impl IntoIterator for Outline {
    type Item = Section;
    type IntoIter = std::vec::IntoIter<Section>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Outline {
    type Item = &'a Section;
    type IntoIter = std::slice::Iter<'a, Section>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
