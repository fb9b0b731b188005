//! Tool record shape and the resource-reference list it carries.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// A catalog entry for a physical device in the makerspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Store-assigned record id (`rec...`).
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Image URLs, in store order.
    #[serde(default)]
    pub images: Vec<String>,

    /// Manuals attached to the record, in store order.
    #[serde(default)]
    pub manual_attachments: Vec<Attachment>,

    /// Comma-joined provider file names for the uploaded manuals.
    #[serde(default)]
    pub gemini_resource_ids: Option<String>,
}

impl Tool {
    /// Parsed form of [`Tool::gemini_resource_ids`]; empty when absent.
    pub fn resource_refs(&self) -> ResourceRefs {
        self.gemini_resource_ids
            .as_deref()
            .map(ResourceRefs::parse)
            .unwrap_or_default()
    }
}

/// A file attached to a tool record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,

    #[serde(default)]
    pub filename: String,
}

impl Attachment {
    pub fn new(url: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            filename: filename.into(),
        }
    }
}

/// Ordered list of provider resource references.
///
/// Persisted as a comma-joined string without escaping, so a token may not
/// contain a comma and may not be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceRefs(Vec<String>);

impl ResourceRefs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a stored field value, trimming tokens and skipping empty ones.
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Append a reference. Returns `false` (and drops it) when the token
    /// would corrupt the joined representation.
    pub fn push(&mut self, token: impl Into<String>) -> bool {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() || trimmed.contains(',') {
            warn!("Dropping resource reference that cannot be stored: {:?}", token);
            return false;
        }
        self.0.push(trimmed.to_string());
        true
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// The stored field value.
    pub fn join(&self) -> String {
        self.0.join(",")
    }
}

impl fmt::Display for ResourceRefs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join())
    }
}

impl<S: Into<String>> FromIterator<S> for ResourceRefs {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut refs = Self::new();
        for token in iter {
            refs.push(token);
        }
        refs
    }
}
