//! Story descriptors and the types they are built from.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Path-derived identifier of a story, e.g. `widgets/button`.
///
/// Always `/`-separated, regardless of the host platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Wrap an already-normalized slug.
    pub fn new(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments of the slug.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Slug {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One discovered story as shown in the navigation pane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryDescriptor {
    /// Display title, never empty
    pub title: String,

    /// Grouping label; `None` means ungrouped
    pub group: Option<String>,

    /// Route identifier
    pub slug: Slug,
}

/// Source language of a story file, taken from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Tsx,
    Jsx,
    Ts,
    Js,
}

impl SourceKind {
    /// Every kind, in the order extensions are tried.
    pub const ALL: [SourceKind; 4] = [Self::Tsx, Self::Jsx, Self::Ts, Self::Js];

    /// Parse a kind from a file extension (without the dot).
    ///
    /// Matching is case-sensitive so that [`module_path`](crate::slug::module_path)
    /// reproduces the file name exactly.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "tsx" => Some(Self::Tsx),
            "jsx" => Some(Self::Jsx),
            "ts" => Some(Self::Ts),
            "js" => Some(Self::Js),
            _ => None,
        }
    }

    /// File extension for this kind (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Tsx => "tsx",
            Self::Jsx => "jsx",
            Self::Ts => "ts",
            Self::Js => "js",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A story file matched by the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorySource {
    pub slug: Slug,

    /// Full path to the story file
    pub path: PathBuf,

    pub kind: SourceKind,
}

impl StorySource {
    pub fn path(&self) -> &Path {
        &self.path
    }
}
