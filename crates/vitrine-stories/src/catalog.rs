//! Story catalog: scan a components tree and describe every story in it.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::metadata::{extract_metadata, MetadataError};
use crate::slug::{capitalize, derive_slug};
use crate::story::{Slug, SourceKind, StoryDescriptor, StorySource};

/// Options controlling which files are picked up by a scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Story file kinds to include (`<name>.story.<ext>`)
    pub kinds: Vec<SourceKind>,

    /// Follow symbolic links while walking
    pub follow_links: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            kinds: SourceKind::ALL.to_vec(),
            follow_links: true,
        }
    }
}

impl ScanOptions {
    /// Options matching the given extensions. Unknown extensions are ignored.
    pub fn with_extensions<S: AsRef<str>>(extensions: &[S]) -> Self {
        let kinds = extensions
            .iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .filter_map(|e| SourceKind::from_extension(&e))
            .collect();

        Self {
            kinds,
            ..Default::default()
        }
    }
}

/// Errors that abort building a catalog.
#[derive(Debug, thiserror::Error)]
pub enum StoryError {
    #[error("Failed to scan stories directory {root}: {source}")]
    Scan {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read story {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: MetadataError,
    },

    #[error("Duplicate story slug '{slug}': {first} and {second}")]
    DuplicateSlug {
        slug: Slug,
        first: PathBuf,
        second: PathBuf,
    },
}

/// The ordered set of stories found by one scan.
///
/// Descriptors and sources are index-aligned and in scan order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    root: PathBuf,
    stories: Vec<StoryDescriptor>,
    sources: Vec<StorySource>,
}

impl Catalog {
    /// Scan root this catalog was built from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn stories(&self) -> &[StoryDescriptor] {
        &self.stories
    }

    pub fn sources(&self) -> &[StorySource] {
        &self.sources
    }

    /// Descriptors paired with their source files.
    pub fn iter(&self) -> impl Iterator<Item = (&StoryDescriptor, &StorySource)> {
        self.stories.iter().zip(self.sources.iter())
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    /// Look up a story by slug.
    pub fn get(&self, slug: &str) -> Option<&StoryDescriptor> {
        self.stories.iter().find(|s| s.slug.as_str() == slug)
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.get(slug).is_some()
    }
}

/// Build the story catalog for `root`.
///
/// Story files are read and their metadata extracted in parallel; the catalog
/// is returned only once every file has been processed, in walk order.
pub fn build_catalog(root: &Path, options: &ScanOptions) -> Result<Catalog, StoryError> {
    build_catalog_with(root, options, |_, _, _| ()).map(|(catalog, _)| catalog)
}

/// Build the catalog and, in the same pass, run `visit` on every story's
/// descriptor and raw source.
///
/// The visitor results are returned index-aligned with the catalog.
pub fn build_catalog_with<T, F>(
    root: &Path,
    options: &ScanOptions,
    visit: F,
) -> Result<(Catalog, Vec<T>), StoryError>
where
    T: Send,
    F: Fn(&StoryDescriptor, &StorySource, &str) -> T + Sync,
{
    let sources = discover(root, options)?;

    let described = sources
        .par_iter()
        .map(|source| {
            let raw = read_source(source)?;
            let descriptor = describe(source, &raw)?;
            let visited = visit(&descriptor, source, &raw);
            Ok::<_, StoryError>((descriptor, visited))
        })
        .collect::<Result<Vec<_>, StoryError>>()?;

    let (stories, visited): (Vec<_>, Vec<_>) = described.into_iter().unzip();

    tracing::debug!("Found {} stories in {}", stories.len(), root.display());

    let catalog = Catalog {
        root: root.to_path_buf(),
        stories,
        sources,
    };

    Ok((catalog, visited))
}

/// Walk `root` and collect every story file, rejecting duplicate slugs.
fn discover(root: &Path, options: &ScanOptions) -> Result<Vec<StorySource>, StoryError> {
    let metadata = fs::metadata(root).map_err(|source| StoryError::Scan {
        root: root.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(StoryError::Scan {
            root: root.to_path_buf(),
            source: std::io::Error::other("not a directory"),
        });
    }

    let mut sources = Vec::new();
    let mut seen: HashMap<Slug, PathBuf> = HashMap::new();

    for entry in WalkDir::new(root)
        .follow_links(options.follow_links)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| StoryError::Scan {
            root: root.to_path_buf(),
            source: e.into(),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some((slug, kind)) = derive_slug(root, path, &options.kinds) else {
            continue;
        };

        if let Some(first) = seen.get(&slug) {
            return Err(StoryError::DuplicateSlug {
                slug,
                first: first.clone(),
                second: path.to_path_buf(),
            });
        }
        seen.insert(slug.clone(), path.to_path_buf());

        sources.push(StorySource {
            slug,
            path: path.to_path_buf(),
            kind,
        });
    }

    Ok(sources)
}

fn read_source(source: &StorySource) -> Result<String, StoryError> {
    fs::read_to_string(&source.path).map_err(|e| StoryError::Read {
        path: source.path.clone(),
        source: e,
    })
}

/// Turn one story file's source into a descriptor.
fn describe(source: &StorySource, raw: &str) -> Result<StoryDescriptor, StoryError> {
    let metadata = extract_metadata(raw).map_err(|e| StoryError::Malformed {
        path: source.path.clone(),
        source: e,
    })?;

    let title = metadata.title.unwrap_or_else(|| {
        tracing::debug!("{}: no title declared, using slug", source.path.display());
        capitalize(source.slug.as_str())
    });

    Ok(StoryDescriptor {
        title,
        group: metadata.group,
        slug: source.slug.clone(),
    })
}
