//! Story registry: slug → renderable story component.
//!
//! Built in the same pass as the story catalog, so resolving a slug at
//! render time is a plain map lookup with nothing left to load.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use vitrine_stories::{
    build_catalog_with, Catalog, Resolution, ScanOptions, Slug, SourceKind, StoryDescriptor,
    StoryError, StorySource,
};

use crate::react::ReactAdapter;
use crate::traits::{PreviewAdapter, PreviewError, RenderContext, RenderedPreview};

/// A story ready to be displayed.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryComponent {
    pub slug: Slug,

    pub title: String,

    pub group: Option<String>,

    /// Story file the component was rendered from
    pub source_path: PathBuf,

    pub kind: SourceKind,

    /// Rendered default export, or why it could not be rendered
    pub preview: Result<RenderedPreview, PreviewError>,
}

/// A registry of story components, in catalog order.
#[derive(Debug, Default)]
pub struct StoryRegistry {
    components: Vec<StoryComponent>,

    /// Index into `components` by slug
    by_slug: HashMap<Slug, usize>,
}

impl StoryRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `root` and build the catalog and registry together.
    pub fn scan(
        root: &Path,
        options: &ScanOptions,
        ctx: &RenderContext,
    ) -> Result<(Catalog, StoryRegistry), StoryError> {
        let adapters: Vec<Box<dyn PreviewAdapter>> = vec![Box::new(ReactAdapter::new())];
        Self::scan_with(root, options, ctx, &adapters)
    }

    /// Like [`scan`](Self::scan), rendering previews with the first adapter
    /// in `adapters` that handles each story's kind.
    pub fn scan_with(
        root: &Path,
        options: &ScanOptions,
        ctx: &RenderContext,
        adapters: &[Box<dyn PreviewAdapter>],
    ) -> Result<(Catalog, StoryRegistry), StoryError> {
        let (catalog, components) = build_catalog_with(root, options, |story, source, raw| {
            let preview = render_with(adapters, source.kind, raw, ctx);
            if let Err(e) = &preview {
                tracing::warn!("Cannot preview {}: {}", source.path.display(), e);
            }
            component(story, source, preview)
        })?;

        tracing::info!(
            "Loaded {} stories from {}",
            components.len(),
            root.display()
        );

        let mut registry = StoryRegistry::new();
        for component in components {
            registry.insert(component);
        }

        Ok((catalog, registry))
    }

    fn insert(&mut self, component: StoryComponent) {
        self.by_slug
            .insert(component.slug.clone(), self.components.len());
        self.components.push(component);
    }

    /// Look up a story by slug.
    pub fn get(&self, slug: &str) -> Option<&StoryComponent> {
        self.by_slug
            .get(&Slug::from(slug))
            .map(|&i| &self.components[i])
    }

    /// Check if a story exists.
    pub fn contains(&self, slug: &str) -> bool {
        self.get(slug).is_some()
    }

    /// Resolve a requested slug to the component to render.
    pub fn resolve(&self, slug: &str) -> Resolution<'_, StoryComponent> {
        Resolution::from_option(slug, self.get(slug))
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoryComponent> {
        self.components.iter()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

fn render_with(
    adapters: &[Box<dyn PreviewAdapter>],
    kind: SourceKind,
    raw: &str,
    ctx: &RenderContext,
) -> Result<RenderedPreview, PreviewError> {
    let adapter = adapters
        .iter()
        .find(|a| a.kinds().contains(&kind))
        .ok_or(PreviewError::Unsupported(kind))?;

    tracing::trace!("Rendering .{} story with {} adapter", kind, adapter.name());
    adapter.render(raw, ctx)
}

fn component(
    story: &StoryDescriptor,
    source: &StorySource,
    preview: Result<RenderedPreview, PreviewError>,
) -> StoryComponent {
    StoryComponent {
        slug: story.slug.clone(),
        title: story.title.clone(),
        group: story.group.clone(),
        source_path: source.path.clone(),
        kind: source.kind,
        preview,
    }
}
