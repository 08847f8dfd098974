//! Static gallery builder.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;

use vitrine_adapters::{RenderContext, StoryRegistry};
use vitrine_stories::{enumerate_routes, Catalog, ScanOptions, Slug, StoryError};

use crate::assets::AssetPipeline;
use crate::templates::Gallery;

/// Configuration for building a static gallery.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Root of the story tree
    pub stories_dir: PathBuf,

    /// Output directory
    pub output_dir: PathBuf,

    /// URL prefix for story pages
    pub prefix: String,

    /// Gallery title
    pub title: String,

    /// Minify CSS output
    pub minify: bool,

    /// Story file extensions to scan for
    pub extensions: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            stories_dir: PathBuf::from("components"),
            output_dir: PathBuf::from("dist"),
            prefix: "/_/dev".to_string(),
            title: "Stories".to_string(),
            minify: true,
            extensions: ["tsx", "jsx", "ts", "js"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl BuildConfig {
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions::with_extensions(&self.extensions)
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of story pages generated
    pub stories: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Stories(#[from] StoryError),

    #[error("Failed to render template: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Failed to serialize route manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Build task failed: {0}")]
    Join(String),
}

/// Static gallery builder.
#[derive(Clone)]
pub struct StaticBuilder {
    config: BuildConfig,
    gallery: Gallery,
}

impl StaticBuilder {
    /// Create a new static builder.
    pub fn new(config: BuildConfig) -> Self {
        let gallery = Gallery::new(config.title.clone(), config.prefix.clone());
        Self { config, gallery }
    }

    /// Build the static gallery on the blocking pool.
    pub async fn build(&self) -> Result<BuildResult, BuildError> {
        let builder = self.clone();
        tokio::task::spawn_blocking(move || builder.build_blocking())
            .await
            .map_err(|e| BuildError::Join(e.to_string()))?
    }

    /// Build the static gallery on the current thread.
    pub fn build_blocking(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        let (catalog, registry) = StoryRegistry::scan(
            &self.config.stories_dir,
            &self.config.scan_options(),
            &RenderContext::default(),
        )?;

        create_dir(&self.config.output_dir)?;

        write_file(
            &self.config.output_dir.join("index.html"),
            self.gallery.index(&catalog)?,
        )?;

        let routes = enumerate_routes(&catalog);

        routes
            .par_iter()
            .map(|route| self.build_story(&catalog, &registry, &route.story))
            .collect::<Result<Vec<()>, BuildError>>()?;

        write_file(
            &self.config.output_dir.join("404.html"),
            self.gallery.not_found(&catalog)?,
        )?;

        write_file(
            &self.config.output_dir.join("routes.json"),
            serde_json::to_string_pretty(&routes)?,
        )?;

        self.generate_assets()?;

        let duration = start.elapsed();
        tracing::info!(
            "Built {} story pages in {}ms",
            routes.len(),
            duration.as_millis()
        );

        Ok(BuildResult {
            stories: routes.len(),
            duration_ms: duration.as_millis() as u64,
            output_dir: self.config.output_dir.clone(),
        })
    }

    /// Output file for a story page.
    ///
    /// Uses the decoded slug segments, which is what a static file server
    /// maps the percent-encoded route back to.
    pub fn page_path(&self, slug: &Slug) -> PathBuf {
        self.config
            .prefix
            .split('/')
            .chain(slug.segments())
            .filter(|s| !s.is_empty())
            .fold(self.config.output_dir.clone(), |path, segment| {
                path.join(segment)
            })
            .join("index.html")
    }

    fn build_story(
        &self,
        catalog: &Catalog,
        registry: &StoryRegistry,
        slug: &Slug,
    ) -> Result<(), BuildError> {
        let html = self
            .gallery
            .story(catalog, registry.resolve(slug.as_str()))?;

        let path = self.page_path(slug);
        if let Some(parent) = path.parent() {
            create_dir(parent)?;
        }

        write_file(&path, html)
    }

    /// Generate static assets.
    fn generate_assets(&self) -> Result<(), BuildError> {
        let assets_dir = self.config.output_dir.join("assets");
        create_dir(&assets_dir)?;

        write_file(
            &assets_dir.join("main.css"),
            AssetPipeline::css(self.config.minify),
        )?;
        write_file(&assets_dir.join("main.js"), AssetPipeline::generate_js())?;

        Ok(())
    }
}

fn create_dir(path: &Path) -> Result<(), BuildError> {
    fs::create_dir_all(path).map_err(|source| BuildError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, contents: String) -> Result<(), BuildError> {
    fs::write(path, contents).map_err(|source| BuildError::Write {
        path: path.to_path_buf(),
        source,
    })
}
