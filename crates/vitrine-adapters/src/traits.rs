//! Trait definitions for preview adapters.

use vitrine_stories::SourceKind;

/// Context for rendering a story preview.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Prefix for custom elements standing in for components,
    /// e.g. `story` turns `<DatePicker>` into `<story-date-picker>`.
    pub element_prefix: String,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            element_prefix: "story".to_string(),
        }
    }
}

/// Static preview of a story's default export.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPreview {
    /// Static HTML markup
    pub html: String,

    /// Name of the default export, if it has one
    pub export_name: Option<String>,

    /// Components referenced by the markup, in first-use order
    pub components: Vec<String>,
}

/// Errors that can occur while rendering a preview.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PreviewError {
    #[error("Story has no default export")]
    MissingDefaultExport,

    #[error("Default export {0} does not return JSX markup")]
    NoMarkup(String),

    #[error("JSX parse error at offset {offset}: {message}")]
    Jsx { offset: usize, message: String },

    #[error("No preview adapter for .{0} stories")]
    Unsupported(SourceKind),
}

/// Trait for framework-specific preview adapters.
pub trait PreviewAdapter: Send + Sync {
    /// Framework identifier (e.g., "react")
    fn name(&self) -> &'static str;

    /// Story kinds this adapter handles
    fn kinds(&self) -> &[SourceKind];

    /// Render the default export of a story module to static HTML.
    ///
    /// # Arguments
    /// * `source` - The source code of the story module
    /// * `ctx` - Render context
    fn render(&self, source: &str, ctx: &RenderContext) -> Result<RenderedPreview, PreviewError>;
}
