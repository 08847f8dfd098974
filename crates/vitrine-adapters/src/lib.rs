//! Preview adapters for story modules.
//!
//! Locates the default export of a story module, parses the JSX it returns
//! and renders it to static HTML. Components referenced by the markup become
//! custom elements so the preview shows structure without a JS runtime.

pub mod generator;
pub mod inline;
pub mod react;
pub mod registry;
pub mod traits;

pub use generator::{custom_element_name, generate_html, GeneratedHtml};
pub use inline::{parse_jsx, JsxElement, JsxNode, PropValue};
pub use react::{DefaultExport, ReactAdapter};
pub use registry::{StoryComponent, StoryRegistry};
pub use traits::{PreviewAdapter, PreviewError, RenderContext, RenderedPreview};
