//! Static gallery generator for vitrine.
//!
//! Renders every story route to its own page next to an index, a not-found
//! page and a route manifest.

pub mod assets;
pub mod builder;
pub mod templates;

pub use assets::AssetPipeline;
pub use builder::{BuildConfig, BuildError, BuildResult, StaticBuilder};
pub use templates::{build_navigation, Gallery, NavGroup, NavLink, Pane, TemplateEngine};
