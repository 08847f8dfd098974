//! Story discovery for the vitrine component gallery.
//!
//! Scans a components tree for `*.story.<ext>` files, extracts the `title` and
//! `group` declarations from their source text, derives a slug from each path,
//! and exposes the resulting catalog to routing.

pub mod catalog;
pub mod metadata;
pub mod routes;
pub mod slug;
pub mod story;
pub mod supersede;

pub use catalog::{build_catalog, build_catalog_with, Catalog, ScanOptions, StoryError};
pub use metadata::{extract_metadata, Malformed, MetadataError, MetadataField, StoryMetadata};
pub use routes::{
    enumerate_routes, route_path, slug_from_param, slug_from_route, Resolution, RouteParam,
};
pub use slug::{capitalize, derive_slug, module_path};
pub use story::{Slug, SourceKind, StoryDescriptor, StorySource};
pub use supersede::{Supersede, Ticket};
