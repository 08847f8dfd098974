//! Route enumeration and resolution.

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::story::{Slug, StoryDescriptor};

/// A pre-declared route: `{ "story": "<slug>" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteParam {
    pub story: Slug,
}

/// Every valid story route, in catalog order.
///
/// Paths outside this set are not found; there is no dynamic fallback.
pub fn enumerate_routes(catalog: &Catalog) -> Vec<RouteParam> {
    catalog
        .stories()
        .iter()
        .map(|story| RouteParam {
            story: story.slug.clone(),
        })
        .collect()
}

/// Outcome of resolving a requested slug.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a, T> {
    Found(&'a T),
    NotFound(Slug),
}

impl<'a, T> Resolution<'a, T> {
    pub fn from_option(slug: &str, found: Option<&'a T>) -> Self {
        match found {
            Some(item) => Self::Found(item),
            None => Self::NotFound(Slug::from(slug)),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn found(&self) -> Option<&'a T> {
        match self {
            Self::Found(item) => Some(item),
            Self::NotFound(_) => None,
        }
    }
}

impl Catalog {
    /// Resolve a requested slug against the catalog.
    pub fn resolve(&self, slug: &str) -> Resolution<'_, StoryDescriptor> {
        Resolution::from_option(slug, self.get(slug))
    }
}

fn normalize_prefix(prefix: &str) -> &str {
    prefix.trim_matches('/')
}

/// URL path of a story: `/<prefix>/<slug>`.
///
/// Each slug segment is percent-encoded, so file names containing `?`, `#`
/// or spaces still produce a path that routes back to the same slug.
pub fn route_path(prefix: &str, slug: &Slug) -> String {
    let encoded = slug
        .segments()
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");

    let prefix = normalize_prefix(prefix);
    if prefix.is_empty() {
        format!("/{}", encoded)
    } else {
        format!("/{}/{}", prefix, encoded)
    }
}

/// Extract the slug from a request path under `prefix`.
///
/// `path` is the raw, percent-encoded request path. Returns `None` for paths
/// outside the prefix, invalid escapes, empty slugs, and slugs with `.` or
/// `..` segments.
pub fn slug_from_route(prefix: &str, path: &str) -> Option<Slug> {
    let path = path.trim_start_matches('/');
    let prefix = normalize_prefix(prefix);

    let rest = if prefix.is_empty() {
        path
    } else {
        path.strip_prefix(prefix)?.strip_prefix('/')?
    };

    slug_from_param(&urlencoding::decode(rest).ok()?)
}

/// Normalize a raw `story` route parameter into a slug.
pub fn slug_from_param(param: &str) -> Option<Slug> {
    let segments: Vec<&str> = param.split('/').filter(|s| !s.is_empty()).collect();

    if segments.is_empty() || segments.iter().any(|s| *s == "." || *s == "..") {
        return None;
    }

    Some(Slug::new(segments.join("/")))
}
