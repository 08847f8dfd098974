//! Template engine for rendering gallery pages.

use minijinja::Environment;
use serde::Serialize;

use vitrine_adapters::StoryComponent;
use vitrine_stories::{route_path, Catalog, Resolution, Slug};

/// Heading for stories that declare no group.
pub const UNGROUPED_LABEL: &str = "Stories";

/// A link in the navigation pane.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavLink {
    pub title: String,
    pub slug: Slug,
    /// URL path of the story page
    pub path: String,
    /// Whether this is the story on display
    pub active: bool,
}

/// A titled group of navigation links.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavGroup {
    pub name: String,
    pub links: Vec<NavLink>,
}

/// Build the navigation pane from a catalog.
///
/// Ungrouped stories come first under [`UNGROUPED_LABEL`], then each group
/// in order of first appearance. Within a group stories keep catalog order.
/// A group declared with the ungrouped label shares that heading.
pub fn build_navigation(
    catalog: &Catalog,
    prefix: &str,
    active: Option<&Slug>,
) -> Vec<NavGroup> {
    let mut ungrouped = Vec::new();
    let mut groups: Vec<NavGroup> = Vec::new();

    for story in catalog.stories() {
        let link = NavLink {
            title: story.title.clone(),
            slug: story.slug.clone(),
            path: route_path(prefix, &story.slug),
            active: active == Some(&story.slug),
        };

        match story.group.as_deref() {
            None | Some(UNGROUPED_LABEL) => ungrouped.push(link),
            Some(name) => match groups.iter_mut().find(|g| g.name == name) {
                Some(group) => group.links.push(link),
                None => groups.push(NavGroup {
                    name: name.to_string(),
                    links: vec![link],
                }),
            },
        }
    }

    if !ungrouped.is_empty() {
        groups.insert(
            0,
            NavGroup {
                name: UNGROUPED_LABEL.to_string(),
                links: ungrouped,
            },
        );
    }

    groups
}

/// What the content pane shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Pane {
    /// Nothing selected yet
    Empty,

    /// A rendered story
    Story {
        slug: Slug,
        title: String,
        group: Option<String>,
        source: String,
        html: String,
    },

    /// A story whose preview could not be rendered
    Broken {
        slug: Slug,
        title: String,
        source: String,
        message: String,
    },

    /// No story registered under the requested slug
    NotFound { slug: Option<Slug> },
}

impl Pane {
    pub fn from_resolution(resolution: Resolution<'_, StoryComponent>) -> Self {
        match resolution {
            Resolution::Found(story) => Self::from_component(story),
            Resolution::NotFound(slug) => Pane::NotFound { slug: Some(slug) },
        }
    }

    pub fn from_component(story: &StoryComponent) -> Self {
        let source = story.source_path.display().to_string();

        match &story.preview {
            Ok(preview) => Pane::Story {
                slug: story.slug.clone(),
                title: story.title.clone(),
                group: story.group.clone(),
                source,
                html: preview.html.clone(),
            },
            Err(e) => Pane::Broken {
                slug: story.slug.clone(),
                title: story.title.clone(),
                source,
                message: e.to_string(),
            },
        }
    }

    /// Page title for this pane, if it has one.
    pub fn title(&self) -> Option<String> {
        match self {
            Pane::Empty => None,
            Pane::Story { title, .. } | Pane::Broken { title, .. } => Some(title.clone()),
            Pane::NotFound { .. } => Some("Not found".to_string()),
        }
    }
}

/// Context for rendering a gallery page.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub site_title: String,
    pub page_title: Option<String>,
    pub prefix: String,
    pub nav: Vec<NavGroup>,
    pub pane: Pane,
    /// Include the live reload client
    pub live_reload: bool,
}

/// Template engine using minijinja.
#[derive(Clone)]
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a new template engine with the gallery templates.
    pub fn new() -> Self {
        let mut env = Environment::new();

        env.add_template("base.html", BASE_TEMPLATE)
            .expect("Failed to add base template");
        env.add_template("gallery.html", GALLERY_TEMPLATE)
            .expect("Failed to add gallery template");
        env.add_template("nav.html", NAV_TEMPLATE)
            .expect("Failed to add nav template");
        env.add_template("pane.html", PANE_TEMPLATE)
            .expect("Failed to add pane template");

        Self { env }
    }

    /// Render a full gallery page.
    pub fn render_page(&self, page: &Page) -> Result<String, minijinja::Error> {
        self.env.get_template("gallery.html")?.render(page)
    }

    /// Render only the content pane.
    pub fn render_pane(&self, pane: &Pane) -> Result<String, minijinja::Error> {
        self.env
            .get_template("pane.html")?
            .render(minijinja::context! { pane => pane })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders gallery pages for one catalog layout.
#[derive(Clone)]
pub struct Gallery {
    templates: TemplateEngine,
    site_title: String,
    prefix: String,
    live_reload: bool,
}

impl Gallery {
    pub fn new(site_title: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            templates: TemplateEngine::new(),
            site_title: site_title.into(),
            prefix: prefix.into(),
            live_reload: false,
        }
    }

    /// Include the live reload client in rendered pages.
    pub fn with_live_reload(mut self, enabled: bool) -> Self {
        self.live_reload = enabled;
        self
    }

    /// Gallery with an empty content pane.
    pub fn index(&self, catalog: &Catalog) -> Result<String, minijinja::Error> {
        self.render(catalog, None, Pane::Empty)
    }

    /// Gallery showing a resolved story, or the not-found state.
    pub fn story(
        &self,
        catalog: &Catalog,
        resolution: Resolution<'_, StoryComponent>,
    ) -> Result<String, minijinja::Error> {
        let active = resolution.found().map(|story| story.slug.clone());
        self.render(catalog, active.as_ref(), Pane::from_resolution(resolution))
    }

    /// Gallery showing the not-found state for an unknown address.
    pub fn not_found(&self, catalog: &Catalog) -> Result<String, minijinja::Error> {
        self.render(catalog, None, Pane::NotFound { slug: None })
    }

    /// Content pane alone for a resolved story.
    pub fn pane(
        &self,
        resolution: Resolution<'_, StoryComponent>,
    ) -> Result<String, minijinja::Error> {
        self.templates.render_pane(&Pane::from_resolution(resolution))
    }

    fn render(
        &self,
        catalog: &Catalog,
        active: Option<&Slug>,
        pane: Pane,
    ) -> Result<String, minijinja::Error> {
        let page = Page {
            site_title: self.site_title.clone(),
            page_title: pane.title(),
            prefix: self.prefix.clone(),
            nav: build_navigation(catalog, &self.prefix, active),
            pane,
            live_reload: self.live_reload,
        };

        self.templates.render_page(&page)
    }
}

const BASE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{% if page_title %}{{ page_title }} - {% endif %}{{ site_title }}</title>
  <link rel="stylesheet" href="/assets/main.css">
</head>
<body>
  <div class="layout">
    <nav class="sidebar" data-prefix="{{ prefix }}">
      {% include "nav.html" %}
    </nav>
    <main class="main" id="story-pane">
      {% block content %}{% endblock %}
    </main>
  </div>
  <script src="/assets/main.js"></script>
  {% if live_reload %}<script src="/__hmr.js"></script>{% endif %}
</body>
</html>"##;

const GALLERY_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block content %}
{% include "pane.html" %}
{% endblock %}"##;

const NAV_TEMPLATE: &str = r##"<div class="nav-header">
  <a href="/" class="nav-logo">{{ site_title }}</a>
</div>
{% for group in nav %}
<section class="nav-group">
  <h2 class="nav-group-title">{{ group.name }}</h2>
  <ul class="nav-list">
  {% for link in group.links %}
    <li class="nav-item{% if link.active %} active{% endif %}">
      <a href="{{ link.path }}" data-slug="{{ link.slug }}"{% if link.active %} aria-current="page"{% endif %}>{{ link.title }}</a>
    </li>
  {% endfor %}
  </ul>
</section>
{% else %}
<p class="nav-empty">No stories found.</p>
{% endfor %}"##;

const PANE_TEMPLATE: &str = r##"{% if pane.kind == "story" %}
<article class="story" data-story="{{ pane.slug }}">
  <header class="story-header">
    {% if pane.group %}<p class="story-group">{{ pane.group }}</p>{% endif %}
    <h1 class="story-title">{{ pane.title }}</h1>
    <code class="story-source">{{ pane.source }}</code>
  </header>
  <div class="story-canvas">{{ pane.html | safe }}</div>
</article>
{% elif pane.kind == "broken" %}
<article class="story" data-story="{{ pane.slug }}">
  <header class="story-header">
    <h1 class="story-title">{{ pane.title }}</h1>
    <code class="story-source">{{ pane.source }}</code>
  </header>
  <div class="story-error" role="alert">
    <strong>Preview failed</strong>
    <pre>{{ pane.message }}</pre>
  </div>
</article>
{% elif pane.kind == "not_found" %}
<div class="story-missing" role="alert">
  <h1>Story not found</h1>
  {% if pane.slug %}<p>No story is registered under <code>{{ pane.slug }}</code>.</p>
  {% else %}<p>No story matches this address.</p>{% endif %}
</div>
{% else %}
<div class="story-empty">
  <p>Select a story to preview it.</p>
</div>
{% endif %}"##;
