//! Asset pipeline for the gallery stylesheet and script.

/// Asset pipeline utilities.
pub struct AssetPipeline;

impl AssetPipeline {
    /// Generate the main CSS file.
    pub fn generate_css() -> String {
        DEFAULT_CSS.to_string()
    }

    /// Generate the main JavaScript file.
    pub fn generate_js() -> String {
        DEFAULT_JS.to_string()
    }

    /// Main CSS, minified when requested.
    ///
    /// Falls back to the unminified stylesheet if lightningcss rejects it.
    pub fn css(minify: bool) -> String {
        let css = Self::generate_css();
        if !minify {
            return css;
        }

        match Self::minify_css(&css) {
            Ok(minified) => minified,
            Err(e) => {
                tracing::warn!("Serving unminified CSS: {}", e);
                css
            }
        }
    }

    /// Minify CSS using lightningcss.
    pub fn minify_css(css: &str) -> Result<String, String> {
        use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

        let stylesheet = StyleSheet::parse(css, ParserOptions::default())
            .map_err(|e| format!("CSS parse error: {}", e))?;

        let minified = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                ..Default::default()
            })
            .map_err(|e| format!("CSS minify error: {}", e))?;

        Ok(minified.code)
    }
}

const DEFAULT_CSS: &str = r#"/* vitrine gallery */

:root {
  --nav-width: 260px;
  --background: #ffffff;
  --foreground: #1a1a1a;
  --muted: #f5f5f4;
  --muted-foreground: #71717a;
  --border: #e4e4e7;
  --primary: #2563eb;
  --primary-foreground: #ffffff;
  --destructive: #dc2626;
  --radius: 0.5rem;
}

@media (prefers-color-scheme: dark) {
  :root {
    --background: #0a0a0a;
    --foreground: #fafafa;
    --muted: #18181b;
    --muted-foreground: #a1a1aa;
    --border: #27272a;
    --primary: #60a5fa;
    --primary-foreground: #0a0a0a;
    --destructive: #f87171;
  }
}

* {
  box-sizing: border-box;
  margin: 0;
  padding: 0;
}

body {
  font-family: system-ui, -apple-system, sans-serif;
  background: var(--background);
  color: var(--foreground);
  line-height: 1.6;
}

.layout {
  display: grid;
  grid-template-columns: var(--nav-width) 1fr;
  min-height: 100vh;
}

/* Navigation pane */
.sidebar {
  background: var(--muted);
  border-right: 1px solid var(--border);
  padding: 1.5rem 1rem;
  position: sticky;
  top: 0;
  height: 100vh;
  overflow-y: auto;
}

.nav-header {
  margin-bottom: 1.5rem;
}

.nav-logo {
  font-weight: 700;
  font-size: 1.125rem;
  color: var(--foreground);
  text-decoration: none;
}

.nav-group + .nav-group {
  margin-top: 1.25rem;
}

.nav-group-title {
  font-size: 0.75rem;
  font-weight: 600;
  letter-spacing: 0.05em;
  text-transform: uppercase;
  color: var(--muted-foreground);
  margin-bottom: 0.5rem;
}

.nav-list {
  list-style: none;
}

.nav-item a {
  display: block;
  padding: 0.25rem 0.75rem;
  border-radius: var(--radius);
  color: var(--foreground);
  text-decoration: none;
  font-size: 0.875rem;
}

.nav-item a:hover {
  background: var(--border);
}

.nav-item.active a {
  background: var(--primary);
  color: var(--primary-foreground);
}

.nav-empty {
  color: var(--muted-foreground);
  font-size: 0.875rem;
}

/* Content pane */
.main {
  padding: 2rem 3rem;
  min-width: 0;
}

.story-header {
  margin-bottom: 1.5rem;
}

.story-group {
  font-size: 0.75rem;
  text-transform: uppercase;
  color: var(--muted-foreground);
}

.story-title {
  font-size: 1.75rem;
  font-weight: 700;
}

.story-source {
  font-family: ui-monospace, monospace;
  font-size: 0.75rem;
  color: var(--muted-foreground);
}

.story-canvas {
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 2rem;
  background: var(--background);
}

.story-error,
.story-missing {
  border: 1px solid var(--destructive);
  border-radius: var(--radius);
  padding: 1.5rem;
  color: var(--destructive);
}

.story-error pre {
  margin-top: 0.75rem;
  white-space: pre-wrap;
  font-family: ui-monospace, monospace;
  font-size: 0.875rem;
}

.story-missing h1 {
  font-size: 1.25rem;
  margin-bottom: 0.5rem;
}

.story-empty {
  display: flex;
  align-items: center;
  justify-content: center;
  min-height: 50vh;
  color: var(--muted-foreground);
}

@media (max-width: 768px) {
  .layout {
    grid-template-columns: 1fr;
  }

  .sidebar {
    position: static;
    height: auto;
    border-right: none;
    border-bottom: 1px solid var(--border);
  }

  .main {
    padding: 1.5rem;
  }
}
"#;

const DEFAULT_JS: &str = r#"// vitrine gallery runtime
(function() {
  'use strict';

  // Mark the link for the current page
  window.__vitrineMarkActive = function(path) {
    document.querySelectorAll('.nav-item').forEach(item => {
      const link = item.querySelector('a');
      const active = link && link.getAttribute('href') === path;
      item.classList.toggle('active', !!active);
      if (link) {
        if (active) link.setAttribute('aria-current', 'page');
        else link.removeAttribute('aria-current');
      }
    });
  };

  window.__vitrineMarkActive(window.location.pathname.replace(/\/+$/, '') || '/');
})();
"#;
