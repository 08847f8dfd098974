//! Configuration file (vitrine.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use vitrine_server::DevServerConfig;
use vitrine_static::BuildConfig;
use vitrine_stories::ScanOptions;

/// Configuration file structure.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub stories: StoriesConfig,
    #[serde(default)]
    pub build: BuildSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize)]
pub struct StoriesConfig {
    #[serde(default = "default_stories_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for StoriesConfig {
    fn default() -> Self {
        Self {
            dir: default_stories_dir(),
            extensions: default_extensions(),
            prefix: default_prefix(),
            title: default_title(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BuildSettings {
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default = "default_minify")]
    pub minify: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            output: default_output(),
            minify: default_minify(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

fn default_stories_dir() -> PathBuf {
    PathBuf::from("components")
}
fn default_extensions() -> Vec<String> {
    ["tsx", "jsx", "ts", "js"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_prefix() -> String {
    "/_/dev".to_string()
}
fn default_title() -> String {
    "Stories".to_string()
}
fn default_output() -> PathBuf {
    PathBuf::from("dist")
}
fn default_minify() -> bool {
    true
}
fn default_port() -> u16 {
    7777
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}

impl Config {
    /// Load configuration from `path` if it exists.
    /// Returns an error if the file exists but is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No {} found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions::with_extensions(&self.stories.extensions)
    }

    /// Static build settings, with command line overrides applied.
    pub fn build_config(&self, output: Option<PathBuf>, minify: Option<bool>) -> BuildConfig {
        BuildConfig {
            stories_dir: self.stories.dir.clone(),
            output_dir: output.unwrap_or_else(|| self.build.output.clone()),
            prefix: self.stories.prefix.clone(),
            title: self.stories.title.clone(),
            minify: minify.unwrap_or(self.build.minify),
            extensions: self.stories.extensions.clone(),
        }
    }

    /// Dev server settings, with command line overrides applied.
    pub fn server_config(&self, port: Option<u16>, open: bool) -> DevServerConfig {
        DevServerConfig {
            stories_dir: self.stories.dir.clone(),
            extensions: self.stories.extensions.clone(),
            prefix: self.stories.prefix.clone(),
            title: self.stories.title.clone(),
            port: port.unwrap_or(self.server.port),
            host: self.server.host.clone(),
            open,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_uses_defaults() {
        let temp = tempdir().unwrap();

        let config = Config::load(&temp.path().join("vitrine.toml")).unwrap();

        assert_eq!(config.stories.dir, PathBuf::from("components"));
        assert_eq!(config.stories.prefix, "/_/dev");
        assert_eq!(config.stories.extensions, vec!["tsx", "jsx", "ts", "js"]);
        assert_eq!(config.build.output, PathBuf::from("dist"));
        assert!(config.build.minify);
        assert_eq!(config.server.port, 7777);
    }

    #[test]
    fn partial_sections_keep_field_defaults() {
        let config = Config::parse(
            r#"
[stories]
dir = "src/ui"
extensions = ["tsx"]

[server]
port = 9000
"#,
        )
        .unwrap();

        assert_eq!(config.stories.dir, PathBuf::from("src/ui"));
        assert_eq!(config.stories.title, "Stories");
        assert_eq!(config.scan_options().kinds.len(), 1);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(config.build.minify);
    }

    #[test]
    fn flags_override_file_values() {
        let config = Config::parse("[build]\nminify = true\noutput = \"public\"").unwrap();

        let build = config.build_config(None, Some(false));
        assert_eq!(build.output_dir, PathBuf::from("public"));
        assert!(!build.minify);

        let build = config.build_config(Some(PathBuf::from("out")), None);
        assert_eq!(build.output_dir, PathBuf::from("out"));
        assert!(build.minify);

        let server = config.server_config(Some(8080), false);
        assert_eq!(server.port, 8080);
        assert!(!server.open);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("vitrine.toml");
        fs::write(&path, "[stories\ndir = ").unwrap();

        assert!(Config::load(&path).is_err());
    }
}
