//! Initialize a story gallery in a project.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Run the init command in the current directory.
pub async fn run(yes: bool) -> Result<()> {
    tracing::info!("Initializing vitrine...");

    init_in(Path::new("."), yes)?;

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'vitrine dev' to start the development server.");

    Ok(())
}

/// Write the default config and an example story under `root`.
///
/// Existing files are kept unless `yes` is set.
fn init_in(root: &Path, yes: bool) -> Result<()> {
    let components_dir = root.join("components");
    if !components_dir.exists() {
        fs::create_dir_all(&components_dir).context("Failed to create components directory")?;
    }

    write_default(&root.join("vitrine.toml"), DEFAULT_CONFIG, yes)?;
    write_default(&components_dir.join("button.tsx"), DEFAULT_BUTTON, yes)?;
    write_default(&components_dir.join("button.story.tsx"), DEFAULT_BUTTON_STORY, yes)?;

    Ok(())
}

fn write_default(path: &Path, contents: &str, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        tracing::warn!("{} already exists. Use --yes to overwrite.", path.display());
        return Ok(());
    }

    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Created {}", path.display());
    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# vitrine configuration

[stories]
# Directory scanned for *.story.* files
dir = "components"

# Story file extensions
extensions = ["tsx", "jsx", "ts", "js"]

# URL prefix for story pages
prefix = "/_/dev"

# Gallery title
title = "Stories"

[build]
# Output directory for the static gallery
output = "dist"

# Minify CSS
minify = true

[server]
port = 7777
host = "127.0.0.1"
"#;

const DEFAULT_BUTTON: &str = r#"import { ReactNode } from "react";

function Button({ children }: { children: ReactNode }) {
  return <button className="bg-red-500 px-3 py-2">{children}</button>;
}

export default Button;
"#;

const DEFAULT_BUTTON_STORY: &str = r#"import Button from "./button";

export const title = "Button";

export default function ButtonStory() {
  return <Button>Click me</Button>;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::config::Config;
    use tempfile::tempdir;
    use vitrine_stories::build_catalog;

    #[test]
    fn writes_config_and_example_story() {
        let temp = tempdir().unwrap();

        init_in(temp.path(), false).unwrap();

        let config = Config::load(&temp.path().join("vitrine.toml")).unwrap();
        assert_eq!(config.stories.dir, Path::new("components"));

        let catalog = build_catalog(&temp.path().join("components"), &config.scan_options()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.stories()[0].title, "Button");
        assert_eq!(catalog.stories()[0].slug.as_str(), "button");
    }

    #[test]
    fn keeps_existing_files_without_yes() {
        let temp = tempdir().unwrap();
        let config = temp.path().join("vitrine.toml");
        fs::write(&config, "[stories]\ndir = \"ui\"\n").unwrap();

        init_in(temp.path(), false).unwrap();
        assert_eq!(fs::read_to_string(&config).unwrap(), "[stories]\ndir = \"ui\"\n");

        init_in(temp.path(), true).unwrap();
        assert_eq!(fs::read_to_string(&config).unwrap(), DEFAULT_CONFIG);
    }
}
