//! Static gallery build command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use vitrine_static::StaticBuilder;

use super::config::Config;

/// Run the build command.
pub async fn run(config_path: &Path, output: Option<PathBuf>, minify: Option<bool>) -> Result<()> {
    tracing::info!("Building static gallery...");

    let config = Config::load(config_path)?.build_config(output, minify);
    let stories_dir = config.stories_dir.clone();

    let result = StaticBuilder::new(config)
        .build()
        .await
        .with_context(|| format!("Failed to build stories from {}", stories_dir.display()))?;

    tracing::info!(
        "Built {} stories in {}ms",
        result.stories,
        result.duration_ms
    );

    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}
