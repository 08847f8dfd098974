//! List discovered stories.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use vitrine_stories::{build_catalog, route_path, Catalog};

use super::config::Config;

#[derive(Debug, Serialize)]
struct ListedStory<'a> {
    slug: &'a str,
    title: &'a str,
    group: Option<&'a str>,
    route: String,
    source: String,
}

/// Run the list command.
pub async fn run(config_path: &Path, json: bool) -> Result<()> {
    let config = Config::load(config_path)?;
    let root = config.stories.dir.clone();
    let options = config.scan_options();

    let catalog = tokio::task::spawn_blocking(move || build_catalog(&root, &options))
        .await?
        .with_context(|| format!("Failed to scan {}", config.stories.dir.display()))?;

    let output = if json {
        render_json(&catalog, &config.stories.prefix)?
    } else {
        render_table(&catalog)
    };

    println!("{}", output);

    Ok(())
}

fn listed<'a>(catalog: &'a Catalog, prefix: &str) -> Vec<ListedStory<'a>> {
    catalog
        .iter()
        .map(|(story, source)| ListedStory {
            slug: story.slug.as_str(),
            title: &story.title,
            group: story.group.as_deref(),
            route: route_path(prefix, &story.slug),
            source: source.path.display().to_string(),
        })
        .collect()
}

fn render_json(catalog: &Catalog, prefix: &str) -> Result<String> {
    Ok(serde_json::to_string_pretty(&listed(catalog, prefix))?)
}

fn render_table(catalog: &Catalog) -> String {
    if catalog.is_empty() {
        return format!("No stories found in {}", catalog.root().display());
    }

    let rows: Vec<[&str; 3]> = catalog
        .stories()
        .iter()
        .map(|s| [s.slug.as_str(), s.title.as_str(), s.group.as_deref().unwrap_or("-")])
        .collect();

    let header = ["SLUG", "TITLE", "GROUP"];
    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    std::iter::once(header)
        .chain(rows)
        .map(|row| {
            let line = format!(
                "{:w0$}  {:w1$}  {}",
                row[0],
                row[1],
                row[2],
                w0 = widths[0],
                w1 = widths[1]
            );
            line.trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;
    use vitrine_stories::ScanOptions;

    fn catalog(root: &Path) -> Catalog {
        fs::create_dir_all(root.join("widgets")).unwrap();
        fs::write(
            root.join("widgets/button.story.tsx"),
            "export const title = \"Primary Button\";\nexport const group = \"Widgets\";",
        )
        .unwrap();
        fs::write(root.join("card.story.tsx"), "export default () => <div />;").unwrap();

        build_catalog(root, &ScanOptions::default()).unwrap()
    }

    #[test]
    fn renders_aligned_table() {
        let temp = tempdir().unwrap();
        let table = render_table(&catalog(temp.path()));

        assert_eq!(
            table,
            [
                "SLUG            TITLE           GROUP",
                "card            Card            -",
                "widgets/button  Primary Button  Widgets",
            ]
            .join("\n")
        );
    }

    #[test]
    fn renders_json_with_routes() {
        let temp = tempdir().unwrap();
        let json = render_json(&catalog(temp.path()), "/_/dev").unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[1]["slug"], "widgets/button");
        assert_eq!(value[1]["group"], "Widgets");
        assert_eq!(value[1]["route"], "/_/dev/widgets/button");
        assert_eq!(value[0]["group"], serde_json::Value::Null);
    }

    #[test]
    fn reports_empty_tree() {
        let temp = tempdir().unwrap();
        let catalog = build_catalog(temp.path(), &ScanOptions::default()).unwrap();

        assert!(render_table(&catalog).starts_with("No stories found"));
    }
}
