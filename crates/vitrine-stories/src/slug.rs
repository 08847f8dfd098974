//! Path ↔ slug conversion.

use std::path::{Component, Path, PathBuf};

use crate::story::{Slug, SourceKind};

/// Infix marking a story file: `<name>.story.<ext>`.
pub const STORY_MARKER: &str = ".story";

/// Split a file name into its story stem and kind.
///
/// Returns `None` unless the name has the form `<stem>.story.<ext>` with a
/// non-empty stem and an extension in `kinds`.
pub fn split_story_name<'a>(
    file_name: &'a str,
    kinds: &[SourceKind],
) -> Option<(&'a str, SourceKind)> {
    let (rest, ext) = file_name.rsplit_once('.')?;
    let kind = SourceKind::from_extension(ext).filter(|k| kinds.contains(k))?;
    let stem = rest.strip_suffix(STORY_MARKER)?;

    if stem.is_empty() {
        return None;
    }

    Some((stem, kind))
}

/// Derive the slug of a story file relative to the scan root.
///
/// `components/widgets/button.story.tsx` under root `components` becomes
/// `widgets/button`. Returns `None` for files outside the root or files that
/// do not follow the story naming convention.
pub fn derive_slug(
    root: &Path,
    path: &Path,
    kinds: &[SourceKind],
) -> Option<(Slug, SourceKind)> {
    let relative = path.strip_prefix(root).ok()?;
    let file_name = relative.file_name()?.to_str()?;
    let (stem, kind) = split_story_name(file_name, kinds)?;

    let mut segments: Vec<String> = Vec::new();
    if let Some(parent) = relative.parent() {
        for component in parent.components() {
            match component {
                Component::Normal(part) => segments.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => return None,
            }
        }
    }
    segments.push(stem.to_string());

    Some((Slug::new(segments.join("/")), kind))
}

/// Location of the story module for `slug`: `<root>/<slug>.story.<ext>`.
pub fn module_path(root: &Path, slug: &Slug, kind: SourceKind) -> PathBuf {
    let mut path = root.to_path_buf();
    let mut segments = slug.segments().peekable();

    while let Some(segment) = segments.next() {
        if segments.peek().is_some() {
            path.push(segment);
        } else {
            path.push(format!("{}{}.{}", segment, STORY_MARKER, kind.extension()));
        }
    }

    path
}

/// Upper-case the first character and lower-case the rest.
///
/// Used for the fallback title: `misc/spinner` → `Misc/spinner`.
pub fn capitalize(s: &str) -> String {
    let lower = s.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ALL: &[SourceKind] = &SourceKind::ALL;

    #[test]
    fn splits_story_file_names() {
        assert_eq!(
            split_story_name("button.story.tsx", ALL),
            Some(("button", SourceKind::Tsx))
        );
        assert_eq!(
            split_story_name("date.picker.story.js", ALL),
            Some(("date.picker", SourceKind::Js))
        );
        assert_eq!(split_story_name("button.tsx", ALL), None);
        assert_eq!(split_story_name("button.stories.tsx", ALL), None);
        assert_eq!(split_story_name(".story.tsx", ALL), None);
        assert_eq!(split_story_name("button.story.mdx", ALL), None);
    }

    #[test]
    fn extension_case_must_match() {
        assert_eq!(split_story_name("button.story.TSX", ALL), None);
        assert!(derive_slug(
            Path::new("components"),
            Path::new("components/button.story.Jsx"),
            ALL
        )
        .is_none());
    }

    #[test]
    fn respects_allowed_kinds() {
        assert_eq!(split_story_name("button.story.jsx", &[SourceKind::Tsx]), None);
    }

    #[test]
    fn derives_nested_slug() {
        let root = Path::new("components");
        let path = Path::new("components/widgets/button.story.tsx");

        let (slug, kind) = derive_slug(root, path, ALL).unwrap();

        assert_eq!(slug.as_str(), "widgets/button");
        assert_eq!(kind, SourceKind::Tsx);
    }

    #[test]
    fn derives_top_level_slug() {
        let (slug, _) = derive_slug(
            Path::new("components"),
            Path::new("components/button.story.tsx"),
            ALL,
        )
        .unwrap();

        assert_eq!(slug.as_str(), "button");
    }

    #[test]
    fn rejects_paths_outside_root() {
        assert!(derive_slug(
            Path::new("components"),
            Path::new("pages/button.story.tsx"),
            ALL
        )
        .is_none());
    }

    #[test]
    fn module_path_round_trips() {
        let root = Path::new("components");
        for path in [
            "components/widgets/button.story.tsx",
            "components/misc/deep/spinner.story.jsx",
            "components/card.story.ts",
        ] {
            let path = Path::new(path);
            let (slug, kind) = derive_slug(root, path, ALL).unwrap();
            assert_eq!(module_path(root, &slug, kind), path);
        }
    }

    #[test]
    fn capitalizes_like_a_title() {
        assert_eq!(capitalize("misc/spinner"), "Misc/spinner");
        assert_eq!(capitalize("widgets/ButtonGroup"), "Widgets/buttongroup");
        assert_eq!(capitalize(""), "");
    }
}
