//! Extraction of story metadata from raw source text.
//!
//! Story files declare their metadata as exported string constants:
//!
//! ```text
//! export const title = "Primary Button";
//! export const group = 'Widgets';
//! ```
//!
//! The source is never executed or fully parsed. A declaration is recognised
//! by its keyword sequence at the start of a line and its value must be a
//! single quoted string literal:
//!
//! ```text
//! declaration := "export" "const" name [":" "string"] "=" literal ["as" "const"] [";"] [comment]
//! literal     := '"' { char | escape } '"' | "'" { char | escape } "'"
//! ```
//!
//! A missing declaration is not an error. A declaration that starts with the
//! keyword sequence but does not match the rest of the grammar is.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Metadata declared by a story file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryMetadata {
    /// Value of `export const title`, if declared
    pub title: Option<String>,

    /// Value of `export const group`, if declared
    pub group: Option<String>,
}

/// A metadata field recognised in story files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataField {
    Title,
    Group,
}

impl MetadataField {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "title" => Some(Self::Title),
            "group" => Some(Self::Group),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Group => "group",
        }
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A declaration that starts like metadata but is not well formed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: malformed `{field}` declaration: {reason}")]
pub struct MetadataError {
    pub field: MetadataField,

    /// 1-based line of the declaration
    pub line: usize,

    pub reason: Malformed,
}

/// Why a declaration was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Malformed {
    #[error("expected `=` after the constant name")]
    MissingAssignment,

    #[error("type annotation must be `string`, found `{0}`")]
    UnsupportedType(String),

    #[error("value is not a quoted string literal")]
    NotAString,

    #[error("string literal is not terminated on the same line")]
    Unterminated,

    #[error("unexpected content after the string literal: `{0}`")]
    TrailingContent(String),

    #[error("value must not be empty")]
    Empty,
}

static DECLARATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*export[ \t]+const[ \t]+(title|group)((?:[ \t:=;][^\r\n]*)?)\r?$")
        .expect("Invalid declaration regex")
});

/// Extract `title` and `group` declarations from story source.
///
/// The first well-formed declaration of each field wins.
pub fn extract_metadata(source: &str) -> Result<StoryMetadata, MetadataError> {
    let mut metadata = StoryMetadata::default();

    for caps in DECLARATION_RE.captures_iter(source) {
        let (Some(name), Some(rest)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let Some(field) = MetadataField::from_name(name.as_str()) else {
            continue;
        };
        let line = source[..name.start()].matches('\n').count() + 1;

        let value = parse_declaration_tail(rest.as_str())
            .map_err(|reason| MetadataError { field, line, reason })?;

        let slot = match field {
            MetadataField::Title => &mut metadata.title,
            MetadataField::Group => &mut metadata.group,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    Ok(metadata)
}

/// Parse everything after `export const <name>`.
fn parse_declaration_tail(tail: &str) -> Result<String, Malformed> {
    let mut rest = tail.trim_start();

    if let Some(annotated) = rest.strip_prefix(':') {
        let annotated = annotated.trim_start();
        let end = annotated
            .find(|c: char| c == '=' || c.is_whitespace())
            .unwrap_or(annotated.len());
        let ty = &annotated[..end];
        if ty != "string" {
            return Err(Malformed::UnsupportedType(ty.to_string()));
        }
        rest = annotated[end..].trim_start();
    }

    let rest = rest.strip_prefix('=').ok_or(Malformed::MissingAssignment)?;
    let (value, after) = parse_string_literal(rest.trim_start())?;

    let mut after = after.trim_start();
    if let Some(stripped) = after.strip_prefix("as") {
        let stripped = stripped.trim_start();
        if let Some(stripped) = stripped.strip_prefix("const") {
            after = stripped.trim_start();
        }
    }
    let after = after.strip_prefix(';').unwrap_or(after).trim();

    if !after.is_empty() && !after.starts_with("//") && !after.starts_with("/*") {
        return Err(Malformed::TrailingContent(after.to_string()));
    }

    if value.is_empty() {
        return Err(Malformed::Empty);
    }

    Ok(value)
}

/// Parse a single- or double-quoted literal at the start of `input`.
///
/// Returns the decoded value and the remaining input after the closing quote.
fn parse_string_literal(input: &str) -> Result<(String, &str), Malformed> {
    let mut chars = input.char_indices();
    let quote = match chars.next() {
        Some((_, q @ ('"' | '\''))) => q,
        _ => return Err(Malformed::NotAString),
    };

    let mut value = String::new();
    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, 'r')) => value.push('\r'),
                Some((_, other)) => value.push(other),
                None => return Err(Malformed::Unterminated),
            },
            c if c == quote => return Ok((value, &input[idx + c.len_utf8()..])),
            c => value.push(c),
        }
    }

    Err(Malformed::Unterminated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extracts_double_quoted_values() {
        let source = r#"
import Button from "./button";

export const title = "Primary Button";
export const group = "Widgets";

export default function ButtonStory() {
  return <Button>Click me</Button>;
}
"#;

        let metadata = extract_metadata(source).unwrap();

        assert_eq!(metadata.title.as_deref(), Some("Primary Button"));
        assert_eq!(metadata.group.as_deref(), Some("Widgets"));
    }

    #[test]
    fn extracts_single_quoted_values() {
        let metadata = extract_metadata("export const title = 'Spinner'").unwrap();

        assert_eq!(metadata.title.as_deref(), Some("Spinner"));
        assert_eq!(metadata.group, None);
    }

    #[test]
    fn keeps_other_quote_kind_inside_literal() {
        let metadata = extract_metadata(r#"export const title = "Don't panic";"#).unwrap();

        assert_eq!(metadata.title.as_deref(), Some("Don't panic"));
    }

    #[test]
    fn decodes_escapes() {
        let metadata = extract_metadata(r#"export const title = 'It\'s a \"card\"';"#).unwrap();

        assert_eq!(metadata.title.as_deref(), Some(r#"It's a "card""#));
    }

    #[test]
    fn accepts_string_annotation_and_as_const() {
        let source = "export const title: string = \"Card\";\nexport const group = 'Layout' as const;";

        let metadata = extract_metadata(source).unwrap();

        assert_eq!(metadata.title.as_deref(), Some("Card"));
        assert_eq!(metadata.group.as_deref(), Some("Layout"));
    }

    #[test]
    fn allows_trailing_comment() {
        let metadata = extract_metadata("export const group = \"Forms\"; // sidebar section").unwrap();

        assert_eq!(metadata.group.as_deref(), Some("Forms"));
    }

    #[test]
    fn missing_declarations_are_not_errors() {
        let metadata = extract_metadata("export default function Spinner() {}").unwrap();

        assert_eq!(metadata, StoryMetadata::default());
    }

    #[test]
    fn ignores_similarly_named_constants() {
        let source = "export const titleCase = (s) => s;\nexport const grouping = 3;";

        assert_eq!(extract_metadata(source).unwrap(), StoryMetadata::default());
    }

    #[test]
    fn ignores_constants_extending_the_name() {
        let source = "export const title$ = of('x');\nexport const group_ = 1;\nexport const title = 'Stream';";

        let metadata = extract_metadata(source).unwrap();

        assert_eq!(metadata.title.as_deref(), Some("Stream"));
        assert_eq!(metadata.group, None);
    }

    #[test]
    fn accepts_crlf_line_endings() {
        let source = "export const title = 'Card';\r\nexport const group = \"Layout\"; // nav\r\n";

        let metadata = extract_metadata(source).unwrap();

        assert_eq!(metadata.title.as_deref(), Some("Card"));
        assert_eq!(metadata.group.as_deref(), Some("Layout"));
    }

    #[test]
    fn ignores_commented_out_declarations() {
        let metadata = extract_metadata("// export const title = 'Old';").unwrap();

        assert_eq!(metadata.title, None);
    }

    #[test]
    fn first_declaration_wins() {
        let source = "export const title = \"First\";\nexport const title = \"Second\";";

        assert_eq!(extract_metadata(source).unwrap().title.as_deref(), Some("First"));
    }

    #[test]
    fn rejects_unterminated_literal() {
        let source = "\n\nexport const title = \"Primary Button;\n";

        let err = extract_metadata(source).unwrap_err();

        assert_eq!(err.field, MetadataField::Title);
        assert_eq!(err.line, 3);
        assert_eq!(err.reason, Malformed::Unterminated);
    }

    #[test]
    fn rejects_mismatched_quotes() {
        let err = extract_metadata("export const group = \"Widgets';").unwrap_err();

        assert_eq!(err.reason, Malformed::Unterminated);
    }

    #[test]
    fn rejects_non_string_values() {
        let err = extract_metadata("export const title = makeTitle();").unwrap_err();

        assert_eq!(err.reason, Malformed::NotAString);
    }

    #[test]
    fn rejects_concatenation() {
        let err = extract_metadata("export const title = 'a' + 'b';").unwrap_err();

        assert!(matches!(err.reason, Malformed::TrailingContent(_)));
    }

    #[test]
    fn rejects_other_annotations() {
        let err = extract_metadata("export const title: number = 4;").unwrap_err();

        assert_eq!(err.reason, Malformed::UnsupportedType("number".to_string()));
    }

    #[test]
    fn rejects_missing_assignment() {
        let err = extract_metadata("export const group;").unwrap_err();

        assert_eq!(err.reason, Malformed::MissingAssignment);
    }

    #[test]
    fn rejects_empty_values() {
        let err = extract_metadata("export const title = '';").unwrap_err();

        assert_eq!(err.reason, Malformed::Empty);
    }

    #[test]
    fn error_message_names_field_and_line() {
        let err = extract_metadata("export const title = 42;").unwrap_err();

        assert_eq!(
            err.to_string(),
            "line 1: malformed `title` declaration: value is not a quoted string literal"
        );
    }
}
