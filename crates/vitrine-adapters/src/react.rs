//! React/JSX adapter rendering a story's default export to static HTML.

use regex::Regex;
use std::sync::LazyLock;

use vitrine_stories::SourceKind;

use crate::generator::generate_html;
use crate::inline::{find_closing, parse_jsx};
use crate::traits::{PreviewAdapter, PreviewError, RenderContext, RenderedPreview};

/// The default export of a story module.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultExport {
    /// Export name; `None` for anonymous functions
    pub name: Option<String>,

    /// JSX source returned by the export
    pub markup: String,
}

/// React/JSX to static preview adapter.
#[derive(Debug, Default)]
pub struct ReactAdapter;

impl ReactAdapter {
    /// Create a new React adapter.
    pub fn new() -> Self {
        Self
    }

    /// Locate the default export and the JSX it returns.
    pub fn default_export(&self, source: &str) -> Result<DefaultExport, PreviewError> {
        let (name, body) = find_default_export(source)?;
        let label = name.clone().unwrap_or_else(|| "(anonymous)".to_string());

        let markup = returned_markup(body)?.ok_or(PreviewError::NoMarkup(label))?;

        Ok(DefaultExport {
            name,
            markup: markup.to_string(),
        })
    }
}

impl PreviewAdapter for ReactAdapter {
    fn name(&self) -> &'static str {
        "react"
    }

    fn kinds(&self) -> &[SourceKind] {
        &SourceKind::ALL
    }

    fn render(&self, source: &str, ctx: &RenderContext) -> Result<RenderedPreview, PreviewError> {
        let export = self.default_export(source)?;
        let (node, _) = parse_jsx(&export.markup)?;
        let generated = generate_html(&node, ctx);

        Ok(RenderedPreview {
            html: generated.html,
            export_name: export.name,
            components: generated.components,
        })
    }
}

// Regex patterns for locating the default export
static DEFAULT_FUNCTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"export\s+default\s+(?:async\s+)?function\s*\*?\s*([A-Za-z_$][\w$]*)?\s*(?:<[^>]*>)?\s*\(")
        .expect("Invalid default function regex")
});

static DEFAULT_ARROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"export\s+default\s+(?:async\s*)?(?:\([^)]*\)|[A-Za-z_$][\w$]*)\s*(?::\s*[^=]+)?=>")
        .expect("Invalid default arrow regex")
});

static DEFAULT_IDENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"export\s+default\s+([A-Za-z_$][\w$]*)\s*;?").expect("Invalid default ident regex")
});

static RETURN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\breturn\s*").expect("Invalid return regex"));

/// Find the default export's name and function body (or arrow body).
fn find_default_export(source: &str) -> Result<(Option<String>, &str), PreviewError> {
    if let Some(caps) = DEFAULT_FUNCTION_RE.captures(source) {
        let name = caps.get(1).map(|m| m.as_str().to_string());
        let params_start = caps.get(0).map(|m| m.end() - 1).unwrap_or(0);
        let body = function_body(source, params_start).unwrap_or("");
        return Ok((name, body));
    }

    if let Some(m) = DEFAULT_ARROW_RE.find(source) {
        return Ok((None, &source[m.end()..]));
    }

    if let Some(caps) = DEFAULT_IDENT_RE.captures(source) {
        let ident = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        if !matches!(ident, "function" | "class" | "async") {
            let body = find_definition(source, ident)
                .ok_or_else(|| PreviewError::NoMarkup(ident.to_string()))?;
            return Ok((Some(ident.to_string()), body));
        }
    }

    Err(PreviewError::MissingDefaultExport)
}

/// Body of a local function or arrow-function constant named `name`.
fn find_definition<'a>(source: &'a str, name: &str) -> Option<&'a str> {
    let name = regex::escape(name);

    let function = Regex::new(&format!(r"function\s+{}\s*(?:<[^>]*>)?\s*\(", name)).ok()?;
    if let Some(m) = function.find(source) {
        return function_body(source, m.end() - 1);
    }

    let constant = Regex::new(&format!(
        r"(?:const|let|var)\s+{}\s*(?::[^=]+)?=\s*(?:async\s*)?(?:function\s*\w*\s*\(|(?:\([^)]*\)|[A-Za-z_$][\w$]*)\s*(?::\s*[^=]+)?=>)",
        name
    ))
    .ok()?;
    let m = constant.find(source)?;
    let matched = m.as_str();

    if matched.ends_with('(') {
        function_body(source, m.end() - 1)
    } else {
        Some(&source[m.end()..])
    }
}

/// Given the index of a function's opening `(`, return its `{...}` body.
fn function_body(source: &str, params_start: usize) -> Option<&str> {
    let params_end = params_start + find_closing(&source[params_start..], b'(', b')')?;
    let after = &source[params_end + 1..];
    let open = after.find('{')?;
    let close = find_closing(&after[open..], b'{', b'}')?;
    Some(&after[open..open + close + 1])
}

/// The JSX returned by a function body or produced by an arrow body.
///
/// A `return` of malformed markup is only reported when no later `return`
/// yields valid markup.
fn returned_markup(body: &str) -> Result<Option<&str>, PreviewError> {
    let trimmed = body.trim_start();

    if !trimmed.starts_with('{') {
        return markup_at(trimmed);
    }

    let mut first_error = None;
    for m in RETURN_RE.find_iter(trimmed) {
        match markup_at(&trimmed[m.end()..]) {
            Ok(Some(markup)) => return Ok(Some(markup)),
            Ok(None) => {}
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    first_error.map_or(Ok(None), Err)
}

/// JSX markup at the start of an expression, unwrapping parentheses.
///
/// `Ok(None)` when the expression is not markup at all.
fn markup_at(expr: &str) -> Result<Option<&str>, PreviewError> {
    let expr = expr.trim_start();

    if expr.starts_with('(') {
        return match find_closing(expr, b'(', b')') {
            Some(close) => markup_at(&expr[1..close]),
            None => Ok(None),
        };
    }

    if expr.starts_with('<') {
        let (_, end) = parse_jsx(expr)?;
        return Ok(Some(&expr[..end]));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(source: &str) -> Result<RenderedPreview, PreviewError> {
        ReactAdapter::new().render(source, &RenderContext::default())
    }

    #[test]
    fn renders_named_default_function() {
        let source = r#"
import Button from "./button";

export const title = "Primary Button";

export default function ButtonStory() {
  return <Button>Click me</Button>;
}
"#;

        let preview = render(source).unwrap();

        assert_eq!(preview.export_name.as_deref(), Some("ButtonStory"));
        assert_eq!(preview.html, "<story-button>Click me</story-button>");
        assert_eq!(preview.components, vec!["Button".to_string()]);
    }

    #[test]
    fn renders_parenthesized_return() {
        let source = r#"
export default function Story(): JSX.Element {
  const label = compute();
  return (
    <div className="p-4">
      <span>Hello</span>
    </div>
  );
}
"#;

        let preview = render(source).unwrap();

        assert_eq!(preview.html, r#"<div class="p-4"><span>Hello</span></div>"#);
    }

    #[test]
    fn skips_non_jsx_returns() {
        let source = r#"
export default function Story() {
  const pick = (xs) => { return xs[0]; };
  if (!pick) return null;
  return <p>ok</p>;
}
"#;

        assert_eq!(render(source).unwrap().html, "<p>ok</p>");
    }

    #[test]
    fn renders_arrow_default_export() {
        let preview = render("export default () => <hr />;").unwrap();

        assert_eq!(preview.export_name, None);
        assert_eq!(preview.html, "<hr>");
    }

    #[test]
    fn renders_identifier_default_export() {
        let source = r#"
import Button from "./button";

const Spinner = () => (
  <Button disabled>Loading</Button>
);

export default Spinner;
"#;

        let preview = render(source).unwrap();

        assert_eq!(preview.export_name.as_deref(), Some("Spinner"));
        assert_eq!(preview.html, "<story-button disabled>Loading</story-button>");
    }

    #[test]
    fn renders_identifier_bound_to_function() {
        let source = r#"
function Card() {
  return <section>card</section>;
}

export default Card;
"#;

        assert_eq!(render(source).unwrap().html, "<section>card</section>");
    }

    #[test]
    fn renders_component_without_story_wrapper() {
        let source = r#"
import { ReactNode } from "react";

function Button({ children }: { children: ReactNode }) {
  return <button className="bg-red-500 px-3 py-2">{children}</button>;
}

export default Button;
"#;

        assert_eq!(
            render(source).unwrap().html,
            r#"<button class="bg-red-500 px-3 py-2"></button>"#
        );
    }

    #[test]
    fn errors_without_default_export() {
        let err = render("export const title = 'x';").unwrap_err();

        assert_eq!(err, PreviewError::MissingDefaultExport);
    }

    #[test]
    fn errors_when_export_returns_no_markup() {
        let err = render("export default function Story() { return null; }").unwrap_err();

        assert_eq!(err, PreviewError::NoMarkup("Story".to_string()));
    }

    #[test]
    fn errors_on_broken_markup() {
        let err = render("export default () => <div><span></div>;").unwrap_err();

        assert_eq!(
            err,
            PreviewError::Jsx {
                offset: 17,
                message: "expected </span>, found </div>".to_string(),
            }
        );
    }

    #[test]
    fn later_valid_return_wins_over_broken_markup() {
        let source = r#"
export default function Story() {
  if (legacy) return <b>;
  return <p>ok</p>;
}
"#;

        assert_eq!(render(source).unwrap().html, "<p>ok</p>");
    }
}
