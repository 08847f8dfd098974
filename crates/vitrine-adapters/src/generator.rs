//! Static HTML generation from parsed JSX.

use std::sync::LazyLock;

use regex::Regex;

use crate::inline::{string_literal, JsxElement, JsxNode, PropValue};
use crate::traits::RenderContext;

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^&(?:[A-Za-z][A-Za-z0-9]*|#[0-9]+|#[xX][0-9A-Fa-f]+);").expect("Invalid entity regex")
});

/// Rendered markup plus the components it referenced.
#[derive(Debug, Default)]
pub struct GeneratedHtml {
    pub html: String,
    pub components: Vec<String>,
}

/// Render a JSX tree to static HTML.
///
/// HTML elements are kept, components become custom elements named after
/// the component (`<DatePicker>` → `<story-date-picker>`), expression
/// children and non-literal props are dropped.
pub fn generate_html(node: &JsxNode, ctx: &RenderContext) -> GeneratedHtml {
    let mut generated = GeneratedHtml::default();
    write_node(node, ctx, &mut generated);
    generated
}

fn write_node(node: &JsxNode, ctx: &RenderContext, out: &mut GeneratedHtml) {
    match node {
        JsxNode::Element(el) => write_element(el, ctx, out),
        JsxNode::Fragment(children) => {
            for child in children {
                write_node(child, ctx, out);
            }
        }
        JsxNode::Text(text) => out.html.push_str(&escape_text(text)),
        JsxNode::Expression(_) => {}
    }
}

fn write_element(el: &JsxElement, ctx: &RenderContext, out: &mut GeneratedHtml) {
    let tag = if el.is_component() {
        if !out.components.contains(&el.name) {
            out.components.push(el.name.clone());
        }
        custom_element_name(&ctx.element_prefix, &el.name)
    } else {
        el.name.clone()
    };

    out.html.push('<');
    out.html.push_str(&tag);
    for (name, value) in &el.props {
        write_attribute(name, value, &mut out.html);
    }
    out.html.push('>');

    if !el.is_component() && VOID_ELEMENTS.contains(&el.name.as_str()) {
        return;
    }

    for child in &el.children {
        write_node(child, ctx, out);
    }

    out.html.push_str("</");
    out.html.push_str(&tag);
    out.html.push('>');
}

fn write_attribute(name: &str, value: &PropValue, html: &mut String) {
    let name = match name {
        "className" => "class",
        "htmlFor" => "for",
        other => other,
    };

    let rendered = match value {
        PropValue::String(s) => Some(s.as_str()),
        PropValue::Boolean(true) => None,
        PropValue::Boolean(false) | PropValue::Spread(_) => return,
        PropValue::Expression(expr) => match literal_attribute(expr) {
            Literal::Bare => None,
            Literal::Value(v) => Some(v),
            Literal::Skip => return,
        },
    };

    html.push(' ');
    html.push_str(name);
    if let Some(value) = rendered {
        html.push_str("=\"");
        html.push_str(&escape_attribute(value));
        html.push('"');
    }
}

enum Literal<'a> {
    Bare,
    Value(&'a str),
    Skip,
}

/// Statically known value of an attribute expression, if any.
fn literal_attribute(expr: &str) -> Literal<'_> {
    let expr = expr.trim();
    match expr {
        "true" => Literal::Bare,
        "false" | "null" | "undefined" => Literal::Skip,
        _ => {
            if let Some(s) = string_literal(expr) {
                Literal::Value(s)
            } else if is_number(expr) {
                Literal::Value(expr)
            } else {
                Literal::Skip
            }
        }
    }
}

fn is_number(expr: &str) -> bool {
    expr.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-') && expr.parse::<f64>().is_ok()
}

/// Custom element name for a component: `prefix-kebab-name`.
pub fn custom_element_name(prefix: &str, component: &str) -> String {
    let name = component
        .split('.')
        .map(to_kebab_case)
        .collect::<Vec<_>>()
        .join("-");

    if prefix.is_empty() {
        name
    } else {
        format!("{}-{}", prefix, name)
    }
}

/// Convert PascalCase/camelCase to kebab-case.
fn to_kebab_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' {
            out.push('-');
            continue;
        }
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                out.push('-');
            }
        }
        out.extend(c.to_lowercase());
    }

    out
}

/// Escape text content, keeping character references that are already there.
fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());

    for (i, c) in s.char_indices() {
        match c {
            '&' if ENTITY_RE.is_match(&s[i..]) => out.push('&'),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }

    out
}

/// Escape HTML special characters including quotes for attribute values.
fn escape_attribute(s: &str) -> String {
    escape_text(s).replace('"', "&quot;").replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inline::parse_jsx;
    use pretty_assertions::assert_eq;

    fn render(source: &str) -> GeneratedHtml {
        let (node, _) = parse_jsx(source).unwrap();
        generate_html(&node, &RenderContext::default())
    }

    #[test]
    fn to_kebab_case_works() {
        assert_eq!(to_kebab_case("Button"), "button");
        assert_eq!(to_kebab_case("DatePicker"), "date-picker");
        assert_eq!(to_kebab_case("HTMLInput"), "html-input");
        assert_eq!(to_kebab_case("Step2Form"), "step2-form");
    }

    #[test]
    fn names_custom_elements() {
        assert_eq!(custom_element_name("story", "Button"), "story-button");
        assert_eq!(custom_element_name("story", "Card.Header"), "story-card-header");
        assert_eq!(custom_element_name("", "DatePicker"), "date-picker");
    }

    #[test]
    fn renders_html_elements() {
        let out = render(r#"<button className="bg-red-500 px-3 py-2" type="button">Go</button>"#);

        assert_eq!(
            out.html,
            r#"<button class="bg-red-500 px-3 py-2" type="button">Go</button>"#
        );
        assert!(out.components.is_empty());
    }

    #[test]
    fn renders_components_as_custom_elements() {
        let out = render(r#"<Card><Button variant="primary" disabled>Save</Button><Button>Cancel</Button></Card>"#);

        assert_eq!(
            out.html,
            concat!(
                "<story-card>",
                r#"<story-button variant="primary" disabled>Save</story-button>"#,
                "<story-button>Cancel</story-button>",
                "</story-card>"
            )
        );
        assert_eq!(out.components, vec!["Card".to_string(), "Button".to_string()]);
    }

    #[test]
    fn renders_literal_expressions_and_drops_the_rest() {
        let out = render(
            r#"<input disabled={true} hidden={false} value={"x"} max={10} onChange={handle} {...rest} />"#,
        );

        assert_eq!(out.html, r#"<input disabled value="x" max="10">"#);
    }

    #[test]
    fn unwraps_fragments_and_escapes_text() {
        let out = render("<><label htmlFor=\"a\">A &amp; B & C</label>{count}<br /></>");

        assert_eq!(out.html, r#"<label for="a">A &amp; B &amp; C</label><br>"#);
    }

    #[test]
    fn escapes_attribute_values() {
        let out = render(r#"<div title='say "hi"'></div>"#);

        assert_eq!(out.html, r#"<div title="say &quot;hi&quot;"></div>"#);
    }
}
