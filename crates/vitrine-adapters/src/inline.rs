//! JSX markup parser for story previews.
//!
//! Parses the markup returned by a story's default export, e.g.
//! `<Button variant="primary" disabled>Click me</Button>`, into a small tree
//! of elements, text and expressions. Expressions are kept as raw source;
//! nothing is evaluated.

use crate::traits::PreviewError;

/// A node of parsed JSX.
#[derive(Debug, Clone, PartialEq)]
pub enum JsxNode {
    Element(JsxElement),

    /// `<>...</>`
    Fragment(Vec<JsxNode>),

    /// Literal text, whitespace-normalized the way JSX does
    Text(String),

    /// `{expression}` child, kept as source
    Expression(String),
}

/// A JSX element.
#[derive(Debug, Clone, PartialEq)]
pub struct JsxElement {
    /// Tag name (e.g., "Button", "div", "Card.Header")
    pub name: String,

    /// Props in source order
    pub props: Vec<(String, PropValue)>,

    pub children: Vec<JsxNode>,

    pub self_closing: bool,
}

impl JsxElement {
    /// Whether the tag refers to a component rather than an HTML element.
    pub fn is_component(&self) -> bool {
        self.name.starts_with(|c: char| c.is_ascii_uppercase()) || self.name.contains('.')
    }

    /// Look up a prop by name.
    pub fn prop(&self, name: &str) -> Option<&PropValue> {
        self.props.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }
}

/// A prop value from JSX.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    /// String literal: variant="default"
    String(String),
    /// Boolean (presence): disabled
    Boolean(bool),
    /// Expression: onClick={() => {}}
    Expression(String),
    /// Spread: {...props}
    Spread(String),
}

impl PropValue {
    /// Get as string if it's a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Parse the JSX element or fragment at the start of `source`.
///
/// Returns the parsed node and the number of bytes it spans. Anything after
/// the element is ignored.
pub fn parse_jsx(source: &str) -> Result<(JsxNode, usize), PreviewError> {
    let mut parser = Parser { src: source, pos: 0 };
    parser.skip_ws();
    let node = parser.node()?;
    Ok((node, parser.pos))
}

/// Find the byte index of the bracket closing the one at `src[0]`.
///
/// String literals, template literals and block comments are skipped. A
/// quote that is not closed on the same line is treated as a plain
/// character, since it is most likely an apostrophe in JSX text.
pub(crate) fn find_closing(src: &str, open: u8, close: u8) -> Option<usize> {
    let bytes = src.as_bytes();
    if bytes.first() != Some(&open) {
        return None;
    }

    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                if let Some(end) = skip_string(bytes, i, false) {
                    i = end;
                }
            }
            b'`' => i = skip_string(bytes, i, true)?,
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = src[i + 2..].find("*/")?;
                i += 2 + end + 1;
            }
            b if b == open => depth += 1,
            b if b == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }

    None
}

/// Index of the quote closing the string that starts at `start`.
fn skip_string(bytes: &[u8], start: usize, multiline: bool) -> Option<usize> {
    let quote = bytes[start];
    let mut i = start + 1;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'\n' if !multiline => return None,
            b if b == quote => return Some(i),
            _ => {}
        }
        i += 1;
    }

    None
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn error<T>(&self, message: impl Into<String>) -> Result<T, PreviewError> {
        Err(PreviewError::Jsx {
            offset: self.pos,
            message: message.into(),
        })
    }

    fn expect(&mut self, byte: u8) -> Result<(), PreviewError> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            self.error(format!("expected '{}'", byte as char))
        }
    }

    fn name(&mut self) -> &'a str {
        let start = self.pos;
        while matches!(
            self.peek(),
            Some(b) if b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b':' | b'-' | b'$')
        ) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    fn node(&mut self) -> Result<JsxNode, PreviewError> {
        self.expect(b'<')?;
        self.skip_ws();

        if self.peek() == Some(b'>') {
            self.pos += 1;
            return Ok(JsxNode::Fragment(self.children("")?));
        }

        self.element().map(JsxNode::Element)
    }

    fn element(&mut self) -> Result<JsxElement, PreviewError> {
        let name = self.name();
        if name.is_empty() {
            return self.error("expected element name");
        }

        let mut props = Vec::new();

        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'/') => {
                    self.pos += 1;
                    self.expect(b'>')?;
                    return Ok(JsxElement {
                        name: name.to_string(),
                        props,
                        children: Vec::new(),
                        self_closing: true,
                    });
                }
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(b'{') => {
                    let expr = self.braced()?.trim();
                    match expr.strip_prefix("...") {
                        Some(spread) => {
                            props.push((
                                "...".to_string(),
                                PropValue::Spread(spread.trim().to_string()),
                            ))
                        }
                        None => return self.error("expected spread attribute"),
                    }
                }
                Some(_) => {
                    let attr = self.name();
                    if attr.is_empty() {
                        return self.error(format!("unexpected character in <{}>", name));
                    }
                    self.skip_ws();

                    let value = if self.peek() == Some(b'=') {
                        self.pos += 1;
                        self.skip_ws();
                        match self.peek() {
                            Some(b'"' | b'\'') => PropValue::String(self.quoted()?.to_string()),
                            Some(b'{') => PropValue::Expression(self.braced()?.trim().to_string()),
                            _ => return self.error(format!("expected value for '{}'", attr)),
                        }
                    } else {
                        PropValue::Boolean(true)
                    };

                    props.push((attr.to_string(), value));
                }
                None => return self.error(format!("unterminated <{}> tag", name)),
            }
        }

        let children = self.children(name)?;

        Ok(JsxElement {
            name: name.to_string(),
            props,
            children,
            self_closing: false,
        })
    }

    /// Parse children up to and including the closing tag `</closing>`.
    fn children(&mut self, closing: &str) -> Result<Vec<JsxNode>, PreviewError> {
        let mut children = Vec::new();

        loop {
            if self.rest().starts_with("</") {
                self.pos += 2;
                self.skip_ws();
                let found = self.name();
                self.skip_ws();
                self.expect(b'>')?;
                if found != closing {
                    return self.error(format!("expected </{}>, found </{}>", closing, found));
                }
                return Ok(children);
            }

            match self.peek() {
                Some(b'<') => children.push(self.node()?),
                Some(b'{') => {
                    let expr = self.braced()?;
                    if let Some(node) = expression_child(expr) {
                        children.push(node);
                    }
                }
                Some(_) => {
                    let start = self.pos;
                    while !matches!(self.peek(), None | Some(b'<' | b'{')) {
                        self.pos += 1;
                    }
                    if let Some(text) = normalize_text(&self.src[start..self.pos]) {
                        children.push(JsxNode::Text(text));
                    }
                }
                None => {
                    let tag = if closing.is_empty() { "<>" } else { closing };
                    return self.error(format!("unclosed element {}", tag));
                }
            }
        }
    }

    fn quoted(&mut self) -> Result<&'a str, PreviewError> {
        let Some(quote) = self.peek() else {
            return self.error("expected string");
        };
        let body = &self.rest()[1..];
        let Some(end) = body.find(quote as char) else {
            return self.error("unterminated string");
        };
        self.pos += end + 2;
        Ok(&body[..end])
    }

    fn braced(&mut self) -> Result<&'a str, PreviewError> {
        let rest = self.rest();
        let Some(end) = find_closing(rest, b'{', b'}') else {
            return self.error("unbalanced braces");
        };
        self.pos += end + 1;
        Ok(&rest[1..end])
    }
}

/// Classify a `{...}` child: comments vanish, string literals become text.
fn expression_child(expr: &str) -> Option<JsxNode> {
    let expr = expr.trim();

    if expr.is_empty() || (expr.starts_with("/*") && expr.ends_with("*/")) {
        return None;
    }

    if let Some(literal) = string_literal(expr) {
        return Some(JsxNode::Text(literal.to_string()));
    }

    Some(JsxNode::Expression(expr.to_string()))
}

/// The contents of a simple quoted literal (`"x"`, `'x'` or `` `x` ``).
pub(crate) fn string_literal(expr: &str) -> Option<&str> {
    let bytes = expr.as_bytes();
    let quote = *bytes.first()?;
    if bytes.len() < 2 || !matches!(quote, b'"' | b'\'' | b'`') || bytes[bytes.len() - 1] != quote {
        return None;
    }

    let inner = &expr[1..expr.len() - 1];
    if inner.contains(quote as char) || (quote == b'`' && inner.contains("${")) {
        return None;
    }

    Some(inner)
}

/// Apply JSX whitespace rules to a run of text.
///
/// Single-line text is kept as is. Multi-line text has each line trimmed
/// where it touches a line break, blank lines dropped, and the rest joined
/// by single spaces.
fn normalize_text(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }

    if !raw.contains('\n') {
        return Some(raw.to_string());
    }

    let lines: Vec<&str> = raw.split('\n').collect();
    let last = lines.len() - 1;

    let kept: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let mut line = line.trim_end_matches('\r');
            if i != 0 {
                line = line.trim_start();
            }
            if i != last {
                line = line.trim_end();
            }
            line
        })
        .filter(|line| !line.is_empty())
        .collect();

    if kept.is_empty() {
        None
    } else {
        Some(kept.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn element(source: &str) -> JsxElement {
        match parse_jsx(source).unwrap().0 {
            JsxNode::Element(el) => el,
            other => panic!("expected element, got {:?}", other),
        }
    }

    #[test]
    fn parses_self_closing() {
        let el = element(r#"<Icon name="star" />"#);

        assert_eq!(el.name, "Icon");
        assert!(el.self_closing);
        assert_eq!(el.prop("name").and_then(|p| p.as_str()), Some("star"));
        assert!(el.children.is_empty());
    }

    #[test]
    fn parses_props_of_every_kind() {
        let el = element(r#"<Button variant='primary' disabled data={value} {...rest}>Go</Button>"#);

        assert_eq!(
            el.props,
            vec![
                ("variant".to_string(), PropValue::String("primary".to_string())),
                ("disabled".to_string(), PropValue::Boolean(true)),
                ("data".to_string(), PropValue::Expression("value".to_string())),
                ("...".to_string(), PropValue::Spread("rest".to_string())),
            ]
        );
        assert_eq!(el.children, vec![JsxNode::Text("Go".to_string())]);
    }

    #[test]
    fn parses_arrow_function_props() {
        let el = element(r#"<button onClick={() => { alert("}"); }}>Click</button>"#);

        assert!(matches!(el.prop("onClick"), Some(PropValue::Expression(_))));
        assert_eq!(el.children, vec![JsxNode::Text("Click".to_string())]);
    }

    #[test]
    fn parses_nested_same_name_elements() {
        let el = element("<div><div>inner</div> tail</div>");

        assert_eq!(el.children.len(), 2);
        assert!(matches!(&el.children[0], JsxNode::Element(inner) if inner.name == "div"));
        assert_eq!(el.children[1], JsxNode::Text(" tail".to_string()));
    }

    #[test]
    fn parses_fragments() {
        let (node, _) = parse_jsx("<><b>a</b><i>b</i></>").unwrap();

        match node {
            JsxNode::Fragment(children) => assert_eq!(children.len(), 2),
            other => panic!("expected fragment, got {:?}", other),
        }
    }

    #[test]
    fn classifies_expression_children() {
        let el = element(r#"<p>{"literal"}{/* note */}{count}</p>"#);

        assert_eq!(
            el.children,
            vec![
                JsxNode::Text("literal".to_string()),
                JsxNode::Expression("count".to_string()),
            ]
        );
    }

    #[test]
    fn normalizes_multiline_text() {
        let el = element("<p>\n    Hello\n    world\n  </p>");

        assert_eq!(el.children, vec![JsxNode::Text("Hello world".to_string())]);
    }

    #[test]
    fn keeps_apostrophes_in_text() {
        let el = element("<div>{ok && <p>Don't panic</p>}</div>");

        assert_eq!(el.children.len(), 1);
        assert!(matches!(&el.children[0], JsxNode::Expression(e) if e.contains("Don't")));
    }

    #[test]
    fn reports_consumed_length() {
        let source = "<Button>Go</Button>;\n}";
        let (_, consumed) = parse_jsx(source).unwrap();

        assert_eq!(&source[..consumed], "<Button>Go</Button>");
    }

    #[test]
    fn errors_on_mismatched_closing_tag() {
        let err = parse_jsx("<div><span></div>").unwrap_err();

        assert!(matches!(
            err,
            PreviewError::Jsx { ref message, .. } if message.contains("</span>")
        ));
    }

    #[test]
    fn errors_on_unclosed_element() {
        assert!(matches!(
            parse_jsx("<div>never closed"),
            Err(PreviewError::Jsx { .. })
        ));
    }

    #[test]
    fn finds_closing_bracket_past_strings() {
        assert_eq!(find_closing("{ a: '}' }", b'{', b'}'), Some(9));
        assert_eq!(find_closing("(a, `)${b}`)", b'(', b')'), Some(11));
        assert_eq!(find_closing("(unbalanced", b'(', b')'), None);
    }

    #[test]
    fn recognizes_string_literals() {
        assert_eq!(string_literal("'a'"), Some("a"));
        assert_eq!(string_literal("`a`"), Some("a"));
        assert_eq!(string_literal("`${a}`"), None);
        assert_eq!(string_literal("a"), None);
        assert_eq!(string_literal("'a' + 'b'"), None);
    }
}
