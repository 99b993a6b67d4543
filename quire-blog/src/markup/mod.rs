//! A small HTML fragment parser and serializer.
//!
//! Post bodies are rich-text markup. The tree keeps attribute values and
//! text exactly as written so that serializing an unmodified, well-formed
//! fragment yields the original input. Parsing is lenient: void elements
//! take no children, unmatched end tags are dropped and elements still open
//! at the end of the input are closed there.

mod parser;

use std::fmt;

use thiserror::Error;

/// Nesting limit for open elements.
pub const MAX_DEPTH: usize = 512;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MarkupError {
    #[error("markup nests deeper than {limit} elements")]
    TooDeep { limit: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    Double,
    Single,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    raw_value: Option<String>,
    quote: Quote,
}

impl Attribute {
    /// Entity-decoded value; `None` for a bare attribute like `disabled`.
    pub fn value(&self) -> Option<String> {
        self.raw_value.as_deref().map(decode_entities)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
    Doctype(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attrs: Vec<Attribute>,
    pub children: Vec<Node>,
    self_closing: bool,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
            self_closing: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case-insensitive tag comparison.
    pub fn is(&self, tag: &str) -> bool {
        self.name.eq_ignore_ascii_case(tag)
    }

    pub fn attrs(&self) -> &[Attribute] {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        self.attrs
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .and_then(Attribute::value)
    }

    /// Set an attribute, replacing an existing one in place.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        let raw = encode_attr(value);
        match self.attrs.iter_mut().find(|a| a.name.eq_ignore_ascii_case(name)) {
            Some(attr) => {
                attr.raw_value = Some(raw);
                attr.quote = Quote::Double;
            }
            None => self.attrs.push(Attribute {
                name: name.to_string(),
                raw_value: Some(raw),
                quote: Quote::Double,
            }),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<Attribute> {
        let idx = self.attrs.iter().position(|a| a.name.eq_ignore_ascii_case(name))?;
        Some(self.attrs.remove(idx))
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for attr in &self.attrs {
            out.push(' ');
            out.push_str(&attr.name);
            if let Some(raw) = &attr.raw_value {
                out.push('=');
                match attr.quote {
                    Quote::Double => {
                        out.push('"');
                        out.push_str(raw);
                        out.push('"');
                    }
                    Quote::Single => {
                        out.push('\'');
                        out.push_str(raw);
                        out.push('\'');
                    }
                    Quote::None => out.push_str(raw),
                }
            }
        }
        if self.self_closing {
            out.push_str("/>");
            return;
        }
        out.push('>');
        if parser::is_void(&self.name) {
            return;
        }
        for child in &self.children {
            child.write_to(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

impl Node {
    fn write_to(&self, out: &mut String) {
        match self {
            Node::Element(e) => e.write_to(out),
            Node::Text(text) => out.push_str(text),
            Node::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            Node::Doctype(text) => {
                out.push_str("<!");
                out.push_str(text);
                out.push('>');
            }
        }
    }
}

/// A parsed markup fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub children: Vec<Node>,
}

impl Fragment {
    pub fn parse(input: &str) -> Result<Self, MarkupError> {
        parser::parse(input)
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            node.write_to(&mut out);
        }
        out
    }

    /// Visit every element with the given tag, in document order.
    pub fn for_each_element<F>(&self, tag: &str, mut f: F)
    where
        F: FnMut(&Element),
    {
        fn walk<F: FnMut(&Element)>(nodes: &[Node], tag: &str, f: &mut F) {
            for node in nodes {
                if let Node::Element(e) = node {
                    if e.is(tag) {
                        f(e);
                    }
                    walk(&e.children, tag, f);
                }
            }
        }
        walk(&self.children, tag, &mut f);
    }

    /// Mutable variant of [`Fragment::for_each_element`]. The callback may
    /// fail; the walk stops at the first error.
    pub fn try_for_each_element_mut<F, E>(&mut self, tag: &str, mut f: F) -> Result<(), E>
    where
        F: FnMut(&mut Element) -> Result<(), E>,
    {
        fn walk<F, E>(nodes: &mut [Node], tag: &str, f: &mut F) -> Result<(), E>
        where
            F: FnMut(&mut Element) -> Result<(), E>,
        {
            for node in nodes {
                if let Node::Element(e) = node {
                    if e.is(tag) {
                        f(e)?;
                    }
                    walk(&mut e.children, tag, f)?;
                }
            }
            Ok(())
        }
        walk(&mut self.children, tag, &mut f)
    }

    /// Concatenated text content with markup stripped.
    pub fn text(&self) -> String {
        fn walk(nodes: &[Node], out: &mut String) {
            for node in nodes {
                match node {
                    Node::Text(t) => out.push_str(&decode_entities(t)),
                    Node::Element(e) => walk(&e.children, out),
                    Node::Comment(_) | Node::Doctype(_) => {}
                }
            }
        }
        let mut out = String::new();
        walk(&self.children, &mut out);
        out
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

fn encode_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Decodes the named entities HTML editors emit plus numeric references.
/// Anything unrecognised is kept verbatim.
fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];
        let decoded = rest.find(';').filter(|end| *end <= 10).and_then(|end| {
            let entity = &rest[1..end];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity.strip_prefix('#').and_then(|num| {
                    let code = match num.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => num.parse().ok(),
                    };
                    code.and_then(char::from_u32)
                }),
            };
            c.map(|c| (c, end))
        });
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
