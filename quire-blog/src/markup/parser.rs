use super::{Attribute, Element, Fragment, MarkupError, Node, Quote, MAX_DEPTH};

/// Elements that never have children or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is kept verbatim up to the matching end tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

pub(super) fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

fn is_raw_text(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

#[derive(Debug, PartialEq)]
enum Token {
    Text(String),
    Comment(String),
    Doctype(String),
    StartTag {
        name: String,
        attrs: Vec<Attribute>,
        self_closing: bool,
    },
    EndTag(String),
}

struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn next_token(&mut self) -> Option<Token> {
        let rest = self.rest();
        if rest.is_empty() {
            return None;
        }

        if let Some(body) = rest.strip_prefix("<!--") {
            let (comment, consumed) = match body.find("-->") {
                Some(end) => (&body[..end], 4 + end + 3),
                None => (body, rest.len()),
            };
            self.pos += consumed;
            return Some(Token::Comment(comment.to_string()));
        }

        if let Some(body) = rest.strip_prefix("<!") {
            if let Some(end) = body.find('>') {
                self.pos += 2 + end + 1;
                return Some(Token::Doctype(body[..end].to_string()));
            }
        }

        if let Some(body) = rest.strip_prefix("</") {
            if body.starts_with(|c: char| c.is_ascii_alphabetic()) {
                if let Some(end) = body.find('>') {
                    let name: String = body[..end]
                        .chars()
                        .take_while(|c| !c.is_whitespace() && *c != '/')
                        .collect();
                    self.pos += 2 + end + 1;
                    return Some(Token::EndTag(name));
                }
            }
        }

        if rest.starts_with('<') && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            if let Some((token, consumed)) = parse_start_tag(rest) {
                self.pos += consumed;
                return Some(token);
            }
        }

        // Plain text up to the next `<` that is not the current character.
        let first = rest.chars().next().map_or(1, char::len_utf8);
        let end = rest[first..].find('<').map_or(rest.len(), |i| i + first);
        self.pos += end;
        Some(Token::Text(rest[..end].to_string()))
    }

    /// Consume raw text up to `</name`, leaving the end tag in place.
    fn raw_text_until(&mut self, name: &str) -> Option<String> {
        let rest = self.rest();
        let needle = format!("</{}", name.to_ascii_lowercase());
        let lower = rest.to_ascii_lowercase();
        let end = lower.find(&needle).unwrap_or(rest.len());
        self.pos += end;
        (end > 0).then(|| rest[..end].to_string())
    }
}

/// Parse `<name attr=...>` at the start of `input`. `None` when the tag is
/// never terminated, in which case the caller treats `<` as text.
fn parse_start_tag(input: &str) -> Option<(Token, usize)> {
    let bytes = input.as_bytes();
    let mut i = 1;
    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' && bytes[i] != b'/' {
        i += 1;
    }
    let name = input[1..i].to_string();
    let mut attrs = Vec::new();

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            return None;
        }
        match bytes[i] {
            b'>' => {
                return Some((
                    Token::StartTag {
                        name,
                        attrs,
                        self_closing: false,
                    },
                    i + 1,
                ));
            }
            b'/' if bytes.get(i + 1) == Some(&b'>') => {
                return Some((
                    Token::StartTag {
                        name,
                        attrs,
                        self_closing: true,
                    },
                    i + 2,
                ));
            }
            b'/' => {
                i += 1;
                continue;
            }
            _ => {}
        }

        let name_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'>' | b'/')
        {
            i += 1;
        }
        let attr_name = input[name_start..i].to_string();

        let mut j = i;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if bytes.get(j) != Some(&b'=') {
            attrs.push(Attribute {
                name: attr_name,
                raw_value: None,
                quote: Quote::None,
            });
            continue;
        }

        i = j + 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let (raw_value, quote) = match bytes.get(i) {
            Some(&q) if q == b'"' || q == b'\'' => {
                let close = input[i + 1..].find(q as char)?;
                let value = input[i + 1..i + 1 + close].to_string();
                i = i + 1 + close + 1;
                let quote = if q == b'"' { Quote::Double } else { Quote::Single };
                (value, quote)
            }
            Some(_) => {
                let start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                    i += 1;
                }
                (input[start..i].to_string(), Quote::None)
            }
            None => return None,
        };
        attrs.push(Attribute {
            name: attr_name,
            raw_value: Some(raw_value),
            quote,
        });
    }
}

struct Builder {
    root: Vec<Node>,
    open: Vec<Element>,
}

impl Builder {
    fn append(&mut self, node: Node) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root.push(node),
        }
    }

    fn close_top(&mut self) {
        if let Some(element) = self.open.pop() {
            self.append(Node::Element(element));
        }
    }

    fn end_tag(&mut self, name: &str) {
        // Unmatched end tags are dropped.
        let Some(idx) = self.open.iter().rposition(|e| e.is(name)) else {
            return;
        };
        while self.open.len() > idx {
            self.close_top();
        }
    }
}

pub(super) fn parse(input: &str) -> Result<Fragment, MarkupError> {
    let mut tokenizer = Tokenizer::new(input);
    let mut builder = Builder {
        root: Vec::new(),
        open: Vec::new(),
    };

    while let Some(token) = tokenizer.next_token() {
        match token {
            Token::Text(text) => builder.append(Node::Text(text)),
            Token::Comment(text) => builder.append(Node::Comment(text)),
            Token::Doctype(text) => builder.append(Node::Doctype(text)),
            Token::EndTag(name) => builder.end_tag(&name),
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => {
                let element = Element {
                    name,
                    attrs,
                    children: Vec::new(),
                    self_closing,
                };
                if self_closing || is_void(&element.name) {
                    builder.append(Node::Element(element));
                    continue;
                }
                if builder.open.len() >= MAX_DEPTH {
                    return Err(MarkupError::TooDeep { limit: MAX_DEPTH });
                }
                let raw = is_raw_text(&element.name);
                let raw_name = element.name.clone();
                builder.open.push(element);
                if raw {
                    if let Some(text) = tokenizer.raw_text_until(&raw_name) {
                        builder.append(Node::Text(text));
                    }
                }
            }
        }
    }

    while !builder.open.is_empty() {
        builder.close_top();
    }

    Ok(Fragment {
        children: builder.root,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        let mut t = Tokenizer::new(input);
        std::iter::from_fn(|| t.next_token()).collect()
    }

    #[test]
    fn tokenizes_tags_text_and_comments() {
        let got = tokens(r#"<p class="a">hi<!-- c --></p>"#);
        assert_eq!(got.len(), 4);
        assert!(matches!(&got[0], Token::StartTag { name, attrs, .. } if name == "p" && attrs.len() == 1));
        assert_eq!(got[1], Token::Text("hi".to_string()));
        assert_eq!(got[2], Token::Comment(" c ".to_string()));
        assert_eq!(got[3], Token::EndTag("p".to_string()));
    }

    #[test]
    fn stray_angle_bracket_is_text() {
        let got = tokens("a < b");
        assert_eq!(got, vec![Token::Text("a ".to_string()), Token::Text("< b".to_string())]);
    }

    #[test]
    fn unterminated_tag_is_text() {
        let got = tokens(r#"<img src="x"#);
        assert_eq!(got, vec![Token::Text(r#"<img src="x"#.to_string())]);
    }

    #[test]
    fn attribute_forms() {
        let got = tokens(r#"<input disabled value=3 title='x y'>"#);
        let Token::StartTag { attrs, .. } = &got[0] else {
            panic!("expected start tag");
        };
        assert_eq!(attrs[0].name, "disabled");
        assert_eq!(attrs[0].raw_value, None);
        assert_eq!(attrs[1].raw_value.as_deref(), Some("3"));
        assert_eq!(attrs[2].raw_value.as_deref(), Some("x y"));
        assert_eq!(attrs[2].quote, Quote::Single);
    }
}
