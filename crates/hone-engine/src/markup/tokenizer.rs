//! A lossless HTML tokenizer.
//!
//! Every byte of the input belongs to exactly one token, so concatenating
//! the spans of all tokens in order reproduces the input. Anything that does
//! not form a complete tag (a lone `<`, a tag cut off by end of input) is
//! emitted as text.

use super::{cursor::Cursor, span::Span, tags};

#[derive(Debug, Clone, PartialEq)]
pub struct RawAttribute {
    /// Lowercased attribute name.
    pub name: String,
    /// Value as written between the quotes, entities still encoded.
    pub value: Option<String>,
    /// The attribute as written, including its leading whitespace.
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartTag {
    /// Lowercased tag name.
    pub name: String,
    /// Tag name exactly as written.
    pub name_span: Span,
    pub attrs: Vec<RawAttribute>,
    pub self_closing: bool,
    /// Whitespace and terminator after the last attribute (`>` or ` />`).
    pub tail: Span,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    StartTag(StartTag),
    EndTag { name: String, span: Span },
    Text(Span),
    Comment(Span),
    Doctype(Span),
}

pub struct Tokenizer<'a> {
    cur: Cursor<'a>,
    /// Set after a raw-text start tag; the next token runs to its end tag.
    raw_text: Option<String>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            cur: Cursor::new(source),
            raw_text: None,
        }
    }

    fn at_markup_start(&self) -> bool {
        if self.cur.peek() != Some(b'<') {
            return false;
        }
        match self.cur.peek_at(1) {
            Some(b) if b.is_ascii_alphabetic() => true,
            Some(b'!') | Some(b'?') => true,
            Some(b'/') => self.cur.peek_at(2).is_some_and(|b| b.is_ascii_alphabetic()),
            _ => false,
        }
    }

    fn markup_token(&mut self) -> Option<Token> {
        let start = self.cur.pos();
        if self.cur.starts_with(b"<!--") {
            match self.cur.find("-->") {
                Some(idx) => self.cur.seek(idx + 3),
                None => self.cur.seek_end(),
            }
            return Some(Token::Comment(Span::new(start, self.cur.pos())));
        }
        if self.cur.starts_with(b"<!") || self.cur.starts_with(b"<?") {
            let is_doctype = self.cur.starts_with_ignore_case(b"<!doctype");
            match self.cur.find(">") {
                Some(idx) => self.cur.seek(idx + 1),
                None => self.cur.seek_end(),
            }
            let span = Span::new(start, self.cur.pos());
            return Some(if is_doctype {
                Token::Doctype(span)
            } else {
                Token::Comment(span)
            });
        }
        if self.cur.starts_with(b"</") {
            return self.end_tag(start);
        }
        self.start_tag(start)
    }

    fn end_tag(&mut self, start: usize) -> Option<Token> {
        let saved = self.cur.i;
        self.cur.bump_n(2);
        let name_start = self.cur.i;
        self.cur
            .bump_while(|b| !b.is_ascii_whitespace() && b != b'/' && b != b'>');
        let name = self.cur.s[name_start..self.cur.i].to_ascii_lowercase();
        match self.cur.find(">") {
            Some(idx) => {
                self.cur.seek(idx + 1);
                Some(Token::EndTag {
                    name,
                    span: Span::new(start, self.cur.pos()),
                })
            }
            None => {
                self.cur.seek(saved);
                None
            }
        }
    }

    fn start_tag(&mut self, start: usize) -> Option<Token> {
        let saved = self.cur.i;
        let tag = self.scan_start_tag(start);
        if tag.is_none() {
            self.cur.seek(saved);
        }
        tag.map(Token::StartTag)
    }

    fn scan_start_tag(&mut self, start: usize) -> Option<StartTag> {
        self.cur.bump();
        let name_start = self.cur.pos();
        self.cur
            .bump_while(|b| !b.is_ascii_whitespace() && b != b'/' && b != b'>');
        let name_span = Span::new(name_start, self.cur.pos());
        let name = name_span.slice(self.cur.s).to_ascii_lowercase();

        let mut attrs = Vec::new();
        // A stray slash is folded into whatever follows it, so the slash
        // survives in either the next attribute or the tail.
        let mut attr_start = self.cur.pos();
        loop {
            self.cur.bump_while(|b| b.is_ascii_whitespace());
            match self.cur.peek()? {
                b'>' => {
                    self.cur.bump();
                    return Some(StartTag {
                        name,
                        name_span,
                        attrs,
                        self_closing: false,
                        tail: Span::new(attr_start, self.cur.pos()),
                        span: Span::new(start, self.cur.pos()),
                    });
                }
                b'/' if self.cur.peek_at(1) == Some(b'>') => {
                    self.cur.bump_n(2);
                    return Some(StartTag {
                        name,
                        name_span,
                        attrs,
                        self_closing: true,
                        tail: Span::new(attr_start, self.cur.pos()),
                        span: Span::new(start, self.cur.pos()),
                    });
                }
                b'/' => {
                    self.cur.bump();
                }
                _ => {
                    attrs.push(self.scan_attribute(attr_start)?);
                    attr_start = self.cur.pos();
                }
            }
        }
    }

    fn scan_attribute(&mut self, attr_start: usize) -> Option<RawAttribute> {
        let name_start = self.cur.i;
        self.cur.bump();
        self.cur.bump_while(|b| {
            !b.is_ascii_whitespace() && b != b'=' && b != b'>' && b != b'/'
        });
        let name = self.cur.s[name_start..self.cur.i].to_ascii_lowercase();

        let before_eq = self.cur.i;
        self.cur.bump_while(|b| b.is_ascii_whitespace());
        if self.cur.peek() != Some(b'=') {
            self.cur.seek(before_eq);
            return Some(RawAttribute {
                name,
                value: None,
                span: Span::new(attr_start, self.cur.pos()),
            });
        }
        self.cur.bump();
        self.cur.bump_while(|b| b.is_ascii_whitespace());
        let value = match self.cur.peek()? {
            quote @ (b'"' | b'\'') => {
                self.cur.bump();
                let value_start = self.cur.i;
                let close = self.cur.find(if quote == b'"' { "\"" } else { "'" })?;
                self.cur.seek(close + 1);
                self.cur.s[value_start..close].to_string()
            }
            _ => {
                let value_start = self.cur.i;
                self.cur.bump_while(|b| !b.is_ascii_whitespace() && b != b'>');
                self.cur.s[value_start..self.cur.i].to_string()
            }
        };
        Some(RawAttribute {
            name,
            value: Some(value),
            span: Span::new(attr_start, self.cur.pos()),
        })
    }

    /// Local index where the raw text of element `name` ends.
    fn raw_text_end(&self, name: &str) -> usize {
        let bytes = self.cur.s.as_bytes();
        let mut i = self.cur.i;
        while let Some(rel) = self.cur.s.get(i..).and_then(|rest| rest.find("</")) {
            let at = i + rel;
            let name_end = at + 2 + name.len();
            let matches_name = bytes
                .get(at + 2..name_end)
                .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name.as_bytes()));
            let terminated = matches!(
                bytes.get(name_end),
                None | Some(b'>') | Some(b'/') | Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r')
            );
            if matches_name && terminated {
                return at;
            }
            i = at + 2;
        }
        self.cur.s.len()
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if let Some(name) = self.raw_text.take() {
            let start = self.cur.pos();
            let end = self.raw_text_end(&name);
            if end > self.cur.i {
                self.cur.seek(end);
                return Some(Token::Text(Span::new(start, self.cur.pos())));
            }
        }
        if self.cur.eof() {
            return None;
        }

        let start = self.cur.pos();
        if self.at_markup_start()
            && let Some(token) = self.markup_token()
        {
            if let Token::StartTag(tag) = &token
                && !tag.self_closing
                && tags::is_raw_text(&tag.name)
            {
                self.raw_text = Some(tag.name.clone());
            }
            return Some(token);
        }

        // Text runs to the next position that could start markup. The first
        // byte is always consumed so a lone `<` cannot stall the tokenizer.
        self.cur.bump();
        while !self.cur.eof() && !self.at_markup_start() {
            self.cur.bump();
        }
        Some(Token::Text(Span::new(start, self.cur.pos())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn concat(source: &str) -> String {
        Tokenizer::new(source)
            .map(|t| match t {
                Token::StartTag(tag) => tag.span.slice(source).to_string(),
                Token::EndTag { span, .. }
                | Token::Text(span)
                | Token::Comment(span)
                | Token::Doctype(span) => span.slice(source).to_string(),
            })
            .collect()
    }

    #[test]
    fn tokens_cover_every_byte() {
        let inputs = [
            "<!DOCTYPE html><p class=\"a\">Hi &amp; bye</p>",
            "<p>a < b</p><br/><img src=x.png alt='a > b'>",
            "<!-- note --><script>if (a<b) {}</script>tail",
            "<p>unterminated <b",
            "</><<>< p>",
            "caf\u{e9} <em>ok</em>",
        ];
        for input in inputs {
            assert_eq!(concat(input), input);
        }
    }

    #[test]
    fn start_tag_attributes() {
        let src = "<img src=\"a.png\" alt='x > y' hidden data-n=3/>";
        let Some(Token::StartTag(tag)) = Tokenizer::new(src).next() else {
            panic!("expected start tag");
        };
        assert_eq!(tag.name, "img");
        assert!(tag.self_closing);
        let names: Vec<_> = tag.attrs.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["src", "alt", "hidden", "data-n"]);
        assert_eq!(tag.attrs[1].value.as_deref(), Some("x > y"));
        assert_eq!(tag.attrs[2].value, None);
        assert_eq!(tag.attrs[0].span.slice(src), " src=\"a.png\"");
        assert_eq!(tag.tail.slice(src), "/>");
    }

    #[test]
    fn script_content_is_not_tokenized() {
        let src = "<script>let s = \"<p>not a tag</p>\";</script><p>x</p>";
        let tokens: Vec<_> = Tokenizer::new(src).collect();
        assert!(matches!(&tokens[0], Token::StartTag(t) if t.name == "script"));
        assert!(matches!(tokens[1], Token::Text(span) if span.slice(src).contains("<p>not a tag</p>")));
        assert!(matches!(&tokens[2], Token::EndTag { name, .. } if name == "script"));
        assert!(matches!(&tokens[3], Token::StartTag(t) if t.name == "p"));
    }

    #[test]
    fn doctype_is_case_insensitive() {
        let src = "<!doctype html>";
        assert!(matches!(Tokenizer::new(src).next(), Some(Token::Doctype(_))));
    }

    #[test]
    fn unterminated_tag_becomes_text() {
        let src = "<p>x <b";
        let tokens: Vec<_> = Tokenizer::new(src).collect();
        assert!(matches!(tokens.last(), Some(Token::Text(span)) if span.slice(src) == "<b"));
    }
}
