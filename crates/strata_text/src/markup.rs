//! Inline style markup
//!
//! Text content may carry style directives in square brackets:
//!
//! ```text
//! [bold #ff0000]warning[/] plain [font-size: 20px underline]big[/]
//! ```
//!
//! - `[...]` opens a style, `[/]` (or `[/anything]`) closes the innermost one
//! - `[[` and `]]` produce literal brackets
//! - with [`MarkupOptions::quoted_literals`], text between single quotes is
//!   taken verbatim and `''` inside it is an escaped quote
//!
//! Unknown bare words inside a directive are rejected; unknown `key: value`
//! pairs pass through as [`Directive::Property`].

use strata_core::Color;

use crate::style::{BaselineShift, FontStyle, FontWeight, TextAlign};
use crate::{Result, TextError};

/// Tokenizer switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkupOptions {
    /// Treat `'...'` spans as literal text
    pub quoted_literals: bool,
}

/// Weight change requested by a directive
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightChange {
    Absolute(FontWeight),
    Bolder,
    Lighter,
}

/// One style change inside a `[...]` tag
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Weight(WeightChange),
    Style(FontStyle),
    Underline,
    LineThrough,
    NoDecoration,
    Color(Color),
    FontSize(f32),
    FontFamily(String),
    BaselineShift(BaselineShift),
    /// Fixed chunk width in pixels
    Width(f32),
    /// Alignment inside a fixed-width chunk
    Align(TextAlign),
    Property(String, String),
}

/// Token of one markup line
#[derive(Debug, Clone, PartialEq)]
pub enum MarkupToken {
    Text(String),
    Open(Vec<Directive>),
    Close,
}

/// Split `input` into lines and tokenize each one
pub fn parse_markup(input: &str, options: &MarkupOptions) -> Result<Vec<Vec<MarkupToken>>> {
    input
        .split('\n')
        .map(|line| Parser::new(line.strip_suffix('\r').unwrap_or(line), *options).parse())
        .collect()
}

/// Strip markup, keeping only the literal text of each line
pub fn plain_text(input: &str, options: &MarkupOptions) -> Result<String> {
    let lines = parse_markup(input, options)?;
    let mut out = String::with_capacity(input.len());
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for token in line {
            if let MarkupToken::Text(t) = token {
                out.push_str(t);
            }
        }
    }
    Ok(out)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    options: MarkupOptions,
    buffer: String,
    tokens: Vec<MarkupToken>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, options: MarkupOptions) -> Self {
        Self {
            input,
            pos: 0,
            options,
            buffer: String::new(),
            tokens: Vec::new(),
        }
    }

    fn parse(mut self) -> Result<Vec<MarkupToken>> {
        while let Some(ch) = self.peek() {
            match ch {
                '[' if self.peek_at(1) == Some('[') => {
                    self.buffer.push('[');
                    self.pos += 2;
                }
                ']' if self.peek_at(1) == Some(']') => {
                    self.buffer.push(']');
                    self.pos += 2;
                }
                '[' => match self.input[self.pos + 1..].find(']') {
                    Some(end) => {
                        let content = &self.input[self.pos + 1..self.pos + 1 + end];
                        self.pos += end + 2;
                        self.flush();
                        let token = if content.trim_start().starts_with('/') {
                            MarkupToken::Close
                        } else {
                            MarkupToken::Open(parse_directives(content)?)
                        };
                        self.tokens.push(token);
                    }
                    None => {
                        // Unterminated tag reads as text
                        self.buffer.push('[');
                        self.pos += 1;
                    }
                },
                '\'' if self.options.quoted_literals => self.quoted(),
                _ => {
                    self.buffer.push(ch);
                    self.pos += ch.len_utf8();
                }
            }
        }
        self.flush();
        Ok(self.tokens)
    }

    fn quoted(&mut self) {
        self.pos += 1;
        while let Some(ch) = self.peek() {
            if ch == '\'' {
                if self.peek_at(1) == Some('\'') {
                    self.buffer.push('\'');
                    self.pos += 2;
                    continue;
                }
                self.pos += 1;
                return;
            }
            self.buffer.push(ch);
            self.pos += ch.len_utf8();
        }
    }

    fn flush(&mut self) {
        if !self.buffer.is_empty() {
            self.tokens
                .push(MarkupToken::Text(std::mem::take(&mut self.buffer)));
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(n)
    }
}

/// Split directive content on whitespace outside parentheses and quotes
fn split_words(content: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start: Option<usize> = None;
    for (i, ch) in content.char_indices() {
        match ch {
            '"' | '\'' if quote == Some(ch) => quote = None,
            '"' | '\'' if quote.is_none() => quote = Some(ch),
            '(' if quote.is_none() => depth += 1,
            ')' if quote.is_none() => depth -= 1,
            c if c.is_whitespace() && depth <= 0 && quote.is_none() => {
                if let Some(s) = start.take() {
                    words.push(&content[s..i]);
                }
                continue;
            }
            _ => {}
        }
        if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        words.push(&content[s..]);
    }
    words
}

fn parse_directives(content: &str) -> Result<Vec<Directive>> {
    let words = split_words(content);
    let mut directives = Vec::new();
    let mut i = 0;
    while i < words.len() {
        let word = words[i];
        i += 1;
        let is_color_fn = word.starts_with("rgb") && word.contains('(');
        match word.find(':') {
            Some(colon) if !is_color_fn => {
                let key = word[..colon].trim().to_ascii_lowercase();
                let mut value = word[colon + 1..].trim();
                if value.is_empty() && i < words.len() {
                    value = words[i];
                    i += 1;
                }
                directives.push(parse_property(&key, value)?);
            }
            _ => keyword(word, &mut directives)?,
        }
    }
    Ok(directives)
}

fn keyword(word: &str, out: &mut Vec<Directive>) -> Result<()> {
    let lower = word.to_ascii_lowercase();
    let directive = match lower.as_str() {
        "bold" => Directive::Weight(WeightChange::Absolute(FontWeight::Bold)),
        "bolder" => Directive::Weight(WeightChange::Bolder),
        "lighter" => Directive::Weight(WeightChange::Lighter),
        "normal" => {
            out.push(Directive::Weight(WeightChange::Absolute(FontWeight::Regular)));
            Directive::Style(FontStyle::Normal)
        }
        "italic" => Directive::Style(FontStyle::Italic),
        "oblique" => Directive::Style(FontStyle::Oblique),
        "underline" => Directive::Underline,
        "line-through" | "strikethrough" => Directive::LineThrough,
        "super" | "sup" => Directive::BaselineShift(BaselineShift::Super),
        "sub" => Directive::BaselineShift(BaselineShift::Sub),
        _ => {
            if let Ok(n) = lower.parse::<u16>() {
                if (100..=900).contains(&n) && n % 100 == 0 {
                    out.push(Directive::Weight(WeightChange::Absolute(FontWeight::from_number(n))));
                    return Ok(());
                }
            }
            if Color::is_color_token(word) {
                return color(word).map(|c| out.push(Directive::Color(c)));
            }
            return Err(TextError::UnknownDirective(word.to_string()));
        }
    };
    out.push(directive);
    Ok(())
}

fn invalid(key: &str, value: &str) -> TextError {
    TextError::InvalidDirectiveValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn color(value: &str) -> Result<Color> {
    Color::parse(value).map_err(|_| invalid("color", value))
}

fn pixels(key: &str, value: &str) -> Result<f32> {
    let v = value.trim();
    v.strip_suffix("px")
        .unwrap_or(v)
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| invalid(key, value))
}

fn unquote(value: &str) -> &str {
    let v = value.trim();
    for q in ['"', '\''] {
        if let Some(inner) = v.strip_prefix(q).and_then(|s| s.strip_suffix(q)) {
            return inner;
        }
    }
    v
}

fn parse_property(key: &str, value: &str) -> Result<Directive> {
    let lower = value.trim().to_ascii_lowercase();
    Ok(match key {
        "font-size" | "fontsize" => {
            let size = pixels(key, value)?;
            if size <= 0.0 {
                return Err(invalid(key, value));
            }
            Directive::FontSize(size)
        }
        "font-family" => Directive::FontFamily(unquote(value).to_string()),
        "font-weight" => match lower.as_str() {
            "bold" => Directive::Weight(WeightChange::Absolute(FontWeight::Bold)),
            "bolder" => Directive::Weight(WeightChange::Bolder),
            "lighter" => Directive::Weight(WeightChange::Lighter),
            "normal" => Directive::Weight(WeightChange::Absolute(FontWeight::Regular)),
            n => n
                .parse::<u16>()
                .map(|w| Directive::Weight(WeightChange::Absolute(FontWeight::from_number(w))))
                .map_err(|_| invalid(key, value))?,
        },
        "font-style" => match lower.as_str() {
            "italic" => Directive::Style(FontStyle::Italic),
            "oblique" => Directive::Style(FontStyle::Oblique),
            "normal" => Directive::Style(FontStyle::Normal),
            _ => return Err(invalid(key, value)),
        },
        "color" | "fill" => Directive::Color(color(value)?),
        "text-decoration" => match lower.as_str() {
            "underline" => Directive::Underline,
            "line-through" => Directive::LineThrough,
            "none" => Directive::NoDecoration,
            _ => return Err(invalid(key, value)),
        },
        "baseline-shift" | "vertical-align" => match lower.as_str() {
            "super" | "sup" => Directive::BaselineShift(BaselineShift::Super),
            "sub" => Directive::BaselineShift(BaselineShift::Sub),
            "baseline" | "none" => Directive::BaselineShift(BaselineShift::None),
            _ => Directive::BaselineShift(BaselineShift::Pixels(pixels(key, value)?)),
        },
        "width" => Directive::Width(pixels(key, value)?.max(0.0)),
        "text-align" => Directive::Align(lower.parse().map_err(|_| invalid(key, value))?),
        _ => Directive::Property(key.to_string(), unquote(value).to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(input: &str) -> Vec<MarkupToken> {
        let mut lines = parse_markup(input, &MarkupOptions::default()).unwrap();
        assert_eq!(lines.len(), 1);
        lines.remove(0)
    }

    #[test]
    fn test_bold_chunk() {
        let tokens = parse_one("[bold]Hi[/] there");
        assert_eq!(
            tokens,
            vec![
                MarkupToken::Open(vec![Directive::Weight(WeightChange::Absolute(FontWeight::Bold))]),
                MarkupToken::Text("Hi".into()),
                MarkupToken::Close,
                MarkupToken::Text(" there".into()),
            ]
        );
    }

    #[test]
    fn test_escaped_brackets() {
        let tokens = parse_one("a [[b]] c");
        assert_eq!(tokens, vec![MarkupToken::Text("a [b] c".into())]);
    }

    #[test]
    fn test_directive_grammar() {
        let tokens = parse_one("[bold #ff0000 underline font-size: 20px width:100 data-x: y]t[/]");
        let MarkupToken::Open(directives) = &tokens[0] else {
            panic!("expected open tag");
        };
        assert_eq!(
            directives,
            &vec![
                Directive::Weight(WeightChange::Absolute(FontWeight::Bold)),
                Directive::Color(Color::from_hex(0xff0000)),
                Directive::Underline,
                Directive::FontSize(20.0),
                Directive::Width(100.0),
                Directive::Property("data-x".into(), "y".into()),
            ]
        );
    }

    #[test]
    fn test_color_functions_keep_spaces() {
        let tokens = parse_one("[rgb(0, 0, 255) 600]x[/]");
        let MarkupToken::Open(directives) = &tokens[0] else {
            panic!("expected open tag");
        };
        assert_eq!(directives[0], Directive::Color(Color::from_hex(0x0000ff)));
        assert_eq!(
            directives[1],
            Directive::Weight(WeightChange::Absolute(FontWeight::SemiBold))
        );
    }

    #[test]
    fn test_unknown_directive_is_error() {
        let err = parse_markup("[sparkly]x[/]", &MarkupOptions::default()).unwrap_err();
        assert_eq!(err, TextError::UnknownDirective("sparkly".into()));
        assert!(parse_markup("[font-size: big]x", &MarkupOptions::default()).is_err());
        assert!(parse_markup("[#12345]x", &MarkupOptions::default()).is_err());
    }

    #[test]
    fn test_quoted_literals() {
        let options = MarkupOptions {
            quoted_literals: true,
        };
        let lines = parse_markup("'[not a tag] it''s' ok", &options).unwrap();
        assert_eq!(lines[0], vec![MarkupToken::Text("[not a tag] it's ok".into())]);

        let lines = parse_markup("don't", &MarkupOptions::default()).unwrap();
        assert_eq!(lines[0], vec![MarkupToken::Text("don't".into())]);
    }

    #[test]
    fn test_lines_and_unterminated_tag() {
        let lines = parse_markup("one\r\ntwo [x", &MarkupOptions::default()).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], vec![MarkupToken::Text("one".into())]);
        assert_eq!(lines[1], vec![MarkupToken::Text("two [x".into())]);
    }

    #[test]
    fn test_plain_text() {
        let text = plain_text("[bold]a[/]b\n[[c]]", &MarkupOptions::default()).unwrap();
        assert_eq!(text, "ab\n[c]");
    }
}
