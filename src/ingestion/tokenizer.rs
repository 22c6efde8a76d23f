//! Line splitting and field tokenizing.
//!
//! Fields are returned as [`FieldSpan`]s that borrow from the source line whenever possible.
//! Only quoted fields containing doubled quotes (`""`) need an owned, decoded string.
//!
//! Rules:
//!
//! - A quote character opens quoted mode only as the very first character of a field.
//! - Inside quotes, `""` decodes to one literal quote and a lone quote closes the field.
//!   Anything after the closing quote up to the next delimiter is ignored.
//! - An empty line has zero fields; a line ending in a delimiter has a trailing empty field.
//! - Line breaks never occur inside a field.

use std::borrow::Cow;

use thiserror::Error;

/// One physical line of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1-based line number.
    pub number: usize,
    /// Byte offset of the first character of the line in the input.
    pub offset: usize,
    /// Line text without its terminator.
    pub text: &'a str,
}

/// Iterator over the lines of a buffer, recognizing `\n`, `\r\n` and a final unterminated line.
#[derive(Debug, Clone)]
pub struct Lines<'a> {
    input: &'a str,
    pos: usize,
    number: usize,
}

/// Split `input` into [`Line`]s.
pub fn lines(input: &str) -> Lines<'_> {
    Lines {
        input,
        pos: 0,
        number: 0,
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Line<'a>> {
        if self.pos >= self.input.len() {
            return None;
        }
        let rest = &self.input[self.pos..];
        let (raw, consumed) = match rest.find('\n') {
            Some(nl) => (&rest[..nl], nl + 1),
            None => (rest, rest.len()),
        };
        let text = raw.strip_suffix('\r').unwrap_or(raw);

        self.number += 1;
        let line = Line {
            number: self.number,
            offset: self.pos,
            text,
        };
        self.pos += consumed;
        Some(line)
    }
}

/// A quoted field reached the end of its line without a closing quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unterminated quoted field starting at byte {offset}")]
pub struct UnterminatedQuote {
    /// Byte offset of the opening quote within the line.
    pub offset: usize,
}

/// One delimiter-separated segment of a line.
///
/// `start`/`len` locate the raw content in the source line, excluding the delimiter and any
/// surrounding quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpan<'a> {
    /// Byte offset of the content within the line.
    pub start: usize,
    /// Byte length of the raw content within the line.
    pub len: usize,
    /// Whether the field was enclosed in quotes.
    pub quoted: bool,
    text: Cow<'a, str>,
}

impl<'a> FieldSpan<'a> {
    fn borrowed(line: &'a str, start: usize, end: usize, quoted: bool) -> Self {
        Self {
            start,
            len: end - start,
            quoted,
            text: Cow::Borrowed(&line[start..end]),
        }
    }

    /// Decoded field text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// `true` if de-escaping forced an owned copy.
    pub fn is_owned(&self) -> bool {
        matches!(self.text, Cow::Owned(_))
    }

    /// Take the decoded text.
    pub fn into_text(self) -> Cow<'a, str> {
        self.text
    }
}

/// Splits single lines into [`FieldSpan`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tokenizer {
    delimiter: char,
    quote: char,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(',')
    }
}

impl Tokenizer {
    /// Tokenizer for `delimiter` with the standard `"` quote.
    pub fn new(delimiter: char) -> Self {
        Self {
            delimiter,
            quote: '"',
        }
    }

    /// Use a different quote character.
    pub fn with_quote(mut self, quote: char) -> Self {
        self.quote = quote;
        self
    }

    /// Tokenize one line (without its terminator).
    pub fn tokenize<'a>(&self, line: &'a str) -> Result<Vec<FieldSpan<'a>>, UnterminatedQuote> {
        let mut fields = Vec::new();
        if line.is_empty() {
            return Ok(fields);
        }

        let mut pos = 0;
        loop {
            let rest = &line[pos..];
            if rest.starts_with(self.quote) {
                let (span, next) = self.scan_quoted(line, pos)?;
                fields.push(span);
                pos = next;
            } else {
                let end = rest.find(self.delimiter).map_or(line.len(), |i| pos + i);
                fields.push(FieldSpan::borrowed(line, pos, end, false));
                pos = end;
            }

            // `pos` now sits on a delimiter or at the end of the line.
            if pos >= line.len() {
                break;
            }
            pos += self.delimiter.len_utf8();
        }
        Ok(fields)
    }

    /// Scan a quoted field whose opening quote is at `open`.
    ///
    /// Returns the span and the offset of the delimiter that ends it (or the line length).
    fn scan_quoted<'a>(
        &self,
        line: &'a str,
        open: usize,
    ) -> Result<(FieldSpan<'a>, usize), UnterminatedQuote> {
        let q = self.quote.len_utf8();
        let content_start = open + q;
        let mut decoded: Option<String> = None;
        let mut segment_start = content_start;

        let mut chars = line[content_start..].char_indices().peekable();
        while let Some((rel, c)) = chars.next() {
            if c != self.quote {
                continue;
            }
            let at = content_start + rel;
            if matches!(chars.peek(), Some(&(_, next)) if next == self.quote) {
                // `""` -> one literal quote
                let buf = decoded.get_or_insert_with(String::new);
                buf.push_str(&line[segment_start..at + q]);
                chars.next();
                segment_start = at + 2 * q;
                continue;
            }

            let text = match decoded {
                Some(mut buf) => {
                    buf.push_str(&line[segment_start..at]);
                    Cow::Owned(buf)
                }
                None => Cow::Borrowed(&line[content_start..at]),
            };
            let after = at + q;
            let next = line[after..]
                .find(self.delimiter)
                .map_or(line.len(), |i| after + i);
            let span = FieldSpan {
                start: content_start,
                len: at - content_start,
                quoted: true,
                text,
            };
            return Ok((span, next));
        }

        Err(UnterminatedQuote { offset: open })
    }
}
