//! Minimal single-pass streaming JSON walker
//!
//! The import side of this SDK reconstructs records from a linear stream of
//! `(name, token)` events rather than from a document tree: the walker scans
//! the input once, with no lookahead, and invokes a callback for every
//! token it encounters. All state needed to detect "a new array entry just
//! started" lives in the callbacks, which recover it from the recurrence of
//! already-populated fields.
//!
//! Only the subset of JSON these record shapes use is supported: objects,
//! arrays, strings, numbers, booleans and null. The event contract the
//! importers rely on:
//!
//! - An array-start event carries the key the array appeared under as its
//!   `name`; array-end events carry an empty name.
//! - Values that are direct members of an object carry their key; array
//!   elements carry an empty name and a `path` ending in `[i]`, which is
//!   how importers recognize "string inside an array" without lookahead.

use core::fmt::Write as _;

use crate::error::{Error, Result};

/// A single token produced by [`walk`].
#[derive(Debug, Clone, PartialEq)]
pub enum JsonToken {
    /// `{` — an object begins.
    ObjectStart,
    /// `}` — the current object ends.
    ObjectEnd,
    /// `[` — an array begins.
    ArrayStart,
    /// `]` — the current array ends.
    ArrayEnd,
    /// A string value, unescaped.
    Str(String),
    /// A number value, carried as its raw literal text so the consumer can
    /// pick a representation (the importers classify on the presence of a
    /// decimal point).
    Number(String),
    /// `true` or `false`.
    Bool(bool),
    /// `null`.
    Null,
}

/// One callback invocation's worth of context.
#[derive(Debug)]
pub struct JsonEvent<'a> {
    /// Key the token appeared under; empty for array elements and for
    /// object/array end tokens.
    pub name: &'a str,
    /// Dotted path from the document root, e.g. `.connections[0].warnings[1]`.
    pub path: &'a str,
    /// The token itself.
    pub token: JsonToken,
}

/// Walk `input` as a JSON object, invoking `callback` for every token.
///
/// The document must be a single top-level object; anything else (or any
/// malformed construct) fails with [`Error::InvalidFormat`]. The callback
/// is infallible — a parse either completes over the full token stream or
/// the error is structural.
pub fn walk<F>(input: &str, mut callback: F) -> Result<()>
where
    F: FnMut(&JsonEvent<'_>),
{
    let mut walker = Walker {
        input,
        pos: 0,
        path: String::new(),
    };
    walker.skip_whitespace();
    if walker.peek() != Some('{') {
        return Err(Error::InvalidFormat);
    }
    walker.walk_object("", &mut callback)?;
    walker.skip_whitespace();
    if walker.pos != walker.input.len() {
        return Err(Error::InvalidFormat);
    }
    Ok(())
}

struct Walker<'a> {
    input: &'a str,
    pos: usize,
    path: String,
}

impl<'a> Walker<'a> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn expect(&mut self, wanted: char) -> Result<()> {
        if self.bump() == Some(wanted) {
            Ok(())
        } else {
            Err(Error::InvalidFormat)
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c == ' ' || c == '\t' || c == '\n' || c == '\r' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn emit<F>(&self, name: &str, token: JsonToken, callback: &mut F)
    where
        F: FnMut(&JsonEvent<'_>),
    {
        callback(&JsonEvent {
            name,
            path: &self.path,
            token,
        });
    }

    fn walk_value<F>(&mut self, name: &str, callback: &mut F) -> Result<()>
    where
        F: FnMut(&JsonEvent<'_>),
    {
        self.skip_whitespace();
        match self.peek().ok_or(Error::InvalidFormat)? {
            '{' => self.walk_object(name, callback),
            '[' => self.walk_array(name, callback),
            '"' => {
                let value = self.parse_string()?;
                self.emit(name, JsonToken::Str(value), callback);
                Ok(())
            }
            't' => {
                self.expect_literal("true")?;
                self.emit(name, JsonToken::Bool(true), callback);
                Ok(())
            }
            'f' => {
                self.expect_literal("false")?;
                self.emit(name, JsonToken::Bool(false), callback);
                Ok(())
            }
            'n' => {
                self.expect_literal("null")?;
                self.emit(name, JsonToken::Null, callback);
                Ok(())
            }
            _ => {
                let text = self.parse_number_text()?;
                self.emit(name, JsonToken::Number(text), callback);
                Ok(())
            }
        }
    }

    fn walk_object<F>(&mut self, name: &str, callback: &mut F) -> Result<()>
    where
        F: FnMut(&JsonEvent<'_>),
    {
        self.expect('{')?;
        self.emit(name, JsonToken::ObjectStart, callback);
        self.skip_whitespace();
        if self.peek() == Some('}') {
            self.pos += 1;
            self.emit("", JsonToken::ObjectEnd, callback);
            return Ok(());
        }
        loop {
            self.skip_whitespace();
            let key = self.parse_string()?;
            self.skip_whitespace();
            self.expect(':')?;

            let saved = self.path.len();
            self.path.push('.');
            self.path.push_str(&key);
            self.walk_value(&key, callback)?;
            self.path.truncate(saved);

            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some('}') => break,
                _ => return Err(Error::InvalidFormat),
            }
        }
        self.emit("", JsonToken::ObjectEnd, callback);
        Ok(())
    }

    fn walk_array<F>(&mut self, name: &str, callback: &mut F) -> Result<()>
    where
        F: FnMut(&JsonEvent<'_>),
    {
        self.expect('[')?;
        self.emit(name, JsonToken::ArrayStart, callback);
        self.skip_whitespace();
        if self.peek() == Some(']') {
            self.pos += 1;
            self.emit("", JsonToken::ArrayEnd, callback);
            return Ok(());
        }
        let mut index = 0usize;
        loop {
            let saved = self.path.len();
            let _ = write!(self.path, "[{index}]");
            self.walk_value("", callback)?;
            self.path.truncate(saved);

            self.skip_whitespace();
            match self.bump() {
                Some(',') => {
                    index += 1;
                    continue;
                }
                Some(']') => break,
                _ => return Err(Error::InvalidFormat),
            }
        }
        self.emit("", JsonToken::ArrayEnd, callback);
        Ok(())
    }

    fn expect_literal(&mut self, literal: &str) -> Result<()> {
        if self.input[self.pos..].starts_with(literal) {
            self.pos += literal.len();
            Ok(())
        } else {
            Err(Error::InvalidFormat)
        }
    }

    fn parse_string(&mut self) -> Result<String> {
        self.expect('"')?;
        let mut out = String::new();
        loop {
            match self.bump().ok_or(Error::InvalidFormat)? {
                '"' => return Ok(out),
                '\\' => match self.bump().ok_or(Error::InvalidFormat)? {
                    '"' => out.push('"'),
                    '\\' => out.push('\\'),
                    '/' => out.push('/'),
                    'b' => out.push('\u{0008}'),
                    'f' => out.push('\u{000C}'),
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    't' => out.push('\t'),
                    'u' => {
                        let end = self.pos.checked_add(4).ok_or(Error::InvalidFormat)?;
                        let hex = self.input.get(self.pos..end).ok_or(Error::InvalidFormat)?;
                        let code =
                            u32::from_str_radix(hex, 16).map_err(|_| Error::InvalidFormat)?;
                        self.pos = end;
                        out.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
                    }
                    _ => return Err(Error::InvalidFormat),
                },
                c => out.push(c),
            }
        }
    }

    fn parse_number_text(&mut self) -> Result<String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E') {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = &self.input[start..self.pos];
        if text.is_empty() || text == "-" {
            return Err(Error::InvalidFormat);
        }
        Ok(text.to_string())
    }
}

/// Append `text` to `out` as a quoted JSON string, escaping as needed.
pub(crate) fn write_json_string(out: &mut String, text: &str) {
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(input: &str) -> Vec<(String, String, JsonToken)> {
        let mut events = Vec::new();
        walk(input, |ev| {
            events.push((ev.name.to_string(), ev.path.to_string(), ev.token.clone()));
        })
        .unwrap();
        events
    }

    #[test]
    fn scalar_members_carry_their_key() {
        let events = collect(r#"{"a":1,"b":"x","c":true,"d":null}"#);
        assert_eq!(
            events[1],
            (
                "a".to_string(),
                ".a".to_string(),
                JsonToken::Number("1".to_string())
            )
        );
        assert_eq!(
            events[2],
            (
                "b".to_string(),
                ".b".to_string(),
                JsonToken::Str("x".to_string())
            )
        );
        assert_eq!(
            events[3],
            ("c".to_string(), ".c".to_string(), JsonToken::Bool(true))
        );
        assert_eq!(
            events[4],
            ("d".to_string(), ".d".to_string(), JsonToken::Null)
        );
    }

    #[test]
    fn array_start_carries_key_and_elements_do_not() {
        let events = collect(r#"{"value":[222,173]}"#);
        assert_eq!(
            events[1],
            (
                "value".to_string(),
                ".value".to_string(),
                JsonToken::ArrayStart
            )
        );
        assert_eq!(
            events[2],
            (
                "".to_string(),
                ".value[0]".to_string(),
                JsonToken::Number("222".to_string())
            )
        );
        assert_eq!(
            events[3],
            (
                "".to_string(),
                ".value[1]".to_string(),
                JsonToken::Number("173".to_string())
            )
        );
        assert_eq!(
            events[4],
            ("".to_string(), ".value".to_string(), JsonToken::ArrayEnd)
        );
    }

    #[test]
    fn nested_object_array_paths() {
        let events = collect(r#"{"connections":[{"comms_type":"iridium"}]}"#);
        let comms = events
            .iter()
            .find(|(name, _, _)| name == "comms_type")
            .unwrap();
        assert_eq!(comms.1, ".connections[0].comms_type");

        let strings_in_arrays: Vec<_> = events
            .iter()
            .filter(|(_, path, token)| {
                matches!(token, JsonToken::Str(_)) && path.ends_with(']')
            })
            .collect();
        assert!(strings_in_arrays.is_empty());
    }

    #[test]
    fn strings_inside_arrays_have_bracketed_paths() {
        let events = collect(r#"{"warnings":["low battery","late start"]}"#);
        let inside: Vec<_> = events
            .iter()
            .filter(|(_, path, token)| {
                matches!(token, JsonToken::Str(_)) && path.ends_with(']')
            })
            .collect();
        assert_eq!(inside.len(), 2);
    }

    #[test]
    fn string_escapes_are_decoded() {
        let events = collect(r#"{"a":"line\nbreak \"quoted\" A"}"#);
        assert_eq!(
            events[1].2,
            JsonToken::Str("line\nbreak \"quoted\" A".to_string())
        );
    }

    #[test]
    fn empty_containers() {
        let events = collect(r#"{"value":[],"inner":{}}"#);
        assert_eq!(events[1].2, JsonToken::ArrayStart);
        assert_eq!(events[2].2, JsonToken::ArrayEnd);
        assert_eq!(events[3].2, JsonToken::ObjectStart);
        assert_eq!(events[4].2, JsonToken::ObjectEnd);
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert_eq!(walk("[1,2]", |_| {}), Err(Error::InvalidFormat));
        assert_eq!(walk(r#"{"a":}"#, |_| {}), Err(Error::InvalidFormat));
        assert_eq!(walk(r#"{"a":1"#, |_| {}), Err(Error::InvalidFormat));
        assert_eq!(walk(r#"{"a":1} trailing"#, |_| {}), Err(Error::InvalidFormat));
    }
}
