//! Parameter identifier/value pairs
//!
//! A [`Param`] is the atomic payload unit of [`Config`](super::Config) and
//! [`General`](super::General) messages: one identifier (textual or numeric
//! key) paired with one polymorphic value. Writers classify the value
//! explicitly by constructing the variant; the import side infers a
//! deliberately narrow set of variants from JSON token shapes.

use crate::json::{self, JsonToken};
use crate::time::leading_i64;
use core::fmt::Write as _;

/// Identifier half of a parameter: either a textual or a numeric key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamId {
    /// Textual key, serialized as a quoted string.
    Str(String),
    /// Numeric key, serialized as a bare integer.
    Num(u32),
}

impl From<&str> for ParamId {
    fn from(id: &str) -> Self {
        ParamId::Str(id.to_string())
    }
}

impl From<String> for ParamId {
    fn from(id: String) -> Self {
        ParamId::Str(id)
    }
}

impl From<u32> for ParamId {
    fn from(id: u32) -> Self {
        ParamId::Num(id)
    }
}

/// Value half of a parameter. Exactly one variant is active at a time,
/// independently of the identifier kind.
///
/// Import only ever produces `Bool`, `Int64`, `Float64`, `Str` and `Bytes`;
/// `UInt64` and `Float32` arise solely from programmatic construction.
/// This asymmetry is part of the on-disk contract, not an oversight.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Boolean value.
    Bool(bool),
    /// Signed 64-bit integer.
    Int64(i64),
    /// Unsigned 64-bit integer (programmatic construction only).
    UInt64(u64),
    /// Single-precision float (programmatic construction only).
    Float32(f32),
    /// Double-precision float.
    Float64(f64),
    /// Owned text.
    Str(String),
    /// Owned byte sequence, serialized as an array of byte literals.
    Bytes(Vec<u8>),
}

/// One identifier/value pair.
///
/// Either half may be absent: the import codec fills the two halves from
/// independent events, and "this half is already populated" is exactly the
/// signal it uses to detect that a new array entry has started.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Param {
    /// Parameter identifier, if populated.
    pub id: Option<ParamId>,
    /// Parameter value, if populated.
    pub value: Option<ParamValue>,
}

impl Param {
    /// Build a fully-populated parameter.
    pub fn new(id: impl Into<ParamId>, value: ParamValue) -> Self {
        Param {
            id: Some(id.into()),
            value: Some(value),
        }
    }
}

/// Append the JSON members for `param` to `out`.
///
/// Renders `\t"identifier":<id>,\n\t"value":<value>` without surrounding
/// braces; absent halves are skipped. An empty byte sequence is rendered
/// as the literal `[]`.
pub(crate) fn write_param(out: &mut String, param: &Param) {
    let mut first = true;
    if let Some(id) = &param.id {
        out.push_str("\t\"identifier\":");
        match id {
            ParamId::Str(text) => json::write_json_string(out, text),
            ParamId::Num(number) => {
                let _ = write!(out, "{number}");
            }
        }
        first = false;
    }
    if let Some(value) = &param.value {
        if !first {
            out.push_str(",\n");
        }
        out.push_str("\t\"value\":");
        match value {
            ParamValue::Bool(true) => out.push_str("true"),
            ParamValue::Bool(false) => out.push_str("false"),
            ParamValue::Int64(v) => {
                let _ = write!(out, "{v}");
            }
            ParamValue::UInt64(v) => {
                let _ = write!(out, "{v}");
            }
            ParamValue::Float32(v) => {
                let _ = write!(out, "{v:.6}");
            }
            ParamValue::Float64(v) => {
                let _ = write!(out, "{v:.6}");
            }
            ParamValue::Str(text) => json::write_json_string(out, text),
            ParamValue::Bytes(bytes) if bytes.is_empty() => out.push_str("[]"),
            ParamValue::Bytes(bytes) => {
                out.push('[');
                for (i, byte) in bytes.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    let _ = write!(out, "{byte}");
                }
                out.push(']');
            }
        }
    }
}

/// Streaming parse state for one param-bearing import.
///
/// Byte arrays arrive as an array-start token followed by a run of number
/// tokens; the flag below is what tells those numbers apart from fresh
/// scalar values. One parser instance belongs to exactly one import, so
/// the state cannot leak between unrelated files.
#[derive(Debug, Default)]
pub(crate) struct ParamParser {
    in_byte_array: bool,
}

impl ParamParser {
    /// Fill the identifier half of `param` from a JSON token.
    ///
    /// A string token yields a textual key, a number token a numeric key;
    /// anything else leaves the identifier untouched.
    pub(crate) fn parse_identifier(param: &mut Param, token: &JsonToken) {
        match token {
            JsonToken::Str(text) => param.id = Some(ParamId::Str(text.clone())),
            JsonToken::Number(text) => param.id = Some(ParamId::Num(leading_i64(text) as u32)),
            _ => {}
        }
    }

    /// Close any byte-array accumulation in progress.
    ///
    /// Importers route every array-end token they do not otherwise consume
    /// here; when no byte array is open this is a no-op (e.g. the end of
    /// an enclosing array).
    pub(crate) fn finish_array(&mut self) {
        self.in_byte_array = false;
    }

    /// Fill (or extend) the value half of `param` from a JSON token.
    ///
    /// Classification is intentionally narrow: string => `Str`; array
    /// start => begin `Bytes` accumulation; number => `Float64` when the
    /// literal contains a decimal point, else `Int64`; `true`/`false` =>
    /// `Bool`. While a byte array is open, number tokens append bytes and
    /// the array-end token closes the accumulation.
    pub(crate) fn parse_value(&mut self, param: &mut Param, token: &JsonToken) {
        if self.in_byte_array {
            match token {
                JsonToken::Number(text) => {
                    if let Some(ParamValue::Bytes(bytes)) = &mut param.value {
                        bytes.push(leading_i64(text) as u8);
                    }
                }
                JsonToken::ArrayEnd => self.in_byte_array = false,
                _ => {}
            }
            return;
        }

        match token {
            JsonToken::Str(text) => param.value = Some(ParamValue::Str(text.clone())),
            JsonToken::ArrayStart => {
                param.value = Some(ParamValue::Bytes(Vec::new()));
                self.in_byte_array = true;
            }
            JsonToken::Number(text) => {
                if text.contains('.') {
                    param.value = Some(ParamValue::Float64(text.parse().unwrap_or(0.0)));
                } else {
                    param.value = Some(ParamValue::Int64(leading_i64(text)));
                }
            }
            JsonToken::Bool(b) => param.value = Some(ParamValue::Bool(*b)),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_classification_from_tokens() {
        let mut parser = ParamParser::default();
        let mut param = Param::default();

        parser.parse_value(&mut param, &JsonToken::Number("42".to_string()));
        assert_eq!(param.value, Some(ParamValue::Int64(42)));

        parser.parse_value(&mut param, &JsonToken::Number("42.5".to_string()));
        assert_eq!(param.value, Some(ParamValue::Float64(42.5)));

        parser.parse_value(&mut param, &JsonToken::Str("on".to_string()));
        assert_eq!(param.value, Some(ParamValue::Str("on".to_string())));

        parser.parse_value(&mut param, &JsonToken::Bool(false));
        assert_eq!(param.value, Some(ParamValue::Bool(false)));
    }

    #[test]
    fn byte_array_accumulation() {
        let mut parser = ParamParser::default();
        let mut param = Param::default();

        parser.parse_value(&mut param, &JsonToken::ArrayStart);
        for byte in ["222", "173", "190", "239"] {
            parser.parse_value(&mut param, &JsonToken::Number(byte.to_string()));
        }
        parser.parse_value(&mut param, &JsonToken::ArrayEnd);

        assert_eq!(
            param.value,
            Some(ParamValue::Bytes(vec![0xDE, 0xAD, 0xBE, 0xEF]))
        );

        // A number after the array closed is a fresh scalar, not a byte.
        parser.parse_value(&mut param, &JsonToken::Number("7".to_string()));
        assert_eq!(param.value, Some(ParamValue::Int64(7)));
    }

    #[test]
    fn empty_bytes_render_as_bare_brackets() {
        let mut out = String::new();
        write_param(&mut out, &Param::new(5u32, ParamValue::Bytes(Vec::new())));
        assert_eq!(out, "\t\"identifier\":5,\n\t\"value\":[]");
    }

    #[test]
    fn identifier_kinds_render_differently() {
        let mut as_text = String::new();
        write_param(&mut as_text, &Param::new("mode", ParamValue::Bool(true)));
        assert_eq!(as_text, "\t\"identifier\":\"mode\",\n\t\"value\":true");

        let mut as_number = String::new();
        write_param(&mut as_number, &Param::new(9u32, ParamValue::Int64(-3)));
        assert_eq!(as_number, "\t\"identifier\":9,\n\t\"value\":-3");
    }
}
