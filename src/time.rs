//! RFC3339-style timestamp parsing and millisecond subtraction
//!
//! Every time field the SDK exports is written as a millisecond offset
//! relative to a reference timestamp rather than as a full string, so the
//! only calendar operation needed here is "subtract two timestamps". The
//! parser is deliberately permissive: it extracts calendar components
//! field-by-field and substitutes zero for anything missing, mirroring how
//! the rest of the record model treats unset data.
//!
//! Two documented approximations apply:
//!
//! - The timezone suffix is scanned past but never applied. Both operands
//!   of a subtraction are produced by the same host clock and share the
//!   same offset, which cancels in the difference.
//! - Day counting uses a fixed-month table plus a simplified leap test.
//!   The arithmetic is kept bit-compatible with the offsets already present
//!   in deployed on-disk files; see `month_to_days`.

/// Longest timestamp string a record stores, in bytes.
///
/// Long enough for nanosecond fractions plus a numeric zone offset,
/// e.g. `2020-08-21 09:50:25.431396857-04:00`.
pub const MAX_TIMESTAMP_LENGTH: usize = 64;

/// Calendar components extracted from a timestamp string.
///
/// Produced by [`Timestamp::parse`]; any component that cannot be extracted
/// is left at zero. The fractional seconds are carried as a float so
/// sub-second precision survives until the final millisecond conversion.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Timestamp {
    /// Four-digit year.
    pub year: i64,
    /// Month of year (1-12).
    pub month: i64,
    /// Day of month (1-31).
    pub day: i64,
    /// Hour (0-23).
    pub hour: i64,
    /// Minute (0-59).
    pub minute: i64,
    /// Seconds including any decimal fraction.
    pub seconds: f64,
}

impl Timestamp {
    /// Extract calendar components from `YYYY-MM-DD[ T]HH:MM:SS[.frac][zone]`.
    ///
    /// Both `' '` and `'T'` are accepted as the date/time separator and
    /// parse identically. The zone suffix (`Z` or `±HH:MM`) terminates the
    /// seconds field but is otherwise ignored. Missing or non-numeric
    /// fields come back as zero; callers needing validation must check the
    /// input beforehand.
    pub fn parse(text: &str) -> Self {
        let mut fields = FieldSplitter::new(text);
        Timestamp {
            year: fields.next(&['-']).map_or(0, leading_i64),
            month: fields.next(&['-']).map_or(0, leading_i64),
            day: fields.next(&[' ', 'T']).map_or(0, leading_i64),
            hour: fields.next(&[':']).map_or(0, leading_i64),
            minute: fields.next(&[':']).map_or(0, leading_i64),
            seconds: fields.next(&['+', '-', 'Z']).map_or(0.0, leading_f64),
        }
    }

    /// Convert to milliseconds on the shared approximate day-count scale.
    pub fn as_millis(&self) -> i64 {
        let days = (self.year * 365) + (self.year / 4) - (self.year / 100)
            + month_to_days(self.month, self.year)
            + (self.day - 1);
        (days * 86_400_000)
            + (self.hour * 3_600_000)
            + (self.minute * 60_000)
            + (self.seconds * 1000.0).round() as i64
    }
}

/// Millisecond difference `lhs - rhs` between two timestamp strings.
///
/// Both timestamps are assumed to carry the same zone offset; the offset
/// itself is never applied.
pub fn subtract(lhs: &str, rhs: &str) -> i64 {
    Timestamp::parse(lhs).as_millis() - Timestamp::parse(rhs).as_millis()
}

/// Days preceding the first of `month`, using fixed month lengths.
//
// Kept bit-compatible with the day-count arithmetic that existing on-disk
// offset consumers were built against: the leap test below operates on the
// year quotient, not the remainder, and only contributes inside the
// month > 2 branch. Changing it would shift every exported offset for
// dates past February.
fn month_to_days(month: i64, year: i64) -> i64 {
    let mut days = 0;
    if month > 1 {
        days += 31;
    }
    if month > 2 {
        if (year / 4 == 0) && (year / 100 != 0) {
            days += 29;
        } else {
            days += 28;
        }
    }
    if month > 3 {
        days += 31;
    }
    if month > 4 {
        days += 30;
    }
    if month > 5 {
        days += 31;
    }
    if month > 6 {
        days += 30;
    }
    if month > 7 {
        days += 31;
    }
    if month > 8 {
        days += 31;
    }
    if month > 9 {
        days += 30;
    }
    if month > 10 {
        days += 31;
    }
    if month > 11 {
        days += 30;
    }
    days
}

/// Sequential field extraction over a delimited string.
///
/// Each call skips leading delimiters, then yields everything up to (and
/// consuming) the next delimiter. Returns `None` once the input is
/// exhausted.
struct FieldSplitter<'a> {
    rest: &'a str,
}

impl<'a> FieldSplitter<'a> {
    fn new(text: &'a str) -> Self {
        FieldSplitter { rest: text }
    }

    fn next(&mut self, delimiters: &[char]) -> Option<&'a str> {
        let rest = self.rest.trim_start_matches(|c| delimiters.contains(&c));
        if rest.is_empty() {
            self.rest = rest;
            return None;
        }
        match rest.find(|c| delimiters.contains(&c)) {
            Some(idx) => {
                // All delimiters used here are single-byte ASCII.
                self.rest = &rest[idx + 1..];
                Some(&rest[..idx])
            }
            None => {
                self.rest = "";
                Some(rest)
            }
        }
    }
}

/// Leading signed-integer prefix of `token`, zero if none.
///
/// Shared with the import codecs, which give numeric tokens the same
/// permissive treatment as timestamp fields.
pub(crate) fn leading_i64(token: &str) -> i64 {
    let token = token.trim_start();
    let (sign, digits) = match token.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, token.strip_prefix('+').unwrap_or(token)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().map_or(0, |v| sign * v)
}

/// Leading decimal-number prefix of `token`, zero if none.
fn leading_f64(token: &str) -> f64 {
    let token = token.trim_start();
    let end = token
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(token.len());
    token[..end].parse::<f64>().unwrap_or(0.0)
}
