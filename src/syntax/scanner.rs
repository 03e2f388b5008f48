use std::rc::Rc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::{decimal::fast_decimal, error::SyntaxError};

pub const START_OF_COMMENT: u8 = b';';

/// Outcome of a field extractor.
///
/// `NoMatch` hands back the untouched input: the field is not there and the
/// caller may try another rule. `Error` means the field is there but malformed.
#[derive(Debug, PartialEq, Eq)]
pub enum Scan<'a, T> {
    Matched(T, &'a [u8]),
    NoMatch(&'a [u8]),
    Error(SyntaxError),
}

impl<'a, T> Scan<'a, T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Scan<'a, U> {
        match self {
            Scan::Matched(v, tail) => Scan::Matched(f(v), tail),
            Scan::NoMatch(tail) => Scan::NoMatch(tail),
            Scan::Error(e) => Scan::Error(e),
        }
    }

}

/// Unwraps a match, passing `NoMatch` and `Error` on to the caller.
macro_rules! try_scan {
    ($scan:expr) => {
        match $scan {
            Scan::Matched(v, tail) => (v, tail),
            Scan::NoMatch(tail) => return Scan::NoMatch(tail),
            Scan::Error(e) => return Scan::Error(e),
        }
    };
}

/// Unwraps an optional field inside a function returning `Result<_, SyntaxError>`.
/// A `NoMatch` yields `$absent` and the untouched tail.
macro_rules! field {
    ($scan:expr, $absent:expr) => {
        match $scan {
            Scan::Matched(v, tail) => (v, tail),
            Scan::NoMatch(tail) => ($absent, tail),
            Scan::Error(e) => return Err(e),
        }
    };
}

pub(crate) use field;

/// Amount text as written, before the commodity is resolved.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawAmount {
    pub value: Decimal,
    pub prefix: String,
    pub decimal: String,
    pub postfix: String,
    pub code: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawPrice {
    /// `@@`: the amount is a total rather than a per-unit value.
    pub total: bool,
    pub amount: RawAmount,
}

pub struct Scanner<'a> {
    pub file: Rc<str>,
    source: &'a [u8],
    pos: usize,
    row: usize,
    col: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(file: Rc<str>, source: &'a [u8]) -> Scanner<'a> {
        Scanner {
            file,
            source,
            pos: 0,
            row: 0,
            col: 0,
        }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    /// Returns the next physical line without its terminator.
    pub fn next_line(&mut self) -> Option<&'a [u8]> {
        if self.pos >= self.source.len() {
            return None;
        }
        let rest = &self.source[self.pos..];
        let (line, consumed) = match rest.iter().position(|&b| b == b'\n') {
            Some(i) => (&rest[..i], i + 1),
            None => (rest, rest.len()),
        };
        self.pos += consumed;
        self.row += 1;
        self.col = 0;
        Some(line.strip_suffix(b"\r").unwrap_or(line))
    }

    /// Splits `line` at `i` into the token and the trimmed tail.
    fn advance(&mut self, line: &'a [u8], i: usize) -> (&'a [u8], &'a [u8]) {
        let tok = &line[..i];
        let tail = line[i..].trim_ascii();
        self.col += line.len() - tail.len();
        (tok, tail)
    }

    pub fn error(&self, msg: impl Into<String>) -> SyntaxError {
        SyntaxError::new(self.file.clone(), self.row, self.col, msg)
    }

    fn fail<T>(&self, msg: impl Into<String>) -> Scan<'a, T> {
        Scan::Error(self.error(msg))
    }

    /// `YYYY?MM?DD` where `?` is any non-digit byte.
    pub fn date(&mut self, line: &'a [u8]) -> Scan<'a, NaiveDate> {
        if !match_date(line) {
            return Scan::NoMatch(line);
        }
        if line.len() > 10 && !line[10].is_ascii_whitespace() {
            self.advance(line, 10);
            return self.fail("date must be followed by space or newline");
        }
        let mut buf = [0u8; 10];
        buf.copy_from_slice(&line[..10]);
        buf[4] = b'/';
        buf[7] = b'/';
        let parsed = std::str::from_utf8(&buf)
            .ok()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y/%m/%d").ok());
        match parsed {
            Some(date) => {
                let (_, tail) = self.advance(line, 10);
                Scan::Matched(date, tail)
            }
            None => self.fail(format!("invalid date '{}'", lossy(&buf))),
        }
    }

    pub fn pending(&mut self, line: &'a [u8]) -> Scan<'a, bool> {
        if line.first() != Some(&b'!') {
            return Scan::NoMatch(line);
        }
        if line.len() > 1 && !line[1].is_ascii_whitespace() {
            self.advance(line, 1);
            return self.fail("'!' must be followed by space or newline");
        }
        let (_, tail) = self.advance(line, 1);
        Scan::Matched(true, tail)
    }

    /// `(anything but a closing bracket)`
    pub fn code(&mut self, line: &'a [u8]) -> Scan<'a, String> {
        if line.len() < 2 || line[0] != b'(' {
            return Scan::NoMatch(line);
        }
        let Some(end) = line.iter().position(|&b| b == b')') else {
            return self.fail("missing closing bracket ')'");
        };
        if line.len() > end + 1 && !line[end + 1].is_ascii_whitespace() {
            self.advance(line, end);
            return self.fail("'(code)' must be followed by space or newline");
        }
        let (tok, tail) = self.advance(line, end + 1);
        Scan::Matched(lossy(&tok[1..end]), tail)
    }

    /// The rest of the line, plus every distinct `#tag` found in it, left to right.
    pub fn description(&mut self, line: &'a [u8]) -> Scan<'a, (String, Vec<String>)> {
        let mut tags: Vec<String> = Vec::new();
        let mut rest = line;
        while let Some(i) = rest.iter().position(|&b| b == b'#') {
            rest = &rest[i + 1..];
            let end = rest
                .iter()
                .position(|&b| b.is_ascii_whitespace() || is_punct(b))
                .unwrap_or(rest.len());
            let tag = lossy(&rest[..end]);
            if end > 0 && !tags.contains(&tag) {
                tags.push(tag);
            }
            rest = &rest[end..];
        }
        let (tok, tail) = self.advance(line, line.len());
        Scan::Matched((lossy(tok), tags), tail)
    }

    pub fn indent(&mut self, line: &'a [u8]) -> Scan<'a, ()> {
        match line.first() {
            Some(b) if b.is_ascii_whitespace() => {
                let (_, tail) = self.advance(line, 1);
                Scan::Matched((), tail)
            }
            _ => self.fail("bad format: expected indent or newline"),
        }
    }

    /// Account names may contain single spaces. Two blanks or a tab end them.
    pub fn account(&mut self, line: &'a [u8]) -> Scan<'a, String> {
        let mut end = line.len();
        for i in 1..line.len() {
            if line[i - 1] == b' ' && matches!(line[i], b' ' | b'\t') {
                end = i - 1;
                break;
            }
            if matches!(line[i], b'\n' | b'\t' | b'\r') {
                end = i;
                break;
            }
        }
        let (tok, tail) = self.advance(line, end);
        Scan::Matched(lossy(tok), tail)
    }

    pub fn negation(&mut self, line: &'a [u8]) -> Scan<'a, bool> {
        if line.first() != Some(&b'-') {
            return Scan::NoMatch(line);
        }
        let (_, tail) = self.advance(line, 1);
        Scan::Matched(true, tail)
    }

    /// Everything before the first digit or blank, e.g. `$` or `kr.`.
    pub fn prefix(&mut self, line: &'a [u8]) -> Scan<'a, String> {
        let mut i = 0;
        while i < line.len() {
            let (ch, w) = decode_char(&line[i..]);
            if ch.is_some_and(|c| c.is_whitespace() || c.is_ascii_digit()) {
                break;
            }
            i += w;
        }
        let (tok, tail) = self.advance(line, i);
        Scan::Matched(lossy(tok), tail)
    }

    /// Parses a number written with arbitrary separators.
    ///
    /// The last non-digit byte is the decimal separator if at most two digits
    /// follow it, otherwise every separator is a thousands separator. A
    /// separator that is not punctuation is a symbol standing in for the
    /// decimal point (`4 $ 56`), returned as the second value.
    pub fn decimal(&mut self, line: &'a [u8]) -> Scan<'a, (Decimal, String)> {
        let tok = match line.iter().position(|&b| b == b'@') {
            Some(at) => &line[..at],
            None => line,
        };
        let Some(last) = tok.iter().rposition(u8::is_ascii_digit) else {
            return self.fail(format!("failed to parse decimal: '{}'", lossy(tok)));
        };
        let (tok, tail) = self.advance(line, last + 1);

        let mut nfractional = 0;
        let mut decsym = String::new();
        if let Some(r) = tok.iter().rposition(|b| !b.is_ascii_digit()) {
            if tok.len() - r <= 3 {
                nfractional = tok.len() - r - 1;
                if !is_punct(tok[r]) {
                    let l = tok[..r]
                        .iter()
                        .rposition(u8::is_ascii_digit)
                        .map_or(0, |i| i + 1);
                    let sym = &tok[l..=r];
                    if sym.trim_ascii().is_empty() {
                        return self.fail(format!("bad format: space in value '{}'", lossy(tok)));
                    }
                    decsym = lossy(sym);
                }
            }
        }
        match fast_decimal(tok, nfractional as u32) {
            Some(value) => Scan::Matched((value, decsym), tail),
            None => self.fail(format!("decimal out of range: '{}'", lossy(tok))),
        }
    }

    /// Symbol and/or code after the number, up to an `@`.
    ///
    /// Heuristic: a quoted string is a code. A lone word is a code if it is
    /// all letters and either all uppercase or at least three characters long,
    /// otherwise a symbol. Two words are a symbol followed by a code. Short
    /// lowercase codes are misread as symbols.
    pub fn postfix(&mut self, line: &'a [u8]) -> Scan<'a, (String, String)> {
        if line.is_empty() {
            return Scan::Matched(Default::default(), line);
        }
        let (tok, at_tail) = match line.iter().position(|&b| b == b'@') {
            Some(r) => self.advance(line, r),
            None => (line, &line[line.len()..]),
        };
        let tok = tok.trim_ascii();
        if is_quoted(tok) {
            return Scan::Matched((String::new(), lossy(tok)), at_tail);
        }
        let (left, right) = split1(tok);
        if right.is_empty() {
            let res = if is_code(left) {
                (String::new(), lossy(left))
            } else {
                (lossy(left), String::new())
            };
            return Scan::Matched(res, at_tail);
        }
        let (code, rest) = split1(right);
        let tail = if rest.is_empty() { at_tail } else { rest };
        Scan::Matched((lossy(left), lossy(code)), tail)
    }

    /// Prefix, number and postfix of an amount.
    pub fn amount(&mut self, line: &'a [u8]) -> Scan<'a, RawAmount> {
        let (prefix, tail) = try_scan!(self.prefix(line));
        let ((value, decimal), tail) = try_scan!(self.decimal(tail));
        let ((postfix, code), tail) = try_scan!(self.postfix(tail));
        Scan::Matched(
            RawAmount {
                value,
                prefix,
                decimal,
                postfix,
                code,
            },
            tail,
        )
    }

    /// `@ amount` (per unit) or `@@ amount` (total).
    pub fn price(&mut self, line: &'a [u8]) -> Scan<'a, RawPrice> {
        if line.first() != Some(&b'@') {
            return Scan::NoMatch(line);
        }
        let (_, mut rest) = self.advance(line, 1);
        let total = rest.first() == Some(&b'@');
        if total {
            (_, rest) = self.advance(rest, 1);
        }
        if rest.is_empty() {
            return self.fail("missing unit value");
        }
        let (amount, tail) = try_scan!(self.amount(rest));
        Scan::Matched(RawPrice { total, amount }, tail)
    }
}

/// Cuts `line` at the first comment marker.
///
/// Returns the remaining line, whether it is blank and whether a comment was cut.
pub fn tidy(line: &[u8]) -> (&[u8], bool, bool) {
    let (line, had_comment) = match line.iter().position(|&b| b == START_OF_COMMENT) {
        Some(i) => (&line[..i], true),
        None => (line, false),
    };
    (line, line.trim_ascii().is_empty(), had_comment)
}

fn match_date(tok: &[u8]) -> bool {
    let digit = |i: usize| tok[i].is_ascii_digit();
    tok.len() >= 10
        && (0..4).all(digit)
        && !digit(4)
        && (5..7).all(digit)
        && !digit(7)
        && (8..10).all(digit)
}

/// Unicode punctuation (general category P) restricted to ASCII.
/// Currency and math symbols such as `$` or `+` are not punctuation.
pub fn is_punct(b: u8) -> bool {
    matches!(
        b,
        b'!' | b'"'
            | b'#'
            | b'%'
            | b'&'
            | b'\''
            | b'('
            | b')'
            | b'*'
            | b','
            | b'-'
            | b'.'
            | b'/'
            | b':'
            | b';'
            | b'?'
            | b'@'
            | b'['
            | b'\\'
            | b']'
            | b'_'
            | b'{'
            | b'}'
    )
}

fn is_quoted(b: &[u8]) -> bool {
    b.len() > 2
        && ((b[0] == b'"' && b[b.len() - 1] == b'"') || (b[0] == b'\'' && b[b.len() - 1] == b'\''))
}

fn is_code(b: &[u8]) -> bool {
    let s = String::from_utf8_lossy(b);
    s.chars().all(char::is_alphabetic)
        && (s.chars().all(char::is_uppercase) || s.chars().count() >= 3)
}

/// Splits at the first whitespace run.
fn split1(tok: &[u8]) -> (&[u8], &[u8]) {
    let mut i = 0;
    while i < tok.len() {
        let (ch, w) = decode_char(&tok[i..]);
        if ch.is_some_and(char::is_whitespace) {
            return (&tok[..i], tok[i + w..].trim_ascii());
        }
        i += w;
    }
    (tok, &tok[tok.len()..])
}

/// Decodes the UTF-8 character at the start of a non-empty slice.
/// Invalid sequences decode as `None` with width 1.
fn decode_char(b: &[u8]) -> (Option<char>, usize) {
    let w = match b[0] {
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        _ => 1,
    };
    match b.get(..w).and_then(|s| std::str::from_utf8(s).ok()) {
        Some(s) => (s.chars().next(), w),
        None => (None, 1),
    }
}

fn lossy(b: &[u8]) -> String {
    String::from_utf8_lossy(b).into_owned()
}
