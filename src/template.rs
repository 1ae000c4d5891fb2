//! Display templates such as `{:d}`, `£{:.1f}m` or `{:%B %d, %Y}`.
//!
//! A template is literal text with replacement fields. Every field renders the
//! same value. `{{` and `}}` are literal braces. A field is `{}`, `{0}`,
//! `{:spec}` or `{0:spec}` where `spec` follows
//! `[[fill]align][sign][#][0][width][,|_][.precision][type]`:
//!
//! | type | accepts | renders |
//! |---|---|---|
//! | `d` `n` | integers, booleans | decimal |
//! | `b` `o` `x` `X` | integers, booleans | binary, octal, hex (`#` adds a prefix) |
//! | `c` | integers | the character with that code point |
//! | `f` `F` `e` `E` `g` `G` `%` | numbers | fixed, scientific, general, percentage |
//! | `s` | strings | the string, truncated to the precision |
//! | none | anything | the natural representation |
//!
//! A spec that does not follow this grammar is accepted only for datetimes, as
//! a strftime pattern.

use std::{fmt::Write as _, sync::OnceLock};

use chrono::{
    NaiveDateTime,
    format::{Item, StrftimeItems},
};
use regex::Regex;

use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pieces: Vec<Piece>,
}

#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Literal(String),
    Field(Spec),
}

#[derive(Debug, Clone, PartialEq)]
enum Spec {
    Standard(StandardSpec),
    Pattern(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
    AfterSign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Sign {
    #[default]
    Negative,
    Always,
    Space,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct StandardSpec {
    fill: Option<char>,
    align: Option<Align>,
    sign: Sign,
    alternate: bool,
    zero: bool,
    width: Option<usize>,
    grouping: Option<char>,
    precision: Option<usize>,
    kind: Option<char>,
}

fn spec_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(?s:(?:(?P<fill>.)?(?P<align>[<>=^]))?(?P<sign>[-+ ])?(?P<alt>#)?(?P<zero>0)?(?P<width>\d+)?(?P<group>[,_])?(?:\.(?P<precision>\d+))?(?P<kind>[bcdeEfFgGnosxX%])?)$",
        )
        .expect("format spec pattern is a valid regex")
    })
}

impl Template {
    pub fn parse(template: &str) -> Result<Self, String> {
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err("Single '}' encountered in format string".to_string()),
                '{' => {
                    let mut body = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') => {
                                return Err("Nested replacement fields are not supported".to_string());
                            }
                            Some(c) => body.push(c),
                            None => {
                                return Err("Single '{' encountered in format string".to_string());
                            }
                        }
                    }
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    pieces.push(Piece::Field(parse_field(&body)?));
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }
        Ok(Self { pieces })
    }

    /// Turns every integer directive (`d`) into a one-decimal float directive.
    pub fn widen_integers(&self) -> Template {
        let pieces = self
            .pieces
            .iter()
            .map(|piece| match piece {
                Piece::Field(Spec::Standard(spec)) if spec.kind == Some('d') => {
                    Piece::Field(Spec::Standard(StandardSpec {
                        kind: Some('f'),
                        precision: Some(1),
                        ..spec.clone()
                    }))
                }
                other => other.clone(),
            })
            .collect();
        Template { pieces }
    }

    pub fn render(&self, value: &Value) -> Result<String, String> {
        let mut output = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => output.push_str(text),
                Piece::Field(Spec::Standard(spec)) => output.push_str(&spec.render(value)?),
                Piece::Field(Spec::Pattern(pattern)) => {
                    output.push_str(&render_pattern(pattern, value)?)
                }
            }
        }
        Ok(output)
    }
}

fn parse_field(body: &str) -> Result<Spec, String> {
    let (argument, spec) = body.split_once(':').unwrap_or((body, ""));
    let argument = argument.trim();
    if !(argument.is_empty() || argument == "0") {
        return Err(format!(
            "Replacement field '{{{body}}}' must refer to the single value as {{}} or {{0}}"
        ));
    }
    let Some(captures) = spec_pattern().captures(spec) else {
        return Ok(Spec::Pattern(spec.to_string()));
    };

    let char_of = |name: &str| captures.name(name).and_then(|m| m.as_str().chars().next());
    let number_of = |name: &str| -> Result<Option<usize>, String> {
        captures
            .name(name)
            .map(|m| {
                m.as_str()
                    .parse::<u16>()
                    .map(usize::from)
                    .map_err(|_| format!("{name} '{}' is too large", m.as_str()))
            })
            .transpose()
    };

    let align = char_of("align").map(|c| match c {
        '<' => Align::Left,
        '>' => Align::Right,
        '^' => Align::Center,
        _ => Align::AfterSign,
    });
    let sign = match char_of("sign") {
        Some('+') => Sign::Always,
        Some(' ') => Sign::Space,
        _ => Sign::Negative,
    };
    Ok(Spec::Standard(StandardSpec {
        fill: char_of("fill"),
        align,
        sign,
        alternate: captures.name("alt").is_some(),
        zero: captures.name("zero").is_some(),
        width: number_of("width")?,
        grouping: char_of("group"),
        precision: number_of("precision")?,
        kind: char_of("kind"),
    }))
}

fn render_pattern(pattern: &str, value: &Value) -> Result<String, String> {
    match value {
        Value::DateTime(dt) => format_datetime(dt, pattern),
        other => Err(format!(
            "Invalid format specifier '{pattern}' for {} value",
            other.type_name()
        )),
    }
}

fn format_datetime(dt: &NaiveDateTime, pattern: &str) -> Result<String, String> {
    let items = StrftimeItems::new(pattern).collect::<Vec<_>>();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(format!("Invalid datetime pattern '{pattern}'"));
    }
    let mut output = String::new();
    write!(output, "{}", dt.format_with_items(items.iter()))
        .map_err(|_| format!("Datetime pattern '{pattern}' cannot be applied to a naive datetime"))?;
    Ok(output)
}

impl StandardSpec {
    fn is_bare(&self) -> bool {
        *self == StandardSpec::default()
    }

    fn render(&self, value: &Value) -> Result<String, String> {
        match value {
            Value::String(s) => self.render_text(s, "string"),
            Value::Integer(i) => self.render_integer(*i),
            Value::Float(f) => self.render_float(*f),
            Value::Boolean(b) => match self.kind {
                None | Some('s') if self.sign == Sign::Negative && self.grouping.is_none() => {
                    self.render_text(&value.as_display(), "boolean")
                }
                _ => self.render_integer(i64::from(*b)),
            },
            Value::DateTime(_) | Value::Duration(_) => {
                let plain = StandardSpec {
                    fill: None,
                    align: None,
                    width: None,
                    ..self.clone()
                };
                if plain.is_bare() {
                    Ok(self.pad(value.as_display(), "", Align::Left))
                } else {
                    Err(format!(
                        "Invalid format specifier for {} value",
                        value.type_name()
                    ))
                }
            }
        }
    }

    fn render_text(&self, text: &str, type_name: &str) -> Result<String, String> {
        match self.kind {
            None | Some('s') => {}
            Some(kind) => {
                return Err(format!("Unknown format code '{kind}' for {type_name} value"));
            }
        }
        if self.sign != Sign::Negative {
            return Err(format!("Sign not allowed in {type_name} format specifier"));
        }
        if self.grouping.is_some() {
            return Err(format!("Cannot specify grouping with {type_name} values"));
        }
        if self.align == Some(Align::AfterSign) {
            return Err(format!("'=' alignment not allowed in {type_name} format specifier"));
        }
        let truncated = match self.precision {
            Some(precision) => text.chars().take(precision).collect(),
            None => text.to_string(),
        };
        Ok(self.pad(truncated, "", Align::Left))
    }

    fn render_integer(&self, value: i64) -> Result<String, String> {
        let kind = self.kind.unwrap_or('d');
        if matches!(kind, 'e' | 'E' | 'f' | 'F' | 'g' | 'G' | '%') {
            return self.render_float(value as f64);
        }
        if self.precision.is_some() {
            return Err("Precision not allowed in integer format specifier".to_string());
        }
        let magnitude = value.unsigned_abs();
        let (prefix, digits) = match kind {
            'd' | 'n' => ("", self.group(magnitude.to_string(), 3)?),
            'b' => ("0b", self.group_radix(format!("{magnitude:b}"), kind)?),
            'o' => ("0o", self.group_radix(format!("{magnitude:o}"), kind)?),
            'x' => ("0x", self.group_radix(format!("{magnitude:x}"), kind)?),
            'X' => ("0X", self.group_radix(format!("{magnitude:X}"), kind)?),
            'c' => {
                let code = u32::try_from(value)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| format!("%c arg not in range: {value}"))?;
                return Ok(self.pad(code.to_string(), "", Align::Left));
            }
            other => return Err(format!("Unknown format code '{other}' for integer value")),
        };
        let prefix = if self.alternate { prefix } else { "" };
        let sign = self.sign_of(value < 0);
        Ok(self.pad(digits, &format!("{sign}{prefix}"), Align::Right))
    }

    fn render_float(&self, value: f64) -> Result<String, String> {
        let abs = value.abs();
        let body = match self.kind {
            Some(kind @ ('f' | 'F')) => fixed(abs, self.precision.unwrap_or(6), kind == 'F'),
            Some(kind @ ('e' | 'E')) => scientific(abs, self.precision.unwrap_or(6), kind == 'E'),
            Some(kind @ ('g' | 'G')) => general(abs, self.precision, kind == 'G', self.alternate, false),
            Some('%') => {
                let mut percent = fixed(abs * 100.0, self.precision.unwrap_or(6), false);
                percent.push('%');
                percent
            }
            None if self.precision.is_some() => general(abs, self.precision, false, self.alternate, true),
            None => Value::Float(abs).as_display(),
            Some(kind) => return Err(format!("Unknown format code '{kind}' for float value")),
        };
        let body = if self.grouping.is_some() && abs.is_finite() {
            let split = body
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(body.len());
            let (integral, rest) = body.split_at(split);
            format!("{}{rest}", self.group(integral.to_string(), 3)?)
        } else {
            body
        };
        let sign = self.sign_of(value.is_sign_negative() && !value.is_nan());
        Ok(self.pad(body, sign, Align::Right))
    }

    fn sign_of(&self, negative: bool) -> &'static str {
        match (negative, self.sign) {
            (true, _) => "-",
            (false, Sign::Always) => "+",
            (false, Sign::Space) => " ",
            (false, Sign::Negative) => "",
        }
    }

    fn group(&self, digits: String, size: usize) -> Result<String, String> {
        match self.grouping {
            Some(separator) => Ok(insert_separators(&digits, separator, size)),
            None => Ok(digits),
        }
    }

    fn group_radix(&self, digits: String, kind: char) -> Result<String, String> {
        match self.grouping {
            Some(',') => Err(format!("Cannot specify ',' with '{kind}'")),
            Some(separator) => Ok(insert_separators(&digits, separator, 4)),
            None => Ok(digits),
        }
    }

    /// Pads `body` to the requested width. `sign` is kept ahead of any
    /// padding inserted by `=` alignment or the `0` flag.
    fn pad(&self, body: String, sign: &str, default_align: Align) -> String {
        let (fill, align) = match (self.align, self.zero) {
            (Some(align), _) => (self.fill.unwrap_or(' '), align),
            (None, true) => (self.fill.unwrap_or('0'), Align::AfterSign),
            (None, false) => (' ', default_align),
        };
        let length = sign.chars().count() + body.chars().count();
        let padding = self.width.unwrap_or(0).saturating_sub(length);
        let fill_with = |count: usize| fill.to_string().repeat(count);
        match align {
            Align::Left => format!("{sign}{body}{}", fill_with(padding)),
            Align::Right => format!("{}{sign}{body}", fill_with(padding)),
            Align::Center => {
                let left = padding / 2;
                format!("{}{sign}{body}{}", fill_with(left), fill_with(padding - left))
            }
            Align::AfterSign => format!("{sign}{}{body}", fill_with(padding)),
        }
    }
}

fn insert_separators(digits: &str, separator: char, size: usize) -> String {
    let count = digits.chars().count();
    let mut grouped = String::with_capacity(count + count / size);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (count - idx) % size == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}

fn non_finite(value: f64, upper: bool) -> Option<String> {
    let text = if value.is_nan() {
        "nan"
    } else if value.is_infinite() {
        "inf"
    } else {
        return None;
    };
    Some(if upper {
        text.to_uppercase()
    } else {
        text.to_string()
    })
}

fn fixed(value: f64, precision: usize, upper: bool) -> String {
    non_finite(value, upper).unwrap_or_else(|| format!("{value:.precision$}"))
}

fn scientific(value: f64, precision: usize, upper: bool) -> String {
    if let Some(text) = non_finite(value, upper) {
        return text;
    }
    let raw = format!("{value:.precision$e}");
    let (mantissa, exponent) = raw.split_once('e').unwrap_or((raw.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or_default();
    let marker = if upper { 'E' } else { 'e' };
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}{marker}{sign}{:02}", exponent.unsigned_abs())
}

/// General format: scientific for very small or large magnitudes, fixed
/// otherwise, trailing zeros removed unless `alternate` is set.
fn general(
    value: f64,
    precision: Option<usize>,
    upper: bool,
    alternate: bool,
    keep_point: bool,
) -> String {
    if let Some(text) = non_finite(value, upper) {
        return text;
    }
    let precision = precision.unwrap_or(6).max(1);
    let exponent = if value == 0.0 {
        0
    } else {
        let raw = format!("{value:.prec$e}", prec = precision - 1);
        raw.split_once('e')
            .and_then(|(_, exp)| exp.parse::<i64>().ok())
            .unwrap_or_default()
    };
    let (mut text, scientific_form) = if exponent >= -4 && exponent < precision as i64 {
        let decimals = (precision as i64 - 1 - exponent).max(0) as usize;
        (format!("{value:.decimals$}"), false)
    } else {
        (scientific(value, precision - 1, upper), true)
    };
    if !alternate {
        text = strip_trailing_zeros(&text);
    }
    if keep_point && !scientific_form && !text.contains('.') {
        text.push_str(".0");
    }
    text
}

fn strip_trailing_zeros(text: &str) -> String {
    let (mantissa, exponent) = match text.find(['e', 'E']) {
        Some(idx) => text.split_at(idx),
        None => (text, ""),
    };
    if !mantissa.contains('.') {
        return text.to_string();
    }
    let trimmed = mantissa.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed}{exponent}")
}
