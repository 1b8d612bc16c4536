//! Decoding of Java literal tokens into values.

use std::ops::Range;

use crate::ast::LiteralKind;

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    String(String),
    Boolean(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct LiteralError {
    pub message: String,
    /// Byte range within the literal text (not file offsets).
    pub span: Range<usize>,
}

fn err(message: impl Into<String>, span: Range<usize>) -> LiteralError {
    LiteralError {
        message: message.into(),
        span,
    }
}

pub fn parse_literal(kind: LiteralKind, text: &str) -> Result<LiteralValue, LiteralError> {
    match kind {
        LiteralKind::Int => Ok(LiteralValue::Int(parse_int_literal(text)?)),
        LiteralKind::Long => Ok(LiteralValue::Long(parse_long_literal(text)?)),
        LiteralKind::Float => Ok(LiteralValue::Float(parse_float_literal(text)?)),
        LiteralKind::Double => Ok(LiteralValue::Double(parse_double_literal(text)?)),
        LiteralKind::Char => Ok(LiteralValue::Char(unescape_char_literal(text)?)),
        LiteralKind::String => Ok(LiteralValue::String(unescape_string_literal(text)?)),
        LiteralKind::TextBlock => Ok(LiteralValue::String(unescape_text_block(text)?)),
        LiteralKind::True => Ok(LiteralValue::Boolean(true)),
        LiteralKind::False => Ok(LiteralValue::Boolean(false)),
        LiteralKind::Null => Ok(LiteralValue::Null),
    }
}

pub fn parse_int_literal(text: &str) -> Result<i32, LiteralError> {
    let bytes = text.as_bytes();
    let Some(&last) = bytes.last() else {
        return Err(err("Empty int literal", 0..0));
    };
    if matches!(last, b'l' | b'L') {
        let idx = bytes.len() - 1;
        return Err(err("Int literal must not have `L` suffix", idx..idx + 1));
    }

    let end = bytes.len();
    let (base, prefix_len, is_decimal) = integer_base(bytes, end);
    let limit = if is_decimal {
        i32::MAX as u64
    } else {
        u32::MAX as u64
    };
    let value = parse_unsigned_integer(bytes, prefix_len, end, base, limit)?;
    Ok(value as u32 as i32)
}

/// `2147483648` is only legal as the operand of unary minus.
pub fn parse_negated_int_literal(text: &str) -> Result<i32, LiteralError> {
    let bytes = text.as_bytes();
    let (base, prefix_len, is_decimal) = integer_base(bytes, bytes.len());
    if !is_decimal {
        return parse_int_literal(text).map(i32::wrapping_neg);
    }
    let value = parse_unsigned_integer(bytes, prefix_len, bytes.len(), base, 1 << 31)?;
    Ok((value as i64).wrapping_neg() as i32)
}

pub fn parse_long_literal(text: &str) -> Result<i64, LiteralError> {
    let bytes = text.as_bytes();
    let suffix_pos = bytes.len().saturating_sub(1);
    if !matches!(bytes.get(suffix_pos), Some(b'l' | b'L')) {
        return Err(err(
            "Long literal is missing `L` suffix",
            suffix_pos..suffix_pos + 1,
        ));
    }
    if suffix_pos == 0 {
        return Err(err("Long literal is missing digits", 0..text.len()));
    }

    let (base, prefix_len, is_decimal) = integer_base(bytes, suffix_pos);
    let limit = if is_decimal {
        i64::MAX as u64
    } else {
        u64::MAX
    };
    let value = parse_unsigned_integer(bytes, prefix_len, suffix_pos, base, limit)?;
    Ok(value as i64)
}

/// `9223372036854775808L` is only legal as the operand of unary minus.
pub fn parse_negated_long_literal(text: &str) -> Result<i64, LiteralError> {
    let bytes = text.as_bytes();
    let suffix_pos = bytes.len().saturating_sub(1);
    let (base, prefix_len, is_decimal) = integer_base(bytes, suffix_pos);
    if !is_decimal {
        return parse_long_literal(text).map(i64::wrapping_neg);
    }
    let value = parse_unsigned_integer(bytes, prefix_len, suffix_pos, base, 1 << 63)?;
    Ok((value as i64).wrapping_neg())
}

fn integer_base(bytes: &[u8], end: usize) -> (u32, usize, bool) {
    if bytes.first() != Some(&b'0') || end <= 1 {
        return (10, 0, true);
    }
    match bytes[1] {
        b'x' | b'X' => (16, 2, false),
        b'b' | b'B' => (2, 2, false),
        _ => (8, 1, false),
    }
}

fn parse_unsigned_integer(
    bytes: &[u8],
    prefix_len: usize,
    end: usize,
    base: u32,
    limit: u64,
) -> Result<u64, LiteralError> {
    if end == 0 {
        return Err(err("Missing digits", 0..0));
    }
    if bytes[end - 1] == b'_' {
        return Err(err(
            "Trailing underscore is not allowed in numeric literal",
            end - 1..end,
        ));
    }
    if prefix_len == 2 && bytes.get(prefix_len) == Some(&b'_') {
        return Err(err(
            "Underscore is not allowed immediately after base prefix",
            prefix_len..prefix_len + 1,
        ));
    }

    let mut value: u64 = 0;
    let mut seen_digit = false;
    for (idx, &b) in bytes[..end].iter().enumerate().skip(prefix_len) {
        if b == b'_' {
            continue;
        }
        let digit = (b as char)
            .to_digit(base)
            .ok_or_else(|| err(format!("Invalid digit `{}` in literal", b as char), idx..idx + 1))?;

        seen_digit = true;
        value = value
            .checked_mul(base as u64)
            .and_then(|v| v.checked_add(digit as u64))
            .ok_or_else(|| err("Integer literal is too large", 0..end))?;
        if value > limit {
            return Err(err("Integer literal is out of range", 0..end));
        }
    }

    if !seen_digit {
        return Err(err("Missing digits", prefix_len..end));
    }
    Ok(value)
}

pub fn parse_float_literal(text: &str) -> Result<f32, LiteralError> {
    let main = text
        .strip_suffix(['f', 'F'])
        .ok_or_else(|| err("Float literal must end with `f` suffix", 0..text.len()))?;
    parse_floating(main).map(|v| v as f32)
}

pub fn parse_double_literal(text: &str) -> Result<f64, LiteralError> {
    let main = text.strip_suffix(['d', 'D']).unwrap_or(text);
    parse_floating(main)
}

fn parse_floating(main: &str) -> Result<f64, LiteralError> {
    if main.is_empty() {
        return Err(err("Missing digits", 0..0));
    }
    if main.starts_with('_') || main.ends_with('_') {
        return Err(err(
            "Underscore is not allowed at the edge of a numeric literal",
            0..main.len(),
        ));
    }
    let sanitized: String = main.chars().filter(|&ch| ch != '_').collect();
    if let Some(hex) = sanitized
        .strip_prefix("0x")
        .or_else(|| sanitized.strip_prefix("0X"))
    {
        return parse_hex_floating(hex).ok_or_else(|| err("Invalid hexadecimal floating literal", 0..main.len()));
    }
    sanitized
        .parse::<f64>()
        .map_err(|_| err("Invalid floating literal", 0..main.len()))
}

/// `1.8p3` style significand and binary exponent (prefix already stripped).
fn parse_hex_floating(text: &str) -> Option<f64> {
    let (significand, exponent) = text.split_once(['p', 'P'])?;
    let exponent: i32 = exponent.parse().ok()?;
    let (int_part, frac_part) = significand.split_once('.').unwrap_or((significand, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let mut value = 0f64;
    for ch in int_part.chars() {
        value = value * 16.0 + ch.to_digit(16)? as f64;
    }
    let mut scale = 1.0 / 16.0;
    for ch in frac_part.chars() {
        value += ch.to_digit(16)? as f64 * scale;
        scale /= 16.0;
    }
    Some(value * 2f64.powi(exponent))
}

pub fn unescape_char_literal(text: &str) -> Result<char, LiteralError> {
    let inner = text
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .filter(|_| text.len() >= 2)
        .ok_or_else(|| err("Invalid char literal", 0..text.len()))?;

    let mut out = String::new();
    unescape_into(inner, 1, false, &mut out)?;
    let mut chars = out.chars();
    let ch = chars
        .next()
        .ok_or_else(|| err("Empty char literal", 0..text.len()))?;
    if chars.next().is_some() || ch.len_utf16() != 1 {
        return Err(err(
            "Char literal must contain exactly one character",
            0..text.len(),
        ));
    }
    Ok(ch)
}

pub fn unescape_string_literal(text: &str) -> Result<String, LiteralError> {
    let inner = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .filter(|_| text.len() >= 2)
        .ok_or_else(|| err("Invalid string literal", 0..text.len()))?;
    let mut out = String::new();
    unescape_into(inner, 1, false, &mut out)?;
    Ok(out)
}

pub fn unescape_text_block(text: &str) -> Result<String, LiteralError> {
    if text.len() < 6 || !text.starts_with("\"\"\"") || !text.ends_with("\"\"\"") {
        return Err(err("Invalid text block literal", 0..text.len()));
    }
    let body = &text[3..text.len() - 3];

    // The opening delimiter must be followed by a line terminator.
    let after_open = body.trim_start_matches([' ', '\t']);
    let content = after_open
        .strip_prefix("\r\n")
        .or_else(|| after_open.strip_prefix('\n'))
        .or_else(|| after_open.strip_prefix('\r'))
        .ok_or_else(|| err("Missing line terminator after opening delimiter", 3..text.len()))?;

    let lines: Vec<&str> = content.split('\n').map(|l| l.trim_end_matches('\r')).collect();

    // Common indentation over non-blank lines plus the closing delimiter line.
    let closing_line = lines.last().copied().unwrap_or("");
    let closing_is_blank = closing_line.trim().is_empty();
    let indent = lines
        .iter()
        .enumerate()
        .filter(|(idx, line)| !line.trim().is_empty() || (*idx == lines.len() - 1 && closing_is_blank))
        .map(|(_, line)| line.len() - line.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    let mut stripped = String::new();
    for (idx, line) in lines.iter().enumerate() {
        let last = idx == lines.len() - 1;
        if last && closing_is_blank {
            break;
        }
        let line = if line.len() >= indent { &line[indent..] } else { "" };
        stripped.push_str(line.trim_end_matches([' ', '\t']));
        if !last {
            stripped.push('\n');
        }
    }

    let mut out = String::new();
    unescape_into(&stripped, 3, true, &mut out)?;
    Ok(out)
}

fn unescape_into(
    text: &str,
    offset: usize,
    text_block: bool,
    out: &mut String,
) -> Result<(), LiteralError> {
    let mut chars = text.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        let at = offset + idx;
        match ch {
            '\\' => {
                let Some((_, next)) = chars.next() else {
                    return Err(err("Unterminated escape sequence", at..at + 1));
                };
                match next {
                    'b' => out.push('\u{0008}'),
                    't' => out.push('\t'),
                    'n' => out.push('\n'),
                    'f' => out.push('\u{000C}'),
                    'r' => out.push('\r'),
                    's' => out.push(' '),
                    '"' => out.push('"'),
                    '\'' => out.push('\''),
                    '\\' => out.push('\\'),
                    '\n' if text_block => {}
                    'u' => {
                        while chars.peek().is_some_and(|(_, c)| *c == 'u') {
                            chars.next();
                        }
                        let mut value = 0u32;
                        for _ in 0..4 {
                            let digit = chars
                                .next()
                                .and_then(|(_, c)| c.to_digit(16))
                                .ok_or_else(|| err("Incomplete unicode escape", at..at + 2))?;
                            value = (value << 4) | digit;
                        }
                        let ch = char::from_u32(value).ok_or_else(|| {
                            err("Unicode escape is not a valid scalar value", at..at + 6)
                        })?;
                        out.push(ch);
                    }
                    '0'..='7' => {
                        let max_digits = if next <= '3' { 3 } else { 2 };
                        let mut value = next as u32 - '0' as u32;
                        for _ in 1..max_digits {
                            match chars.peek() {
                                Some(&(_, c @ '0'..='7')) => {
                                    value = value * 8 + (c as u32 - '0' as u32);
                                    chars.next();
                                }
                                _ => break,
                            }
                        }
                        out.push(char::from_u32(value).unwrap_or('\u{FFFD}'));
                    }
                    other => {
                        return Err(err(
                            format!("Unknown escape sequence `\\{other}`"),
                            at..at + 2,
                        ))
                    }
                }
            }
            '\n' | '\r' if !text_block => {
                return Err(err(
                    "Line terminator is not allowed in string/char literal",
                    at..at + 1,
                ))
            }
            _ => out.push(ch),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_literals_decimal_and_hex_twos_complement() {
        assert_eq!(parse_int_literal("2147483647").unwrap(), 2147483647);
        assert!(parse_int_literal("2147483648").is_err());
        assert_eq!(parse_int_literal("0xFFFF_FFFF").unwrap(), -1);
        assert_eq!(parse_int_literal("0b101").unwrap(), 5);
        assert_eq!(parse_int_literal("017").unwrap(), 15);
        assert_eq!(parse_int_literal("1_000").unwrap(), 1000);
    }

    #[test]
    fn negated_literals_admit_min_values() {
        assert_eq!(parse_negated_int_literal("2147483648").unwrap(), i32::MIN);
        assert_eq!(
            parse_negated_long_literal("9223372036854775808L").unwrap(),
            i64::MIN
        );
    }

    #[test]
    fn long_literals_require_suffix() {
        assert_eq!(parse_long_literal("10L").unwrap(), 10);
        assert!(parse_long_literal("10").is_err());
        assert_eq!(parse_long_literal("0xFFFF_FFFF_FFFF_FFFFL").unwrap(), -1);
    }

    #[test]
    fn floating_literals() {
        assert_eq!(parse_float_literal("1.5f").unwrap(), 1.5f32);
        assert_eq!(parse_double_literal("1.").unwrap(), 1.0);
        assert_eq!(parse_double_literal("2e3d").unwrap(), 2000.0);
        assert_eq!(parse_double_literal("0x1p1").unwrap(), 2.0);
    }

    #[test]
    fn string_and_char_escapes() {
        assert_eq!(unescape_char_literal("'\\n'").unwrap(), '\n');
        assert_eq!(unescape_char_literal("'a'").unwrap(), 'a');
        assert_eq!(unescape_string_literal("\"a\\tb\"").unwrap(), "a\tb");
        assert_eq!(unescape_string_literal("\"\\141\"").unwrap(), "a");
        assert_eq!(unescape_string_literal("\"\\u0041\"").unwrap(), "A");
        assert!(unescape_string_literal("\"\\q\"").is_err());
    }

    #[test]
    fn text_block_strips_common_indentation() {
        let text = "\"\"\"\n    hello\n      world\n    \"\"\"";
        assert_eq!(unescape_text_block(text).unwrap(), "hello\n  world\n");
        assert!(unescape_text_block("\"\"\"hi\"\"\"").is_err());
    }
}
