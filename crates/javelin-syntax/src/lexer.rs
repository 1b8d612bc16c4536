use crate::ast::Span;
use crate::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Keyword,
    IntLiteral,
    LongLiteral,
    FloatLiteral,
    DoubleLiteral,
    CharLiteral,
    StringLiteral,
    TextBlock,
    Punct,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

const KEYWORDS: &[&str] = &[
    "abstract",
    "assert",
    "boolean",
    "break",
    "byte",
    "case",
    "catch",
    "char",
    "class",
    "const",
    "continue",
    "default",
    "do",
    "double",
    "else",
    "enum",
    "extends",
    "false",
    "final",
    "finally",
    "float",
    "for",
    "goto",
    "if",
    "implements",
    "import",
    "instanceof",
    "int",
    "interface",
    "long",
    "native",
    "new",
    "null",
    "package",
    "private",
    "protected",
    "public",
    "return",
    "short",
    "static",
    "strictfp",
    "super",
    "switch",
    "synchronized",
    "this",
    "throw",
    "throws",
    "transient",
    "true",
    "try",
    "void",
    "volatile",
    "while",
];

// Longest first. `>>`, `>>>` and their compound forms are never produced:
// the parser joins adjacent `>` tokens so that nested generics close cleanly.
const PUNCTUATION: &[&str] = &[
    "<<=", "...", "->", "::", "++", "--", "&&", "||", "==", "!=", "<=", ">=", "+=", "-=", "*=",
    "/=", "%=", "&=", "|=", "^=", "<<", "(", ")", "{", "}", "[", "]", ";", ",", ".", "@", "=",
    ">", "<", "!", "~", "?", ":", "+", "-", "*", "/", "&", "|", "^", "%",
];

pub fn is_keyword(text: &str) -> bool {
    KEYWORDS.binary_search(&text).is_ok()
}

pub fn lex(text: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer { text, pos: 0 };
    let mut tokens = Vec::new();
    loop {
        lexer.skip_trivia()?;
        if lexer.pos >= text.len() {
            tokens.push(Token {
                kind: TokenKind::Eof,
                span: Span::new(text.len(), text.len()),
            });
            return Ok(tokens);
        }
        tokens.push(lexer.next_token()?);
    }
}

struct Lexer<'a> {
    text: &'a str,
    pos: usize,
}

impl Lexer<'_> {
    fn rest(&self) -> &str {
        &self.text[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn byte_at(&self, offset: usize) -> Option<u8> {
        self.text.as_bytes().get(self.pos + offset).copied()
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            let rest = self.rest();
            if let Some(ch) = rest.chars().next().filter(|c| c.is_whitespace()) {
                self.pos += ch.len_utf8();
            } else if rest.starts_with("//") {
                let len = rest.find('\n').unwrap_or(rest.len());
                self.pos += len;
            } else if rest.starts_with("/*") {
                let end = rest[2..].find("*/").ok_or_else(|| {
                    ParseError::new("unterminated block comment", Span::new(self.pos, self.text.len()))
                })?;
                self.pos += end + 4;
            } else {
                return Ok(());
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        let start = self.pos;
        let ch = self
            .peek_char()
            .ok_or_else(|| ParseError::new("unexpected end of input", Span::new(start, start)))?;

        let kind = if unicode_ident::is_xid_start(ch) || ch == '_' || ch == '$' {
            self.pos += ch.len_utf8();
            while let Some(c) = self.peek_char() {
                if unicode_ident::is_xid_continue(c) || c == '$' {
                    self.pos += c.len_utf8();
                } else {
                    break;
                }
            }
            if is_keyword(&self.text[start..self.pos]) {
                TokenKind::Keyword
            } else {
                TokenKind::Ident
            }
        } else if ch.is_ascii_digit() || (ch == '.' && self.byte_at(1).is_some_and(|b| b.is_ascii_digit())) {
            self.number()
        } else if self.rest().starts_with("\"\"\"") {
            self.text_block(start)?
        } else if ch == '"' {
            self.quoted(b'"', start)?;
            TokenKind::StringLiteral
        } else if ch == '\'' {
            self.quoted(b'\'', start)?;
            TokenKind::CharLiteral
        } else if let Some(p) = PUNCTUATION.iter().find(|p| self.rest().starts_with(**p)) {
            self.pos += p.len();
            TokenKind::Punct
        } else {
            return Err(ParseError::new(
                format!("unexpected character `{ch}`"),
                Span::new(start, start + ch.len_utf8()),
            ));
        };

        Ok(Token {
            kind,
            span: Span::new(start, self.pos),
        })
    }

    fn number(&mut self) -> TokenKind {
        let bytes = self.text.as_bytes();
        let is_hex = self.rest().starts_with("0x") || self.rest().starts_with("0X");
        if is_hex || self.rest().starts_with("0b") || self.rest().starts_with("0B") {
            self.pos += 2;
        }

        let mut floating = false;
        let mut exponent = false;
        while let Some(&b) = bytes.get(self.pos) {
            let accept = match b {
                b'0'..=b'9' | b'_' => true,
                b'a'..=b'f' | b'A'..=b'F' if is_hex && !exponent => true,
                b'.' if !floating && !exponent => {
                    // A `.` followed by a letter ends the number.
                    let next = bytes.get(self.pos + 1);
                    if is_hex || next.map_or(true, |n| !n.is_ascii_alphabetic()) {
                        floating = true;
                        true
                    } else {
                        false
                    }
                }
                b'e' | b'E' | b'p' | b'P' if !exponent && (is_hex == matches!(b, b'p' | b'P')) => {
                    floating = true;
                    exponent = true;
                    if matches!(bytes.get(self.pos + 1), Some(b'+' | b'-')) {
                        self.pos += 1;
                    }
                    true
                }
                _ => false,
            };
            if !accept {
                break;
            }
            self.pos += 1;
        }

        if is_hex && !floating {
            if matches!(bytes.get(self.pos), Some(b'l' | b'L')) {
                self.pos += 1;
                return TokenKind::LongLiteral;
            }
            return TokenKind::IntLiteral;
        }

        match bytes.get(self.pos) {
            Some(b'l' | b'L') if !floating => {
                self.pos += 1;
                TokenKind::LongLiteral
            }
            Some(b'f' | b'F') => {
                self.pos += 1;
                TokenKind::FloatLiteral
            }
            Some(b'd' | b'D') => {
                self.pos += 1;
                TokenKind::DoubleLiteral
            }
            _ if floating => TokenKind::DoubleLiteral,
            _ => TokenKind::IntLiteral,
        }
    }

    fn quoted(&mut self, quote: u8, start: usize) -> Result<(), ParseError> {
        let bytes = self.text.as_bytes();
        self.pos += 1;
        while let Some(&b) = bytes.get(self.pos) {
            match b {
                b'\\' => self.pos += 2,
                b'\n' => break,
                _ if b == quote => {
                    self.pos += 1;
                    return Ok(());
                }
                _ => self.pos += 1,
            }
        }
        Err(ParseError::new(
            "unterminated literal",
            Span::new(start, self.pos.min(self.text.len())),
        ))
    }

    fn text_block(&mut self, start: usize) -> Result<TokenKind, ParseError> {
        let bytes = self.text.as_bytes();
        self.pos += 3;
        while self.pos < bytes.len() {
            if bytes[self.pos] == b'\\' {
                self.pos += 2;
                continue;
            }
            if self.rest().starts_with("\"\"\"") {
                self.pos += 3;
                return Ok(TokenKind::TextBlock);
            }
            self.pos += 1;
        }
        Err(ParseError::new(
            "unterminated text block",
            Span::new(start, self.text.len()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<(TokenKind, String)> {
        lex(text)
            .unwrap()
            .into_iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| (t.kind, text[t.span.start..t.span.end].to_string()))
            .collect()
    }

    #[test]
    fn keywords_are_sorted_for_binary_search() {
        let mut sorted = KEYWORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, KEYWORDS);
    }

    #[test]
    fn numbers_carry_their_literal_kind() {
        let toks = kinds("1 2L 3.0 4f 5e2 0xFF 0x1p3 .5 1.0d");
        let got: Vec<TokenKind> = toks.into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            got,
            vec![
                TokenKind::IntLiteral,
                TokenKind::LongLiteral,
                TokenKind::DoubleLiteral,
                TokenKind::FloatLiteral,
                TokenKind::DoubleLiteral,
                TokenKind::IntLiteral,
                TokenKind::DoubleLiteral,
                TokenKind::DoubleLiteral,
                TokenKind::DoubleLiteral,
            ]
        );
    }

    #[test]
    fn closing_generics_stay_separate() {
        let toks = kinds("Map<K, List<V>> m; a >>= 1;");
        let gts = toks.iter().filter(|(_, t)| t == ">").count();
        assert_eq!(gts, 3);
        assert!(toks.iter().any(|(_, t)| t == ">="));
    }

    #[test]
    fn comments_and_strings() {
        let toks = kinds("/* c */ \"a\\\"b\" // tail\n'x'");
        assert_eq!(
            toks,
            vec![
                (TokenKind::StringLiteral, "\"a\\\"b\"".to_string()),
                (TokenKind::CharLiteral, "'x'".to_string()),
            ]
        );
    }
}
