//! Java syntax trees for the resolver.
//!
//! [`parse_compilation_unit`] turns source text into an arena [`SyntaxTree`]
//! whose nodes carry parent links, byte spans and typed children.

pub mod ast;
mod lexer;
mod literals;
mod parser;

pub use ast::*;
pub use lexer::{is_keyword, lex, Token, TokenKind};
pub use literals::{
    parse_double_literal, parse_float_literal, parse_int_literal, parse_literal,
    parse_long_literal, parse_negated_int_literal, parse_negated_long_literal,
    unescape_char_literal, unescape_string_literal, unescape_text_block, LiteralError,
    LiteralValue,
};
pub use parser::parse_compilation_unit;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at {}..{}", span.start, span.end)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}
