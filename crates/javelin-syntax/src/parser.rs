//! Recursive-descent parser producing a [`SyntaxTree`].
//!
//! The grammar covers the subset of Java the resolver consumes. Ambiguities
//! (local variable declaration vs. expression, cast vs. parenthesized
//! expression, class literal vs. field access) are settled by speculative
//! parsing: the parser takes a [`Checkpoint`], tries one reading and rewinds
//! the token cursor and the node arena when it does not fit.

use javelin_core::{Modifier, ModifierSet, Name, QualifiedName};

use crate::ast::*;
use crate::lexer::{lex, Token, TokenKind};
use crate::ParseError;

type PResult<T> = Result<T, ParseError>;

/// Parse a complete compilation unit.
pub fn parse_compilation_unit(text: &str) -> PResult<SyntaxTree> {
    let _span = tracing::debug_span!("parse_compilation_unit", len = text.len()).entered();
    let tokens = lex(text)?;
    let mut parser = Parser {
        text,
        tokens,
        pos: 0,
        nodes: Vec::new(),
    };
    let root = parser.compilation_unit()?;
    tracing::trace!(nodes = parser.nodes.len(), "parsed compilation unit");
    Ok(SyntaxTree::from_parts(text.to_string(), parser.nodes, root))
}

#[derive(Clone, Copy)]
struct Checkpoint {
    pos: usize,
    nodes: usize,
}

struct Parser<'a> {
    text: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    nodes: Vec<Node>,
}

impl<'a> Parser<'a> {
    // ----- token cursor ---------------------------------------------------

    fn nth(&self, n: usize) -> Token {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        self.tokens[idx]
    }

    fn peek(&self) -> Token {
        self.nth(0)
    }

    fn tok_text(&self, tok: Token) -> &'a str {
        &self.text[tok.span.start..tok.span.end]
    }

    fn nth_text(&self, n: usize) -> &'a str {
        self.tok_text(self.nth(n))
    }

    fn nth_is(&self, n: usize, s: &str) -> bool {
        let tok = self.nth(n);
        matches!(tok.kind, TokenKind::Punct | TokenKind::Keyword) && self.tok_text(tok) == s
    }

    fn at(&self, s: &str) -> bool {
        self.nth_is(0, s)
    }

    fn at_ident(&self) -> bool {
        self.peek().kind == TokenKind::Ident
    }

    fn at_contextual(&self, s: &str) -> bool {
        self.at_ident() && self.nth_text(0) == s
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    /// Whether tokens `n` and `n + 1` touch (no whitespace in between).
    fn adjacent(&self, n: usize) -> bool {
        self.nth(n).span.end == self.nth(n + 1).span.start
    }

    fn bump(&mut self) -> Token {
        let tok = self.peek();
        if tok.kind != TokenKind::Eof {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, s: &str) -> bool {
        if self.at(s) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, s: &str) -> PResult<()> {
        if self.eat(s) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{s}`")))
        }
    }

    fn ident(&mut self) -> PResult<Name> {
        if self.at_ident() {
            let tok = self.bump();
            Ok(Name::from(self.tok_text(tok)))
        } else {
            Err(self.error("expected identifier"))
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        let tok = self.peek();
        let found = if tok.kind == TokenKind::Eof {
            "end of input".to_string()
        } else {
            format!("`{}`", self.tok_text(tok))
        };
        ParseError::new(format!("{}, found {found}", message.into()), tok.span)
    }

    fn start(&self) -> usize {
        self.peek().span.start
    }

    fn prev_end(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].span.end
        }
    }

    // ----- arena ----------------------------------------------------------

    fn alloc(&mut self, kind: NodeKind, start: usize) -> NodeId {
        let end = self.prev_end().max(start);
        self.alloc_span(kind, Span::new(start, end))
    }

    fn alloc_span(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        for child in kind.children() {
            self.nodes[child.index()].parent = Some(id);
        }
        self.nodes.push(Node {
            kind,
            parent: None,
            span,
        });
        id
    }

    fn node_start(&self, id: NodeId) -> usize {
        self.nodes[id.index()].span.start
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            nodes: self.nodes.len(),
        }
    }

    fn rewind(&mut self, cp: Checkpoint) {
        self.pos = cp.pos;
        self.nodes.truncate(cp.nodes);
        for node in &mut self.nodes {
            if node.parent.is_some_and(|p| p.index() >= cp.nodes) {
                node.parent = None;
            }
        }
    }

    /// Run `f`; on failure restore the parser and return `None`.
    fn speculate<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> Option<T> {
        let cp = self.checkpoint();
        match f(self) {
            Ok(value) => Some(value),
            Err(_) => {
                self.rewind(cp);
                None
            }
        }
    }

    // ----- compilation unit -----------------------------------------------

    fn compilation_unit(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let mut package = None;
        if self.at("package") {
            let pkg_start = self.start();
            self.bump();
            let name = self.qualified_name()?;
            self.expect(";")?;
            package = Some(self.alloc(
                NodeKind::PackageDecl {
                    annotations: Vec::new(),
                    name,
                },
                pkg_start,
            ));
        }

        let mut imports = Vec::new();
        while self.at("import") {
            imports.push(self.import()?);
        }

        let mut types = Vec::new();
        while !self.at_eof() {
            if self.eat(";") {
                continue;
            }
            let decl_start = self.start();
            let modifiers = self.modifiers()?;
            types.push(self.type_decl(modifiers, decl_start)?);
        }

        Ok(self.alloc_span(
            NodeKind::CompilationUnit {
                package,
                imports,
                types,
            },
            Span::new(start.min(self.text.len()), self.text.len()),
        ))
    }

    fn import(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.expect("import")?;
        let is_static = self.eat("static");
        let mut name = QualifiedName::from_segments([self.ident()?]);
        let mut on_demand = false;
        while self.eat(".") {
            if self.eat("*") {
                on_demand = true;
                break;
            }
            name.push(self.ident()?);
        }
        self.expect(";")?;
        Ok(self.alloc(
            NodeKind::Import {
                name,
                is_static,
                on_demand,
            },
            start,
        ))
    }

    fn qualified_name(&mut self) -> PResult<QualifiedName> {
        let mut name = QualifiedName::from_segments([self.ident()?]);
        while self.at(".") && self.nth(1).kind == TokenKind::Ident {
            self.bump();
            name.push(self.ident()?);
        }
        Ok(name)
    }

    // ----- modifiers and annotations --------------------------------------

    fn modifiers(&mut self) -> PResult<Modifiers> {
        let mut out = Modifiers::default();
        loop {
            if self.at("@") && !self.nth_is(1, "interface") {
                out.annotations.push(self.annotation()?);
                continue;
            }
            let text = self.nth_text(0);
            let tok = self.peek();
            let modifier = match tok.kind {
                TokenKind::Keyword => Modifier::from_keyword(text),
                TokenKind::Ident if text == "sealed" && self.declaration_follows(1) => {
                    Some(Modifier::Sealed)
                }
                TokenKind::Ident
                    if text == "non"
                        && self.nth_is(1, "-")
                        && self.nth_text(2) == "sealed"
                        && self.adjacent(0)
                        && self.adjacent(1) =>
                {
                    self.bump();
                    self.bump();
                    Some(Modifier::NonSealed)
                }
                _ => None,
            };
            match modifier {
                Some(m) => {
                    self.bump();
                    out.set |= ModifierSet::from_modifiers([m]);
                }
                None => return Ok(out),
            }
        }
    }

    fn declaration_follows(&self, n: usize) -> bool {
        matches!(self.nth(n).kind, TokenKind::Keyword | TokenKind::Ident)
    }

    fn annotation(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.expect("@")?;
        let name = self.qualified_name()?;
        let mut args = Vec::new();
        if self.eat("(") {
            if !self.at(")") {
                if self.at_ident() && self.nth_is(1, "=") {
                    loop {
                        let pair_start = self.start();
                        let key = self.ident()?;
                        self.expect("=")?;
                        let value = self.element_value()?;
                        args.push(self.alloc(NodeKind::AnnotationPair { name: key, value }, pair_start));
                        if !self.eat(",") {
                            break;
                        }
                    }
                } else {
                    args.push(self.element_value()?);
                }
            }
            self.expect(")")?;
        }
        Ok(self.alloc(NodeKind::Annotation { name, args }, start))
    }

    fn element_value(&mut self) -> PResult<NodeId> {
        if self.at("@") {
            self.annotation()
        } else if self.at("{") {
            self.array_initializer_with(Self::element_value)
        } else {
            self.conditional()
        }
    }

    // ----- type declarations ----------------------------------------------

    fn type_decl(&mut self, modifiers: Modifiers, start: usize) -> PResult<NodeId> {
        let kind = if self.eat("class") {
            TypeDeclKind::Class
        } else if self.eat("interface") {
            TypeDeclKind::Interface
        } else if self.eat("enum") {
            TypeDeclKind::Enum
        } else if self.at("@") && self.nth_is(1, "interface") {
            self.bump();
            self.bump();
            TypeDeclKind::Annotation
        } else {
            return Err(self.error("expected type declaration"));
        };

        let name = self.ident()?;
        let type_params = if self.at("<") {
            self.type_params()?
        } else {
            Vec::new()
        };

        let mut extends = Vec::new();
        let mut implements = Vec::new();
        let mut permits = Vec::new();
        loop {
            if self.eat("extends") {
                extends = self.type_list()?;
            } else if self.eat("implements") {
                implements = self.type_list()?;
            } else if self.at_contextual("permits") {
                self.bump();
                permits = self.type_list()?;
            } else {
                break;
            }
        }

        let (enum_constants, members) = if kind == TypeDeclKind::Enum {
            self.enum_body(&name)?
        } else {
            (Vec::new(), self.class_body(&name)?)
        };

        Ok(self.alloc(
            NodeKind::TypeDecl(TypeDeclData {
                kind,
                name,
                modifiers,
                type_params,
                extends,
                implements,
                permits,
                enum_constants,
                members,
            }),
            start,
        ))
    }

    fn type_list(&mut self) -> PResult<Vec<NodeId>> {
        let mut out = vec![self.ty()?];
        while self.eat(",") {
            out.push(self.ty()?);
        }
        Ok(out)
    }

    fn type_params(&mut self) -> PResult<Vec<NodeId>> {
        self.expect("<")?;
        let mut out = Vec::new();
        loop {
            let start = self.start();
            let mut annotations = Vec::new();
            while self.at("@") {
                annotations.push(self.annotation()?);
            }
            let name = self.ident()?;
            let mut bounds = Vec::new();
            if self.eat("extends") {
                bounds.push(self.ty()?);
                while self.eat("&") {
                    bounds.push(self.ty()?);
                }
            }
            out.push(self.alloc(
                NodeKind::TypeParameter {
                    annotations,
                    name,
                    bounds,
                },
                start,
            ));
            if !self.eat(",") {
                break;
            }
        }
        self.expect(">")?;
        Ok(out)
    }

    fn enum_body(&mut self, type_name: &Name) -> PResult<(Vec<NodeId>, Vec<NodeId>)> {
        self.expect("{")?;
        let mut constants = Vec::new();
        while !self.at(";") && !self.at("}") {
            let start = self.start();
            let mut annotations = Vec::new();
            while self.at("@") {
                annotations.push(self.annotation()?);
            }
            let name = self.ident()?;
            let args = if self.at("(") {
                self.arguments()?
            } else {
                Vec::new()
            };
            let body = if self.at("{") {
                Some(self.class_body(&name)?)
            } else {
                None
            };
            constants.push(self.alloc(
                NodeKind::EnumConstant {
                    annotations,
                    name,
                    args,
                    body,
                },
                start,
            ));
            if !self.eat(",") {
                break;
            }
        }

        let mut members = Vec::new();
        if self.eat(";") {
            while !self.at("}") {
                if self.at_eof() {
                    return Err(self.error("unterminated enum body"));
                }
                if let Some(member) = self.member(type_name)? {
                    members.push(member);
                }
            }
        }
        self.expect("}")?;
        Ok((constants, members))
    }

    fn class_body(&mut self, type_name: &Name) -> PResult<Vec<NodeId>> {
        self.expect("{")?;
        let mut members = Vec::new();
        while !self.eat("}") {
            if self.at_eof() {
                return Err(self.error("unterminated class body"));
            }
            if let Some(member) = self.member(type_name)? {
                members.push(member);
            }
        }
        Ok(members)
    }

    fn member(&mut self, type_name: &Name) -> PResult<Option<NodeId>> {
        if self.eat(";") {
            return Ok(None);
        }
        let start = self.start();
        if self.at("{") || (self.at("static") && self.nth_is(1, "{")) {
            let is_static = self.eat("static");
            let body = self.block()?;
            return Ok(Some(self.alloc(NodeKind::Initializer { is_static, body }, start)));
        }

        let modifiers = self.modifiers()?;
        if self.at("class")
            || self.at("interface")
            || self.at("enum")
            || (self.at("@") && self.nth_is(1, "interface"))
        {
            return self.type_decl(modifiers, start).map(Some);
        }

        let type_params = if self.at("<") {
            self.type_params()?
        } else {
            Vec::new()
        };

        if self.at_ident() && self.nth_is(1, "(") {
            let name = self.ident()?;
            if name != *type_name {
                tracing::trace!(%name, %type_name, "constructor name differs from enclosing type");
            }
            let params = self.formal_params()?;
            let throws = self.throws_clause()?;
            let body = self.block()?;
            return Ok(Some(self.alloc(
                NodeKind::Constructor(ConstructorData {
                    modifiers,
                    type_params,
                    name,
                    params,
                    throws,
                    body,
                }),
                start,
            )));
        }

        let result = self.result_type()?;
        let name = self.ident()?;
        if self.at("(") {
            let params = self.formal_params()?;
            let result = self.trailing_dims(result)?;
            let throws = self.throws_clause()?;
            let mut default_value = None;
            if self.eat("default") {
                default_value = Some(self.element_value()?);
            }
            let body = if self.eat(";") {
                None
            } else {
                Some(self.block()?)
            };
            return Ok(Some(self.alloc(
                NodeKind::Method(MethodData {
                    modifiers,
                    type_params,
                    result,
                    name,
                    params,
                    throws,
                    body,
                    default_value,
                }),
                start,
            )));
        }

        let variables = self.declarators_after_first(name, self.prev_start())?;
        self.expect(";")?;
        Ok(Some(self.alloc(
            NodeKind::Field {
                modifiers,
                ty: result,
                variables,
            },
            start,
        )))
    }

    fn prev_start(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].span.start
        }
    }

    fn result_type(&mut self) -> PResult<NodeId> {
        if self.at("void") {
            let start = self.start();
            self.bump();
            return Ok(self.alloc(NodeKind::VoidType, start));
        }
        self.ty()
    }

    /// C-style `[]` after a method header or declarator name.
    fn trailing_dims(&mut self, mut ty: NodeId) -> PResult<NodeId> {
        while self.at("[") && self.nth_is(1, "]") {
            let start = self.node_start(ty);
            self.bump();
            self.bump();
            ty = self.alloc(NodeKind::ArrayType { component: ty }, start);
        }
        Ok(ty)
    }

    fn throws_clause(&mut self) -> PResult<Vec<NodeId>> {
        if self.eat("throws") {
            self.type_list()
        } else {
            Ok(Vec::new())
        }
    }

    fn formal_params(&mut self) -> PResult<Vec<NodeId>> {
        self.expect("(")?;
        let mut params = Vec::new();
        if !self.at(")") {
            loop {
                params.push(self.formal_param()?);
                if !self.eat(",") {
                    break;
                }
            }
        }
        self.expect(")")?;
        Ok(params)
    }

    fn formal_param(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let modifiers = self.modifiers()?;
        let mut ty = self.ty()?;
        let varargs = self.eat("...");
        let name = self.ident()?;
        ty = self.trailing_dims(ty)?;
        Ok(self.alloc(
            NodeKind::Parameter {
                modifiers,
                ty,
                varargs,
                name,
            },
            start,
        ))
    }

    /// Declarators of a field or local variable, the first name already consumed.
    fn declarators_after_first(&mut self, first: Name, first_start: usize) -> PResult<Vec<NodeId>> {
        let mut variables = vec![self.declarator_rest(first, first_start)?];
        while self.eat(",") {
            let start = self.start();
            let name = self.ident()?;
            variables.push(self.declarator_rest(name, start)?);
        }
        Ok(variables)
    }

    fn declarator_rest(&mut self, name: Name, start: usize) -> PResult<NodeId> {
        let mut dims = 0;
        while self.at("[") && self.nth_is(1, "]") {
            self.bump();
            self.bump();
            dims += 1;
        }
        let init = if self.eat("=") {
            Some(self.variable_initializer()?)
        } else {
            None
        };
        Ok(self.alloc(NodeKind::Variable { name, dims, init }, start))
    }

    fn variable_initializer(&mut self) -> PResult<NodeId> {
        if self.at("{") {
            self.array_initializer_with(Self::variable_initializer)
        } else {
            self.expression()
        }
    }

    fn array_initializer_with(
        &mut self,
        mut element: impl FnMut(&mut Self) -> PResult<NodeId>,
    ) -> PResult<NodeId> {
        let start = self.start();
        self.expect("{")?;
        let mut values = Vec::new();
        while !self.at("}") {
            values.push(element(self)?);
            if !self.eat(",") {
                break;
            }
        }
        self.expect("}")?;
        Ok(self.alloc(NodeKind::ArrayInit { values }, start))
    }

    // ----- types ----------------------------------------------------------

    fn ty(&mut self) -> PResult<NodeId> {
        let base = self.non_array_type()?;
        self.trailing_dims(base)
    }

    fn non_array_type(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let mut annotations = Vec::new();
        while self.at("@") {
            annotations.push(self.annotation()?);
        }
        let tok = self.peek();
        if tok.kind == TokenKind::Keyword {
            if let Some(p) = PrimitiveKeyword::from_keyword(self.tok_text(tok)) {
                self.bump();
                return Ok(self.alloc(NodeKind::PrimitiveType(p), start));
            }
        }
        if !self.at_ident() {
            return Err(self.error("expected type"));
        }

        let mut scope = None;
        loop {
            let seg_start = self.start();
            let name = self.ident()?;
            let args = if self.at("<") {
                Some(self.type_args()?)
            } else {
                None
            };
            let node = self.alloc(
                NodeKind::ClassType {
                    scope,
                    annotations: std::mem::take(&mut annotations),
                    name,
                    args,
                },
                scope.map_or(seg_start, |s| self.node_start(s)),
            );
            scope = Some(node);
            if self.at(".") && (self.nth(1).kind == TokenKind::Ident || self.nth_is(1, "@")) {
                self.bump();
                while self.at("@") {
                    annotations.push(self.annotation()?);
                }
            } else {
                break;
            }
        }
        scope.ok_or_else(|| self.error("expected type"))
    }

    fn type_args(&mut self) -> PResult<Vec<NodeId>> {
        self.expect("<")?;
        let mut args = Vec::new();
        if self.eat(">") {
            return Ok(args);
        }
        loop {
            args.push(self.type_arg()?);
            if !self.eat(",") {
                break;
            }
        }
        self.expect(">")?;
        Ok(args)
    }

    fn type_arg(&mut self) -> PResult<NodeId> {
        let start = self.start();
        while self.at("@") {
            self.annotation()?;
        }
        if self.eat("?") {
            let bound = if self.eat("extends") {
                Some((WildcardBound::Extends, self.ty()?))
            } else if self.eat("super") {
                Some((WildcardBound::Super, self.ty()?))
            } else {
                None
            };
            return Ok(self.alloc(NodeKind::WildcardType { bound }, start));
        }
        self.ty()
    }

    // ----- statements -----------------------------------------------------

    fn block(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.expect("{")?;
        let mut stmts = Vec::new();
        while !self.eat("}") {
            if self.at_eof() {
                return Err(self.error("unterminated block"));
            }
            stmts.push(self.statement()?);
        }
        Ok(self.alloc(NodeKind::Block { stmts }, start))
    }

    fn statement(&mut self) -> PResult<NodeId> {
        let start = self.start();
        if self.at("{") {
            return self.block();
        }
        if self.eat(";") {
            return Ok(self.alloc(NodeKind::Empty, start));
        }
        if self.eat("if") {
            self.expect("(")?;
            let cond = self.expression()?;
            self.expect(")")?;
            let then_branch = self.statement()?;
            let else_branch = if self.eat("else") {
                Some(self.statement()?)
            } else {
                None
            };
            return Ok(self.alloc(
                NodeKind::If {
                    cond,
                    then_branch,
                    else_branch,
                },
                start,
            ));
        }
        if self.eat("while") {
            self.expect("(")?;
            let cond = self.expression()?;
            self.expect(")")?;
            let body = self.statement()?;
            return Ok(self.alloc(NodeKind::While { cond, body }, start));
        }
        if self.eat("do") {
            let body = self.statement()?;
            self.expect("while")?;
            self.expect("(")?;
            let cond = self.expression()?;
            self.expect(")")?;
            self.expect(";")?;
            return Ok(self.alloc(NodeKind::DoWhile { body, cond }, start));
        }
        if self.at("for") {
            return self.for_statement();
        }
        if self.eat("return") {
            let expr = if self.at(";") {
                None
            } else {
                Some(self.expression()?)
            };
            self.expect(";")?;
            return Ok(self.alloc(NodeKind::Return { expr }, start));
        }
        if self.eat("throw") {
            let expr = self.expression()?;
            self.expect(";")?;
            return Ok(self.alloc(NodeKind::Throw { expr }, start));
        }
        if self.at("try") {
            return self.try_statement();
        }
        if self.eat("break") {
            let label = if self.at_ident() { Some(self.ident()?) } else { None };
            self.expect(";")?;
            return Ok(self.alloc(NodeKind::Break { label }, start));
        }
        if self.eat("continue") {
            let label = if self.at_ident() { Some(self.ident()?) } else { None };
            self.expect(";")?;
            return Ok(self.alloc(NodeKind::Continue { label }, start));
        }

        if self.at("class")
            || self.at("interface")
            || self.at("enum")
            || self.at("final")
            || self.at("abstract")
            || self.at("@")
        {
            let modifiers = self.modifiers()?;
            if self.at("class") || self.at("interface") || self.at("enum") {
                return self.type_decl(modifiers, start);
            }
            let node = self.local_var_decl_with(modifiers, start)?;
            self.expect(";")?;
            return Ok(node);
        }

        if self.looks_like_local_var_decl() {
            let node = self.local_var_decl_with(Modifiers::default(), start)?;
            self.expect(";")?;
            return Ok(node);
        }

        let expr = self.expression()?;
        self.expect(";")?;
        Ok(self.alloc(NodeKind::ExprStmt { expr }, start))
    }

    fn looks_like_local_var_decl(&mut self) -> bool {
        let tok = self.peek();
        if tok.kind == TokenKind::Keyword {
            return PrimitiveKeyword::from_keyword(self.tok_text(tok)).is_some();
        }
        if tok.kind != TokenKind::Ident {
            return false;
        }
        if self.at_contextual("var") && self.nth(1).kind == TokenKind::Ident {
            return true;
        }
        let cp = self.checkpoint();
        let result = self.ty().is_ok()
            && self.at_ident()
            && (self.nth_is(1, "=")
                || self.nth_is(1, ";")
                || self.nth_is(1, ",")
                || self.nth_is(1, "[")
                || self.nth_is(1, ":"));
        self.rewind(cp);
        result
    }

    fn local_var_type(&mut self) -> PResult<NodeId> {
        if self.at_contextual("var") && self.nth(1).kind == TokenKind::Ident {
            let start = self.start();
            self.bump();
            return Ok(self.alloc(NodeKind::VarType, start));
        }
        self.ty()
    }

    fn local_var_decl_with(&mut self, modifiers: Modifiers, start: usize) -> PResult<NodeId> {
        let ty = self.local_var_type()?;
        let first_start = self.start();
        let first = self.ident()?;
        let variables = self.declarators_after_first(first, first_start)?;
        Ok(self.alloc(
            NodeKind::LocalVar {
                modifiers,
                ty,
                variables,
            },
            start,
        ))
    }

    fn for_statement(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.expect("for")?;
        self.expect("(")?;

        let foreach = self.speculate(|p| {
            let var_start = p.start();
            let modifiers = p.modifiers()?;
            let ty = p.local_var_type()?;
            let name_start = p.start();
            let name = p.ident()?;
            p.expect(":")?;
            let variable = p.alloc(
                NodeKind::Variable {
                    name,
                    dims: 0,
                    init: None,
                },
                name_start,
            );
            Ok(p.alloc(
                NodeKind::LocalVar {
                    modifiers,
                    ty,
                    variables: vec![variable],
                },
                var_start,
            ))
        });
        if let Some(var) = foreach {
            let iterable = self.expression()?;
            self.expect(")")?;
            let body = self.statement()?;
            return Ok(self.alloc(
                NodeKind::ForEach {
                    var,
                    iterable,
                    body,
                },
                start,
            ));
        }

        let mut init = Vec::new();
        if !self.at(";") {
            let init_start = self.start();
            if self.at("final") || self.at("@") || self.looks_like_local_var_decl() {
                let modifiers = self.modifiers()?;
                init.push(self.local_var_decl_with(modifiers, init_start)?);
            } else {
                init = self.expression_statements()?;
            }
        }
        self.expect(";")?;
        let cond = if self.at(";") {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(";")?;
        let update = if self.at(")") {
            Vec::new()
        } else {
            self.expression_statements()?
        };
        self.expect(")")?;
        let body = self.statement()?;
        Ok(self.alloc(
            NodeKind::For {
                init,
                cond,
                update,
                body,
            },
            start,
        ))
    }

    fn expression_statements(&mut self) -> PResult<Vec<NodeId>> {
        let mut out = Vec::new();
        loop {
            let start = self.start();
            let expr = self.expression()?;
            out.push(self.alloc(NodeKind::ExprStmt { expr }, start));
            if !self.eat(",") {
                return Ok(out);
            }
        }
    }

    fn try_statement(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.expect("try")?;
        let mut resources = Vec::new();
        if self.eat("(") {
            while !self.at(")") {
                let res_start = self.start();
                let resource = if self.at("final") || self.looks_like_local_var_decl() {
                    let modifiers = self.modifiers()?;
                    self.local_var_decl_with(modifiers, res_start)?
                } else {
                    self.expression()?
                };
                resources.push(resource);
                if !self.eat(";") {
                    break;
                }
            }
            self.expect(")")?;
        }
        let block = self.block()?;

        let mut catches = Vec::new();
        while self.at("catch") {
            let catch_start = self.start();
            self.bump();
            self.expect("(")?;
            let param_start = self.start();
            let modifiers = self.modifiers()?;
            let first = self.ty()?;
            let ty = if self.at("|") {
                let mut alternatives = vec![first];
                while self.eat("|") {
                    alternatives.push(self.ty()?);
                }
                let union_start = self.node_start(first);
                self.alloc(NodeKind::UnionType { alternatives }, union_start)
            } else {
                first
            };
            let name = self.ident()?;
            let param = self.alloc(
                NodeKind::Parameter {
                    modifiers,
                    ty,
                    varargs: false,
                    name,
                },
                param_start,
            );
            self.expect(")")?;
            let body = self.block()?;
            catches.push(self.alloc(NodeKind::Catch { param, body }, catch_start));
        }

        let finally = if self.eat("finally") {
            Some(self.block()?)
        } else {
            None
        };
        if catches.is_empty() && finally.is_none() && resources.is_empty() {
            return Err(self.error("expected `catch` or `finally`"));
        }
        Ok(self.alloc(
            NodeKind::Try {
                resources,
                block,
                catches,
                finally,
            },
            start,
        ))
    }

    // ----- expressions ----------------------------------------------------

    pub(crate) fn expression(&mut self) -> PResult<NodeId> {
        let target = self.conditional()?;
        let Some((op, len)) = self.peek_assign_op() else {
            return Ok(target);
        };
        for _ in 0..len {
            self.bump();
        }
        let value = self.expression()?;
        let start = self.node_start(target);
        Ok(self.alloc(NodeKind::Assign { op, target, value }, start))
    }

    fn peek_assign_op(&self) -> Option<(AssignOp, usize)> {
        let compound = |op| Some((AssignOp::Compound(op), 1));
        if self.peek().kind != TokenKind::Punct {
            return None;
        }
        match self.nth_text(0) {
            "=" => Some((AssignOp::Assign, 1)),
            "+=" => compound(BinaryOp::Add),
            "-=" => compound(BinaryOp::Sub),
            "*=" => compound(BinaryOp::Mul),
            "/=" => compound(BinaryOp::Div),
            "%=" => compound(BinaryOp::Rem),
            "&=" => compound(BinaryOp::BitAnd),
            "|=" => compound(BinaryOp::BitOr),
            "^=" => compound(BinaryOp::BitXor),
            "<<=" => compound(BinaryOp::Shl),
            ">" if self.nth_is(1, ">=") && self.adjacent(0) => {
                Some((AssignOp::Compound(BinaryOp::Shr), 2))
            }
            ">" if self.nth_is(1, ">")
                && self.nth_is(2, ">=")
                && self.adjacent(0)
                && self.adjacent(1) =>
            {
                Some((AssignOp::Compound(BinaryOp::UShr), 3))
            }
            _ => None,
        }
    }

    fn conditional(&mut self) -> PResult<NodeId> {
        let cond = self.binary(0)?;
        if !self.eat("?") {
            return Ok(cond);
        }
        let then_expr = self.expression()?;
        self.expect(":")?;
        let else_expr = self.conditional()?;
        let start = self.node_start(cond);
        Ok(self.alloc(
            NodeKind::Conditional {
                cond,
                then_expr,
                else_expr,
            },
            start,
        ))
    }

    /// Binary operator at the cursor, with its precedence and token length.
    fn peek_binary_op(&self) -> Option<(BinaryOp, u8, usize)> {
        if self.peek().kind != TokenKind::Punct {
            return None;
        }
        let op = match self.nth_text(0) {
            "||" => (BinaryOp::Or, 1, 1),
            "&&" => (BinaryOp::And, 2, 1),
            "|" => (BinaryOp::BitOr, 3, 1),
            "^" => (BinaryOp::BitXor, 4, 1),
            "&" => (BinaryOp::BitAnd, 5, 1),
            "==" => (BinaryOp::Eq, 6, 1),
            "!=" => (BinaryOp::Ne, 6, 1),
            "<" => (BinaryOp::Lt, 7, 1),
            "<=" => (BinaryOp::Le, 7, 1),
            ">=" => (BinaryOp::Ge, 7, 1),
            ">" => {
                if self.nth_is(1, ">") && self.adjacent(0) {
                    if self.nth_is(2, ">") && self.adjacent(1) {
                        if self.nth_is(3, ">=") && self.adjacent(2) {
                            return None;
                        }
                        (BinaryOp::UShr, 8, 3)
                    } else if self.nth_is(2, ">=") && self.adjacent(1) {
                        return None;
                    } else {
                        (BinaryOp::Shr, 8, 2)
                    }
                } else if self.nth_is(1, ">=") && self.adjacent(0) {
                    return None;
                } else {
                    (BinaryOp::Gt, 7, 1)
                }
            }
            "<<" => (BinaryOp::Shl, 8, 1),
            "+" => (BinaryOp::Add, 9, 1),
            "-" => (BinaryOp::Sub, 9, 1),
            "*" => (BinaryOp::Mul, 10, 1),
            "/" => (BinaryOp::Div, 10, 1),
            "%" => (BinaryOp::Rem, 10, 1),
            _ => return None,
        };
        Some(op)
    }

    fn binary(&mut self, min_prec: u8) -> PResult<NodeId> {
        let mut lhs = self.unary()?;
        loop {
            if self.at("instanceof") && 7 > min_prec {
                lhs = self.instanceof_rest(lhs)?;
                continue;
            }
            let Some((op, prec, len)) = self.peek_binary_op() else {
                break;
            };
            if prec <= min_prec {
                break;
            }
            for _ in 0..len {
                self.bump();
            }
            let rhs = self.binary(prec)?;
            let start = self.node_start(lhs);
            lhs = self.alloc(NodeKind::Binary { op, lhs, rhs }, start);
        }
        Ok(lhs)
    }

    fn instanceof_rest(&mut self, expr: NodeId) -> PResult<NodeId> {
        self.expect("instanceof")?;
        let binding_start = self.start();
        let modifiers = self.modifiers()?;
        let ty = self.ty()?;
        let binding = if self.at_ident() {
            let name = self.ident()?;
            Some(self.alloc(
                NodeKind::Parameter {
                    modifiers,
                    ty,
                    varargs: false,
                    name,
                },
                binding_start,
            ))
        } else {
            None
        };
        let start = self.node_start(expr);
        Ok(self.alloc(NodeKind::InstanceOf { expr, ty, binding }, start))
    }

    fn unary(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let prefix = if self.peek().kind == TokenKind::Punct {
            match self.nth_text(0) {
                "+" => Some(UnaryOp::Plus),
                "-" => Some(UnaryOp::Minus),
                "!" => Some(UnaryOp::Not),
                "~" => Some(UnaryOp::BitNot),
                "++" => Some(UnaryOp::PreInc),
                "--" => Some(UnaryOp::PreDec),
                _ => None,
            }
        } else {
            None
        };
        if let Some(op) = prefix {
            self.bump();
            let operand = self.unary()?;
            return Ok(self.alloc(NodeKind::Unary { op, operand }, start));
        }

        if self.at("(") {
            if let Some(cast) = self.speculate(Self::cast) {
                return Ok(cast);
            }
        }
        self.postfix()
    }

    fn cast(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.expect("(")?;
        let first = self.ty()?;
        let is_primitive = matches!(self.nodes[first.index()].kind, NodeKind::PrimitiveType(_));
        let ty = if self.at("&") {
            let mut parts = vec![first];
            while self.eat("&") {
                parts.push(self.ty()?);
            }
            let parts_start = self.node_start(first);
            self.alloc(NodeKind::IntersectionType { parts }, parts_start)
        } else {
            first
        };
        self.expect(")")?;

        let operand_follows = {
            let tok = self.peek();
            let text = self.tok_text(tok);
            match tok.kind {
                TokenKind::Ident
                | TokenKind::IntLiteral
                | TokenKind::LongLiteral
                | TokenKind::FloatLiteral
                | TokenKind::DoubleLiteral
                | TokenKind::CharLiteral
                | TokenKind::StringLiteral
                | TokenKind::TextBlock => true,
                TokenKind::Keyword => matches!(
                    text,
                    "this" | "super" | "new" | "true" | "false" | "null"
                ) || PrimitiveKeyword::from_keyword(text).is_some(),
                TokenKind::Punct => {
                    matches!(text, "(" | "!" | "~")
                        || (is_primitive && matches!(text, "+" | "-" | "++" | "--"))
                }
                TokenKind::Eof => false,
            }
        };
        if !operand_follows {
            return Err(self.error("not a cast"));
        }
        let expr = self.unary()?;
        Ok(self.alloc(NodeKind::Cast { ty, expr }, start))
    }

    fn postfix(&mut self) -> PResult<NodeId> {
        let mut expr = self.primary()?;
        loop {
            let start = self.node_start(expr);
            if self.at(".") {
                self.bump();
                if self.at("<") {
                    let type_args = Some(self.type_args()?);
                    let name = self.ident()?;
                    let args = self.arguments()?;
                    expr = self.alloc(
                        NodeKind::MethodCall {
                            scope: Some(expr),
                            type_args,
                            name,
                            args,
                        },
                        start,
                    );
                } else if self.at("new") {
                    expr = self.creator(Some(expr), start)?;
                } else {
                    let name = self.ident()?;
                    if self.at("(") {
                        let args = self.arguments()?;
                        expr = self.alloc(
                            NodeKind::MethodCall {
                                scope: Some(expr),
                                type_args: None,
                                name,
                                args,
                            },
                            start,
                        );
                    } else {
                        expr = self.alloc(NodeKind::FieldAccess { scope: expr, name }, start);
                    }
                }
            } else if self.at("[") {
                self.bump();
                let index = self.expression()?;
                self.expect("]")?;
                expr = self.alloc(NodeKind::ArrayAccess { array: expr, index }, start);
            } else if self.at("++") || self.at("--") {
                let op = if self.at("++") {
                    UnaryOp::PostInc
                } else {
                    UnaryOp::PostDec
                };
                self.bump();
                expr = self.alloc(NodeKind::Unary { op, operand: expr }, start);
            } else {
                return Ok(expr);
            }
        }
    }

    fn arguments(&mut self) -> PResult<Vec<NodeId>> {
        self.expect("(")?;
        let mut args = Vec::new();
        if !self.at(")") {
            loop {
                args.push(self.expression()?);
                if !self.eat(",") {
                    break;
                }
            }
        }
        self.expect(")")?;
        Ok(args)
    }

    fn literal_kind(&self, tok: Token) -> Option<LiteralKind> {
        Some(match tok.kind {
            TokenKind::IntLiteral => LiteralKind::Int,
            TokenKind::LongLiteral => LiteralKind::Long,
            TokenKind::FloatLiteral => LiteralKind::Float,
            TokenKind::DoubleLiteral => LiteralKind::Double,
            TokenKind::CharLiteral => LiteralKind::Char,
            TokenKind::StringLiteral => LiteralKind::String,
            TokenKind::TextBlock => LiteralKind::TextBlock,
            TokenKind::Keyword => match self.tok_text(tok) {
                "true" => LiteralKind::True,
                "false" => LiteralKind::False,
                "null" => LiteralKind::Null,
                _ => return None,
            },
            _ => return None,
        })
    }

    /// `Ident (. Ident)* . this|super` without consuming anything; returns the
    /// number of identifiers in the qualifier.
    fn qualified_this_len(&self) -> Option<usize> {
        let mut n = 0;
        loop {
            if self.nth(2 * n).kind != TokenKind::Ident || !self.nth_is(2 * n + 1, ".") {
                return None;
            }
            n += 1;
            if self.nth_is(2 * n, "this") || self.nth_is(2 * n, "super") {
                return Some(n);
            }
        }
    }

    fn primary(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let tok = self.peek();

        if let Some(kind) = self.literal_kind(tok) {
            self.bump();
            return Ok(self.alloc(NodeKind::Literal(kind), start));
        }

        if self.at("(") {
            self.bump();
            let expr = self.expression()?;
            self.expect(")")?;
            return Ok(self.alloc(NodeKind::Paren { expr }, start));
        }

        if self.at("this") {
            self.bump();
            if self.at("(") {
                let args = self.arguments()?;
                return Ok(self.alloc(
                    NodeKind::MethodCall {
                        scope: None,
                        type_args: None,
                        name: Name::from("this"),
                        args,
                    },
                    start,
                ));
            }
            return Ok(self.alloc(NodeKind::This { qualifier: None }, start));
        }

        if self.at("super") {
            self.bump();
            if self.at("(") {
                let args = self.arguments()?;
                return Ok(self.alloc(
                    NodeKind::MethodCall {
                        scope: None,
                        type_args: None,
                        name: Name::from("super"),
                        args,
                    },
                    start,
                ));
            }
            return Ok(self.alloc(NodeKind::Super { qualifier: None }, start));
        }

        if self.at("new") {
            return self.creator(None, start);
        }

        if self.at("void") && self.nth_is(1, ".") && self.nth_is(2, "class") {
            self.bump();
            let ty = self.alloc(NodeKind::VoidType, start);
            self.bump();
            self.bump();
            return Ok(self.alloc(NodeKind::ClassLiteral { ty }, start));
        }

        let is_type_start = tok.kind == TokenKind::Ident
            || PrimitiveKeyword::from_keyword(self.tok_text(tok)).is_some();
        if is_type_start {
            let class_literal = self.speculate(|p| {
                let ty = p.ty()?;
                p.expect(".")?;
                p.expect("class")?;
                Ok(p.alloc(NodeKind::ClassLiteral { ty }, start))
            });
            if let Some(node) = class_literal {
                return Ok(node);
            }
        }

        if let Some(len) = self.qualified_this_len() {
            let mut qualifier = QualifiedName::default();
            for _ in 0..len {
                qualifier.push(self.ident()?);
                self.expect(".")?;
            }
            let qualifier = Some(qualifier);
            if self.eat("this") {
                return Ok(self.alloc(NodeKind::This { qualifier }, start));
            }
            self.expect("super")?;
            return Ok(self.alloc(NodeKind::Super { qualifier }, start));
        }

        if tok.kind == TokenKind::Ident {
            let name = self.ident()?;
            if self.at("(") {
                let args = self.arguments()?;
                return Ok(self.alloc(
                    NodeKind::MethodCall {
                        scope: None,
                        type_args: None,
                        name,
                        args,
                    },
                    start,
                ));
            }
            return Ok(self.alloc(NodeKind::Name { name }, start));
        }

        Err(self.error("expected expression"))
    }

    fn creator(&mut self, scope: Option<NodeId>, start: usize) -> PResult<NodeId> {
        self.expect("new")?;
        let type_args = if self.at("<") {
            Some(self.type_args()?)
        } else {
            None
        };
        let element = self.non_array_type()?;

        if self.at("[") {
            let mut dims = Vec::new();
            while self.at("[") {
                self.bump();
                if self.eat("]") {
                    dims.push(None);
                } else {
                    dims.push(Some(self.expression()?));
                    self.expect("]")?;
                }
            }
            let init = if self.at("{") {
                Some(self.array_initializer_with(Self::variable_initializer)?)
            } else {
                None
            };
            return Ok(self.alloc(
                NodeKind::ArrayCreation {
                    element,
                    dims,
                    init,
                },
                start,
            ));
        }

        let args = self.arguments()?;
        let body = if self.at("{") {
            let name = match &self.nodes[element.index()].kind {
                NodeKind::ClassType { name, .. } => name.clone(),
                _ => Name::from(""),
            };
            Some(self.class_body(&name)?)
        } else {
            None
        };
        Ok(self.alloc(
            NodeKind::New {
                scope,
                type_args,
                ty: element,
                args,
                body,
            },
            start,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> SyntaxTree {
        parse_compilation_unit(text).unwrap_or_else(|err| panic!("{err}: {text}"))
    }

    fn only<'t>(tree: &'t SyntaxTree, pred: impl FnMut(&NodeKind) -> bool) -> (NodeId, &'t NodeKind) {
        let found = tree.find_all(pred);
        assert_eq!(found.len(), 1, "expected exactly one match");
        (found[0], tree.kind(found[0]))
    }

    #[test]
    fn parses_package_imports_and_class_header() {
        let tree = parse(
            "package p.q; import java.util.*; import static java.lang.Math.max; \
             public class A<T extends Comparable<T>> extends B implements I, J {}",
        );
        assert_eq!(tree.package_name().to_dotted(), "p.q");
        assert_eq!(tree.imports().len(), 2);
        let a = tree.type_by_name("A").unwrap();
        let data = tree.type_decl(a).unwrap();
        assert_eq!(data.type_params.len(), 1);
        assert_eq!(data.extends.len(), 1);
        assert_eq!(data.implements.len(), 2);
        assert!(data.modifiers.set.contains(ModifierSet::PUBLIC));
        match tree.kind(tree.imports()[1]) {
            NodeKind::Import {
                name,
                is_static,
                on_demand,
            } => {
                assert_eq!(name.to_dotted(), "java.lang.Math.max");
                assert!(*is_static);
                assert!(!*on_demand);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn field_declarators_share_a_declaration() {
        let tree = parse("class C { static final int X = 1 + 2, Y[], Z; }");
        let (_, field) = only(&tree, |k| matches!(k, NodeKind::Field { .. }));
        let NodeKind::Field { variables, .. } = field else {
            unreachable!()
        };
        assert_eq!(variables.len(), 3);
        for &v in variables {
            assert!(matches!(tree.kind(tree.parent(v).unwrap()), NodeKind::Field { .. }));
        }
        let (_, bin) = only(&tree, |k| matches!(k, NodeKind::Binary { .. }));
        assert!(matches!(bin, NodeKind::Binary { op: BinaryOp::Add, .. }));
    }

    #[test]
    fn nested_generics_and_shift_operators() {
        let tree = parse(
            "class C { java.util.Map<String, java.util.List<Integer>> m; int s = 8 >> 1; int u = -1 >>> 28; void f() { s >>= 1; } }",
        );
        let ops: Vec<BinaryOp> = tree
            .find_all(|k| matches!(k, NodeKind::Binary { .. }))
            .into_iter()
            .map(|id| match tree.kind(id) {
                NodeKind::Binary { op, .. } => *op,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(ops, vec![BinaryOp::Shr, BinaryOp::UShr]);
        let (_, assign) = only(&tree, |k| matches!(k, NodeKind::Assign { .. }));
        assert!(matches!(
            assign,
            NodeKind::Assign {
                op: AssignOp::Compound(BinaryOp::Shr),
                ..
            }
        ));
    }

    #[test]
    fn distinguishes_casts_from_parenthesized_expressions() {
        let tree = parse("class C { void f(int a, int b) { long x = (long) a; int y = (a) + b; Object o = (Object) \"s\"; } }");
        assert_eq!(tree.find_all(|k| matches!(k, NodeKind::Cast { .. })).len(), 2);
        assert_eq!(tree.find_all(|k| matches!(k, NodeKind::Paren { .. })).len(), 1);
    }

    #[test]
    fn local_declarations_versus_expressions() {
        let tree = parse(
            "class C { void f() { java.util.List<String> xs = null; var n = 1; n = n < 2 ? 3 : 4; a.b.c(); for (String s : xs) {} for (int i = 0, j = 1; i < j; i++) {} } }",
        );
        assert_eq!(tree.find_all(|k| matches!(k, NodeKind::LocalVar { .. })).len(), 4);
        assert_eq!(tree.find_all(|k| matches!(k, NodeKind::VarType)).len(), 1);
        assert_eq!(tree.find_all(|k| matches!(k, NodeKind::ForEach { .. })).len(), 1);
        let (_, call) = only(&tree, |k| matches!(k, NodeKind::MethodCall { .. }));
        assert!(matches!(call, NodeKind::MethodCall { scope: Some(_), .. }));
    }

    #[test]
    fn varargs_throws_and_annotation_defaults() {
        let tree = parse(
            "@interface Ann { int value() default 1; String[] names() default {}; } \
             class C { @Ann(2) void m(int first, String... rest) throws Exception, Error {} C() { this(1); } C(int x) { super(); } }",
        );
        let methods = tree.find_all(|k| matches!(k, NodeKind::Method(_)));
        assert_eq!(methods.len(), 3);
        let m = tree
            .find_all(|k| matches!(k, NodeKind::Method(d) if d.name.as_str() == "m"))
            .pop()
            .unwrap();
        let NodeKind::Method(data) = tree.kind(m) else {
            unreachable!()
        };
        assert_eq!(data.throws.len(), 2);
        assert_eq!(data.modifiers.annotations.len(), 1);
        assert!(matches!(
            tree.kind(data.params[1]),
            NodeKind::Parameter { varargs: true, .. }
        ));
        assert_eq!(tree.find_all(|k| matches!(k, NodeKind::Constructor(_))).len(), 2);
    }

    #[test]
    fn enums_with_bodies_and_members() {
        let tree = parse(
            "enum Color { RED, GREEN(1) { }, BLUE; private final int v; Color() { this(0); } Color(int v) { this.v = v; } }",
        );
        let color = tree.type_by_name("Color").unwrap();
        let data = tree.type_decl(color).unwrap();
        assert_eq!(data.kind, TypeDeclKind::Enum);
        assert_eq!(data.enum_constants.len(), 3);
        assert_eq!(data.members.len(), 3);
    }

    #[test]
    fn class_literals_qualified_this_and_creators() {
        let tree = parse(
            "class Outer { class Inner { Object f() { Object a = String.class; Object b = int[].class; Object c = Outer.this; return new java.util.ArrayList<>(); } } Object[] g = new Object[3]; int[][] h = new int[][] { {1}, {2} }; }",
        );
        assert_eq!(tree.find_all(|k| matches!(k, NodeKind::ClassLiteral { .. })).len(), 2);
        let (_, this) = only(&tree, |k| matches!(k, NodeKind::This { .. }));
        assert!(matches!(this, NodeKind::This { qualifier: Some(q) } if q.to_dotted() == "Outer"));
        let (_, new) = only(&tree, |k| matches!(k, NodeKind::New { .. }));
        let NodeKind::New { ty, .. } = new else {
            unreachable!()
        };
        assert!(matches!(tree.kind(*ty), NodeKind::ClassType { args: Some(a), .. } if a.is_empty()));
        assert_eq!(tree.find_all(|k| matches!(k, NodeKind::ArrayCreation { .. })).len(), 2);
        assert_eq!(tree.type_path(tree.type_by_name("Outer.Inner").unwrap()).as_deref(), Some("Outer.Inner"));
    }

    #[test]
    fn instanceof_with_pattern_and_try_catch() {
        let tree = parse(
            "class C { void f(Object o) { if (o instanceof String s && s.isEmpty()) {} try { f(o); } catch (IllegalStateException | IllegalArgumentException e) { throw e; } finally { } } }",
        );
        let (_, inst) = only(&tree, |k| matches!(k, NodeKind::InstanceOf { .. }));
        assert!(matches!(inst, NodeKind::InstanceOf { binding: Some(_), .. }));
        assert_eq!(tree.find_all(|k| matches!(k, NodeKind::UnionType { .. })).len(), 1);
    }

    #[test]
    fn parents_point_at_enclosing_nodes() {
        let tree = parse("class A { void m() { int x = 1; } }");
        let (lit, _) = only(&tree, |k| matches!(k, NodeKind::Literal(_)));
        let method = tree
            .find_ancestor(lit, |k| matches!(k, NodeKind::Method(_)))
            .unwrap();
        assert_eq!(tree.enclosing_type(method), tree.type_by_name("A"));
        assert_eq!(tree.node_text(lit), "1");
        for id in tree.descendants(tree.root()) {
            for child in tree.children(id) {
                assert_eq!(tree.parent(child), Some(id));
            }
        }
    }

    #[test]
    fn syntax_errors_carry_a_span() {
        let err = parse_compilation_unit("class A { int }").unwrap_err();
        assert!(err.span.start > 0);
        assert!(err.message.contains("expected identifier"), "{}", err.message);
    }
}
