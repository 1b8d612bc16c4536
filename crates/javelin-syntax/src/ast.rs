//! Arena syntax tree.
//!
//! Every node lives in a single `Vec` owned by [`SyntaxTree`] and is addressed
//! by a [`NodeId`]. Nodes know their parent and their source span; children
//! are stored inline in the typed [`NodeKind`] payload.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use javelin_core::{ModifierSet, Name, PackageName, QualifiedName};

/// Process-unique identity of a parsed tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeId(u32);

impl TreeId {
    pub(crate) fn fresh() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        TreeId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_index(idx: usize) -> Self {
        NodeId(idx as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeDeclKind {
    Class,
    Interface,
    Enum,
    Annotation,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Modifiers {
    pub set: ModifierSet,
    pub annotations: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDeclData {
    pub kind: TypeDeclKind,
    pub name: Name,
    pub modifiers: Modifiers,
    pub type_params: Vec<NodeId>,
    pub extends: Vec<NodeId>,
    pub implements: Vec<NodeId>,
    pub permits: Vec<NodeId>,
    pub enum_constants: Vec<NodeId>,
    pub members: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodData {
    pub modifiers: Modifiers,
    pub type_params: Vec<NodeId>,
    /// A type node, or [`NodeKind::VoidType`].
    pub result: NodeId,
    pub name: Name,
    pub params: Vec<NodeId>,
    pub throws: Vec<NodeId>,
    pub body: Option<NodeId>,
    /// `default` value of an annotation type element.
    pub default_value: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorData {
    pub modifiers: Modifiers,
    pub type_params: Vec<NodeId>,
    pub name: Name,
    pub params: Vec<NodeId>,
    pub throws: Vec<NodeId>,
    pub body: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKeyword {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKeyword {
    pub fn from_keyword(text: &str) -> Option<Self> {
        Some(match text {
            "boolean" => PrimitiveKeyword::Boolean,
            "byte" => PrimitiveKeyword::Byte,
            "short" => PrimitiveKeyword::Short,
            "char" => PrimitiveKeyword::Char,
            "int" => PrimitiveKeyword::Int,
            "long" => PrimitiveKeyword::Long,
            "float" => PrimitiveKeyword::Float,
            "double" => PrimitiveKeyword::Double,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WildcardBound {
    Extends,
    Super,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Int,
    Long,
    Float,
    Double,
    Char,
    String,
    TextBlock,
    True,
    False,
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Shl,
    Shr,
    UShr,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }

    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge
        )
    }

    pub fn is_shift(self) -> bool {
        matches!(self, BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr)
    }
}

/// `=` or a compound assignment `op=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    Compound(BinaryOp),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    CompilationUnit {
        package: Option<NodeId>,
        imports: Vec<NodeId>,
        types: Vec<NodeId>,
    },
    PackageDecl {
        annotations: Vec<NodeId>,
        name: QualifiedName,
    },
    Import {
        name: QualifiedName,
        is_static: bool,
        on_demand: bool,
    },

    TypeDecl(TypeDeclData),
    EnumConstant {
        annotations: Vec<NodeId>,
        name: Name,
        args: Vec<NodeId>,
        body: Option<Vec<NodeId>>,
    },
    /// One field declaration; several variables may share it.
    Field {
        modifiers: Modifiers,
        ty: NodeId,
        variables: Vec<NodeId>,
    },
    /// A declarator inside a field or local variable declaration.
    Variable {
        name: Name,
        /// Extra `[]` after the name (`int x[]`).
        dims: usize,
        init: Option<NodeId>,
    },
    Method(MethodData),
    Constructor(ConstructorData),
    Parameter {
        modifiers: Modifiers,
        ty: NodeId,
        varargs: bool,
        name: Name,
    },
    TypeParameter {
        annotations: Vec<NodeId>,
        name: Name,
        bounds: Vec<NodeId>,
    },
    Initializer {
        is_static: bool,
        body: NodeId,
    },
    Annotation {
        name: QualifiedName,
        /// Either a single value expression or [`NodeKind::AnnotationPair`]s.
        args: Vec<NodeId>,
    },
    AnnotationPair {
        name: Name,
        value: NodeId,
    },

    PrimitiveType(PrimitiveKeyword),
    VoidType,
    /// `var` in a local variable declaration.
    VarType,
    ClassType {
        scope: Option<NodeId>,
        annotations: Vec<NodeId>,
        name: Name,
        /// `None` when no `<...>` was written, `Some(vec![])` for the diamond.
        args: Option<Vec<NodeId>>,
    },
    ArrayType {
        component: NodeId,
    },
    WildcardType {
        bound: Option<(WildcardBound, NodeId)>,
    },
    UnionType {
        alternatives: Vec<NodeId>,
    },
    IntersectionType {
        parts: Vec<NodeId>,
    },

    Block {
        stmts: Vec<NodeId>,
    },
    LocalVar {
        modifiers: Modifiers,
        ty: NodeId,
        variables: Vec<NodeId>,
    },
    ExprStmt {
        expr: NodeId,
    },
    Return {
        expr: Option<NodeId>,
    },
    If {
        cond: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    While {
        cond: NodeId,
        body: NodeId,
    },
    DoWhile {
        body: NodeId,
        cond: NodeId,
    },
    For {
        init: Vec<NodeId>,
        cond: Option<NodeId>,
        update: Vec<NodeId>,
        body: NodeId,
    },
    ForEach {
        /// A [`NodeKind::LocalVar`] with a single variable and no initializer.
        var: NodeId,
        iterable: NodeId,
        body: NodeId,
    },
    Throw {
        expr: NodeId,
    },
    Try {
        resources: Vec<NodeId>,
        block: NodeId,
        catches: Vec<NodeId>,
        finally: Option<NodeId>,
    },
    Catch {
        param: NodeId,
        body: NodeId,
    },
    Break {
        label: Option<Name>,
    },
    Continue {
        label: Option<Name>,
    },
    Empty,

    Literal(LiteralKind),
    Name {
        name: Name,
    },
    FieldAccess {
        scope: NodeId,
        name: Name,
    },
    MethodCall {
        scope: Option<NodeId>,
        type_args: Option<Vec<NodeId>>,
        name: Name,
        args: Vec<NodeId>,
    },
    New {
        scope: Option<NodeId>,
        type_args: Option<Vec<NodeId>>,
        ty: NodeId,
        args: Vec<NodeId>,
        /// Anonymous class body members.
        body: Option<Vec<NodeId>>,
    },
    ArrayCreation {
        element: NodeId,
        /// One entry per `[]`; `None` for dimensions without a size.
        dims: Vec<Option<NodeId>>,
        init: Option<NodeId>,
    },
    ArrayInit {
        values: Vec<NodeId>,
    },
    ArrayAccess {
        array: NodeId,
        index: NodeId,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
    },
    Binary {
        op: BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
    },
    Cast {
        ty: NodeId,
        expr: NodeId,
    },
    Conditional {
        cond: NodeId,
        then_expr: NodeId,
        else_expr: NodeId,
    },
    Assign {
        op: AssignOp,
        target: NodeId,
        value: NodeId,
    },
    InstanceOf {
        expr: NodeId,
        ty: NodeId,
        /// Pattern variable as a [`NodeKind::Parameter`].
        binding: Option<NodeId>,
    },
    This {
        qualifier: Option<QualifiedName>,
    },
    Super {
        qualifier: Option<QualifiedName>,
    },
    ClassLiteral {
        ty: NodeId,
    },
    Paren {
        expr: NodeId,
    },
}

impl NodeKind {
    /// Children in source order.
    pub fn children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        match self {
            NodeKind::CompilationUnit {
                package,
                imports,
                types,
            } => {
                out.extend(*package);
                out.extend(imports);
                out.extend(types);
            }
            NodeKind::PackageDecl { annotations, .. } => out.extend(annotations),
            NodeKind::Import { .. } => {}
            NodeKind::TypeDecl(data) => {
                out.extend(&data.modifiers.annotations);
                out.extend(&data.type_params);
                out.extend(&data.extends);
                out.extend(&data.implements);
                out.extend(&data.permits);
                out.extend(&data.enum_constants);
                out.extend(&data.members);
            }
            NodeKind::EnumConstant {
                annotations,
                args,
                body,
                ..
            } => {
                out.extend(annotations);
                out.extend(args);
                if let Some(body) = body {
                    out.extend(body);
                }
            }
            NodeKind::Field {
                modifiers,
                ty,
                variables,
            }
            | NodeKind::LocalVar {
                modifiers,
                ty,
                variables,
            } => {
                out.extend(&modifiers.annotations);
                out.push(*ty);
                out.extend(variables);
            }
            NodeKind::Variable { init, .. } => out.extend(*init),
            NodeKind::Method(data) => {
                out.extend(&data.modifiers.annotations);
                out.extend(&data.type_params);
                out.push(data.result);
                out.extend(&data.params);
                out.extend(&data.throws);
                out.extend(data.body);
                out.extend(data.default_value);
            }
            NodeKind::Constructor(data) => {
                out.extend(&data.modifiers.annotations);
                out.extend(&data.type_params);
                out.extend(&data.params);
                out.extend(&data.throws);
                out.push(data.body);
            }
            NodeKind::Parameter { modifiers, ty, .. } => {
                out.extend(&modifiers.annotations);
                out.push(*ty);
            }
            NodeKind::TypeParameter {
                annotations,
                bounds,
                ..
            } => {
                out.extend(annotations);
                out.extend(bounds);
            }
            NodeKind::Initializer { body, .. } => out.push(*body),
            NodeKind::Annotation { args, .. } => out.extend(args),
            NodeKind::AnnotationPair { value, .. } => out.push(*value),
            NodeKind::PrimitiveType(_) | NodeKind::VoidType | NodeKind::VarType => {}
            NodeKind::ClassType {
                scope,
                annotations,
                args,
                ..
            } => {
                out.extend(*scope);
                out.extend(annotations);
                if let Some(args) = args {
                    out.extend(args);
                }
            }
            NodeKind::ArrayType { component } => out.push(*component),
            NodeKind::WildcardType { bound } => out.extend(bound.map(|(_, b)| b)),
            NodeKind::UnionType { alternatives } => out.extend(alternatives),
            NodeKind::IntersectionType { parts } => out.extend(parts),
            NodeKind::Block { stmts } => out.extend(stmts),
            NodeKind::ExprStmt { expr } | NodeKind::Throw { expr } => out.push(*expr),
            NodeKind::Return { expr } => out.extend(*expr),
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                out.push(*cond);
                out.push(*then_branch);
                out.extend(*else_branch);
            }
            NodeKind::While { cond, body } => {
                out.push(*cond);
                out.push(*body);
            }
            NodeKind::DoWhile { body, cond } => {
                out.push(*body);
                out.push(*cond);
            }
            NodeKind::For {
                init,
                cond,
                update,
                body,
            } => {
                out.extend(init);
                out.extend(*cond);
                out.extend(update);
                out.push(*body);
            }
            NodeKind::ForEach {
                var,
                iterable,
                body,
            } => {
                out.push(*var);
                out.push(*iterable);
                out.push(*body);
            }
            NodeKind::Try {
                resources,
                block,
                catches,
                finally,
            } => {
                out.extend(resources);
                out.push(*block);
                out.extend(catches);
                out.extend(*finally);
            }
            NodeKind::Catch { param, body } => {
                out.push(*param);
                out.push(*body);
            }
            NodeKind::Break { .. }
            | NodeKind::Continue { .. }
            | NodeKind::Empty
            | NodeKind::Literal(_)
            | NodeKind::Name { .. }
            | NodeKind::This { .. }
            | NodeKind::Super { .. } => {}
            NodeKind::FieldAccess { scope, .. } => out.push(*scope),
            NodeKind::MethodCall {
                scope,
                type_args,
                args,
                ..
            } => {
                out.extend(*scope);
                if let Some(type_args) = type_args {
                    out.extend(type_args);
                }
                out.extend(args);
            }
            NodeKind::New {
                scope,
                type_args,
                ty,
                args,
                body,
            } => {
                out.extend(*scope);
                if let Some(type_args) = type_args {
                    out.extend(type_args);
                }
                out.push(*ty);
                out.extend(args);
                if let Some(body) = body {
                    out.extend(body);
                }
            }
            NodeKind::ArrayCreation {
                element,
                dims,
                init,
            } => {
                out.push(*element);
                out.extend(dims.iter().flatten());
                out.extend(*init);
            }
            NodeKind::ArrayInit { values } => out.extend(values),
            NodeKind::ArrayAccess { array, index } => {
                out.push(*array);
                out.push(*index);
            }
            NodeKind::Unary { operand, .. } => out.push(*operand),
            NodeKind::Binary { lhs, rhs, .. } => {
                out.push(*lhs);
                out.push(*rhs);
            }
            NodeKind::Cast { ty, expr } => {
                out.push(*ty);
                out.push(*expr);
            }
            NodeKind::Conditional {
                cond,
                then_expr,
                else_expr,
            } => {
                out.push(*cond);
                out.push(*then_expr);
                out.push(*else_expr);
            }
            NodeKind::Assign { target, value, .. } => {
                out.push(*target);
                out.push(*value);
            }
            NodeKind::InstanceOf { expr, ty, binding } => {
                out.push(*expr);
                out.push(*ty);
                out.extend(*binding);
            }
            NodeKind::ClassLiteral { ty } => out.push(*ty),
            NodeKind::Paren { expr } => out.push(*expr),
        }
        out
    }

    /// Short, stable label used in `Debug`/`Display` output of declarations.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::CompilationUnit { .. } => "CompilationUnit",
            NodeKind::PackageDecl { .. } => "PackageDeclaration",
            NodeKind::Import { .. } => "ImportDeclaration",
            NodeKind::TypeDecl(data) => match data.kind {
                TypeDeclKind::Class => "ClassDeclaration",
                TypeDeclKind::Interface => "InterfaceDeclaration",
                TypeDeclKind::Enum => "EnumDeclaration",
                TypeDeclKind::Annotation => "AnnotationDeclaration",
            },
            NodeKind::EnumConstant { .. } => "EnumConstantDeclaration",
            NodeKind::Field { .. } => "FieldDeclaration",
            NodeKind::Variable { .. } => "VariableDeclarator",
            NodeKind::Method(_) => "MethodDeclaration",
            NodeKind::Constructor(_) => "ConstructorDeclaration",
            NodeKind::Parameter { .. } => "Parameter",
            NodeKind::TypeParameter { .. } => "TypeParameter",
            NodeKind::Initializer { .. } => "InitializerDeclaration",
            NodeKind::Annotation { .. } => "Annotation",
            NodeKind::AnnotationPair { .. } => "MemberValuePair",
            NodeKind::PrimitiveType(_) => "PrimitiveType",
            NodeKind::VoidType => "VoidType",
            NodeKind::VarType => "VarType",
            NodeKind::ClassType { .. } => "ClassOrInterfaceType",
            NodeKind::ArrayType { .. } => "ArrayType",
            NodeKind::WildcardType { .. } => "WildcardType",
            NodeKind::UnionType { .. } => "UnionType",
            NodeKind::IntersectionType { .. } => "IntersectionType",
            NodeKind::Block { .. } => "BlockStmt",
            NodeKind::LocalVar { .. } => "VariableDeclarationExpr",
            NodeKind::ExprStmt { .. } => "ExpressionStmt",
            NodeKind::Return { .. } => "ReturnStmt",
            NodeKind::If { .. } => "IfStmt",
            NodeKind::While { .. } => "WhileStmt",
            NodeKind::DoWhile { .. } => "DoStmt",
            NodeKind::For { .. } => "ForStmt",
            NodeKind::ForEach { .. } => "ForEachStmt",
            NodeKind::Throw { .. } => "ThrowStmt",
            NodeKind::Try { .. } => "TryStmt",
            NodeKind::Catch { .. } => "CatchClause",
            NodeKind::Break { .. } => "BreakStmt",
            NodeKind::Continue { .. } => "ContinueStmt",
            NodeKind::Empty => "EmptyStmt",
            NodeKind::Literal(_) => "LiteralExpr",
            NodeKind::Name { .. } => "NameExpr",
            NodeKind::FieldAccess { .. } => "FieldAccessExpr",
            NodeKind::MethodCall { .. } => "MethodCallExpr",
            NodeKind::New { .. } => "ObjectCreationExpr",
            NodeKind::ArrayCreation { .. } => "ArrayCreationExpr",
            NodeKind::ArrayInit { .. } => "ArrayInitializerExpr",
            NodeKind::ArrayAccess { .. } => "ArrayAccessExpr",
            NodeKind::Unary { .. } => "UnaryExpr",
            NodeKind::Binary { .. } => "BinaryExpr",
            NodeKind::Cast { .. } => "CastExpr",
            NodeKind::Conditional { .. } => "ConditionalExpr",
            NodeKind::Assign { .. } => "AssignExpr",
            NodeKind::InstanceOf { .. } => "InstanceOfExpr",
            NodeKind::This { .. } => "ThisExpr",
            NodeKind::Super { .. } => "SuperExpr",
            NodeKind::ClassLiteral { .. } => "ClassExpr",
            NodeKind::Paren { .. } => "EnclosedExpr",
        }
    }

    pub fn is_type_decl(&self) -> bool {
        matches!(self, NodeKind::TypeDecl(_))
    }

    pub fn is_type(&self) -> bool {
        matches!(
            self,
            NodeKind::PrimitiveType(_)
                | NodeKind::VoidType
                | NodeKind::VarType
                | NodeKind::ClassType { .. }
                | NodeKind::ArrayType { .. }
                | NodeKind::WildcardType { .. }
                | NodeKind::UnionType { .. }
                | NodeKind::IntersectionType { .. }
        )
    }

    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            NodeKind::Literal(_)
                | NodeKind::Name { .. }
                | NodeKind::FieldAccess { .. }
                | NodeKind::MethodCall { .. }
                | NodeKind::New { .. }
                | NodeKind::ArrayCreation { .. }
                | NodeKind::ArrayInit { .. }
                | NodeKind::ArrayAccess { .. }
                | NodeKind::Unary { .. }
                | NodeKind::Binary { .. }
                | NodeKind::Cast { .. }
                | NodeKind::Conditional { .. }
                | NodeKind::Assign { .. }
                | NodeKind::InstanceOf { .. }
                | NodeKind::This { .. }
                | NodeKind::Super { .. }
                | NodeKind::ClassLiteral { .. }
                | NodeKind::Paren { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub span: Span,
}

/// A parsed compilation unit.
pub struct SyntaxTree {
    id: TreeId,
    text: String,
    nodes: Vec<Node>,
    root: NodeId,
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("id", &self.id)
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

impl SyntaxTree {
    pub(crate) fn from_parts(text: String, nodes: Vec<Node>, root: NodeId) -> Self {
        Self {
            id: TreeId::fresh(),
            text,
            nodes,
            root,
        }
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn source(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.node(id).span
    }

    pub fn text(&self, span: Span) -> &str {
        self.text.get(span.start..span.end).unwrap_or("")
    }

    pub fn node_text(&self, id: NodeId) -> &str {
        self.text(self.span(id))
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.kind(id).children()
    }

    /// Strict ancestors, innermost first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    pub fn find_ancestor(
        &self,
        id: NodeId,
        mut pred: impl FnMut(&NodeKind) -> bool,
    ) -> Option<NodeId> {
        self.ancestors(id).find(|&a| pred(self.kind(a)))
    }

    /// Pre-order traversal of `id` and everything below it.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            let mut children = self.children(next);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    pub fn find_all(&self, mut pred: impl FnMut(&NodeKind) -> bool) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&id| pred(self.kind(id)))
            .collect()
    }

    pub fn type_decl(&self, id: NodeId) -> Option<&TypeDeclData> {
        match self.kind(id) {
            NodeKind::TypeDecl(data) => Some(data),
            _ => None,
        }
    }

    /// Nearest enclosing type declaration, not counting `id` itself.
    pub fn enclosing_type(&self, id: NodeId) -> Option<NodeId> {
        self.find_ancestor(id, NodeKind::is_type_decl)
    }

    pub fn package_name(&self) -> PackageName {
        match self.kind(self.root) {
            NodeKind::CompilationUnit {
                package: Some(pkg), ..
            } => match self.kind(*pkg) {
                NodeKind::PackageDecl { name, .. } => PackageName::from_dotted(&name.to_dotted()),
                _ => PackageName::unnamed(),
            },
            _ => PackageName::unnamed(),
        }
    }

    pub fn imports(&self) -> Vec<NodeId> {
        match self.kind(self.root) {
            NodeKind::CompilationUnit { imports, .. } => imports.clone(),
            _ => Vec::new(),
        }
    }

    pub fn top_level_types(&self) -> Vec<NodeId> {
        match self.kind(self.root) {
            NodeKind::CompilationUnit { types, .. } => types.clone(),
            _ => Vec::new(),
        }
    }

    /// Find a type declaration by simple or dotted name (`Outer.Inner`),
    /// starting from the top-level types.
    pub fn type_by_name(&self, name: &str) -> Option<NodeId> {
        let mut segments = name.split('.');
        let first = segments.next()?;
        let mut current = self
            .top_level_types()
            .into_iter()
            .find(|&t| self.type_decl(t).is_some_and(|d| d.name.as_str() == first))?;
        for segment in segments {
            current = self.member_type(current, segment)?;
        }
        Some(current)
    }

    /// Nested type declared directly inside `owner`.
    pub fn member_type(&self, owner: NodeId, name: &str) -> Option<NodeId> {
        let data = self.type_decl(owner)?;
        data.members
            .iter()
            .copied()
            .find(|&m| self.type_decl(m).is_some_and(|d| d.name.as_str() == name))
    }

    /// Dotted name of a type declaration relative to its package
    /// (`Outer.Inner`). Local classes are named by their simple name.
    pub fn type_path(&self, id: NodeId) -> Option<String> {
        let mut parts = vec![self.type_decl(id)?.name.to_string()];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            match self.kind(parent) {
                NodeKind::TypeDecl(data) => parts.push(data.name.to_string()),
                NodeKind::CompilationUnit { .. } => break,
                _ => return Some(parts[0].clone()),
            }
            current = parent;
        }
        parts.reverse();
        Some(parts.join("."))
    }
}

pub struct Ancestors<'a> {
    tree: &'a SyntaxTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}
