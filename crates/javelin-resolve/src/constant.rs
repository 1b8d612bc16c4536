//! Compile-time constant evaluation (JLS 15.29).
//!
//! Every failure (an operand that is not constant, division by zero, an
//! unparsable literal, a cycle between constants) yields `None`; evaluation
//! never reports an error.

use javelin_syntax::{
    parse_literal, parse_negated_int_literal, parse_negated_long_literal, BinaryOp, LiteralKind,
    LiteralValue, NodeId, NodeKind, SyntaxTree, UnaryOp,
};
use javelin_types::{ConstantValue, PrimitiveType};

use crate::source::{field_modifiers, primitive_of};

const MAX_DEPTH: usize = 256;

/// Type a constant is converted to when stored in a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConstantTarget {
    Primitive(PrimitiveType),
    String,
}

impl ConstantTarget {
    /// The target for a declared type node, if constants of it exist at all.
    pub(crate) fn of_type_node(tree: &SyntaxTree, ty: NodeId) -> Option<Self> {
        match tree.kind(ty) {
            NodeKind::PrimitiveType(kw) => Some(ConstantTarget::Primitive(primitive_of(*kw))),
            NodeKind::ClassType { args: None, .. } => {
                matches!(tree.node_text(ty).trim(), "String" | "java.lang.String")
                    .then_some(ConstantTarget::String)
            }
            _ => None,
        }
    }
}

/// Assignment conversion of a constant (JLS 5.2): widening, plus narrowing of
/// `int`-like constants that fit into `byte`, `short` or `char`.
pub(crate) fn assignment_conversion(value: ConstantValue, target: ConstantTarget) -> Option<ConstantValue> {
    match target {
        ConstantTarget::String => value.as_str().is_some().then_some(value),
        ConstantTarget::Primitive(p) => {
            let from = value.primitive_type()?;
            if from.widens_to(p) {
                return value.cast_to(p);
            }
            let narrows = value.as_int_like().is_some()
                && from != PrimitiveType::Long
                && matches!(p, PrimitiveType::Byte | PrimitiveType::Short | PrimitiveType::Char)
                && p.admits_constant(&value);
            if narrows {
                value.cast_to(p)
            } else {
                None
            }
        }
    }
}

/// Folds expressions over literals. Simple and qualified names are handed
/// to `names`, which decides whether they denote constant variables.
pub(crate) struct ConstantEvaluator<'a> {
    tree: &'a SyntaxTree,
    names: &'a mut dyn FnMut(NodeId) -> Option<ConstantValue>,
}

impl<'a> ConstantEvaluator<'a> {
    pub(crate) fn new(tree: &'a SyntaxTree, names: &'a mut dyn FnMut(NodeId) -> Option<ConstantValue>) -> Self {
        Self { tree, names }
    }

    pub(crate) fn evaluate(&mut self, expr: NodeId) -> Option<ConstantValue> {
        self.eval(expr, 0)
    }

    fn eval(&mut self, expr: NodeId, depth: usize) -> Option<ConstantValue> {
        if depth > MAX_DEPTH {
            return None;
        }
        let next = depth + 1;
        let tree = self.tree;
        match tree.kind(expr) {
            NodeKind::Literal(kind) => literal(*kind, tree.node_text(expr)),
            NodeKind::Paren { expr } => self.eval(*expr, next),
            NodeKind::Name { .. } | NodeKind::FieldAccess { .. } => (self.names)(expr),
            NodeKind::Unary {
                op: UnaryOp::Minus,
                operand,
            } if matches!(tree.kind(*operand), NodeKind::Literal(LiteralKind::Int | LiteralKind::Long)) => {
                // `-2147483648` is only representable as a negated literal.
                let text = tree.node_text(*operand);
                match tree.kind(*operand) {
                    NodeKind::Literal(LiteralKind::Int) => parse_negated_int_literal(text).ok().map(ConstantValue::Int),
                    _ => parse_negated_long_literal(text).ok().map(ConstantValue::Long),
                }
            }
            NodeKind::Unary { op, operand } => {
                let value = self.eval(*operand, next)?;
                unary(*op, &value)
            }
            NodeKind::Binary { op, lhs, rhs } => {
                let (op, rhs) = (*op, *rhs);
                let lhs = self.eval(*lhs, next)?;
                // `&&` and `||` still need a constant right operand.
                let rhs = self.eval(rhs, next)?;
                binary(op, &lhs, &rhs)
            }
            NodeKind::Cast { ty, expr } => {
                let target = ConstantTarget::of_type_node(tree, *ty)?;
                let value = self.eval(*expr, next)?;
                match target {
                    ConstantTarget::Primitive(p) => value.cast_to(p),
                    ConstantTarget::String => value.as_str().is_some().then_some(value),
                }
            }
            NodeKind::Conditional {
                cond,
                then_expr,
                else_expr,
            } => {
                let (then_expr, else_expr) = (*then_expr, *else_expr);
                let cond = self.eval(*cond, next)?.as_bool()?;
                let a = self.eval(then_expr, next)?;
                let b = self.eval(else_expr, next)?;
                conditional(cond, a, b)
            }
            _ => None,
        }
    }
}

fn literal(kind: LiteralKind, text: &str) -> Option<ConstantValue> {
    Some(match parse_literal(kind, text).ok()? {
        LiteralValue::Int(v) => ConstantValue::Int(v),
        LiteralValue::Long(v) => ConstantValue::Long(v),
        LiteralValue::Float(v) => ConstantValue::Float(v),
        LiteralValue::Double(v) => ConstantValue::Double(v),
        LiteralValue::Char(c) => ConstantValue::Char(u16::try_from(u32::from(c)).ok()?),
        LiteralValue::String(s) => ConstantValue::String(s),
        LiteralValue::Boolean(b) => ConstantValue::Boolean(b),
        LiteralValue::Null => return None,
    })
}

fn unary(op: UnaryOp, value: &ConstantValue) -> Option<ConstantValue> {
    if op == UnaryOp::Not {
        return Some(ConstantValue::Boolean(!value.as_bool()?));
    }
    let promoted = value.primitive_type()?.unary_promotion()?;
    let value = value.cast_to(promoted)?;
    match op {
        UnaryOp::Plus => Some(value),
        UnaryOp::Minus => Some(match value {
            ConstantValue::Int(v) => ConstantValue::Int(v.wrapping_neg()),
            ConstantValue::Long(v) => ConstantValue::Long(v.wrapping_neg()),
            ConstantValue::Float(v) => ConstantValue::Float(-v),
            ConstantValue::Double(v) => ConstantValue::Double(-v),
            _ => return None,
        }),
        UnaryOp::BitNot => Some(match value {
            ConstantValue::Int(v) => ConstantValue::Int(!v),
            ConstantValue::Long(v) => ConstantValue::Long(!v),
            _ => return None,
        }),
        // Increments and decrements need a variable.
        _ => None,
    }
}

fn binary(op: BinaryOp, lhs: &ConstantValue, rhs: &ConstantValue) -> Option<ConstantValue> {
    if op == BinaryOp::Add && (lhs.as_str().is_some() || rhs.as_str().is_some()) {
        let mut out = lhs.to_java_string();
        out.push_str(&rhs.to_java_string());
        return Some(ConstantValue::String(out));
    }
    if let (Some(a), Some(b)) = (lhs.as_bool(), rhs.as_bool()) {
        return Some(ConstantValue::Boolean(match op {
            BinaryOp::And | BinaryOp::BitAnd => a && b,
            BinaryOp::Or | BinaryOp::BitOr => a || b,
            BinaryOp::BitXor | BinaryOp::Ne => a != b,
            BinaryOp::Eq => a == b,
            _ => return None,
        }));
    }
    if op.is_shift() {
        return shift(op, lhs, rhs);
    }

    let promoted = PrimitiveType::binary_promotion(lhs.primitive_type()?, rhs.primitive_type()?)?;
    let (a, b) = (lhs.cast_to(promoted)?, rhs.cast_to(promoted)?);
    match (a, b) {
        (ConstantValue::Int(a), ConstantValue::Int(b)) => integral(op, a, b, ConstantValue::Int),
        (ConstantValue::Long(a), ConstantValue::Long(b)) => integral(op, a, b, ConstantValue::Long),
        (ConstantValue::Float(a), ConstantValue::Float(b)) => floating(op, a, b, ConstantValue::Float),
        (ConstantValue::Double(a), ConstantValue::Double(b)) => floating(op, a, b, ConstantValue::Double),
        _ => None,
    }
}

trait Integral: Copy + Ord {
    fn checked(op: BinaryOp, a: Self, b: Self) -> Option<Self>;
}

impl Integral for i32 {
    fn checked(op: BinaryOp, a: Self, b: Self) -> Option<Self> {
        Some(match op {
            BinaryOp::Add => a.wrapping_add(b),
            BinaryOp::Sub => a.wrapping_sub(b),
            BinaryOp::Mul => a.wrapping_mul(b),
            BinaryOp::Div if b != 0 => a.wrapping_div(b),
            BinaryOp::Rem if b != 0 => a.wrapping_rem(b),
            BinaryOp::BitAnd => a & b,
            BinaryOp::BitOr => a | b,
            BinaryOp::BitXor => a ^ b,
            _ => return None,
        })
    }
}

impl Integral for i64 {
    fn checked(op: BinaryOp, a: Self, b: Self) -> Option<Self> {
        Some(match op {
            BinaryOp::Add => a.wrapping_add(b),
            BinaryOp::Sub => a.wrapping_sub(b),
            BinaryOp::Mul => a.wrapping_mul(b),
            BinaryOp::Div if b != 0 => a.wrapping_div(b),
            BinaryOp::Rem if b != 0 => a.wrapping_rem(b),
            BinaryOp::BitAnd => a & b,
            BinaryOp::BitOr => a | b,
            BinaryOp::BitXor => a ^ b,
            _ => return None,
        })
    }
}

fn integral<T: Integral>(op: BinaryOp, a: T, b: T, wrap: fn(T) -> ConstantValue) -> Option<ConstantValue> {
    if op.is_relational() {
        return Some(ConstantValue::Boolean(compare(op, a.cmp(&b))));
    }
    T::checked(op, a, b).map(wrap)
}

fn floating<T>(op: BinaryOp, a: T, b: T, wrap: fn(T) -> ConstantValue) -> Option<ConstantValue>
where
    T: Copy
        + PartialOrd
        + std::ops::Add<Output = T>
        + std::ops::Sub<Output = T>
        + std::ops::Mul<Output = T>
        + std::ops::Div<Output = T>
        + std::ops::Rem<Output = T>,
{
    if op.is_relational() {
        // Any comparison involving NaN is false, except `!=`.
        let result = match a.partial_cmp(&b) {
            Some(ordering) => compare(op, ordering),
            None => op == BinaryOp::Ne,
        };
        return Some(ConstantValue::Boolean(result));
    }
    Some(wrap(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Rem => a % b,
        _ => return None,
    }))
}

fn compare(op: BinaryOp, ordering: std::cmp::Ordering) -> bool {
    use std::cmp::Ordering::*;
    match op {
        BinaryOp::Eq => ordering == Equal,
        BinaryOp::Ne => ordering != Equal,
        BinaryOp::Lt => ordering == Less,
        BinaryOp::Gt => ordering == Greater,
        BinaryOp::Le => ordering != Greater,
        BinaryOp::Ge => ordering != Less,
        _ => false,
    }
}

/// Shift operands are promoted separately; the distance is masked to the
/// width of the promoted left operand.
fn shift(op: BinaryOp, lhs: &ConstantValue, rhs: &ConstantValue) -> Option<ConstantValue> {
    let distance = rhs.as_i64()?;
    let left = lhs.cast_to(lhs.primitive_type()?.unary_promotion()?)?;
    Some(match left {
        ConstantValue::Int(v) => {
            let s = (distance & 0x1f) as u32;
            ConstantValue::Int(match op {
                BinaryOp::Shl => v.wrapping_shl(s),
                BinaryOp::Shr => v >> s,
                _ => ((v as u32) >> s) as i32,
            })
        }
        ConstantValue::Long(v) => {
            let s = (distance & 0x3f) as u32;
            ConstantValue::Long(match op {
                BinaryOp::Shl => v.wrapping_shl(s),
                BinaryOp::Shr => v >> s,
                _ => ((v as u64) >> s) as i64,
            })
        }
        _ => return None,
    })
}

fn conditional(cond: bool, a: ConstantValue, b: ConstantValue) -> Option<ConstantValue> {
    let picked = if cond { a.clone() } else { b.clone() };
    match (a.primitive_type(), b.primitive_type()) {
        (Some(pa), Some(pb)) if pa != pb => {
            let promoted = PrimitiveType::binary_promotion(pa, pb)?;
            picked.cast_to(promoted)
        }
        (Some(_), Some(_)) | (None, None) => Some(picked),
        // Mixing a String with a primitive boxes one side: not a constant.
        _ => None,
    }
}

/// Constant value of a field declarator, looking only at declarations in the
/// same tree. The field must be `static final` (explicitly or implicitly)
/// with an initializer; the value undergoes assignment conversion to the
/// declared type.
pub(crate) fn source_field_constant(tree: &SyntaxTree, var: NodeId) -> Option<ConstantValue> {
    let mut visiting = Vec::new();
    field_constant(tree, var, &mut visiting)
}

fn field_constant(tree: &SyntaxTree, var: NodeId, visiting: &mut Vec<NodeId>) -> Option<ConstantValue> {
    let NodeKind::Variable {
        dims, init: Some(init), ..
    } = tree.kind(var)
    else {
        return None;
    };
    let field = tree.parent(var)?;
    let NodeKind::Field { ty, .. } = tree.kind(field) else {
        return None;
    };
    let modifiers = field_modifiers(tree, field);
    if !(modifiers.is_static() && modifiers.is_final()) || *dims != 0 {
        return None;
    }
    let target = ConstantTarget::of_type_node(tree, *ty)?;
    if visiting.contains(&var) {
        return None;
    }
    visiting.push(var);

    let init = *init;
    let value = {
        let mut names = |node: NodeId| {
            let referenced = named_field(tree, node)?;
            field_constant(tree, referenced, visiting)
        };
        ConstantEvaluator::new(tree, &mut names).evaluate(init)
    };
    visiting.retain(|v| *v != var);
    assignment_conversion(value?, target)
}

/// The field declarator a simple or `Type.NAME` expression names, searched
/// through the enclosing type declarations of the same tree.
fn named_field(tree: &SyntaxTree, expr: NodeId) -> Option<NodeId> {
    match tree.kind(expr) {
        NodeKind::Name { name } => tree
            .ancestors(expr)
            .filter(|&a| tree.type_decl(a).is_some())
            .find_map(|ty| declared_field(tree, ty, name.as_str())),
        NodeKind::FieldAccess { scope, name } => {
            let owner = type_named_by(tree, *scope)?;
            declared_field(tree, owner, name.as_str())
        }
        _ => None,
    }
}

fn declared_field(tree: &SyntaxTree, ty: NodeId, name: &str) -> Option<NodeId> {
    let data = tree.type_decl(ty)?;
    data.members.iter().find_map(|&member| match tree.kind(member) {
        NodeKind::Field { variables, .. } => variables
            .iter()
            .copied()
            .find(|&v| matches!(tree.kind(v), NodeKind::Variable { name: n, .. } if n.as_str() == name)),
        _ => None,
    })
}

/// A type declaration in this tree named by a `Name`/`FieldAccess` chain,
/// either as a member of an enclosing type or from the top level.
fn type_named_by(tree: &SyntaxTree, expr: NodeId) -> Option<NodeId> {
    let dotted = dotted_name(tree, expr)?;
    let mut segments = dotted.split('.');
    let first = segments.next()?;
    let rest: Vec<&str> = segments.collect();

    let start = tree
        .ancestors(expr)
        .filter(|&a| tree.type_decl(a).is_some())
        .find_map(|ty| {
            if tree.type_decl(ty).is_some_and(|d| d.name.as_str() == first) {
                Some(ty)
            } else {
                tree.member_type(ty, first)
            }
        })
        .or_else(|| tree.type_by_name(first))?;
    rest.iter().try_fold(start, |current, segment| tree.member_type(current, segment))
}

pub(crate) fn dotted_name(tree: &SyntaxTree, expr: NodeId) -> Option<String> {
    match tree.kind(expr) {
        NodeKind::Name { name } => Some(name.to_string()),
        NodeKind::FieldAccess { scope, name } => Some(format!("{}.{name}", dotted_name(tree, *scope)?)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use javelin_syntax::parse_compilation_unit;
    use pretty_assertions::assert_eq;

    use super::*;

    fn constant_of(source: &str, field: &str) -> Option<ConstantValue> {
        let tree = parse_compilation_unit(source).unwrap();
        let var = tree
            .find_all(|k| matches!(k, NodeKind::Variable { name, .. } if name.as_str() == field))
            .into_iter()
            .next()
            .unwrap();
        source_field_constant(&tree, var)
    }

    fn fold(ty: &str, expr: &str) -> Option<ConstantValue> {
        constant_of(&format!("class C {{ static final {ty} X = {expr}; }}"), "X")
    }

    #[test]
    fn arithmetic_follows_java_semantics() {
        assert_eq!(fold("int", "1 + 2"), Some(ConstantValue::Int(3)));
        assert_eq!(fold("int", "2147483647 + 1"), Some(ConstantValue::Int(i32::MIN)));
        assert_eq!(fold("int", "-2147483648"), Some(ConstantValue::Int(i32::MIN)));
        assert_eq!(fold("int", "7 / 2"), Some(ConstantValue::Int(3)));
        assert_eq!(fold("int", "-7 % 3"), Some(ConstantValue::Int(-1)));
        assert_eq!(fold("long", "1L << 40"), Some(ConstantValue::Long(1 << 40)));
        assert_eq!(fold("int", "1 << 33"), Some(ConstantValue::Int(2)));
        assert_eq!(fold("int", "-1 >>> 28"), Some(ConstantValue::Int(15)));
        assert_eq!(fold("double", "1 / 2.0"), Some(ConstantValue::Double(0.5)));
        assert_eq!(fold("boolean", "3 > 2 && !false"), Some(ConstantValue::Boolean(true)));
        assert_eq!(fold("int", "true ? 1 : 2"), Some(ConstantValue::Int(1)));
    }

    #[test]
    fn failures_are_absent() {
        assert_eq!(fold("int", "1 / 0"), None);
        assert_eq!(fold("int", "1 % 0"), None);
        assert_eq!(fold("int", "2147483648"), None);
        assert_eq!(fold("int", "foo()"), None);
        assert_eq!(fold("String", "null"), None);
        assert_eq!(fold("Object", "1"), None);
    }

    #[test]
    fn strings_concatenate() {
        assert_eq!(
            fold("String", "\"a\" + 1 + 'c' + 1.5f + true"),
            Some(ConstantValue::String("a1c1.5true".to_string()))
        );
        assert_eq!(fold("String", "1 + 2 + \"x\""), Some(ConstantValue::String("3x".to_string())));
        assert_eq!(fold("String", "\"\" + 1e10"), Some(ConstantValue::String("1.0E10".to_string())));
        assert_eq!(fold("String", "\"\" + 0.0001"), Some(ConstantValue::String("1.0E-4".to_string())));
    }

    #[test]
    fn casts_and_assignment_conversion() {
        assert_eq!(fold("byte", "(byte) 300"), Some(ConstantValue::Byte(44)));
        assert_eq!(fold("byte", "10"), Some(ConstantValue::Byte(10)));
        assert_eq!(fold("byte", "300"), None);
        assert_eq!(fold("char", "65"), Some(ConstantValue::Char(65)));
        assert_eq!(fold("long", "1"), Some(ConstantValue::Long(1)));
        assert_eq!(fold("double", "'a'"), Some(ConstantValue::Double(97.0)));
        assert_eq!(fold("int", "(int) 3.9"), Some(ConstantValue::Int(3)));
        assert_eq!(fold("int", "1L"), None);
        assert_eq!(fold("Integer", "1"), None);
    }

    #[test]
    fn only_static_final_fields_are_constants() {
        assert_eq!(
            constant_of("class C { static final int X = 1 + 2; }", "X"),
            Some(ConstantValue::Int(3))
        );
        assert_eq!(constant_of("class C { static int X = 1 + 2; }", "X"), None);
        assert_eq!(constant_of("class C { final int X = 1 + 2; }", "X"), None);
        assert_eq!(constant_of("interface I { int X = 4; }", "X"), Some(ConstantValue::Int(4)));
    }

    #[test]
    fn names_refer_to_other_constants() {
        let source = "class C {\n\
                        static final int A = 2;\n\
                        static final int B = A * 10 + Inner.D;\n\
                        static final int LOOP1 = LOOP2;\n\
                        static final int LOOP2 = LOOP1;\n\
                        static int MUTABLE = 1;\n\
                        static final int USES_MUTABLE = MUTABLE;\n\
                        static class Inner { static final int D = C.A + 1; }\n\
                      }";
        assert_eq!(constant_of(source, "B"), Some(ConstantValue::Int(23)));
        assert_eq!(constant_of(source, "LOOP1"), None);
        assert_eq!(constant_of(source, "USES_MUTABLE"), None);
    }
}
