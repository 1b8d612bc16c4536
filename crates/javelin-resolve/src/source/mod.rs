//! Declarations backed by syntax tree nodes.
//!
//! Every source declaration is a `(SourceRef, NodeId)` pair. Types mentioned
//! by a declaration are resolved lazily, in the scope of the declaration site,
//! with the solver the caller passes in.

macro_rules! debug_by_origin {
    ($($ty:ident),* $(,)?) => {$(
        impl std::fmt::Debug for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!(stringify!($ty), "{{{}}}"), javelin_types::Declaration::origin(self))
            }
        }
    )*};
}

mod members;
mod types;

use javelin_core::ModifierSet;
use javelin_syntax::{NodeId, NodeKind, PrimitiveKeyword, SyntaxTree, TypeDeclKind};
use javelin_types::{AnnotationUsage, DeclOrigin, PrimitiveType};

pub use members::{
    SourceAnnotationMember, SourceConstructor, SourceEnumConstant, SourceField, SourceLocal,
    SourceMethod, SourceParameter,
};
pub use types::{SourceTypeDecl, SourceTypeParam};

use crate::file::SourceFile;

pub(crate) fn origin(file: &SourceFile, node: NodeId, owner: Option<NodeId>) -> DeclOrigin {
    DeclOrigin::Source {
        tree: file.tree().id().as_u32(),
        node: node.index() as u32,
        owner: owner.map(|o| o.index() as u32),
    }
}

pub(crate) fn primitive_of(keyword: PrimitiveKeyword) -> PrimitiveType {
    match keyword {
        PrimitiveKeyword::Boolean => PrimitiveType::Boolean,
        PrimitiveKeyword::Byte => PrimitiveType::Byte,
        PrimitiveKeyword::Short => PrimitiveType::Short,
        PrimitiveKeyword::Char => PrimitiveType::Char,
        PrimitiveKeyword::Int => PrimitiveType::Int,
        PrimitiveKeyword::Long => PrimitiveType::Long,
        PrimitiveKeyword::Float => PrimitiveType::Float,
        PrimitiveKeyword::Double => PrimitiveType::Double,
    }
}

/// Kind of the type declaration directly enclosing a member.
pub(crate) fn owner_kind(tree: &SyntaxTree, member: NodeId) -> Option<TypeDeclKind> {
    tree.parent(member)
        .and_then(|p| tree.type_decl(p))
        .map(|d| d.kind)
}

fn is_interface_like(kind: Option<TypeDeclKind>) -> bool {
    matches!(kind, Some(TypeDeclKind::Interface | TypeDeclKind::Annotation))
}

/// Written modifiers of a field plus the implicit `public static final` of
/// interface fields (JLS 9.3).
pub(crate) fn field_modifiers(tree: &SyntaxTree, field: NodeId) -> ModifierSet {
    let NodeKind::Field { modifiers, .. } = tree.kind(field) else {
        return ModifierSet::empty();
    };
    let mut set = modifiers.set;
    if is_interface_like(owner_kind(tree, field)) {
        set |= ModifierSet::PUBLIC | ModifierSet::STATIC | ModifierSet::FINAL;
    }
    set
}

/// Written modifiers of a method plus what interfaces imply (JLS 9.4):
/// members are public unless private, and body-less methods that are not
/// static, private or default are abstract.
pub(crate) fn method_modifiers(tree: &SyntaxTree, method: NodeId) -> ModifierSet {
    let NodeKind::Method(data) = tree.kind(method) else {
        return ModifierSet::empty();
    };
    let mut set = data.modifiers.set;
    if is_interface_like(owner_kind(tree, method)) {
        if !set.contains(ModifierSet::PRIVATE) {
            set |= ModifierSet::PUBLIC;
        }
        let concrete = ModifierSet::STATIC | ModifierSet::PRIVATE | ModifierSet::DEFAULT;
        if data.body.is_none() && !set.intersects(concrete) {
            set |= ModifierSet::ABSTRACT;
        }
    }
    set
}

pub(crate) fn annotation_usages(tree: &SyntaxTree, annotations: &[NodeId]) -> Vec<AnnotationUsage> {
    annotations
        .iter()
        .filter_map(|&a| match tree.kind(a) {
            NodeKind::Annotation { name, .. } => Some(AnnotationUsage {
                name: name.to_dotted(),
            }),
            _ => None,
        })
        .collect()
}
