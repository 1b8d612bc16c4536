//! The type and declaration model shared by every provider.
//!
//! [`ResolvedType`] is the universe of types, [`decl`] holds the declaration
//! traits each provider implements, and [`TypeSolver`] maps qualified names
//! to declarations. Type relations (subtyping, erasure, lub) live in
//! [`relations`] and only ever reach other declarations through a solver
//! passed in by the caller.

#![forbid(unsafe_code)]

mod constant;
pub mod decl;
mod error;
mod memo;
mod method_usage;
mod primitive;
pub mod relations;
mod solver;
mod subst;
mod symbol;
mod synthetic;
mod ty;

pub use constant::ConstantValue;
pub use decl::{
    enclosing_types, AnnotationMemberDecl, AnnotationMemberRef, AnnotationUsage, ConstructorDecl,
    ConstructorRef, DeclKind, DeclOrigin, Declaration, EnumConstantDecl, EnumConstantRef,
    FieldDecl, FieldRef, LocalRef, LocalVariableDecl, MethodDecl, MethodLikeDecl, MethodRef,
    ParamRef, ParameterDecl, ProviderId, ReferenceTypeDecl, ResolvedDeclaration, TypeDeclRef,
    TypeParamOwner, TypeParamRef, TypeParameterDecl, ValueDecl,
};
pub use error::{DeclError, ResolveError};
pub use memo::Memo;
pub use method_usage::MethodUsage;
pub use primitive::PrimitiveType;
pub use relations::Answer;
pub use solver::{CombinedTypeSolver, LookupCache, MemoryTypeSolver, TypeSolver};
pub use subst::{substitute, Substitution};
pub use symbol::SymbolReference;
pub use synthetic::{StubTypeBuilder, StubTypeDecl};
pub use ty::{ReferenceType, ResolvedType, Wildcard};
