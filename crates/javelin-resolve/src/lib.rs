//! Symbol resolution for Java source.
//!
//! Source declarations are views over syntax tree nodes and resolve the
//! types they mention lazily, in the scope of their declaration site.
//! [`SymbolResolver`] answers queries about names, types and expressions,
//! looking everything else up through a [`javelin_types::TypeSolver`].

#![forbid(unsafe_code)]

mod calls;
mod constant;
mod expr;
mod file;
mod import_map;
mod infer;
mod overload;
mod resolver;
mod scopes;
mod source;
mod source_dir;
mod type_ref;

pub use file::{SourceFile, SourceRef};
pub use import_map::{ImportMap, StaticSingleImport, StaticStarImport, TypeSingleImport, TypeStarImport};
pub use resolver::SymbolResolver;
pub use source::{
    SourceAnnotationMember, SourceConstructor, SourceEnumConstant, SourceField, SourceLocal,
    SourceMethod, SourceParameter, SourceTypeDecl, SourceTypeParam,
};
pub use source_dir::SourceDirTypeSolver;
