//! Declarations read from compiled class files, and type solvers over class
//! directories and jar archives.

#![forbid(unsafe_code)]

mod decl;
mod error;
mod solver;

pub use decl::{
    BytecodeAnnotationMember, BytecodeConstructor, BytecodeEnumConstant, BytecodeField,
    BytecodeMethod, BytecodeParameter, BytecodeTypeDecl, BytecodeTypeParam,
};
pub use error::LoadError;
pub use solver::{
    internal_name_candidates, BytecodeTypeSolver, ClassDir, ClassDirTypeSolver, ClassSource,
    JarArchive, JarTypeSolver,
};
