//! Declarations backed by the host runtime's class metadata.
//!
//! [`HostRuntime`] is the seam to whatever runtime embeds the resolver. The
//! [`BootstrapRuntime`] carries a small JDK as plain data so a resolver can
//! always find `java.lang.Object` and friends.

#![forbid(unsafe_code)]

mod bootstrap;
mod builder;
mod decl;
mod host;
mod solver;

pub use builder::{HostClassBuilder, MethodBuilder};
pub use decl::{
    ReflectionAnnotationMember, ReflectionConstructor, ReflectionEnumConstant, ReflectionField,
    ReflectionMethod, ReflectionParameter, ReflectionTypeDecl, ReflectionTypeParam,
};
pub use host::{
    BootstrapRuntime, HostClass, HostClassKind, HostField, HostMethod, HostParam, HostRuntime,
    HostType, HostTypeError, HostTypeVar,
};
pub use solver::ReflectionTypeSolver;
