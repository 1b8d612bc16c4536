use std::fmt;

use crate::decl::{MethodRef, TypeDeclRef, TypeParamRef};
use crate::error::ResolveError;
use crate::solver::TypeSolver;
use crate::subst::Substitution;
use crate::ty::ResolvedType;

/// A method declaration seen at a particular use: its parameter, return and
/// thrown types after substituting the receiver's and the call's type
/// arguments.
#[derive(Debug, Clone)]
pub struct MethodUsage {
    declaration: MethodRef,
    param_types: Vec<ResolvedType>,
    return_type: ResolvedType,
    exceptions: Vec<ResolvedType>,
    substitution: Substitution,
}

impl MethodUsage {
    /// The usage with declared types, nothing substituted.
    pub fn from_declaration(declaration: MethodRef, solver: &dyn TypeSolver) -> Result<Self, ResolveError> {
        Ok(MethodUsage {
            param_types: declaration.param_types(solver)?,
            return_type: declaration.return_type(solver)?,
            exceptions: declaration.thrown_types(solver)?,
            declaration,
            substitution: Substitution::new(),
        })
    }

    pub fn new(
        declaration: MethodRef,
        param_types: Vec<ResolvedType>,
        return_type: ResolvedType,
        exceptions: Vec<ResolvedType>,
    ) -> Self {
        MethodUsage {
            declaration,
            param_types,
            return_type,
            exceptions,
            substitution: Substitution::new(),
        }
    }

    pub fn declaration(&self) -> &MethodRef {
        &self.declaration
    }

    pub fn name(&self) -> &str {
        self.declaration.name()
    }

    pub fn declaring_type(&self) -> TypeDeclRef {
        self.declaration.declaring_type()
    }

    pub fn param_count(&self) -> usize {
        self.param_types.len()
    }

    pub fn param_types(&self) -> &[ResolvedType] {
        &self.param_types
    }

    pub fn param_type(&self, index: usize) -> Option<&ResolvedType> {
        self.param_types.get(index)
    }

    pub fn return_type(&self) -> &ResolvedType {
        &self.return_type
    }

    pub fn exceptions(&self) -> &[ResolvedType] {
        &self.exceptions
    }

    /// Everything substituted so far, in application order.
    pub fn substitution(&self) -> &Substitution {
        &self.substitution
    }

    pub fn with_return_type(mut self, ty: ResolvedType) -> Self {
        self.return_type = ty;
        self
    }

    pub fn with_param_type(mut self, index: usize, ty: ResolvedType) -> Self {
        if let Some(slot) = self.param_types.get_mut(index) {
            *slot = ty;
        }
        self
    }

    /// Replaces one type parameter everywhere in the usage.
    pub fn replace_type_param(self, param: &TypeParamRef, ty: ResolvedType) -> Self {
        let mut single = Substitution::new();
        single.insert(param.clone(), ty);
        self.substitute(&single)
    }

    /// Applies every pair of `subst`.
    pub fn replace_type_params(self, subst: &Substitution) -> Self {
        self.substitute(subst)
    }

    pub fn substitute(mut self, subst: &Substitution) -> Self {
        if subst.is_empty() {
            return self;
        }
        for ty in &mut self.param_types {
            *ty = ty.substitute(subst);
        }
        self.return_type = self.return_type.substitute(subst);
        for ty in &mut self.exceptions {
            *ty = ty.substitute(subst);
        }
        for (param, ty) in subst.iter() {
            self.substitution.insert(param.clone(), ty.clone());
        }
        self
    }

    /// `name(T1, T2)` with the substituted parameter types.
    pub fn signature(&self) -> String {
        let params = self
            .param_types
            .iter()
            .map(ResolvedType::describe)
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({params})", self.name())
    }
}

impl fmt::Display for MethodUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MethodUsage{{{}.{} : {}}}",
            self.declaring_type().qualified_name(),
            self.signature(),
            self.return_type
        )
    }
}
