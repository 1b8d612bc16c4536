use std::sync::Arc;

use javelin_core::ModifierSet;
use javelin_syntax::{ConstructorData, MethodData, NodeId, NodeKind, TypeDeclKind};
use javelin_types::{
    AnnotationMemberDecl, AnnotationMemberRef, AnnotationUsage, ConstantValue, ConstructorDecl,
    ConstructorRef, DeclError, DeclKind, DeclOrigin, Declaration, EnumConstantDecl, EnumConstantRef,
    FieldDecl, FieldRef, LocalRef, LocalVariableDecl, MethodDecl, MethodLikeDecl, MethodRef,
    ParamRef, ParameterDecl, ResolveError, ResolvedType, TypeDeclRef, TypeParamRef, TypeSolver,
};

use super::types::{SourceTypeDecl, SourceTypeParam};
use super::{annotation_usages, field_modifiers, method_modifiers, origin, owner_kind};
use crate::constant;
use crate::file::SourceRef;
use crate::scopes::Context;

/// The type declaration directly enclosing a member node. Members are only
/// ever wrapped from inside their declaring type.
fn declaring(file: &SourceRef, member: NodeId) -> TypeDeclRef {
    match file.tree().enclosing_type(member) {
        Some(owner) => SourceTypeDecl::wrap(file, owner),
        None => unreachable!("member {member} outside a type declaration"),
    }
}

fn resolve_types(
    file: &SourceRef,
    nodes: &[NodeId],
    solver: &dyn TypeSolver,
) -> Result<Vec<ResolvedType>, ResolveError> {
    let cx = Context::new(file, solver);
    nodes.iter().map(|&n| cx.resolve_type(n)).collect()
}

/// One variable of a field declaration. `int a, b[];` declares two fields
/// that share the declaration node.
#[derive(Clone)]
pub struct SourceField {
    file: SourceRef,
    var: NodeId,
    field: NodeId,
}

impl SourceField {
    /// Wraps the declarator `var`; its parent must be a field declaration of
    /// a type.
    pub fn new(file: SourceRef, var: NodeId) -> Result<Self, DeclError> {
        let tree = file.tree();
        let field = tree
            .parent(var)
            .filter(|&f| matches!(tree.kind(f), NodeKind::Field { .. }))
            .filter(|&f| tree.parent(f).is_some_and(|t| tree.type_decl(t).is_some()))
            .ok_or_else(|| {
                DeclError::InvariantViolation(format!(
                    "{} is not a field variable",
                    tree.kind(var).label()
                ))
            })?;
        Ok(Self { file, var, field })
    }

    pub(crate) fn wrap(file: &SourceRef, var: NodeId, field: NodeId) -> FieldRef {
        Arc::new(Self {
            file: file.clone(),
            var,
            field,
        })
    }

    pub fn variable(&self) -> NodeId {
        self.var
    }

    pub fn declaration(&self) -> NodeId {
        self.field
    }
}

impl Declaration for SourceField {
    fn name(&self) -> &str {
        match self.file.tree().kind(self.var) {
            NodeKind::Variable { name, .. } => name.as_str(),
            _ => "",
        }
    }

    fn kind(&self) -> DeclKind {
        DeclKind::Field
    }

    fn origin(&self) -> DeclOrigin {
        origin(&self.file, self.var, Some(self.field))
    }

    fn modifiers(&self) -> ModifierSet {
        field_modifiers(self.file.tree(), self.field)
    }

    fn annotations(&self) -> Vec<AnnotationUsage> {
        match self.file.tree().kind(self.field) {
            NodeKind::Field { modifiers, .. } => annotation_usages(self.file.tree(), &modifiers.annotations),
            _ => Vec::new(),
        }
    }
}

impl FieldDecl for SourceField {
    fn ty(&self, solver: &dyn TypeSolver) -> Result<ResolvedType, ResolveError> {
        let tree = self.file.tree();
        let NodeKind::Field { ty, .. } = tree.kind(self.field) else {
            return Err(DeclError::unsupported("ty", self).into());
        };
        let dims = match tree.kind(self.var) {
            NodeKind::Variable { dims, .. } => *dims,
            _ => 0,
        };
        let declared = Context::new(&self.file, solver).resolve_type(*ty)?;
        Ok(ResolvedType::array_of_dims(declared, dims)?)
    }

    fn declaring_type(&self) -> TypeDeclRef {
        declaring(&self.file, self.field)
    }

    fn constant_value(&self) -> Option<ConstantValue> {
        constant::source_field_constant(self.file.tree(), self.var)
    }
}

/// A method declared in source.
#[derive(Clone)]
pub struct SourceMethod {
    file: SourceRef,
    node: NodeId,
}

impl SourceMethod {
    pub fn new(file: SourceRef, node: NodeId) -> Result<Self, DeclError> {
        if !matches!(file.tree().kind(node), NodeKind::Method(_)) {
            return Err(DeclError::InvariantViolation(format!(
                "{} is not a method",
                file.tree().kind(node).label()
            )));
        }
        Ok(Self { file, node })
    }

    pub(crate) fn wrap(file: &SourceRef, node: NodeId) -> MethodRef {
        Arc::new(Self {
            file: file.clone(),
            node,
        })
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    fn data(&self) -> &MethodData {
        match self.file.tree().kind(self.node) {
            NodeKind::Method(data) => data,
            other => unreachable!("SourceMethod over {}", other.label()),
        }
    }
}

impl Declaration for SourceMethod {
    fn name(&self) -> &str {
        self.data().name.as_str()
    }

    fn kind(&self) -> DeclKind {
        DeclKind::Method
    }

    fn origin(&self) -> DeclOrigin {
        origin(&self.file, self.node, None)
    }

    fn modifiers(&self) -> ModifierSet {
        let mut set = method_modifiers(self.file.tree(), self.node);
        if self.is_variadic() {
            set |= ModifierSet::VARARGS;
        }
        set
    }

    fn annotations(&self) -> Vec<AnnotationUsage> {
        annotation_usages(self.file.tree(), &self.data().modifiers.annotations)
    }
}

impl MethodLikeDecl for SourceMethod {
    fn declaring_type(&self) -> TypeDeclRef {
        declaring(&self.file, self.node)
    }

    fn type_parameters(&self) -> Vec<TypeParamRef> {
        self.data()
            .type_params
            .iter()
            .map(|&tp| SourceTypeParam::wrap(&self.file, tp))
            .collect()
    }

    fn param_count(&self) -> usize {
        self.data().params.len()
    }

    fn param(&self, index: usize) -> Option<ParamRef> {
        self.data()
            .params
            .get(index)
            .map(|&p| SourceParameter::wrap(&self.file, p))
    }

    fn thrown_types(&self, solver: &dyn TypeSolver) -> Result<Vec<ResolvedType>, ResolveError> {
        resolve_types(&self.file, &self.data().throws, solver)
    }
}

impl MethodDecl for SourceMethod {
    fn return_type(&self, solver: &dyn TypeSolver) -> Result<ResolvedType, ResolveError> {
        Context::new(&self.file, solver).resolve_type(self.data().result)
    }
}

/// A constructor declared in source, or the default constructor of a class
/// that declares none (JLS 8.8.9).
#[derive(Clone)]
pub struct SourceConstructor {
    file: SourceRef,
    /// The constructor node, or the class node for a default constructor.
    node: NodeId,
    implicit: bool,
}

impl SourceConstructor {
    pub fn new(file: SourceRef, node: NodeId) -> Result<Self, DeclError> {
        if !matches!(file.tree().kind(node), NodeKind::Constructor(_)) {
            return Err(DeclError::InvariantViolation(format!(
                "{} is not a constructor",
                file.tree().kind(node).label()
            )));
        }
        Ok(Self {
            file,
            node,
            implicit: false,
        })
    }

    pub(crate) fn wrap(file: &SourceRef, node: NodeId) -> ConstructorRef {
        Arc::new(Self {
            file: file.clone(),
            node,
            implicit: false,
        })
    }

    pub(crate) fn implicit(file: &SourceRef, class: NodeId) -> ConstructorRef {
        Arc::new(Self {
            file: file.clone(),
            node: class,
            implicit: true,
        })
    }

    pub fn is_default(&self) -> bool {
        self.implicit
    }

    fn data(&self) -> Option<&ConstructorData> {
        match self.file.tree().kind(self.node) {
            NodeKind::Constructor(data) => Some(data),
            _ => None,
        }
    }
}

impl Declaration for SourceConstructor {
    fn name(&self) -> &str {
        let tree = self.file.tree();
        match tree.kind(self.node) {
            NodeKind::Constructor(data) => data.name.as_str(),
            NodeKind::TypeDecl(data) => data.name.as_str(),
            _ => "",
        }
    }

    fn kind(&self) -> DeclKind {
        DeclKind::Constructor
    }

    fn origin(&self) -> DeclOrigin {
        if self.implicit {
            origin(&self.file, self.node, Some(self.node))
        } else {
            origin(&self.file, self.node, None)
        }
    }

    fn modifiers(&self) -> ModifierSet {
        let tree = self.file.tree();
        match tree.kind(self.node) {
            NodeKind::Constructor(data) => {
                let mut set = data.modifiers.set;
                if owner_kind(tree, self.node) == Some(TypeDeclKind::Enum) {
                    set |= ModifierSet::PRIVATE;
                }
                set
            }
            NodeKind::TypeDecl(data) if data.kind == TypeDeclKind::Enum => ModifierSet::PRIVATE,
            NodeKind::TypeDecl(data) => {
                data.modifiers.set & (ModifierSet::PUBLIC | ModifierSet::PROTECTED | ModifierSet::PRIVATE)
            }
            _ => ModifierSet::empty(),
        }
    }

    fn annotations(&self) -> Vec<AnnotationUsage> {
        self.data()
            .map(|d| annotation_usages(self.file.tree(), &d.modifiers.annotations))
            .unwrap_or_default()
    }
}

impl MethodLikeDecl for SourceConstructor {
    fn declaring_type(&self) -> TypeDeclRef {
        if self.implicit {
            SourceTypeDecl::wrap(&self.file, self.node)
        } else {
            declaring(&self.file, self.node)
        }
    }

    fn type_parameters(&self) -> Vec<TypeParamRef> {
        self.data()
            .map(|d| {
                d.type_params
                    .iter()
                    .map(|&tp| SourceTypeParam::wrap(&self.file, tp))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn param_count(&self) -> usize {
        self.data().map_or(0, |d| d.params.len())
    }

    fn param(&self, index: usize) -> Option<ParamRef> {
        let &p = self.data()?.params.get(index)?;
        Some(SourceParameter::wrap(&self.file, p))
    }

    fn thrown_types(&self, solver: &dyn TypeSolver) -> Result<Vec<ResolvedType>, ResolveError> {
        match self.data() {
            Some(data) => resolve_types(&self.file, &data.throws, solver),
            None => Ok(Vec::new()),
        }
    }
}

impl ConstructorDecl for SourceConstructor {}

/// A formal parameter of a source method or constructor.
#[derive(Clone)]
pub struct SourceParameter {
    file: SourceRef,
    node: NodeId,
}

impl SourceParameter {
    pub(crate) fn wrap(file: &SourceRef, node: NodeId) -> ParamRef {
        Arc::new(Self {
            file: file.clone(),
            node,
        })
    }

    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl Declaration for SourceParameter {
    fn name(&self) -> &str {
        match self.file.tree().kind(self.node) {
            NodeKind::Parameter { name, .. } => name.as_str(),
            _ => "",
        }
    }

    fn kind(&self) -> DeclKind {
        DeclKind::Parameter
    }

    fn origin(&self) -> DeclOrigin {
        origin(&self.file, self.node, None)
    }

    fn modifiers(&self) -> ModifierSet {
        match self.file.tree().kind(self.node) {
            NodeKind::Parameter { modifiers, .. } => modifiers.set,
            _ => ModifierSet::empty(),
        }
    }

    fn annotations(&self) -> Vec<AnnotationUsage> {
        match self.file.tree().kind(self.node) {
            NodeKind::Parameter { modifiers, .. } => annotation_usages(self.file.tree(), &modifiers.annotations),
            _ => Vec::new(),
        }
    }
}

impl ParameterDecl for SourceParameter {
    fn ty(&self, solver: &dyn TypeSolver) -> Result<ResolvedType, ResolveError> {
        let NodeKind::Parameter { ty, varargs, .. } = self.file.tree().kind(self.node) else {
            return Err(DeclError::unsupported("ty", self).into());
        };
        let declared = Context::new(&self.file, solver).resolve_type(*ty)?;
        if *varargs {
            Ok(ResolvedType::array(declared)?)
        } else {
            Ok(declared)
        }
    }

    fn is_variadic(&self) -> bool {
        matches!(
            self.file.tree().kind(self.node),
            NodeKind::Parameter { varargs: true, .. }
        )
    }
}

/// An enum constant declared in source.
#[derive(Clone)]
pub struct SourceEnumConstant {
    file: SourceRef,
    node: NodeId,
}

impl SourceEnumConstant {
    pub(crate) fn wrap(file: &SourceRef, node: NodeId) -> EnumConstantRef {
        Arc::new(Self {
            file: file.clone(),
            node,
        })
    }

    pub fn new(file: SourceRef, node: NodeId) -> Result<Self, DeclError> {
        if !matches!(file.tree().kind(node), NodeKind::EnumConstant { .. }) {
            return Err(DeclError::InvariantViolation(format!(
                "{} is not an enum constant",
                file.tree().kind(node).label()
            )));
        }
        Ok(Self { file, node })
    }
}

impl Declaration for SourceEnumConstant {
    fn name(&self) -> &str {
        match self.file.tree().kind(self.node) {
            NodeKind::EnumConstant { name, .. } => name.as_str(),
            _ => "",
        }
    }

    fn kind(&self) -> DeclKind {
        DeclKind::EnumConstant
    }

    fn origin(&self) -> DeclOrigin {
        origin(&self.file, self.node, None)
    }

    fn modifiers(&self) -> ModifierSet {
        ModifierSet::PUBLIC | ModifierSet::STATIC | ModifierSet::FINAL | ModifierSet::ENUM
    }

    fn annotations(&self) -> Vec<AnnotationUsage> {
        match self.file.tree().kind(self.node) {
            NodeKind::EnumConstant { annotations, .. } => annotation_usages(self.file.tree(), annotations),
            _ => Vec::new(),
        }
    }
}

impl EnumConstantDecl for SourceEnumConstant {
    fn declaring_type(&self) -> TypeDeclRef {
        declaring(&self.file, self.node)
    }
}

/// An element of an annotation type, `String value() default "";`.
#[derive(Clone)]
pub struct SourceAnnotationMember {
    file: SourceRef,
    node: NodeId,
}

impl SourceAnnotationMember {
    pub(crate) fn wrap(file: &SourceRef, node: NodeId) -> AnnotationMemberRef {
        Arc::new(Self {
            file: file.clone(),
            node,
        })
    }

    fn data(&self) -> &MethodData {
        match self.file.tree().kind(self.node) {
            NodeKind::Method(data) => data,
            other => unreachable!("SourceAnnotationMember over {}", other.label()),
        }
    }
}

impl Declaration for SourceAnnotationMember {
    fn name(&self) -> &str {
        self.data().name.as_str()
    }

    fn kind(&self) -> DeclKind {
        DeclKind::AnnotationMember
    }

    fn origin(&self) -> DeclOrigin {
        origin(&self.file, self.node, None)
    }

    fn modifiers(&self) -> ModifierSet {
        method_modifiers(self.file.tree(), self.node)
    }
}

impl AnnotationMemberDecl for SourceAnnotationMember {
    fn declaring_type(&self) -> TypeDeclRef {
        declaring(&self.file, self.node)
    }

    fn ty(&self, solver: &dyn TypeSolver) -> Result<ResolvedType, ResolveError> {
        Context::new(&self.file, solver).resolve_type(self.data().result)
    }

    fn has_default_value(&self) -> bool {
        self.data().default_value.is_some()
    }
}

/// A local variable: a declarator of a local variable statement (also in
/// `for` headers and `try` resources), a for-each variable, a catch
/// parameter or an `instanceof` pattern binding.
#[derive(Clone)]
pub struct SourceLocal {
    file: SourceRef,
    /// A `Variable` declarator, or a `Parameter` for catch and pattern
    /// bindings.
    var: NodeId,
    /// The declaring `LocalVar` statement, or `var` itself.
    decl: NodeId,
}

impl SourceLocal {
    pub fn new(file: SourceRef, var: NodeId) -> Result<Self, DeclError> {
        let tree = file.tree();
        let decl = match tree.kind(var) {
            NodeKind::Parameter { .. } => var,
            NodeKind::Variable { .. } => tree
                .parent(var)
                .filter(|&d| matches!(tree.kind(d), NodeKind::LocalVar { .. }))
                .ok_or_else(|| DeclError::InvariantViolation("variable outside a local declaration".to_string()))?,
            other => {
                return Err(DeclError::InvariantViolation(format!(
                    "{} is not a local variable",
                    other.label()
                )))
            }
        };
        Ok(Self { file, var, decl })
    }

    pub(crate) fn wrap(file: &SourceRef, var: NodeId, decl: NodeId) -> LocalRef {
        Arc::new(Self {
            file: file.clone(),
            var,
            decl,
        })
    }

    pub fn variable(&self) -> NodeId {
        self.var
    }

    fn infer(&self, cx: &Context<'_>) -> Result<ResolvedType, ResolveError> {
        let tree = self.file.tree();
        let unsolved = || ResolveError::unsolved_symbol(self.name(), "var declaration");
        let Some(_guard) = self.file.enter(self.var) else {
            return Err(unsolved());
        };
        if let Some(parent) = tree.parent(self.decl) {
            if let NodeKind::ForEach { var, iterable, .. } = tree.kind(parent) {
                if *var == self.decl {
                    return cx.element_type(*iterable);
                }
            }
        }
        match tree.kind(self.var) {
            NodeKind::Variable { init: Some(init), .. } => cx.type_of(*init),
            _ => Err(unsolved()),
        }
    }
}

impl Declaration for SourceLocal {
    fn name(&self) -> &str {
        match self.file.tree().kind(self.var) {
            NodeKind::Variable { name, .. } | NodeKind::Parameter { name, .. } => name.as_str(),
            _ => "",
        }
    }

    fn kind(&self) -> DeclKind {
        DeclKind::LocalVariable
    }

    fn origin(&self) -> DeclOrigin {
        if self.decl == self.var {
            origin(&self.file, self.var, None)
        } else {
            origin(&self.file, self.var, Some(self.decl))
        }
    }

    fn modifiers(&self) -> ModifierSet {
        match self.file.tree().kind(self.decl) {
            NodeKind::LocalVar { modifiers, .. } | NodeKind::Parameter { modifiers, .. } => modifiers.set,
            _ => ModifierSet::empty(),
        }
    }
}

impl LocalVariableDecl for SourceLocal {
    fn ty(&self, solver: &dyn TypeSolver) -> Result<ResolvedType, ResolveError> {
        let tree = self.file.tree();
        let cx = Context::new(&self.file, solver);
        match tree.kind(self.decl) {
            NodeKind::Parameter { ty, .. } => cx.resolve_type(*ty),
            NodeKind::LocalVar { ty, .. } => {
                if matches!(tree.kind(*ty), NodeKind::VarType) {
                    return self.infer(&cx);
                }
                let dims = match tree.kind(self.var) {
                    NodeKind::Variable { dims, .. } => *dims,
                    _ => 0,
                };
                Ok(ResolvedType::array_of_dims(cx.resolve_type(*ty)?, dims)?)
            }
            _ => Err(DeclError::unsupported("ty", self).into()),
        }
    }
}

debug_by_origin!(
    SourceField,
    SourceMethod,
    SourceConstructor,
    SourceParameter,
    SourceEnumConstant,
    SourceAnnotationMember,
    SourceLocal,
);
