use std::sync::Arc;

use javelin_core::ModifierSet;
use javelin_syntax::{NodeId, NodeKind, TypeDeclData, TypeDeclKind};
use javelin_types::{
    AnnotationMemberRef, AnnotationUsage, ConstructorRef, DeclError, DeclKind, DeclOrigin,
    Declaration, EnumConstantRef, FieldRef, MethodRef, ReferenceTypeDecl, ResolveError,
    ResolvedType, TypeDeclRef, TypeParamOwner, TypeParamRef, TypeParameterDecl, TypeSolver,
};

use super::members::{
    SourceAnnotationMember, SourceConstructor, SourceEnumConstant, SourceField, SourceMethod,
};
use super::{annotation_usages, origin};
use crate::file::SourceRef;
use crate::scopes::Context;

/// A class, interface, enum or annotation type declared in source.
#[derive(Clone)]
pub struct SourceTypeDecl {
    file: SourceRef,
    node: NodeId,
}

impl SourceTypeDecl {
    /// Wraps a type declaration node.
    pub fn new(file: SourceRef, node: NodeId) -> Result<Self, DeclError> {
        if file.tree().type_decl(node).is_none() {
            return Err(DeclError::InvariantViolation(format!(
                "{} is not a type declaration",
                file.tree().kind(node).label()
            )));
        }
        Ok(Self { file, node })
    }

    /// Caller guarantees `node` is a type declaration.
    pub(crate) fn wrap(file: &SourceRef, node: NodeId) -> TypeDeclRef {
        Arc::new(Self {
            file: file.clone(),
            node,
        })
    }

    pub fn file(&self) -> &SourceRef {
        &self.file
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    fn data(&self) -> &TypeDeclData {
        match self.file.tree().kind(self.node) {
            NodeKind::TypeDecl(data) => data,
            other => unreachable!("SourceTypeDecl over {}", other.label()),
        }
    }

    fn context<'a>(&'a self, solver: &'a dyn TypeSolver) -> Context<'a> {
        Context::new(&self.file, solver)
    }

    fn is_member(&self) -> bool {
        self.file
            .tree()
            .parent(self.node)
            .is_some_and(|p| self.file.tree().type_decl(p).is_some())
    }

    fn resolve_all(&self, nodes: &[NodeId], solver: &dyn TypeSolver) -> Result<Vec<ResolvedType>, ResolveError> {
        let cx = self.context(solver);
        nodes.iter().map(|&n| cx.resolve_type(n)).collect()
    }

    fn object(&self, solver: &dyn TypeSolver) -> Result<Option<ResolvedType>, ResolveError> {
        if self.is_java_lang_object() {
            return Ok(None);
        }
        Ok(Some(ResolvedType::raw(solver.java_lang_object()?)))
    }

    fn implicit_constructor(&self) -> bool {
        let data = self.data();
        matches!(data.kind, TypeDeclKind::Class | TypeDeclKind::Enum)
            && !data
                .members
                .iter()
                .any(|&m| matches!(self.file.tree().kind(m), NodeKind::Constructor(_)))
    }
}

impl Declaration for SourceTypeDecl {
    fn name(&self) -> &str {
        self.data().name.as_str()
    }

    fn kind(&self) -> DeclKind {
        match self.data().kind {
            TypeDeclKind::Class => DeclKind::Class,
            TypeDeclKind::Interface => DeclKind::Interface,
            TypeDeclKind::Enum => DeclKind::Enum,
            TypeDeclKind::Annotation => DeclKind::Annotation,
        }
    }

    fn origin(&self) -> DeclOrigin {
        origin(&self.file, self.node, None)
    }

    fn modifiers(&self) -> ModifierSet {
        let data = self.data();
        let tree = self.file.tree();
        let mut set = data.modifiers.set;
        if matches!(data.kind, TypeDeclKind::Interface | TypeDeclKind::Annotation) {
            set |= ModifierSet::ABSTRACT;
        }
        if self.is_member() {
            // Member interfaces, enums and annotation types are implicitly static.
            if data.kind != TypeDeclKind::Class {
                set |= ModifierSet::STATIC;
            }
            let in_interface = tree
                .parent(self.node)
                .and_then(|p| tree.type_decl(p))
                .is_some_and(|p| matches!(p.kind, TypeDeclKind::Interface | TypeDeclKind::Annotation));
            if in_interface {
                set |= ModifierSet::PUBLIC | ModifierSet::STATIC;
            }
        }
        if data.kind == TypeDeclKind::Enum
            && !data
                .enum_constants
                .iter()
                .any(|&c| matches!(tree.kind(c), NodeKind::EnumConstant { body: Some(_), .. }))
        {
            set |= ModifierSet::FINAL;
        }
        set
    }

    fn annotations(&self) -> Vec<AnnotationUsage> {
        annotation_usages(self.file.tree(), &self.data().modifiers.annotations)
    }
}

impl ReferenceTypeDecl for SourceTypeDecl {
    fn qualified_name(&self) -> String {
        let path = self
            .file
            .tree()
            .type_path(self.node)
            .unwrap_or_else(|| self.name().to_string());
        self.file.package().qualify(&path)
    }

    fn package_name(&self) -> String {
        self.file.package().to_dotted()
    }

    fn to_ref(&self) -> TypeDeclRef {
        Arc::new(self.clone())
    }

    fn type_parameters(&self) -> Vec<TypeParamRef> {
        self.data()
            .type_params
            .iter()
            .map(|&tp| SourceTypeParam::wrap(&self.file, tp))
            .collect()
    }

    fn superclass(&self, solver: &dyn TypeSolver) -> Result<Option<ResolvedType>, ResolveError> {
        let data = self.data();
        match data.kind {
            TypeDeclKind::Interface | TypeDeclKind::Annotation => Ok(None),
            TypeDeclKind::Enum => {
                let base = solver.solve_type("java.lang.Enum")?;
                Ok(Some(ResolvedType::reference(base, vec![ResolvedType::raw(self.to_ref())])))
            }
            TypeDeclKind::Class => {
                let Some(&extends) = data.extends.first() else {
                    return self.object(solver);
                };
                let Some(_guard) = self.file.enter(self.node) else {
                    return self.object(solver);
                };
                self.context(solver).resolve_type(extends).map(Some)
            }
        }
    }

    fn interfaces(&self, solver: &dyn TypeSolver) -> Result<Vec<ResolvedType>, ResolveError> {
        let data = self.data();
        let declared = match data.kind {
            TypeDeclKind::Interface => &data.extends,
            TypeDeclKind::Annotation => {
                let annotation = solver.solve_type("java.lang.annotation.Annotation")?;
                return Ok(vec![ResolvedType::raw(annotation)]);
            }
            TypeDeclKind::Class | TypeDeclKind::Enum => &data.implements,
        };
        if declared.is_empty() {
            return Ok(Vec::new());
        }
        let Some(_guard) = self.file.enter(self.node) else {
            return Ok(Vec::new());
        };
        self.resolve_all(declared, solver)
    }

    fn declared_fields(&self) -> Vec<FieldRef> {
        let tree = self.file.tree();
        self.data()
            .members
            .iter()
            .flat_map(|&member| match tree.kind(member) {
                NodeKind::Field { variables, .. } => variables
                    .iter()
                    .map(|&var| SourceField::wrap(&self.file, var, member))
                    .collect::<Vec<FieldRef>>(),
                _ => Vec::new(),
            })
            .collect()
    }

    fn declared_methods(&self) -> Vec<MethodRef> {
        let tree = self.file.tree();
        self.data()
            .members
            .iter()
            .filter(|&&m| matches!(tree.kind(m), NodeKind::Method(_)))
            .map(|&m| SourceMethod::wrap(&self.file, m))
            .collect()
    }

    fn constructors(&self) -> Vec<ConstructorRef> {
        if self.implicit_constructor() {
            return vec![SourceConstructor::implicit(&self.file, self.node)];
        }
        let tree = self.file.tree();
        self.data()
            .members
            .iter()
            .filter(|&&m| matches!(tree.kind(m), NodeKind::Constructor(_)))
            .map(|&m| SourceConstructor::wrap(&self.file, m))
            .collect()
    }

    fn nested_types(&self, _solver: &dyn TypeSolver) -> Result<Vec<TypeDeclRef>, ResolveError> {
        let tree = self.file.tree();
        Ok(self
            .data()
            .members
            .iter()
            .filter(|&&m| tree.type_decl(m).is_some())
            .map(|&m| Self::wrap(&self.file, m))
            .collect())
    }

    fn containing_type(&self, _solver: &dyn TypeSolver) -> Result<Option<TypeDeclRef>, ResolveError> {
        let tree = self.file.tree();
        Ok(tree
            .parent(self.node)
            .filter(|&p| tree.type_decl(p).is_some())
            .map(|p| Self::wrap(&self.file, p)))
    }

    fn enum_constants(&self) -> Vec<EnumConstantRef> {
        self.data()
            .enum_constants
            .iter()
            .map(|&c| SourceEnumConstant::wrap(&self.file, c))
            .collect()
    }

    fn annotation_members(&self) -> Vec<AnnotationMemberRef> {
        if self.data().kind != TypeDeclKind::Annotation {
            return Vec::new();
        }
        let tree = self.file.tree();
        self.data()
            .members
            .iter()
            .filter(|&&m| matches!(tree.kind(m), NodeKind::Method(_)))
            .map(|&m| SourceAnnotationMember::wrap(&self.file, m))
            .collect()
    }
}

/// A type parameter of a source class, method or constructor.
#[derive(Clone)]
pub struct SourceTypeParam {
    file: SourceRef,
    node: NodeId,
}

impl SourceTypeParam {
    pub(crate) fn wrap(file: &SourceRef, node: NodeId) -> TypeParamRef {
        Arc::new(Self {
            file: file.clone(),
            node,
        })
    }

    fn bound_nodes(&self) -> &[NodeId] {
        match self.file.tree().kind(self.node) {
            NodeKind::TypeParameter { bounds, .. } => bounds,
            _ => &[],
        }
    }
}

impl Declaration for SourceTypeParam {
    fn name(&self) -> &str {
        match self.file.tree().kind(self.node) {
            NodeKind::TypeParameter { name, .. } => name.as_str(),
            _ => "",
        }
    }

    fn kind(&self) -> DeclKind {
        DeclKind::TypeParameter
    }

    fn origin(&self) -> DeclOrigin {
        origin(&self.file, self.node, None)
    }

    fn annotations(&self) -> Vec<AnnotationUsage> {
        match self.file.tree().kind(self.node) {
            NodeKind::TypeParameter { annotations, .. } => annotation_usages(self.file.tree(), annotations),
            _ => Vec::new(),
        }
    }
}

impl TypeParameterDecl for SourceTypeParam {
    fn owner(&self) -> TypeParamOwner {
        let tree = self.file.tree();
        let Some(parent) = tree.parent(self.node) else {
            return TypeParamOwner::Type(String::new());
        };
        let type_name = |node: NodeId| {
            let path = tree.type_path(node).unwrap_or_default();
            self.file.package().qualify(&path)
        };
        match tree.kind(parent) {
            NodeKind::Method(data) => {
                let owner = tree.enclosing_type(parent).map(type_name).unwrap_or_default();
                TypeParamOwner::Method(format!("{owner}.{}", data.name))
            }
            NodeKind::Constructor(data) => {
                let owner = tree.enclosing_type(parent).map(type_name).unwrap_or_default();
                TypeParamOwner::Method(format!("{owner}.{}", data.name))
            }
            _ => TypeParamOwner::Type(type_name(parent)),
        }
    }

    fn bounds(&self, solver: &dyn TypeSolver) -> Result<Vec<ResolvedType>, ResolveError> {
        let bounds = self.bound_nodes();
        if bounds.is_empty() {
            return Ok(Vec::new());
        }
        // `<T extends Comparable<T>>` resolves `T` itself, but never its bounds.
        let Some(_guard) = self.file.enter(self.node) else {
            return Ok(Vec::new());
        };
        let cx = Context::new(&self.file, solver);
        bounds.iter().map(|&b| cx.resolve_type(b)).collect()
    }
}

debug_by_origin!(SourceTypeDecl, SourceTypeParam);
