//! Declarations over host-runtime classes.

use std::fmt;
use std::sync::Arc;

use javelin_core::{MemberKind, ModifierSet};
use javelin_types::{
    AnnotationMemberDecl, AnnotationMemberRef, AnnotationUsage, ConstantValue, ConstructorDecl,
    ConstructorRef, DeclError, DeclKind, DeclOrigin, Declaration, EnumConstantDecl,
    EnumConstantRef, FieldDecl, FieldRef, MethodDecl, MethodLikeDecl, MethodRef, ParamRef,
    ParameterDecl, ProviderId, ReferenceTypeDecl, ResolveError, ResolvedType, TypeDeclRef,
    TypeParamOwner, TypeParamRef, TypeParameterDecl, TypeSolver, Wildcard,
};
use smol_str::SmolStr;

use crate::host::{HostClass, HostClassKind, HostField, HostMethod, HostType};

const MAX_NESTING: usize = 32;

/// A class, interface, enum or annotation type of the host runtime. The
/// declaration kind follows the host's own classification.
#[derive(Clone)]
pub struct ReflectionTypeDecl {
    class: Arc<HostClass>,
    provider: ProviderId,
}

impl fmt::Debug for ReflectionTypeDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReflectionTypeDecl{{{}}}", self.class.name)
    }
}

/// Which executable of the class a member wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Executable {
    Method(usize),
    Constructor(usize),
}

impl ReflectionTypeDecl {
    pub fn new(class: Arc<HostClass>, provider: ProviderId) -> Self {
        Self { class, provider }
    }

    pub fn host_class(&self) -> &Arc<HostClass> {
        &self.class
    }

    fn member_origin(&self, member: impl Into<SmolStr>) -> DeclOrigin {
        DeclOrigin::Reflection {
            provider: self.provider,
            class: self.class.name.clone(),
            member: Some(member.into()),
        }
    }

    fn executable(&self, which: Executable) -> &HostMethod {
        match which {
            Executable::Method(i) => &self.class.methods[i],
            Executable::Constructor(i) => &self.class.constructors[i],
        }
    }

    fn executable_key(&self, which: Executable) -> String {
        let method = self.executable(which);
        format!("{}{}", method.name, self.class.method_descriptor(method))
    }

    fn type_params_of(&self, which: Option<Executable>) -> Vec<TypeParamRef> {
        let count = match which {
            Some(which) => self.executable(which).type_params.len(),
            None => self.class.type_params.len(),
        };
        (0..count)
            .map(|index| {
                Arc::new(ReflectionTypeParam {
                    class: self.clone(),
                    owner: which,
                    index,
                }) as TypeParamRef
            })
            .collect()
    }

    fn solve_class(&self, binary: &str, solver: &dyn TypeSolver) -> Result<TypeDeclRef, ResolveError> {
        solver.solve_type(&binary.replace('$', "."))
    }

    /// Type variables bind to the executable, then the class, then the
    /// enclosing classes outward.
    fn type_variable(
        &self,
        name: &str,
        scope: Option<Executable>,
        solver: &dyn TypeSolver,
    ) -> Result<ResolvedType, ResolveError> {
        if let Some(which) = scope {
            if let Some(p) = self.type_params_of(Some(which)).into_iter().find(|p| p.name() == name) {
                return Ok(ResolvedType::TypeVariable(p));
            }
        }
        if let Some(p) = self.type_params_of(None).into_iter().find(|p| p.name() == name) {
            return Ok(ResolvedType::TypeVariable(p));
        }
        let mut outer = self.containing_type(solver)?;
        for _ in 0..MAX_NESTING {
            let Some(decl) = outer else {
                break;
            };
            if let Some(p) = decl.type_parameters().into_iter().find(|p| p.name() == name) {
                return Ok(ResolvedType::TypeVariable(p));
            }
            outer = decl.containing_type(solver)?;
        }
        Err(ResolveError::unsolved_symbol(name, self.class.name.as_str()))
    }

    fn to_resolved(
        &self,
        ty: &HostType,
        scope: Option<Executable>,
        solver: &dyn TypeSolver,
    ) -> Result<ResolvedType, ResolveError> {
        Ok(match ty {
            HostType::Primitive(p) => ResolvedType::Primitive(*p),
            HostType::Void => ResolvedType::Void,
            HostType::Class { name, args } => {
                let decl = self.solve_class(name, solver)?;
                let args = args
                    .iter()
                    .map(|a| self.to_resolved(a, scope, solver))
                    .collect::<Result<Vec<_>, _>>()?;
                ResolvedType::reference(decl, args)
            }
            HostType::TypeVariable(name) => self.type_variable(name, scope, solver)?,
            HostType::Wildcard { upper, lower } => ResolvedType::Wildcard(match (upper, lower) {
                (Some(upper), _) => Wildcard::Extends(Box::new(self.to_resolved(upper, scope, solver)?)),
                (None, Some(lower)) => Wildcard::Super(Box::new(self.to_resolved(lower, scope, solver)?)),
                (None, None) => Wildcard::Unbounded,
            }),
            HostType::Array(component) => ResolvedType::array(self.to_resolved(component, scope, solver)?)?,
        })
    }

    fn executable_modifiers(&self, which: Executable) -> ModifierSet {
        let method = self.executable(which);
        let mut modifiers = ModifierSet::from_access_flags(method.modifiers, MemberKind::Method);
        // The host reports these as properties, not modifier bits.
        modifiers.remove(ModifierSet::BRIDGE | ModifierSet::VARARGS | ModifierSet::SYNTHETIC);
        if method.varargs {
            modifiers |= ModifierSet::VARARGS;
        }
        if method.default_method {
            modifiers |= ModifierSet::DEFAULT;
        }
        modifiers
    }

    fn params_of(&self, which: Executable) -> usize {
        self.executable(which).params.len()
    }

    fn param_of(&self, which: Executable, index: usize) -> Option<ParamRef> {
        let param = self.executable(which).params.get(index)?;
        let name = param
            .name
            .clone()
            .unwrap_or_else(|| SmolStr::new(format!("arg{index}")));
        Some(Arc::new(ReflectionParameter {
            class: self.clone(),
            owner: which,
            index,
            name,
            has_name: param.name.is_some(),
        }))
    }

    fn thrown_of(&self, which: Executable, solver: &dyn TypeSolver) -> Result<Vec<ResolvedType>, ResolveError> {
        self.executable(which)
            .exceptions
            .iter()
            .map(|e| self.to_resolved(e, Some(which), solver))
            .collect()
    }
}

fn usages(names: &[SmolStr]) -> Vec<AnnotationUsage> {
    names
        .iter()
        .map(|n| AnnotationUsage { name: n.to_string() })
        .collect()
}

impl Declaration for ReflectionTypeDecl {
    fn name(&self) -> &str {
        self.class.simple_name()
    }

    fn kind(&self) -> DeclKind {
        match self.class.kind {
            HostClassKind::Class => DeclKind::Class,
            HostClassKind::Interface => DeclKind::Interface,
            HostClassKind::Enum => DeclKind::Enum,
            HostClassKind::Annotation => DeclKind::Annotation,
        }
    }

    fn origin(&self) -> DeclOrigin {
        DeclOrigin::Reflection {
            provider: self.provider,
            class: self.class.name.clone(),
            member: None,
        }
    }

    fn modifiers(&self) -> ModifierSet {
        let mut modifiers = ModifierSet::from_access_flags(self.class.modifiers, MemberKind::Class);
        if self.class.declaring_class.is_some() && self.class.kind != HostClassKind::Class {
            // Member interfaces, enums and annotations are implicitly static.
            modifiers |= ModifierSet::STATIC;
        }
        modifiers
    }

    fn annotations(&self) -> Vec<AnnotationUsage> {
        usages(&self.class.annotations)
    }
}

impl ReferenceTypeDecl for ReflectionTypeDecl {
    fn qualified_name(&self) -> String {
        self.class.canonical_name()
    }

    fn package_name(&self) -> String {
        self.class.package_name().to_string()
    }

    fn to_ref(&self) -> TypeDeclRef {
        Arc::new(self.clone())
    }

    fn type_parameters(&self) -> Vec<TypeParamRef> {
        self.type_params_of(None)
    }

    fn superclass(&self, solver: &dyn TypeSolver) -> Result<Option<ResolvedType>, ResolveError> {
        match &self.class.superclass {
            Some(ty) if self.class.kind != HostClassKind::Interface => {
                self.to_resolved(ty, None, solver).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn interfaces(&self, solver: &dyn TypeSolver) -> Result<Vec<ResolvedType>, ResolveError> {
        self.class
            .interfaces
            .iter()
            .map(|i| self.to_resolved(i, None, solver))
            .collect()
    }

    fn declared_fields(&self) -> Vec<FieldRef> {
        self.class
            .fields
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.enum_constant && !f.synthetic)
            .map(|(index, _)| {
                Arc::new(ReflectionField {
                    class: self.clone(),
                    index,
                }) as FieldRef
            })
            .collect()
    }

    fn declared_methods(&self) -> Vec<MethodRef> {
        (0..self.class.methods.len())
            .filter_map(|index| match ReflectionMethod::new(self, index) {
                Ok(method) => Some(Arc::new(method) as MethodRef),
                Err(_) => {
                    tracing::trace!(
                        target: "javelin.reflect",
                        class = %self.class.name,
                        method = %self.class.methods[index].name,
                        "skipping synthetic method"
                    );
                    None
                }
            })
            .collect()
    }

    fn constructors(&self) -> Vec<ConstructorRef> {
        (0..self.class.constructors.len())
            .filter(|&i| !self.class.constructors[i].synthetic)
            .map(|index| {
                Arc::new(ReflectionConstructor {
                    class: self.clone(),
                    index,
                }) as ConstructorRef
            })
            .collect()
    }

    fn nested_types(&self, solver: &dyn TypeSolver) -> Result<Vec<TypeDeclRef>, ResolveError> {
        self.class
            .member_classes
            .iter()
            .map(|binary| self.solve_class(binary, solver))
            .collect()
    }

    fn containing_type(&self, solver: &dyn TypeSolver) -> Result<Option<TypeDeclRef>, ResolveError> {
        self.class
            .declaring_class
            .as_deref()
            .map(|outer| self.solve_class(outer, solver))
            .transpose()
    }

    fn enum_constants(&self) -> Vec<EnumConstantRef> {
        self.class
            .fields
            .iter()
            .filter(|f| f.enum_constant)
            .filter_map(|f| ReflectionEnumConstant::new(self, &f.name).ok())
            .map(|c| Arc::new(c) as EnumConstantRef)
            .collect()
    }

    fn annotation_members(&self) -> Vec<AnnotationMemberRef> {
        if self.class.kind != HostClassKind::Annotation {
            return Vec::new();
        }
        (0..self.class.methods.len())
            .map(|index| {
                Arc::new(ReflectionAnnotationMember {
                    class: self.clone(),
                    index,
                }) as AnnotationMemberRef
            })
            .collect()
    }
}

macro_rules! debug_by_origin {
    ($($ty:ident),* $(,)?) => {
        $(
            impl fmt::Debug for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, concat!(stringify!($ty), "{{{}}}"), self.origin())
                }
            }
        )*
    };
}

debug_by_origin!(
    ReflectionTypeParam,
    ReflectionField,
    ReflectionEnumConstant,
    ReflectionMethod,
    ReflectionConstructor,
    ReflectionParameter,
    ReflectionAnnotationMember,
);

pub struct ReflectionTypeParam {
    class: ReflectionTypeDecl,
    owner: Option<Executable>,
    index: usize,
}

impl ReflectionTypeParam {
    fn var(&self) -> &crate::host::HostTypeVar {
        match self.owner {
            Some(which) => &self.class.executable(which).type_params[self.index],
            None => &self.class.class.type_params[self.index],
        }
    }
}

impl Declaration for ReflectionTypeParam {
    fn name(&self) -> &str {
        &self.var().name
    }

    fn kind(&self) -> DeclKind {
        DeclKind::TypeParameter
    }

    fn origin(&self) -> DeclOrigin {
        let member = match self.owner {
            Some(which) => format!("{}<{}>", self.class.executable_key(which), self.name()),
            None => format!("<{}>", self.name()),
        };
        self.class.member_origin(member)
    }
}

impl TypeParameterDecl for ReflectionTypeParam {
    fn owner(&self) -> TypeParamOwner {
        match self.owner {
            Some(which) => TypeParamOwner::Method(format!(
                "{}.{}",
                self.class.qualified_name(),
                self.class.executable(which).name
            )),
            None => TypeParamOwner::Type(self.class.qualified_name()),
        }
    }

    fn bounds(&self, solver: &dyn TypeSolver) -> Result<Vec<ResolvedType>, ResolveError> {
        self.var()
            .bounds
            .iter()
            .filter(|b| !matches!(b, HostType::Class { name, args } if name == "java.lang.Object" && args.is_empty()))
            .map(|b| self.class.to_resolved(b, self.owner, solver))
            .collect()
    }
}

pub struct ReflectionField {
    class: ReflectionTypeDecl,
    index: usize,
}

impl ReflectionField {
    fn host(&self) -> &HostField {
        &self.class.class.fields[self.index]
    }
}

impl Declaration for ReflectionField {
    fn name(&self) -> &str {
        &self.host().name
    }

    fn kind(&self) -> DeclKind {
        DeclKind::Field
    }

    fn origin(&self) -> DeclOrigin {
        self.class.member_origin(self.host().name.clone())
    }

    fn modifiers(&self) -> ModifierSet {
        ModifierSet::from_access_flags(self.host().modifiers, MemberKind::Field)
    }
}

impl FieldDecl for ReflectionField {
    fn ty(&self, solver: &dyn TypeSolver) -> Result<ResolvedType, ResolveError> {
        self.class.to_resolved(&self.host().ty, None, solver)
    }

    fn declaring_type(&self) -> TypeDeclRef {
        self.class.to_ref()
    }

    fn constant_value(&self) -> Option<ConstantValue> {
        let modifiers = self.modifiers();
        if modifiers.is_static() && modifiers.is_final() {
            self.host().constant.clone()
        } else {
            None
        }
    }
}

pub struct ReflectionEnumConstant {
    class: ReflectionTypeDecl,
    index: usize,
}

impl ReflectionEnumConstant {
    /// Fails with an invariant violation unless `name` is an enum constant of
    /// `class`.
    pub fn new(class: &ReflectionTypeDecl, name: &str) -> Result<Self, DeclError> {
        let index = class
            .class
            .fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| DeclError::InvariantViolation(format!("no field `{name}` in {}", class.class.name)))?;
        if !class.class.fields[index].enum_constant {
            return Err(DeclError::InvariantViolation(format!(
                "field `{name}` of {} is not an enum constant",
                class.class.name
            )));
        }
        Ok(Self {
            class: class.clone(),
            index,
        })
    }
}

impl Declaration for ReflectionEnumConstant {
    fn name(&self) -> &str {
        &self.class.class.fields[self.index].name
    }

    fn kind(&self) -> DeclKind {
        DeclKind::EnumConstant
    }

    fn origin(&self) -> DeclOrigin {
        self.class.member_origin(self.name().to_string())
    }

    fn modifiers(&self) -> ModifierSet {
        ModifierSet::from_access_flags(self.class.class.fields[self.index].modifiers, MemberKind::Field)
    }
}

impl EnumConstantDecl for ReflectionEnumConstant {
    fn declaring_type(&self) -> TypeDeclRef {
        self.class.to_ref()
    }
}

/// A host method. Synthetic and bridge methods are never wrapped, so they
/// cannot reach overload candidate sets.
pub struct ReflectionMethod {
    class: ReflectionTypeDecl,
    index: usize,
}

impl ReflectionMethod {
    pub fn new(class: &ReflectionTypeDecl, index: usize) -> Result<Self, DeclError> {
        let method = class.class.methods.get(index).ok_or_else(|| {
            DeclError::InvariantViolation(format!("no method #{index} in {}", class.class.name))
        })?;
        if method.synthetic || method.bridge {
            return Err(DeclError::InvariantViolation(format!(
                "{}.{} is synthetic or a bridge",
                class.class.name, method.name
            )));
        }
        Ok(Self {
            class: class.clone(),
            index,
        })
    }

    fn which(&self) -> Executable {
        Executable::Method(self.index)
    }
}

impl Declaration for ReflectionMethod {
    fn name(&self) -> &str {
        &self.class.class.methods[self.index].name
    }

    fn kind(&self) -> DeclKind {
        DeclKind::Method
    }

    fn origin(&self) -> DeclOrigin {
        self.class.member_origin(self.class.executable_key(self.which()))
    }

    fn modifiers(&self) -> ModifierSet {
        self.class.executable_modifiers(self.which())
    }

    fn annotations(&self) -> Vec<AnnotationUsage> {
        usages(&self.class.class.methods[self.index].annotations)
    }
}

impl MethodLikeDecl for ReflectionMethod {
    fn declaring_type(&self) -> TypeDeclRef {
        self.class.to_ref()
    }

    fn type_parameters(&self) -> Vec<TypeParamRef> {
        self.class.type_params_of(Some(self.which()))
    }

    fn param_count(&self) -> usize {
        self.class.params_of(self.which())
    }

    fn param(&self, index: usize) -> Option<ParamRef> {
        self.class.param_of(self.which(), index)
    }

    fn thrown_types(&self, solver: &dyn TypeSolver) -> Result<Vec<ResolvedType>, ResolveError> {
        self.class.thrown_of(self.which(), solver)
    }
}

impl MethodDecl for ReflectionMethod {
    fn return_type(&self, solver: &dyn TypeSolver) -> Result<ResolvedType, ResolveError> {
        let method = &self.class.class.methods[self.index];
        self.class.to_resolved(&method.return_type, Some(self.which()), solver)
    }

    fn method_descriptor(&self, _solver: &dyn TypeSolver) -> Result<String, ResolveError> {
        Ok(self.class.class.method_descriptor(&self.class.class.methods[self.index]))
    }
}

pub struct ReflectionConstructor {
    class: ReflectionTypeDecl,
    index: usize,
}

impl ReflectionConstructor {
    fn which(&self) -> Executable {
        Executable::Constructor(self.index)
    }
}

impl Declaration for ReflectionConstructor {
    fn name(&self) -> &str {
        self.class.name()
    }

    fn kind(&self) -> DeclKind {
        DeclKind::Constructor
    }

    fn origin(&self) -> DeclOrigin {
        self.class.member_origin(self.class.executable_key(self.which()))
    }

    fn modifiers(&self) -> ModifierSet {
        self.class.executable_modifiers(self.which())
    }
}

impl MethodLikeDecl for ReflectionConstructor {
    fn declaring_type(&self) -> TypeDeclRef {
        self.class.to_ref()
    }

    fn type_parameters(&self) -> Vec<TypeParamRef> {
        self.class.type_params_of(Some(self.which()))
    }

    fn param_count(&self) -> usize {
        self.class.params_of(self.which())
    }

    fn param(&self, index: usize) -> Option<ParamRef> {
        self.class.param_of(self.which(), index)
    }

    fn thrown_types(&self, solver: &dyn TypeSolver) -> Result<Vec<ResolvedType>, ResolveError> {
        self.class.thrown_of(self.which(), solver)
    }
}

impl ConstructorDecl for ReflectionConstructor {}

pub struct ReflectionParameter {
    class: ReflectionTypeDecl,
    owner: Executable,
    index: usize,
    name: SmolStr,
    has_name: bool,
}

impl Declaration for ReflectionParameter {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DeclKind {
        DeclKind::Parameter
    }

    fn origin(&self) -> DeclOrigin {
        self.class
            .member_origin(format!("{}#{}", self.class.executable_key(self.owner), self.index))
    }
}

impl ParameterDecl for ReflectionParameter {
    fn ty(&self, solver: &dyn TypeSolver) -> Result<ResolvedType, ResolveError> {
        let param = &self.class.executable(self.owner).params[self.index];
        self.class.to_resolved(&param.ty, Some(self.owner), solver)
    }

    fn is_variadic(&self) -> bool {
        let method = self.class.executable(self.owner);
        method.varargs && self.index + 1 == method.params.len()
    }

    fn has_name(&self) -> bool {
        self.has_name
    }
}

pub struct ReflectionAnnotationMember {
    class: ReflectionTypeDecl,
    index: usize,
}

impl Declaration for ReflectionAnnotationMember {
    fn name(&self) -> &str {
        &self.class.class.methods[self.index].name
    }

    fn kind(&self) -> DeclKind {
        DeclKind::AnnotationMember
    }

    fn origin(&self) -> DeclOrigin {
        self.class
            .member_origin(self.class.executable_key(Executable::Method(self.index)))
    }

    fn modifiers(&self) -> ModifierSet {
        self.class.executable_modifiers(Executable::Method(self.index))
    }
}

impl AnnotationMemberDecl for ReflectionAnnotationMember {
    fn declaring_type(&self) -> TypeDeclRef {
        self.class.to_ref()
    }

    fn ty(&self, solver: &dyn TypeSolver) -> Result<ResolvedType, ResolveError> {
        let method = &self.class.class.methods[self.index];
        self.class
            .to_resolved(&method.return_type, Some(Executable::Method(self.index)), solver)
    }

    fn has_default_value(&self) -> bool {
        self.class.class.methods[self.index].has_default_value
    }
}
