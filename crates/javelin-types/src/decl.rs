//! Resolved declarations. Each declaration kind is a trait; providers implement
//! them on cheap, clonable handle structs and hand them out as `Arc<dyn _>`.
//!
//! Identity is the [`DeclOrigin`]: two declarations are equal iff their origin
//! handles are equal, regardless of which `Arc` carries them.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use javelin_core::{AccessSpecifier, Modifier, ModifierSet};
use smol_str::SmolStr;

use crate::constant::ConstantValue;
use crate::error::{DeclError, ResolveError};
use crate::relations::{self, Answer};
use crate::solver::TypeSolver;
use crate::ty::{ReferenceType, ResolvedType};

pub type TypeDeclRef = Arc<dyn ReferenceTypeDecl>;
pub type TypeParamRef = Arc<dyn TypeParameterDecl>;
pub type MethodRef = Arc<dyn MethodDecl>;
pub type ConstructorRef = Arc<dyn ConstructorDecl>;
pub type FieldRef = Arc<dyn FieldDecl>;
pub type ParamRef = Arc<dyn ParameterDecl>;
pub type EnumConstantRef = Arc<dyn EnumConstantDecl>;
pub type AnnotationMemberRef = Arc<dyn AnnotationMemberDecl>;
pub type LocalRef = Arc<dyn LocalVariableDecl>;

/// Identifies the backend instance that produced a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderId(u64);

impl ProviderId {
    pub fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ProviderId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

pub(crate) fn next_synthetic_id() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

/// The handle a declaration wraps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeclOrigin {
    /// AST node(s) of a parsed tree. `owner` is set when one node alone does
    /// not identify the declaration (a variable declarator inside a field
    /// declaration).
    Source {
        tree: u32,
        node: u32,
        owner: Option<u32>,
    },
    /// A class-file entity. `member` is `None` for the class itself.
    Bytecode {
        provider: ProviderId,
        class: SmolStr,
        member: Option<SmolStr>,
    },
    /// A host-runtime reflective entity.
    Reflection {
        provider: ProviderId,
        class: SmolStr,
        member: Option<SmolStr>,
    },
    /// Declarations built in code (test stubs, implicit members).
    Synthetic { id: u64, member: Option<SmolStr> },
}

impl DeclOrigin {
    pub fn synthetic() -> Self {
        DeclOrigin::Synthetic {
            id: next_synthetic_id(),
            member: None,
        }
    }

    /// The same handle narrowed to a member of the entity.
    pub fn member(&self, member: impl Into<SmolStr>) -> Self {
        let member = Some(member.into());
        match self {
            DeclOrigin::Source { .. } => self.clone(),
            DeclOrigin::Bytecode {
                provider, class, ..
            } => DeclOrigin::Bytecode {
                provider: *provider,
                class: class.clone(),
                member,
            },
            DeclOrigin::Reflection {
                provider, class, ..
            } => DeclOrigin::Reflection {
                provider: *provider,
                class: class.clone(),
                member,
            },
            DeclOrigin::Synthetic { id, .. } => DeclOrigin::Synthetic { id: *id, member },
        }
    }
}

impl fmt::Display for DeclOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (tag, class, member) = match self {
            DeclOrigin::Source { tree, node, owner } => {
                write!(f, "t{tree}:n{node}")?;
                if let Some(owner) = owner {
                    write!(f, "@n{owner}")?;
                }
                return Ok(());
            }
            DeclOrigin::Bytecode {
                provider,
                class,
                member,
            } => (format!("jar{}", provider.0), class.as_str(), member),
            DeclOrigin::Reflection {
                provider,
                class,
                member,
            } => (format!("host{}", provider.0), class.as_str(), member),
            DeclOrigin::Synthetic { id, member } => (format!("syn{id}"), "", member),
        };
        write!(f, "{tag}:{class}")?;
        if let Some(member) = member {
            write!(f, "#{member}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Class,
    Interface,
    Enum,
    Annotation,
    TypeParameter,
    Method,
    Constructor,
    Field,
    Parameter,
    EnumConstant,
    AnnotationMember,
    LocalVariable,
}

impl DeclKind {
    pub fn is_type(self) -> bool {
        matches!(
            self,
            DeclKind::Class
                | DeclKind::Interface
                | DeclKind::Enum
                | DeclKind::Annotation
                | DeclKind::TypeParameter
        )
    }
}

/// An annotation usage attached to a declaration. `name` is qualified when
/// the provider knows it and as written in source otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnotationUsage {
    pub name: String,
}

/// Operations every declaration exposes.
pub trait Declaration: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> DeclKind;

    fn origin(&self) -> DeclOrigin;

    fn modifiers(&self) -> ModifierSet {
        ModifierSet::empty()
    }

    fn access_specifier(&self) -> AccessSpecifier {
        self.modifiers().access()
    }

    fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers().has(modifier)
    }

    fn is_static(&self) -> bool {
        self.modifiers().is_static()
    }

    fn annotations(&self) -> Vec<AnnotationUsage> {
        Vec::new()
    }

    fn same_declaration(&self, other: &dyn Declaration) -> bool {
        self.origin() == other.origin()
    }
}

/// Class, interface, enum or annotation type.
pub trait ReferenceTypeDecl: Declaration {
    /// Dotted name; nested types use `.` (`p.Outer.Inner`).
    fn qualified_name(&self) -> String;

    fn package_name(&self) -> String;

    /// A fresh `Arc` handle to this declaration.
    fn to_ref(&self) -> TypeDeclRef;

    fn type_parameters(&self) -> Vec<TypeParamRef>;

    /// Declared or implied superclass. `java.lang.Object` has none; neither do
    /// interfaces or annotation types.
    fn superclass(&self, solver: &dyn TypeSolver) -> Result<Option<ResolvedType>, ResolveError>;

    fn interfaces(&self, solver: &dyn TypeSolver) -> Result<Vec<ResolvedType>, ResolveError>;

    fn declared_fields(&self) -> Vec<FieldRef>;

    fn declared_methods(&self) -> Vec<MethodRef>;

    fn constructors(&self) -> Vec<ConstructorRef>;

    fn nested_types(&self, solver: &dyn TypeSolver) -> Result<Vec<TypeDeclRef>, ResolveError>;

    /// Enclosing type of a member type. `None` for top-level types.
    fn containing_type(&self, solver: &dyn TypeSolver) -> Result<Option<TypeDeclRef>, ResolveError>;

    fn enum_constants(&self) -> Vec<EnumConstantRef> {
        Vec::new()
    }

    fn annotation_members(&self) -> Vec<AnnotationMemberRef> {
        Vec::new()
    }

    /// `Outer.Inner` for nested types, the simple name for top-level ones.
    fn class_name(&self) -> String {
        let qualified = self.qualified_name();
        let package = self.package_name();
        if package.is_empty() {
            qualified
        } else {
            qualified
                .strip_prefix(&package)
                .and_then(|rest| rest.strip_prefix('.'))
                .map(str::to_string)
                .unwrap_or(qualified)
        }
    }

    fn is_class(&self) -> bool {
        self.kind() == DeclKind::Class
    }

    fn is_interface(&self) -> bool {
        matches!(self.kind(), DeclKind::Interface | DeclKind::Annotation)
    }

    fn is_enum(&self) -> bool {
        self.kind() == DeclKind::Enum
    }

    fn is_annotation(&self) -> bool {
        self.kind() == DeclKind::Annotation
    }

    fn is_java_lang_object(&self) -> bool {
        self.qualified_name() == "java.lang.Object"
    }

    /// Owning type of a nested declaration; unsupported for top-level types.
    fn declaring_type(&self, solver: &dyn TypeSolver) -> Result<TypeDeclRef, ResolveError> {
        self.containing_type(solver)?
            .ok_or_else(|| DeclError::unsupported("declaring_type", self).into())
    }

    /// The generic self type: `C<T1, ..., Tn>` with the declared type variables.
    fn self_type(&self) -> ResolvedType {
        ResolvedType::Reference(ReferenceType {
            decl: self.to_ref(),
            args: self
                .type_parameters()
                .into_iter()
                .map(ResolvedType::TypeVariable)
                .collect(),
        })
    }

    /// Direct supertypes: superclass first, then interfaces in declaration order.
    fn ancestors(&self, solver: &dyn TypeSolver) -> Result<Vec<ResolvedType>, ResolveError> {
        let mut out: Vec<ResolvedType> = self.superclass(solver)?.into_iter().collect();
        out.extend(self.interfaces(solver)?);
        Ok(out)
    }

    /// Every supertype, breadth first, with type arguments substituted.
    fn all_ancestors(&self, solver: &dyn TypeSolver) -> Result<Vec<ResolvedType>, ResolveError> {
        relations::all_ancestors(solver, &self.self_type())
    }

    /// Declared fields followed by inherited ones; a field hides same-named
    /// fields of its supertypes.
    fn all_fields(&self, solver: &dyn TypeSolver) -> Result<Vec<FieldRef>, ResolveError> {
        let mut out = self.declared_fields();
        let mut seen: HashSet<String> = out.iter().map(|f| f.name().to_string()).collect();
        for ancestor in self.all_ancestors(solver)? {
            let Some(decl) = ancestor.type_decl() else {
                continue;
            };
            for field in decl.declared_fields() {
                if seen.insert(field.name().to_string()) {
                    out.push(field);
                }
            }
        }
        Ok(out)
    }

    /// Declared methods followed by inherited ones not overridden by a method
    /// with the same name and erased parameter types.
    fn all_methods(&self, solver: &dyn TypeSolver) -> Result<Vec<MethodRef>, ResolveError> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut push_all = |methods: Vec<MethodRef>, out: &mut Vec<MethodRef>| {
            for method in methods {
                let key = match method.erased_key(solver) {
                    Ok(key) => key,
                    Err(_) => format!("{}#{}", method.name(), method.origin()),
                };
                if seen.insert(key) {
                    out.push(method);
                }
            }
        };
        push_all(self.declared_methods(), &mut out);
        for ancestor in self.all_ancestors(solver)? {
            if let Some(decl) = ancestor.type_decl() {
                push_all(decl.declared_methods(), &mut out);
            }
        }
        Ok(out)
    }

    fn has_field(&self, name: &str, solver: &dyn TypeSolver) -> bool {
        self.get_field(name, solver).is_some()
    }

    /// Visible field named `name`, declared or inherited.
    fn get_field(&self, name: &str, solver: &dyn TypeSolver) -> Option<FieldRef> {
        self.all_fields(solver)
            .ok()?
            .into_iter()
            .find(|f| f.name() == name)
    }

    /// Member type named `name`, declared or inherited.
    fn member_type(&self, name: &str, solver: &dyn TypeSolver) -> Result<Option<TypeDeclRef>, ResolveError> {
        if let Some(found) = self
            .nested_types(solver)?
            .into_iter()
            .find(|t| t.name() == name)
        {
            return Ok(Some(found));
        }
        for ancestor in self.all_ancestors(solver)? {
            if let Some(decl) = ancestor.type_decl() {
                if let Some(found) = decl
                    .nested_types(solver)?
                    .into_iter()
                    .find(|t| t.name() == name)
                {
                    return Ok(Some(found));
                }
            }
        }
        Ok(None)
    }

    /// Whether a value of type `other` can be assigned to this type (erased).
    fn is_assignable_by_decl(&self, other: &dyn ReferenceTypeDecl, solver: &dyn TypeSolver) -> Answer {
        if self.is_java_lang_object() || self.qualified_name() == other.qualified_name() {
            return Answer::Yes;
        }
        let target = self.qualified_name();
        match other.all_ancestors(solver) {
            Ok(ancestors) => Answer::from(ancestors.iter().any(|a| {
                a.type_decl()
                    .is_some_and(|d| d.qualified_name() == target)
            })),
            Err(_) => Answer::Unknown,
        }
    }
}

/// Whom a type parameter belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeParamOwner {
    /// Qualified name of the declaring type.
    Type(String),
    /// Qualified signature of the declaring method or constructor.
    Method(String),
}

pub trait TypeParameterDecl: Declaration {
    fn owner(&self) -> TypeParamOwner;

    /// Declared bounds in order; empty means `java.lang.Object`.
    fn bounds(&self, solver: &dyn TypeSolver) -> Result<Vec<ResolvedType>, ResolveError>;

    fn qualified_name(&self) -> String {
        match self.owner() {
            TypeParamOwner::Type(t) | TypeParamOwner::Method(t) => format!("{t}.{}", self.name()),
        }
    }
}

/// A formal parameter of a method or constructor.
pub trait ParameterDecl: Declaration {
    /// For a variadic parameter this is the array type.
    fn ty(&self, solver: &dyn TypeSolver) -> Result<ResolvedType, ResolveError>;

    fn is_variadic(&self) -> bool;

    /// Whether the name is the real one rather than a synthesized `argN`.
    fn has_name(&self) -> bool {
        true
    }
}

/// Shared surface of methods and constructors.
pub trait MethodLikeDecl: Declaration {
    fn declaring_type(&self) -> TypeDeclRef;

    fn type_parameters(&self) -> Vec<TypeParamRef>;

    fn param_count(&self) -> usize;

    fn param(&self, index: usize) -> Option<ParamRef>;

    fn thrown_types(&self, solver: &dyn TypeSolver) -> Result<Vec<ResolvedType>, ResolveError>;

    fn params(&self) -> Vec<ParamRef> {
        (0..self.param_count()).filter_map(|i| self.param(i)).collect()
    }

    fn is_variadic(&self) -> bool {
        self.param_count()
            .checked_sub(1)
            .and_then(|last| self.param(last))
            .is_some_and(|p| p.is_variadic())
    }

    fn param_types(&self, solver: &dyn TypeSolver) -> Result<Vec<ResolvedType>, ResolveError> {
        self.params().iter().map(|p| p.ty(solver)).collect()
    }

    /// `name(T1, T2)` with Java-like type rendering.
    fn signature(&self, solver: &dyn TypeSolver) -> Result<String, ResolveError> {
        let params = self
            .param_types(solver)?
            .iter()
            .map(ResolvedType::describe)
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("{}({params})", self.name()))
    }

    fn qualified_signature(&self, solver: &dyn TypeSolver) -> Result<String, ResolveError> {
        Ok(format!(
            "{}.{}",
            self.declaring_type().qualified_name(),
            self.signature(solver)?
        ))
    }

    /// Name plus erased parameter descriptors; the override-equivalence key.
    fn erased_key(&self, solver: &dyn TypeSolver) -> Result<String, ResolveError> {
        let mut out = format!("{}(", self.name());
        for ty in self.param_types(solver)? {
            out.push_str(&relations::erasure(solver, &ty)?.descriptor()?);
        }
        out.push(')');
        Ok(out)
    }
}

pub trait MethodDecl: MethodLikeDecl {
    fn return_type(&self, solver: &dyn TypeSolver) -> Result<ResolvedType, ResolveError>;

    fn is_abstract(&self) -> bool {
        self.modifiers().is_abstract()
    }

    fn is_default_method(&self) -> bool {
        self.modifiers().contains(ModifierSet::DEFAULT)
    }

    /// Canonical JVM descriptor of the erased signature, e.g. `(I[Ljava/lang/String;)V`.
    fn method_descriptor(&self, solver: &dyn TypeSolver) -> Result<String, ResolveError> {
        let mut out = String::from("(");
        for ty in self.param_types(solver)? {
            out.push_str(&relations::erasure(solver, &ty)?.descriptor()?);
        }
        out.push(')');
        out.push_str(&relations::erasure(solver, &self.return_type(solver)?)?.descriptor()?);
        Ok(out)
    }
}

pub trait ConstructorDecl: MethodLikeDecl {
    fn method_descriptor(&self, solver: &dyn TypeSolver) -> Result<String, ResolveError> {
        let mut out = String::from("(");
        for ty in self.param_types(solver)? {
            out.push_str(&relations::erasure(solver, &ty)?.descriptor()?);
        }
        out.push_str(")V");
        Ok(out)
    }
}

pub trait FieldDecl: Declaration {
    fn ty(&self, solver: &dyn TypeSolver) -> Result<ResolvedType, ResolveError>;

    fn declaring_type(&self) -> TypeDeclRef;

    /// Present iff the field is `static final` with a constant initializer of
    /// primitive or `String` type.
    fn constant_value(&self) -> Option<ConstantValue>;
}

pub trait EnumConstantDecl: Declaration {
    /// The enclosing enum.
    fn declaring_type(&self) -> TypeDeclRef;

    fn ty(&self, _solver: &dyn TypeSolver) -> Result<ResolvedType, ResolveError> {
        Ok(ResolvedType::Reference(ReferenceType {
            decl: self.declaring_type(),
            args: Vec::new(),
        }))
    }

    fn constant_value(&self) -> Option<ConstantValue> {
        None
    }
}

pub trait AnnotationMemberDecl: Declaration {
    fn declaring_type(&self) -> TypeDeclRef;

    fn ty(&self, solver: &dyn TypeSolver) -> Result<ResolvedType, ResolveError>;

    fn has_default_value(&self) -> bool;
}

/// A local variable, pattern binding, or catch/resource variable.
pub trait LocalVariableDecl: Declaration {
    fn ty(&self, solver: &dyn TypeSolver) -> Result<ResolvedType, ResolveError>;
}

/// Anything a simple name in expression position can denote.
#[derive(Debug, Clone)]
pub enum ValueDecl {
    Field(FieldRef),
    Parameter(ParamRef),
    EnumConstant(EnumConstantRef),
    Local(LocalRef),
}

impl ValueDecl {
    pub fn as_declaration(&self) -> &dyn Declaration {
        match self {
            ValueDecl::Field(d) => d.as_ref(),
            ValueDecl::Parameter(d) => d.as_ref(),
            ValueDecl::EnumConstant(d) => d.as_ref(),
            ValueDecl::Local(d) => d.as_ref(),
        }
    }

    pub fn name(&self) -> &str {
        self.as_declaration().name()
    }

    pub fn ty(&self, solver: &dyn TypeSolver) -> Result<ResolvedType, ResolveError> {
        match self {
            ValueDecl::Field(d) => d.ty(solver),
            ValueDecl::Parameter(d) => d.ty(solver),
            ValueDecl::EnumConstant(d) => d.ty(solver),
            ValueDecl::Local(d) => d.ty(solver),
        }
    }

    pub fn constant_value(&self) -> Option<ConstantValue> {
        match self {
            ValueDecl::Field(d) => d.constant_value(),
            ValueDecl::EnumConstant(d) => d.constant_value(),
            _ => None,
        }
    }
}

impl PartialEq for ValueDecl {
    fn eq(&self, other: &Self) -> bool {
        self.as_declaration().origin() == other.as_declaration().origin()
    }
}

/// Any declaration, as returned by "go to declaration" style queries.
#[derive(Debug, Clone)]
pub enum ResolvedDeclaration {
    Type(TypeDeclRef),
    TypeParameter(TypeParamRef),
    Method(MethodRef),
    Constructor(ConstructorRef),
    Field(FieldRef),
    Parameter(ParamRef),
    EnumConstant(EnumConstantRef),
    AnnotationMember(AnnotationMemberRef),
    Local(LocalRef),
}

impl ResolvedDeclaration {
    pub fn as_declaration(&self) -> &dyn Declaration {
        match self {
            ResolvedDeclaration::Type(d) => d.as_ref(),
            ResolvedDeclaration::TypeParameter(d) => d.as_ref(),
            ResolvedDeclaration::Method(d) => d.as_ref(),
            ResolvedDeclaration::Constructor(d) => d.as_ref(),
            ResolvedDeclaration::Field(d) => d.as_ref(),
            ResolvedDeclaration::Parameter(d) => d.as_ref(),
            ResolvedDeclaration::EnumConstant(d) => d.as_ref(),
            ResolvedDeclaration::AnnotationMember(d) => d.as_ref(),
            ResolvedDeclaration::Local(d) => d.as_ref(),
        }
    }

    pub fn name(&self) -> &str {
        self.as_declaration().name()
    }

    pub fn kind(&self) -> DeclKind {
        self.as_declaration().kind()
    }
}

impl PartialEq for ResolvedDeclaration {
    fn eq(&self, other: &Self) -> bool {
        self.as_declaration().origin() == other.as_declaration().origin()
    }
}

impl From<ValueDecl> for ResolvedDeclaration {
    fn from(value: ValueDecl) -> Self {
        match value {
            ValueDecl::Field(d) => ResolvedDeclaration::Field(d),
            ValueDecl::Parameter(d) => ResolvedDeclaration::Parameter(d),
            ValueDecl::EnumConstant(d) => ResolvedDeclaration::EnumConstant(d),
            ValueDecl::Local(d) => ResolvedDeclaration::Local(d),
        }
    }
}

/// Walks enclosing types outward starting at `decl`, e.g. `Inner, Outer`.
pub fn enclosing_types(
    decl: &TypeDeclRef,
    solver: &dyn TypeSolver,
) -> Result<Vec<TypeDeclRef>, ResolveError> {
    let mut out = vec![decl.clone()];
    let mut queue = VecDeque::from([decl.clone()]);
    while let Some(current) = queue.pop_front() {
        if let Some(outer) = current.containing_type(solver)? {
            if out.iter().any(|d| d.origin() == outer.origin()) {
                break;
            }
            out.push(outer.clone());
            queue.push_back(outer);
        }
    }
    Ok(out)
}
