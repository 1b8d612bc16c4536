//! Declarations backed by class-file stubs.
//!
//! Generic signatures win over descriptors when both are present. Names in
//! signatures are internal (`java/util/Map$Entry`); the class's own
//! `InnerClasses` table tells a nesting `$` from one that is part of a name.

use std::fmt;
use std::sync::Arc;

use javelin_classfile::{
    BaseType, ClassStub, ClassTypeSignature, ConstantPoolValue, FieldType, InnerClassInfo,
    MethodStub, ReturnType, TypeArgument, TypeParameter, TypeSignature,
};
use javelin_core::access_flags::{
    ACC_ABSTRACT, ACC_ANNOTATION, ACC_BRIDGE, ACC_ENUM, ACC_INTERFACE, ACC_PRIVATE, ACC_STATIC,
    ACC_SYNTHETIC,
};
use javelin_core::{MemberKind, ModifierSet};
use javelin_types::{
    AnnotationMemberDecl, AnnotationMemberRef, AnnotationUsage, ConstantValue, ConstructorDecl,
    ConstructorRef, DeclError, DeclKind, DeclOrigin, Declaration, EnumConstantDecl,
    EnumConstantRef, FieldDecl, FieldRef, MethodDecl, MethodLikeDecl, MethodRef, ParamRef,
    ParameterDecl, PrimitiveType, ProviderId, ReferenceTypeDecl, ResolveError, ResolvedType,
    TypeDeclRef, TypeParamOwner, TypeParamRef, TypeParameterDecl, TypeSolver, Wildcard,
};
use smol_str::SmolStr;

const MAX_NESTING: usize = 32;

pub(crate) fn primitive(base: BaseType) -> PrimitiveType {
    match base {
        BaseType::Boolean => PrimitiveType::Boolean,
        BaseType::Byte => PrimitiveType::Byte,
        BaseType::Short => PrimitiveType::Short,
        BaseType::Char => PrimitiveType::Char,
        BaseType::Int => PrimitiveType::Int,
        BaseType::Long => PrimitiveType::Long,
        BaseType::Float => PrimitiveType::Float,
        BaseType::Double => PrimitiveType::Double,
    }
}

/// Dotted name for an internal class name, following `InnerClasses` entries
/// outward: `p/Outer$Inner` becomes `p.Outer.Inner` only if the table says
/// `Inner` is a member of `p/Outer`.
pub(crate) fn qualified_name_of(internal: &str, inner: &[InnerClassInfo]) -> String {
    let mut simple_names = Vec::new();
    let mut current = internal.to_string();
    for _ in 0..MAX_NESTING {
        match inner.iter().find(|ic| ic.inner_class == current) {
            Some(InnerClassInfo {
                outer_class: Some(outer),
                inner_name: Some(simple),
                ..
            }) if *outer != current => {
                simple_names.push(simple.clone());
                current = outer.clone();
            }
            _ => break,
        }
    }
    let mut out = current.replace('/', ".");
    for simple in simple_names.iter().rev() {
        out.push('.');
        out.push_str(simple);
    }
    out
}

/// `ConstantValue` attributes store `boolean`, `char`, `byte` and `short`
/// constants as `int`; the field descriptor says which one is meant.
pub(crate) fn normalize_constant(value: &ConstantPoolValue, ty: &FieldType) -> Option<ConstantValue> {
    Some(match (value, ty) {
        (ConstantPoolValue::Int(v), FieldType::Base(base)) => match base {
            BaseType::Boolean => ConstantValue::Boolean(*v != 0),
            BaseType::Char => ConstantValue::Char(*v as u16),
            BaseType::Byte => ConstantValue::Byte(*v as i8),
            BaseType::Short => ConstantValue::Short(*v as i16),
            BaseType::Int => ConstantValue::Int(*v),
            _ => return None,
        },
        (ConstantPoolValue::Long(v), FieldType::Base(BaseType::Long)) => ConstantValue::Long(*v),
        (ConstantPoolValue::Float(v), FieldType::Base(BaseType::Float)) => ConstantValue::Float(*v),
        (ConstantPoolValue::Double(v), FieldType::Base(BaseType::Double)) => ConstantValue::Double(*v),
        (ConstantPoolValue::String(s), FieldType::Object(name)) if name == "java/lang/String" => {
            ConstantValue::String(s.clone())
        }
        _ => return None,
    })
}

struct ClassData {
    provider: ProviderId,
    stub: ClassStub,
    qualified_name: String,
    package: String,
    kind: DeclKind,
    modifiers: ModifierSet,
    fields: Vec<usize>,
    enum_constants: Vec<usize>,
    methods: Vec<usize>,
    constructors: Vec<usize>,
}

/// A class, interface, enum or annotation type read from a class file.
#[derive(Clone)]
pub struct BytecodeTypeDecl {
    data: Arc<ClassData>,
}

impl fmt::Debug for BytecodeTypeDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BytecodeTypeDecl{{{}}}", self.origin())
    }
}

impl BytecodeTypeDecl {
    pub fn new(stub: ClassStub, provider: ProviderId) -> Self {
        let qualified_name = qualified_name_of(&stub.internal_name, &stub.inner_classes);
        let package = stub
            .internal_name
            .rsplit_once('/')
            .map(|(p, _)| p.replace('/', "."))
            .unwrap_or_default();

        let flags = stub.access_flags;
        let kind = if flags & ACC_ANNOTATION != 0 {
            DeclKind::Annotation
        } else if flags & ACC_INTERFACE != 0 {
            DeclKind::Interface
        } else if flags & ACC_ENUM != 0 {
            DeclKind::Enum
        } else {
            DeclKind::Class
        };
        // Member classes keep their source-level access in `InnerClasses`.
        let access = stub
            .own_inner_class_entry()
            .map_or(flags, |entry| entry.access_flags);
        let modifiers = ModifierSet::from_access_flags(access, MemberKind::Class);

        let mut fields = Vec::new();
        let mut enum_constants = Vec::new();
        for (index, field) in stub.fields.iter().enumerate() {
            if field.access_flags & ACC_SYNTHETIC != 0 {
                continue;
            }
            if field.access_flags & ACC_ENUM != 0 {
                enum_constants.push(index);
            } else {
                fields.push(index);
            }
        }

        let mut methods = Vec::new();
        let mut constructors = Vec::new();
        for (index, method) in stub.methods.iter().enumerate() {
            if method.access_flags & (ACC_SYNTHETIC | ACC_BRIDGE) != 0 {
                continue;
            }
            match method.name.as_str() {
                "<init>" => constructors.push(index),
                "<clinit>" => {}
                _ => methods.push(index),
            }
        }

        BytecodeTypeDecl {
            data: Arc::new(ClassData {
                provider,
                stub,
                qualified_name,
                package,
                kind,
                modifiers,
                fields,
                enum_constants,
                methods,
                constructors,
            }),
        }
    }

    pub fn from_bytes(bytes: &[u8], provider: ProviderId) -> Result<Self, javelin_classfile::Error> {
        Ok(Self::new(ClassStub::parse(bytes)?, provider))
    }

    pub fn stub(&self) -> &ClassStub {
        &self.data.stub
    }

    pub fn internal_name(&self) -> &str {
        &self.data.stub.internal_name
    }

    pub fn provider(&self) -> ProviderId {
        self.data.provider
    }

    fn member_origin(&self, member: impl Into<SmolStr>) -> DeclOrigin {
        DeclOrigin::Bytecode {
            provider: self.data.provider,
            class: self.internal_name().into(),
            member: Some(member.into()),
        }
    }

    fn method(&self, index: usize) -> &MethodStub {
        &self.data.stub.methods[index]
    }

    fn method_key(&self, index: usize) -> String {
        let m = self.method(index);
        format!("{}{}", m.name, m.descriptor)
    }

    fn solve_internal(&self, internal: &str, solver: &dyn TypeSolver) -> Result<TypeDeclRef, ResolveError> {
        let qualified = qualified_name_of(internal, &self.data.stub.inner_classes);
        match solver.try_lookup(&qualified)? {
            Some(decl) => Ok(decl),
            // A `$` the table does not explain may still be a nesting one.
            None if qualified.contains('$') => solver.solve_type(&qualified.replace('$', ".")),
            None => Err(ResolveError::UnsolvedType(qualified)),
        }
    }

    fn class_type_params(&self) -> Vec<TypeParamRef> {
        let count = self
            .data
            .stub
            .signature
            .as_ref()
            .map_or(0, |s| s.type_parameters.len());
        (0..count)
            .map(|index| {
                Arc::new(BytecodeTypeParam {
                    class: self.clone(),
                    method: None,
                    index,
                }) as TypeParamRef
            })
            .collect()
    }

    fn method_type_params(&self, method: usize) -> Vec<TypeParamRef> {
        let count = self
            .method(method)
            .signature
            .as_ref()
            .map_or(0, |s| s.type_parameters.len());
        (0..count)
            .map(|index| {
                Arc::new(BytecodeTypeParam {
                    class: self.clone(),
                    method: Some(method),
                    index,
                }) as TypeParamRef
            })
            .collect()
    }

    /// Type variables bind to the method, then the class, then enclosing
    /// classes outward.
    fn type_variable(
        &self,
        name: &str,
        method_params: &[TypeParamRef],
        solver: &dyn TypeSolver,
    ) -> Result<ResolvedType, ResolveError> {
        if let Some(param) = method_params.iter().find(|p| p.name() == name) {
            return Ok(ResolvedType::TypeVariable(param.clone()));
        }
        if let Some(param) = self.class_type_params().into_iter().find(|p| p.name() == name) {
            return Ok(ResolvedType::TypeVariable(param));
        }
        let mut outer = self.containing_type(solver)?;
        for _ in 0..MAX_NESTING {
            let Some(decl) = outer else {
                break;
            };
            if let Some(param) = decl.type_parameters().into_iter().find(|p| p.name() == name) {
                return Ok(ResolvedType::TypeVariable(param));
            }
            outer = decl.containing_type(solver)?;
        }
        Err(ResolveError::unsolved_symbol(name, self.internal_name()))
    }

    pub(crate) fn resolve_signature(
        &self,
        sig: &TypeSignature,
        method_params: &[TypeParamRef],
        solver: &dyn TypeSolver,
    ) -> Result<ResolvedType, ResolveError> {
        Ok(match sig {
            TypeSignature::Base(base) => ResolvedType::Primitive(primitive(*base)),
            TypeSignature::Array(component) => {
                ResolvedType::array(self.resolve_signature(component, method_params, solver)?)?
            }
            TypeSignature::TypeVariable(name) => self.type_variable(name, method_params, solver)?,
            TypeSignature::Class(class) => self.resolve_class_signature(class, method_params, solver)?,
        })
    }

    fn resolve_class_signature(
        &self,
        sig: &ClassTypeSignature,
        method_params: &[TypeParamRef],
        solver: &dyn TypeSolver,
    ) -> Result<ResolvedType, ResolveError> {
        let decl = self.solve_internal(&sig.internal_name(), solver)?;
        let args = sig
            .type_arguments()
            .iter()
            .map(|arg| {
                Ok(match arg {
                    TypeArgument::Any => ResolvedType::Wildcard(Wildcard::Unbounded),
                    TypeArgument::Exact(t) => self.resolve_signature(t, method_params, solver)?,
                    TypeArgument::Extends(t) => ResolvedType::Wildcard(Wildcard::Extends(Box::new(
                        self.resolve_signature(t, method_params, solver)?,
                    ))),
                    TypeArgument::Super(t) => ResolvedType::Wildcard(Wildcard::Super(Box::new(
                        self.resolve_signature(t, method_params, solver)?,
                    ))),
                })
            })
            .collect::<Result<Vec<_>, ResolveError>>()?;
        Ok(ResolvedType::reference(decl, args))
    }

    fn resolve_descriptor(&self, ty: &FieldType, solver: &dyn TypeSolver) -> Result<ResolvedType, ResolveError> {
        Ok(match ty {
            FieldType::Base(base) => ResolvedType::Primitive(primitive(*base)),
            FieldType::Object(internal) => ResolvedType::raw(self.solve_internal(internal, solver)?),
            FieldType::Array(component) => ResolvedType::array(self.resolve_descriptor(component, solver)?)?,
        })
    }

    fn resolve_param_bounds(
        &self,
        param: &TypeParameter,
        method_params: &[TypeParamRef],
        solver: &dyn TypeSolver,
    ) -> Result<Vec<ResolvedType>, ResolveError> {
        let mut bounds = param
            .bounds()
            .map(|b| self.resolve_signature(b, method_params, solver))
            .collect::<Result<Vec<_>, _>>()?;
        // `T extends Object` is how a bare `T` is usually encoded.
        if bounds.len() == 1 && bounds[0].is_class_named("java.lang.Object") {
            bounds.clear();
        }
        Ok(bounds)
    }

    /// Parameter types as declared. Synthetic leading parameters present only
    /// in the descriptor (outer instance, enum name and ordinal) are absent
    /// when a signature exists.
    fn method_param_count(&self, method: usize) -> usize {
        let m = self.method(method);
        match &m.signature {
            Some(sig) => sig.parameters.len(),
            None => m.parsed_descriptor.params.len(),
        }
    }

    fn method_param_type(
        &self,
        method: usize,
        index: usize,
        solver: &dyn TypeSolver,
    ) -> Result<ResolvedType, ResolveError> {
        let m = self.method(method);
        let missing = || DeclError::InvariantViolation(format!("no parameter {index} on {}", m.name));
        match &m.signature {
            Some(sig) => {
                let param = sig.parameters.get(index).ok_or_else(missing)?;
                self.resolve_signature(param, &self.method_type_params(method), solver)
            }
            None => {
                let param = m.parsed_descriptor.params.get(index).ok_or_else(missing)?;
                self.resolve_descriptor(param, solver)
            }
        }
    }

    fn method_param_name(&self, method: usize, index: usize) -> Option<&str> {
        let m = self.method(method);
        let count = self.method_param_count(method);
        // `MethodParameters` may list synthetic leading parameters too.
        let skip = m.parameter_names.len().checked_sub(count)?;
        m.parameter_names.get(skip + index)?.as_deref()
    }

    fn method_thrown(&self, method: usize, solver: &dyn TypeSolver) -> Result<Vec<ResolvedType>, ResolveError> {
        let m = self.method(method);
        match m.signature.as_ref().filter(|s| !s.throws.is_empty()) {
            Some(sig) => {
                let params = self.method_type_params(method);
                sig.throws
                    .iter()
                    .map(|t| self.resolve_signature(t, &params, solver))
                    .collect()
            }
            None => m
                .exceptions
                .iter()
                .map(|e| Ok(ResolvedType::raw(self.solve_internal(e, solver)?)))
                .collect(),
        }
    }

    fn method_return(&self, method: usize, solver: &dyn TypeSolver) -> Result<ResolvedType, ResolveError> {
        let m = self.method(method);
        match &m.signature {
            Some(sig) => match &sig.return_type {
                Some(ret) => self.resolve_signature(ret, &self.method_type_params(method), solver),
                None => Ok(ResolvedType::Void),
            },
            None => match &m.parsed_descriptor.return_type {
                ReturnType::Void => Ok(ResolvedType::Void),
                ReturnType::Type(ty) => self.resolve_descriptor(ty, solver),
            },
        }
    }

    fn method_modifiers(&self, method: usize) -> ModifierSet {
        let flags = self.method(method).access_flags;
        let mut modifiers = ModifierSet::from_access_flags(flags, MemberKind::Method);
        let in_interface = self.data.stub.access_flags & ACC_INTERFACE != 0;
        if in_interface && flags & (ACC_ABSTRACT | ACC_STATIC | ACC_PRIVATE) == 0 {
            modifiers |= ModifierSet::DEFAULT;
        }
        modifiers
    }
}

fn annotation_usages(annotations: &[javelin_classfile::Annotation]) -> Vec<AnnotationUsage> {
    annotations
        .iter()
        .filter_map(|a| a.type_internal_name())
        .map(|internal| AnnotationUsage {
            name: internal.replace('/', "."),
        })
        .collect()
}

impl Declaration for BytecodeTypeDecl {
    fn name(&self) -> &str {
        let q = &self.data.qualified_name;
        q.rsplit_once('.').map_or(q.as_str(), |(_, simple)| simple)
    }

    fn kind(&self) -> DeclKind {
        self.data.kind
    }

    fn origin(&self) -> DeclOrigin {
        DeclOrigin::Bytecode {
            provider: self.data.provider,
            class: self.internal_name().into(),
            member: None,
        }
    }

    fn modifiers(&self) -> ModifierSet {
        self.data.modifiers
    }

    fn annotations(&self) -> Vec<AnnotationUsage> {
        annotation_usages(&self.data.stub.annotations)
    }
}

impl ReferenceTypeDecl for BytecodeTypeDecl {
    fn qualified_name(&self) -> String {
        self.data.qualified_name.clone()
    }

    fn package_name(&self) -> String {
        self.data.package.clone()
    }

    fn to_ref(&self) -> TypeDeclRef {
        Arc::new(self.clone())
    }

    fn type_parameters(&self) -> Vec<TypeParamRef> {
        self.class_type_params()
    }

    fn superclass(&self, solver: &dyn TypeSolver) -> Result<Option<ResolvedType>, ResolveError> {
        if self.is_interface() {
            return Ok(None);
        }
        let stub = &self.data.stub;
        let Some(super_class) = &stub.super_class else {
            return Ok(None);
        };
        match &stub.signature {
            Some(sig) => self.resolve_class_signature(&sig.super_class, &[], solver).map(Some),
            None => Ok(Some(ResolvedType::raw(self.solve_internal(super_class, solver)?))),
        }
    }

    fn interfaces(&self, solver: &dyn TypeSolver) -> Result<Vec<ResolvedType>, ResolveError> {
        let stub = &self.data.stub;
        match &stub.signature {
            Some(sig) => sig
                .interfaces
                .iter()
                .map(|i| self.resolve_class_signature(i, &[], solver))
                .collect(),
            None => stub
                .interfaces
                .iter()
                .map(|i| Ok(ResolvedType::raw(self.solve_internal(i, solver)?)))
                .collect(),
        }
    }

    fn declared_fields(&self) -> Vec<FieldRef> {
        self.data
            .fields
            .iter()
            .map(|&index| {
                Arc::new(BytecodeField {
                    class: self.clone(),
                    index,
                }) as FieldRef
            })
            .collect()
    }

    fn declared_methods(&self) -> Vec<MethodRef> {
        self.data
            .methods
            .iter()
            .map(|&index| {
                Arc::new(BytecodeMethod {
                    class: self.clone(),
                    index,
                }) as MethodRef
            })
            .collect()
    }

    fn constructors(&self) -> Vec<ConstructorRef> {
        self.data
            .constructors
            .iter()
            .map(|&index| {
                Arc::new(BytecodeConstructor {
                    class: self.clone(),
                    index,
                }) as ConstructorRef
            })
            .collect()
    }

    fn nested_types(&self, solver: &dyn TypeSolver) -> Result<Vec<TypeDeclRef>, ResolveError> {
        let me = self.internal_name();
        self.data
            .stub
            .inner_classes
            .iter()
            .filter(|ic| ic.outer_class.as_deref() == Some(me) && ic.inner_name.is_some())
            .map(|ic| self.solve_internal(&ic.inner_class, solver))
            .collect()
    }

    fn containing_type(&self, solver: &dyn TypeSolver) -> Result<Option<TypeDeclRef>, ResolveError> {
        match self.data.stub.own_inner_class_entry() {
            Some(InnerClassInfo {
                outer_class: Some(outer),
                inner_name: Some(_),
                ..
            }) => self.solve_internal(outer, solver).map(Some),
            _ => Ok(None),
        }
    }

    fn enum_constants(&self) -> Vec<EnumConstantRef> {
        self.data
            .enum_constants
            .iter()
            .map(|&index| {
                Arc::new(BytecodeEnumConstant {
                    class: self.clone(),
                    index,
                }) as EnumConstantRef
            })
            .collect()
    }

    fn annotation_members(&self) -> Vec<AnnotationMemberRef> {
        if self.data.kind != DeclKind::Annotation {
            return Vec::new();
        }
        self.data
            .methods
            .iter()
            .map(|&index| {
                Arc::new(BytecodeAnnotationMember {
                    class: self.clone(),
                    index,
                }) as AnnotationMemberRef
            })
            .collect()
    }

    fn class_name(&self) -> String {
        let q = &self.data.qualified_name;
        if self.data.package.is_empty() {
            q.clone()
        } else {
            q[self.data.package.len() + 1..].to_string()
        }
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
    BytecodeTypeParam,
    BytecodeField,
    BytecodeEnumConstant,
    BytecodeMethod,
    BytecodeConstructor,
    BytecodeParameter,
    BytecodeAnnotationMember,
);

pub struct BytecodeTypeParam {
    class: BytecodeTypeDecl,
    method: Option<usize>,
    index: usize,
}

impl BytecodeTypeParam {
    fn spec(&self) -> Option<&TypeParameter> {
        match self.method {
            Some(m) => self.class.method(m).signature.as_ref()?.type_parameters.get(self.index),
            None => self.class.data.stub.signature.as_ref()?.type_parameters.get(self.index),
        }
    }
}

impl Declaration for BytecodeTypeParam {
    fn name(&self) -> &str {
        self.spec().map_or("", |p| p.name.as_str())
    }

    fn kind(&self) -> DeclKind {
        DeclKind::TypeParameter
    }

    fn origin(&self) -> DeclOrigin {
        let member = match self.method {
            Some(m) => format!("{}<{}>", self.class.method_key(m), self.name()),
            None => format!("<{}>", self.name()),
        };
        self.class.member_origin(member)
    }
}

impl TypeParameterDecl for BytecodeTypeParam {
    fn owner(&self) -> TypeParamOwner {
        match self.method {
            Some(m) => TypeParamOwner::Method(format!(
                "{}.{}",
                self.class.qualified_name(),
                self.class.method(m).name
            )),
            None => TypeParamOwner::Type(self.class.qualified_name()),
        }
    }

    fn bounds(&self, solver: &dyn TypeSolver) -> Result<Vec<ResolvedType>, ResolveError> {
        let Some(spec) = self.spec() else {
            return Ok(Vec::new());
        };
        let method_params = self
            .method
            .map(|m| self.class.method_type_params(m))
            .unwrap_or_default();
        self.class.resolve_param_bounds(spec, &method_params, solver)
    }
}

pub struct BytecodeField {
    class: BytecodeTypeDecl,
    index: usize,
}

impl BytecodeField {
    fn stub(&self) -> &javelin_classfile::FieldStub {
        &self.class.data.stub.fields[self.index]
    }
}

impl Declaration for BytecodeField {
    fn name(&self) -> &str {
        &self.stub().name
    }

    fn kind(&self) -> DeclKind {
        DeclKind::Field
    }

    fn origin(&self) -> DeclOrigin {
        let stub = self.stub();
        self.class
            .member_origin(format!("{}:{}", stub.name, stub.descriptor))
    }

    fn modifiers(&self) -> ModifierSet {
        ModifierSet::from_access_flags(self.stub().access_flags, MemberKind::Field)
    }

    fn annotations(&self) -> Vec<AnnotationUsage> {
        annotation_usages(&self.stub().annotations)
    }
}

impl FieldDecl for BytecodeField {
    fn ty(&self, solver: &dyn TypeSolver) -> Result<ResolvedType, ResolveError> {
        let stub = self.stub();
        match &stub.signature {
            Some(sig) => self.class.resolve_signature(sig, &[], solver),
            None => self.class.resolve_descriptor(&stub.parsed_descriptor, solver),
        }
    }

    fn declaring_type(&self) -> TypeDeclRef {
        self.class.to_ref()
    }

    fn constant_value(&self) -> Option<ConstantValue> {
        let stub = self.stub();
        let modifiers = self.modifiers();
        if !(modifiers.is_static() && modifiers.is_final()) {
            return None;
        }
        normalize_constant(stub.constant_value.as_ref()?, &stub.parsed_descriptor)
    }
}

/// An enum constant: a field carrying `ACC_ENUM`.
pub struct BytecodeEnumConstant {
    class: BytecodeTypeDecl,
    index: usize,
}

impl BytecodeEnumConstant {
    /// Wraps the field `name` of `class`. Fails with an invariant violation if
    /// the field does not exist or is not an enum constant.
    pub fn new(class: &BytecodeTypeDecl, name: &str) -> Result<Self, DeclError> {
        let index = class
            .data
            .stub
            .fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| {
                DeclError::InvariantViolation(format!("no field `{name}` in {}", class.internal_name()))
            })?;
        if class.data.stub.fields[index].access_flags & ACC_ENUM == 0 {
            return Err(DeclError::InvariantViolation(format!(
                "field `{name}` of {} is not an enum constant",
                class.internal_name()
            )));
        }
        Ok(BytecodeEnumConstant {
            class: class.clone(),
            index,
        })
    }

    fn stub(&self) -> &javelin_classfile::FieldStub {
        &self.class.data.stub.fields[self.index]
    }
}

impl Declaration for BytecodeEnumConstant {
    fn name(&self) -> &str {
        &self.stub().name
    }

    fn kind(&self) -> DeclKind {
        DeclKind::EnumConstant
    }

    fn origin(&self) -> DeclOrigin {
        let stub = self.stub();
        self.class
            .member_origin(format!("{}:{}", stub.name, stub.descriptor))
    }

    fn modifiers(&self) -> ModifierSet {
        ModifierSet::from_access_flags(self.stub().access_flags, MemberKind::Field)
    }
}

impl EnumConstantDecl for BytecodeEnumConstant {
    fn declaring_type(&self) -> TypeDeclRef {
        self.class.to_ref()
    }
}

pub struct BytecodeMethod {
    class: BytecodeTypeDecl,
    index: usize,
}

impl Declaration for BytecodeMethod {
    fn name(&self) -> &str {
        &self.class.method(self.index).name
    }

    fn kind(&self) -> DeclKind {
        DeclKind::Method
    }

    fn origin(&self) -> DeclOrigin {
        self.class.member_origin(self.class.method_key(self.index))
    }

    fn modifiers(&self) -> ModifierSet {
        self.class.method_modifiers(self.index)
    }

    fn annotations(&self) -> Vec<AnnotationUsage> {
        annotation_usages(&self.class.method(self.index).annotations)
    }
}

impl MethodLikeDecl for BytecodeMethod {
    fn declaring_type(&self) -> TypeDeclRef {
        self.class.to_ref()
    }

    fn type_parameters(&self) -> Vec<TypeParamRef> {
        self.class.method_type_params(self.index)
    }

    fn param_count(&self) -> usize {
        self.class.method_param_count(self.index)
    }

    fn param(&self, index: usize) -> Option<ParamRef> {
        BytecodeParameter::new(&self.class, self.index, index)
    }

    fn thrown_types(&self, solver: &dyn TypeSolver) -> Result<Vec<ResolvedType>, ResolveError> {
        self.class.method_thrown(self.index, solver)
    }
}

impl MethodDecl for BytecodeMethod {
    fn return_type(&self, solver: &dyn TypeSolver) -> Result<ResolvedType, ResolveError> {
        self.class.method_return(self.index, solver)
    }

    /// The class file already carries the erased descriptor.
    fn method_descriptor(&self, _solver: &dyn TypeSolver) -> Result<String, ResolveError> {
        Ok(self.class.method(self.index).descriptor.clone())
    }
}

pub struct BytecodeConstructor {
    class: BytecodeTypeDecl,
    index: usize,
}

impl Declaration for BytecodeConstructor {
    fn name(&self) -> &str {
        self.class.name()
    }

    fn kind(&self) -> DeclKind {
        DeclKind::Constructor
    }

    fn origin(&self) -> DeclOrigin {
        self.class.member_origin(self.class.method_key(self.index))
    }

    fn modifiers(&self) -> ModifierSet {
        self.class.method_modifiers(self.index)
    }
}

impl MethodLikeDecl for BytecodeConstructor {
    fn declaring_type(&self) -> TypeDeclRef {
        self.class.to_ref()
    }

    fn type_parameters(&self) -> Vec<TypeParamRef> {
        self.class.method_type_params(self.index)
    }

    fn param_count(&self) -> usize {
        self.class.method_param_count(self.index)
    }

    fn param(&self, index: usize) -> Option<ParamRef> {
        BytecodeParameter::new(&self.class, self.index, index)
    }

    fn thrown_types(&self, solver: &dyn TypeSolver) -> Result<Vec<ResolvedType>, ResolveError> {
        self.class.method_thrown(self.index, solver)
    }
}

impl ConstructorDecl for BytecodeConstructor {}

pub struct BytecodeParameter {
    class: BytecodeTypeDecl,
    method: usize,
    index: usize,
    name: SmolStr,
    has_name: bool,
}

impl BytecodeParameter {
    fn new(class: &BytecodeTypeDecl, method: usize, index: usize) -> Option<ParamRef> {
        if index >= class.method_param_count(method) {
            return None;
        }
        let declared = class.method_param_name(method, index);
        let name = declared.map_or_else(|| SmolStr::new(format!("arg{index}")), SmolStr::new);
        Some(Arc::new(BytecodeParameter {
            class: class.clone(),
            method,
            index,
            name,
            has_name: declared.is_some(),
        }))
    }
}

impl Declaration for BytecodeParameter {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DeclKind {
        DeclKind::Parameter
    }

    fn origin(&self) -> DeclOrigin {
        self.class.member_origin(format!(
            "{}#{}",
            self.class.method_key(self.method),
            self.index
        ))
    }
}

impl ParameterDecl for BytecodeParameter {
    fn ty(&self, solver: &dyn TypeSolver) -> Result<ResolvedType, ResolveError> {
        self.class.method_param_type(self.method, self.index, solver)
    }

    fn is_variadic(&self) -> bool {
        self.class.method_modifiers(self.method).contains(ModifierSet::VARARGS)
            && self.index + 1 == self.class.method_param_count(self.method)
    }

    fn has_name(&self) -> bool {
        self.has_name
    }
}

pub struct BytecodeAnnotationMember {
    class: BytecodeTypeDecl,
    index: usize,
}

impl Declaration for BytecodeAnnotationMember {
    fn name(&self) -> &str {
        &self.class.method(self.index).name
    }

    fn kind(&self) -> DeclKind {
        DeclKind::AnnotationMember
    }

    fn origin(&self) -> DeclOrigin {
        self.class.member_origin(self.class.method_key(self.index))
    }

    fn modifiers(&self) -> ModifierSet {
        self.class.method_modifiers(self.index)
    }
}

impl AnnotationMemberDecl for BytecodeAnnotationMember {
    fn declaring_type(&self) -> TypeDeclRef {
        self.class.to_ref()
    }

    fn ty(&self, solver: &dyn TypeSolver) -> Result<ResolvedType, ResolveError> {
        self.class.method_return(self.index, solver)
    }

    fn has_default_value(&self) -> bool {
        self.class.method(self.index).has_default_value
    }
}
