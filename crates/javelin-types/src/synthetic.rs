//! Declarations built in code rather than read from a provider.
//!
//! Types are written as Java-like text (`java.util.List<E>`, `int[]`,
//! `? extends T`) and resolved lazily through the solver handed to each
//! query, so stubs may refer to each other in any order.

use std::fmt;
use std::sync::Arc;

use javelin_core::ModifierSet;
use smol_str::SmolStr;

use crate::constant::ConstantValue;
use crate::decl::{
    ConstructorDecl, ConstructorRef, DeclKind, DeclOrigin, Declaration, FieldDecl, FieldRef,
    MethodDecl, MethodLikeDecl, MethodRef, ParamRef, ParameterDecl, ReferenceTypeDecl,
    TypeDeclRef, TypeParamOwner, TypeParamRef, TypeParameterDecl,
};
use crate::error::{DeclError, ResolveError};
use crate::primitive::PrimitiveType;
use crate::solver::TypeSolver;
use crate::ty::{ResolvedType, Wildcard};

/// A type written as text, before name resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StubTy {
    Primitive(PrimitiveType),
    Void,
    Named(String, Vec<StubTy>),
    Array(Box<StubTy>),
    Wildcard(Option<(bool, Box<StubTy>)>),
}

fn parse_ty(text: &str) -> Result<StubTy, DeclError> {
    let mut parser = TyParser {
        text: text.as_bytes(),
        pos: 0,
    };
    let ty = parser.ty()?;
    parser.skip_ws();
    if parser.pos != parser.text.len() {
        return Err(DeclError::InvariantViolation(format!("trailing input in stub type `{text}`")));
    }
    Ok(ty)
}

struct TyParser<'a> {
    text: &'a [u8],
    pos: usize,
}

impl TyParser<'_> {
    fn skip_ws(&mut self) {
        while self.text.get(self.pos).is_some_and(u8::is_ascii_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, b: u8) -> bool {
        self.skip_ws();
        if self.text.get(self.pos) == Some(&b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn word(&mut self) -> Result<String, DeclError> {
        self.skip_ws();
        let start = self.pos;
        while self
            .text
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'.'))
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(DeclError::InvariantViolation(format!(
                "expected a type name at offset {start}"
            )));
        }
        Ok(String::from_utf8_lossy(&self.text[start..self.pos]).into_owned())
    }

    fn ty(&mut self) -> Result<StubTy, DeclError> {
        if self.eat(b'?') {
            let save = self.pos;
            let bound = match self.word() {
                Ok(w) if w == "extends" => Some((true, Box::new(self.ty()?))),
                Ok(w) if w == "super" => Some((false, Box::new(self.ty()?))),
                _ => {
                    self.pos = save;
                    None
                }
            };
            return Ok(StubTy::Wildcard(bound));
        }
        let name = self.word()?;
        let mut ty = if name == "void" {
            StubTy::Void
        } else if let Some(p) = PrimitiveType::from_keyword(&name) {
            StubTy::Primitive(p)
        } else {
            let mut args = Vec::new();
            if self.eat(b'<') {
                loop {
                    args.push(self.ty()?);
                    if self.eat(b'>') {
                        break;
                    }
                    if !self.eat(b',') {
                        return Err(DeclError::InvariantViolation("expected `,` or `>`".into()));
                    }
                }
            }
            StubTy::Named(name, args)
        };
        while self.eat(b'[') {
            if !self.eat(b']') {
                return Err(DeclError::InvariantViolation("expected `]`".into()));
            }
            ty = StubTy::Array(Box::new(ty));
        }
        Ok(ty)
    }
}

#[derive(Debug)]
struct FieldSpec {
    name: SmolStr,
    ty: StubTy,
    modifiers: ModifierSet,
    constant: Option<ConstantValue>,
}

#[derive(Debug)]
struct MethodSpec {
    name: SmolStr,
    type_params: Vec<(SmolStr, Vec<StubTy>)>,
    params: Vec<StubTy>,
    ret: StubTy,
    modifiers: ModifierSet,
}

#[derive(Debug)]
struct StubData {
    id: u64,
    qualified_name: String,
    package: String,
    kind: DeclKind,
    modifiers: ModifierSet,
    type_params: Vec<(SmolStr, Vec<StubTy>)>,
    superclass: Option<StubTy>,
    interfaces: Vec<StubTy>,
    fields: Vec<FieldSpec>,
    methods: Vec<MethodSpec>,
    constructors: Vec<(Vec<StubTy>, ModifierSet)>,
    outer: Option<String>,
    nested: Vec<String>,
}

/// A type declaration assembled by hand. Used by tests and embedders that
/// need a few known types without a backing source or class file.
#[derive(Clone)]
pub struct StubTypeDecl {
    data: Arc<StubData>,
}

impl fmt::Debug for StubTypeDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StubTypeDecl{{{}}}", self.data.qualified_name)
    }
}

/// Builder for [`StubTypeDecl`]. Stub types given as text must parse; a
/// malformed one makes [`StubTypeBuilder::build`] fail.
#[derive(Debug)]
pub struct StubTypeBuilder {
    data: StubData,
    error: Option<DeclError>,
}

impl StubTypeDecl {
    pub fn class(qualified_name: &str) -> StubTypeBuilder {
        StubTypeBuilder::new(qualified_name, DeclKind::Class)
    }

    pub fn interface(qualified_name: &str) -> StubTypeBuilder {
        StubTypeBuilder::new(qualified_name, DeclKind::Interface)
    }

    pub fn enumeration(qualified_name: &str) -> StubTypeBuilder {
        StubTypeBuilder::new(qualified_name, DeclKind::Enum)
    }

    fn origin_of(&self, member: Option<String>) -> DeclOrigin {
        DeclOrigin::Synthetic {
            id: self.data.id,
            member: member.map(SmolStr::from),
        }
    }

    fn class_type_params(&self) -> Vec<TypeParamRef> {
        (0..self.data.type_params.len())
            .map(|index| {
                Arc::new(StubTypeParam {
                    owner: self.clone(),
                    method: None,
                    index,
                }) as TypeParamRef
            })
            .collect()
    }

    fn resolve(
        &self,
        ty: &StubTy,
        method_params: &[TypeParamRef],
        solver: &dyn TypeSolver,
    ) -> Result<ResolvedType, ResolveError> {
        Ok(match ty {
            StubTy::Primitive(p) => ResolvedType::Primitive(*p),
            StubTy::Void => ResolvedType::Void,
            StubTy::Array(c) => ResolvedType::array(self.resolve(c, method_params, solver)?)?,
            StubTy::Wildcard(None) => ResolvedType::Wildcard(Wildcard::Unbounded),
            StubTy::Wildcard(Some((upper, bound))) => {
                let bound = Box::new(self.resolve(bound, method_params, solver)?);
                ResolvedType::Wildcard(if *upper {
                    Wildcard::Extends(bound)
                } else {
                    Wildcard::Super(bound)
                })
            }
            StubTy::Named(name, args) => {
                if args.is_empty() {
                    let var = method_params
                        .iter()
                        .find(|p| p.name() == name)
                        .cloned()
                        .or_else(|| {
                            self.class_type_params()
                                .into_iter()
                                .find(|p| p.name() == name)
                        });
                    if let Some(var) = var {
                        return Ok(ResolvedType::TypeVariable(var));
                    }
                }
                let decl = solver.solve_type(name)?;
                let args = args
                    .iter()
                    .map(|a| self.resolve(a, method_params, solver))
                    .collect::<Result<Vec<_>, _>>()?;
                ResolvedType::reference(decl, args)
            }
        })
    }
}

impl StubTypeBuilder {
    fn new(qualified_name: &str, kind: DeclKind) -> Self {
        let package = qualified_name
            .rsplit_once('.')
            .map(|(p, _)| p.to_string())
            .unwrap_or_default();
        let id = crate::decl::next_synthetic_id();
        StubTypeBuilder {
            data: StubData {
                id,
                qualified_name: qualified_name.to_string(),
                package,
                kind,
                modifiers: ModifierSet::PUBLIC,
                type_params: Vec::new(),
                superclass: None,
                interfaces: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
                constructors: Vec::new(),
                outer: None,
                nested: Vec::new(),
            },
            error: None,
        }
    }

    fn parse(&mut self, text: &str) -> StubTy {
        match parse_ty(text) {
            Ok(ty) => ty,
            Err(err) => {
                self.error.get_or_insert(err);
                StubTy::Void
            }
        }
    }

    fn parse_all(&mut self, texts: &[&str]) -> Vec<StubTy> {
        texts.iter().map(|t| self.parse(t)).collect()
    }

    /// Marks this a member type of the top-level type `outer`.
    pub fn nested_in(mut self, outer: &str) -> Self {
        self.data.package = outer
            .rsplit_once('.')
            .map(|(p, _)| p.to_string())
            .unwrap_or_default();
        self.data.outer = Some(outer.to_string());
        self
    }

    pub fn nested(mut self, qualified_name: &str) -> Self {
        self.data.nested.push(qualified_name.to_string());
        self
    }

    pub fn modifiers(mut self, modifiers: ModifierSet) -> Self {
        self.data.modifiers = modifiers;
        self
    }

    pub fn type_param(mut self, name: &str, bounds: &[&str]) -> Self {
        let bounds = self.parse_all(bounds);
        self.data.type_params.push((name.into(), bounds));
        self
    }

    pub fn extends(mut self, ty: &str) -> Self {
        let ty = self.parse(ty);
        if self.data.kind == DeclKind::Interface {
            self.data.interfaces.push(ty);
        } else {
            self.data.superclass = Some(ty);
        }
        self
    }

    pub fn implements(mut self, ty: &str) -> Self {
        let ty = self.parse(ty);
        self.data.interfaces.push(ty);
        self
    }

    pub fn field(self, name: &str, ty: &str) -> Self {
        self.field_with(name, ty, ModifierSet::PUBLIC, None)
    }

    pub fn field_with(
        mut self,
        name: &str,
        ty: &str,
        modifiers: ModifierSet,
        constant: Option<ConstantValue>,
    ) -> Self {
        let ty = self.parse(ty);
        self.data.fields.push(FieldSpec {
            name: name.into(),
            ty,
            modifiers,
            constant,
        });
        self
    }

    pub fn method(self, name: &str, params: &[&str], ret: &str) -> Self {
        self.method_with(name, &[], params, ret, ModifierSet::PUBLIC)
    }

    /// `type_params` are `(name, bounds)` pairs; a trailing `...` on the last
    /// parameter makes the method variadic.
    pub fn method_with(
        mut self,
        name: &str,
        type_params: &[(&str, &[&str])],
        params: &[&str],
        ret: &str,
        mut modifiers: ModifierSet,
    ) -> Self {
        let type_params = type_params
            .iter()
            .map(|(n, b)| (SmolStr::from(*n), self.parse_all(b)))
            .collect();
        let mut parsed = Vec::with_capacity(params.len());
        for (i, param) in params.iter().enumerate() {
            match param.strip_suffix("...") {
                Some(component) if i + 1 == params.len() => {
                    modifiers |= ModifierSet::VARARGS;
                    parsed.push(StubTy::Array(Box::new(self.parse(component))));
                }
                _ => parsed.push(self.parse(param)),
            }
        }
        let ret = self.parse(ret);
        self.data.methods.push(MethodSpec {
            name: name.into(),
            type_params,
            params: parsed,
            ret,
            modifiers,
        });
        self
    }

    pub fn constructor(mut self, params: &[&str]) -> Self {
        let params = self.parse_all(params);
        self.data.constructors.push((params, ModifierSet::PUBLIC));
        self
    }

    pub fn build(self) -> Result<TypeDeclRef, DeclError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        Ok(Arc::new(StubTypeDecl {
            data: Arc::new(self.data),
        }))
    }
}

impl Declaration for StubTypeDecl {
    fn name(&self) -> &str {
        let q = &self.data.qualified_name;
        q.rsplit_once('.').map_or(q.as_str(), |(_, n)| n)
    }

    fn kind(&self) -> DeclKind {
        self.data.kind
    }

    fn origin(&self) -> DeclOrigin {
        self.origin_of(None)
    }

    fn modifiers(&self) -> ModifierSet {
        self.data.modifiers
    }
}

impl ReferenceTypeDecl for StubTypeDecl {
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
        if self.data.kind == DeclKind::Interface || self.is_java_lang_object() {
            return Ok(None);
        }
        match &self.data.superclass {
            Some(ty) => self.resolve(ty, &[], solver).map(Some),
            None => Ok(solver.try_lookup("java.lang.Object")?.map(ResolvedType::raw)),
        }
    }

    fn interfaces(&self, solver: &dyn TypeSolver) -> Result<Vec<ResolvedType>, ResolveError> {
        self.data
            .interfaces
            .iter()
            .map(|i| self.resolve(i, &[], solver))
            .collect()
    }

    fn declared_fields(&self) -> Vec<FieldRef> {
        (0..self.data.fields.len())
            .map(|index| {
                Arc::new(StubField {
                    owner: self.clone(),
                    index,
                }) as FieldRef
            })
            .collect()
    }

    fn declared_methods(&self) -> Vec<MethodRef> {
        (0..self.data.methods.len())
            .map(|index| {
                Arc::new(StubMethod {
                    owner: self.clone(),
                    index,
                }) as MethodRef
            })
            .collect()
    }

    fn constructors(&self) -> Vec<ConstructorRef> {
        (0..self.data.constructors.len())
            .map(|index| {
                Arc::new(StubConstructor {
                    owner: self.clone(),
                    index,
                }) as ConstructorRef
            })
            .collect()
    }

    fn nested_types(&self, solver: &dyn TypeSolver) -> Result<Vec<TypeDeclRef>, ResolveError> {
        self.data
            .nested
            .iter()
            .map(|n| solver.solve_type(n))
            .collect()
    }

    fn containing_type(&self, solver: &dyn TypeSolver) -> Result<Option<TypeDeclRef>, ResolveError> {
        self.data
            .outer
            .as_deref()
            .map(|o| solver.solve_type(o))
            .transpose()
    }

    fn class_name(&self) -> String {
        match &self.data.outer {
            Some(outer) => {
                let outer_simple = outer
                    .strip_prefix(&self.data.package)
                    .map(|s| s.trim_start_matches('.'))
                    .unwrap_or(outer);
                format!("{outer_simple}.{}", self.name())
            }
            None => self.name().to_string(),
        }
    }
}

#[derive(Debug)]
struct StubTypeParam {
    owner: StubTypeDecl,
    method: Option<usize>,
    index: usize,
}

impl StubTypeParam {
    fn spec(&self) -> &(SmolStr, Vec<StubTy>) {
        match self.method {
            Some(m) => &self.owner.data.methods[m].type_params[self.index],
            None => &self.owner.data.type_params[self.index],
        }
    }
}

impl Declaration for StubTypeParam {
    fn name(&self) -> &str {
        &self.spec().0
    }

    fn kind(&self) -> DeclKind {
        DeclKind::TypeParameter
    }

    fn origin(&self) -> DeclOrigin {
        let member = match self.method {
            Some(m) => format!("{}#{m}<{}>", self.owner.data.methods[m].name, self.name()),
            None => format!("<{}>", self.name()),
        };
        self.owner.origin_of(Some(member))
    }
}

impl TypeParameterDecl for StubTypeParam {
    fn owner(&self) -> TypeParamOwner {
        match self.method {
            Some(m) => TypeParamOwner::Method(format!(
                "{}.{}",
                self.owner.data.qualified_name, self.owner.data.methods[m].name
            )),
            None => TypeParamOwner::Type(self.owner.data.qualified_name.clone()),
        }
    }

    fn bounds(&self, solver: &dyn TypeSolver) -> Result<Vec<ResolvedType>, ResolveError> {
        let method_params = match self.method {
            Some(m) => method_type_params(&self.owner, m),
            None => Vec::new(),
        };
        self.spec()
            .1
            .iter()
            .map(|b| self.owner.resolve(b, &method_params, solver))
            .collect()
    }
}

fn method_type_params(owner: &StubTypeDecl, method: usize) -> Vec<TypeParamRef> {
    (0..owner.data.methods[method].type_params.len())
        .map(|index| {
            Arc::new(StubTypeParam {
                owner: owner.clone(),
                method: Some(method),
                index,
            }) as TypeParamRef
        })
        .collect()
}

#[derive(Debug)]
struct StubField {
    owner: StubTypeDecl,
    index: usize,
}

impl StubField {
    fn spec(&self) -> &FieldSpec {
        &self.owner.data.fields[self.index]
    }
}

impl Declaration for StubField {
    fn name(&self) -> &str {
        &self.spec().name
    }

    fn kind(&self) -> DeclKind {
        DeclKind::Field
    }

    fn origin(&self) -> DeclOrigin {
        self.owner.origin_of(Some(format!("{}:", self.spec().name)))
    }

    fn modifiers(&self) -> ModifierSet {
        self.spec().modifiers
    }
}

impl FieldDecl for StubField {
    fn ty(&self, solver: &dyn TypeSolver) -> Result<ResolvedType, ResolveError> {
        self.owner.resolve(&self.spec().ty, &[], solver)
    }

    fn declaring_type(&self) -> TypeDeclRef {
        self.owner.to_ref()
    }

    fn constant_value(&self) -> Option<ConstantValue> {
        let spec = self.spec();
        if spec.modifiers.is_static() && spec.modifiers.is_final() {
            spec.constant.clone()
        } else {
            None
        }
    }
}

/// Method or constructor slot of a stub.
#[derive(Debug, Clone, Copy)]
enum Callable {
    Method(usize),
    Constructor(usize),
}

#[derive(Debug)]
struct StubMethod {
    owner: StubTypeDecl,
    index: usize,
}

impl StubMethod {
    fn spec(&self) -> &MethodSpec {
        &self.owner.data.methods[self.index]
    }
}

impl Declaration for StubMethod {
    fn name(&self) -> &str {
        &self.spec().name
    }

    fn kind(&self) -> DeclKind {
        DeclKind::Method
    }

    fn origin(&self) -> DeclOrigin {
        self.owner
            .origin_of(Some(format!("{}#{}", self.spec().name, self.index)))
    }

    fn modifiers(&self) -> ModifierSet {
        self.spec().modifiers
    }
}

impl MethodLikeDecl for StubMethod {
    fn declaring_type(&self) -> TypeDeclRef {
        self.owner.to_ref()
    }

    fn type_parameters(&self) -> Vec<TypeParamRef> {
        method_type_params(&self.owner, self.index)
    }

    fn param_count(&self) -> usize {
        self.spec().params.len()
    }

    fn param(&self, index: usize) -> Option<ParamRef> {
        (index < self.param_count()).then(|| {
            Arc::new(StubParam {
                owner: self.owner.clone(),
                callable: Callable::Method(self.index),
                index,
            }) as ParamRef
        })
    }

    fn thrown_types(&self, _solver: &dyn TypeSolver) -> Result<Vec<ResolvedType>, ResolveError> {
        Ok(Vec::new())
    }
}

impl MethodDecl for StubMethod {
    fn return_type(&self, solver: &dyn TypeSolver) -> Result<ResolvedType, ResolveError> {
        self.owner
            .resolve(&self.spec().ret, &self.type_parameters(), solver)
    }
}

#[derive(Debug)]
struct StubConstructor {
    owner: StubTypeDecl,
    index: usize,
}

impl Declaration for StubConstructor {
    fn name(&self) -> &str {
        self.owner.name()
    }

    fn kind(&self) -> DeclKind {
        DeclKind::Constructor
    }

    fn origin(&self) -> DeclOrigin {
        self.owner.origin_of(Some(format!("<init>#{}", self.index)))
    }

    fn modifiers(&self) -> ModifierSet {
        self.owner.data.constructors[self.index].1
    }
}

impl MethodLikeDecl for StubConstructor {
    fn declaring_type(&self) -> TypeDeclRef {
        self.owner.to_ref()
    }

    fn type_parameters(&self) -> Vec<TypeParamRef> {
        Vec::new()
    }

    fn param_count(&self) -> usize {
        self.owner.data.constructors[self.index].0.len()
    }

    fn param(&self, index: usize) -> Option<ParamRef> {
        (index < self.param_count()).then(|| {
            Arc::new(StubParam {
                owner: self.owner.clone(),
                callable: Callable::Constructor(self.index),
                index,
            }) as ParamRef
        })
    }

    fn thrown_types(&self, _solver: &dyn TypeSolver) -> Result<Vec<ResolvedType>, ResolveError> {
        Ok(Vec::new())
    }
}

impl ConstructorDecl for StubConstructor {}

#[derive(Debug)]
struct StubParam {
    owner: StubTypeDecl,
    callable: Callable,
    index: usize,
}

impl StubParam {
    fn spec(&self) -> (&StubTy, bool, Vec<TypeParamRef>) {
        match self.callable {
            Callable::Method(m) => {
                let method = &self.owner.data.methods[m];
                let variadic = method.modifiers.contains(ModifierSet::VARARGS)
                    && self.index + 1 == method.params.len();
                (
                    &method.params[self.index],
                    variadic,
                    method_type_params(&self.owner, m),
                )
            }
            Callable::Constructor(c) => (&self.owner.data.constructors[c].0[self.index], false, Vec::new()),
        }
    }
}

impl Declaration for StubParam {
    fn name(&self) -> &str {
        const NAMES: [&str; 8] = ["arg0", "arg1", "arg2", "arg3", "arg4", "arg5", "arg6", "arg7"];
        NAMES.get(self.index).copied().unwrap_or("arg")
    }

    fn kind(&self) -> DeclKind {
        DeclKind::Parameter
    }

    fn origin(&self) -> DeclOrigin {
        let callable = match self.callable {
            Callable::Method(m) => format!("{}#{m}", self.owner.data.methods[m].name),
            Callable::Constructor(c) => format!("<init>#{c}"),
        };
        self.owner.origin_of(Some(format!("{callable}#{}", self.index)))
    }
}

impl ParameterDecl for StubParam {
    fn ty(&self, solver: &dyn TypeSolver) -> Result<ResolvedType, ResolveError> {
        let (ty, _, method_params) = self.spec();
        self.owner.resolve(ty, &method_params, solver)
    }

    fn is_variadic(&self) -> bool {
        self.spec().1
    }

    fn has_name(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::MemoryTypeSolver;

    #[test]
    fn stub_types_parse_generics_wildcards_and_arrays() {
        assert_eq!(
            parse_ty("java.util.Map<K, ? extends java.util.List<V>[]>").unwrap(),
            StubTy::Named(
                "java.util.Map".into(),
                vec![
                    StubTy::Named("K".into(), vec![]),
                    StubTy::Wildcard(Some((
                        true,
                        Box::new(StubTy::Array(Box::new(StubTy::Named(
                            "java.util.List".into(),
                            vec![StubTy::Named("V".into(), vec![])]
                        ))))
                    ))),
                ]
            )
        );
        assert_eq!(parse_ty("?").unwrap(), StubTy::Wildcard(None));
        assert_eq!(
            parse_ty("int[][]").unwrap(),
            StubTy::Array(Box::new(StubTy::Array(Box::new(StubTy::Primitive(PrimitiveType::Int)))))
        );
        assert!(parse_ty("List<").is_err());
    }

    #[test]
    fn members_resolve_through_the_solver() {
        let solver = MemoryTypeSolver::new();
        solver.add(StubTypeDecl::class("java.lang.Object").build().unwrap());
        solver.add(
            StubTypeDecl::class("p.Box")
                .type_param("T", &[])
                .field("value", "T")
                .method_with(
                    "map",
                    &[("R", &[])],
                    &["T", "int..."],
                    "p.Box<R>",
                    ModifierSet::PUBLIC,
                )
                .build()
                .unwrap(),
        );
        let boxed = solver.solve_type("p.Box").unwrap();

        assert_eq!(boxed.package_name(), "p");
        assert_eq!(
            boxed.superclass(&solver).unwrap().unwrap().qualified_name().as_deref(),
            Some("java.lang.Object")
        );
        let field = &boxed.declared_fields()[0];
        assert!(field.ty(&solver).unwrap().is_type_variable());
        assert!(field.constant_value().is_none());

        let map = &boxed.declared_methods()[0];
        assert!(map.is_variadic());
        assert_eq!(map.signature(&solver).unwrap(), "map(T, int[])");
        assert_eq!(map.return_type(&solver).unwrap().describe(), "p.Box<R>");
        assert_eq!(
            map.method_descriptor(&solver).unwrap(),
            "(Ljava/lang/Object;[I)Lp/Box;"
        );
    }

    #[test]
    fn malformed_stub_types_fail_the_build() {
        let err = StubTypeDecl::class("p.Bad").field("f", "List<").build().unwrap_err();
        assert!(matches!(err, DeclError::InvariantViolation(_)));
    }
}
