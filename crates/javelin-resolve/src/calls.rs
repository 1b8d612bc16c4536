//! Method invocations and instance creation: candidate collection, receiver
//! substitution, then overload selection.

use javelin_syntax::{NodeId, NodeKind};
use javelin_types::relations::{erasure, instantiate_as_supertype, object_type};
use javelin_types::{
    ConstructorRef, DeclError, MethodRef, MethodUsage, ResolveError, ResolvedType, Substitution,
    TypeParamRef, Wildcard,
};

use crate::expr::Target;
use crate::infer;
use crate::overload::{self, Call, Candidate};
use crate::scopes::Context;

/// The constructor chosen for `new T(...)` and the type of the created
/// object, with diamond arguments inferred.
#[derive(Debug, Clone)]
pub(crate) struct ConstructorCall {
    pub(crate) constructor: ConstructorRef,
    pub(crate) created: ResolvedType,
}

impl Context<'_> {
    fn argument_types(&self, args: &[NodeId]) -> Result<Vec<ResolvedType>, ResolveError> {
        args.iter().map(|&a| self.type_of(a)).collect()
    }

    fn explicit_type_args(&self, type_args: &Option<Vec<NodeId>>) -> Result<Vec<ResolvedType>, ResolveError> {
        type_args
            .iter()
            .flatten()
            .map(|&t| self.resolve_type(t))
            .collect()
    }

    /// Resolves the method invoked by `call` and its signature at this call
    /// site.
    pub(crate) fn method_call(&self, call: NodeId) -> Result<MethodUsage, ResolveError> {
        let tree = self.tree();
        let NodeKind::MethodCall {
            scope,
            type_args,
            name,
            args,
        } = tree.kind(call)
        else {
            return Err(DeclError::unsupported("method_call", tree.kind(call).label()).into());
        };
        let name = name.as_str();
        let _span = tracing::debug_span!(target: "javelin.resolve", "method_call", name, node = %call).entered();

        let (methods, receiver, context) = match scope {
            None => {
                let found = self.method_candidates(call, name)?;
                let context = match &found.receiver {
                    Some(receiver) => receiver.describe(),
                    None => self.describe_scope(call),
                };
                (found.methods, found.receiver, context)
            }
            Some(scope) => match self.classify(*scope)? {
                Target::Value { ty, .. } => (self.methods_of_type(&ty, name)?, Some(ty.clone()), ty.describe()),
                Target::Type(owner) => (self.methods_named(&owner, name)?, None, owner.qualified_name()),
                Target::Package(package) => {
                    return Err(ResolveError::unsolved_symbol(package, self.describe_scope(call)));
                }
            },
        };

        let arg_types = self.argument_types(args)?;
        let explicit = self.explicit_type_args(type_args)?;
        let target = self.assignment_target(call)?;

        let mut candidates = Vec::with_capacity(methods.len());
        for method in methods {
            let usage = self.usage_through(receiver.as_ref(), &method)?;
            let type_params = method.type_parameters();
            let seed = match &target {
                Some(target) if !type_params.is_empty() => {
                    infer::from_target(self.solver(), &type_params, usage.return_type(), target)?
                }
                _ => Substitution::new(),
            };
            candidates.push(Candidate {
                formals: usage.param_types().to_vec(),
                type_params,
                variadic: method.is_variadic(),
                is_abstract: method.is_abstract(),
                label: format!("{}.{}", method.declaring_type().qualified_name(), usage.signature()),
                seed,
                decl: usage,
            });
        }

        let selected = overload::select(
            self.solver(),
            &Call {
                name,
                context,
                args: &arg_types,
                explicit_type_args: &explicit,
            },
            &candidates,
        )?;
        Ok(selected.decl.substitute(&selected.substitution))
    }

    /// `method` as a member of a value of type `receiver`.
    pub(crate) fn usage_through(
        &self,
        receiver: Option<&ResolvedType>,
        method: &MethodRef,
    ) -> Result<MethodUsage, ResolveError> {
        let usage = MethodUsage::from_declaration(method.clone(), self.solver())?;
        let Some(receiver) = receiver else {
            return Ok(usage);
        };
        if method.is_static() {
            return Ok(usage);
        }
        let declaring = method.declaring_type();
        if declaring.type_parameters().is_empty() {
            return Ok(usage);
        }
        match instantiate_as_supertype(self.solver(), receiver, declaring.as_ref())? {
            Some(ResolvedType::Reference(view)) if view.is_raw() => self.erase_usage(usage),
            Some(ResolvedType::Reference(view)) => Ok(usage.substitute(&Substitution::for_reference(&view))),
            _ => Ok(usage),
        }
    }

    /// Members of a raw type have erased signatures (JLS 4.8).
    fn erase_usage(&self, usage: MethodUsage) -> Result<MethodUsage, ResolveError> {
        let solver = self.solver();
        let params = usage
            .param_types()
            .iter()
            .map(|t| erasure(solver, t))
            .collect::<Result<Vec<_>, _>>()?;
        let exceptions = usage
            .exceptions()
            .iter()
            .map(|t| erasure(solver, t))
            .collect::<Result<Vec<_>, _>>()?;
        let ret = erasure(solver, usage.return_type())?;
        Ok(MethodUsage::new(usage.declaration().clone(), params, ret, exceptions))
    }

    /// Methods named `name` that a value of type `ty` has.
    pub(crate) fn methods_of_type(&self, ty: &ResolvedType, name: &str) -> Result<Vec<MethodRef>, ResolveError> {
        let mut out: Vec<MethodRef> = Vec::new();
        for owner in self.member_owners(ty)? {
            for method in self.methods_named(&owner, name)? {
                if !out.iter().any(|m| m.origin() == method.origin()) {
                    out.push(method);
                }
            }
        }
        Ok(out)
    }

    /// Resolves the constructor invoked by an instance creation expression.
    pub(crate) fn constructor_call(&self, new: NodeId) -> Result<ConstructorCall, ResolveError> {
        let tree = self.tree();
        let NodeKind::New {
            type_args,
            ty,
            args,
            body,
            ..
        } = tree.kind(new)
        else {
            return Err(DeclError::unsupported("constructor_call", tree.kind(new).label()).into());
        };
        let written = self.resolve_type(*ty)?;
        let Some(decl) = written.type_decl().cloned() else {
            return Err(DeclError::unsupported("constructor_call", written.describe()).into());
        };
        let diamond = matches!(tree.kind(*ty), NodeKind::ClassType { args: Some(a), .. } if a.is_empty());
        let _span = tracing::debug_span!(
            target: "javelin.resolve",
            "constructor_call",
            ty = %decl.qualified_name(),
            diamond
        )
        .entered();

        // An anonymous class implementing an interface extends Object.
        let owner = if body.is_some() && decl.is_interface() {
            self.solver().java_lang_object()?
        } else {
            decl.clone()
        };
        let constructors = owner.constructors();

        let class_params: Vec<TypeParamRef> = if diamond { decl.type_parameters() } else { Vec::new() };
        let receiver = match &written {
            ResolvedType::Reference(r) if !r.is_raw() => Some(Substitution::for_reference(r)),
            _ => None,
        };
        let raw_generic = !diamond && receiver.is_none() && !owner.type_parameters().is_empty();
        let seed = match self.assignment_target(new)? {
            Some(target) if diamond => infer::from_target(self.solver(), &class_params, &decl.self_type(), &target)?,
            _ => Substitution::new(),
        };

        let mut candidates = Vec::with_capacity(constructors.len());
        for constructor in constructors {
            let mut formals = constructor.param_types(self.solver())?;
            if let Some(subst) = &receiver {
                formals = formals.iter().map(|f| f.substitute(subst)).collect();
            } else if raw_generic {
                formals = formals
                    .iter()
                    .map(|f| erasure(self.solver(), f))
                    .collect::<Result<Vec<_>, _>>()?;
            }
            let mut type_params = class_params.clone();
            type_params.extend(constructor.type_parameters());
            let label = format!("{}.{}", owner.qualified_name(), constructor.signature(self.solver())?);
            candidates.push(Candidate {
                formals,
                type_params,
                variadic: constructor.is_variadic(),
                is_abstract: false,
                label,
                seed: seed.clone(),
                decl: constructor,
            });
        }

        let arg_types = self.argument_types(args)?;
        let explicit = self.explicit_type_args(type_args)?;
        let selected = overload::select(
            self.solver(),
            &Call {
                name: decl.name(),
                context: decl.qualified_name(),
                args: &arg_types,
                explicit_type_args: &explicit,
            },
            &candidates,
        )?;

        let created = if diamond {
            let mut inferred = Vec::with_capacity(class_params.len());
            for param in &class_params {
                let arg = match selected.substitution.get(param) {
                    Some(ResolvedType::Wildcard(Wildcard::Extends(b))) => (**b).clone(),
                    Some(ResolvedType::Wildcard(_)) | None => object_type(self.solver())?,
                    Some(other) => other.clone(),
                };
                inferred.push(arg);
            }
            ResolvedType::reference(decl, inferred)
        } else {
            written
        };
        Ok(ConstructorCall {
            constructor: selected.decl,
            created,
        })
    }
}

#[cfg(test)]
mod tests {
    use javelin_core::ResolverConfig;
    use javelin_test_utils::{jdk_solver, parse_at_marker};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::file::SourceFile;

    fn call_at(fixture: &str) -> MethodUsage {
        let (tree, node) = parse_at_marker(fixture, |k| matches!(k, NodeKind::MethodCall { .. }));
        let file = SourceFile::new(tree, &ResolverConfig::default());
        let solver = jdk_solver();
        Context::new(&file, &solver).method_call(node).unwrap()
    }

    fn new_at(fixture: &str) -> String {
        let (tree, node) = parse_at_marker(fixture, |k| matches!(k, NodeKind::New { .. }));
        let file = SourceFile::new(tree, &ResolverConfig::default());
        let solver = jdk_solver();
        Context::new(&file, &solver).constructor_call(node).unwrap().created.describe()
    }

    #[test]
    fn receiver_type_arguments_flow_into_the_signature() {
        let usage = call_at(
            "import java.util.*; class A { void m(List<String> l) { /*here*/l.get(0); } }",
        );
        assert_eq!(usage.return_type().describe(), "java.lang.String");
        assert_eq!(usage.signature(), "get(int)");
    }

    #[test]
    fn generic_method_arguments_are_inferred() {
        let usage = call_at("import java.util.*; class A { Object o = /*here*/Arrays.asList(1, 2); }");
        assert_eq!(usage.return_type().describe(), "java.util.List<java.lang.Integer>");
    }

    #[test]
    fn assignment_context_drives_inference() {
        let usage = call_at("import java.util.*; class A { List<String> o = /*here*/Collections.emptyList(); }");
        assert_eq!(usage.return_type().describe(), "java.util.List<java.lang.String>");
    }

    #[test]
    fn raw_receivers_erase_member_types() {
        let usage = call_at("import java.util.*; class A { void m(List l) { /*here*/l.get(0); } }");
        assert_eq!(usage.return_type().describe(), "java.lang.Object");
    }

    #[test]
    fn diamond_takes_arguments_from_the_target() {
        assert_eq!(
            new_at("import java.util.*; class A { List<String> l = /*here*/new ArrayList<>(); }"),
            "java.util.ArrayList<java.lang.String>"
        );
        assert_eq!(
            new_at("import java.util.*; class A { Object l = /*here*/new ArrayList<>(); }"),
            "java.util.ArrayList<java.lang.Object>"
        );
    }
}
