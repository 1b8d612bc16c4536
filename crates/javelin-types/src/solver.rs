use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::decl::TypeDeclRef;
use crate::error::ResolveError;

/// Maps fully qualified names (`p.Outer.Inner`) to type declarations.
///
/// For a given instance and name the returned declaration is stable by
/// identity; backends memoize after the first hit.
pub trait TypeSolver: Send + Sync {
    /// `Ok(None)` is a miss. `Err` is reserved for failures that must not be
    /// mistaken for a miss, such as a malformed class file.
    fn try_lookup(&self, name: &str) -> Result<Option<TypeDeclRef>, ResolveError>;

    fn label(&self) -> &str {
        "solver"
    }

    fn solve_type(&self, name: &str) -> Result<TypeDeclRef, ResolveError> {
        self.try_lookup(name)?
            .ok_or_else(|| ResolveError::UnsolvedType(name.to_string()))
    }

    fn has_type(&self, name: &str) -> bool {
        matches!(self.try_lookup(name), Ok(Some(_)))
    }

    fn java_lang_object(&self) -> Result<TypeDeclRef, ResolveError> {
        self.solve_type("java.lang.Object")
    }
}

impl<S: TypeSolver + ?Sized> TypeSolver for Arc<S> {
    fn try_lookup(&self, name: &str) -> Result<Option<TypeDeclRef>, ResolveError> {
        (**self).try_lookup(name)
    }

    fn label(&self) -> &str {
        (**self).label()
    }
}

/// Per-instance memo for backends: concurrent readers, serialized writers.
#[derive(Default)]
pub struct LookupCache {
    enabled: bool,
    entries: RwLock<HashMap<String, Option<TypeDeclRef>>>,
}

impl LookupCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the memoized answer or computes, stores and returns it. Errors
    /// are never cached. When memoization is disabled only hits are kept, so
    /// identity stays stable while misses are retried.
    pub fn get_or_try_insert(
        &self,
        name: &str,
        compute: impl FnOnce() -> Result<Option<TypeDeclRef>, ResolveError>,
    ) -> Result<Option<TypeDeclRef>, ResolveError> {
        if let Some(cached) = self.entries.read().get(name) {
            return Ok(cached.clone());
        }
        let computed = compute()?;
        if computed.is_none() && !self.enabled {
            return Ok(None);
        }
        let mut entries = self.entries.write();
        // A concurrent writer may have stored a declaration first; keep it.
        let stored = entries.entry(name.to_string()).or_insert(computed);
        Ok(stored.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl fmt::Debug for LookupCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupCache")
            .field("enabled", &self.enabled)
            .field("entries", &self.len())
            .finish()
    }
}

/// An explicit name → declaration map, mostly for tests.
#[derive(Default)]
pub struct MemoryTypeSolver {
    types: RwLock<HashMap<String, TypeDeclRef>>,
}

impl MemoryTypeSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `decl` under its qualified name.
    pub fn add(&self, decl: TypeDeclRef) {
        let name = decl.qualified_name();
        self.add_as(name, decl);
    }

    pub fn add_as(&self, name: impl Into<String>, decl: TypeDeclRef) {
        self.types.write().insert(name.into(), decl);
    }

    pub fn with(self, decl: TypeDeclRef) -> Self {
        self.add(decl);
        self
    }
}

impl TypeSolver for MemoryTypeSolver {
    fn try_lookup(&self, name: &str) -> Result<Option<TypeDeclRef>, ResolveError> {
        Ok(self.types.read().get(name).cloned())
    }

    fn label(&self) -> &str {
        "memory"
    }
}

impl fmt::Debug for MemoryTypeSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.types.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("MemoryTypeSolver").field("types", &names).finish()
    }
}

type ErrorFilter = Box<dyn Fn(&ResolveError) -> bool + Send + Sync>;

/// An ordered chain of solvers; the first hit wins.
pub struct CombinedTypeSolver {
    solvers: Vec<Arc<dyn TypeSolver>>,
    /// Errors for which this returns `true` are treated as misses.
    error_filter: Option<ErrorFilter>,
    cache: LookupCache,
}

impl CombinedTypeSolver {
    pub fn new(solvers: Vec<Arc<dyn TypeSolver>>) -> Self {
        Self::with_memoization(solvers, true)
    }

    pub fn with_memoization(solvers: Vec<Arc<dyn TypeSolver>>, memoize: bool) -> Self {
        Self {
            solvers,
            error_filter: None,
            cache: LookupCache::new(memoize),
        }
    }

    pub fn add(&mut self, solver: Arc<dyn TypeSolver>) {
        self.solvers.push(solver);
    }

    pub fn with_error_filter(
        mut self,
        filter: impl Fn(&ResolveError) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.error_filter = Some(Box::new(filter));
        self
    }

    pub fn solvers(&self) -> &[Arc<dyn TypeSolver>] {
        &self.solvers
    }
}

impl TypeSolver for CombinedTypeSolver {
    fn try_lookup(&self, name: &str) -> Result<Option<TypeDeclRef>, ResolveError> {
        self.cache.get_or_try_insert(name, || {
            for solver in &self.solvers {
                match solver.try_lookup(name) {
                    Ok(Some(found)) => {
                        tracing::trace!(
                            target: "javelin.solver",
                            name,
                            solver = solver.label(),
                            "type found"
                        );
                        return Ok(Some(found));
                    }
                    Ok(None) => {}
                    Err(err) if self.error_filter.as_ref().is_some_and(|f| f(&err)) => {
                        tracing::debug!(
                            target: "javelin.solver",
                            name,
                            solver = solver.label(),
                            error = %err,
                            "lookup error ignored"
                        );
                    }
                    Err(err) => return Err(err),
                }
            }
            Ok(None)
        })
    }

    fn label(&self) -> &str {
        "combined"
    }
}

impl fmt::Debug for CombinedTypeSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.solvers.iter().map(|s| s.label()).collect();
        f.debug_struct("CombinedTypeSolver")
            .field("solvers", &labels)
            .field("cache", &self.cache)
            .finish()
    }
}
