use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use javelin_types::{LookupCache, ProviderId, ResolveError, TypeDeclRef, TypeSolver};
use parking_lot::RwLock;
use smol_str::SmolStr;

use crate::decl::ReflectionTypeDecl;
use crate::host::{BootstrapRuntime, HostRuntime};

/// Type solver over the host runtime's classes.
pub struct ReflectionTypeSolver {
    runtime: Arc<dyn HostRuntime>,
    provider: ProviderId,
    jre_only: bool,
    cache: LookupCache,
    decls: RwLock<HashMap<SmolStr, TypeDeclRef>>,
}

impl ReflectionTypeSolver {
    pub fn new(runtime: Arc<dyn HostRuntime>, memoize: bool) -> Self {
        Self {
            runtime,
            provider: ProviderId::fresh(),
            jre_only: false,
            cache: LookupCache::new(memoize),
            decls: RwLock::new(HashMap::new()),
        }
    }

    /// Only answers for `java.*` and `javax.*`, so application classes that
    /// happen to be loaded in the host are left to other solvers.
    pub fn jre_only(runtime: Arc<dyn HostRuntime>, memoize: bool) -> Self {
        Self {
            jre_only: true,
            ..Self::new(runtime, memoize)
        }
    }

    /// The bootstrap JDK, restricted to `java.*`.
    pub fn bootstrap() -> Self {
        Self::jre_only(Arc::new(BootstrapRuntime::new()), true)
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn runtime(&self) -> &Arc<dyn HostRuntime> {
        &self.runtime
    }

    fn declaration(&self, binary: &str) -> Option<TypeDeclRef> {
        if let Some(decl) = self.decls.read().get(binary) {
            return Some(decl.clone());
        }
        let class = self.runtime.class_for_name(binary)?;
        let decl: TypeDeclRef = Arc::new(ReflectionTypeDecl::new(class, self.provider));
        let mut decls = self.decls.write();
        Some(decls.entry(SmolStr::new(binary)).or_insert(decl).clone())
    }

    /// `a.b.Outer.Inner` is tried as is, then as `a.b.Outer$Inner`, then
    /// `a.b$Outer$Inner`, the way `Class.forName` callers probe nested names.
    fn find(&self, name: &str) -> Option<TypeDeclRef> {
        let mut candidate = name.to_string();
        loop {
            if let Some(decl) = self.declaration(&candidate) {
                return Some(decl);
            }
            let dot = candidate.rfind('.')?;
            candidate.replace_range(dot..=dot, "$");
        }
    }
}

impl TypeSolver for ReflectionTypeSolver {
    fn try_lookup(&self, name: &str) -> Result<Option<TypeDeclRef>, ResolveError> {
        if self.jre_only && !(name.starts_with("java.") || name.starts_with("javax.")) {
            return Ok(None);
        }
        self.cache.get_or_try_insert(name, || Ok(self.find(name)))
    }

    fn label(&self) -> &str {
        self.runtime.describe()
    }
}

impl fmt::Debug for ReflectionTypeSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectionTypeSolver")
            .field("runtime", &self.runtime.describe())
            .field("jre_only", &self.jre_only)
            .field("cache", &self.cache)
            .finish()
    }
}
