use std::collections::{HashMap, HashSet};
use std::ffi::OsStr;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use javelin_classfile::ClassStub;
use javelin_types::{LookupCache, ProviderId, ResolveError, TypeDeclRef, TypeSolver};
use parking_lot::{Mutex, RwLock};

use crate::decl::BytecodeTypeDecl;
use crate::error::LoadError;

/// Somewhere class bytes can be read from by internal name.
pub trait ClassSource: Send + Sync {
    /// Bytes of `internal.class`, or `None` if the source has no such entry.
    fn read_class(&self, internal: &str) -> Result<Option<Vec<u8>>, LoadError>;

    /// Internal names of every class the source holds, sorted.
    fn class_names(&self) -> Result<Vec<String>, LoadError>;

    fn describe(&self) -> String;
}

/// A directory laid out as `p/q/C.class`.
#[derive(Debug, Clone)]
pub struct ClassDir {
    root: PathBuf,
}

impl ClassDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ClassSource for ClassDir {
    fn read_class(&self, internal: &str) -> Result<Option<Vec<u8>>, LoadError> {
        let path = self.root.join(format!("{internal}.class"));
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn class_names(&self) -> Result<Vec<String>, LoadError> {
        let mut out = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_map(Result::ok)
        {
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension() != Some(OsStr::new("class")) {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let relative = relative.with_extension("");
            let internal = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if !is_ignored_class(&internal) {
                out.push(internal);
            }
        }
        out.sort();
        Ok(out)
    }

    fn describe(&self) -> String {
        format!("classdir:{}", self.root.display())
    }
}

/// A jar (or any zip) archive. The entry table is read once at open.
pub struct JarArchive {
    path: PathBuf,
    archive: Mutex<zip::ZipArchive<File>>,
    entries: HashSet<String>,
}

impl JarArchive {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LoadError> {
        let path = path.into();
        let file = File::open(&path)?;
        let archive = zip::ZipArchive::new(file)?;
        let entries = archive
            .file_names()
            .filter(|name| name.ends_with(".class") && !name.starts_with("META-INF/"))
            .map(str::to_string)
            .collect();
        Ok(Self {
            path,
            archive: Mutex::new(archive),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for JarArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JarArchive")
            .field("path", &self.path)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl ClassSource for JarArchive {
    fn read_class(&self, internal: &str) -> Result<Option<Vec<u8>>, LoadError> {
        let entry_name = format!("{internal}.class");
        if !self.entries.contains(&entry_name) {
            return Ok(None);
        }
        let mut archive = self.archive.lock();
        let mut entry = match archive.by_name(&entry_name) {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;
        Ok(Some(bytes))
    }

    fn class_names(&self) -> Result<Vec<String>, LoadError> {
        let mut out: Vec<String> = self
            .entries
            .iter()
            .filter_map(|name| name.strip_suffix(".class"))
            .filter(|internal| !is_ignored_class(internal))
            .map(str::to_string)
            .collect();
        out.sort();
        Ok(out)
    }

    fn describe(&self) -> String {
        format!("jar:{}", self.path.display())
    }
}

fn is_ignored_class(internal_name: &str) -> bool {
    internal_name == "module-info"
        || internal_name == "package-info"
        || internal_name.ends_with("/package-info")
}

/// Internal names a dotted name may denote, most packages first:
/// `a.b.Outer.Inner` tries `a/b/Outer/Inner`, `a/b/Outer$Inner`,
/// `a/b$Outer$Inner`, then `a$b$Outer$Inner`.
pub fn internal_name_candidates(name: &str) -> Vec<String> {
    let segments: Vec<&str> = name.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Vec::new();
    }
    (0..segments.len())
        .rev()
        .map(|package_len| {
            let (package, class) = segments.split_at(package_len);
            let class = class.join("$");
            if package.is_empty() {
                class
            } else {
                format!("{}/{}", package.join("/"), class)
            }
        })
        .collect()
}

/// Type solver over class files. Each class is parsed on first touch and kept
/// for the solver's lifetime, so every lookup that lands on the same class
/// returns the same declaration.
pub struct BytecodeTypeSolver<S> {
    source: S,
    provider: ProviderId,
    label: String,
    cache: LookupCache,
    classes: RwLock<HashMap<String, TypeDeclRef>>,
}

pub type ClassDirTypeSolver = BytecodeTypeSolver<ClassDir>;
pub type JarTypeSolver = BytecodeTypeSolver<JarArchive>;

impl ClassDirTypeSolver {
    pub fn new(root: impl Into<PathBuf>, memoize: bool) -> Self {
        Self::with_source(ClassDir::new(root), memoize)
    }
}

impl JarTypeSolver {
    pub fn open(path: impl Into<PathBuf>, memoize: bool) -> Result<Self, LoadError> {
        Ok(Self::with_source(JarArchive::open(path)?, memoize))
    }
}

impl<S: ClassSource> BytecodeTypeSolver<S> {
    pub fn with_source(source: S, memoize: bool) -> Self {
        let label = source.describe();
        Self {
            source,
            provider: ProviderId::fresh(),
            label,
            cache: LookupCache::new(memoize),
            classes: RwLock::new(HashMap::new()),
        }
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Qualified names of every class in the source, nested ones included.
    pub fn known_types(&self) -> Result<Vec<String>, ResolveError> {
        let names = self
            .source
            .class_names()
            .map_err(|err| err.into_resolve_error(&self.label))?;
        let mut out = Vec::with_capacity(names.len());
        for internal in names {
            if let Some(decl) = self.load(&internal)? {
                out.push(decl.qualified_name());
            }
        }
        Ok(out)
    }

    /// The declaration for an internal name, loading it on first touch.
    pub fn load(&self, internal: &str) -> Result<Option<TypeDeclRef>, ResolveError> {
        if let Some(decl) = self.classes.read().get(internal) {
            return Ok(Some(decl.clone()));
        }
        if is_ignored_class(internal) {
            return Ok(None);
        }

        let _span = tracing::debug_span!(target: "javelin.bytecode", "load_class", class = internal)
            .entered();
        let Some(bytes) = self
            .source
            .read_class(internal)
            .map_err(|err| err.into_resolve_error(internal))?
        else {
            return Ok(None);
        };
        let stub = ClassStub::parse(&bytes).map_err(|source| {
            LoadError::ClassFile {
                class: internal.to_string(),
                source,
            }
            .into_resolve_error(internal)
        })?;
        if stub.internal_name != internal {
            tracing::debug!(
                target: "javelin.bytecode",
                expected = internal,
                found = %stub.internal_name,
                "class file declares a different name"
            );
            return Ok(None);
        }

        let decl: TypeDeclRef = Arc::new(BytecodeTypeDecl::new(stub, self.provider));
        let mut classes = self.classes.write();
        let stored = classes
            .entry(internal.to_string())
            .or_insert(decl)
            .clone();
        Ok(Some(stored))
    }

    fn find(&self, name: &str) -> Result<Option<TypeDeclRef>, ResolveError> {
        for internal in internal_name_candidates(name) {
            if let Some(decl) = self.load(&internal)? {
                return Ok(Some(decl));
            }
        }
        Ok(None)
    }
}

impl<S: ClassSource> TypeSolver for BytecodeTypeSolver<S> {
    fn try_lookup(&self, name: &str) -> Result<Option<TypeDeclRef>, ResolveError> {
        self.cache.get_or_try_insert(name, || self.find(name))
    }

    fn label(&self) -> &str {
        &self.label
    }
}

impl<S> fmt::Debug for BytecodeTypeSolver<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BytecodeTypeSolver")
            .field("label", &self.label)
            .field("provider", &self.provider)
            .field("loaded", &self.classes.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_try_longer_packages_first() {
        assert_eq!(
            internal_name_candidates("a.b.Outer.Inner"),
            vec!["a/b/Outer/Inner", "a/b/Outer$Inner", "a/b$Outer$Inner", "a$b$Outer$Inner"]
        );
        assert_eq!(internal_name_candidates("Top"), vec!["Top"]);
        assert!(internal_name_candidates("a..b").is_empty());
    }

    #[test]
    fn package_and_module_info_are_skipped() {
        assert!(is_ignored_class("module-info"));
        assert!(is_ignored_class("p/q/package-info"));
        assert!(!is_ignored_class("p/q/Info"));
    }
}
