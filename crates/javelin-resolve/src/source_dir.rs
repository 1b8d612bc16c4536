use std::collections::HashMap;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

use javelin_core::ResolverConfig;
use javelin_syntax::parse_compilation_unit;
use javelin_types::{LookupCache, ResolveError, TypeDeclRef, TypeSolver};
use parking_lot::RwLock;

use crate::file::{SourceFile, SourceRef};
use crate::source::SourceTypeDecl;

/// Type solver over a source root laid out as `p/q/C.java`.
///
/// A file is parsed the first time a lookup lands on it and kept for the
/// solver's lifetime. `p.q.C.Inner` is found in `p/q/C.java`; a file whose
/// package clause disagrees with its location contributes nothing.
pub struct SourceDirTypeSolver {
    root: PathBuf,
    config: ResolverConfig,
    label: String,
    cache: LookupCache,
    files: RwLock<HashMap<PathBuf, Option<SourceRef>>>,
}

impl SourceDirTypeSolver {
    pub fn new(root: impl Into<PathBuf>, config: ResolverConfig) -> Self {
        let root = root.into();
        let label = format!("sourcedir:{}", root.display());
        let cache = LookupCache::new(config.memoize);
        Self {
            root,
            config,
            label,
            cache,
            files: RwLock::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The parsed file at `relative`, or `None` if there is no such file.
    pub fn file(&self, relative: &Path) -> Result<Option<SourceRef>, ResolveError> {
        if let Some(cached) = self.files.read().get(relative) {
            return Ok(cached.clone());
        }
        let path = self.root.join(relative);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                return Err(ResolveError::Source {
                    file: path.display().to_string(),
                    message: err.to_string(),
                })
            }
        };
        let parsed = match text {
            None => None,
            Some(text) => {
                let _span = tracing::debug_span!(target: "javelin.source", "parse_file", path = %path.display())
                    .entered();
                let tree = parse_compilation_unit(&text).map_err(|err| ResolveError::Source {
                    file: path.display().to_string(),
                    message: err.to_string(),
                })?;
                Some(SourceFile::with_path(tree, &self.config, path.display().to_string()))
            }
        };
        let mut files = self.files.write();
        Ok(files.entry(relative.to_path_buf()).or_insert(parsed).clone())
    }

    /// Qualified names of the top-level types of every file under the root.
    pub fn known_types(&self) -> Result<Vec<String>, ResolveError> {
        let mut out = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_map(Result::ok)
        {
            if !entry.file_type().is_file() || entry.path().extension() != Some(OsStr::new("java")) {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let Some(file) = self.file(relative)? else {
                continue;
            };
            let tree = file.tree();
            for top in tree.top_level_types() {
                if let Some(data) = tree.type_decl(top) {
                    out.push(file.package().qualify(data.name.as_str()));
                }
            }
        }
        out.sort();
        out.dedup();
        Ok(out)
    }

    fn find(&self, name: &str) -> Result<Option<TypeDeclRef>, ResolveError> {
        let segments: Vec<&str> = name.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Ok(None);
        }
        // Longest package first, as for class files.
        for package_len in (0..segments.len()).rev() {
            let (package, types) = segments.split_at(package_len);
            let mut relative: PathBuf = package.iter().collect();
            relative.push(format!("{}.java", types[0]));
            let Some(file) = self.file(&relative)? else {
                continue;
            };
            if file.package().to_dotted() != package.join(".") {
                tracing::debug!(
                    target: "javelin.source",
                    path = %relative.display(),
                    declared = %file.package().to_dotted(),
                    "package does not match the file location"
                );
                continue;
            }
            if let Some(node) = file.tree().type_by_name(&types.join(".")) {
                return Ok(Some(SourceTypeDecl::wrap(&file, node)));
            }
        }
        Ok(None)
    }
}

impl TypeSolver for SourceDirTypeSolver {
    fn try_lookup(&self, name: &str) -> Result<Option<TypeDeclRef>, ResolveError> {
        self.cache.get_or_try_insert(name, || self.find(name))
    }

    fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for SourceDirTypeSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceDirTypeSolver")
            .field("label", &self.label)
            .field("parsed", &self.files.read().len())
            .finish()
    }
}
