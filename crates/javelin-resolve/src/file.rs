use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use javelin_core::{PackageName, ResolverConfig};
use javelin_syntax::{parse_compilation_unit, NodeId, ParseError, SyntaxTree};
use parking_lot::Mutex;

use crate::import_map::ImportMap;

pub type SourceRef = Arc<SourceFile>;

/// A parsed compilation unit together with what resolution needs to know
/// about it: its imports and the implicitly imported packages.
///
/// Source declarations hold a `SourceRef` and a node id; the file is shared,
/// never copied.
pub struct SourceFile {
    tree: SyntaxTree,
    imports: ImportMap,
    implicit_imports: Vec<String>,
    path: Option<String>,
    in_flight: Mutex<Vec<(NodeId, ThreadId)>>,
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("tree", &self.tree.id())
            .field("path", &self.path)
            .finish()
    }
}

impl SourceFile {
    pub fn new(tree: SyntaxTree, config: &ResolverConfig) -> SourceRef {
        Arc::new(Self::build(tree, config, None))
    }

    pub fn parse(text: &str, config: &ResolverConfig) -> Result<SourceRef, ParseError> {
        Ok(Self::new(parse_compilation_unit(text)?, config))
    }

    /// Like [`SourceFile::new`], remembering where the text came from.
    pub fn with_path(tree: SyntaxTree, config: &ResolverConfig, path: impl Into<String>) -> SourceRef {
        Arc::new(Self::build(tree, config, Some(path.into())))
    }

    fn build(tree: SyntaxTree, config: &ResolverConfig, path: Option<String>) -> Self {
        let imports = ImportMap::from_tree(&tree);
        SourceFile {
            tree,
            imports,
            implicit_imports: config.implicit_imports.clone(),
            path,
            in_flight: Mutex::new(Vec::new()),
        }
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn imports(&self) -> &ImportMap {
        &self.imports
    }

    pub fn implicit_imports(&self) -> &[String] {
        &self.implicit_imports
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn package(&self) -> PackageName {
        self.tree.package_name()
    }

    /// Marks `node` as being computed on this thread. Returns `None` when the
    /// same thread is already computing it; the caller then answers with a
    /// placeholder instead of recursing.
    pub(crate) fn enter(&self, node: NodeId) -> Option<InFlight<'_>> {
        let key = (node, thread::current().id());
        let mut in_flight = self.in_flight.lock();
        if in_flight.contains(&key) {
            tracing::trace!(target: "javelin.source", %node, "re-entrant computation cut");
            return None;
        }
        in_flight.push(key);
        Some(InFlight { file: self, key })
    }
}

pub(crate) struct InFlight<'a> {
    file: &'a SourceFile,
    key: (NodeId, ThreadId),
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.file.in_flight.lock().retain(|k| *k != self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reentry_is_refused_until_the_guard_drops() {
        let file = SourceFile::parse("class A {}", &ResolverConfig::default()).unwrap();
        let node = file.tree().root();
        {
            let _outer = file.enter(node).unwrap();
            assert!(file.enter(node).is_none());
        }
        assert!(file.enter(node).is_some());
    }

    #[test]
    fn implicit_imports_come_from_config() {
        let config = ResolverConfig::from_toml_str("implicit_imports = [\"java.lang\", \"java.util\"]").unwrap();
        let file = SourceFile::parse("package p; class A {}", &config).unwrap();
        assert_eq!(file.implicit_imports(), ["java.lang", "java.util"]);
        assert_eq!(file.package().to_dotted(), "p");
    }
}
