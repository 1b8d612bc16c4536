//! Utilities shared by javelin tests.
//!
//! - [`classfile_builder`] writes class files so bytecode tests need no `javac`.
//! - [`jdk_solver`] answers for the bootstrap JDK (feature `jdk`).
//! - [`write_class_dir`] / [`write_jar`] / [`write_sources`] lay fixtures out
//!   on disk (feature `fixture-fs`).
//! - [`parse_unit`] and [`extract_marker`] locate nodes in source fixtures.

pub mod classfile_builder;

use javelin_syntax::{NodeId, NodeKind, SyntaxTree};

pub use classfile_builder::{ClassFileBuilder, Constant, FieldSpec, MethodSpec};

#[cfg(feature = "jdk")]
mod jdk {
    use std::sync::Arc;

    use javelin_reflect::ReflectionTypeSolver;
    use javelin_types::{CombinedTypeSolver, TypeSolver};

    /// A combined solver with `first` consulted before the bootstrap JDK.
    pub fn jdk_solver_with(first: Vec<Arc<dyn TypeSolver>>) -> CombinedTypeSolver {
        let mut solvers = first;
        solvers.push(Arc::new(ReflectionTypeSolver::bootstrap()));
        CombinedTypeSolver::new(solvers)
    }

    /// A combined solver over the bootstrap JDK alone.
    pub fn jdk_solver() -> CombinedTypeSolver {
        jdk_solver_with(Vec::new())
    }
}

#[cfg(feature = "jdk")]
pub use jdk::{jdk_solver, jdk_solver_with};

#[cfg(feature = "fixture-fs")]
mod fixture_fs {
    use std::fs;
    use std::io::Write;
    use std::path::Path;

    use crate::classfile_builder::ClassFileBuilder;

    /// Writes each class as `root/<internal name>.class`.
    pub fn write_class_dir(root: &Path, classes: &[ClassFileBuilder]) {
        for class in classes {
            let path = root.join(format!("{}.class", class.internal_name()));
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("create class directory");
            }
            fs::write(&path, class.build()).expect("write class file");
        }
    }

    /// Writes a jar holding `entries` (`(entry name, bytes)`) plus a manifest.
    pub fn write_jar_entries(path: &Path, entries: &[(String, Vec<u8>)]) {
        let file = fs::File::create(path).expect("create jar");
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        zip.start_file("META-INF/MANIFEST.MF", options).expect("start manifest");
        zip.write_all(b"Manifest-Version: 1.0\r\n\r\n").expect("write manifest");
        for (name, bytes) in entries {
            zip.start_file(name.as_str(), options).expect("start jar entry");
            zip.write_all(bytes).expect("write jar entry");
        }
        zip.finish().expect("finish jar");
    }

    pub fn write_jar(path: &Path, classes: &[ClassFileBuilder]) {
        let entries: Vec<(String, Vec<u8>)> = classes
            .iter()
            .map(|c| (format!("{}.class", c.internal_name()), c.build()))
            .collect();
        write_jar_entries(path, &entries);
    }

    /// Writes `(relative path, text)` source files under `root`.
    pub fn write_sources(root: &Path, files: &[(&str, &str)]) {
        for (relative, text) in files {
            let path = root.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("create source directory");
            }
            fs::write(&path, text).expect("write source file");
        }
    }

    pub fn temp_dir() -> tempfile::TempDir {
        tempfile::tempdir().expect("create temp dir")
    }
}

#[cfg(feature = "fixture-fs")]
pub use fixture_fs::{temp_dir, write_class_dir, write_jar, write_jar_entries, write_sources};

/// Parses a compilation unit, panicking with the parse error on failure.
pub fn parse_unit(text: &str) -> SyntaxTree {
    match javelin_syntax::parse_compilation_unit(text) {
        Ok(tree) => tree,
        Err(err) => panic!("fixture does not parse: {err}\n{text}"),
    }
}

/// Removes the first `/*marker*/` comment and returns the text and the byte
/// offset where it was.
pub fn extract_marker(fixture: &str, marker: &str) -> (String, usize) {
    let needle = format!("/*{marker}*/");
    let offset = fixture
        .find(&needle)
        .unwrap_or_else(|| panic!("fixture missing {needle} marker"));
    let mut text = String::with_capacity(fixture.len());
    text.push_str(&fixture[..offset]);
    text.push_str(&fixture[offset + needle.len()..]);
    (text, offset)
}

/// The smallest node starting at `offset` whose kind satisfies `pred`.
pub fn node_at(tree: &SyntaxTree, offset: usize, pred: impl Fn(&NodeKind) -> bool) -> NodeId {
    tree.descendants(tree.root())
        .into_iter()
        .filter(|&id| tree.span(id).start == offset && pred(tree.kind(id)))
        .min_by_key(|&id| tree.span(id).len())
        .unwrap_or_else(|| panic!("no matching node at offset {offset}"))
}

/// Parses a fixture containing `/*here*/` and returns the tree with the
/// smallest node starting at the marker that satisfies `pred`.
pub fn parse_at_marker(fixture: &str, pred: impl Fn(&NodeKind) -> bool) -> (SyntaxTree, NodeId) {
    let (text, offset) = extract_marker(fixture, "here");
    let tree = parse_unit(&text);
    let node = node_at(&tree, offset, pred);
    (tree, node)
}
