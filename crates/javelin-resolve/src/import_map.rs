use javelin_core::{Name, QualifiedName};
use javelin_syntax::{NodeId, NodeKind, SyntaxTree};

/// The imports of one compilation unit, split by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportMap {
    pub type_single: Vec<TypeSingleImport>,
    pub type_star: Vec<TypeStarImport>,
    pub static_single: Vec<StaticSingleImport>,
    pub static_star: Vec<StaticStarImport>,
}

impl ImportMap {
    #[must_use]
    pub fn from_tree(tree: &SyntaxTree) -> Self {
        let mut out = ImportMap::default();

        for import in tree.imports() {
            let NodeKind::Import {
                name,
                is_static,
                on_demand,
            } = tree.kind(import)
            else {
                continue;
            };
            if name.is_empty() {
                continue;
            }

            match (is_static, on_demand) {
                (false, false) => {
                    let Some(imported) = name.last().cloned() else {
                        continue;
                    };
                    out.type_single.push(TypeSingleImport {
                        path: name.clone(),
                        imported,
                        node: import,
                    });
                }
                (false, true) => out.type_star.push(TypeStarImport {
                    path: name.clone(),
                    node: import,
                }),
                (true, false) => {
                    let (Some(member), Some(ty)) = (name.last().cloned(), name.qualifier()) else {
                        continue;
                    };
                    out.static_single.push(StaticSingleImport {
                        ty,
                        member,
                        node: import,
                    });
                }
                (true, true) => out.static_star.push(StaticStarImport {
                    ty: name.clone(),
                    node: import,
                }),
            }
        }

        out
    }

    pub fn is_empty(&self) -> bool {
        self.type_single.is_empty()
            && self.type_star.is_empty()
            && self.static_single.is_empty()
            && self.static_star.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSingleImport {
    pub path: QualifiedName,
    pub imported: Name,
    pub node: NodeId,
}

impl TypeSingleImport {
    /// `import B;` names a type in the unnamed package, which no import can
    /// reach (JLS 7.5.1).
    pub fn is_unqualified(&self) -> bool {
        self.path.len() < 2
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeStarImport {
    /// `import X.*;` where `X` is a package or a type (JLS 7.5.2); the
    /// resolver tries both.
    pub path: QualifiedName,
    pub node: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticSingleImport {
    pub ty: QualifiedName,
    pub member: Name,
    pub node: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticStarImport {
    pub ty: QualifiedName,
    pub node: NodeId,
}

#[cfg(test)]
mod tests {
    use javelin_syntax::parse_compilation_unit;

    use super::*;

    #[test]
    fn imports_are_split_by_kind() {
        let tree = parse_compilation_unit(
            "package p;\n\
             import java.util.List;\n\
             import java.util.*;\n\
             import static java.lang.Math.max;\n\
             import static java.util.Collections.*;\n\
             import B;\n\
             class A {}",
        )
        .unwrap();
        let map = ImportMap::from_tree(&tree);

        let singles: Vec<String> = map.type_single.iter().map(|i| i.path.to_dotted()).collect();
        assert_eq!(singles, vec!["java.util.List", "B"]);
        assert!(!map.type_single[0].is_unqualified());
        assert!(map.type_single[1].is_unqualified());
        assert_eq!(map.type_star[0].path.to_dotted(), "java.util");
        assert_eq!(map.static_single[0].ty.to_dotted(), "java.lang.Math");
        assert_eq!(map.static_single[0].member.as_str(), "max");
        assert_eq!(map.static_star[0].ty.to_dotted(), "java.util.Collections");
    }

    #[test]
    fn no_imports() {
        let tree = parse_compilation_unit("class A {}").unwrap();
        assert!(ImportMap::from_tree(&tree).is_empty());
    }
}
