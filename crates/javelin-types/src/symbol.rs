use std::fmt;

use crate::error::ResolveError;

/// Outcome of resolving a name: a declaration, or the reason there is none.
///
/// Being unsolved is an ordinary value. The reason distinguishes a plain miss
/// from an ambiguous overload or a malformed type-argument count.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolReference<D> {
    Solved(D),
    Unsolved(ResolveError),
}

impl<D> SymbolReference<D> {
    pub fn solved(decl: D) -> Self {
        SymbolReference::Solved(decl)
    }

    pub fn unsolved(name: impl Into<String>, context: impl Into<String>) -> Self {
        SymbolReference::Unsolved(ResolveError::unsolved_symbol(name, context))
    }

    pub fn is_solved(&self) -> bool {
        matches!(self, SymbolReference::Solved(_))
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(
            self,
            SymbolReference::Unsolved(ResolveError::AmbiguousMethod { .. })
        )
    }

    pub fn declaration(&self) -> Option<&D> {
        match self {
            SymbolReference::Solved(d) => Some(d),
            SymbolReference::Unsolved(_) => None,
        }
    }

    pub fn into_declaration(self) -> Option<D> {
        match self {
            SymbolReference::Solved(d) => Some(d),
            SymbolReference::Unsolved(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&ResolveError> {
        match self {
            SymbolReference::Solved(_) => None,
            SymbolReference::Unsolved(e) => Some(e),
        }
    }

    pub fn map<E>(self, f: impl FnOnce(D) -> E) -> SymbolReference<E> {
        match self {
            SymbolReference::Solved(d) => SymbolReference::Solved(f(d)),
            SymbolReference::Unsolved(e) => SymbolReference::Unsolved(e),
        }
    }

    pub fn into_result(self) -> Result<D, ResolveError> {
        match self {
            SymbolReference::Solved(d) => Ok(d),
            SymbolReference::Unsolved(e) => Err(e),
        }
    }
}

impl<D> From<Result<D, ResolveError>> for SymbolReference<D> {
    fn from(value: Result<D, ResolveError>) -> Self {
        match value {
            Ok(d) => SymbolReference::Solved(d),
            Err(e) => SymbolReference::Unsolved(e),
        }
    }
}

impl<D> From<Option<D>> for SymbolReference<D> {
    fn from(value: Option<D>) -> Self {
        match value {
            Some(d) => SymbolReference::Solved(d),
            None => SymbolReference::unsolved("<unknown>", "lookup"),
        }
    }
}

impl<D: fmt::Debug> fmt::Display for SymbolReference<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolReference::Solved(d) => write!(f, "SymbolReference{{{d:?}}}"),
            SymbolReference::Unsolved(e) => write!(f, "SymbolReference{{unsolved: {e}}}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsolved_is_a_value() {
        let r: SymbolReference<u32> = SymbolReference::unsolved("B", "p.A");
        assert!(!r.is_solved());
        assert!(!r.is_ambiguous());
        assert!(r.reason().is_some_and(ResolveError::is_unsolved));
    }

    #[test]
    fn ambiguity_is_unsolved_with_marker() {
        let r: SymbolReference<u32> = SymbolReference::Unsolved(ResolveError::AmbiguousMethod {
            name: "m".into(),
            candidates: vec!["m(Integer)".into(), "m(Long)".into()],
        });
        assert!(!r.is_solved());
        assert!(r.is_ambiguous());
    }

    #[test]
    fn map_keeps_the_reason() {
        let r = SymbolReference::solved(2u32).map(|n| n * 2);
        assert_eq!(r.declaration(), Some(&4));
        let e: SymbolReference<u32> = Err(ResolveError::UnsolvedType("X".into())).into();
        assert_eq!(
            e.map(|n| n + 1).reason(),
            Some(&ResolveError::UnsolvedType("X".into()))
        );
    }
}
