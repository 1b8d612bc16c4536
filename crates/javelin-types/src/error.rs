use thiserror::Error;

/// Programmer errors raised by declarations. Callers must not use these for
/// control flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclError {
    #[error("`{operation}` is not supported by {declaration}")]
    Unsupported {
        operation: &'static str,
        declaration: String,
    },
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl DeclError {
    pub fn unsupported(operation: &'static str, declaration: impl std::fmt::Debug) -> Self {
        DeclError::Unsupported {
            operation,
            declaration: format!("{declaration:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("unsolved symbol `{name}` in {context}")]
    UnsolvedSymbol { name: String, context: String },
    #[error("unsolved type `{0}`")]
    UnsolvedType(String),
    #[error("`{name}` expects {expected} type argument(s), found {found}")]
    WrongTypeArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("ambiguous call to `{name}`: {}", candidates.join(", "))]
    AmbiguousMethod {
        name: String,
        candidates: Vec<String>,
    },
    #[error(transparent)]
    Unsupported(#[from] DeclError),
    #[error("malformed class `{class}`: {message}")]
    Bytecode { class: String, message: String },
    #[error("unparsable source `{file}`: {message}")]
    Source { file: String, message: String },
}

impl ResolveError {
    pub fn unsolved_symbol(name: impl Into<String>, context: impl Into<String>) -> Self {
        ResolveError::UnsolvedSymbol {
            name: name.into(),
            context: context.into(),
        }
    }

    /// Whether this is one of the "not found" outcomes, as opposed to a fatal error.
    pub fn is_unsolved(&self) -> bool {
        matches!(
            self,
            ResolveError::UnsolvedSymbol { .. }
                | ResolveError::UnsolvedType(_)
                | ResolveError::WrongTypeArgumentCount { .. }
                | ResolveError::AmbiguousMethod { .. }
        )
    }
}
