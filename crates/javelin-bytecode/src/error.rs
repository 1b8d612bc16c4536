use javelin_types::ResolveError;
use thiserror::Error;

/// Failure to read a class out of a directory or archive. Always fatal for
/// the lookup that hit it: a malformed class is never treated as missing.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("malformed class `{class}`: {source}")]
    ClassFile {
        class: String,
        #[source]
        source: javelin_classfile::Error,
    },
}

impl LoadError {
    pub(crate) fn into_resolve_error(self, class: &str) -> ResolveError {
        let class = match &self {
            LoadError::ClassFile { class, .. } => class.clone(),
            _ => class.to_string(),
        };
        ResolveError::Bytecode {
            class,
            message: self.to_string(),
        }
    }
}
