use thiserror::Error;

/// Boxed error produced by a failing constructor.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The constructor failed on the enrolling call. Nothing was cached for the type.
    #[error("Construction failed for type: {type_name}")]
    Construction {
        type_name: &'static str,
        #[source]
        source: BoxError,
    },

    /// The stored value could not be downcast to the requested type.
    #[error("Type mismatch in registry for type: {type_name}")]
    TypeMismatch { type_name: &'static str },

    /// The type has not been constructed yet.
    #[error("Type not found in registry: {type_name}")]
    TypeNotFound { type_name: &'static str },
}

impl RegistryError {
    /// Name of the type the failed operation was about.
    pub fn type_name(&self) -> &'static str {
        match self {
            RegistryError::Construction { type_name, .. }
            | RegistryError::TypeMismatch { type_name }
            | RegistryError::TypeNotFound { type_name } => type_name,
        }
    }

    /// Returns `true` if this error came from a failing constructor.
    pub fn is_construction(&self) -> bool {
        matches!(self, RegistryError::Construction { .. })
    }
}
