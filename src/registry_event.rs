/// Events emitted by the registry during operations.
///
/// These events are passed to the tracing callback set via `set_trace_callback`.
/// The `Clone` derive allows callbacks to store or forward events if needed.
///
/// # Examples
///
/// ```rust
/// use instance_registry::RegistryEvent;
///
/// let event = RegistryEvent::Create { type_name: "i32" };
/// assert_eq!(event.to_string(), "create { type_name: i32 }");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// The constructor ran and its instance was stored.
    Create {
        /// The type name of the new instance (e.g., "i32", "alloc::string::String")
        type_name: &'static str,
    },

    /// An existing instance was handed out; the constructor was not called.
    Reuse { type_name: &'static str },

    /// The constructor failed; nothing was stored.
    ConstructionFailed { type_name: &'static str },

    /// An instance was looked up without constructing.
    Get {
        type_name: &'static str,
        /// Whether the instance exists
        found: bool,
    },

    /// A type existence check was performed.
    Contains { type_name: &'static str, found: bool },
}

impl std::fmt::Display for RegistryEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryEvent::Create { type_name } => {
                write!(f, "create {{ type_name: {type_name} }}")
            }
            RegistryEvent::Reuse { type_name } => {
                write!(f, "reuse {{ type_name: {type_name} }}")
            }
            RegistryEvent::ConstructionFailed { type_name } => {
                write!(f, "construction_failed {{ type_name: {type_name} }}")
            }
            RegistryEvent::Get { type_name, found } => {
                write!(f, "get {{ type_name: {type_name}, found: {found} }}")
            }
            RegistryEvent::Contains { type_name, found } => {
                write!(f, "contains {{ type_name: {type_name}, found: {found} }}")
            }
        }
    }
}
