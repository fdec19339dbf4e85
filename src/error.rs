/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for route registration and document builds
#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),
    /// A route path that cannot be registered (bad syntax)
    InvalidPath { path: String, message: String },
    /// Two routes claim the same literal path
    DuplicateRoute(String),
    /// A payload type the schema dictionary has no name for
    UnresolvedType { type_path: String, message: String },
    /// An annotation whose name and declared type do not fit together
    InvalidAnnotation { name: String, message: String },
    /// Two different routes both declared themselves the OAuth2 token endpoint
    ConflictingTokenUrl { first: String, second: String },
    /// A `$ref` that does not resolve to a key under `components.schemas`
    DanglingReference(String),
    SerializationError(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "IO error: {}", e),
            Error::InvalidPath { path, message } => {
                write!(f, "invalid route path {}: {}", path, message)
            }
            Error::DuplicateRoute(path) => write!(f, "route already registered: {}", path),
            Error::UnresolvedType { type_path, message } => {
                write!(f, "cannot resolve schema for {}: {}", type_path, message)
            }
            Error::InvalidAnnotation { name, message } => {
                write!(f, "invalid annotation '{}': {}", name, message)
            }
            Error::ConflictingTokenUrl { first, second } => write!(
                f,
                "token URL declared by both {} and {}; only one route may issue tokens",
                first, second
            ),
            Error::DanglingReference(reference) => {
                write!(f, "reference does not resolve to a schema: {}", reference)
            }
            Error::SerializationError(msg) => write!(f, "serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::SerializationError(format!("YAML serialization error: {}", err))
    }
}
