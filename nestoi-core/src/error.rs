use crate::config::ConfigError;

/// Startup-time error raised while turning configuration into a router.
///
/// None of these are recoverable at runtime: they point at a mistake in the
/// application's route tags, field rules or settings files.
pub enum NestoiError {
    /// A field rule is not a schema the validation engine can compile.
    InvalidRule { field: String, reason: String },
    /// The same field name was registered twice with different shapes.
    ConflictingField(String),
    /// A route validates a body or query field that has no registered rule.
    UnknownField { route: String, field: String },
    /// A route's composite query/body rule failed to compile.
    InvalidRouteSchema { route: String, reason: String },
    /// Settings could not be loaded or parsed.
    Config(ConfigError),
    /// Binding or serving the listener failed.
    Io(std::io::Error),
}

impl std::fmt::Display for NestoiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NestoiError::InvalidRule { field, reason } => {
                write!(f, "Invalid validation rule for field '{field}': {reason}")
            }
            NestoiError::ConflictingField(field) => write!(
                f,
                "Field '{field}' is already registered with a different schema"
            ),
            NestoiError::UnknownField { route, field } => {
                write!(f, "Route {route} validates field '{field}', which has no registered rule")
            }
            NestoiError::InvalidRouteSchema { route, reason } => {
                write!(f, "Invalid validation schema for route {route}: {reason}")
            }
            NestoiError::Config(err) => write!(f, "{err}"),
            NestoiError::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::fmt::Debug for NestoiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Display>::fmt(self, f)
    }
}

impl std::error::Error for NestoiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NestoiError::Config(err) => Some(err),
            NestoiError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for NestoiError {
    fn from(err: ConfigError) -> Self {
        NestoiError::Config(err)
    }
}

impl From<std::io::Error> for NestoiError {
    fn from(err: std::io::Error) -> Self {
        NestoiError::Io(err)
    }
}
