/// Validation errors for domain value objects and adapter configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    // ObjectKey validation errors
    EmptyObjectKey,
    ObjectKeyTooLong {
        actual: usize,
        max: usize,
    },
    InvalidObjectKeyCharacter(char),

    // Configuration validation errors
    MissingConfigFields(Vec<&'static str>),
    InvalidEndpoint(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ObjectKey errors
            ValidationError::EmptyObjectKey => write!(f, "Object key cannot be empty"),
            ValidationError::ObjectKeyTooLong { actual, max } => {
                write!(f, "Object key too long: {} bytes (max: {})", actual, max)
            }
            ValidationError::InvalidObjectKeyCharacter(c) => {
                write!(f, "Invalid character in object key: {:?}", c)
            }

            // Configuration errors
            ValidationError::MissingConfigFields(fields) => {
                write!(f, "Missing required configuration: {}", fields.join(", "))
            }
            ValidationError::InvalidEndpoint(endpoint) => {
                write!(f, "Invalid endpoint: '{}'", endpoint)
            }
        }
    }
}

impl std::error::Error for ValidationError {}
