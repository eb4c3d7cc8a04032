use crate::domain::errors::ValidationError;

const MAX_KEY_LEN: usize = 1024;

/// A validated object key (path) in the bucket
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Create a new ObjectKey with validation
    pub fn new(value: String) -> Result<Self, ValidationError> {
        if value.is_empty() {
            return Err(ValidationError::EmptyObjectKey);
        }

        if value.len() > MAX_KEY_LEN {
            return Err(ValidationError::ObjectKeyTooLong {
                actual: value.len(),
                max: MAX_KEY_LEN,
            });
        }

        // OBS rejects control characters in keys
        if let Some(c) = value.chars().find(|c| c.is_control()) {
            return Err(ValidationError::InvalidObjectKeyCharacter(c));
        }

        Ok(Self(value))
    }

    /// Get the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for ObjectKey {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        ObjectKey::new(value.to_string())
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_object_key() {
        assert!(ObjectKey::new("file.txt".to_string()).is_ok());
        assert!(ObjectKey::new("thanos/file1".to_string()).is_ok());
        assert!(ObjectKey::new("thanos/".to_string()).is_ok());
        assert!(ObjectKey::new("deep/folder/structure/file.txt".to_string()).is_ok());
    }

    #[test]
    fn test_invalid_object_key() {
        assert_eq!(
            ObjectKey::new("".to_string()),
            Err(ValidationError::EmptyObjectKey)
        );
        assert!(ObjectKey::new("null\0byte".to_string()).is_err());
        assert!(ObjectKey::new("line\nbreak".to_string()).is_err());
        assert!(ObjectKey::new("x".repeat(1025)).is_err());
        assert!(ObjectKey::new("x".repeat(1024)).is_ok());
    }

    #[test]
    fn test_object_key_conversions() {
        let key = ObjectKey::try_from("thanos/file1").unwrap();
        assert_eq!(key.as_str(), "thanos/file1");
        assert_eq!(key.to_string(), "thanos/file1");
        assert_eq!(AsRef::<str>::as_ref(&key), "thanos/file1");
        assert!(ObjectKey::try_from("").is_err());
    }
}
