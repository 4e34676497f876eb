use thiserror::Error;

/// A store entry that cannot be turned into a typed record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Io(String),
    #[error("{0}")]
    InvalidFormat(String),
    #[error("failed to encode {context}: {message}")]
    Encode { context: String, message: String },
    #[error("invalid record: {0}")]
    Invalid(#[from] ValidationError),
    #[error("trip '{0}' is not registered")]
    UnknownTrip(String),
    #[error("trip '{0}' is already registered")]
    DuplicateTrip(String),
    #[error("could not allocate a free trip code after {0} attempts")]
    CodeSpaceExhausted(usize),
}

impl StoreError {
    pub fn encode(context: &str, error: serde_json::Error) -> Self {
        StoreError::Encode {
            context: context.to_string(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_errors_name_what_was_being_encoded() {
        let cause = serde_json::from_str::<u8>("\"x\"").expect_err("not a number");
        let error = StoreError::encode("snapshot fingerprint", cause);
        assert!(matches!(&error, StoreError::Encode { context, .. } if context == "snapshot fingerprint"));
        assert!(error.to_string().starts_with("failed to encode snapshot fingerprint: "));
    }
}
