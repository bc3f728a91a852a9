use serde::Serialize;
use std::fmt;

/// Result object returned by public engine operations.
/// Failures carry a message instead of propagating an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
}

impl Outcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    /// Failure carrying the full context chain of `error`
    pub fn from_error(error: &anyhow::Error) -> Self {
        Self::failure(format!("{:#}", error))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "ok" } else { "failed" };
        write!(f, "{}: {}", status, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_from_error_keeps_context_chain() {
        let error = Err::<(), _>(anyhow::anyhow!("disk full"))
            .context("Failed to write layout 'label_layout'")
            .unwrap_err();
        let outcome = Outcome::from_error(&error);
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Failed to write layout 'label_layout': disk full");
    }

    #[test]
    fn test_display() {
        assert_eq!(Outcome::ok("Saved 3 labels").to_string(), "ok: Saved 3 labels");
    }
}
