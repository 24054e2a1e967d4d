//! Failure signals reported in-band by service methods.

use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use std::fmt;

/// Normalized failure signal
///
/// The numeric `code` is an application-level signal carried in the
/// response envelope; it never becomes the transport status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Failure {
    /// Application code; only positive values are reported
    pub code: i64,

    /// Short, human-readable summary
    pub message: String,

    /// Underlying error text
    pub error: String,

    /// Headers copied onto the response
    pub headers: HeaderMap,
}

impl Failure {
    /// Create a failure with the given application code
    pub fn new(code: i64) -> Self {
        Self {
            code,
            ..Self::default()
        }
    }

    /// Wrap a plain error: no code, no message, only its text
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        Self {
            error: err.to_string(),
            ..Self::default()
        }
    }

    /// The failure reported for a service method that panicked
    pub fn internal(error: impl Into<String>) -> Self {
        Self::new(500)
            .with_message("unknown server error")
            .with_error(error)
    }

    /// Set the message field
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Set the error field
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = error.into();
        self
    }

    /// Add a header to copy onto the response
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.code)?;
        if !self.message.is_empty() {
            write!(f, " {}", self.message)?;
        }
        if !self.error.is_empty() {
            write!(f, ": {}", self.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for Failure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display() {
        let failure = Failure::new(400)
            .with_message("bad item")
            .with_error("name is empty");
        assert_eq!(failure.to_string(), "[400] bad item: name is empty");
        assert_eq!(Failure::new(0).to_string(), "[0]");
    }

    #[test]
    fn test_from_error() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let failure = Failure::from_error(&io);
        assert_eq!(failure.code, 0);
        assert!(failure.message.is_empty());
        assert_eq!(failure.error, "disk gone");
    }

    #[test]
    fn test_with_header() {
        let failure = Failure::new(429).with_header(
            HeaderName::from_static("retry-after"),
            HeaderValue::from_static("3"),
        );
        assert_eq!(failure.headers.get("retry-after").unwrap(), "3");
    }
}
