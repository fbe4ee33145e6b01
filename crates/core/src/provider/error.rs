use std::error::Error;
use std::fmt::{Display, Formatter};

/// General error reported by providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: Option<String>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: Some(message.into()) }
    }

    pub fn simple(kind: ProviderErrorKind) -> Self {
        Self { kind, message: None }
    }

    /// Whether retrying the same call may succeed, e.g. because the tree was
    /// mutating while it was read.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind,
            ProviderErrorKind::CommunicationFailure | ProviderErrorKind::ElementNotAvailable
        )
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{msg}"),
            None => write!(f, "{:#?}", self.kind),
        }
    }
}

impl Error for ProviderError {}

/// Categorises provider failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    CommunicationFailure,
    ElementNotAvailable,
    UnsupportedOperation,
    InvalidArgument,
    TreeUnavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_kinds() {
        assert!(ProviderError::simple(ProviderErrorKind::CommunicationFailure).is_transient());
        assert!(ProviderError::simple(ProviderErrorKind::ElementNotAvailable).is_transient());
        assert!(!ProviderError::simple(ProviderErrorKind::TreeUnavailable).is_transient());
    }

    #[test]
    fn display_prefers_message() {
        let err = ProviderError::new(ProviderErrorKind::InvalidArgument, "bad scope");
        assert_eq!(err.to_string(), "bad scope");
    }
}
