use thiserror::Error;

/// Failure of a locator resolution.
///
/// Provider failures never surface directly: transient read errors degrade to
/// empty data and search errors count as "not found".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorError {
    #[error("malformed locator `{locator}`: {reason}")]
    Malformed { locator: String, reason: String },
    #[error("no element matches locator `{locator}`")]
    NotFound { locator: String },
    #[error("resolution of locator `{locator}` was cancelled")]
    Cancelled { locator: String },
}

impl LocatorError {
    pub(crate) fn malformed(locator: impl Into<String>, reason: impl Into<String>) -> Self {
        LocatorError::Malformed { locator: locator.into(), reason: reason.into() }
    }

    pub(crate) fn not_found(locator: impl Into<String>) -> Self {
        LocatorError::NotFound { locator: locator.into() }
    }

    pub(crate) fn cancelled(locator: impl Into<String>) -> Self {
        LocatorError::Cancelled { locator: locator.into() }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, LocatorError::Malformed { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LocatorError::NotFound { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, LocatorError::Cancelled { .. })
    }

    /// The locator text the error refers to.
    pub fn locator(&self) -> &str {
        match self {
            LocatorError::Malformed { locator, .. }
            | LocatorError::NotFound { locator }
            | LocatorError::Cancelled { locator } => locator,
        }
    }
}
