mod error;
mod tree;

pub use error::{ProviderError, ProviderErrorKind};
pub use tree::{AccessibilityTreeProvider, AttributeMap};
