//! Deterministic mock accessibility tree provider.
//!
//! Trees are described either with the [`NodeSpec`] builder or loaded from an
//! XML fixture, and runtime ids are assigned predictably in pre-order so tests
//! can address nodes by identity. The provider can inject transient read
//! failures to exercise retry paths.

mod condition;
mod provider;
mod tree;

pub use condition::MockCondition;
pub use provider::MockProvider;
pub use tree::{DESKTOP_RUNTIME_ID, MockNodeId, MockTree, MockTreeLoadError, NodeSpec};
