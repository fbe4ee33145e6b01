//! Provider-neutral vocabulary shared by the locator engine and tree providers.
//!
//! Nothing in here talks to a real accessibility API. Providers implement
//! [`provider::AccessibilityTreeProvider`] and translate the conditions and
//! identifiers defined here into their native representation.

pub mod provider;
pub mod types;
pub mod ui;
