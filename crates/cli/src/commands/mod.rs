pub mod attributes;
pub mod parse;
pub mod resolve;
pub mod snapshot;
