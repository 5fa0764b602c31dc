//! Configuration for the assistant
//!
//! Configuration is a small YAML document with three sections: where the
//! generation server lives, where the documents and policy guidelines are, and
//! how logging behaves. Every field has a default, so an absent file is a
//! valid configuration.

pub mod loader;
pub mod types;

pub use loader::*;
pub use types::*;
