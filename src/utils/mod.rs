//! Generic utility primitives with zero domain knowledge.
//!
//! - `template` - Build variable expansion
//! - `validation` - Input validation helpers

pub mod template;
pub mod validation;
