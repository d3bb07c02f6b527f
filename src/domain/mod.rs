//! Domain layer - pure types and rules with no I/O.

pub mod foundation;
pub mod membership;
