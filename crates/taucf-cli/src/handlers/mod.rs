//! Command handlers. Each takes the composed context and prints results.

pub mod compiler;
pub mod package;
