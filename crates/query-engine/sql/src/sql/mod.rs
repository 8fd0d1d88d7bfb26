//! The SQL we generate: an AST, the conversion to a parameterized string, and helpers
//! for building AST values in common shapes.

pub mod ast;
pub mod convert;
pub mod execution_plan;
pub mod helpers;
pub mod string;
