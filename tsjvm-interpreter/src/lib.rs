//! tsjvm interpreter
//!
//! Executes the instruction sequences produced by `tsjvm-compiler`, with a
//! small library standing in for the wrapper, string and collection
//! classes the emitted code calls. Used to check that compiled units
//! compute what the source means.

// Allow clippy lints for development
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::result_large_err)]

pub mod error;
pub mod library;
pub mod machine;
pub mod test_harness;
pub mod value;

// Include tests directory with all test modules
#[cfg(test)]
#[path = "tests/mod.rs"]
pub mod tests;

// Re-export public API
pub use error::{Result, RuntimeError};
pub use library::Library;
pub use machine::{execute, Execution, Machine, OperandStack};
pub use test_harness::{run_unit, HarnessError, Session};
pub use value::{BoxedValue, Key, Value};
