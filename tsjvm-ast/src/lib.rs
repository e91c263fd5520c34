// TSJVM AST Library
// Typed syntax tree for the TypeScript-flavoured surface language

pub mod ast;
pub mod builder;

pub use ast::*;

// Version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
