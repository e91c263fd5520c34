//! Runtime error types for the tsjvm interpreter.
//!
//! Positions are instruction indices into the executed sequence.

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Failures raised while executing an instruction sequence
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Type error at instruction {position}: expected {expected}, found {found}")]
    #[diagnostic(
        code(tsjvm::runtime::type_error),
        help("The sequence does not match the operand types it was verified for")
    )]
    TypeError {
        expected: String,
        found: String,
        position: usize,
    },

    #[error("Operand stack underflow at instruction {position}")]
    #[diagnostic(code(tsjvm::runtime::stack_underflow))]
    StackUnderflow { position: usize },

    #[error("Sequence finished with {remaining} values on the stack, expected one")]
    #[diagnostic(
        code(tsjvm::runtime::unbalanced_stack),
        help("A unit leaves exactly its result on the operand stack")
    )]
    UnbalancedStack { remaining: usize },

    #[error("ArithmeticException at instruction {position}: {message}")]
    #[diagnostic(code(tsjvm::runtime::arithmetic_exception))]
    ArithmeticException { message: String, position: usize },

    #[error("NullPointerException at instruction {position}: {operation} on null")]
    #[diagnostic(
        code(tsjvm::runtime::null_pointer_exception),
        help("A null reference was unboxed, dereferenced or used as a receiver")
    )]
    NullPointerException { operation: String, position: usize },

    #[error("ClassCastException at instruction {position}: {found} cannot be cast to {class}")]
    #[diagnostic(code(tsjvm::runtime::class_cast_exception))]
    ClassCastException {
        found: String,
        class: String,
        position: usize,
    },

    #[error("NoSuchElementException at instruction {position}: iterator exhausted")]
    #[diagnostic(code(tsjvm::runtime::no_such_element))]
    NoSuchElement { position: usize },

    #[error("Unknown method {owner}.{name}{descriptor} at instruction {position}")]
    #[diagnostic(
        code(tsjvm::runtime::unknown_method),
        help("Only the library methods the backend emits are available")
    )]
    UnknownMethod {
        owner: String,
        name: String,
        descriptor: String,
        position: usize,
    },

    #[error("Unknown class {class} at instruction {position}")]
    #[diagnostic(code(tsjvm::runtime::unknown_class))]
    UnknownClass { class: String, position: usize },

    #[error("Constant pool entry {index} is missing or has the wrong kind at instruction {position}")]
    #[diagnostic(code(tsjvm::runtime::bad_constant))]
    BadConstant { index: String, position: usize },

    #[error("Jump to undefined label {label}")]
    #[diagnostic(code(tsjvm::runtime::undefined_label))]
    UndefinedLabel { label: String },

    #[error("Local slot {slot} is out of range or unset at instruction {position}")]
    #[diagnostic(code(tsjvm::runtime::bad_local))]
    BadLocal { slot: u16, position: usize },

    #[error("A {found} cannot be used as a map key")]
    #[diagnostic(code(tsjvm::runtime::unhashable_key))]
    UnhashableKey { found: String, position: usize },
}

impl RuntimeError {
    pub fn type_error(expected: impl Into<String>, found: impl Into<String>, position: usize) -> Self {
        Self::TypeError {
            expected: expected.into(),
            found: found.into(),
            position,
        }
    }

    pub fn null_pointer(operation: impl Into<String>, position: usize) -> Self {
        Self::NullPointerException {
            operation: operation.into(),
            position,
        }
    }

    pub fn division_by_zero(position: usize) -> Self {
        Self::ArithmeticException {
            message: "/ by zero".to_string(),
            position,
        }
    }

    pub fn unknown_method(owner: &str, name: &str, descriptor: &str, position: usize) -> Self {
        Self::UnknownMethod {
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            position,
        }
    }
}
