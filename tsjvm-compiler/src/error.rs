//! Error types for the tsjvm compiler core
//!
//! Compilation is fail-fast: the first offending node aborts the unit and
//! surfaces here as a categorized diagnostic with the offending span.

use miette::{Diagnostic, SourceSpan};
use std::fmt;
use thiserror::Error;
use tsjvm_ast::Span;

pub type CompileResult<T> = Result<T, CompileError>;

/// Object-literal member forms that have no slot in the target container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyForm {
    Method,
    Getter,
    Setter,
    SymbolKey,
}

impl fmt::Display for PropertyForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyForm::Method => write!(f, "method"),
            PropertyForm::Getter => write!(f, "getter"),
            PropertyForm::Setter => write!(f, "setter"),
            PropertyForm::SymbolKey => write!(f, "symbol key"),
        }
    }
}

/// Stable category of a `CompileError`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TypeMismatch,
    InvalidCast,
    KeyTypeMismatch,
    IncompatibleKeyType,
    ValueTypeMismatch,
    IncompatibleValueType,
    UnsupportedPropertyKind,
    UnsupportedOperator,
    UnsupportedExpression,
    UndefinedVariable,
    DuplicateDeclaration,
    InvalidAssignmentTarget,
    MissingType,
    InvalidTypeAnnotation,
    StackVerification,
}

#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Type mismatch in {context}: expected {expected}, found {found}")]
    #[diagnostic(
        code(tsjvm::compile::type_mismatch),
        help("No promotion or conversion is defined between these types; add an explicit cast if one exists")
    )]
    TypeMismatch {
        context: String,
        expected: String,
        found: String,
        #[label("found {found}")]
        span: SourceSpan,
    },

    #[error("Invalid cast from {from} to {to}")]
    #[diagnostic(
        code(tsjvm::compile::invalid_cast),
        help("Only numeric-to-numeric, boxing, and checked reference casts are defined")
    )]
    InvalidCast {
        from: String,
        to: String,
        #[label("cannot cast {from} to {to}")]
        span: SourceSpan,
    },

    #[error("Key type mismatch for key '{key}': expected {expected}, found {found}")]
    #[diagnostic(
        code(tsjvm::compile::record::key_type_mismatch),
        help("Keys of this record must be {expected}")
    )]
    KeyTypeMismatch {
        key: String,
        expected: String,
        found: String,
        #[label("key '{key}' is {found}")]
        span: SourceSpan,
    },

    #[error("Incompatible key type in {container}: expected {expected}, found {found}")]
    #[diagnostic(
        code(tsjvm::compile::record::incompatible_key_type),
        help("The spread record's key type must be assignable to {expected}")
    )]
    IncompatibleKeyType {
        container: String,
        expected: String,
        found: String,
        #[label("spread of {found} keys")]
        span: SourceSpan,
    },

    #[error("Value type mismatch for property '{property}': expected {expected}, found {found}")]
    #[diagnostic(
        code(tsjvm::compile::record::value_type_mismatch),
        help("Values of this record must be assignable to {expected}")
    )]
    ValueTypeMismatch {
        property: String,
        expected: String,
        found: String,
        #[label("'{property}' is {found}")]
        span: SourceSpan,
    },

    #[error("Incompatible value type in {container}: expected {expected}, found {found}")]
    #[diagnostic(
        code(tsjvm::compile::record::incompatible_value_type),
        help("The spread record's value type must be assignable to {expected}")
    )]
    IncompatibleValueType {
        container: String,
        expected: String,
        found: String,
        #[label("spread of {found} values")]
        span: SourceSpan,
    },

    #[error("Unsupported {form} '{property}' in object literal")]
    #[diagnostic(
        code(tsjvm::compile::record::unsupported_property_kind),
        help("Object literals compile to ordered maps, which hold only string or numeric keys and plain values")
    )]
    UnsupportedPropertyKind {
        form: PropertyForm,
        property: String,
        #[label("{form} not allowed here")]
        span: SourceSpan,
    },

    #[error("Unsupported operator '{operator}'")]
    #[diagnostic(code(tsjvm::compile::unsupported_operator))]
    UnsupportedOperator {
        operator: String,
        #[label("operator not supported")]
        span: SourceSpan,
    },

    #[error("Unsupported expression: {description}")]
    #[diagnostic(code(tsjvm::compile::unsupported_expression))]
    UnsupportedExpression {
        description: String,
        #[label("cannot be compiled to a value")]
        span: SourceSpan,
    },

    #[error("Undefined variable: {name}")]
    #[diagnostic(
        code(tsjvm::compile::undefined_variable),
        help("Declare the variable before using it")
    )]
    UndefinedVariable {
        name: String,
        #[label("undefined variable")]
        span: SourceSpan,
    },

    #[error("Variable {name} is already declared")]
    #[diagnostic(code(tsjvm::compile::duplicate_declaration))]
    DuplicateDeclaration {
        name: String,
        #[label("redeclared here")]
        span: SourceSpan,
    },

    #[error("Invalid assignment target: {target}")]
    #[diagnostic(
        code(tsjvm::compile::invalid_assignment_target),
        help("Only local variables can be assigned or updated")
    )]
    InvalidAssignmentTarget {
        target: String,
        #[label("not assignable")]
        span: SourceSpan,
    },

    #[error("Cannot determine the type of {name}")]
    #[diagnostic(
        code(tsjvm::compile::missing_type),
        help("Add a type annotation or an initializer")
    )]
    MissingType {
        name: String,
        #[label("no annotation or initializer")]
        span: SourceSpan,
    },

    #[error("Invalid type annotation {annotation}: {reason}")]
    #[diagnostic(code(tsjvm::compile::invalid_type_annotation))]
    InvalidTypeAnnotation {
        annotation: String,
        reason: String,
        #[label("{reason}")]
        span: SourceSpan,
    },

    #[error("Stack verification failed at instruction {position}: {reason}")]
    #[diagnostic(code(tsjvm::compile::stack_verification))]
    StackVerification {
        position: usize,
        reason: String,
        #[label("emitted for this unit")]
        span: SourceSpan,
    },
}

impl CompileError {
    pub fn type_mismatch(
        context: impl Into<String>,
        expected: impl fmt::Display,
        found: impl fmt::Display,
        span: Span,
    ) -> Self {
        CompileError::TypeMismatch {
            context: context.into(),
            expected: expected.to_string(),
            found: found.to_string(),
            span: span.into(),
        }
    }

    pub fn invalid_cast(from: impl fmt::Display, to: impl fmt::Display, span: Span) -> Self {
        CompileError::InvalidCast {
            from: from.to_string(),
            to: to.to_string(),
            span: span.into(),
        }
    }

    pub fn key_type_mismatch(
        key: impl Into<String>,
        expected: impl fmt::Display,
        found: impl fmt::Display,
        span: Span,
    ) -> Self {
        CompileError::KeyTypeMismatch {
            key: key.into(),
            expected: expected.to_string(),
            found: found.to_string(),
            span: span.into(),
        }
    }

    pub fn incompatible_key_type(
        container: impl Into<String>,
        expected: impl fmt::Display,
        found: impl fmt::Display,
        span: Span,
    ) -> Self {
        CompileError::IncompatibleKeyType {
            container: container.into(),
            expected: expected.to_string(),
            found: found.to_string(),
            span: span.into(),
        }
    }

    pub fn value_type_mismatch(
        property: impl Into<String>,
        expected: impl fmt::Display,
        found: impl fmt::Display,
        span: Span,
    ) -> Self {
        CompileError::ValueTypeMismatch {
            property: property.into(),
            expected: expected.to_string(),
            found: found.to_string(),
            span: span.into(),
        }
    }

    pub fn incompatible_value_type(
        container: impl Into<String>,
        expected: impl fmt::Display,
        found: impl fmt::Display,
        span: Span,
    ) -> Self {
        CompileError::IncompatibleValueType {
            container: container.into(),
            expected: expected.to_string(),
            found: found.to_string(),
            span: span.into(),
        }
    }

    pub fn unsupported_property(form: PropertyForm, property: impl Into<String>, span: Span) -> Self {
        CompileError::UnsupportedPropertyKind {
            form,
            property: property.into(),
            span: span.into(),
        }
    }

    pub fn unsupported_operator(operator: impl Into<String>, span: Span) -> Self {
        CompileError::UnsupportedOperator {
            operator: operator.into(),
            span: span.into(),
        }
    }

    pub fn unsupported_expression(description: impl Into<String>, span: Span) -> Self {
        CompileError::UnsupportedExpression {
            description: description.into(),
            span: span.into(),
        }
    }

    pub fn undefined_variable(name: impl Into<String>, span: Span) -> Self {
        CompileError::UndefinedVariable {
            name: name.into(),
            span: span.into(),
        }
    }

    pub fn invalid_type_annotation(annotation: String, reason: String, span: Span) -> Self {
        CompileError::InvalidTypeAnnotation {
            annotation,
            reason,
            span: span.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CompileError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            CompileError::InvalidCast { .. } => ErrorKind::InvalidCast,
            CompileError::KeyTypeMismatch { .. } => ErrorKind::KeyTypeMismatch,
            CompileError::IncompatibleKeyType { .. } => ErrorKind::IncompatibleKeyType,
            CompileError::ValueTypeMismatch { .. } => ErrorKind::ValueTypeMismatch,
            CompileError::IncompatibleValueType { .. } => ErrorKind::IncompatibleValueType,
            CompileError::UnsupportedPropertyKind { .. } => ErrorKind::UnsupportedPropertyKind,
            CompileError::UnsupportedOperator { .. } => ErrorKind::UnsupportedOperator,
            CompileError::UnsupportedExpression { .. } => ErrorKind::UnsupportedExpression,
            CompileError::UndefinedVariable { .. } => ErrorKind::UndefinedVariable,
            CompileError::DuplicateDeclaration { .. } => ErrorKind::DuplicateDeclaration,
            CompileError::InvalidAssignmentTarget { .. } => ErrorKind::InvalidAssignmentTarget,
            CompileError::MissingType { .. } => ErrorKind::MissingType,
            CompileError::InvalidTypeAnnotation { .. } => ErrorKind::InvalidTypeAnnotation,
            CompileError::StackVerification { .. } => ErrorKind::StackVerification,
        }
    }

    pub fn span(&self) -> SourceSpan {
        match self {
            CompileError::TypeMismatch { span, .. }
            | CompileError::InvalidCast { span, .. }
            | CompileError::KeyTypeMismatch { span, .. }
            | CompileError::IncompatibleKeyType { span, .. }
            | CompileError::ValueTypeMismatch { span, .. }
            | CompileError::IncompatibleValueType { span, .. }
            | CompileError::UnsupportedPropertyKind { span, .. }
            | CompileError::UnsupportedOperator { span, .. }
            | CompileError::UnsupportedExpression { span, .. }
            | CompileError::UndefinedVariable { span, .. }
            | CompileError::DuplicateDeclaration { span, .. }
            | CompileError::InvalidAssignmentTarget { span, .. }
            | CompileError::MissingType { span, .. }
            | CompileError::InvalidTypeAnnotation { span, .. }
            | CompileError::StackVerification { span, .. } => *span,
        }
    }
}
