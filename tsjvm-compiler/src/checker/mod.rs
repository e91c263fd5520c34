//! Type checker core components
//!
//! This module lowers one compilation unit into typed trees:
//! - Local declarations and slot allocation
//! - Expression compilation under the coercion rules
//! - Object literal compilation into construction plans

pub mod context;
pub mod expressions;
pub mod records;

pub use context::{CompilationContext, LocalVariable};
pub use expressions::ExpressionCompiler;
pub use records::RecordCompiler;

use crate::error::{CompileError, CompileResult};
use crate::options::CompilerOptions;
use crate::typed_ast::{Constant, LocalRef, TypedExpr};
use crate::types::{resolve_annotation, PrimitiveKind, TypeKind};
use tsjvm_ast::{CompilationUnit, Span, VariableDeclaration};

/// A local store performed before the unit's body
#[derive(Debug, Clone, PartialEq)]
pub struct TypedInitializer {
    pub local: LocalRef,
    pub value: TypedExpr,
}

/// Fully typed compilation unit, ready for emission
#[derive(Debug, Clone, PartialEq)]
pub struct TypedUnit {
    pub name: String,
    pub locals: Vec<LocalVariable>,
    pub initializers: Vec<TypedInitializer>,
    pub body: TypedExpr,
    pub result_type: TypeKind,
    /// First slot not taken by a declared local
    pub next_free_slot: u16,
}

/// Type check a unit: declarations in order, then the body
pub fn check_unit(unit: &CompilationUnit, options: &CompilerOptions) -> CompileResult<TypedUnit> {
    let mut context = CompilationContext::new(options);
    let mut initializers = Vec::with_capacity(unit.declarations.len());

    for declaration in &unit.declarations {
        initializers.push(check_declaration(&mut context, declaration)?);
    }

    let expected = unit.return_type.as_ref().map(resolve_annotation).transpose()?;
    let body = match &expected {
        Some(expected) => ExpressionCompiler::compile_to(
            &mut context,
            &unit.body,
            expected,
            &|expected, found, span| CompileError::type_mismatch("result", expected, found, span),
        )?,
        None => ExpressionCompiler::compile(&mut context, &unit.body)?,
    };
    let result_type = expected.unwrap_or_else(|| body.result_type.clone());
    log::debug!(
        "unit {} checked: {} locals, result {}",
        unit.name,
        context.locals().count(),
        result_type
    );

    Ok(TypedUnit {
        name: unit.name.clone(),
        locals: context.locals().cloned().collect(),
        initializers,
        body,
        result_type,
        next_free_slot: context.next_free_slot(),
    })
}

fn check_declaration(
    context: &mut CompilationContext,
    declaration: &VariableDeclaration,
) -> CompileResult<TypedInitializer> {
    let name = &declaration.name.name;
    let missing_type = || CompileError::MissingType {
        name: name.clone(),
        span: declaration.span.into(),
    };

    // The initializer is compiled before the name is in scope
    let (declared, value) = match (&declaration.type_annotation, &declaration.initializer) {
        (Some(annotation), Some(initializer)) => {
            let declared = resolve_annotation(annotation)?;
            let value = ExpressionCompiler::compile_to(
                context,
                initializer,
                &declared,
                &|expected, found, span| {
                    CompileError::type_mismatch(format!("initializer of {}", name), expected, found, span)
                },
            )?;
            (declared, value)
        }
        (Some(annotation), None) => {
            let declared = resolve_annotation(annotation)?;
            let value = default_value(&declared, declaration.span);
            (declared, value)
        }
        (None, Some(initializer)) => {
            let value = ExpressionCompiler::compile(context, initializer)?;
            if value.result_type.is_null() {
                return Err(missing_type());
            }
            (value.result_type.clone(), value)
        }
        (None, None) => return Err(missing_type()),
    };

    let local = context.declare(name, declared, declaration.name.span)?;
    Ok(TypedInitializer { local, value })
}

/// Zero value of a declared type: `0`, `false`, or `null` for references
fn default_value(declared: &TypeKind, span: Span) -> TypedExpr {
    let constant = match declared {
        TypeKind::Primitive(PrimitiveKind::Boolean) => Constant::Boolean(false),
        TypeKind::Primitive(PrimitiveKind::Long) => Constant::Long(0),
        TypeKind::Primitive(PrimitiveKind::Float) => Constant::Float(0.0),
        TypeKind::Primitive(PrimitiveKind::Double) => Constant::Double(0.0),
        TypeKind::Primitive(_) => Constant::Int(0),
        _ => Constant::Null,
    };
    TypedExpr::constant(constant, declared.clone(), span)
}
