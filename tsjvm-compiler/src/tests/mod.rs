//! Compiler core tests
//!
//! Units are assembled with `tsjvm_ast::builder` and checked or compiled
//! with default options.

mod test_emission;
mod test_expressions;
mod test_updates;

use crate::checker::{check_unit, TypedUnit};
use crate::error::{CompileError, ErrorKind};
use crate::options::CompilerOptions;
use crate::typed_ast::{ConstructionPlan, TypedExprKind};
use crate::{compile_unit, InstructionSequence};
use std::sync::Once;
use tsjvm_ast::CompilationUnit;

static LOGGER: Once = Once::new();

/// Route `log` output to stderr; `TSJVM_LOG=debug` for more detail
pub fn init_logging() {
    LOGGER.call_once(|| {
        let level = std::env::var("TSJVM_LOG")
            .ok()
            .and_then(|level| level.parse().ok())
            .unwrap_or(log::LevelFilter::Warn);
        let _ = fern::Dispatch::new()
            .level(level)
            .chain(std::io::stderr())
            .apply();
    });
}

pub fn check(unit: &CompilationUnit) -> Result<TypedUnit, CompileError> {
    init_logging();
    check_unit(unit, &CompilerOptions::default())
}

pub fn check_ok(unit: &CompilationUnit) -> TypedUnit {
    match check(unit) {
        Ok(typed) => typed,
        Err(error) => panic!("expected {} to check, got {}", unit.body, error),
    }
}

pub fn check_err(unit: &CompilationUnit) -> CompileError {
    match check(unit) {
        Ok(typed) => panic!(
            "expected {} to fail, got {}",
            unit.body, typed.body.result_type
        ),
        Err(error) => error,
    }
}

pub fn error_kind(unit: &CompilationUnit) -> ErrorKind {
    check_err(unit).kind()
}

pub fn plan_of(typed: &TypedUnit) -> &ConstructionPlan {
    match &typed.body.kind {
        TypedExprKind::Record(plan) => plan,
        other => panic!("expected a record body, got {:?}", other),
    }
}

pub fn emit(unit: &CompilationUnit) -> InstructionSequence {
    emit_with(unit, &CompilerOptions::default())
}

pub fn emit_with(unit: &CompilationUnit, options: &CompilerOptions) -> InstructionSequence {
    init_logging();
    match compile_unit(unit, options) {
        Ok(compiled) => compiled.code,
        Err(error) => panic!("expected {} to compile, got {}", unit.body, error),
    }
}

/// Mnemonics emitted for the body, after `skip` initializer instructions
pub fn body_mnemonics(sequence: &InstructionSequence, skip: usize) -> Vec<String> {
    sequence.mnemonics().into_iter().skip(skip).collect()
}
