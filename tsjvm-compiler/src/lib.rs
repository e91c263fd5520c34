//! tsjvm compiler core
//!
//! Expression and object-literal compilation for a TypeScript-flavoured
//! language with explicit primitive numeric types, targeting a
//! stack-based, verified managed bytecode.

// Allow clippy lints for development
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::too_many_arguments)]
//!
//! ## Architecture
//!
//! - **Type Lattice**: primitive kinds, widening graph and promotion table
//! - **Coercion Engine**: operator categories, implicit and explicit conversions
//! - **Expression Compiler**: typed, lowered trees for every expression form
//! - **Record Compiler**: construction plans for object literals under an
//!   optional `Record<K, V>` constraint
//! - **Emission Backend**: symbolic instructions, constant pool and stack
//!   verification
//!
//! A unit is compiled start to finish on one thread; `compile_units`
//! spreads independent units across scoped worker threads.

pub mod checker;
pub mod coercion;
pub mod emit;
pub mod error;
pub mod options;
pub mod typed_ast;
pub mod types;

// Re-export public API
pub use checker::{check_unit, ExpressionCompiler, RecordCompiler, TypedUnit};
pub use coercion::{
    assignment_conversions, cast_conversions, coerce_binary, BinaryCoercion, Conversion,
    OperandKind, OperatorCategory,
};
pub use emit::{emit_unit, Instruction, InstructionSequence};
pub use error::{CompileError, CompileResult, ErrorKind, PropertyForm};
pub use options::CompilerOptions;
pub use typed_ast::{ConstructionPlan, TypedExpr, TypedExprKind};
pub use types::{PrimitiveKind, RecordConstraint, TypeKind};

use tsjvm_ast::CompilationUnit;

/// A successfully compiled unit
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledUnit {
    pub name: String,
    pub result_type: TypeKind,
    pub code: InstructionSequence,
}

/// Compile one unit; any failure aborts it with nothing emitted
pub fn compile_unit(unit: &CompilationUnit, options: &CompilerOptions) -> CompileResult<CompiledUnit> {
    log::debug!("compiling unit {}", unit.name);
    let typed = check_unit(unit, options)?;
    let code = emit_unit(&typed, options)?;
    Ok(CompiledUnit {
        name: typed.name,
        result_type: typed.result_type,
        code,
    })
}

/// Compile independent units in parallel. Results are in input order and
/// one unit's failure does not affect the others.
pub fn compile_units(
    units: &[CompilationUnit],
    options: &CompilerOptions,
) -> Vec<CompileResult<CompiledUnit>> {
    let workers = options.worker_threads.max(1);
    let mut results = Vec::with_capacity(units.len());

    for batch in units.chunks(workers) {
        let batch_results: Vec<CompileResult<CompiledUnit>> = std::thread::scope(|scope| {
            let handles: Vec<_> = batch
                .iter()
                .map(|unit| scope.spawn(move || compile_unit(unit, options)))
                .collect();
            handles
                .into_iter()
                .zip(batch)
                .map(|(handle, unit)| {
                    let result = handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
                    if let Err(error) = &result {
                        log::debug!("unit {} failed: {}", unit.name, error);
                    }
                    result
                })
                .collect()
        });
        results.extend(batch_results);
    }
    results
}

#[cfg(test)]
mod tests;
