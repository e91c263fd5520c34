//! Emission backend
//!
//! Turns a typed unit into an `InstructionSequence`. The sequence is built
//! in a private buffer and only returned once it has been verified.

pub mod constant_pool;
pub mod emitter;
pub mod instructions;
pub mod verify;

pub use constant_pool::{ConstantIndex, ConstantPool, PoolEntry};
pub use emitter::Emitter;
pub use instructions::{CompareOp, Condition, Instruction, Label, PrimitiveConversion};
pub use verify::{descriptor_slots, simulate, StackSummary};

use crate::checker::TypedUnit;
use crate::error::{CompileError, CompileResult};
use crate::options::CompilerOptions;
use crate::types::TypeKind;
use std::fmt;

/// One row of the local-variable table
#[derive(Debug, Clone, PartialEq)]
pub struct LocalVariableInfo {
    pub name: String,
    pub slot: u16,
    pub declared_type: TypeKind,
    pub descriptor: String,
}

/// Instruction-level contribution of one unit, for splicing into a method
#[derive(Debug, Clone, PartialEq)]
pub struct InstructionSequence {
    pub instructions: Vec<Instruction>,
    pub constant_pool: ConstantPool,
    pub max_stack: u16,
    pub max_locals: u16,
    pub locals: Vec<LocalVariableInfo>,
    /// Static type of the value left on the stack
    pub result_type: TypeKind,
}

impl InstructionSequence {
    /// Instructions with pool operands resolved, one per line
    pub fn listing(&self) -> Vec<String> {
        self.instructions
            .iter()
            .map(|instruction| instruction.render(&self.constant_pool))
            .collect()
    }

    /// Opcode names only, labels omitted
    pub fn mnemonics(&self) -> Vec<String> {
        self.instructions
            .iter()
            .filter(|instruction| !matches!(instruction, Instruction::Label(_)))
            .map(Instruction::mnemonic)
            .collect()
    }
}

impl fmt::Display for InstructionSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "; max_stack={} max_locals={} result={}",
            self.max_stack, self.max_locals, self.result_type
        )?;
        for line in self.listing() {
            if line.ends_with(':') {
                writeln!(f, "{}", line)?;
            } else {
                writeln!(f, "    {}", line)?;
            }
        }
        Ok(())
    }
}

/// Emit a typed unit: initializer stores, then the body's value
pub fn emit_unit(unit: &TypedUnit, options: &CompilerOptions) -> CompileResult<InstructionSequence> {
    let mut emitter = Emitter::new(options, unit.next_free_slot);
    for initializer in &unit.initializers {
        emitter.emit_expression(&initializer.value);
        emitter.emit_store(&initializer.local);
    }
    emitter.emit_expression(&unit.body);
    let (instructions, constant_pool, max_locals) = emitter.finish();

    let summary = simulate(
        &instructions,
        &constant_pool,
        unit.body.result_type.stack_kind().size(),
    );
    if let (true, Some((position, reason))) = (options.verify_stack, &summary.problem) {
        return Err(CompileError::StackVerification {
            position: *position,
            reason: reason.clone(),
            span: unit.body.span.into(),
        });
    }
    log::debug!(
        "unit {} emitted: {} instructions, {} pool entries, max_stack {}",
        unit.name,
        instructions.len(),
        constant_pool.len(),
        summary.max_stack
    );

    let locals = unit
        .locals
        .iter()
        .map(|local| LocalVariableInfo {
            name: local.name.clone(),
            slot: local.slot,
            declared_type: local.declared_type.clone(),
            descriptor: local.declared_type.descriptor(),
        })
        .collect();

    Ok(InstructionSequence {
        instructions,
        constant_pool,
        max_stack: summary.max_stack,
        max_locals,
        locals,
        result_type: unit.result_type.clone(),
    })
}
