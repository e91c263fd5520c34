//! Operand stack verification
//!
//! Simulates stack depth (in slots) over an instruction sequence. Every
//! label must be reached with one consistent height, no instruction may
//! pop below zero, and the sequence must end holding exactly its result.

use crate::emit::constant_pool::ConstantPool;
use crate::emit::instructions::{CompareOp, Instruction, Label};
use crate::typed_ast::ArithmeticOp;
use crate::types::StackKind;
use std::collections::HashMap;

/// Outcome of a stack simulation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackSummary {
    pub max_stack: u16,
    /// First inconsistency found, as (instruction position, reason)
    pub problem: Option<(usize, String)>,
}

/// Simulate `instructions`, expecting `result_slots` on the stack at the end
pub fn simulate(instructions: &[Instruction], pool: &ConstantPool, result_slots: u16) -> StackSummary {
    let mut verifier = StackVerifier {
        pool,
        heights: HashMap::new(),
        current: Some(0),
        max: 0,
        problem: None,
    };
    for (position, instruction) in instructions.iter().enumerate() {
        verifier.step(position, instruction);
    }
    match verifier.current {
        Some(height) if height != i32::from(result_slots) => verifier.report(
            instructions.len(),
            format!("sequence ends with {} stack slots, expected {}", height, result_slots),
        ),
        None => verifier.report(instructions.len(), "sequence ends in unreachable code".to_string()),
        _ => {}
    }
    StackSummary {
        max_stack: verifier.max.max(0) as u16,
        problem: verifier.problem,
    }
}

struct StackVerifier<'p> {
    pool: &'p ConstantPool,
    heights: HashMap<Label, i32>,
    /// `None` after an unconditional jump until the next label
    current: Option<i32>,
    max: i32,
    problem: Option<(usize, String)>,
}

impl StackVerifier<'_> {
    fn report(&mut self, position: usize, reason: String) {
        if self.problem.is_none() {
            log::trace!("stack problem at {}: {}", position, reason);
            self.problem = Some((position, reason));
        }
    }

    fn merge(&mut self, position: usize, label: Label, height: i32) {
        match self.heights.get(&label) {
            Some(&recorded) if recorded != height => self.report(
                position,
                format!("{} reached with stack height {} and {}", label, recorded, height),
            ),
            Some(_) => {}
            None => {
                self.heights.insert(label, height);
            }
        }
    }

    fn step(&mut self, position: usize, instruction: &Instruction) {
        if let Instruction::Label(label) = instruction {
            self.current = match (self.current, self.heights.get(label).copied()) {
                (Some(height), Some(_)) => {
                    self.merge(position, *label, height);
                    Some(height)
                }
                (Some(height), None) => {
                    self.heights.insert(*label, height);
                    Some(height)
                }
                (None, Some(recorded)) => Some(recorded),
                (None, None) => {
                    self.report(position, format!("{} is never reached", label));
                    None
                }
            };
            return;
        }

        let Some(height) = self.current else {
            self.report(position, format!("unreachable {}", instruction.mnemonic()));
            return;
        };
        let (pops, pushes) = match self.effect(instruction) {
            Ok(effect) => effect,
            Err(reason) => {
                self.report(position, reason);
                (0, 0)
            }
        };
        if height < pops {
            self.report(
                position,
                format!("{} pops {} slots from a stack of {}", instruction.mnemonic(), pops, height),
            );
        }
        let after_pop = (height - pops).max(0);
        let next = after_pop + pushes;
        self.max = self.max.max(next);

        if let Some(target) = instruction.branch_target() {
            self.merge(position, target, after_pop);
        }
        self.current = match instruction {
            Instruction::Goto(_) => None,
            _ => Some(next),
        };
    }

    /// (slots popped, slots pushed)
    fn effect(&self, instruction: &Instruction) -> Result<(i32, i32), String> {
        let size = |kind: StackKind| i32::from(kind.size());
        Ok(match instruction {
            Instruction::AConstNull
            | Instruction::IConst(_)
            | Instruction::BiPush(_)
            | Instruction::SiPush(_)
            | Instruction::FConst(_)
            | Instruction::Ldc(_)
            | Instruction::New(_) => (0, 1),
            Instruction::LConst(_) | Instruction::DConst(_) | Instruction::Ldc2W(_) => (0, 2),
            Instruction::Load(kind, _) => (0, size(*kind)),
            Instruction::Store(kind, _) => (size(*kind), 0),
            Instruction::IInc { .. } | Instruction::Label(_) | Instruction::Goto(_) => (0, 0),
            Instruction::Arithmetic(op, kind) => match op {
                // Shift counts are always ints
                ArithmeticOp::ShiftLeft | ArithmeticOp::ShiftRight | ArithmeticOp::UnsignedShiftRight => {
                    (size(*kind) + 1, size(*kind))
                }
                _ => (size(*kind) * 2, size(*kind)),
            },
            Instruction::Neg(kind) => (size(*kind), size(*kind)),
            Instruction::Convert(conversion) => {
                let (from, to) = conversion.kinds();
                (size(from), size(to))
            }
            Instruction::Compare(op) => match op {
                CompareOp::FCmpL | CompareOp::FCmpG => (2, 1),
                CompareOp::LCmp | CompareOp::DCmpL | CompareOp::DCmpG => (4, 1),
            },
            Instruction::If(..) | Instruction::IfNull(_) | Instruction::IfNonNull(_) => (1, 0),
            Instruction::IfICmp(..) => (2, 0),
            Instruction::Dup => (1, 2),
            Instruction::Dup2 => (2, 4),
            Instruction::DupX1 => (2, 3),
            Instruction::DupX2 => (3, 4),
            Instruction::Dup2X1 => (3, 5),
            Instruction::Dup2X2 => (4, 6),
            Instruction::Pop => (1, 0),
            Instruction::Pop2 => (2, 0),
            Instruction::Swap => (2, 2),
            Instruction::CheckCast(_) => (1, 1),
            Instruction::InvokeStatic(index) => {
                let (arguments, result) = self.method_slots(*index)?;
                (arguments, result)
            }
            Instruction::InvokeVirtual(index)
            | Instruction::InvokeSpecial(index)
            | Instruction::InvokeInterface(index) => {
                let (arguments, result) = self.method_slots(*index)?;
                (arguments + 1, result)
            }
        })
    }

    fn method_slots(&self, index: crate::emit::ConstantIndex) -> Result<(i32, i32), String> {
        let descriptor = self
            .pool
            .get(index)
            .and_then(|entry| entry.method_descriptor())
            .ok_or_else(|| format!("{} is not a method reference", index))?;
        descriptor_slots(descriptor).ok_or_else(|| format!("malformed method descriptor {}", descriptor))
    }
}

/// Argument and return slot counts of a method descriptor like `(IJ)D`
pub fn descriptor_slots(descriptor: &str) -> Option<(i32, i32)> {
    let rest = descriptor.strip_prefix('(')?;
    let (arguments, result) = rest.split_once(')')?;

    let mut slots = 0;
    let mut chars = arguments.chars();
    while let Some(c) = chars.next() {
        slots += field_slots(c, &mut chars)?;
    }

    let mut result_chars = result.chars();
    let first = result_chars.next()?;
    let result_slots = if first == 'V' {
        0
    } else {
        field_slots(first, &mut result_chars)?
    };
    Some((slots, result_slots))
}

fn field_slots(first: char, rest: &mut std::str::Chars) -> Option<i32> {
    match first {
        'J' | 'D' => Some(2),
        'B' | 'C' | 'F' | 'I' | 'S' | 'Z' => Some(1),
        'L' => {
            rest.by_ref().find(|c| *c == ';')?;
            Some(1)
        }
        '[' => {
            let element = rest.next()?;
            field_slots(element, rest)?;
            Some(1)
        }
        _ => None,
    }
}
