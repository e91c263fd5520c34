//! Executes verified instruction sequences
//!
//! The machine runs one sequence from its first instruction to its last
//! and returns the single value left on the operand stack, together with
//! the final contents of the named locals.

use crate::error::{Result, RuntimeError};
use crate::library::{check_cast, Library};
use crate::value::Value;
use std::collections::HashMap;
use std::ops::{Add, Div, Mul, Rem, Sub};
use tsjvm_compiler::emit::{
    CompareOp, ConstantIndex, Instruction, InstructionSequence, Label, PoolEntry,
    PrimitiveConversion,
};
use tsjvm_compiler::typed_ast::ArithmeticOp;
use tsjvm_compiler::types::StackKind;

/// Operand stack with kind-checked pops
#[derive(Debug, Default)]
pub struct OperandStack {
    values: Vec<Value>,
}

impl OperandStack {
    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    pub fn pop(&mut self, position: usize) -> Result<Value> {
        self.values
            .pop()
            .ok_or(RuntimeError::StackUnderflow { position })
    }

    pub fn pop_kind(&mut self, kind: StackKind, position: usize) -> Result<Value> {
        let value = self.pop(position)?;
        if value.stack_kind() == kind {
            Ok(value)
        } else {
            Err(RuntimeError::type_error(
                kind_name(kind),
                value.type_name(),
                position,
            ))
        }
    }

    pub fn pop_int(&mut self, position: usize) -> Result<i32> {
        match self.pop_kind(StackKind::Int, position)? {
            Value::Int(value) => Ok(value),
            other => Err(RuntimeError::type_error("int", other.type_name(), position)),
        }
    }

    pub fn pop_long(&mut self, position: usize) -> Result<i64> {
        match self.pop_kind(StackKind::Long, position)? {
            Value::Long(value) => Ok(value),
            other => Err(RuntimeError::type_error("long", other.type_name(), position)),
        }
    }

    pub fn pop_float(&mut self, position: usize) -> Result<f32> {
        match self.pop_kind(StackKind::Float, position)? {
            Value::Float(value) => Ok(value),
            other => Err(RuntimeError::type_error("float", other.type_name(), position)),
        }
    }

    pub fn pop_double(&mut self, position: usize) -> Result<f64> {
        match self.pop_kind(StackKind::Double, position)? {
            Value::Double(value) => Ok(value),
            other => Err(RuntimeError::type_error("double", other.type_name(), position)),
        }
    }

    pub fn pop_reference(&mut self, position: usize) -> Result<Value> {
        self.pop_kind(StackKind::Reference, position)
    }

    pub fn peek(&self, position: usize) -> Result<&Value> {
        self.values
            .last()
            .ok_or(RuntimeError::StackUnderflow { position })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Pop whole values covering exactly `slots` slots, bottom first
    fn pop_slots(&mut self, slots: u16, position: usize) -> Result<Vec<Value>> {
        let mut taken = Vec::new();
        let mut covered = 0;
        while covered < slots {
            let value = self.pop(position)?;
            covered += value.slots();
            taken.push(value);
        }
        if covered != slots {
            return Err(RuntimeError::type_error(
                format!("{} stack slots", slots),
                "a split two-slot value",
                position,
            ));
        }
        taken.reverse();
        Ok(taken)
    }

    /// The `dup` family: copy the top `copy` slots below the `skip` slots
    /// underneath them
    fn duplicate(&mut self, copy: u16, skip: u16, position: usize) -> Result<()> {
        let top = self.pop_slots(copy, position)?;
        let below = self.pop_slots(skip, position)?;
        self.values.extend(top.iter().cloned());
        self.values.extend(below);
        self.values.extend(top);
        Ok(())
    }
}

fn kind_name(kind: StackKind) -> &'static str {
    match kind {
        StackKind::Int => "int",
        StackKind::Long => "long",
        StackKind::Float => "float",
        StackKind::Double => "double",
        StackKind::Reference => "reference",
    }
}

/// Outcome of running a sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub result: Value,
    /// Named locals in declaration order, with their final values
    pub locals: Vec<(String, Value)>,
}

impl Execution {
    pub fn local(&self, name: &str) -> Option<&Value> {
        self.locals
            .iter()
            .find(|(local, _)| local == name)
            .map(|(_, value)| value)
    }
}

/// Run a sequence with the standard library
pub fn execute(sequence: &InstructionSequence) -> Result<Execution> {
    let library = Library::new();
    Machine::new(sequence, &library)?.run()
}

pub struct Machine<'a> {
    sequence: &'a InstructionSequence,
    library: &'a Library,
    labels: HashMap<Label, usize>,
    stack: OperandStack,
    locals: Vec<Option<Value>>,
    next: usize,
}

impl<'a> Machine<'a> {
    /// Resolve labels up front; a jump to a missing label is an error
    /// before anything runs
    pub fn new(sequence: &'a InstructionSequence, library: &'a Library) -> Result<Self> {
        let labels: HashMap<Label, usize> = sequence
            .instructions
            .iter()
            .enumerate()
            .filter_map(|(position, instruction)| match instruction {
                Instruction::Label(label) => Some((*label, position)),
                _ => None,
            })
            .collect();

        if let Some(label) = sequence
            .instructions
            .iter()
            .filter_map(Instruction::branch_target)
            .find(|label| !labels.contains_key(label))
        {
            return Err(RuntimeError::UndefinedLabel {
                label: label.to_string(),
            });
        }

        Ok(Self {
            sequence,
            library,
            labels,
            stack: OperandStack::default(),
            locals: vec![None; usize::from(sequence.max_locals)],
            next: 0,
        })
    }

    pub fn run(mut self) -> Result<Execution> {
        log::debug!(
            "executing {} instructions, max_locals {}",
            self.sequence.instructions.len(),
            self.sequence.max_locals
        );
        let sequence = self.sequence;
        while let Some(instruction) = sequence.instructions.get(self.next) {
            let position = self.next;
            self.next += 1;
            log::trace!(
                "{:>4}: {} (depth {})",
                position,
                instruction.render(&sequence.constant_pool),
                self.stack.len()
            );
            self.step(instruction, position)?;
        }
        self.finish()
    }

    fn finish(mut self) -> Result<Execution> {
        if self.stack.len() != 1 {
            return Err(RuntimeError::UnbalancedStack {
                remaining: self.stack.len(),
            });
        }
        let result = self.stack.pop(self.sequence.instructions.len())?;
        let locals = self
            .sequence
            .locals
            .iter()
            .map(|local| {
                let value = self
                    .locals
                    .get(usize::from(local.slot))
                    .cloned()
                    .flatten()
                    .unwrap_or(Value::Null);
                (local.name.clone(), value)
            })
            .collect();
        log::debug!("execution finished with {}", result);
        Ok(Execution { result, locals })
    }

    fn step(&mut self, instruction: &Instruction, position: usize) -> Result<()> {
        match instruction {
            Instruction::AConstNull => self.stack.push(Value::Null),
            Instruction::IConst(value) => self.stack.push(Value::Int(*value)),
            Instruction::BiPush(value) => self.stack.push(Value::Int(i32::from(*value))),
            Instruction::SiPush(value) => self.stack.push(Value::Int(i32::from(*value))),
            Instruction::LConst(value) => self.stack.push(Value::Long(*value)),
            Instruction::FConst(value) => self.stack.push(Value::Float(*value)),
            Instruction::DConst(value) => self.stack.push(Value::Double(*value)),
            Instruction::Ldc(index) => {
                let value = match self.constant(*index, position)? {
                    PoolEntry::Integer(value) => Value::Int(*value),
                    PoolEntry::Float(bits) => Value::Float(f32::from_bits(*bits)),
                    PoolEntry::String(value) => Value::Str(value.clone()),
                    _ => return Err(bad_constant(*index, position)),
                };
                self.stack.push(value);
            }
            Instruction::Ldc2W(index) => {
                let value = match self.constant(*index, position)? {
                    PoolEntry::Long(value) => Value::Long(*value),
                    PoolEntry::Double(bits) => Value::Double(f64::from_bits(*bits)),
                    _ => return Err(bad_constant(*index, position)),
                };
                self.stack.push(value);
            }

            Instruction::Load(kind, slot) => {
                let value = self.local(*slot, position)?;
                if value.stack_kind() != *kind {
                    return Err(RuntimeError::type_error(kind_name(*kind), value.type_name(), position));
                }
                self.stack.push(value);
            }
            Instruction::Store(kind, slot) => {
                let value = self.stack.pop_kind(*kind, position)?;
                self.store(*slot, value, position)?;
            }
            Instruction::IInc { slot, delta } => match self.local(*slot, position)? {
                Value::Int(value) => {
                    self.store(*slot, Value::Int(value.wrapping_add(i32::from(*delta))), position)?
                }
                other => return Err(RuntimeError::type_error("int", other.type_name(), position)),
            },

            Instruction::Arithmetic(op, kind) => {
                let value = arithmetic(&mut self.stack, *op, *kind, position)?;
                self.stack.push(value);
            }
            Instruction::Neg(kind) => {
                let value = match kind {
                    StackKind::Int => Value::Int(self.stack.pop_int(position)?.wrapping_neg()),
                    StackKind::Long => Value::Long(self.stack.pop_long(position)?.wrapping_neg()),
                    StackKind::Float => Value::Float(-self.stack.pop_float(position)?),
                    StackKind::Double => Value::Double(-self.stack.pop_double(position)?),
                    StackKind::Reference => {
                        return Err(RuntimeError::type_error("numeric", "reference", position));
                    }
                };
                self.stack.push(value);
            }
            Instruction::Convert(conversion) => {
                let value = convert(&mut self.stack, *conversion, position)?;
                self.stack.push(value);
            }
            Instruction::Compare(op) => {
                let ordering = compare(&mut self.stack, *op, position)?;
                self.stack.push(Value::Int(ordering));
            }

            Instruction::If(condition, label) => {
                if condition.holds(self.stack.pop_int(position)?) {
                    self.jump(*label)?;
                }
            }
            Instruction::IfICmp(condition, label) => {
                let right = self.stack.pop_int(position)?;
                let left = self.stack.pop_int(position)?;
                if condition.holds(left.cmp(&right) as i32) {
                    self.jump(*label)?;
                }
            }
            Instruction::IfNull(label) => {
                if matches!(self.stack.pop_reference(position)?, Value::Null) {
                    self.jump(*label)?;
                }
            }
            Instruction::IfNonNull(label) => {
                if !matches!(self.stack.pop_reference(position)?, Value::Null) {
                    self.jump(*label)?;
                }
            }
            Instruction::Goto(label) => self.jump(*label)?,
            Instruction::Label(_) => {}

            Instruction::Dup => self.stack.duplicate(1, 0, position)?,
            Instruction::DupX1 => self.stack.duplicate(1, 1, position)?,
            Instruction::DupX2 => self.stack.duplicate(1, 2, position)?,
            Instruction::Dup2 => self.stack.duplicate(2, 0, position)?,
            Instruction::Dup2X1 => self.stack.duplicate(2, 1, position)?,
            Instruction::Dup2X2 => self.stack.duplicate(2, 2, position)?,
            Instruction::Pop => {
                self.stack.pop_slots(1, position)?;
            }
            Instruction::Pop2 => {
                self.stack.pop_slots(2, position)?;
            }
            Instruction::Swap => {
                let top = self.stack.pop_slots(1, position)?;
                let below = self.stack.pop_slots(1, position)?;
                self.stack.values.extend(top);
                self.stack.values.extend(below);
            }

            Instruction::New(index) => {
                let class = self.class(*index, position)?;
                let instance = self.library.instantiate(class, position)?;
                self.stack.push(instance);
            }
            Instruction::CheckCast(index) => {
                let class = self.class(*index, position)?;
                check_cast(class, self.stack.peek(position)?, position)?;
            }
            Instruction::InvokeStatic(index)
            | Instruction::InvokeVirtual(index)
            | Instruction::InvokeSpecial(index)
            | Instruction::InvokeInterface(index) => match self.constant(*index, position)? {
                PoolEntry::MethodRef {
                    owner,
                    name,
                    descriptor,
                }
                | PoolEntry::InterfaceMethodRef {
                    owner,
                    name,
                    descriptor,
                } => {
                    self.library
                        .invoke(owner, name, descriptor, &mut self.stack, position)?;
                }
                _ => return Err(bad_constant(*index, position)),
            },
        }
        Ok(())
    }

    fn constant(&self, index: ConstantIndex, position: usize) -> Result<&'a PoolEntry> {
        self.sequence
            .constant_pool
            .get(index)
            .ok_or_else(|| bad_constant(index, position))
    }

    fn class(&self, index: ConstantIndex, position: usize) -> Result<&'a str> {
        match self.constant(index, position)? {
            PoolEntry::Class(name) => Ok(name),
            _ => Err(bad_constant(index, position)),
        }
    }

    fn local(&self, slot: u16, position: usize) -> Result<Value> {
        self.locals
            .get(usize::from(slot))
            .cloned()
            .flatten()
            .ok_or(RuntimeError::BadLocal { slot, position })
    }

    /// A two-slot value also claims the slot above it
    fn store(&mut self, slot: u16, value: Value, position: usize) -> Result<()> {
        let start = usize::from(slot);
        let width = usize::from(value.slots());
        if start + width > self.locals.len() {
            return Err(RuntimeError::BadLocal { slot, position });
        }
        if width == 2 {
            self.locals[start + 1] = None;
        }
        self.locals[start] = Some(value);
        Ok(())
    }

    fn jump(&mut self, label: Label) -> Result<()> {
        self.next = *self
            .labels
            .get(&label)
            .ok_or_else(|| RuntimeError::UndefinedLabel {
                label: label.to_string(),
            })?;
        Ok(())
    }
}

fn bad_constant(index: ConstantIndex, position: usize) -> RuntimeError {
    RuntimeError::BadConstant {
        index: index.to_string(),
        position,
    }
}

fn is_shift(op: ArithmeticOp) -> bool {
    matches!(
        op,
        ArithmeticOp::ShiftLeft | ArithmeticOp::ShiftRight | ArithmeticOp::UnsignedShiftRight
    )
}

fn arithmetic(stack: &mut OperandStack, op: ArithmeticOp, kind: StackKind, position: usize) -> Result<Value> {
    match kind {
        StackKind::Int => {
            let right = stack.pop_int(position)?;
            let left = stack.pop_int(position)?;
            int_arithmetic(op, left, right, position).map(Value::Int)
        }
        StackKind::Long => {
            // Shift distances stay ints
            let right = if is_shift(op) {
                i64::from(stack.pop_int(position)?)
            } else {
                stack.pop_long(position)?
            };
            let left = stack.pop_long(position)?;
            long_arithmetic(op, left, right, position).map(Value::Long)
        }
        StackKind::Float => {
            let right = stack.pop_float(position)?;
            let left = stack.pop_float(position)?;
            floating_arithmetic(op, left, right)
                .map(Value::Float)
                .ok_or_else(|| RuntimeError::type_error("integral operands", "float", position))
        }
        StackKind::Double => {
            let right = stack.pop_double(position)?;
            let left = stack.pop_double(position)?;
            floating_arithmetic(op, left, right)
                .map(Value::Double)
                .ok_or_else(|| RuntimeError::type_error("integral operands", "double", position))
        }
        StackKind::Reference => Err(RuntimeError::type_error("numeric", "reference", position)),
    }
}

fn int_arithmetic(op: ArithmeticOp, left: i32, right: i32, position: usize) -> Result<i32> {
    Ok(match op {
        ArithmeticOp::Add => left.wrapping_add(right),
        ArithmeticOp::Subtract => left.wrapping_sub(right),
        ArithmeticOp::Multiply => left.wrapping_mul(right),
        ArithmeticOp::Divide if right == 0 => return Err(RuntimeError::division_by_zero(position)),
        ArithmeticOp::Divide => left.wrapping_div(right),
        ArithmeticOp::Remainder if right == 0 => return Err(RuntimeError::division_by_zero(position)),
        ArithmeticOp::Remainder => left.wrapping_rem(right),
        ArithmeticOp::And => left & right,
        ArithmeticOp::Or => left | right,
        ArithmeticOp::Xor => left ^ right,
        // Distances are masked to five bits
        ArithmeticOp::ShiftLeft => left.wrapping_shl(right as u32),
        ArithmeticOp::ShiftRight => left.wrapping_shr(right as u32),
        ArithmeticOp::UnsignedShiftRight => (left as u32).wrapping_shr(right as u32) as i32,
    })
}

fn long_arithmetic(op: ArithmeticOp, left: i64, right: i64, position: usize) -> Result<i64> {
    Ok(match op {
        ArithmeticOp::Add => left.wrapping_add(right),
        ArithmeticOp::Subtract => left.wrapping_sub(right),
        ArithmeticOp::Multiply => left.wrapping_mul(right),
        ArithmeticOp::Divide if right == 0 => return Err(RuntimeError::division_by_zero(position)),
        ArithmeticOp::Divide => left.wrapping_div(right),
        ArithmeticOp::Remainder if right == 0 => return Err(RuntimeError::division_by_zero(position)),
        ArithmeticOp::Remainder => left.wrapping_rem(right),
        ArithmeticOp::And => left & right,
        ArithmeticOp::Or => left | right,
        ArithmeticOp::Xor => left ^ right,
        ArithmeticOp::ShiftLeft => left.wrapping_shl(right as u32),
        ArithmeticOp::ShiftRight => left.wrapping_shr(right as u32),
        ArithmeticOp::UnsignedShiftRight => (left as u64).wrapping_shr(right as u32) as i64,
    })
}

/// IEEE arithmetic; `%` truncates like `fmod`. Bitwise operators have no
/// floating form.
fn floating_arithmetic<T>(op: ArithmeticOp, left: T, right: T) -> Option<T>
where
    T: Add<Output = T> + Sub<Output = T> + Mul<Output = T> + Div<Output = T> + Rem<Output = T>,
{
    Some(match op {
        ArithmeticOp::Add => left + right,
        ArithmeticOp::Subtract => left - right,
        ArithmeticOp::Multiply => left * right,
        ArithmeticOp::Divide => left / right,
        ArithmeticOp::Remainder => left % right,
        _ => return None,
    })
}

fn convert(stack: &mut OperandStack, conversion: PrimitiveConversion, position: usize) -> Result<Value> {
    use PrimitiveConversion::*;
    // Float to integral casts saturate and send NaN to zero, as `as` does
    Ok(match conversion {
        I2L => Value::Long(i64::from(stack.pop_int(position)?)),
        I2F => Value::Float(stack.pop_int(position)? as f32),
        I2D => Value::Double(f64::from(stack.pop_int(position)?)),
        L2I => Value::Int(stack.pop_long(position)? as i32),
        L2F => Value::Float(stack.pop_long(position)? as f32),
        L2D => Value::Double(stack.pop_long(position)? as f64),
        F2I => Value::Int(stack.pop_float(position)? as i32),
        F2L => Value::Long(stack.pop_float(position)? as i64),
        F2D => Value::Double(f64::from(stack.pop_float(position)?)),
        D2I => Value::Int(stack.pop_double(position)? as i32),
        D2L => Value::Long(stack.pop_double(position)? as i64),
        D2F => Value::Float(stack.pop_double(position)? as f32),
        I2B => Value::Int(i32::from(stack.pop_int(position)? as i8)),
        I2C => Value::Int(i32::from(stack.pop_int(position)? as u16)),
        I2S => Value::Int(i32::from(stack.pop_int(position)? as i16)),
    })
}

fn compare(stack: &mut OperandStack, op: CompareOp, position: usize) -> Result<i32> {
    let ordering = match op {
        CompareOp::LCmp => {
            let right = stack.pop_long(position)?;
            let left = stack.pop_long(position)?;
            Some(left.cmp(&right))
        }
        CompareOp::FCmpL | CompareOp::FCmpG => {
            let right = stack.pop_float(position)?;
            let left = stack.pop_float(position)?;
            left.partial_cmp(&right)
        }
        CompareOp::DCmpL | CompareOp::DCmpG => {
            let right = stack.pop_double(position)?;
            let left = stack.pop_double(position)?;
            left.partial_cmp(&right)
        }
    };
    Ok(match (ordering, op) {
        (Some(ordering), _) => ordering as i32,
        // Unordered: the `g` forms push 1, the `l` forms -1
        (None, CompareOp::FCmpG | CompareOp::DCmpG) => 1,
        (None, _) => -1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::BoxedValue;
    use pretty_assertions::assert_eq;

    fn values(stack: &OperandStack) -> Vec<Value> {
        stack.values.clone()
    }

    #[test]
    fn test_dup_x1_inserts_below_second_value() {
        let mut stack = OperandStack::default();
        stack.push(Value::Int(1));
        stack.push(Value::Int(2));
        stack.duplicate(1, 1, 0).unwrap();
        assert_eq!(values(&stack), vec![Value::Int(2), Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn test_dup2_copies_one_wide_value() {
        let mut stack = OperandStack::default();
        stack.push(Value::Long(7));
        stack.duplicate(2, 0, 0).unwrap();
        assert_eq!(values(&stack), vec![Value::Long(7), Value::Long(7)]);
    }

    #[test]
    fn test_dup2_x1_with_wide_value() {
        let mut stack = OperandStack::default();
        stack.push(Value::Null);
        stack.push(Value::Double(1.5));
        stack.duplicate(2, 1, 0).unwrap();
        assert_eq!(
            values(&stack),
            vec![Value::Double(1.5), Value::Null, Value::Double(1.5)]
        );
    }

    #[test]
    fn test_dup_refuses_to_split_wide_value() {
        let mut stack = OperandStack::default();
        stack.push(Value::Long(1));
        assert!(matches!(
            stack.duplicate(1, 0, 4),
            Err(RuntimeError::TypeError { position: 4, .. })
        ));
    }

    #[test]
    fn test_typed_pop_reports_kind() {
        let mut stack = OperandStack::default();
        stack.push(Value::Boxed(BoxedValue::Int(1)));
        assert_eq!(
            stack.pop_int(2),
            Err(RuntimeError::type_error("int", "Integer", 2))
        );
        assert_eq!(stack.pop(3), Err(RuntimeError::StackUnderflow { position: 3 }));
    }

    #[test]
    fn test_integer_arithmetic_wraps_and_masks() {
        assert_eq!(int_arithmetic(ArithmeticOp::Add, i32::MAX, 1, 0), Ok(i32::MIN));
        assert_eq!(int_arithmetic(ArithmeticOp::Divide, i32::MIN, -1, 0), Ok(i32::MIN));
        assert_eq!(int_arithmetic(ArithmeticOp::ShiftLeft, 1, 33, 0), Ok(2));
        assert_eq!(int_arithmetic(ArithmeticOp::UnsignedShiftRight, -8, 28, 0), Ok(15));
        assert_eq!(long_arithmetic(ArithmeticOp::ShiftLeft, 1, 65, 0), Ok(2));
        assert_eq!(
            int_arithmetic(ArithmeticOp::Remainder, 1, 0, 9),
            Err(RuntimeError::division_by_zero(9))
        );
    }

    #[test]
    fn test_nan_comparisons() {
        let mut stack = OperandStack::default();
        stack.push(Value::Double(f64::NAN));
        stack.push(Value::Double(1.0));
        assert_eq!(compare(&mut stack, CompareOp::DCmpG, 0), Ok(1));
        stack.push(Value::Float(f32::NAN));
        stack.push(Value::Float(1.0));
        assert_eq!(compare(&mut stack, CompareOp::FCmpL, 0), Ok(-1));
    }
}
