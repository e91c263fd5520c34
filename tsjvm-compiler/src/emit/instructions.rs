//! Symbolic target instructions
//!
//! Branch targets are labels and pool references are indices; a separate
//! assembly stage resolves both to offsets.

use crate::emit::constant_pool::{ConstantIndex, ConstantPool};
use crate::typed_ast::{ArithmeticOp, ComparisonOp};
use crate::types::StackKind;
use std::fmt;

/// Branch target, placed with `Instruction::Label`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub u32);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Branch condition of `if<cond>` / `if_icmp<cond>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Eq,
    Ne,
    Lt,
    Ge,
    Gt,
    Le,
}

impl Condition {
    pub fn from_comparison(op: ComparisonOp) -> Self {
        match op {
            ComparisonOp::Equal => Condition::Eq,
            ComparisonOp::NotEqual => Condition::Ne,
            ComparisonOp::Less => Condition::Lt,
            ComparisonOp::LessEqual => Condition::Le,
            ComparisonOp::Greater => Condition::Gt,
            ComparisonOp::GreaterEqual => Condition::Ge,
        }
    }

    /// Whether the condition holds for a comparison result (`-1`, `0`, `1`)
    pub fn holds(self, ordering: i32) -> bool {
        match self {
            Condition::Eq => ordering == 0,
            Condition::Ne => ordering != 0,
            Condition::Lt => ordering < 0,
            Condition::Ge => ordering >= 0,
            Condition::Gt => ordering > 0,
            Condition::Le => ordering <= 0,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Condition::Eq => "eq",
            Condition::Ne => "ne",
            Condition::Lt => "lt",
            Condition::Ge => "ge",
            Condition::Gt => "gt",
            Condition::Le => "le",
        }
    }
}

/// Primitive conversion opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveConversion {
    I2L,
    I2F,
    I2D,
    L2I,
    L2F,
    L2D,
    F2I,
    F2L,
    F2D,
    D2I,
    D2L,
    D2F,
    I2B,
    I2C,
    I2S,
}

impl PrimitiveConversion {
    /// Stack kinds consumed and produced
    pub fn kinds(self) -> (StackKind, StackKind) {
        use PrimitiveConversion::*;
        use StackKind::{Double, Float, Int, Long};
        match self {
            I2L => (Int, Long),
            I2F => (Int, Float),
            I2D => (Int, Double),
            L2I => (Long, Int),
            L2F => (Long, Float),
            L2D => (Long, Double),
            F2I => (Float, Int),
            F2L => (Float, Long),
            F2D => (Float, Double),
            D2I => (Double, Int),
            D2L => (Double, Long),
            D2F => (Double, Float),
            I2B | I2C | I2S => (Int, Int),
        }
    }

    /// Conversion between two stack kinds, if one exists
    pub fn between(from: StackKind, to: StackKind) -> Option<Self> {
        use PrimitiveConversion::*;
        use StackKind::{Double, Float, Int, Long};
        Some(match (from, to) {
            (Int, Long) => I2L,
            (Int, Float) => I2F,
            (Int, Double) => I2D,
            (Long, Int) => L2I,
            (Long, Float) => L2F,
            (Long, Double) => L2D,
            (Float, Int) => F2I,
            (Float, Long) => F2L,
            (Float, Double) => F2D,
            (Double, Int) => D2I,
            (Double, Long) => D2L,
            (Double, Float) => D2F,
            _ => return None,
        })
    }

    pub fn mnemonic(self) -> &'static str {
        use PrimitiveConversion::*;
        match self {
            I2L => "i2l",
            I2F => "i2f",
            I2D => "i2d",
            L2I => "l2i",
            L2F => "l2f",
            L2D => "l2d",
            F2I => "f2i",
            F2L => "f2l",
            F2D => "f2d",
            D2I => "d2i",
            D2L => "d2l",
            D2F => "d2f",
            I2B => "i2b",
            I2C => "i2c",
            I2S => "i2s",
        }
    }
}

/// Three-way comparisons producing `-1`, `0` or `1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    LCmp,
    /// NaN compares as less
    FCmpL,
    /// NaN compares as greater
    FCmpG,
    DCmpL,
    DCmpG,
}

impl CompareOp {
    pub fn operand_kind(self) -> StackKind {
        match self {
            CompareOp::LCmp => StackKind::Long,
            CompareOp::FCmpL | CompareOp::FCmpG => StackKind::Float,
            CompareOp::DCmpL | CompareOp::DCmpG => StackKind::Double,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            CompareOp::LCmp => "lcmp",
            CompareOp::FCmpL => "fcmpl",
            CompareOp::FCmpG => "fcmpg",
            CompareOp::DCmpL => "dcmpl",
            CompareOp::DCmpG => "dcmpg",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    AConstNull,
    /// `iconst_<n>` for -1..=5
    IConst(i32),
    BiPush(i8),
    SiPush(i16),
    /// `lconst_0` / `lconst_1`
    LConst(i64),
    /// `fconst_0` / `fconst_1` / `fconst_2`
    FConst(f32),
    /// `dconst_0` / `dconst_1`
    DConst(f64),
    /// Single-slot pool constant (int, float, string)
    Ldc(ConstantIndex),
    /// Two-slot pool constant (long, double)
    Ldc2W(ConstantIndex),
    Load(StackKind, u16),
    Store(StackKind, u16),
    IInc { slot: u16, delta: i16 },
    Arithmetic(ArithmeticOp, StackKind),
    Neg(StackKind),
    Convert(PrimitiveConversion),
    Compare(CompareOp),
    /// Compare the int on top of the stack against zero
    If(Condition, Label),
    IfICmp(Condition, Label),
    IfNull(Label),
    IfNonNull(Label),
    Goto(Label),
    Label(Label),
    Dup,
    Dup2,
    DupX1,
    DupX2,
    Dup2X1,
    Dup2X2,
    Pop,
    Pop2,
    Swap,
    New(ConstantIndex),
    CheckCast(ConstantIndex),
    InvokeStatic(ConstantIndex),
    InvokeVirtual(ConstantIndex),
    InvokeSpecial(ConstantIndex),
    InvokeInterface(ConstantIndex),
}

impl Instruction {
    /// Branch target of a jump, if this is one
    pub fn branch_target(&self) -> Option<Label> {
        match self {
            Instruction::If(_, label)
            | Instruction::IfICmp(_, label)
            | Instruction::IfNull(label)
            | Instruction::IfNonNull(label)
            | Instruction::Goto(label) => Some(*label),
            _ => None,
        }
    }

    /// Pool operand, if this instruction has one
    pub fn constant_index(&self) -> Option<ConstantIndex> {
        match self {
            Instruction::Ldc(index)
            | Instruction::Ldc2W(index)
            | Instruction::New(index)
            | Instruction::CheckCast(index)
            | Instruction::InvokeStatic(index)
            | Instruction::InvokeVirtual(index)
            | Instruction::InvokeSpecial(index)
            | Instruction::InvokeInterface(index) => Some(*index),
            _ => None,
        }
    }

    /// Opcode name without operands
    pub fn mnemonic(&self) -> String {
        match self {
            Instruction::AConstNull => "aconst_null".to_string(),
            Instruction::IConst(-1) => "iconst_m1".to_string(),
            Instruction::IConst(value) => format!("iconst_{}", value),
            Instruction::BiPush(_) => "bipush".to_string(),
            Instruction::SiPush(_) => "sipush".to_string(),
            Instruction::LConst(value) => format!("lconst_{}", value),
            Instruction::FConst(value) => format!("fconst_{}", *value as i32),
            Instruction::DConst(value) => format!("dconst_{}", *value as i32),
            Instruction::Ldc(_) => "ldc".to_string(),
            Instruction::Ldc2W(_) => "ldc2_w".to_string(),
            Instruction::Load(kind, slot) if *slot <= 3 => format!("{}load_{}", kind.prefix(), slot),
            Instruction::Load(kind, _) => format!("{}load", kind.prefix()),
            Instruction::Store(kind, slot) if *slot <= 3 => {
                format!("{}store_{}", kind.prefix(), slot)
            }
            Instruction::Store(kind, _) => format!("{}store", kind.prefix()),
            Instruction::IInc { .. } => "iinc".to_string(),
            Instruction::Arithmetic(op, kind) => format!("{}{}", kind.prefix(), arithmetic_suffix(*op)),
            Instruction::Neg(kind) => format!("{}neg", kind.prefix()),
            Instruction::Convert(conversion) => conversion.mnemonic().to_string(),
            Instruction::Compare(op) => op.mnemonic().to_string(),
            Instruction::If(condition, _) => format!("if{}", condition.suffix()),
            Instruction::IfICmp(condition, _) => format!("if_icmp{}", condition.suffix()),
            Instruction::IfNull(_) => "ifnull".to_string(),
            Instruction::IfNonNull(_) => "ifnonnull".to_string(),
            Instruction::Goto(_) => "goto".to_string(),
            Instruction::Label(label) => format!("{}:", label),
            Instruction::Dup => "dup".to_string(),
            Instruction::Dup2 => "dup2".to_string(),
            Instruction::DupX1 => "dup_x1".to_string(),
            Instruction::DupX2 => "dup_x2".to_string(),
            Instruction::Dup2X1 => "dup2_x1".to_string(),
            Instruction::Dup2X2 => "dup2_x2".to_string(),
            Instruction::Pop => "pop".to_string(),
            Instruction::Pop2 => "pop2".to_string(),
            Instruction::Swap => "swap".to_string(),
            Instruction::New(_) => "new".to_string(),
            Instruction::CheckCast(_) => "checkcast".to_string(),
            Instruction::InvokeStatic(_) => "invokestatic".to_string(),
            Instruction::InvokeVirtual(_) => "invokevirtual".to_string(),
            Instruction::InvokeSpecial(_) => "invokespecial".to_string(),
            Instruction::InvokeInterface(_) => "invokeinterface".to_string(),
        }
    }

    /// Render with pool operands resolved (`invokestatic java/lang/Integer.valueOf(I)Ljava/lang/Integer;`)
    pub fn render(&self, pool: &ConstantPool) -> String {
        let mnemonic = self.mnemonic();
        if let Some(index) = self.constant_index() {
            return match pool.get(index) {
                Some(entry) => format!("{} {}", mnemonic, entry),
                None => format!("{} {}", mnemonic, index),
            };
        }
        match self {
            Instruction::BiPush(value) => format!("{} {}", mnemonic, value),
            Instruction::SiPush(value) => format!("{} {}", mnemonic, value),
            Instruction::Load(_, slot) | Instruction::Store(_, slot) if *slot > 3 => {
                format!("{} {}", mnemonic, slot)
            }
            Instruction::IInc { slot, delta } => format!("{} {} {}", mnemonic, slot, delta),
            _ => match self.branch_target() {
                Some(label) => format!("{} {}", mnemonic, label),
                None => mnemonic,
            },
        }
    }
}

fn arithmetic_suffix(op: ArithmeticOp) -> &'static str {
    match op {
        ArithmeticOp::Add => "add",
        ArithmeticOp::Subtract => "sub",
        ArithmeticOp::Multiply => "mul",
        ArithmeticOp::Divide => "div",
        ArithmeticOp::Remainder => "rem",
        ArithmeticOp::And => "and",
        ArithmeticOp::Or => "or",
        ArithmeticOp::Xor => "xor",
        ArithmeticOp::ShiftLeft => "shl",
        ArithmeticOp::ShiftRight => "shr",
        ArithmeticOp::UnsignedShiftRight => "ushr",
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = self.mnemonic();
        if let Some(index) = self.constant_index() {
            return write!(f, "{} {}", mnemonic, index);
        }
        match self.branch_target() {
            Some(label) => write!(f, "{} {}", mnemonic, label),
            None => write!(f, "{}", mnemonic),
        }
    }
}
