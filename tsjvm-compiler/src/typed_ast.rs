//! Typed, lowered expression trees
//!
//! Every node carries its resolved `result_type`; conversions between
//! static types appear as explicit `Convert` nodes, so emission is a
//! mechanical post-order walk.

use crate::coercion::{Conversion, OperandKind};
use crate::types::{PrimitiveKind, RecordConstraint, TypeKind};
use indexmap::IndexMap;
use tsjvm_ast::Span;

/// A node of the lowered tree
#[derive(Debug, Clone, PartialEq)]
pub struct TypedExpr {
    pub kind: TypedExprKind,
    pub result_type: TypeKind,
    pub span: Span,
}

/// Compile-time constant values
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Any int-on-the-stack kind: byte, short, char, int
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    String(String),
    Null,
}

impl Constant {
    /// Decimal/string form used when a constant becomes a record key
    pub fn key_string(&self) -> String {
        match self {
            Constant::Int(value) => value.to_string(),
            Constant::Long(value) => value.to_string(),
            Constant::Float(value) => format_floating(f64::from(*value)),
            Constant::Double(value) => format_floating(*value),
            Constant::Boolean(value) => value.to_string(),
            Constant::String(value) => value.clone(),
            Constant::Null => "null".to_string(),
        }
    }
}

fn format_floating(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// A local variable slot
#[derive(Debug, Clone, PartialEq)]
pub struct LocalRef {
    pub name: String,
    pub slot: u16,
    pub declared_type: TypeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    And,
    Or,
    Xor,
    ShiftLeft,
    ShiftRight,
    UnsignedShiftRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl ComparisonOp {
    pub fn negate(self) -> Self {
        match self {
            ComparisonOp::Equal => ComparisonOp::NotEqual,
            ComparisonOp::NotEqual => ComparisonOp::Equal,
            ComparisonOp::Less => ComparisonOp::GreaterEqual,
            ComparisonOp::LessEqual => ComparisonOp::Greater,
            ComparisonOp::Greater => ComparisonOp::LessEqual,
            ComparisonOp::GreaterEqual => ComparisonOp::Less,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedExprKind {
    Constant(Constant),
    Local(LocalRef),
    Convert {
        operand: Box<TypedExpr>,
        conversion: Conversion,
    },
    /// Arithmetic, bitwise and shift operators on a promoted kind
    Arithmetic {
        op: ArithmeticOp,
        operand: PrimitiveKind,
        left: Box<TypedExpr>,
        right: Box<TypedExpr>,
    },
    /// `**`, both operands already `double`
    Power {
        left: Box<TypedExpr>,
        right: Box<TypedExpr>,
    },
    Negate {
        operand: PrimitiveKind,
        value: Box<TypedExpr>,
    },
    BitwiseNot {
        operand: PrimitiveKind,
        value: Box<TypedExpr>,
    },
    Not(Box<TypedExpr>),
    Compare {
        op: ComparisonOp,
        operand: OperandKind,
        left: Box<TypedExpr>,
        right: Box<TypedExpr>,
    },
    /// Short-circuit `&&` / `||`
    Logical {
        op: LogicalOp,
        left: Box<TypedExpr>,
        right: Box<TypedExpr>,
    },
    /// String concatenation; both sides already `String`
    Concat {
        left: Box<TypedExpr>,
        right: Box<TypedExpr>,
    },
    /// `++`/`--` on a local, computed in the local's declared type
    Update {
        local: LocalRef,
        delta: i8,
        prefix: bool,
    },
    /// Store into a local; evaluates to the stored value
    Assign {
        local: LocalRef,
        value: Box<TypedExpr>,
    },
    Conditional {
        condition: Box<TypedExpr>,
        consequent: Box<TypedExpr>,
        alternate: Box<TypedExpr>,
    },
    Record(ConstructionPlan),
    List(Vec<TypedExpr>),
}

impl TypedExpr {
    pub fn new(kind: TypedExprKind, result_type: TypeKind, span: Span) -> Self {
        Self {
            kind,
            result_type,
            span,
        }
    }

    pub fn constant(value: Constant, result_type: TypeKind, span: Span) -> Self {
        Self::new(TypedExprKind::Constant(value), result_type, span)
    }

    /// Wrap `self` in the given conversions, outermost last
    pub fn convert(self, conversions: Vec<Conversion>) -> TypedExpr {
        conversions.into_iter().fold(self, |expr, conversion| {
            let result_type = converted_type(&conversion);
            let span = expr.span;
            TypedExpr::new(
                TypedExprKind::Convert {
                    operand: Box::new(expr),
                    conversion,
                },
                result_type,
                span,
            )
        })
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match &self.kind {
            TypedExprKind::Constant(constant) => Some(constant),
            _ => None,
        }
    }

    /// The constant underneath any boxing/widening wrappers
    pub fn innermost_constant(&self) -> Option<&Constant> {
        match &self.kind {
            TypedExprKind::Constant(constant) => Some(constant),
            TypedExprKind::Convert { operand, .. } => operand.innermost_constant(),
            _ => None,
        }
    }
}

/// Static type produced by a conversion
pub fn converted_type(conversion: &Conversion) -> TypeKind {
    match conversion {
        Conversion::Unbox(kind) => TypeKind::Primitive(*kind),
        Conversion::Box(kind) => TypeKind::Boxed(*kind),
        Conversion::Primitive { to, .. } => TypeKind::Primitive(*to),
        Conversion::NumberValue(kind) => TypeKind::Primitive(*kind),
        Conversion::CheckCast(target) => target.clone(),
        Conversion::Stringify => TypeKind::string(),
    }
}

/// How an entry's key was written in the literal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyForm {
    Literal,
    Computed,
    Shorthand,
    Spread,
}

/// Resolved key of an insert
#[derive(Debug, Clone, PartialEq)]
pub enum PlanKey {
    /// A literal key already coerced to the container's key type
    Constant {
        value: Constant,
        key_type: TypeKind,
    },
    /// A computed key expression, converted to the stored key type
    Computed(TypedExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanEntryKind {
    Insert {
        key: PlanKey,
        /// Value converted to its stored (reference) type
        value: TypedExpr,
        key_type: TypeKind,
        value_type: TypeKind,
    },
    Spread {
        source: TypedExpr,
        key_type: TypeKind,
        value_type: TypeKind,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanEntry {
    pub source_order: usize,
    pub form: KeyForm,
    pub kind: PlanEntryKind,
    pub span: Span,
}

/// Validated, ordered construction of one object literal
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructionPlan {
    /// Static type of the container being built
    pub record_type: RecordConstraint,
    /// Whether a declared constraint was enforced
    pub constrained: bool,
    pub entries: Vec<PlanEntry>,
    pub span: Span,
}

impl ConstructionPlan {
    /// Keys resolvable at compile time, in container order, each mapped to
    /// the value that wins. Nested literal spreads are flattened. `None`
    /// when a computed key or a non-literal spread makes the layout
    /// depend on runtime values.
    pub fn static_layout(&self) -> Option<IndexMap<String, &TypedExpr>> {
        let mut layout = IndexMap::new();
        self.collect_layout(&mut layout)?;
        Some(layout)
    }

    fn collect_layout<'a>(&'a self, layout: &mut IndexMap<String, &'a TypedExpr>) -> Option<()> {
        for entry in &self.entries {
            match &entry.kind {
                PlanEntryKind::Insert {
                    key: PlanKey::Constant { value: key, .. },
                    value,
                    ..
                } => {
                    // IndexMap::insert keeps the original position of a key
                    layout.insert(key.key_string(), value);
                }
                PlanEntryKind::Insert {
                    key: PlanKey::Computed(_),
                    ..
                } => return None,
                PlanEntryKind::Spread { source, .. } => match &source.kind {
                    TypedExprKind::Record(nested) => nested.collect_layout(layout)?,
                    _ => return None,
                },
            }
        }
        Some(())
    }
}
