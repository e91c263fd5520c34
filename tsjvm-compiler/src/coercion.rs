//! Coercion engine
//!
//! Decides, for an operator category and a pair of operand types, the
//! result type and the ordered implicit conversions each operand needs.
//! Also decides implicit assignability and explicit `as` casts. Every
//! function here is pure; failures are `None` and the caller turns them
//! into a spanned diagnostic.

use crate::types::{
    binary_numeric_promotion, unary_numeric_promotion, widens_to, PrimitiveKind, RecordConstraint,
    TypeKind,
};
use std::fmt;

/// One implicit or explicit conversion step, applied in order
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    /// Wrapper to primitive (`Integer.intValue()`)
    Unbox(PrimitiveKind),
    /// Primitive to wrapper (`Integer.valueOf(int)`)
    Box(PrimitiveKind),
    /// Primitive widening or narrowing
    Primitive {
        from: PrimitiveKind,
        to: PrimitiveKind,
    },
    /// `java.lang.Number` to a primitive via its value accessor
    NumberValue(PrimitiveKind),
    /// Checked reference downcast
    CheckCast(TypeKind),
    /// General-purpose string conversion (`String.valueOf(Object)`)
    Stringify,
}

impl Conversion {
    /// Whether a primitive conversion may lose information
    pub fn is_narrowing(&self) -> bool {
        match self {
            Conversion::Primitive { from, to } => !widens_to(*from, *to),
            _ => false,
        }
    }
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conversion::Unbox(kind) => write!(f, "unbox {}", kind.wrapper_name()),
            Conversion::Box(kind) => write!(f, "box {}", kind),
            Conversion::Primitive { from, to } => write!(f, "{} -> {}", from, to),
            Conversion::NumberValue(kind) => write!(f, "Number.{}Value", kind),
            Conversion::CheckCast(target) => write!(f, "checkcast {}", target),
            Conversion::Stringify => write!(f, "String.valueOf"),
        }
    }
}

/// Binary operator categories with distinct promotion policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorCategory {
    Arithmetic,
    Shift,
    Bitwise,
    Relational,
    LooseEquality,
    StrictEquality,
    Logical,
}

/// What the operator instruction itself works on after conversions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// Promoted numeric kind: always `Int`, `Long`, `Float` or `Double`
    Numeric(PrimitiveKind),
    /// Unboxed booleans (as ints on the stack)
    Boolean,
    /// Reference value-equality
    Reference,
    /// Comparison of a reference against the `null` literal
    NullCheck,
}

/// Outcome of coercing the operands of one binary operator
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryCoercion {
    pub category: OperatorCategory,
    pub operand: OperandKind,
    pub result_type: TypeKind,
    pub left: Vec<Conversion>,
    pub right: Vec<Conversion>,
}

/// Conversions bringing a primitive or boxed numeric value to `target`
pub fn to_primitive(from: &TypeKind, target: PrimitiveKind) -> Option<Vec<Conversion>> {
    let (source, boxed) = match from {
        TypeKind::Primitive(kind) => (*kind, false),
        TypeKind::Boxed(kind) => (*kind, true),
        _ => return None,
    };
    let mut steps = Vec::new();
    if boxed {
        steps.push(Conversion::Unbox(source));
    }
    if source != target {
        steps.push(Conversion::Primitive {
            from: source,
            to: target,
        });
    }
    Some(steps)
}

/// Coerce the operands of a binary operator in `category`
pub fn coerce_binary(
    category: OperatorCategory,
    left: &TypeKind,
    right: &TypeKind,
) -> Option<BinaryCoercion> {
    let coercion = match category {
        OperatorCategory::Arithmetic => numeric(category, left, right, None),
        OperatorCategory::Relational => numeric(category, left, right, Some(TypeKind::boolean())),
        OperatorCategory::Shift => shift(left, right),
        OperatorCategory::Bitwise => {
            if left.is_boolean() && right.is_boolean() {
                boolean(category, left, right)
            } else if left.is_integral() && right.is_integral() {
                numeric(category, left, right, None)
            } else {
                None
            }
        }
        OperatorCategory::LooseEquality | OperatorCategory::StrictEquality => {
            equality(category, left, right)
        }
        OperatorCategory::Logical => {
            if left.is_boolean() && right.is_boolean() {
                boolean(category, left, right)
            } else {
                None
            }
        }
    };
    if let Some(coercion) = &coercion {
        log::trace!(
            "{:?}: {} with {} -> {} ({:?})",
            category,
            left,
            right,
            coercion.result_type,
            coercion.operand
        );
    }
    coercion
}

fn numeric(
    category: OperatorCategory,
    left: &TypeKind,
    right: &TypeKind,
    result: Option<TypeKind>,
) -> Option<BinaryCoercion> {
    let kind = binary_numeric_promotion(left.unboxed()?, right.unboxed()?)?;
    Some(BinaryCoercion {
        category,
        operand: OperandKind::Numeric(kind),
        result_type: result.unwrap_or(TypeKind::Primitive(kind)),
        left: to_primitive(left, kind)?,
        right: to_primitive(right, kind)?,
    })
}

fn boolean(category: OperatorCategory, left: &TypeKind, right: &TypeKind) -> Option<BinaryCoercion> {
    Some(BinaryCoercion {
        category,
        operand: OperandKind::Boolean,
        result_type: TypeKind::boolean(),
        left: to_primitive(left, PrimitiveKind::Boolean)?,
        right: to_primitive(right, PrimitiveKind::Boolean)?,
    })
}

/// Each side promoted on its own; the count is always an `int`
fn shift(left: &TypeKind, right: &TypeKind) -> Option<BinaryCoercion> {
    if !left.is_integral() || !right.is_integral() {
        return None;
    }
    let kind = unary_numeric_promotion(left.unboxed()?)?;
    Some(BinaryCoercion {
        category: OperatorCategory::Shift,
        operand: OperandKind::Numeric(kind),
        result_type: TypeKind::Primitive(kind),
        left: to_primitive(left, kind)?,
        right: to_primitive(right, PrimitiveKind::Int)?,
    })
}

fn equality(category: OperatorCategory, left: &TypeKind, right: &TypeKind) -> Option<BinaryCoercion> {
    if left.is_numeric() && right.is_numeric() {
        return numeric(category, left, right, Some(TypeKind::boolean()));
    }
    if left.is_boolean() && right.is_boolean() {
        return boolean(category, left, right);
    }
    if left.is_null() || right.is_null() {
        let other = if left.is_null() { right } else { left };
        if other.is_primitive() {
            return None;
        }
        return Some(BinaryCoercion {
            category,
            operand: OperandKind::NullCheck,
            result_type: TypeKind::boolean(),
            left: Vec::new(),
            right: Vec::new(),
        });
    }
    // Value equality on references; a primitive is only comparable with a
    // supertype of its box
    let comparable = is_subtype(&left.storage(), &right.storage())
        || is_subtype(&right.storage(), &left.storage());
    if !comparable {
        return None;
    }
    Some(BinaryCoercion {
        category,
        operand: OperandKind::Reference,
        result_type: TypeKind::boolean(),
        left: box_if_primitive(left),
        right: box_if_primitive(right),
    })
}

fn box_if_primitive(kind: &TypeKind) -> Vec<Conversion> {
    match kind {
        TypeKind::Primitive(primitive) => vec![Conversion::Box(*primitive)],
        _ => Vec::new(),
    }
}

/// Reference subtyping, with no runtime conversion involved
pub fn is_subtype(from: &TypeKind, to: &TypeKind) -> bool {
    if from == to {
        return true;
    }
    match (from, to) {
        (TypeKind::Primitive(_), _) | (_, TypeKind::Primitive(_)) => false,
        (_, TypeKind::AnyObject) => true,
        (TypeKind::Null, _) => true,
        (TypeKind::Boxed(kind), target) if target.is_number_reference() => kind.is_numeric(),
        (TypeKind::Record(source), TypeKind::Record(target)) => record_is_subtype(source, target),
        (TypeKind::Array(source), TypeKind::Array(target)) => {
            is_subtype(&source.storage(), &target.storage())
        }
        _ => false,
    }
}

/// Record subtyping compares the types as stored in the container
pub fn record_is_subtype(source: &RecordConstraint, target: &RecordConstraint) -> bool {
    is_subtype(&source.key.storage(), &target.key.storage())
        && is_subtype(&source.value.storage(), &target.value.storage())
}

/// Implicit conversions making a `from` value usable where `to` is declared
pub fn assignment_conversions(from: &TypeKind, to: &TypeKind) -> Option<Vec<Conversion>> {
    if from == to {
        return Some(Vec::new());
    }
    match (from, to) {
        (TypeKind::Primitive(source), TypeKind::Primitive(target)) => {
            if widens_to(*source, *target) {
                Some(vec![Conversion::Primitive {
                    from: *source,
                    to: *target,
                }])
            } else {
                None
            }
        }
        (TypeKind::Primitive(source), TypeKind::Boxed(target)) => {
            if source == target {
                Some(vec![Conversion::Box(*source)])
            } else if widens_to(*source, *target) {
                Some(vec![
                    Conversion::Primitive {
                        from: *source,
                        to: *target,
                    },
                    Conversion::Box(*target),
                ])
            } else {
                None
            }
        }
        (TypeKind::Boxed(source), TypeKind::Primitive(target)) => {
            if source == target || widens_to(*source, *target) {
                to_primitive(from, *target)
            } else {
                None
            }
        }
        (TypeKind::Primitive(source), target) => {
            if is_subtype(&TypeKind::Boxed(*source), target) {
                Some(vec![Conversion::Box(*source)])
            } else {
                None
            }
        }
        _ => {
            if is_subtype(from, to) {
                Some(Vec::new())
            } else {
                None
            }
        }
    }
}

/// Conversions performed by an explicit `expr as Target`
pub fn cast_conversions(from: &TypeKind, to: &TypeKind) -> Option<Vec<Conversion>> {
    if from == to {
        return Some(Vec::new());
    }
    // numeric <-> numeric, with target truncation/sign-extension semantics
    if from.is_numeric() && to.is_numeric() {
        let source = from.unboxed()?;
        let target = to.unboxed()?;
        let mut steps = to_primitive(from, target)?;
        if let TypeKind::Boxed(boxed) = to {
            steps.push(Conversion::Box(*boxed));
        }
        log::trace!("cast {} as {} via {} steps", source, to, steps.len());
        return Some(steps);
    }
    if from.is_boolean() && to.is_boolean() {
        let mut steps = to_primitive(from, PrimitiveKind::Boolean)?;
        if matches!(to, TypeKind::Boxed(_)) {
            steps.push(Conversion::Box(PrimitiveKind::Boolean));
        }
        return Some(steps);
    }
    if from.is_number_reference() {
        return match to {
            TypeKind::Primitive(kind) if kind.is_numeric() => {
                Some(vec![Conversion::NumberValue(*kind)])
            }
            TypeKind::Boxed(kind) if kind.is_numeric() => {
                Some(vec![Conversion::CheckCast(to.clone())])
            }
            _ => assignment_conversions(from, to),
        };
    }
    if let Some(steps) = assignment_conversions(from, to) {
        return Some(steps);
    }
    match (from, to) {
        (_, TypeKind::Primitive(_)) | (TypeKind::Primitive(_), _) => None,
        // Erased container types convert freely within their family
        (TypeKind::Record(source), TypeKind::Record(target)) => {
            if record_is_subtype(target, source) {
                Some(Vec::new())
            } else {
                None
            }
        }
        (TypeKind::AnyObject, target) => Some(vec![Conversion::CheckCast(target.clone())]),
        (source, target) if is_subtype(target, source) => {
            Some(vec![Conversion::CheckCast(target.clone())])
        }
        _ => None,
    }
}
