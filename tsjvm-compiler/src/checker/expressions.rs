//! Expression compilation
//!
//! This module lowers expression nodes into typed trees:
//! - Literals and local variable references
//! - Binary, unary, update and assignment expressions under the coercion rules
//! - Conditional expressions with branch type unification
//! - Explicit `as` casts and array literals
//!
//! Operands are always compiled left to right, each exactly once, and the
//! first failure aborts the enclosing expression.

use crate::checker::context::CompilationContext;
use crate::checker::records::RecordCompiler;
use crate::coercion::{
    assignment_conversions, cast_conversions, coerce_binary, is_subtype, to_primitive, Conversion,
    OperandKind, OperatorCategory,
};
use crate::error::{CompileError, CompileResult};
use crate::typed_ast::{
    ArithmeticOp, ComparisonOp, Constant, LogicalOp, TypedExpr, TypedExprKind,
};
use crate::types::{
    binary_numeric_promotion, resolve_annotation, unary_numeric_promotion, PrimitiveKind,
    TypeKind,
};
use tsjvm_ast::{
    ArrayLiteral, Assignment, BinaryOperation, BinaryOperator, CastExpression,
    ConditionalExpression, Expression, ExpressionKind, Span, UnaryOperation, UnaryOperator,
    UpdateExpression, UpdateOperator,
};

/// Builds the diagnostic for a value of type `found` where `expected` is required
pub type MismatchFn<'f> = &'f dyn Fn(&TypeKind, &TypeKind, Span) -> CompileError;

/// Expression compiler
pub struct ExpressionCompiler;

impl ExpressionCompiler {
    /// Compile an expression into a typed tree
    pub fn compile(context: &mut CompilationContext, expr: &Expression) -> CompileResult<TypedExpr> {
        Self::compile_with_hint(context, expr, None)
    }

    /// Compile an expression whose value flows into a slot of type `hint`.
    /// The hint shapes literals (record constraints, array element types)
    /// but does not convert the result.
    pub fn compile_with_hint(
        context: &mut CompilationContext,
        expr: &Expression,
        hint: Option<&TypeKind>,
    ) -> CompileResult<TypedExpr> {
        match &expr.kind {
            ExpressionKind::Integer(literal) => Ok(Self::integer_literal(literal.value, expr.span)),
            ExpressionKind::Float(literal) => Ok(TypedExpr::constant(
                Constant::Double(literal.value),
                TypeKind::double(),
                expr.span,
            )),
            ExpressionKind::String(literal) => Ok(TypedExpr::constant(
                Constant::String(literal.value.clone()),
                TypeKind::string(),
                expr.span,
            )),
            ExpressionKind::Boolean(literal) => Ok(TypedExpr::constant(
                Constant::Boolean(literal.value),
                TypeKind::boolean(),
                expr.span,
            )),
            ExpressionKind::Null(_) => Ok(TypedExpr::constant(
                Constant::Null,
                TypeKind::Null,
                expr.span,
            )),
            ExpressionKind::Identifier(identifier) => {
                let local = context.lookup(&identifier.name, expr.span)?;
                Ok(TypedExpr::new(
                    TypedExprKind::Local(local.to_ref()),
                    local.declared_type.clone(),
                    expr.span,
                ))
            }
            ExpressionKind::BinaryOp(operation) => Self::compile_binary(context, operation),
            ExpressionKind::UnaryOp(operation) => Self::compile_unary(context, operation),
            ExpressionKind::Update(update) => Self::compile_update(context, update),
            ExpressionKind::Assignment(assignment) => Self::compile_assignment(context, assignment),
            ExpressionKind::Conditional(conditional) => {
                Self::compile_conditional(context, conditional, hint)
            }
            ExpressionKind::Cast(cast) => Self::compile_cast(context, cast),
            ExpressionKind::Object(literal) => {
                RecordCompiler::compile(context, literal, hint.and_then(TypeKind::as_record))
            }
            ExpressionKind::Array(literal) => {
                let element = match hint {
                    Some(TypeKind::Array(element)) => Some(element.as_ref()),
                    _ => None,
                };
                Self::compile_array(context, literal, element, &|expected, found, span| {
                    CompileError::type_mismatch("array element", expected, found, span)
                })
            }
            ExpressionKind::Symbol(symbol) => Err(CompileError::unsupported_expression(
                format!("symbol '{}' has no value representation", symbol.description),
                expr.span,
            )),
            ExpressionKind::Parenthesized(inner) => {
                let typed = Self::compile_with_hint(context, inner, hint)?;
                Ok(TypedExpr { span: expr.span, ..typed })
            }
        }
    }

    /// Compile `expr` for a slot declared as `target`, applying constant
    /// narrowing and implicit conversions. `mismatch` builds the error when
    /// no conversion exists.
    pub fn compile_to(
        context: &mut CompilationContext,
        expr: &Expression,
        target: &TypeKind,
        mismatch: MismatchFn,
    ) -> CompileResult<TypedExpr> {
        if let Some(narrowed) = Self::narrowed_constant(expr, target) {
            return Ok(narrowed);
        }
        let typed = Self::compile_with_hint(context, expr, Some(target))?;
        let span = typed.span;
        let found = typed.result_type.clone();
        Self::coerce(typed, target).ok_or_else(|| mismatch(target, &found, span))
    }

    /// Apply the implicit conversions from `typed`'s type to `target`
    pub fn coerce(typed: TypedExpr, target: &TypeKind) -> Option<TypedExpr> {
        let conversions = assignment_conversions(&typed.result_type, target)?;
        Some(typed.convert(conversions))
    }

    /// Integer literals are `int` when they fit, `long` otherwise
    fn integer_literal(value: i64, span: Span) -> TypedExpr {
        match i32::try_from(value) {
            Ok(value) => TypedExpr::constant(Constant::Int(value), TypeKind::int(), span),
            Err(_) => TypedExpr::constant(Constant::Long(value), TypeKind::long(), span),
        }
    }

    /// A literal constant assigned to a narrower declared kind keeps its
    /// value when it fits (`const b: byte = 127`, `const c: char = 'A'`)
    fn narrowed_constant(expr: &Expression, target: &TypeKind) -> Option<TypedExpr> {
        let kind = target.unboxed()?;
        let span = expr.span;
        let constant = match Self::literal_number(expr) {
            Some(LiteralNumber::Integral(value)) if kind.is_integral() => {
                if !kind.fits(value) {
                    return None;
                }
                match kind {
                    PrimitiveKind::Long => Constant::Long(value),
                    _ => Constant::Int(value as i32),
                }
            }
            Some(LiteralNumber::Integral(value)) if kind == PrimitiveKind::Float => {
                Constant::Float(value as f32)
            }
            Some(LiteralNumber::Integral(value)) if kind == PrimitiveKind::Double => {
                Constant::Double(value as f64)
            }
            Some(LiteralNumber::Floating(value)) if kind == PrimitiveKind::Float => {
                Constant::Float(value as f32)
            }
            Some(LiteralNumber::Floating(value)) if kind == PrimitiveKind::Double => {
                Constant::Double(value)
            }
            Some(_) => return None,
            None => match &expr.unparenthesized().kind {
                ExpressionKind::String(literal) if kind == PrimitiveKind::Char => {
                    let mut units = literal.value.encode_utf16();
                    match (units.next(), units.next()) {
                        (Some(unit), None) => Constant::Int(i32::from(unit)),
                        _ => return None,
                    }
                }
                _ => return None,
            },
        };
        let typed = TypedExpr::constant(constant, TypeKind::Primitive(kind), span);
        Some(match target {
            TypeKind::Boxed(boxed) => typed.convert(vec![Conversion::Box(*boxed)]),
            _ => typed,
        })
    }

    /// Numeric literal value, looking through parentheses and unary signs
    pub(crate) fn literal_number(expr: &Expression) -> Option<LiteralNumber> {
        match &expr.unparenthesized().kind {
            ExpressionKind::Integer(literal) => Some(LiteralNumber::Integral(literal.value)),
            ExpressionKind::Float(literal) => Some(LiteralNumber::Floating(literal.value)),
            ExpressionKind::UnaryOp(UnaryOperation {
                operator: UnaryOperator::Minus,
                operand,
                ..
            }) => match Self::literal_number(operand)? {
                LiteralNumber::Integral(value) => value.checked_neg().map(LiteralNumber::Integral),
                LiteralNumber::Floating(value) => Some(LiteralNumber::Floating(-value)),
            },
            ExpressionKind::UnaryOp(UnaryOperation {
                operator: UnaryOperator::Plus,
                operand,
                ..
            }) => Self::literal_number(operand),
            _ => None,
        }
    }

    fn category(operator: BinaryOperator, span: Span) -> CompileResult<OperatorCategory> {
        use BinaryOperator::*;
        Ok(match operator {
            Add | Subtract | Multiply | Divide | Modulo | Exponent => OperatorCategory::Arithmetic,
            ShiftLeft | ShiftRight | UnsignedShiftRight => OperatorCategory::Shift,
            BitwiseAnd | BitwiseOr | BitwiseXor => OperatorCategory::Bitwise,
            Less | LessEqual | Greater | GreaterEqual => OperatorCategory::Relational,
            Equal | NotEqual => OperatorCategory::LooseEquality,
            StrictEqual | StrictNotEqual => OperatorCategory::StrictEquality,
            LogicalAnd | LogicalOr => OperatorCategory::Logical,
            NullishCoalescing | In | InstanceOf => {
                return Err(CompileError::unsupported_operator(operator.as_str(), span))
            }
        })
    }

    fn compile_binary(
        context: &mut CompilationContext,
        operation: &BinaryOperation,
    ) -> CompileResult<TypedExpr> {
        // Reject unsupported operators before compiling operands
        Self::category(operation.operator, operation.span)?;
        let left = Self::compile(context, &operation.left)?;
        let right = Self::compile(context, &operation.right)?;
        Self::combine(operation.operator, left, right, operation.span)
    }

    /// Apply a binary operator to two already-compiled operands
    pub(crate) fn combine(
        operator: BinaryOperator,
        left: TypedExpr,
        right: TypedExpr,
        span: Span,
    ) -> CompileResult<TypedExpr> {
        let category = Self::category(operator, span)?;

        if operator == BinaryOperator::Add
            && (left.result_type.is_string() || right.result_type.is_string())
        {
            return Ok(Self::concat(left, right, span));
        }

        if operator == BinaryOperator::Exponent {
            return Self::power(left, right, span);
        }

        let coercion = coerce_binary(category, &left.result_type, &right.result_type).ok_or_else(
            || {
                CompileError::type_mismatch(
                    format!("'{}' operands", operator),
                    &left.result_type,
                    &right.result_type,
                    span,
                )
            },
        )?;
        let left = Box::new(left.convert(coercion.left));
        let right = Box::new(right.convert(coercion.right));

        let kind = match category {
            OperatorCategory::Arithmetic | OperatorCategory::Shift | OperatorCategory::Bitwise => {
                let operand = match coercion.operand {
                    OperandKind::Numeric(kind) => kind,
                    _ => PrimitiveKind::Boolean,
                };
                TypedExprKind::Arithmetic {
                    op: Self::arithmetic_op(operator),
                    operand,
                    left,
                    right,
                }
            }
            OperatorCategory::Relational
            | OperatorCategory::LooseEquality
            | OperatorCategory::StrictEquality => TypedExprKind::Compare {
                op: Self::comparison_op(operator),
                operand: coercion.operand,
                left,
                right,
            },
            OperatorCategory::Logical => TypedExprKind::Logical {
                op: if operator == BinaryOperator::LogicalAnd {
                    LogicalOp::And
                } else {
                    LogicalOp::Or
                },
                left,
                right,
            },
        };
        Ok(TypedExpr::new(kind, coercion.result_type, span))
    }

    fn arithmetic_op(operator: BinaryOperator) -> ArithmeticOp {
        match operator {
            BinaryOperator::Subtract => ArithmeticOp::Subtract,
            BinaryOperator::Multiply => ArithmeticOp::Multiply,
            BinaryOperator::Divide => ArithmeticOp::Divide,
            BinaryOperator::Modulo => ArithmeticOp::Remainder,
            BinaryOperator::BitwiseAnd => ArithmeticOp::And,
            BinaryOperator::BitwiseOr => ArithmeticOp::Or,
            BinaryOperator::BitwiseXor => ArithmeticOp::Xor,
            BinaryOperator::ShiftLeft => ArithmeticOp::ShiftLeft,
            BinaryOperator::ShiftRight => ArithmeticOp::ShiftRight,
            BinaryOperator::UnsignedShiftRight => ArithmeticOp::UnsignedShiftRight,
            _ => ArithmeticOp::Add,
        }
    }

    fn comparison_op(operator: BinaryOperator) -> ComparisonOp {
        match operator {
            BinaryOperator::NotEqual | BinaryOperator::StrictNotEqual => ComparisonOp::NotEqual,
            BinaryOperator::Less => ComparisonOp::Less,
            BinaryOperator::LessEqual => ComparisonOp::LessEqual,
            BinaryOperator::Greater => ComparisonOp::Greater,
            BinaryOperator::GreaterEqual => ComparisonOp::GreaterEqual,
            _ => ComparisonOp::Equal,
        }
    }

    /// Operands other than string literals go through `String.valueOf`, so
    /// a null string operand prints as `null`
    fn concat(left: TypedExpr, right: TypedExpr, span: Span) -> TypedExpr {
        let left = Self::stringified(left);
        let right = Self::stringified(right);
        TypedExpr::new(
            TypedExprKind::Concat {
                left: Box::new(left),
                right: Box::new(right),
            },
            TypeKind::string(),
            span,
        )
    }

    /// Box a primitive value in its own kind; references pass through
    pub(crate) fn boxed(typed: TypedExpr) -> TypedExpr {
        match &typed.result_type {
            TypeKind::Primitive(kind) => {
                let kind = *kind;
                typed.convert(vec![Conversion::Box(kind)])
            }
            _ => typed,
        }
    }

    pub(crate) fn stringified(typed: TypedExpr) -> TypedExpr {
        match &typed.result_type {
            _ if matches!(typed.kind, TypedExprKind::Constant(Constant::String(_))) => typed,
            TypeKind::Primitive(primitive) => {
                let primitive = *primitive;
                typed.convert(vec![Conversion::Box(primitive), Conversion::Stringify])
            }
            _ => typed.convert(vec![Conversion::Stringify]),
        }
    }

    fn power(left: TypedExpr, right: TypedExpr, span: Span) -> CompileResult<TypedExpr> {
        let mismatch = || {
            CompileError::type_mismatch("'**' operands", &left.result_type, &right.result_type, span)
        };
        let left_steps = to_primitive(&left.result_type, PrimitiveKind::Double)
            .filter(|_| left.result_type.is_numeric())
            .ok_or_else(mismatch)?;
        let right_steps = to_primitive(&right.result_type, PrimitiveKind::Double)
            .filter(|_| right.result_type.is_numeric())
            .ok_or_else(mismatch)?;
        Ok(TypedExpr::new(
            TypedExprKind::Power {
                left: Box::new(left.convert(left_steps)),
                right: Box::new(right.convert(right_steps)),
            },
            TypeKind::double(),
            span,
        ))
    }

    fn compile_unary(
        context: &mut CompilationContext,
        operation: &UnaryOperation,
    ) -> CompileResult<TypedExpr> {
        let span = operation.span;
        if matches!(
            operation.operator,
            UnaryOperator::TypeOf | UnaryOperator::Void | UnaryOperator::Delete
        ) {
            return Err(CompileError::unsupported_operator(
                operation.operator.as_str().trim(),
                span,
            ));
        }
        let operand = Self::compile(context, &operation.operand)?;
        let found = operand.result_type.clone();
        let mismatch = |expected: &str| {
            CompileError::type_mismatch(
                format!("'{}' operand", operation.operator.as_str()),
                expected,
                &found,
                span,
            )
        };

        match operation.operator {
            UnaryOperator::LogicalNot => {
                if !found.is_boolean() {
                    return Err(mismatch("boolean"));
                }
                let steps = to_primitive(&found, PrimitiveKind::Boolean).ok_or_else(|| mismatch("boolean"))?;
                Ok(TypedExpr::new(
                    TypedExprKind::Not(Box::new(operand.convert(steps))),
                    TypeKind::boolean(),
                    span,
                ))
            }
            UnaryOperator::Plus | UnaryOperator::Minus => {
                let kind = found
                    .unboxed()
                    .filter(|kind| kind.is_numeric())
                    .and_then(unary_numeric_promotion)
                    .ok_or_else(|| mismatch("numeric"))?;
                let steps = to_primitive(&found, kind).ok_or_else(|| mismatch("numeric"))?;
                let promoted = operand.convert(steps);
                if operation.operator == UnaryOperator::Plus {
                    return Ok(TypedExpr { span, ..promoted });
                }
                Ok(TypedExpr::new(
                    TypedExprKind::Negate {
                        operand: kind,
                        value: Box::new(promoted),
                    },
                    TypeKind::Primitive(kind),
                    span,
                ))
            }
            _ => {
                let kind = found
                    .unboxed()
                    .filter(|kind| kind.is_integral())
                    .and_then(unary_numeric_promotion)
                    .ok_or_else(|| mismatch("integral"))?;
                let steps = to_primitive(&found, kind).ok_or_else(|| mismatch("integral"))?;
                Ok(TypedExpr::new(
                    TypedExprKind::BitwiseNot {
                        operand: kind,
                        value: Box::new(operand.convert(steps)),
                    },
                    TypeKind::Primitive(kind),
                    span,
                ))
            }
        }
    }

    /// Resolve the local variable an update or assignment writes to
    fn assignment_target(
        context: &CompilationContext,
        target: &Expression,
    ) -> CompileResult<crate::typed_ast::LocalRef> {
        match &target.unparenthesized().kind {
            ExpressionKind::Identifier(identifier) => {
                Ok(context.lookup(&identifier.name, target.span)?.to_ref())
            }
            _ => Err(CompileError::InvalidAssignmentTarget {
                target: target.to_string(),
                span: target.span.into(),
            }),
        }
    }

    fn compile_update(
        context: &mut CompilationContext,
        update: &UpdateExpression,
    ) -> CompileResult<TypedExpr> {
        let local = Self::assignment_target(context, &update.argument)?;
        if !local.declared_type.is_numeric() {
            let symbol = match update.operator {
                UpdateOperator::Increment => "++",
                UpdateOperator::Decrement => "--",
            };
            return Err(CompileError::type_mismatch(
                format!("'{}' operand", symbol),
                "numeric",
                &local.declared_type,
                update.span,
            ));
        }
        let result_type = local.declared_type.clone();
        Ok(TypedExpr::new(
            TypedExprKind::Update {
                local,
                delta: match update.operator {
                    UpdateOperator::Increment => 1,
                    UpdateOperator::Decrement => -1,
                },
                prefix: update.prefix,
            },
            result_type,
            update.span,
        ))
    }

    fn compile_assignment(
        context: &mut CompilationContext,
        assignment: &Assignment,
    ) -> CompileResult<TypedExpr> {
        let local = Self::assignment_target(context, &assignment.target)?;
        let declared = local.declared_type.clone();
        let span = assignment.span;

        let value = match assignment.operator.binary_operator() {
            None => {
                let name = local.name.clone();
                Self::compile_to(context, &assignment.value, &declared, &|expected, found, span| {
                    CompileError::type_mismatch(format!("assignment to {}", name), expected, found, span)
                })?
            }
            Some(operator) => {
                // The variable is read before the right-hand side is evaluated
                let current = TypedExpr::new(
                    TypedExprKind::Local(local.clone()),
                    declared.clone(),
                    assignment.target.span,
                );
                let rhs = Self::compile(context, &assignment.value)?;
                let combined = Self::combine(operator, current, rhs, span)?;
                let found = combined.result_type.clone();
                // Compound assignment narrows back to the declared type
                let steps = assignment_conversions(&found, &declared)
                    .or_else(|| {
                        if found.is_numeric() && declared.is_numeric() {
                            cast_conversions(&found, &declared)
                        } else {
                            None
                        }
                    })
                    .ok_or_else(|| {
                        CompileError::type_mismatch(
                            format!("'{}' assignment to {}", assignment.operator, local.name),
                            &declared,
                            &found,
                            span,
                        )
                    })?;
                if steps.iter().any(Conversion::is_narrowing) {
                    log::trace!(
                        "'{}' narrows {} back to {} for {}",
                        assignment.operator,
                        found,
                        declared,
                        local.name
                    );
                }
                combined.convert(steps)
            }
        };

        Ok(TypedExpr::new(
            TypedExprKind::Assign {
                local,
                value: Box::new(value),
            },
            declared,
            span,
        ))
    }

    fn compile_conditional(
        context: &mut CompilationContext,
        conditional: &ConditionalExpression,
        hint: Option<&TypeKind>,
    ) -> CompileResult<TypedExpr> {
        let condition = Self::compile(context, &conditional.condition)?;
        if !condition.result_type.is_boolean() {
            return Err(CompileError::type_mismatch(
                "conditional test",
                "boolean",
                &condition.result_type,
                condition.span,
            ));
        }
        let steps = to_primitive(&condition.result_type, PrimitiveKind::Boolean).unwrap_or_default();
        let condition = condition.convert(steps);

        let consequent = Self::compile_with_hint(context, &conditional.consequent, hint)?;
        let alternate = Self::compile_with_hint(context, &conditional.alternate, hint)?;

        let (result_type, consequent_steps, alternate_steps) =
            Self::unify_branches(&consequent.result_type, &alternate.result_type).ok_or_else(
                || {
                    CompileError::type_mismatch(
                        "conditional branches",
                        &consequent.result_type,
                        &alternate.result_type,
                        conditional.span,
                    )
                },
            )?;

        Ok(TypedExpr::new(
            TypedExprKind::Conditional {
                condition: Box::new(condition),
                consequent: Box::new(consequent.convert(consequent_steps)),
                alternate: Box::new(alternate.convert(alternate_steps)),
            },
            result_type,
            conditional.span,
        ))
    }

    /// Common type of two conditional branches plus each branch's conversions
    fn unify_branches(
        a: &TypeKind,
        b: &TypeKind,
    ) -> Option<(TypeKind, Vec<Conversion>, Vec<Conversion>)> {
        if a == b {
            return Some((a.clone(), Vec::new(), Vec::new()));
        }
        if a.is_numeric() && b.is_numeric() {
            let kind = binary_numeric_promotion(a.unboxed()?, b.unboxed()?)?;
            return Some((
                TypeKind::Primitive(kind),
                to_primitive(a, kind)?,
                to_primitive(b, kind)?,
            ));
        }
        if a.is_boolean() && b.is_boolean() {
            return Some((
                TypeKind::boolean(),
                to_primitive(a, PrimitiveKind::Boolean)?,
                to_primitive(b, PrimitiveKind::Boolean)?,
            ));
        }
        // A null branch takes the other branch's (boxed) type
        if a.is_null() || b.is_null() {
            let other = if a.is_null() { b } else { a };
            let boxed = other.storage();
            let other_steps = assignment_conversions(other, &boxed)?;
            return Some(if a.is_null() {
                (boxed, Vec::new(), other_steps)
            } else {
                (boxed, other_steps, Vec::new())
            });
        }
        let (a_storage, b_storage) = (a.storage(), b.storage());
        let joined = if is_subtype(&a_storage, &b_storage) {
            b_storage
        } else if is_subtype(&b_storage, &a_storage) {
            a_storage
        } else {
            TypeKind::AnyObject
        };
        Some((
            joined.clone(),
            assignment_conversions(a, &joined)?,
            assignment_conversions(b, &joined)?,
        ))
    }

    fn compile_cast(context: &mut CompilationContext, cast: &CastExpression) -> CompileResult<TypedExpr> {
        let target = resolve_annotation(&cast.target_type)?;
        let operand = Self::compile_with_hint(context, &cast.expression, Some(&target))?;
        let steps = cast_conversions(&operand.result_type, &target)
            .ok_or_else(|| CompileError::invalid_cast(&operand.result_type, &target, cast.span))?;
        let converted = operand.convert(steps);
        // A cast to a wider static type than the value needs no instruction
        Ok(TypedExpr {
            result_type: target,
            span: cast.span,
            ..converted
        })
    }

    /// Compile an array literal; elements are stored as references
    pub fn compile_array(
        context: &mut CompilationContext,
        literal: &ArrayLiteral,
        element_type: Option<&TypeKind>,
        mismatch: MismatchFn,
    ) -> CompileResult<TypedExpr> {
        let mut elements = Vec::with_capacity(literal.elements.len());
        let stored = match element_type {
            Some(declared) => {
                let storage = declared.storage();
                for element in &literal.elements {
                    let typed = Self::compile_to(context, element, &storage, mismatch)?;
                    if declared.is_primitive() && typed.innermost_constant() == Some(&Constant::Null) {
                        return Err(mismatch(declared, &TypeKind::Null, element.span));
                    }
                    elements.push(typed);
                }
                storage
            }
            None => {
                let mut common: Option<TypeKind> = None;
                for element in &literal.elements {
                    let typed = Self::boxed(Self::compile(context, element)?);
                    let storage = typed.result_type.clone();
                    common = match common {
                        None => Some(storage),
                        Some(existing) if existing == storage => Some(existing),
                        Some(_) => Some(TypeKind::AnyObject),
                    };
                    elements.push(typed);
                }
                common.unwrap_or(TypeKind::AnyObject)
            }
        };
        Ok(TypedExpr::new(
            TypedExprKind::List(elements),
            TypeKind::array(stored),
            literal.span,
        ))
    }
}

/// A numeric literal with its sign applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum LiteralNumber {
    Integral(i64),
    Floating(f64),
}
