//! Object literal compilation
//!
//! Lowers an object literal into a `ConstructionPlan` for an ordered map:
//! - Literal, computed, shorthand and spread entries in source order
//! - Key coercion to the declared key type (string form or numeric box)
//! - Value checks against the declared value type, recursively for
//!   nested record constraints
//! - Rejection of member forms the container cannot hold
//!
//! Duplicate keys are not resolved here. The container's `put` contract
//! keeps the first position and the last value, and the plan preserves
//! every entry so emitted code reproduces that exactly.

use crate::checker::context::CompilationContext;
use crate::checker::expressions::{ExpressionCompiler, LiteralNumber};
use crate::coercion::is_subtype;
use crate::error::{CompileError, CompileResult, PropertyForm};
use crate::typed_ast::{
    ConstructionPlan, Constant, KeyForm, PlanEntry, PlanEntryKind, PlanKey, TypedExpr,
    TypedExprKind,
};
use crate::types::{PrimitiveKind, RecordConstraint, TypeKind};
use tsjvm_ast::{Expression, ExpressionKind, ObjectLiteral, Property, PropertyKey, Span};

/// Object literal compiler
pub struct RecordCompiler;

impl RecordCompiler {
    /// Compile an object literal, optionally under a declared constraint
    pub fn compile(
        context: &mut CompilationContext,
        literal: &ObjectLiteral,
        constraint: Option<&RecordConstraint>,
    ) -> CompileResult<TypedExpr> {
        let plan = Self::plan(context, literal, constraint)?;
        let result_type = TypeKind::Record(Box::new(plan.record_type.clone()));
        Ok(TypedExpr::new(
            TypedExprKind::Record(plan),
            result_type,
            literal.span,
        ))
    }

    /// Build the construction plan for an object literal
    pub fn plan(
        context: &mut CompilationContext,
        literal: &ObjectLiteral,
        constraint: Option<&RecordConstraint>,
    ) -> CompileResult<ConstructionPlan> {
        Self::reject_unsupported_members(literal)?;

        let mut entries = Vec::with_capacity(literal.properties.len());
        let mut string_keys_only = true;

        for (source_order, property) in literal.properties.iter().enumerate() {
            let entry = match property {
                Property::KeyValue { key, value, span } => {
                    Self::key_value(context, key, value, constraint, source_order, *span)?
                }
                Property::Shorthand(identifier) => {
                    let key = PropertyKey::Identifier(identifier.clone());
                    let value = Expression {
                        kind: ExpressionKind::Identifier(identifier.clone()),
                        span: identifier.span,
                    };
                    let mut entry =
                        Self::key_value(context, &key, &value, constraint, source_order, identifier.span)?;
                    entry.form = KeyForm::Shorthand;
                    entry
                }
                Property::Spread { expression, span } => {
                    let entry = Self::spread(context, expression, constraint, source_order, *span)?;
                    if let PlanEntryKind::Spread { key_type, .. } = &entry.kind {
                        string_keys_only &= key_type.is_string();
                    }
                    entry
                }
                // Rejected by the pre-scan
                Property::Method { key, span }
                | Property::Getter { key, span }
                | Property::Setter { key, span } => {
                    return Err(CompileError::unsupported_property(
                        Self::member_form(property),
                        Self::key_label(key),
                        *span,
                    ))
                }
            };
            entries.push(entry);
        }

        let (record_type, constrained) = match constraint {
            Some(constraint) => (constraint.clone(), true),
            None if string_keys_only => (RecordConstraint::unconstrained(), false),
            None => (
                RecordConstraint::new(TypeKind::AnyObject, TypeKind::AnyObject),
                false,
            ),
        };
        log::debug!(
            "object literal with {} entries compiled as {}{}",
            entries.len(),
            record_type,
            if constrained { "" } else { " (unconstrained)" }
        );

        Ok(ConstructionPlan {
            record_type,
            constrained,
            entries,
            span: literal.span,
        })
    }

    /// Executable members and symbol keys fail the whole literal before
    /// any entry is compiled
    fn reject_unsupported_members(literal: &ObjectLiteral) -> CompileResult<()> {
        for property in &literal.properties {
            match property {
                Property::Method { key, span }
                | Property::Getter { key, span }
                | Property::Setter { key, span } => {
                    return Err(CompileError::unsupported_property(
                        Self::member_form(property),
                        Self::key_label(key),
                        *span,
                    ));
                }
                Property::KeyValue {
                    key: PropertyKey::Computed { expression, span },
                    ..
                } if Self::is_symbol(expression) => {
                    return Err(CompileError::unsupported_property(
                        PropertyForm::SymbolKey,
                        expression.to_string(),
                        *span,
                    ));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn member_form(property: &Property) -> PropertyForm {
        match property {
            Property::Getter { .. } => PropertyForm::Getter,
            Property::Setter { .. } => PropertyForm::Setter,
            _ => PropertyForm::Method,
        }
    }

    fn is_symbol(expression: &Expression) -> bool {
        matches!(expression.unparenthesized().kind, ExpressionKind::Symbol(_))
    }

    /// Name used for a property in diagnostics
    fn key_label(key: &PropertyKey) -> String {
        match key {
            PropertyKey::Identifier(identifier) => identifier.name.clone(),
            PropertyKey::String(literal) => literal.value.clone(),
            PropertyKey::Integer(literal) => literal.value.to_string(),
            PropertyKey::Float(literal) => Constant::Double(literal.value).key_string(),
            PropertyKey::Boolean(literal) => literal.value.to_string(),
            PropertyKey::Null(_) => "null".to_string(),
            PropertyKey::Computed { expression, .. } => format!("[{}]", expression),
        }
    }

    fn key_value(
        context: &mut CompilationContext,
        key: &PropertyKey,
        value: &Expression,
        constraint: Option<&RecordConstraint>,
        source_order: usize,
        span: Span,
    ) -> CompileResult<PlanEntry> {
        let label = Self::key_label(key);
        // Keys are evaluated before values
        let (key, key_type, form) = match key {
            PropertyKey::Computed { expression, .. } => {
                let typed = Self::computed_key(context, expression, constraint, &label)?;
                let key_type = typed.result_type.clone();
                (PlanKey::Computed(typed), key_type, KeyForm::Computed)
            }
            literal => {
                let declared = constraint
                    .map(|constraint| constraint.key.clone())
                    .unwrap_or_else(TypeKind::string);
                let (value, key_type) = Self::literal_key(literal, &declared, &label)?;
                (
                    PlanKey::Constant {
                        value,
                        key_type: key_type.clone(),
                    },
                    key_type,
                    KeyForm::Literal,
                )
            }
        };

        let value = match constraint {
            Some(constraint) => Self::constrained_value(context, value, &constraint.value, &label)?,
            None => ExpressionCompiler::boxed(ExpressionCompiler::compile(context, value)?),
        };
        let value_type = value.result_type.clone();

        Ok(PlanEntry {
            source_order,
            form,
            kind: PlanEntryKind::Insert {
                key,
                value,
                key_type,
                value_type,
            },
            span,
        })
    }

    /// Coerce a literal key to the declared key type
    fn literal_key(
        key: &PropertyKey,
        declared: &TypeKind,
        label: &str,
    ) -> CompileResult<(Constant, TypeKind)> {
        let span = key.span();
        let accepts_strings = declared.is_string() || matches!(declared, TypeKind::AnyObject);
        let numeric = declared.is_numeric() || declared.is_number_reference();

        let number = match key {
            PropertyKey::Integer(literal) => Some(LiteralNumber::Integral(literal.value)),
            PropertyKey::Float(literal) => Some(LiteralNumber::Floating(literal.value)),
            _ => None,
        };

        if let (true, Some(number)) = (numeric, number) {
            return Self::numeric_key(number, declared, label, span);
        }
        if !accepts_strings {
            let found = match key {
                PropertyKey::Boolean(_) => TypeKind::boolean(),
                PropertyKey::Null(_) => TypeKind::Null,
                PropertyKey::Integer(literal) => Self::integer_type(literal.value),
                PropertyKey::Float(_) => TypeKind::double(),
                _ => TypeKind::string(),
            };
            return Err(CompileError::key_type_mismatch(label, declared, found, span));
        }
        Ok((Constant::String(label.to_string()), TypeKind::string()))
    }

    fn integer_type(value: i64) -> TypeKind {
        if i32::try_from(value).is_ok() {
            TypeKind::int()
        } else {
            TypeKind::long()
        }
    }

    /// Numeric keys stay numeric and must fit the declared key width; the
    /// generic `number` key infers `Integer`, `Long` or `Double`
    fn numeric_key(
        number: LiteralNumber,
        declared: &TypeKind,
        label: &str,
        span: Span,
    ) -> CompileResult<(Constant, TypeKind)> {
        let integral = match number {
            LiteralNumber::Integral(value) => Some(value),
            LiteralNumber::Floating(value)
                if value.fract() == 0.0 && value.is_finite() && value.abs() < 9.0e18 =>
            {
                Some(value as i64)
            }
            LiteralNumber::Floating(_) => None,
        };
        let as_double = match number {
            LiteralNumber::Integral(value) => value as f64,
            LiteralNumber::Floating(value) => value,
        };
        let found = match number {
            LiteralNumber::Integral(value) => Self::integer_type(value),
            LiteralNumber::Floating(_) => TypeKind::double(),
        };
        let mismatch = || CompileError::key_type_mismatch(label, declared, &found, span);

        let kind = match declared.unboxed() {
            Some(kind) => kind,
            None => match integral {
                Some(value) if i32::try_from(value).is_ok() => PrimitiveKind::Int,
                Some(_) => PrimitiveKind::Long,
                None => PrimitiveKind::Double,
            },
        };
        let constant = match kind {
            PrimitiveKind::Long => Constant::Long(integral.ok_or_else(mismatch)?),
            PrimitiveKind::Float => Constant::Float(as_double as f32),
            PrimitiveKind::Double => Constant::Double(as_double),
            kind if kind.is_integral() => match integral {
                Some(value) if kind.fits(value) => Constant::Int(value as i32),
                _ => return Err(mismatch()),
            },
            _ => return Err(mismatch()),
        };
        Ok((constant, TypeKind::Boxed(kind)))
    }

    /// Compile a `[expr]` key, converted to the stored key type
    fn computed_key(
        context: &mut CompilationContext,
        expression: &Expression,
        constraint: Option<&RecordConstraint>,
        label: &str,
    ) -> CompileResult<TypedExpr> {
        match constraint {
            Some(constraint) => {
                let target = constraint.key.storage();
                let typed = ExpressionCompiler::compile_to(
                    context,
                    expression,
                    &target,
                    &|_, found, span| {
                        CompileError::key_type_mismatch(label, &constraint.key, found, span)
                    },
                )?;
                if typed.result_type.is_null() {
                    return Err(CompileError::key_type_mismatch(
                        label,
                        &constraint.key,
                        TypeKind::Null,
                        expression.span,
                    ));
                }
                Ok(typed)
            }
            None => {
                let typed = ExpressionCompiler::compile(context, expression)?;
                Ok(ExpressionCompiler::stringified(typed))
            }
        }
    }

    /// Convert a value to the declared value type and then to its stored form
    fn constrained_value(
        context: &mut CompilationContext,
        value: &Expression,
        declared: &TypeKind,
        label: &str,
    ) -> CompileResult<TypedExpr> {
        let mismatch = |_: &TypeKind, found: &TypeKind, span: Span| {
            CompileError::value_type_mismatch(label, declared, found, span)
        };

        if declared.is_primitive() && matches!(value.unparenthesized().kind, ExpressionKind::Null(_))
        {
            return Err(mismatch(declared, &TypeKind::Null, value.span));
        }

        if let (ExpressionKind::Array(array), TypeKind::Array(element)) =
            (&value.unparenthesized().kind, declared)
        {
            let element_label = format!("{} (array element)", label);
            return ExpressionCompiler::compile_array(
                context,
                array,
                Some(element.as_ref()),
                &|_, found, span| {
                    CompileError::value_type_mismatch(&element_label, element.as_ref(), found, span)
                },
            );
        }

        let target = declared.storage();
        // Constant narrowing happens against the declared kind, then boxes
        ExpressionCompiler::compile_to(context, value, &target, &mismatch)
    }

    fn spread(
        context: &mut CompilationContext,
        expression: &Expression,
        constraint: Option<&RecordConstraint>,
        source_order: usize,
        span: Span,
    ) -> CompileResult<PlanEntry> {
        let source = match &expression.unparenthesized().kind {
            // An inline literal is validated entry by entry under the same constraint
            ExpressionKind::Object(literal) => {
                let typed = Self::compile(context, literal, constraint)?;
                TypedExpr { span: expression.span, ..typed }
            }
            _ => ExpressionCompiler::compile(context, expression)?,
        };

        let (key_type, value_type) = match (&source.result_type, constraint) {
            (TypeKind::Record(record), Some(constraint)) => {
                let container = constraint.to_string();
                if !is_subtype(&record.key.storage(), &constraint.key.storage()) {
                    return Err(CompileError::incompatible_key_type(
                        container,
                        &constraint.key,
                        &record.key,
                        span,
                    ));
                }
                if !is_subtype(&record.value.storage(), &constraint.value.storage()) {
                    return Err(CompileError::incompatible_value_type(
                        container,
                        &constraint.value,
                        &record.value,
                        span,
                    ));
                }
                (record.key.storage(), record.value.storage())
            }
            (TypeKind::Record(record), None) => (record.key.storage(), record.value.storage()),
            (TypeKind::AnyObject, Some(constraint)) => {
                return Err(CompileError::incompatible_value_type(
                    constraint.to_string(),
                    &constraint.value,
                    TypeKind::AnyObject,
                    span,
                ))
            }
            (TypeKind::AnyObject, None) => (TypeKind::AnyObject, TypeKind::AnyObject),
            (found, _) => {
                return Err(CompileError::type_mismatch(
                    "spread source",
                    "Record",
                    found,
                    expression.span,
                ))
            }
        };

        Ok(PlanEntry {
            source_order,
            form: KeyForm::Spread,
            kind: PlanEntryKind::Spread {
                source,
                key_type,
                value_type,
            },
            span,
        })
    }
}
