//! Constructors for assembling trees without a front-end.
//!
//! Leaf nodes get an empty span unless relocated with [`Expression::at`];
//! composite nodes cover the spans of their children.

use crate::ast::*;

fn expr(kind: ExpressionKind, span: Span) -> Expression {
    Expression { kind, span }
}

pub fn identifier(name: &str) -> Identifier {
    Identifier {
        name: name.to_string(),
        span: Span::default(),
    }
}

pub fn int(value: i64) -> Expression {
    let span = Span::default();
    expr(
        ExpressionKind::Integer(IntegerLiteral {
            value,
            span,
        }),
        span,
    )
}

pub fn float(value: f64) -> Expression {
    let span = Span::default();
    expr(ExpressionKind::Float(FloatLiteral { value, span }), span)
}

pub fn string(value: &str) -> Expression {
    let span = Span::default();
    expr(
        ExpressionKind::String(StringLiteral {
            value: value.to_string(),
            span,
        }),
        span,
    )
}

pub fn boolean(value: bool) -> Expression {
    let span = Span::default();
    expr(ExpressionKind::Boolean(BooleanLiteral { value, span }), span)
}

pub fn null() -> Expression {
    let span = Span::default();
    expr(ExpressionKind::Null(NullLiteral { span }), span)
}

pub fn var(name: &str) -> Expression {
    let identifier = identifier(name);
    let span = identifier.span;
    expr(ExpressionKind::Identifier(identifier), span)
}

pub fn binary(left: Expression, operator: BinaryOperator, right: Expression) -> Expression {
    let span = left.span.merge(&right.span);
    expr(
        ExpressionKind::BinaryOp(BinaryOperation {
            left: Box::new(left),
            operator,
            right: Box::new(right),
            span,
        }),
        span,
    )
}

pub fn unary(operator: UnaryOperator, operand: Expression) -> Expression {
    let span = operand.span;
    expr(
        ExpressionKind::UnaryOp(UnaryOperation {
            operator,
            operand: Box::new(operand),
            span,
        }),
        span,
    )
}

pub fn update(operator: UpdateOperator, prefix: bool, argument: Expression) -> Expression {
    let span = argument.span;
    expr(
        ExpressionKind::Update(UpdateExpression {
            operator,
            prefix,
            argument: Box::new(argument),
            span,
        }),
        span,
    )
}

/// `++name`
pub fn pre_inc(name: &str) -> Expression {
    update(UpdateOperator::Increment, true, var(name))
}

/// `--name`
pub fn pre_dec(name: &str) -> Expression {
    update(UpdateOperator::Decrement, true, var(name))
}

/// `name++`
pub fn post_inc(name: &str) -> Expression {
    update(UpdateOperator::Increment, false, var(name))
}

/// `name--`
pub fn post_dec(name: &str) -> Expression {
    update(UpdateOperator::Decrement, false, var(name))
}

pub fn assign(target: Expression, operator: AssignmentOperator, value: Expression) -> Expression {
    let span = target.span.merge(&value.span);
    expr(
        ExpressionKind::Assignment(Assignment {
            target: Box::new(target),
            operator,
            value: Box::new(value),
            span,
        }),
        span,
    )
}

pub fn conditional(condition: Expression, consequent: Expression, alternate: Expression) -> Expression {
    let span = condition.span.merge(&alternate.span);
    expr(
        ExpressionKind::Conditional(ConditionalExpression {
            condition: Box::new(condition),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
            span,
        }),
        span,
    )
}

pub fn cast(expression: Expression, target_type: TypeAnnotation) -> Expression {
    let span = expression.span;
    expr(
        ExpressionKind::Cast(CastExpression {
            expression: Box::new(expression),
            target_type,
            span,
        }),
        span,
    )
}

pub fn paren(inner: Expression) -> Expression {
    let span = inner.span;
    expr(ExpressionKind::Parenthesized(Box::new(inner)), span)
}

pub fn object(properties: Vec<Property>) -> Expression {
    let span = properties
        .iter()
        .map(Property::span)
        .reduce(|a, b| a.merge(&b))
        .unwrap_or_default();
    expr(ExpressionKind::Object(ObjectLiteral { properties, span }), span)
}

pub fn array(elements: Vec<Expression>) -> Expression {
    let span = elements
        .iter()
        .map(|e| e.span)
        .reduce(|a, b| a.merge(&b))
        .unwrap_or_default();
    expr(ExpressionKind::Array(ArrayLiteral { elements, span }), span)
}

pub fn symbol(description: &str) -> Expression {
    let span = Span::default();
    expr(
        ExpressionKind::Symbol(SymbolExpression {
            description: description.to_string(),
            well_known: false,
            span,
        }),
        span,
    )
}

pub fn well_known_symbol(name: &str) -> Expression {
    let span = Span::default();
    expr(
        ExpressionKind::Symbol(SymbolExpression {
            description: name.to_string(),
            well_known: true,
            span,
        }),
        span,
    )
}

// Property keys

pub fn key(name: &str) -> PropertyKey {
    PropertyKey::Identifier(identifier(name))
}

pub fn string_key(value: &str) -> PropertyKey {
    PropertyKey::String(StringLiteral {
        value: value.to_string(),
        span: Span::default(),
    })
}

pub fn int_key(value: i64) -> PropertyKey {
    PropertyKey::Integer(IntegerLiteral {
        value,
        span: Span::default(),
    })
}

pub fn float_key(value: f64) -> PropertyKey {
    PropertyKey::Float(FloatLiteral {
        value,
        span: Span::default(),
    })
}

pub fn bool_key(value: bool) -> PropertyKey {
    PropertyKey::Boolean(BooleanLiteral {
        value,
        span: Span::default(),
    })
}

pub fn null_key() -> PropertyKey {
    PropertyKey::Null(NullLiteral {
        span: Span::default(),
    })
}

pub fn computed(expression: Expression) -> PropertyKey {
    let span = expression.span;
    PropertyKey::Computed {
        expression: Box::new(expression),
        span,
    }
}

// Properties

pub fn entry(key: PropertyKey, value: Expression) -> Property {
    let span = key.span().merge(&value.span);
    Property::KeyValue { key, value, span }
}

/// `name: value`
pub fn prop(name: &str, value: Expression) -> Property {
    entry(key(name), value)
}

pub fn shorthand(name: &str) -> Property {
    Property::Shorthand(identifier(name))
}

pub fn spread(expression: Expression) -> Property {
    let span = expression.span;
    Property::Spread { expression, span }
}

pub fn method(name: &str) -> Property {
    Property::Method {
        key: key(name),
        span: Span::default(),
    }
}

pub fn getter(name: &str) -> Property {
    Property::Getter {
        key: key(name),
        span: Span::default(),
    }
}

pub fn setter(name: &str) -> Property {
    Property::Setter {
        key: key(name),
        span: Span::default(),
    }
}

// Type annotations

pub fn ty(name: &str) -> TypeAnnotation {
    TypeAnnotation::Simple {
        name: name.to_string(),
        span: Span::default(),
    }
}

pub fn generic(name: &str, args: Vec<TypeAnnotation>) -> TypeAnnotation {
    TypeAnnotation::Generic {
        name: name.to_string(),
        args,
        span: Span::default(),
    }
}

/// `Record<key, value>`
pub fn record(key: TypeAnnotation, value: TypeAnnotation) -> TypeAnnotation {
    generic("Record", vec![key, value])
}

/// `Array<element>`
pub fn array_of(element: TypeAnnotation) -> TypeAnnotation {
    generic("Array", vec![element])
}

// Declarations and units

pub fn declare(
    name: &str,
    type_annotation: Option<TypeAnnotation>,
    initializer: Option<Expression>,
) -> VariableDeclaration {
    let span = initializer.as_ref().map(|e| e.span).unwrap_or_default();
    VariableDeclaration {
        name: identifier(name),
        type_annotation,
        initializer,
        span,
    }
}

/// `const name: ty = initializer`
pub fn let_typed(name: &str, type_name: &str, initializer: Expression) -> VariableDeclaration {
    declare(name, Some(ty(type_name)), Some(initializer))
}

pub fn unit(declarations: Vec<VariableDeclaration>, body: Expression) -> CompilationUnit {
    let span = body.span;
    CompilationUnit {
        name: "test".to_string(),
        declarations,
        body,
        return_type: None,
        span,
    }
}

pub fn unit_returning(
    declarations: Vec<VariableDeclaration>,
    body: Expression,
    return_type: TypeAnnotation,
) -> CompilationUnit {
    CompilationUnit {
        return_type: Some(return_type),
        ..unit(declarations, body)
    }
}
