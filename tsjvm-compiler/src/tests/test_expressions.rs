//! Expression typing: promotion, coercion, casts and diagnostics

use super::{check_err, check_ok, error_kind};
use crate::coercion::{Conversion, OperandKind};
use crate::error::{CompileError, ErrorKind};
use crate::typed_ast::{Constant, TypedExprKind};
use crate::types::{PrimitiveKind, TypeKind};
use pretty_assertions::assert_eq;
use tsjvm_ast::builder::*;
use tsjvm_ast::{AssignmentOperator, BinaryOperator, UnaryOperator};

fn result_of(declarations: Vec<tsjvm_ast::VariableDeclaration>, body: tsjvm_ast::Expression) -> TypeKind {
    check_ok(&unit(declarations, body)).body.result_type
}

#[test]
fn test_int_plus_long_is_long() {
    let declarations = vec![let_typed("a", "int", int(1)), let_typed("b", "long", int(2))];
    let body = binary(var("a"), BinaryOperator::Add, var("b"));
    assert_eq!(result_of(declarations, body), TypeKind::long());
}

#[test]
fn test_sub_int_kinds_promote_to_int() {
    let declarations = vec![
        let_typed("b", "byte", int(1)),
        let_typed("s", "short", int(2)),
        let_typed("c", "char", string("A")),
    ];
    assert_eq!(
        result_of(declarations.clone(), binary(var("b"), BinaryOperator::Add, var("s"))),
        TypeKind::int()
    );
    assert_eq!(
        result_of(declarations, binary(var("c"), BinaryOperator::Multiply, var("b"))),
        TypeKind::int()
    );
}

#[test]
fn test_float_beats_long() {
    let declarations = vec![let_typed("f", "float", float(1.5)), let_typed("l", "long", int(2))];
    let body = binary(var("f"), BinaryOperator::Multiply, var("l"));
    assert_eq!(result_of(declarations, body), TypeKind::Primitive(PrimitiveKind::Float));
}

#[test]
fn test_boxed_operand_is_unboxed_before_promotion() {
    let declarations = vec![
        let_typed("n", "Integer", int(3)),
        let_typed("d", "double", float(1.5)),
    ];
    let typed = check_ok(&unit(declarations, binary(var("n"), BinaryOperator::Add, var("d"))));
    assert_eq!(typed.body.result_type, TypeKind::double());

    let TypedExprKind::Arithmetic { left, operand, .. } = &typed.body.kind else {
        panic!("expected arithmetic, got {:?}", typed.body.kind);
    };
    assert_eq!(*operand, PrimitiveKind::Double);
    let TypedExprKind::Convert { operand: inner, conversion } = &left.kind else {
        panic!("expected a conversion, got {:?}", left.kind);
    };
    assert_eq!(
        *conversion,
        Conversion::Primitive {
            from: PrimitiveKind::Int,
            to: PrimitiveKind::Double
        }
    );
    assert!(matches!(
        &inner.kind,
        TypedExprKind::Convert {
            conversion: Conversion::Unbox(PrimitiveKind::Int),
            ..
        }
    ));
}

#[test]
fn test_relational_result_is_boolean() {
    let declarations = vec![let_typed("a", "int", int(1)), let_typed("d", "double", float(2.0))];
    let body = binary(var("a"), BinaryOperator::LessEqual, var("d"));
    assert_eq!(result_of(declarations, body), TypeKind::boolean());
}

#[test]
fn test_mixed_width_equality_compares_numerically() {
    let declarations = vec![let_typed("a", "int", int(100)), let_typed("b", "long", int(100))];
    for operator in [BinaryOperator::Equal, BinaryOperator::StrictEqual] {
        let typed = check_ok(&unit(declarations.clone(), binary(var("a"), operator, var("b"))));
        let TypedExprKind::Compare { operand, .. } = &typed.body.kind else {
            panic!("expected a comparison");
        };
        assert_eq!(*operand, OperandKind::Numeric(PrimitiveKind::Long));
        assert_eq!(typed.body.result_type, TypeKind::boolean());
    }
}

#[test]
fn test_null_comparison_is_a_null_check() {
    let declarations = vec![let_typed("s", "string", string("x"))];
    let typed = check_ok(&unit(declarations, binary(var("s"), BinaryOperator::NotEqual, null())));
    assert!(matches!(
        typed.body.kind,
        TypedExprKind::Compare {
            operand: OperandKind::NullCheck,
            ..
        }
    ));

    let declarations = vec![let_typed("a", "int", int(1))];
    assert_eq!(
        error_kind(&unit(declarations, binary(var("a"), BinaryOperator::Equal, null()))),
        ErrorKind::TypeMismatch
    );
}

#[test]
fn test_string_concatenation_stringifies_the_other_side() {
    let declarations = vec![let_typed("a", "int", int(7))];
    let typed = check_ok(&unit(declarations, binary(string("n="), BinaryOperator::Add, var("a"))));
    assert_eq!(typed.body.result_type, TypeKind::string());

    let TypedExprKind::Concat { right, .. } = &typed.body.kind else {
        panic!("expected concatenation");
    };
    let TypedExprKind::Convert { operand, conversion } = &right.kind else {
        panic!("expected a conversion");
    };
    assert_eq!(*conversion, Conversion::Stringify);
    assert!(matches!(
        operand.kind,
        TypedExprKind::Convert {
            conversion: Conversion::Box(PrimitiveKind::Int),
            ..
        }
    ));
}

#[test]
fn test_no_promotion_path_is_a_type_mismatch_with_span() {
    let body = binary(boolean(true).at(0, 4), BinaryOperator::Add, int(1).at(7, 8));
    let error = check_err(&unit(vec![], body));
    assert_eq!(error.kind(), ErrorKind::TypeMismatch);
    assert_eq!(error.span(), miette::SourceSpan::from((0, 8)));
}

#[test]
fn test_number_and_string_are_not_comparable() {
    let body = binary(string("a"), BinaryOperator::StrictEqual, int(1));
    assert_eq!(error_kind(&unit(vec![], body)), ErrorKind::TypeMismatch);
}

#[test]
fn test_logical_operands_must_be_boolean() {
    let body = binary(int(1), BinaryOperator::LogicalAnd, boolean(true));
    assert_eq!(error_kind(&unit(vec![], body)), ErrorKind::TypeMismatch);

    let declarations = vec![let_typed("flag", "Boolean", boolean(true))];
    let body = binary(var("flag"), BinaryOperator::LogicalOr, boolean(false));
    assert_eq!(result_of(declarations, body), TypeKind::boolean());
}

#[test]
fn test_shift_keeps_left_operand_width() {
    let declarations = vec![let_typed("l", "long", int(1)), let_typed("b", "byte", int(3))];
    assert_eq!(
        result_of(declarations.clone(), binary(var("l"), BinaryOperator::ShiftLeft, int(2))),
        TypeKind::long()
    );
    assert_eq!(
        result_of(declarations, binary(var("b"), BinaryOperator::UnsignedShiftRight, var("l"))),
        TypeKind::int()
    );
}

#[test]
fn test_bitwise_operators() {
    let declarations = vec![let_typed("t", "boolean", boolean(true)), let_typed("d", "double", float(1.0))];
    assert_eq!(
        result_of(declarations.clone(), binary(var("t"), BinaryOperator::BitwiseAnd, boolean(false))),
        TypeKind::boolean()
    );
    assert_eq!(
        error_kind(&unit(declarations.clone(), binary(var("d"), BinaryOperator::BitwiseOr, int(1)))),
        ErrorKind::TypeMismatch
    );
    assert_eq!(
        error_kind(&unit(declarations, unary(UnaryOperator::BitwiseNot, var("d")))),
        ErrorKind::TypeMismatch
    );
}

#[test]
fn test_exponent_is_double() {
    assert_eq!(
        result_of(vec![], binary(int(2), BinaryOperator::Exponent, int(10))),
        TypeKind::double()
    );
}

#[test]
fn test_unary_operators() {
    let declarations = vec![let_typed("b", "byte", int(3)), let_typed("a", "int", int(1))];
    assert_eq!(
        result_of(declarations.clone(), unary(UnaryOperator::Minus, var("b"))),
        TypeKind::int()
    );
    assert_eq!(
        result_of(declarations.clone(), unary(UnaryOperator::BitwiseNot, var("b"))),
        TypeKind::int()
    );
    assert_eq!(
        error_kind(&unit(declarations, unary(UnaryOperator::LogicalNot, var("a")))),
        ErrorKind::TypeMismatch
    );
}

#[test]
fn test_unsupported_operators() {
    let body = binary(var("x"), BinaryOperator::NullishCoalescing, int(1));
    let error = check_err(&unit(vec![], body));
    assert!(matches!(
        error,
        CompileError::UnsupportedOperator { ref operator, .. } if operator == "??"
    ));
    assert_eq!(
        error_kind(&unit(vec![], unary(UnaryOperator::TypeOf, int(1)))),
        ErrorKind::UnsupportedOperator
    );
}

#[test]
fn test_undefined_variable() {
    let error = check_err(&unit(vec![], var("missing")));
    assert!(matches!(
        error,
        CompileError::UndefinedVariable { ref name, .. } if name == "missing"
    ));
}

#[test]
fn test_symbol_has_no_value() {
    assert_eq!(
        error_kind(&unit(vec![], symbol("tag"))),
        ErrorKind::UnsupportedExpression
    );
}

#[test]
fn test_numeric_casts() {
    let declarations = vec![let_typed("d", "double", float(300.7))];
    let typed = check_ok(&unit(declarations, cast(var("d"), ty("byte"))));
    assert_eq!(typed.body.result_type, TypeKind::Primitive(PrimitiveKind::Byte));
    assert!(matches!(
        typed.body.kind,
        TypedExprKind::Convert {
            conversion: Conversion::Primitive {
                from: PrimitiveKind::Double,
                to: PrimitiveKind::Byte
            },
            ..
        }
    ));

    let declarations = vec![let_typed("a", "int", int(1))];
    assert_eq!(
        result_of(declarations, cast(var("a"), ty("Long"))),
        TypeKind::Boxed(PrimitiveKind::Long)
    );
}

#[test]
fn test_invalid_casts() {
    assert_eq!(
        error_kind(&unit(vec![], cast(boolean(true), ty("int")))),
        ErrorKind::InvalidCast
    );
    assert_eq!(
        error_kind(&unit(vec![], cast(string("1"), ty("int")))),
        ErrorKind::InvalidCast
    );
}

#[test]
fn test_reference_casts() {
    let declarations = vec![
        let_typed("n", "Number", int(5)),
        let_typed("o", "Object", int(1)),
    ];
    let typed = check_ok(&unit(declarations.clone(), cast(var("n"), ty("long"))));
    assert!(matches!(
        typed.body.kind,
        TypedExprKind::Convert {
            conversion: Conversion::NumberValue(PrimitiveKind::Long),
            ..
        }
    ));

    let typed = check_ok(&unit(declarations, cast(var("o"), ty("Integer"))));
    assert_eq!(typed.body.result_type, TypeKind::Boxed(PrimitiveKind::Int));
    assert!(matches!(
        typed.body.kind,
        TypedExprKind::Convert {
            conversion: Conversion::CheckCast(_),
            ..
        }
    ));
}

#[test]
fn test_constant_narrowing_on_initialization() {
    let typed = check_ok(&unit(vec![let_typed("b", "byte", int(127))], var("b")));
    assert_eq!(typed.initializers[0].value.as_constant(), Some(&Constant::Int(127)));

    let typed = check_ok(&unit(
        vec![let_typed("b", "byte", unary(UnaryOperator::Minus, int(128)))],
        var("b"),
    ));
    assert_eq!(typed.initializers[0].value.as_constant(), Some(&Constant::Int(-128)));

    let typed = check_ok(&unit(vec![let_typed("c", "char", string("A"))], var("c")));
    assert_eq!(typed.initializers[0].value.as_constant(), Some(&Constant::Int(65)));

    assert_eq!(
        error_kind(&unit(vec![let_typed("b", "byte", int(128))], var("b"))),
        ErrorKind::TypeMismatch
    );
    assert_eq!(
        error_kind(&unit(vec![let_typed("c", "char", string("AB"))], var("c"))),
        ErrorKind::TypeMismatch
    );
}

#[test]
fn test_conditional_branch_unification() {
    let declarations = vec![let_typed("flag", "boolean", boolean(true)), let_typed("a", "int", int(1))];
    assert_eq!(
        result_of(declarations.clone(), conditional(var("flag"), int(1), float(2.5))),
        TypeKind::double()
    );
    assert_eq!(
        result_of(declarations.clone(), conditional(var("flag"), var("a"), null())),
        TypeKind::Boxed(PrimitiveKind::Int)
    );
    assert_eq!(
        result_of(declarations.clone(), conditional(var("flag"), string("x"), int(1))),
        TypeKind::AnyObject
    );
    assert_eq!(
        error_kind(&unit(declarations, conditional(var("a"), int(1), int(2)))),
        ErrorKind::TypeMismatch
    );
}

#[test]
fn test_simple_assignment() {
    let declarations = vec![let_typed("x", "long", int(0))];
    let typed = check_ok(&unit(
        declarations.clone(),
        assign(var("x"), AssignmentOperator::Assign, int(5)),
    ));
    assert_eq!(typed.body.result_type, TypeKind::long());
    let TypedExprKind::Assign { value, .. } = &typed.body.kind else {
        panic!("expected an assignment");
    };
    assert_eq!(value.as_constant(), Some(&Constant::Long(5)));

    assert_eq!(
        error_kind(&unit(
            declarations,
            assign(var("x"), AssignmentOperator::Assign, string("s"))
        )),
        ErrorKind::TypeMismatch
    );
}

#[test]
fn test_compound_assignment_narrows_to_declared_type() {
    let declarations = vec![let_typed("x", "int", int(1))];
    let typed = check_ok(&unit(
        declarations,
        assign(var("x"), AssignmentOperator::AddAssign, float(1.5)),
    ));
    assert_eq!(typed.body.result_type, TypeKind::int());
    let TypedExprKind::Assign { value, .. } = &typed.body.kind else {
        panic!("expected an assignment");
    };
    assert!(matches!(
        value.kind,
        TypedExprKind::Convert {
            conversion: Conversion::Primitive {
                from: PrimitiveKind::Double,
                to: PrimitiveKind::Int
            },
            ..
        }
    ));
}

#[test]
fn test_assignment_target_must_be_a_variable() {
    assert_eq!(
        error_kind(&unit(vec![], assign(int(1), AssignmentOperator::Assign, int(2)))),
        ErrorKind::InvalidAssignmentTarget
    );
    assert_eq!(
        error_kind(&unit(vec![], post_inc_of(int(1)))),
        ErrorKind::InvalidAssignmentTarget
    );
}

fn post_inc_of(argument: tsjvm_ast::Expression) -> tsjvm_ast::Expression {
    update(tsjvm_ast::UpdateOperator::Increment, false, argument)
}

#[test]
fn test_declarations_need_a_type() {
    assert_eq!(
        error_kind(&unit(vec![declare("x", None, None)], int(1))),
        ErrorKind::MissingType
    );
    assert_eq!(
        error_kind(&unit(vec![declare("x", None, Some(null()))], int(1))),
        ErrorKind::MissingType
    );
}

#[test]
fn test_declarations_are_scoped_in_order() {
    assert_eq!(
        error_kind(&unit(vec![declare("x", None, Some(var("x")))], int(1))),
        ErrorKind::UndefinedVariable
    );
    assert_eq!(
        error_kind(&unit(
            vec![let_typed("x", "int", int(1)), let_typed("x", "int", int(2))],
            int(1)
        )),
        ErrorKind::DuplicateDeclaration
    );
}

#[test]
fn test_wide_locals_take_two_slots() {
    let typed = check_ok(&unit(
        vec![
            let_typed("a", "int", int(1)),
            let_typed("b", "long", int(2)),
            let_typed("c", "double", float(3.0)),
            let_typed("d", "int", int(4)),
        ],
        var("d"),
    ));
    let slots: Vec<u16> = typed.locals.iter().map(|local| local.slot).collect();
    assert_eq!(slots, vec![0, 1, 3, 5]);
    assert_eq!(typed.next_free_slot, 6);
}

#[test]
fn test_annotation_without_initializer_defaults() {
    let typed = check_ok(&unit(
        vec![
            declare("x", Some(ty("long")), None),
            declare("s", Some(ty("string")), None),
        ],
        var("x"),
    ));
    assert_eq!(typed.initializers[0].value.as_constant(), Some(&Constant::Long(0)));
    assert_eq!(typed.initializers[1].value.as_constant(), Some(&Constant::Null));
}

#[test]
fn test_number_annotation_is_double() {
    let typed = check_ok(&unit(vec![let_typed("n", "number", int(1))], var("n")));
    assert_eq!(typed.locals[0].declared_type, TypeKind::double());
}

#[test]
fn test_return_type_is_enforced() {
    let typed = check_ok(&unit_returning(vec![], int(1), ty("long")));
    assert_eq!(typed.result_type, TypeKind::long());
    assert_eq!(
        error_kind(&unit_returning(vec![], string("s"), ty("int"))),
        ErrorKind::TypeMismatch
    );
}
