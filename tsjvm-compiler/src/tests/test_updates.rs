//! Increment, decrement and assignment on locals

use super::{body_mnemonics, check_ok, emit, error_kind};
use crate::coercion::Conversion;
use crate::error::ErrorKind;
use crate::typed_ast::TypedExprKind;
use crate::types::{PrimitiveKind, TypeKind};
use pretty_assertions::assert_eq;
use tsjvm_ast::builder::*;
use tsjvm_ast::AssignmentOperator;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

#[test]
fn test_update_keeps_declared_type() {
    let declarations = vec![
        let_typed("i", "int", int(0)),
        let_typed("b", "byte", int(0)),
        let_typed("n", "Integer", int(0)),
    ];
    for (body, expected) in [
        (post_inc("i"), TypeKind::int()),
        (pre_dec("b"), TypeKind::Primitive(PrimitiveKind::Byte)),
        (post_dec("n"), TypeKind::Boxed(PrimitiveKind::Int)),
    ] {
        let typed = check_ok(&unit(declarations.clone(), body));
        assert_eq!(typed.body.result_type, expected);
    }
}

#[test]
fn test_update_records_direction_and_position() {
    let typed = check_ok(&unit(vec![let_typed("i", "int", int(0))], pre_dec("i")));
    match typed.body.kind {
        TypedExprKind::Update {
            ref local,
            delta,
            prefix,
        } => {
            assert_eq!(local.name, "i");
            assert_eq!(delta, -1);
            assert!(prefix);
        }
        other => panic!("expected an update, got {:?}", other),
    }
}

#[test]
fn test_update_needs_a_numeric_local() {
    assert_eq!(
        error_kind(&unit(vec![let_typed("s", "string", string("a"))], post_inc("s"))),
        ErrorKind::TypeMismatch
    );
    assert_eq!(
        error_kind(&unit(vec![let_typed("t", "boolean", boolean(true))], pre_inc("t"))),
        ErrorKind::TypeMismatch
    );
    assert_eq!(
        error_kind(&unit(vec![], post_inc("missing"))),
        ErrorKind::UndefinedVariable
    );
}

#[test]
fn test_update_of_parenthesized_variable() {
    let body = update(tsjvm_ast::UpdateOperator::Increment, true, paren(var("i")));
    let typed = check_ok(&unit(vec![let_typed("i", "int", int(0))], body));
    assert_eq!(typed.body.result_type, TypeKind::int());
}

#[test]
fn test_compound_assignments() {
    let declarations = vec![
        let_typed("l", "long", int(1)),
        let_typed("s", "string", string("a")),
        let_typed("c", "char", string("a")),
    ];
    assert_eq!(
        check_ok(&unit(
            declarations.clone(),
            assign(var("l"), AssignmentOperator::ShiftLeftAssign, int(2))
        ))
        .body
        .result_type,
        TypeKind::long()
    );
    assert_eq!(
        check_ok(&unit(
            declarations.clone(),
            assign(var("s"), AssignmentOperator::AddAssign, int(1))
        ))
        .body
        .result_type,
        TypeKind::string()
    );
    assert_eq!(
        check_ok(&unit(
            declarations.clone(),
            assign(var("c"), AssignmentOperator::AddAssign, int(1))
        ))
        .body
        .result_type,
        TypeKind::Primitive(PrimitiveKind::Char)
    );
    assert_eq!(
        error_kind(&unit(
            declarations,
            assign(var("l"), AssignmentOperator::AddAssign, string("x"))
        )),
        ErrorKind::TypeMismatch
    );
}

#[test]
fn test_compound_assignment_narrows_only_when_needed() {
    let declarations = vec![
        let_typed("b", "byte", int(1)),
        let_typed("d", "double", float(1.0)),
    ];
    let stored_conversion = |target: &str, value| {
        let typed = check_ok(&unit(
            declarations.clone(),
            assign(var(target), AssignmentOperator::AddAssign, value),
        ));
        match typed.body.kind {
            TypedExprKind::Assign { value, .. } => match value.kind {
                TypedExprKind::Convert { conversion, .. } => Some(conversion),
                _ => None,
            },
            other => panic!("Expected assignment, got {:?}", other),
        }
    };

    let narrowed = stored_conversion("b", int(3));
    assert_eq!(
        narrowed,
        Some(Conversion::Primitive {
            from: PrimitiveKind::Int,
            to: PrimitiveKind::Byte
        })
    );
    assert!(narrowed.is_some_and(|conversion| conversion.is_narrowing()));

    // double += int already computes in double
    assert_eq!(stored_conversion("d", int(3)), None);
}

#[test]
fn test_boxed_postfix_increment_emission() {
    let sequence = emit(&unit(vec![let_typed("n", "Integer", int(1))], post_inc("n")));
    assert_eq!(
        body_mnemonics(&sequence, 3),
        strings(&[
            "aload_0",
            "dup",
            "invokevirtual",
            "iconst_1",
            "iadd",
            "invokestatic",
            "astore_0",
        ])
    );
}

#[test]
fn test_float_prefix_increment_emission() {
    let sequence = emit(&unit(vec![let_typed("f", "float", float(0.0))], pre_inc("f")));
    assert_eq!(
        body_mnemonics(&sequence, 2),
        strings(&["fload_0", "fconst_1", "fadd", "dup", "fstore_0"])
    );
}

#[test]
fn test_assignment_leaves_stored_value() {
    let sequence = emit(&unit(
        vec![let_typed("x", "int", int(0))],
        assign(var("x"), AssignmentOperator::Assign, int(5)),
    ));
    assert_eq!(body_mnemonics(&sequence, 2), strings(&["iconst_5", "dup", "istore_0"]));

    let sequence = emit(&unit(
        vec![let_typed("d", "double", float(0.0))],
        assign(var("d"), AssignmentOperator::MultiplyAssign, int(3)),
    ));
    assert_eq!(
        body_mnemonics(&sequence, 2),
        strings(&["dload_0", "iconst_3", "i2d", "dmul", "dup2", "dstore_0"])
    );
}
