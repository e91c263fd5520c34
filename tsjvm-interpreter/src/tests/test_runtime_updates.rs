//! Increment, decrement and assignment at runtime

use super::{result, run};
use crate::value::{BoxedValue, Value};
use pretty_assertions::assert_eq;
use tsjvm_ast::builder::*;
use tsjvm_ast::{AssignmentOperator, BinaryOperator};

#[test]
fn test_postfix_and_prefix_increment() {
    let declarations = vec![let_typed("i", "int", int(5))];

    let execution = run(&unit(declarations.clone(), post_inc("i")));
    assert_eq!(execution.result, Value::Int(5));
    assert_eq!(execution.local("i"), Some(&Value::Int(6)));

    let execution = run(&unit(declarations, pre_inc("i")));
    assert_eq!(execution.result, Value::Int(6));
    assert_eq!(execution.local("i"), Some(&Value::Int(6)));
}

#[test]
fn test_updates_apply_in_order() {
    let execution = run(&unit(
        vec![let_typed("i", "int", int(1))],
        binary(post_inc("i"), BinaryOperator::Add, post_inc("i")),
    ));
    assert_eq!(execution.result, Value::Int(3));
    assert_eq!(execution.local("i"), Some(&Value::Int(3)));
}

#[test]
fn test_byte_update_wraps() {
    let execution = run(&unit(vec![let_typed("b", "byte", int(127))], pre_inc("b")));
    assert_eq!(execution.result, Value::Int(-128));
    assert_eq!(execution.local("b"), Some(&Value::Int(-128)));

    let execution = run(&unit(vec![let_typed("b", "byte", int(-128))], post_dec("b")));
    assert_eq!(execution.result, Value::Int(-128));
    assert_eq!(execution.local("b"), Some(&Value::Int(127)));
}

#[test]
fn test_char_update() {
    let execution = run(&unit(vec![let_typed("c", "char", int(0))], pre_dec("c")));
    assert_eq!(execution.result, Value::Int(65535));
}

#[test]
fn test_long_and_double_updates() {
    let execution = run(&unit(vec![let_typed("l", "long", int(5))], post_dec("l")));
    assert_eq!(execution.result, Value::Long(5));
    assert_eq!(execution.local("l"), Some(&Value::Long(4)));

    let execution = run(&unit(vec![let_typed("d", "double", float(0.5))], pre_inc("d")));
    assert_eq!(execution.result, Value::Double(1.5));
    assert_eq!(execution.local("d"), Some(&Value::Double(1.5)));
}

#[test]
fn test_boxed_update_rebinds() {
    let execution = run(&unit(vec![let_typed("n", "Integer", int(5))], post_inc("n")));
    assert_eq!(execution.result, Value::Boxed(BoxedValue::Int(5)));
    assert_eq!(execution.local("n"), Some(&Value::Boxed(BoxedValue::Int(6))));
}

#[test]
fn test_assignment_yields_stored_value() {
    let execution = run(&unit(
        vec![let_typed("x", "long", int(0))],
        assign(var("x"), AssignmentOperator::Assign, int(7)),
    ));
    assert_eq!(execution.result, Value::Long(7));
    assert_eq!(execution.local("x"), Some(&Value::Long(7)));
}

#[test]
fn test_compound_assignment_narrows() {
    let execution = run(&unit(
        vec![let_typed("x", "int", int(10))],
        assign(var("x"), AssignmentOperator::AddAssign, float(1.5)),
    ));
    assert_eq!(execution.result, Value::Int(11));
    assert_eq!(execution.local("x"), Some(&Value::Int(11)));

    let execution = run(&unit(
        vec![let_typed("b", "byte", int(100))],
        assign(var("b"), AssignmentOperator::MultiplyAssign, int(3)),
    ));
    assert_eq!(execution.local("b"), Some(&Value::Int(44)));
}

#[test]
fn test_string_compound_assignment() {
    let execution = run(&unit(
        vec![let_typed("s", "string", string("a"))],
        assign(var("s"), AssignmentOperator::AddAssign, int(1)),
    ));
    assert_eq!(execution.local("s"), Some(&Value::string("a1")));
}

#[test]
fn test_default_initializers() {
    let value = result(&unit(vec![declare("x", Some(ty("long")), None)], var("x")));
    assert_eq!(value, Value::Long(0));

    let value = result(&unit(vec![declare("s", Some(ty("string")), None)], var("s")));
    assert_eq!(value, Value::Null);
}
