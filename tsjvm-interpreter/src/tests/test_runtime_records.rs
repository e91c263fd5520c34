//! Object and array literals at runtime

use super::{entries, result, str_key};
use crate::value::{BoxedValue, Key, Value};
use pretty_assertions::assert_eq;
use tsjvm_ast::builder::*;
use tsjvm_ast::VariableDeclaration;

fn int_value(value: i32) -> Value {
    Value::Boxed(BoxedValue::Int(value))
}

fn base_record() -> VariableDeclaration {
    declare(
        "base",
        Some(record(ty("string"), ty("int"))),
        Some(object(vec![prop("a", int(1)), prop("b", int(2))])),
    )
}

#[test]
fn test_duplicate_keys_keep_first_position_and_last_value() {
    let value = result(&unit(
        vec![],
        object(vec![
            prop("z", int(1)),
            prop("a", int(2)),
            prop("m", int(3)),
            prop("a", int(4)),
        ]),
    ));
    assert_eq!(
        entries(&value),
        vec![
            (str_key("z"), int_value(1)),
            (str_key("a"), int_value(4)),
            (str_key("m"), int_value(3)),
        ]
    );
}

#[test]
fn test_values_are_boxed_in_their_own_kind() {
    let value = result(&unit(
        vec![let_typed("l", "long", int(5))],
        object(vec![
            prop("n", var("l")),
            prop("s", string("x")),
            prop("f", boolean(false)),
            prop("d", float(0.5)),
            prop("none", null()),
        ]),
    ));
    assert_eq!(
        entries(&value),
        vec![
            (str_key("n"), Value::Boxed(BoxedValue::Long(5))),
            (str_key("s"), Value::string("x")),
            (str_key("f"), Value::Boxed(BoxedValue::Boolean(false))),
            (str_key("d"), Value::Boxed(BoxedValue::Double(0.5))),
            (str_key("none"), Value::Null),
        ]
    );
}

#[test]
fn test_declared_value_type_converts_values() {
    let value = result(&unit_returning(
        vec![],
        object(vec![prop("a", int(1)), prop("b", float(2.5))]),
        record(ty("string"), ty("double")),
    ));
    assert_eq!(
        entries(&value),
        vec![
            (str_key("a"), Value::Boxed(BoxedValue::Double(1.0))),
            (str_key("b"), Value::Boxed(BoxedValue::Double(2.5))),
        ]
    );
}

#[test]
fn test_spread_copies_entries_in_order() {
    let value = result(&unit(
        vec![base_record()],
        object(vec![spread(var("base")), prop("c", int(3)), prop("a", int(10))]),
    ));
    assert_eq!(
        entries(&value),
        vec![
            (str_key("a"), int_value(10)),
            (str_key("b"), int_value(2)),
            (str_key("c"), int_value(3)),
        ]
    );
}

#[test]
fn test_spread_overrides_earlier_properties() {
    let value = result(&unit(
        vec![base_record()],
        object(vec![prop("c", int(0)), prop("a", int(9)), spread(var("base"))]),
    ));
    assert_eq!(
        entries(&value),
        vec![
            (str_key("c"), int_value(0)),
            (str_key("a"), int_value(1)),
            (str_key("b"), int_value(2)),
        ]
    );
}

#[test]
fn test_spread_does_not_alias_its_source() {
    let execution = super::run(&unit(
        vec![base_record()],
        object(vec![spread(var("base")), prop("a", int(10))]),
    ));
    assert_eq!(execution.result.java_string(), "{a=10, b=2}");
    assert_eq!(
        execution.local("base").map(Value::java_string),
        Some("{a=1, b=2}".to_string())
    );
}

#[test]
fn test_numeric_keys() {
    let value = result(&unit(
        vec![],
        object(vec![
            entry(int_key(0), string("zero")),
            entry(float_key(1.5), string("half")),
        ]),
    ));
    assert_eq!(
        entries(&value)
            .into_iter()
            .map(|(key, _)| key)
            .collect::<Vec<_>>(),
        vec![str_key("0"), str_key("1.5")]
    );

    let value = result(&unit_returning(
        vec![],
        object(vec![
            entry(int_key(1), string("one")),
            entry(int_key(3_000_000_000), string("big")),
        ]),
        record(ty("number"), ty("string")),
    ));
    assert_eq!(
        entries(&value),
        vec![
            (Key::Boxed(BoxedValue::Int(1)), Value::string("one")),
            (Key::Boxed(BoxedValue::Long(3_000_000_000)), Value::string("big")),
        ]
    );
}

#[test]
fn test_computed_keys_are_stringified() {
    let value = result(&unit(
        vec![let_typed("k", "int", int(2))],
        object(vec![entry(computed(var("k")), string("two"))]),
    ));
    assert_eq!(entries(&value), vec![(str_key("2"), Value::string("two"))]);

    let value = result(&unit(
        vec![let_typed("k", "string", null())],
        object(vec![entry(computed(var("k")), int(1))]),
    ));
    assert_eq!(entries(&value), vec![(str_key("null"), int_value(1))]);
}

#[test]
fn test_literal_and_computed_float_keys_differ() {
    // Literal keys take their canonical numeric form; computed keys go
    // through String.valueOf like any other value
    let value = result(&unit(
        vec![],
        object(vec![
            entry(float_key(1.0), string("a")),
            entry(computed(float(1.0)), string("b")),
            entry(float_key(2.5), string("c")),
            entry(computed(float(2.5)), string("d")),
        ]),
    ));
    assert_eq!(
        entries(&value),
        vec![
            (str_key("1"), Value::string("a")),
            (str_key("1.0"), Value::string("b")),
            (str_key("2.5"), Value::string("d")),
        ]
    );
}

#[test]
fn test_nested_records() {
    let value = result(&unit(
        vec![],
        object(vec![
            prop("outer", object(vec![prop("inner", int(1))])),
            prop("list", array(vec![int(1), string("x")])),
        ]),
    ));
    assert_eq!(value.java_string(), "{outer={inner=1}, list=[1, x]}");
}

#[test]
fn test_array_literal() {
    let value = result(&unit(vec![], array(vec![int(1), string("x"), null()])));
    assert_eq!(
        value.list_items(),
        Some(vec![int_value(1), Value::string("x"), Value::Null])
    );
}

#[test]
fn test_empty_record() {
    let value = result(&unit(vec![], object(vec![])));
    assert_eq!(entries(&value), vec![]);
    assert_eq!(value.java_string(), "{}");
}
