//! Instruction sequences for compiled units

use super::{body_mnemonics, emit, emit_with};
use crate::options::CompilerOptions;
use crate::types::{PrimitiveKind, TypeKind};
use pretty_assertions::assert_eq;
use tsjvm_ast::builder::*;
use tsjvm_ast::BinaryOperator;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

#[test]
fn test_int_addition() {
    let sequence = emit(&unit(
        vec![let_typed("a", "int", int(1)), let_typed("b", "int", int(2))],
        binary(var("a"), BinaryOperator::Add, var("b")),
    ));
    assert_eq!(
        sequence.mnemonics(),
        strings(&["iconst_1", "istore_0", "iconst_2", "istore_1", "iload_0", "iload_1", "iadd"])
    );
    assert_eq!(sequence.max_stack, 2);
    assert_eq!(sequence.max_locals, 2);
    assert_eq!(sequence.result_type, TypeKind::int());
}

#[test]
fn test_long_locals_take_two_slots() {
    let sequence = emit(&unit(
        vec![let_typed("a", "long", int(1)), let_typed("b", "int", int(2))],
        binary(var("a"), BinaryOperator::Add, var("b")),
    ));
    assert_eq!(
        sequence.mnemonics(),
        strings(&["lconst_1", "lstore_0", "iconst_2", "istore_2", "lload_0", "iload_2", "i2l", "ladd"])
    );
    assert_eq!(sequence.max_stack, 4);
    assert_eq!(sequence.max_locals, 3);

    let descriptors: Vec<&str> = sequence
        .locals
        .iter()
        .map(|local| local.descriptor.as_str())
        .collect();
    assert_eq!(descriptors, vec!["J", "I"]);
}

#[test]
fn test_boxed_local_initializer() {
    let sequence = emit(&unit(vec![let_typed("n", "Integer", int(5))], var("n")));
    assert_eq!(
        sequence.listing(),
        strings(&[
            "iconst_5",
            "invokestatic java/lang/Integer.valueOf(I)Ljava/lang/Integer;",
            "astore_0",
            "aload_0",
        ])
    );
    assert_eq!(sequence.result_type, TypeKind::Boxed(PrimitiveKind::Int));
}

#[test]
fn test_integer_constants_pick_the_shortest_form() {
    let mnemonics = |value: i64| emit(&unit(vec![], int(value))).listing();
    assert_eq!(mnemonics(-1), strings(&["iconst_m1"]));
    assert_eq!(mnemonics(100), strings(&["bipush 100"]));
    assert_eq!(mnemonics(-300), strings(&["sipush -300"]));
    assert_eq!(mnemonics(100000), strings(&["ldc 100000"]));
    assert_eq!(mnemonics(5_000_000_000), strings(&["ldc2_w 5000000000L"]));
}

#[test]
fn test_default_initializer_is_zero() {
    let sequence = emit(&unit(vec![declare("x", Some(ty("long")), None)], var("x")));
    assert_eq!(sequence.mnemonics(), strings(&["lconst_0", "lstore_0", "lload_0"]));
}

#[test]
fn test_object_literal_listing() {
    let sequence = emit(&unit(vec![], object(vec![prop("a", int(1))])));
    assert_eq!(
        sequence.listing(),
        strings(&[
            "new java/util/LinkedHashMap",
            "dup",
            "invokespecial java/util/LinkedHashMap.<init>()V",
            "dup",
            "ldc \"a\"",
            "iconst_1",
            "invokestatic java/lang/Integer.valueOf(I)Ljava/lang/Integer;",
            "invokevirtual java/util/LinkedHashMap.put(Ljava/lang/Object;Ljava/lang/Object;)Ljava/lang/Object;",
            "pop",
        ])
    );
    assert_eq!(sequence.max_stack, 4);
}

#[test]
fn test_numeric_keys_are_boxed() {
    let sequence = emit(&unit_returning(
        vec![],
        object(vec![entry(int_key(0), string("zero"))]),
        record(ty("number"), ty("string")),
    ));
    assert_eq!(
        body_mnemonics(&sequence, 3),
        strings(&["dup", "iconst_0", "invokestatic", "ldc", "invokevirtual", "pop"])
    );
}

#[test]
fn test_every_duplicate_is_put() {
    let sequence = emit(&unit(
        vec![],
        object(vec![prop("a", int(1)), prop("a", int(2))]),
    ));
    let puts = sequence
        .listing()
        .iter()
        .filter(|line| line.contains(".put("))
        .count();
    assert_eq!(puts, 2);
    // Both keys share one pool entry
    let key_entries = sequence
        .constant_pool
        .iter()
        .filter(|(_, entry)| entry.to_string() == "\"a\"")
        .count();
    assert_eq!(key_entries, 1);
}

#[test]
fn test_custom_container_class() {
    let options = CompilerOptions::new().with_container_class("java/util/TreeMap");
    let sequence = emit_with(&unit(vec![], object(vec![prop("a", int(1))])), &options);
    assert_eq!(sequence.listing()[0], "new java/util/TreeMap");
    assert!(sequence
        .listing()
        .iter()
        .any(|line| line.starts_with("invokevirtual java/util/TreeMap.put")));
}

#[test]
fn test_spread_iterates_entries() {
    let base = declare(
        "base",
        Some(record(ty("string"), ty("int"))),
        Some(object(vec![prop("a", int(1))])),
    );
    let sequence = emit(&unit(vec![base], object(vec![spread(var("base")), prop("b", int(2))])));
    let listing = sequence.listing();
    assert!(listing.contains(&"invokeinterface java/util/Map.entrySet()Ljava/util/Set;".to_string()));
    assert!(listing.contains(&"invokeinterface java/util/Iterator.hasNext()Z".to_string()));
    assert!(sequence.mnemonics().contains(&"goto".to_string()));
    // One scratch slot for the iterator
    assert_eq!(sequence.max_locals, 2);
}

#[test]
fn test_array_literal_builds_a_list() {
    let sequence = emit(&unit(vec![], array(vec![int(1), string("x")])));
    assert_eq!(
        sequence.mnemonics(),
        strings(&[
            "new",
            "dup",
            "invokespecial",
            "dup",
            "iconst_1",
            "invokestatic",
            "invokevirtual",
            "pop",
            "dup",
            "ldc",
            "invokevirtual",
            "pop",
        ])
    );
    assert_eq!(sequence.listing()[0], "new java/util/ArrayList");
}

#[test]
fn test_logical_and_short_circuits() {
    let sequence = emit(&unit(
        vec![let_typed("a", "boolean", boolean(true)), let_typed("b", "boolean", boolean(false))],
        binary(var("a"), BinaryOperator::LogicalAnd, var("b")),
    ));
    assert_eq!(
        body_mnemonics(&sequence, 4),
        strings(&["iload_0", "ifeq", "iload_1", "ifeq", "iconst_1", "goto", "iconst_0"])
    );
}

#[test]
fn test_float_comparisons_treat_nan_as_false() {
    let declarations = vec![let_typed("f", "float", float(1.5)), let_typed("g", "float", float(2.0))];
    let less = emit(&unit(declarations.clone(), binary(var("f"), BinaryOperator::Less, var("g"))));
    assert_eq!(
        body_mnemonics(&less, 4),
        strings(&["fload_0", "fload_1", "fcmpg", "iflt", "iconst_0", "goto", "iconst_1"])
    );

    let greater = emit(&unit(declarations, binary(var("f"), BinaryOperator::Greater, var("g"))));
    assert_eq!(
        body_mnemonics(&greater, 4),
        strings(&["fload_0", "fload_1", "fcmpl", "ifgt", "iconst_0", "goto", "iconst_1"])
    );
}

#[test]
fn test_mixed_width_equality_widens_first() {
    let sequence = emit(&unit(
        vec![let_typed("a", "int", int(1)), let_typed("b", "long", int(2))],
        binary(var("a"), BinaryOperator::StrictEqual, var("b")),
    ));
    assert_eq!(
        body_mnemonics(&sequence, 4),
        strings(&["iload_0", "i2l", "lload_1", "lcmp", "ifeq", "iconst_0", "goto", "iconst_1"])
    );
}

#[test]
fn test_string_equality_compares_values() {
    let declarations = vec![let_typed("s", "string", string("x")), let_typed("t", "string", string("y"))];
    let equal = emit(&unit(declarations.clone(), binary(var("s"), BinaryOperator::StrictEqual, var("t"))));
    assert_eq!(
        equal.listing().last().map(String::as_str),
        Some("invokestatic java/util/Objects.equals(Ljava/lang/Object;Ljava/lang/Object;)Z")
    );

    let different = emit(&unit(declarations, binary(var("s"), BinaryOperator::NotEqual, var("t"))));
    assert_eq!(
        body_mnemonics(&different, 4),
        strings(&["aload_0", "aload_1", "invokestatic", "iconst_1", "ixor"])
    );
}

#[test]
fn test_conditional_branches_leave_one_value() {
    let sequence = emit(&unit(
        vec![let_typed("flag", "boolean", boolean(true))],
        conditional(var("flag"), int(1), float(2.5)),
    ));
    assert_eq!(
        body_mnemonics(&sequence, 2),
        strings(&["iload_0", "ifeq", "iconst_1", "i2d", "goto", "ldc2_w"])
    );
    assert_eq!(sequence.max_stack, 2);
}

#[test]
fn test_concatenation_listing() {
    let sequence = emit(&unit(vec![], binary(string("n="), BinaryOperator::Add, int(7))));
    assert_eq!(
        sequence.listing(),
        strings(&[
            "ldc \"n=\"",
            "bipush 7",
            "invokestatic java/lang/Integer.valueOf(I)Ljava/lang/Integer;",
            "invokestatic java/lang/String.valueOf(Ljava/lang/Object;)Ljava/lang/String;",
            "invokevirtual java/lang/String.concat(Ljava/lang/String;)Ljava/lang/String;",
        ])
    );
}

#[test]
fn test_exponent_calls_pow() {
    let sequence = emit(&unit(vec![], binary(int(2), BinaryOperator::Exponent, int(10))));
    assert_eq!(
        sequence.listing(),
        strings(&[
            "iconst_2",
            "i2d",
            "bipush 10",
            "i2d",
            "invokestatic java/lang/Math.pow(DD)D",
        ])
    );
    assert_eq!(sequence.max_stack, 4);
}

#[test]
fn test_narrowing_cast() {
    let sequence = emit(&unit(
        vec![let_typed("d", "double", float(300.7))],
        cast(var("d"), ty("byte")),
    ));
    assert_eq!(body_mnemonics(&sequence, 2), strings(&["dload_0", "d2i", "i2b"]));
}

#[test]
fn test_reference_cast_checks_class() {
    let sequence = emit(&unit(
        vec![let_typed("o", "Object", int(1))],
        cast(var("o"), ty("Integer")),
    ));
    assert_eq!(
        sequence.listing().last().map(String::as_str),
        Some("checkcast java/lang/Integer")
    );
}

#[test]
fn test_byte_prefix_increment_truncates() {
    let sequence = emit(&unit(vec![let_typed("b", "byte", int(1))], pre_inc("b")));
    assert_eq!(
        body_mnemonics(&sequence, 2),
        strings(&["iload_0", "iconst_1", "iadd", "i2b", "dup", "istore_0"])
    );
}

#[test]
fn test_int_postfix_increment_uses_iinc() {
    let sequence = emit(&unit(vec![let_typed("i", "int", int(1))], post_inc("i")));
    assert_eq!(body_mnemonics(&sequence, 2), strings(&["iload_0", "iinc"]));
    assert_eq!(sequence.listing().last().map(String::as_str), Some("iinc 0 1"));
}

#[test]
fn test_long_postfix_decrement_keeps_old_value() {
    let sequence = emit(&unit(vec![let_typed("l", "long", int(5))], post_dec("l")));
    assert_eq!(
        body_mnemonics(&sequence, 2),
        strings(&["lload_0", "dup2", "lconst_1", "lsub", "lstore_0"])
    );
    assert_eq!(sequence.max_stack, 6);
}
