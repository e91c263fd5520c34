//! Resolution of declared type annotations into `TypeKind`s

use crate::error::{CompileError, CompileResult};
use crate::types::kind::{PrimitiveKind, TypeKind};
use tsjvm_ast::TypeAnnotation;

/// Where an annotation appears; `number` means different things as a
/// record key than as a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Value,
    RecordKey,
}

/// Resolve a declared type annotation
pub fn resolve_annotation(annotation: &TypeAnnotation) -> CompileResult<TypeKind> {
    resolve(annotation, Position::Value)
}

fn resolve(annotation: &TypeAnnotation, position: Position) -> CompileResult<TypeKind> {
    match annotation {
        TypeAnnotation::Simple { name, .. } => Ok(resolve_simple(name, position)),
        TypeAnnotation::Generic { name, args, span } => match name.as_str() {
            "Record" | "Map" => match args.as_slice() {
                [key, value] => Ok(TypeKind::record(
                    resolve(key, Position::RecordKey)?,
                    resolve(value, Position::Value)?,
                )),
                _ => Err(CompileError::invalid_type_annotation(
                    annotation.to_string(),
                    format!("{} takes exactly two type arguments", name),
                    *span,
                )),
            },
            "Array" => match args.as_slice() {
                [element] => Ok(TypeKind::array(resolve(element, Position::Value)?)),
                _ => Err(CompileError::invalid_type_annotation(
                    annotation.to_string(),
                    "Array takes exactly one type argument".to_string(),
                    *span,
                )),
            },
            _ => Err(CompileError::invalid_type_annotation(
                annotation.to_string(),
                format!("generic type {} is not supported", name),
                *span,
            )),
        },
    }
}

fn resolve_simple(name: &str, position: Position) -> TypeKind {
    if let Some(kind) = PrimitiveKind::from_name(name) {
        return TypeKind::Primitive(kind);
    }
    if let Some(kind) = PrimitiveKind::from_wrapper_name(name) {
        return TypeKind::Boxed(kind);
    }
    match name {
        "number" => match position {
            Position::Value => TypeKind::double(),
            Position::RecordKey => TypeKind::number(),
        },
        "Number" => TypeKind::number(),
        "string" | "String" => TypeKind::string(),
        "Object" | "any" | "unknown" => TypeKind::AnyObject,
        other => TypeKind::Reference(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tsjvm_ast::builder::{array_of, generic, record, ty};

    #[test]
    fn test_number_is_double_as_value_and_generic_as_key() {
        let resolved = resolve_annotation(&record(ty("number"), ty("number"))).unwrap();
        assert_eq!(resolved, TypeKind::record(TypeKind::number(), TypeKind::double()));
    }

    #[test]
    fn test_nested_record_and_array() {
        let resolved =
            resolve_annotation(&record(ty("string"), record(ty("Long"), array_of(ty("int")))))
                .unwrap();
        assert_eq!(
            resolved,
            TypeKind::record(
                TypeKind::string(),
                TypeKind::record(
                    TypeKind::Boxed(PrimitiveKind::Long),
                    TypeKind::array(TypeKind::int())
                )
            )
        );
    }

    #[test]
    fn test_record_arity_is_checked() {
        let result = resolve_annotation(&generic("Record", vec![ty("string")]));
        assert!(matches!(
            result,
            Err(CompileError::InvalidTypeAnnotation { .. })
        ));
    }

    #[test]
    fn test_unknown_names_are_references() {
        assert_eq!(
            resolve_annotation(&ty("Widget")).unwrap(),
            TypeKind::Reference("Widget".to_string())
        );
        assert_eq!(resolve_annotation(&ty("any")).unwrap(), TypeKind::AnyObject);
    }
}
