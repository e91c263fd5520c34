//! Static type kinds understood by the compiler core
//!
//! Primitive kinds map one-to-one onto the managed target's primitive
//! types; everything else is a reference on the operand stack.

use std::fmt;

/// Primitive value kinds, including the 16-bit `char` and `boolean`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
    Boolean,
}

/// Category of a value on the operand stack (and of a local slot)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackKind {
    Int,
    Long,
    Float,
    Double,
    Reference,
}

impl StackKind {
    /// Mnemonic prefix (`i`, `l`, `f`, `d`, `a`)
    pub fn prefix(self) -> char {
        match self {
            StackKind::Int => 'i',
            StackKind::Long => 'l',
            StackKind::Float => 'f',
            StackKind::Double => 'd',
            StackKind::Reference => 'a',
        }
    }

    /// Number of stack/local slots a value of this kind occupies
    pub fn size(self) -> u16 {
        match self {
            StackKind::Long | StackKind::Double => 2,
            _ => 1,
        }
    }
}

impl PrimitiveKind {
    /// Every numeric kind, in widening order (char last)
    pub const NUMERIC: [PrimitiveKind; 7] = [
        PrimitiveKind::Byte,
        PrimitiveKind::Short,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
        PrimitiveKind::Char,
    ];

    pub fn is_numeric(self) -> bool {
        self != PrimitiveKind::Boolean
    }

    pub fn is_integral(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Byte
                | PrimitiveKind::Short
                | PrimitiveKind::Int
                | PrimitiveKind::Long
                | PrimitiveKind::Char
        )
    }

    pub fn is_floating(self) -> bool {
        matches!(self, PrimitiveKind::Float | PrimitiveKind::Double)
    }

    pub fn stack_kind(self) -> StackKind {
        match self {
            PrimitiveKind::Long => StackKind::Long,
            PrimitiveKind::Float => StackKind::Float,
            PrimitiveKind::Double => StackKind::Double,
            _ => StackKind::Int,
        }
    }

    pub fn bit_width(self) -> u32 {
        match self {
            PrimitiveKind::Boolean => 1,
            PrimitiveKind::Byte => 8,
            PrimitiveKind::Short | PrimitiveKind::Char => 16,
            PrimitiveKind::Int | PrimitiveKind::Float => 32,
            PrimitiveKind::Long | PrimitiveKind::Double => 64,
        }
    }

    /// Whether an integral constant is representable without loss
    pub fn fits(self, value: i64) -> bool {
        match self {
            PrimitiveKind::Byte => i8::try_from(value).is_ok(),
            PrimitiveKind::Short => i16::try_from(value).is_ok(),
            PrimitiveKind::Char => u16::try_from(value).is_ok(),
            PrimitiveKind::Int => i32::try_from(value).is_ok(),
            PrimitiveKind::Long => true,
            PrimitiveKind::Float | PrimitiveKind::Double => true,
            PrimitiveKind::Boolean => false,
        }
    }

    /// Surface-language spelling
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Boolean => "boolean",
        }
    }

    /// Simple name of the boxed counterpart
    pub fn wrapper_name(self) -> &'static str {
        match self {
            PrimitiveKind::Byte => "Byte",
            PrimitiveKind::Short => "Short",
            PrimitiveKind::Int => "Integer",
            PrimitiveKind::Long => "Long",
            PrimitiveKind::Float => "Float",
            PrimitiveKind::Double => "Double",
            PrimitiveKind::Char => "Character",
            PrimitiveKind::Boolean => "Boolean",
        }
    }

    /// Internal class name of the boxed counterpart
    pub fn wrapper_class(self) -> &'static str {
        match self {
            PrimitiveKind::Byte => "java/lang/Byte",
            PrimitiveKind::Short => "java/lang/Short",
            PrimitiveKind::Int => "java/lang/Integer",
            PrimitiveKind::Long => "java/lang/Long",
            PrimitiveKind::Float => "java/lang/Float",
            PrimitiveKind::Double => "java/lang/Double",
            PrimitiveKind::Char => "java/lang/Character",
            PrimitiveKind::Boolean => "java/lang/Boolean",
        }
    }

    /// Field descriptor character
    pub fn descriptor(self) -> char {
        match self {
            PrimitiveKind::Byte => 'B',
            PrimitiveKind::Short => 'S',
            PrimitiveKind::Int => 'I',
            PrimitiveKind::Long => 'J',
            PrimitiveKind::Float => 'F',
            PrimitiveKind::Double => 'D',
            PrimitiveKind::Char => 'C',
            PrimitiveKind::Boolean => 'Z',
        }
    }

    pub fn from_wrapper_name(name: &str) -> Option<PrimitiveKind> {
        match name {
            "Byte" => Some(PrimitiveKind::Byte),
            "Short" => Some(PrimitiveKind::Short),
            "Integer" => Some(PrimitiveKind::Int),
            "Long" => Some(PrimitiveKind::Long),
            "Float" => Some(PrimitiveKind::Float),
            "Double" => Some(PrimitiveKind::Double),
            "Character" => Some(PrimitiveKind::Char),
            "Boolean" => Some(PrimitiveKind::Boolean),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<PrimitiveKind> {
        match name {
            "byte" => Some(PrimitiveKind::Byte),
            "short" => Some(PrimitiveKind::Short),
            "int" => Some(PrimitiveKind::Int),
            "long" => Some(PrimitiveKind::Long),
            "float" => Some(PrimitiveKind::Float),
            "double" => Some(PrimitiveKind::Double),
            "char" => Some(PrimitiveKind::Char),
            "boolean" => Some(PrimitiveKind::Boolean),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Well-known reference type names
pub mod reference_names {
    pub const STRING: &str = "String";
    pub const NUMBER: &str = "Number";
}

/// Static type of an expression or declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Primitive(PrimitiveKind),
    Boxed(PrimitiveKind),
    /// Arbitrary object type by simple name (`String`, `Number`, ...)
    Reference(String),
    /// The ordered-map record family
    Record(Box<RecordConstraint>),
    /// Ordered list of elements
    Array(Box<TypeKind>),
    /// Type of the `null` literal
    Null,
    /// Top reference type
    AnyObject,
}

/// Key/value constraint of a record; `value` may itself be a record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordConstraint {
    pub key: TypeKind,
    pub value: TypeKind,
}

impl RecordConstraint {
    pub fn new(key: TypeKind, value: TypeKind) -> Self {
        Self { key, value }
    }

    /// The shape of an unconstrained object literal
    pub fn unconstrained() -> Self {
        Self::new(TypeKind::string(), TypeKind::AnyObject)
    }

    /// Nested constraint for values, if the value type is itself a record
    pub fn nested(&self) -> Option<&RecordConstraint> {
        match &self.value {
            TypeKind::Record(inner) => Some(inner),
            _ => None,
        }
    }

    /// Whether keys are stored as boxed numbers
    pub fn has_numeric_keys(&self) -> bool {
        self.key.is_numeric() || self.key.is_number_reference()
    }
}

impl TypeKind {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        TypeKind::Primitive(kind)
    }

    pub fn int() -> Self {
        TypeKind::Primitive(PrimitiveKind::Int)
    }

    pub fn long() -> Self {
        TypeKind::Primitive(PrimitiveKind::Long)
    }

    pub fn double() -> Self {
        TypeKind::Primitive(PrimitiveKind::Double)
    }

    pub fn boolean() -> Self {
        TypeKind::Primitive(PrimitiveKind::Boolean)
    }

    pub fn string() -> Self {
        TypeKind::Reference(reference_names::STRING.to_string())
    }

    pub fn number() -> Self {
        TypeKind::Reference(reference_names::NUMBER.to_string())
    }

    pub fn record(key: TypeKind, value: TypeKind) -> Self {
        TypeKind::Record(Box::new(RecordConstraint::new(key, value)))
    }

    pub fn array(element: TypeKind) -> Self {
        TypeKind::Array(Box::new(element))
    }

    /// Underlying primitive of a primitive or boxed kind
    pub fn unboxed(&self) -> Option<PrimitiveKind> {
        match self {
            TypeKind::Primitive(kind) | TypeKind::Boxed(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Primitive or boxed numeric (char included)
    pub fn is_numeric(&self) -> bool {
        self.unboxed().is_some_and(PrimitiveKind::is_numeric)
    }

    pub fn is_integral(&self) -> bool {
        self.unboxed().is_some_and(PrimitiveKind::is_integral)
    }

    pub fn is_boolean(&self) -> bool {
        self.unboxed() == Some(PrimitiveKind::Boolean)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeKind::Primitive(_))
    }

    pub fn is_reference(&self) -> bool {
        !self.is_primitive()
    }

    pub fn is_string(&self) -> bool {
        matches!(self, TypeKind::Reference(name) if name == reference_names::STRING)
    }

    pub fn is_number_reference(&self) -> bool {
        matches!(self, TypeKind::Reference(name) if name == reference_names::NUMBER)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, TypeKind::Null)
    }

    pub fn as_record(&self) -> Option<&RecordConstraint> {
        match self {
            TypeKind::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn stack_kind(&self) -> StackKind {
        match self {
            TypeKind::Primitive(kind) => kind.stack_kind(),
            _ => StackKind::Reference,
        }
    }

    /// How the value is held inside a container: primitives are boxed
    pub fn storage(&self) -> TypeKind {
        match self {
            TypeKind::Primitive(kind) => TypeKind::Boxed(*kind),
            other => other.clone(),
        }
    }

    /// Internal class name used for references of this type
    pub fn internal_name(&self) -> String {
        match self {
            TypeKind::Primitive(kind) | TypeKind::Boxed(kind) => kind.wrapper_class().to_string(),
            TypeKind::Reference(name) => match name.as_str() {
                reference_names::STRING => "java/lang/String".to_string(),
                reference_names::NUMBER => "java/lang/Number".to_string(),
                other => other.replace('.', "/"),
            },
            TypeKind::Record(_) => "java/util/LinkedHashMap".to_string(),
            TypeKind::Array(_) => "java/util/ArrayList".to_string(),
            TypeKind::Null | TypeKind::AnyObject => "java/lang/Object".to_string(),
        }
    }

    /// Field descriptor (`I`, `Ljava/lang/String;`, ...)
    pub fn descriptor(&self) -> String {
        match self {
            TypeKind::Primitive(kind) => kind.descriptor().to_string(),
            other => format!("L{};", other.internal_name()),
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Primitive(kind) => write!(f, "{}", kind),
            TypeKind::Boxed(kind) => write!(f, "{}", kind.wrapper_name()),
            TypeKind::Reference(name) => write!(f, "{}", name),
            TypeKind::Record(record) => write!(f, "{}", record),
            TypeKind::Array(element) => write!(f, "Array<{}>", element),
            TypeKind::Null => write!(f, "null"),
            TypeKind::AnyObject => write!(f, "Object"),
        }
    }
}

impl fmt::Display for RecordConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record<{}, {}>", self.key, self.value)
    }
}
