//! Runtime value representation for the tsjvm interpreter.
//!
//! Stack values mirror the target's computational kinds: every sub-int
//! primitive travels as `Int`, and `Long`/`Double` occupy two slots.
//! Containers are shared and mutable, as references are on the target.

use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use tsjvm_compiler::types::{PrimitiveKind, StackKind};

/// Contents of a wrapper object (`Integer`, `Character`, ...)
#[derive(Debug, Clone, Copy)]
pub enum BoxedValue {
    Byte(i8),
    Short(i16),
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
}

impl BoxedValue {
    /// Box a stack value as `kind`, the way `valueOf` does
    pub fn from_stack(kind: PrimitiveKind, value: &Value) -> Option<Self> {
        Some(match (kind, value) {
            (PrimitiveKind::Byte, Value::Int(v)) => BoxedValue::Byte(*v as i8),
            (PrimitiveKind::Short, Value::Int(v)) => BoxedValue::Short(*v as i16),
            (PrimitiveKind::Char, Value::Int(v)) => BoxedValue::Char(*v as u16),
            (PrimitiveKind::Int, Value::Int(v)) => BoxedValue::Int(*v),
            (PrimitiveKind::Boolean, Value::Int(v)) => BoxedValue::Boolean(*v != 0),
            (PrimitiveKind::Long, Value::Long(v)) => BoxedValue::Long(*v),
            (PrimitiveKind::Float, Value::Float(v)) => BoxedValue::Float(*v),
            (PrimitiveKind::Double, Value::Double(v)) => BoxedValue::Double(*v),
            _ => return None,
        })
    }

    pub fn kind(self) -> PrimitiveKind {
        match self {
            BoxedValue::Byte(_) => PrimitiveKind::Byte,
            BoxedValue::Short(_) => PrimitiveKind::Short,
            BoxedValue::Char(_) => PrimitiveKind::Char,
            BoxedValue::Int(_) => PrimitiveKind::Int,
            BoxedValue::Long(_) => PrimitiveKind::Long,
            BoxedValue::Float(_) => PrimitiveKind::Float,
            BoxedValue::Double(_) => PrimitiveKind::Double,
            BoxedValue::Boolean(_) => PrimitiveKind::Boolean,
        }
    }

    fn as_int(self) -> Option<i32> {
        Some(match self {
            BoxedValue::Byte(v) => i32::from(v),
            BoxedValue::Short(v) => i32::from(v),
            BoxedValue::Char(v) => i32::from(v),
            BoxedValue::Int(v) => v,
            BoxedValue::Long(v) => v as i32,
            BoxedValue::Float(v) => v as i32,
            BoxedValue::Double(v) => v as i32,
            BoxedValue::Boolean(_) => return None,
        })
    }

    fn as_long(self) -> Option<i64> {
        Some(match self {
            BoxedValue::Long(v) => v,
            BoxedValue::Float(v) => v as i64,
            BoxedValue::Double(v) => v as i64,
            other => i64::from(other.as_int()?),
        })
    }

    fn as_double(self) -> Option<f64> {
        Some(match self {
            BoxedValue::Long(v) => v as f64,
            BoxedValue::Float(v) => f64::from(v),
            BoxedValue::Double(v) => v,
            other => f64::from(other.as_int()?),
        })
    }

    /// The `<kind>Value()` accessor, with `Number` conversion semantics
    pub fn unbox(self, kind: PrimitiveKind) -> Option<Value> {
        Some(match (self, kind) {
            (BoxedValue::Boolean(v), PrimitiveKind::Boolean) => Value::Int(i32::from(v)),
            (BoxedValue::Boolean(_), _) | (_, PrimitiveKind::Boolean) => return None,
            (_, PrimitiveKind::Byte) => Value::Int(i32::from(self.as_int()? as i8)),
            (_, PrimitiveKind::Short) => Value::Int(i32::from(self.as_int()? as i16)),
            (_, PrimitiveKind::Char) => Value::Int(i32::from(self.as_int()? as u16)),
            (_, PrimitiveKind::Int) => Value::Int(self.as_int()?),
            (_, PrimitiveKind::Long) => Value::Long(self.as_long()?),
            (BoxedValue::Long(v), PrimitiveKind::Float) => Value::Float(v as f32),
            (_, PrimitiveKind::Float) => Value::Float(self.as_double()? as f32),
            (_, PrimitiveKind::Double) => Value::Double(self.as_double()?),
        })
    }

    /// Equality and hashing follow the wrappers' `equals`: same wrapper
    /// class and same bits, with every NaN equal
    fn identity(self) -> (u8, u64) {
        match self {
            BoxedValue::Byte(v) => (0, v as u64),
            BoxedValue::Short(v) => (1, v as u64),
            BoxedValue::Char(v) => (2, u64::from(v)),
            BoxedValue::Int(v) => (3, v as u64),
            BoxedValue::Long(v) => (4, v as u64),
            BoxedValue::Float(v) if v.is_nan() => (5, u64::from(f32::NAN.to_bits())),
            BoxedValue::Float(v) => (5, u64::from(v.to_bits())),
            BoxedValue::Double(v) if v.is_nan() => (6, f64::NAN.to_bits()),
            BoxedValue::Double(v) => (6, v.to_bits()),
            BoxedValue::Boolean(v) => (7, u64::from(v)),
        }
    }
}

impl PartialEq for BoxedValue {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for BoxedValue {}

impl Hash for BoxedValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl fmt::Display for BoxedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoxedValue::Byte(v) => write!(f, "{}", v),
            BoxedValue::Short(v) => write!(f, "{}", v),
            BoxedValue::Char(v) => {
                let c = char::from_u32(u32::from(*v)).unwrap_or(char::REPLACEMENT_CHARACTER);
                write!(f, "{}", c)
            }
            BoxedValue::Int(v) => write!(f, "{}", v),
            BoxedValue::Long(v) => write!(f, "{}", v),
            BoxedValue::Float(v) => write!(f, "{}", floating_string(*v, f64::from(*v))),
            BoxedValue::Double(v) => write!(f, "{}", floating_string(*v, *v)),
            BoxedValue::Boolean(v) => write!(f, "{}", v),
        }
    }
}

/// Decimal form of a float or double as the target prints it: plain
/// notation with at least one fraction digit in `[1e-3, 1e7)`, computerized
/// scientific notation outside it
fn floating_string<T: fmt::Display + fmt::UpperExp>(value: T, wide: f64) -> String {
    if wide.is_nan() {
        return "NaN".to_string();
    }
    if wide.is_infinite() {
        return if wide > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if wide == 0.0 || (1e-3..1e7).contains(&wide.abs()) {
        let text = value.to_string();
        return if text.contains('.') { text } else { format!("{}.0", text) };
    }
    let text = format!("{:E}", value);
    match text.split_once('E') {
        Some((mantissa, exponent)) if !mantissa.contains('.') => {
            format!("{}.0E{}", mantissa, exponent)
        }
        _ => text,
    }
}

/// A hashable map key: the target's `equals`/`hashCode` on the key types
/// records can hold
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Null,
    Str(String),
    Boxed(BoxedValue),
}

impl Key {
    pub fn from_value(value: &Value) -> Option<Key> {
        match value {
            Value::Null => Some(Key::Null),
            Value::Str(s) => Some(Key::Str(s.clone())),
            Value::Boxed(boxed) => Some(Key::Boxed(*boxed)),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Key::Null => Value::Null,
            Key::Str(s) => Value::Str(s.clone()),
            Key::Boxed(boxed) => Value::Boxed(*boxed),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Null => write!(f, "null"),
            Key::Str(s) => write!(f, "{}", s),
            Key::Boxed(boxed) => write!(f, "{}", boxed),
        }
    }
}

/// Ordered map contents; insertion order is iteration order
pub type MapContents = IndexMap<Key, Value>;

/// Iteration state over a snapshot of a map's entries
#[derive(Debug, Clone, PartialEq)]
pub struct EntryCursor {
    entries: Rc<Vec<(Key, Value)>>,
    position: usize,
}

impl EntryCursor {
    pub fn new(entries: Rc<Vec<(Key, Value)>>) -> Self {
        Self {
            entries,
            position: 0,
        }
    }

    pub fn has_next(&self) -> bool {
        self.position < self.entries.len()
    }

    pub fn next_entry(&mut self) -> Option<(Key, Value)> {
        let entry = self.entries.get(self.position).cloned()?;
        self.position += 1;
        Some(entry)
    }
}

/// Runtime values
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `int` and every narrower integral kind, `boolean` as 0/1
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),

    Null,
    Boxed(BoxedValue),
    Str(String),
    Map(Rc<RefCell<MapContents>>),
    List(Rc<RefCell<Vec<Value>>>),
    /// Result of `Map.entrySet()`
    EntrySet(Rc<Vec<(Key, Value)>>),
    Iterator(Rc<RefCell<EntryCursor>>),
    Entry(Rc<(Key, Value)>),
}

impl Value {
    pub fn string(value: &str) -> Self {
        Value::Str(value.to_string())
    }

    pub fn new_map() -> Self {
        Value::Map(Rc::new(RefCell::new(IndexMap::new())))
    }

    pub fn new_list() -> Self {
        Value::List(Rc::new(RefCell::new(Vec::new())))
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Null => "null",
            Value::Boxed(boxed) => boxed.kind().wrapper_name(),
            Value::Str(_) => "String",
            Value::Map(_) => "Map",
            Value::List(_) => "List",
            Value::EntrySet(_) => "Set",
            Value::Iterator(_) => "Iterator",
            Value::Entry(_) => "Map$Entry",
        }
    }

    pub fn stack_kind(&self) -> StackKind {
        match self {
            Value::Int(_) => StackKind::Int,
            Value::Long(_) => StackKind::Long,
            Value::Float(_) => StackKind::Float,
            Value::Double(_) => StackKind::Double,
            _ => StackKind::Reference,
        }
    }

    /// Operand-stack slots this value occupies
    pub fn slots(&self) -> u16 {
        self.stack_kind().size()
    }

    /// `String.valueOf(Object)`
    pub fn java_string(&self) -> String {
        match self {
            Value::Int(v) => v.to_string(),
            Value::Long(v) => v.to_string(),
            Value::Float(v) => floating_string(*v, f64::from(*v)),
            Value::Double(v) => floating_string(*v, *v),
            Value::Null => "null".to_string(),
            Value::Boxed(boxed) => boxed.to_string(),
            Value::Str(s) => s.clone(),
            Value::Map(map) => {
                let entries: Vec<String> = map
                    .borrow()
                    .iter()
                    .map(|(key, value)| format!("{}={}", key, value.java_string()))
                    .collect();
                format!("{{{}}}", entries.join(", "))
            }
            Value::List(items) => {
                let items: Vec<String> = items.borrow().iter().map(Value::java_string).collect();
                format!("[{}]", items.join(", "))
            }
            Value::EntrySet(entries) => {
                let entries: Vec<String> = entries
                    .iter()
                    .map(|(key, value)| format!("{}={}", key, value.java_string()))
                    .collect();
                format!("[{}]", entries.join(", "))
            }
            Value::Iterator(_) => "Iterator".to_string(),
            Value::Entry(entry) => format!("{}={}", entry.0, entry.1.java_string()),
        }
    }

    /// `Objects.equals(a, b)`
    pub fn java_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boxed(a), Value::Boxed(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                    && a
                        .iter()
                        .all(|(key, value)| b.get(key).is_some_and(|other| value.java_equals(other)))
            }
            (Value::List(a), Value::List(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.java_equals(y))
            }
            (Value::Entry(a), Value::Entry(b)) => a.0 == b.0 && a.1.java_equals(&b.1),
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            _ => false,
        }
    }

    /// Entries of a map value, in iteration order
    pub fn map_entries(&self) -> Option<Vec<(Key, Value)>> {
        match self {
            Value::Map(map) => Some(
                map.borrow()
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            ),
            _ => None,
        }
    }

    pub fn list_items(&self) -> Option<Vec<Value>> {
        match self {
            Value::List(items) => Some(items.borrow().clone()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other.java_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_floating_strings() {
        assert_eq!(Value::Double(1.0).java_string(), "1.0");
        assert_eq!(Value::Double(1.5).java_string(), "1.5");
        assert_eq!(Value::Double(-0.0).java_string(), "-0.0");
        assert_eq!(Value::Double(1e10).java_string(), "1.0E10");
        assert_eq!(Value::Double(1.25e-5).java_string(), "1.25E-5");
        assert_eq!(Value::Float(1.1).java_string(), "1.1");
        assert_eq!(Value::Double(f64::NAN).java_string(), "NaN");
        assert_eq!(Value::Double(f64::NEG_INFINITY).java_string(), "-Infinity");
    }

    #[test]
    fn test_boxed_equality_is_by_class_and_bits() {
        assert_eq!(BoxedValue::Int(1), BoxedValue::Int(1));
        assert_ne!(BoxedValue::Int(1), BoxedValue::Long(1));
        assert_eq!(BoxedValue::Double(f64::NAN), BoxedValue::Double(f64::NAN));
        assert_ne!(BoxedValue::Double(0.0), BoxedValue::Double(-0.0));
    }

    #[test]
    fn test_number_accessors_convert() {
        assert_eq!(BoxedValue::Double(300.7).unbox(PrimitiveKind::Byte), Some(Value::Int(44)));
        assert_eq!(BoxedValue::Long(1 << 40).unbox(PrimitiveKind::Int), Some(Value::Int(0)));
        assert_eq!(BoxedValue::Int(7).unbox(PrimitiveKind::Double), Some(Value::Double(7.0)));
        assert_eq!(BoxedValue::Boolean(true).unbox(PrimitiveKind::Int), None);
    }

    #[test]
    fn test_map_string_form() {
        let map = Value::new_map();
        if let Value::Map(contents) = &map {
            contents
                .borrow_mut()
                .insert(Key::Str("a".to_string()), Value::Boxed(BoxedValue::Int(1)));
            contents.borrow_mut().insert(Key::Boxed(BoxedValue::Int(2)), Value::string("x"));
        }
        assert_eq!(map.java_string(), "{a=1, 2=x}");
    }
}
