//! Library classes and methods available to executed code
//!
//! Only the members the emission backend calls are provided: wrapper
//! boxing and accessors, string conversion and concatenation,
//! `Objects.equals`, `Math.pow`, and the map, list and entry-iteration
//! members used by literals and spreads.

use crate::error::{Result, RuntimeError};
use crate::machine::OperandStack;
use crate::value::{BoxedValue, EntryCursor, Key, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tsjvm_compiler::types::PrimitiveKind;

const OBJECT: &str = "java/lang/Object";
const NUMBER: &str = "java/lang/Number";
const STRING: &str = "java/lang/String";
const MAP: &str = "java/util/Map";
const LIST: &str = "java/util/List";
const SET: &str = "java/util/Set";
const ITERATOR: &str = "java/util/Iterator";
const ENTRY: &str = "java/util/Map$Entry";

/// Concrete map classes; all keep insertion order
const MAP_CLASSES: [&str; 2] = ["java/util/LinkedHashMap", "java/util/HashMap"];
const LIST_CLASSES: [&str; 2] = ["java/util/ArrayList", "java/util/LinkedList"];

const ALL_KINDS: [PrimitiveKind; 8] = [
    PrimitiveKind::Byte,
    PrimitiveKind::Short,
    PrimitiveKind::Int,
    PrimitiveKind::Long,
    PrimitiveKind::Float,
    PrimitiveKind::Double,
    PrimitiveKind::Char,
    PrimitiveKind::Boolean,
];

/// Pops its arguments (receiver last) and pushes its result, if any
type LibraryMethod = Box<dyn Fn(&mut OperandStack, usize) -> Result<()>>;

/// Registry of callable library members, keyed by `owner.name descriptor`
pub struct Library {
    methods: HashMap<String, LibraryMethod>,
}

fn method_key(owner: &str, name: &str, descriptor: &str) -> String {
    format!("{}.{}{}", owner, name, descriptor)
}

impl Library {
    pub fn new() -> Self {
        let mut library = Self {
            methods: HashMap::new(),
        };
        library.register_wrappers();
        library.register_strings();
        library.register_collections();
        library
    }

    /// Invoke a resolved method reference against the operand stack
    pub fn invoke(
        &self,
        owner: &str,
        name: &str,
        descriptor: &str,
        stack: &mut OperandStack,
        position: usize,
    ) -> Result<()> {
        match self.methods.get(&method_key(owner, name, descriptor)) {
            Some(method) => method(stack, position),
            None => Err(RuntimeError::unknown_method(owner, name, descriptor, position)),
        }
    }

    pub fn has_method(&self, owner: &str, name: &str, descriptor: &str) -> bool {
        self.methods.contains_key(&method_key(owner, name, descriptor))
    }

    /// `new <class>`; the instance is usable once `<init>` has run
    pub fn instantiate(&self, class: &str, position: usize) -> Result<Value> {
        if MAP_CLASSES.contains(&class) {
            Ok(Value::new_map())
        } else if LIST_CLASSES.contains(&class) {
            Ok(Value::new_list())
        } else {
            Err(RuntimeError::UnknownClass {
                class: class.to_string(),
                position,
            })
        }
    }

    fn register(&mut self, owner: &str, name: &str, descriptor: &str, method: LibraryMethod) {
        self.methods.insert(method_key(owner, name, descriptor), method);
    }

    fn register_wrappers(&mut self) {
        for kind in ALL_KINDS {
            let wrapper = kind.wrapper_class();
            let value_of = format!("({})L{};", kind.descriptor(), wrapper);
            self.register(
                wrapper,
                "valueOf",
                &value_of,
                Box::new(move |stack: &mut OperandStack, position: usize| {
                    let value = stack.pop_kind(kind.stack_kind(), position)?;
                    let boxed = BoxedValue::from_stack(kind, &value)
                        .ok_or_else(|| RuntimeError::type_error(kind.name(), value.type_name(), position))?;
                    stack.push(Value::Boxed(boxed));
                    Ok(())
                }),
            );

            let accessor = format!("{}Value", kind.name());
            let accessor_descriptor = format!("(){}", kind.descriptor());
            self.register(wrapper, &accessor, &accessor_descriptor, unboxing(kind, Some(kind)));
            if kind.is_numeric() && kind != PrimitiveKind::Char {
                self.register(NUMBER, &accessor, &accessor_descriptor, unboxing(kind, None));
            }
        }
    }

    fn register_strings(&mut self) {
        self.register(
            STRING,
            "valueOf",
            "(Ljava/lang/Object;)Ljava/lang/String;",
            Box::new(|stack: &mut OperandStack, position: usize| {
                let value = stack.pop_reference(position)?;
                stack.push(Value::Str(value.java_string()));
                Ok(())
            }),
        );
        self.register(
            STRING,
            "concat",
            "(Ljava/lang/String;)Ljava/lang/String;",
            Box::new(|stack: &mut OperandStack, position: usize| {
                let suffix = stack.pop_reference(position)?;
                let receiver = stack.pop_reference(position)?;
                match (receiver, suffix) {
                    (Value::Str(mut text), Value::Str(suffix)) => {
                        text.push_str(&suffix);
                        stack.push(Value::Str(text));
                        Ok(())
                    }
                    (Value::Null, _) | (_, Value::Null) => {
                        Err(RuntimeError::null_pointer("String.concat", position))
                    }
                    (receiver, _) => Err(RuntimeError::type_error(STRING, receiver.type_name(), position)),
                }
            }),
        );
        self.register(
            "java/util/Objects",
            "equals",
            "(Ljava/lang/Object;Ljava/lang/Object;)Z",
            Box::new(|stack: &mut OperandStack, position: usize| {
                let right = stack.pop_reference(position)?;
                let left = stack.pop_reference(position)?;
                stack.push(Value::Int(i32::from(left.java_equals(&right))));
                Ok(())
            }),
        );
        self.register(
            "java/lang/Math",
            "pow",
            "(DD)D",
            Box::new(|stack: &mut OperandStack, position: usize| {
                let exponent = stack.pop_double(position)?;
                let base = stack.pop_double(position)?;
                stack.push(Value::Double(power(base, exponent)));
                Ok(())
            }),
        );
    }

    fn register_collections(&mut self) {
        let put = "(Ljava/lang/Object;Ljava/lang/Object;)Ljava/lang/Object;";
        for class in MAP_CLASSES {
            self.register(class, "<init>", "()V", constructor(class));
            self.register(class, "put", put, Box::new(map_put));
        }
        self.register(MAP, "put", put, Box::new(map_put));

        for class in LIST_CLASSES {
            self.register(class, "<init>", "()V", constructor(class));
            self.register(class, "add", "(Ljava/lang/Object;)Z", Box::new(list_add));
        }
        self.register(LIST, "add", "(Ljava/lang/Object;)Z", Box::new(list_add));

        self.register(
            MAP,
            "entrySet",
            "()Ljava/util/Set;",
            Box::new(|stack: &mut OperandStack, position: usize| {
                let receiver = stack.pop_reference(position)?;
                let entries = receiver
                    .map_entries()
                    .ok_or_else(|| receiver_error(MAP, &receiver, "Map.entrySet", position))?;
                stack.push(Value::EntrySet(Rc::new(entries)));
                Ok(())
            }),
        );
        self.register(
            SET,
            "iterator",
            "()Ljava/util/Iterator;",
            Box::new(|stack: &mut OperandStack, position: usize| match stack.pop_reference(position)? {
                Value::EntrySet(entries) => {
                    let cursor = EntryCursor::new(entries);
                    stack.push(Value::Iterator(Rc::new(RefCell::new(cursor))));
                    Ok(())
                }
                other => Err(receiver_error(SET, &other, "Set.iterator", position)),
            }),
        );
        self.register(
            ITERATOR,
            "hasNext",
            "()Z",
            Box::new(|stack: &mut OperandStack, position: usize| match stack.pop_reference(position)? {
                Value::Iterator(cursor) => {
                    let has_next = cursor.borrow().has_next();
                    stack.push(Value::Int(i32::from(has_next)));
                    Ok(())
                }
                other => Err(receiver_error(ITERATOR, &other, "Iterator.hasNext", position)),
            }),
        );
        self.register(
            ITERATOR,
            "next",
            "()Ljava/lang/Object;",
            Box::new(|stack: &mut OperandStack, position: usize| match stack.pop_reference(position)? {
                Value::Iterator(cursor) => {
                    let entry = cursor
                        .borrow_mut()
                        .next_entry()
                        .ok_or(RuntimeError::NoSuchElement { position })?;
                    stack.push(Value::Entry(Rc::new(entry)));
                    Ok(())
                }
                other => Err(receiver_error(ITERATOR, &other, "Iterator.next", position)),
            }),
        );
        self.register(
            ENTRY,
            "getKey",
            "()Ljava/lang/Object;",
            Box::new(|stack: &mut OperandStack, position: usize| match stack.pop_reference(position)? {
                Value::Entry(entry) => {
                    stack.push(entry.0.to_value());
                    Ok(())
                }
                other => Err(receiver_error(ENTRY, &other, "Map$Entry.getKey", position)),
            }),
        );
        self.register(
            ENTRY,
            "getValue",
            "()Ljava/lang/Object;",
            Box::new(|stack: &mut OperandStack, position: usize| match stack.pop_reference(position)? {
                Value::Entry(entry) => {
                    stack.push(entry.1.clone());
                    Ok(())
                }
                other => Err(receiver_error(ENTRY, &other, "Map$Entry.getValue", position)),
            }),
        );
    }
}

impl Default for Library {
    fn default() -> Self {
        Self::new()
    }
}

/// `<kind>Value()` on a wrapper (`expected` set) or on `Number`
fn unboxing(kind: PrimitiveKind, expected: Option<PrimitiveKind>) -> LibraryMethod {
    Box::new(move |stack: &mut OperandStack, position: usize| {
        let receiver = stack.pop_reference(position)?;
        let boxed = match receiver {
            Value::Boxed(boxed) => boxed,
            Value::Null => {
                return Err(RuntimeError::null_pointer(format!("{}Value", kind.name()), position));
            }
            other => return Err(RuntimeError::type_error(NUMBER, other.type_name(), position)),
        };
        if expected.is_some_and(|expected| boxed.kind() != expected) {
            return Err(RuntimeError::type_error(kind.wrapper_name(), boxed.kind().wrapper_name(), position));
        }
        let value = boxed
            .unbox(kind)
            .ok_or_else(|| RuntimeError::type_error(NUMBER, boxed.kind().wrapper_name(), position))?;
        stack.push(value);
        Ok(())
    })
}

fn constructor(class: &'static str) -> LibraryMethod {
    Box::new(move |stack: &mut OperandStack, position: usize| match stack.pop_reference(position)? {
        Value::Map(_) | Value::List(_) => Ok(()),
        other => Err(RuntimeError::type_error(class, other.type_name(), position)),
    })
}

fn map_put(stack: &mut OperandStack, position: usize) -> Result<()> {
    let value = stack.pop_reference(position)?;
    let key = stack.pop_reference(position)?;
    let receiver = stack.pop_reference(position)?;
    let Value::Map(map) = &receiver else {
        return Err(receiver_error(MAP, &receiver, "Map.put", position));
    };
    let key = Key::from_value(&key).ok_or_else(|| RuntimeError::UnhashableKey {
        found: key.type_name().to_string(),
        position,
    })?;
    // An existing key keeps its position
    let previous = map.borrow_mut().insert(key, value);
    stack.push(previous.unwrap_or(Value::Null));
    Ok(())
}

fn list_add(stack: &mut OperandStack, position: usize) -> Result<()> {
    let item = stack.pop_reference(position)?;
    let receiver = stack.pop_reference(position)?;
    let Value::List(items) = &receiver else {
        return Err(receiver_error(LIST, &receiver, "List.add", position));
    };
    items.borrow_mut().push(item);
    stack.push(Value::Int(1));
    Ok(())
}

fn receiver_error(expected: &str, receiver: &Value, operation: &str, position: usize) -> RuntimeError {
    match receiver {
        Value::Null => RuntimeError::null_pointer(operation, position),
        other => RuntimeError::type_error(expected, other.type_name(), position),
    }
}

/// `Math.pow`, including its NaN rules where they differ from `powf`
fn power(base: f64, exponent: f64) -> f64 {
    if exponent == 0.0 {
        1.0
    } else if exponent.is_nan() || base.is_nan() {
        f64::NAN
    } else if base.abs() == 1.0 && exponent.is_infinite() {
        f64::NAN
    } else {
        base.powf(exponent)
    }
}

/// `checkcast <class>`: null passes, anything else must be an instance
pub fn check_cast(class: &str, value: &Value, position: usize) -> Result<()> {
    let accepted = match value {
        Value::Null => true,
        _ if class == OBJECT => true,
        Value::Boxed(boxed) => {
            class == boxed.kind().wrapper_class()
                || (class == NUMBER && boxed.kind().is_numeric() && boxed.kind() != PrimitiveKind::Char)
        }
        Value::Str(_) => class == STRING,
        Value::Map(_) => class == MAP || MAP_CLASSES.contains(&class),
        Value::List(_) => class == LIST || LIST_CLASSES.contains(&class),
        Value::EntrySet(_) => class == SET,
        Value::Iterator(_) => class == ITERATOR,
        Value::Entry(_) => class == ENTRY,
        Value::Int(_) | Value::Long(_) | Value::Float(_) | Value::Double(_) => {
            return Err(RuntimeError::type_error("reference", value.type_name(), position));
        }
    };
    if accepted {
        Ok(())
    } else {
        Err(RuntimeError::ClassCastException {
            found: value.type_name().to_string(),
            class: class.to_string(),
            position,
        })
    }
}
