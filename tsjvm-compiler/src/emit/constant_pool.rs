//! Constant pool references requested by emitted code
//!
//! Entries are deduplicated; an index stays valid for the life of the pool.

use indexmap::IndexSet;
use std::fmt;

/// 1-based index into a `ConstantPool`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstantIndex(pub u16);

impl fmt::Display for ConstantIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PoolEntry {
    Class(String),
    String(String),
    Integer(i32),
    /// IEEE bits, so entries stay hashable
    Float(u32),
    Long(i64),
    Double(u64),
    MethodRef {
        owner: String,
        name: String,
        descriptor: String,
    },
    InterfaceMethodRef {
        owner: String,
        name: String,
        descriptor: String,
    },
}

impl PoolEntry {
    pub fn method(owner: &str, name: &str, descriptor: &str) -> Self {
        PoolEntry::MethodRef {
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        }
    }

    pub fn interface_method(owner: &str, name: &str, descriptor: &str) -> Self {
        PoolEntry::InterfaceMethodRef {
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        }
    }

    /// Descriptor of a method reference
    pub fn method_descriptor(&self) -> Option<&str> {
        match self {
            PoolEntry::MethodRef { descriptor, .. }
            | PoolEntry::InterfaceMethodRef { descriptor, .. } => Some(descriptor),
            _ => None,
        }
    }

    /// Whether `ldc2_w` is needed to load this entry
    pub fn is_wide(&self) -> bool {
        matches!(self, PoolEntry::Long(_) | PoolEntry::Double(_))
    }
}

impl fmt::Display for PoolEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolEntry::Class(name) => write!(f, "{}", name),
            PoolEntry::String(value) => write!(f, "{:?}", value),
            PoolEntry::Integer(value) => write!(f, "{}", value),
            PoolEntry::Float(bits) => write!(f, "{}f", f32::from_bits(*bits)),
            PoolEntry::Long(value) => write!(f, "{}L", value),
            PoolEntry::Double(bits) => write!(f, "{}d", f64::from_bits(*bits)),
            PoolEntry::MethodRef {
                owner,
                name,
                descriptor,
            }
            | PoolEntry::InterfaceMethodRef {
                owner,
                name,
                descriptor,
            } => write!(f, "{}.{}{}", owner, name, descriptor),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstantPool {
    entries: IndexSet<PoolEntry>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `entry`, adding it on first use
    pub fn add(&mut self, entry: PoolEntry) -> ConstantIndex {
        let (position, _) = self.entries.insert_full(entry);
        ConstantIndex(position as u16 + 1)
    }

    pub fn class(&mut self, name: &str) -> ConstantIndex {
        self.add(PoolEntry::Class(name.to_string()))
    }

    pub fn string(&mut self, value: &str) -> ConstantIndex {
        self.add(PoolEntry::String(value.to_string()))
    }

    pub fn method(&mut self, owner: &str, name: &str, descriptor: &str) -> ConstantIndex {
        self.add(PoolEntry::method(owner, name, descriptor))
    }

    pub fn interface_method(&mut self, owner: &str, name: &str, descriptor: &str) -> ConstantIndex {
        self.add(PoolEntry::interface_method(owner, name, descriptor))
    }

    pub fn get(&self, index: ConstantIndex) -> Option<&PoolEntry> {
        let position = usize::from(index.0).checked_sub(1)?;
        self.entries.get_index(position)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConstantIndex, &PoolEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (ConstantIndex(position as u16 + 1), entry))
    }
}
