//! Value types and the id newtypes that index the class table.

use std::fmt;

/// Class ID within a [`ClassTable`](crate::ClassTable).
///
/// IDs are allocated sequentially in declaration order starting from 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct ClassId(u32);

impl ClassId {
    /// Create a new class ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Signature ID within a [`ClassTable`](crate::ClassTable).
///
/// Identifies a method, constructor, test or fixture. Identity is the ID:
/// two signatures are the same code body exactly when their IDs are equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct SigId(u32);

impl SigId {
    /// Create a new signature ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sig#{}", self.0)
    }
}

/// A value type as seen by the IR.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Ty {
    Void,
    Bool,
    Int,
    Float,
    Str,
    /// The type of `nil`, assignable to every class type.
    Nil,
    Class(ClassId),
}

impl Ty {
    /// `int` and `float` support arithmetic and ordering comparisons.
    pub fn is_numeric(self) -> bool {
        matches!(self, Ty::Int | Ty::Float)
    }

    /// Reference types live on the heap and compare by identity.
    pub fn is_reference(self) -> bool {
        matches!(self, Ty::Str | Ty::Nil | Ty::Class(_))
    }

    pub fn is_void(self) -> bool {
        self == Ty::Void
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Void => f.write_str("void"),
            Ty::Bool => f.write_str("boolean"),
            Ty::Int => f.write_str("int"),
            Ty::Float => f.write_str("float"),
            Ty::Str => f.write_str("String"),
            Ty::Nil => f.write_str("nil"),
            Ty::Class(id) => write!(f, "class#{}", id.raw()),
        }
    }
}
