//! Code signatures: the identity of every body the compiler emits.

use smallvec::SmallVec;

use crate::{ClassId, Name, Ty};

/// What kind of code body a signature names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum CodeKind {
    /// An instance method, dispatched virtually on its receiver.
    Method { returns: Ty },
    /// A constructor, always called statically.
    Constructor,
    /// A unit test. Returns the empty string when every assert holds,
    /// otherwise the position of the first failing assert.
    Test,
    /// Set-up code run on a fresh receiver before each test of the class.
    Fixture,
}

/// Immutable identity of a method, constructor, test or fixture.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Signature {
    /// The class declaring this code.
    pub class: ClassId,
    /// Method or test name; constructors use the class table's `<init>`
    /// name and fixtures a generated `fixtureN` name.
    pub name: Name,
    /// Parameter types, excluding the implicit receiver.
    pub params: SmallVec<[Ty; 4]>,
    pub kind: CodeKind,
}

impl Signature {
    /// The type of value left by a call to this code.
    pub fn return_type(&self) -> Ty {
        match self.kind {
            CodeKind::Method { returns } => returns,
            CodeKind::Test => Ty::Str,
            CodeKind::Constructor | CodeKind::Fixture => Ty::Void,
        }
    }

    /// Whether a `(name, params)` lookup key selects this signature.
    pub fn matches(&self, name: Name, params: &[Ty]) -> bool {
        self.name == name && self.params.as_slice() == params
    }

    pub fn is_method(&self) -> bool {
        matches!(self.kind, CodeKind::Method { .. })
    }
}
