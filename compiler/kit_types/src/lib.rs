//! Names, types and the class hierarchy for the Kitten compiler.
//!
//! This crate is the compiler's view of the program's declarations:
//!
//! - **Names** ([`Name`], [`StringInterner`]): interned identifiers.
//! - **Types** ([`Ty`], [`ClassId`]): the value types the IR manipulates.
//! - **Signatures** ([`Signature`], [`SigId`], [`CodeKind`]): the identity
//!   of every method, constructor, test and fixture body.
//! - **Hierarchy** ([`ClassTable`], [`ClassHierarchy`]): the closed-world
//!   class hierarchy queried by virtual-call resolution.
//!
//! The IR in `kit_cfg` refers to declarations only through [`ClassId`] and
//! [`SigId`]; it never owns or mutates them.

mod class_table;
mod name;
mod signature;
mod ty;

pub use class_table::{ClassHierarchy, ClassInfo, ClassTable};
pub use name::{Name, StringInterner};
pub use signature::{CodeKind, Signature};
pub use ty::{ClassId, SigId, Ty};
