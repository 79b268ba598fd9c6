//! Interned identifiers.
//!
//! Class, method, field and string-literal names are interned once and
//! compared as 32-bit handles everywhere else in the compiler.

use std::fmt;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Interned string identifier.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct Name(u32);

impl Name {
    /// Pre-interned empty string.
    pub const EMPTY: Name = Name(0);

    /// Create from raw u32 value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Name(raw)
    }

    /// Get raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::EMPTY
    }
}

struct InternTable {
    map: FxHashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

/// String interner shared by the whole compilation.
///
/// Interned strings are leaked so lookups hand out `&'static str` without
/// holding the lock.
pub struct StringInterner {
    table: RwLock<InternTable>,
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl StringInterner {
    /// Create an interner holding only the empty string.
    pub fn new() -> Self {
        let empty: &'static str = "";
        let mut map = FxHashMap::default();
        map.insert(empty, 0);
        Self {
            table: RwLock::new(InternTable {
                map,
                strings: vec![empty],
            }),
        }
    }

    /// Intern a string, returning its [`Name`].
    ///
    /// # Panics
    /// Panics if more than `u32::MAX` strings are interned.
    pub fn intern(&self, s: &str) -> Name {
        {
            let guard = self.table.read();
            if let Some(&idx) = guard.map.get(s) {
                return Name(idx);
            }
        }

        let mut guard = self.table.write();
        // Another writer may have won the race between the two locks.
        if let Some(&idx) = guard.map.get(s) {
            return Name(idx);
        }

        let idx = u32::try_from(guard.strings.len())
            .unwrap_or_else(|_| panic!("interner exceeded u32::MAX strings"));
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        guard.strings.push(leaked);
        guard.map.insert(leaked, idx);
        Name(idx)
    }

    /// Look up the string for a [`Name`].
    ///
    /// Names from a different interner resolve to the empty string.
    pub fn lookup(&self, name: Name) -> &'static str {
        self.table
            .read()
            .strings
            .get(name.0 as usize)
            .copied()
            .unwrap_or("")
    }

    /// Number of interned strings, including the empty string.
    pub fn len(&self) -> usize {
        self.table.read().strings.len()
    }

    /// Always false: the empty string is pre-interned.
    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests;
